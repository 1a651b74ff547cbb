//! Quality flags and access specifications.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Element qualities from the Quality column (`X`, `N`, `F`, ...).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize))]
    pub struct Quality: u16 {
        const NULLABLE = 1 << 0;
        const NON_VOLATILE = 1 << 1;
        const FIXED = 1 << 2;
        const SCENE = 1 << 3;
        const REPORTABLE = 1 << 4;
        const CHANGES_OMITTED = 1 << 5;
        const SINGLETON = 1 << 6;
        const DIAGNOSTICS = 1 << 7;
        const LARGE_MESSAGE = 1 << 8;
        const QUIETER_REPORTING = 1 << 9;
        const ATOMIC = 1 << 10;
        const SOURCE_ATTRIBUTION = 1 << 11;
    }
}

const QUALITY_LETTERS: &[(char, Quality)] = &[
    ('X', Quality::NULLABLE),
    ('N', Quality::NON_VOLATILE),
    ('F', Quality::FIXED),
    ('S', Quality::SCENE),
    ('P', Quality::REPORTABLE),
    ('C', Quality::CHANGES_OMITTED),
    ('I', Quality::SINGLETON),
    ('K', Quality::DIAGNOSTICS),
    ('L', Quality::LARGE_MESSAGE),
    ('Q', Quality::QUIETER_REPORTING),
    ('T', Quality::ATOMIC),
    ('A', Quality::SOURCE_ATTRIBUTION),
];

impl Quality {
    /// Parse quality letters; separators and unknown letters are ignored.
    pub fn parse(text: &str) -> Quality {
        text.chars()
            .filter_map(|c| {
                QUALITY_LETTERS
                    .iter()
                    .find(|(letter, _)| *letter == c.to_ascii_uppercase())
                    .map(|(_, q)| *q)
            })
            .fold(Quality::empty(), |acc, q| acc | q)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letters: Vec<String> = QUALITY_LETTERS
            .iter()
            .filter(|(_, q)| self.contains(*q))
            .map(|(letter, _)| letter.to_string())
            .collect();
        f.write_str(&letters.join(" "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Privilege {
    View,
    Operate,
    Manage,
    Administer,
}

impl Privilege {
    fn from_letter(c: char) -> Option<Privilege> {
        match c {
            'V' => Some(Self::View),
            'O' => Some(Self::Operate),
            'M' => Some(Self::Manage),
            'A' => Some(Self::Administer),
            _ => None,
        }
    }

    fn letter(self) -> char {
        match self {
            Self::View => 'V',
            Self::Operate => 'O',
            Self::Manage => 'M',
            Self::Administer => 'A',
        }
    }
}

/// Access column: `R V`, `RW VM`, `R[W] VA F`, `O T` ...
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Access {
    pub read: bool,
    pub write: bool,
    pub optional_write: bool,
    pub read_privilege: Option<Privilege>,
    pub write_privilege: Option<Privilege>,
    pub invoke_privilege: Option<Privilege>,
    pub fabric_scoped: bool,
    pub fabric_sensitive: bool,
    pub timed: bool,
}

impl Access {
    pub fn parse(text: &str) -> Access {
        let mut access = Access::default();
        for token in text.split(|c: char| c.is_whitespace() || c == ',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let upper = token.to_ascii_uppercase();
            if upper.chars().all(|c| matches!(c, 'R' | 'W' | '[' | ']')) {
                access.read |= upper.contains('R');
                access.optional_write |= upper.contains("[W]");
                access.write |= upper.contains('W') && !access.optional_write;
            } else if let Some(privileges) = upper
                .chars()
                .map(Privilege::from_letter)
                .collect::<Option<Vec<_>>>()
            {
                if !access.read && !access.write && !access.optional_write && privileges.len() == 1
                {
                    access.invoke_privilege = privileges.first().copied();
                } else {
                    access.read_privilege = privileges.first().copied();
                    access.write_privilege = privileges.get(1).copied();
                }
            } else {
                for c in upper.chars() {
                    match c {
                        'F' => access.fabric_scoped = true,
                        'S' => access.fabric_sensitive = true,
                        'T' => access.timed = true,
                        _ => {}
                    }
                }
            }
        }
        access
    }

    pub fn is_empty(&self) -> bool {
        *self == Access::default()
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        let mut rw = String::new();
        if self.read {
            rw.push('R');
        }
        if self.optional_write {
            rw.push_str("[W]");
        } else if self.write {
            rw.push('W');
        }
        if !rw.is_empty() {
            parts.push(rw);
        }
        let privileges: String = [self.read_privilege, self.write_privilege, self.invoke_privilege]
            .into_iter()
            .flatten()
            .map(Privilege::letter)
            .collect();
        if !privileges.is_empty() {
            parts.push(privileges);
        }
        if self.fabric_scoped {
            parts.push("F".to_string());
        }
        if self.fabric_sensitive {
            parts.push("S".to_string());
        }
        if self.timed {
            parts.push("T".to_string());
        }
        f.write_str(&parts.join(" "))
    }
}
