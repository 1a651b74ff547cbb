//! Anchor index and cross-reference lookup.
//!
//! Every anchor in every document is collected once. Anchors that share an
//! identifier are renamed from their structure (enclosing sections, then the
//! document stem, then a counter) so that each ends up with a distinct final
//! id. Nothing about the result depends on the order documents were supplied
//! in.


use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use crate::base::DocumentId;
use crate::doc::{Document, Element, ElementPath, Inline, Section};

/// A collected anchor with its final (disambiguated) id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub id: SmolStr,
    pub raw_id: SmolStr,
    pub label: Option<String>,
    pub document: DocumentId,
    pub path: ElementPath,
}

/// An enclosing section of an anchor.
#[derive(Debug, Clone)]
struct Ancestor {
    path: ElementPath,
    anchored: bool,
    name: String,
}

#[derive(Debug, Clone)]
struct Candidate {
    raw_id: SmolStr,
    label: Option<String>,
    document: DocumentId,
    stem: SmolStr,
    doc_path: SmolStr,
    path: ElementPath,
    /// Innermost first.
    ancestors: Vec<Ancestor>,
}

impl Candidate {
    fn order_key(&self) -> (&SmolStr, &ElementPath) {
        (&self.doc_path, &self.path)
    }
}

#[derive(Debug, Default)]
pub struct AnchorIndex {
    /// In structural order: by document path, then element path.
    anchors: Vec<Anchor>,
    by_id: FxHashMap<SmolStr, usize>,
    by_raw: FxHashMap<SmolStr, Vec<usize>>,
    by_location: FxHashMap<(DocumentId, ElementPath), usize>,
}

impl AnchorIndex {
    pub fn build(documents: &[Document]) -> Self {
        let mut candidates = Vec::new();
        for (index, document) in documents.iter().enumerate() {
            let id = DocumentId::new(index);
            let mut ancestors = Vec::new();
            for (i, section) in document.sections.iter().enumerate() {
                collect_section(
                    id,
                    document,
                    section,
                    ElementPath::root(i),
                    &mut ancestors,
                    &mut candidates,
                );
            }
        }
        candidates.sort_by(|a, b| a.order_key().cmp(&b.order_key()));

        let final_ids = disambiguate(&candidates);
        let mut index = AnchorIndex::default();
        for (candidate, id) in candidates.into_iter().zip(final_ids) {
            let slot = index.anchors.len();
            index.by_id.insert(id.clone(), slot);
            index
                .by_raw
                .entry(candidate.raw_id.clone())
                .or_default()
                .push(slot);
            index
                .by_location
                .insert((candidate.document, candidate.path.clone()), slot);
            index.anchors.push(Anchor {
                id,
                raw_id: candidate.raw_id,
                label: candidate.label,
                document: candidate.document,
                path: candidate.path,
            });
        }
        let renamed = index.anchors.iter().filter(|a| a.id != a.raw_id).count();
        tracing::debug!(anchors = index.anchors.len(), renamed, "anchor index built");
        index
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn anchors(&self) -> impl Iterator<Item = &Anchor> {
        self.anchors.iter()
    }

    /// Anchor by final id.
    pub fn get(&self, id: &str) -> Option<&Anchor> {
        self.by_id.get(id).map(|&slot| &self.anchors[slot])
    }

    /// Anchor of the element at `path`.
    pub fn at(&self, document: DocumentId, path: &ElementPath) -> Option<&Anchor> {
        self.by_location
            .get(&(document, path.clone()))
            .map(|&slot| &self.anchors[slot])
    }

    /// Resolve the id written in a cross-reference. Among anchors sharing
    /// that raw id, prefer one in the referencing document with the longest
    /// section path in common with `origin`; otherwise the first in
    /// structural order. An id that is already final resolves directly.
    pub fn lookup(&self, raw_id: &str, document: DocumentId, origin: &ElementPath) -> Option<&Anchor> {
        let Some(slots) = self.by_raw.get(raw_id) else {
            return self.get(raw_id);
        };
        slots
            .iter()
            .map(|&slot| &self.anchors[slot])
            .enumerate()
            .max_by_key(|(order, anchor)| {
                let same_document = anchor.document == document;
                let shared = if same_document {
                    anchor.path.common_prefix(origin)
                } else {
                    0
                };
                (same_document, shared, std::cmp::Reverse(*order))
            })
            .map(|(_, anchor)| anchor)
    }

    /// Point every cross-reference at its anchor's final id, dropping a
    /// label that only repeats the anchor's own label.
    pub fn rewrite_cross_references(&self, documents: &mut [Document]) {
        for (index, document) in documents.iter_mut().enumerate() {
            let id = DocumentId::new(index);
            for (i, section) in document.sections.iter_mut().enumerate() {
                self.rewrite_section(id, section, &ElementPath::root(i));
            }
        }
    }

    fn rewrite_section(&self, document: DocumentId, section: &mut Section, path: &ElementPath) {
        for (i, child) in section.children.iter_mut().enumerate() {
            let child_path = path.child(i);
            match child {
                Element::Section(s) => self.rewrite_section(document, s, &child_path),
                Element::Table(table) => {
                    for (r, row) in table.rows.iter_mut().enumerate() {
                        for (c, cell) in row.cells.iter_mut().enumerate() {
                            let origin = child_path.child(r).child(c);
                            self.rewrite_inlines(document, &mut cell.content, &origin);
                        }
                    }
                }
                Element::Paragraph(paragraph) => {
                    self.rewrite_inlines(document, &mut paragraph.content, &child_path)
                }
                Element::Anchor(_) => {}
            }
        }
    }

    fn rewrite_inlines(&self, document: DocumentId, content: &mut [Inline], origin: &ElementPath) {
        for inline in content {
            match inline {
                Inline::CrossReference(xref) => {
                    if let Some(anchor) = self.lookup(&xref.id, document, origin) {
                        xref.id = anchor.id.clone();
                        if xref.label.as_deref() == anchor.label.as_deref() {
                            xref.label = None;
                        }
                    }
                }
                Inline::Formatted(inner) => self.rewrite_inlines(document, inner, origin),
                _ => {}
            }
        }
    }
}

// ============================================================================
// COLLECTION
// ============================================================================

fn collect_section(
    id: DocumentId,
    document: &Document,
    section: &Section,
    path: ElementPath,
    ancestors: &mut Vec<Ancestor>,
    out: &mut Vec<Candidate>,
) {
    let candidate = |raw_id: &SmolStr, label: Option<String>, path: ElementPath, ancestors: &[Ancestor]| Candidate {
        raw_id: raw_id.clone(),
        label,
        document: id,
        stem: document.stem().into(),
        doc_path: document.path.clone(),
        path,
        ancestors: ancestors.iter().rev().cloned().collect(),
    };

    if let Some(raw) = &section.attributes.id {
        let label = section
            .attributes
            .label
            .clone()
            .unwrap_or_else(|| section.name.clone());
        out.push(candidate(raw, Some(label), path.clone(), ancestors));
    }

    ancestors.push(Ancestor {
        path: path.clone(),
        anchored: section.attributes.id.is_some(),
        name: section.name.clone(),
    });
    for (i, child) in section.children.iter().enumerate() {
        let child_path = path.child(i);
        match child {
            Element::Section(s) => collect_section(id, document, s, child_path, ancestors, out),
            Element::Table(table) => {
                if let Some(raw) = &table.attributes.id {
                    out.push(candidate(raw, table.attributes.label.clone(), child_path.clone(), ancestors));
                }
                for (r, row) in table.rows.iter().enumerate() {
                    for (c, cell) in row.cells.iter().enumerate() {
                        let cell_path = child_path.child(r).child(c);
                        for (k, (raw, label)) in inline_anchors(&cell.content).into_iter().enumerate() {
                            out.push(candidate(&raw, label, cell_path.child(k), ancestors));
                        }
                    }
                }
            }
            Element::Paragraph(paragraph) => {
                for (k, (raw, label)) in inline_anchors(&paragraph.content).into_iter().enumerate() {
                    out.push(candidate(&raw, label, child_path.child(k), ancestors));
                }
            }
            Element::Anchor(anchor) => {
                out.push(candidate(&anchor.id, anchor.label.clone(), child_path, ancestors));
            }
        }
    }
    ancestors.pop();
}

fn inline_anchors(content: &[Inline]) -> Vec<(SmolStr, Option<String>)> {
    let mut out = Vec::new();
    for inline in content {
        match inline {
            Inline::Anchor { id, label } => out.push((id.clone(), label.clone())),
            Inline::Formatted(inner) => out.extend(inline_anchors(inner)),
            _ => {}
        }
    }
    out
}

// ============================================================================
// DISAMBIGUATION
// ============================================================================

/// `Data Types` → `_data_types`
fn name_id(name: &str) -> String {
    let words: Vec<String> = name
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    format!("_{}", words.join("_"))
}

/// Final ids for `candidates`, which must be in structural order.
fn disambiguate(candidates: &[Candidate]) -> Vec<SmolStr> {
    let mut final_ids: Vec<Option<SmolStr>> = vec![None; candidates.len()];
    let mut location: FxHashMap<(DocumentId, &ElementPath), usize> = FxHashMap::default();
    for (slot, candidate) in candidates.iter().enumerate() {
        location.insert((candidate.document, &candidate.path), slot);
    }
    let mut taken: FxHashSet<SmolStr> = FxHashSet::default();
    let mut raw_counts: FxHashMap<&str, usize> = FxHashMap::default();
    for candidate in candidates {
        *raw_counts.entry(candidate.raw_id.as_str()).or_insert(0) += 1;
    }

    let mut depths: Vec<usize> = candidates.iter().map(|c| c.path.depth()).collect();
    depths.sort_unstable();
    depths.dedup();

    for depth in depths {
        let group: Vec<usize> = (0..candidates.len())
            .filter(|&slot| candidates[slot].path.depth() == depth)
            .collect();
        let mut ids: Vec<String> = group
            .iter()
            .map(|&slot| candidates[slot].raw_id.to_string())
            .collect();
        let mut level = vec![0usize; group.len()];
        let mut stemmed = vec![false; group.len()];

        // Every anchor whose raw id is shared, at any depth, gets at least
        // one prefix; later rounds only touch ids that still clash.
        let mut pending: Vec<usize> = (0..group.len())
            .filter(|&i| raw_counts[candidates[group[i]].raw_id.as_str()] > 1)
            .collect();
        loop {
            if pending.is_empty() {
                pending = colliding(&ids, &taken);
            }
            if pending.is_empty() {
                break;
            }
            let mut changed = false;
            for i in std::mem::take(&mut pending) {
                let candidate = &candidates[group[i]];
                if let Some(ancestor) = candidate.ancestors.get(level[i]) {
                    let prefix = if ancestor.anchored {
                        location
                            .get(&(candidate.document, &ancestor.path))
                            .and_then(|&slot| final_ids[slot].as_ref())
                            .map(|id| id.to_string())
                            .unwrap_or_else(|| name_id(&ancestor.name))
                    } else {
                        name_id(&ancestor.name)
                    };
                    ids[i] = format!("{prefix}_{}", ids[i]);
                    level[i] += 1;
                    changed = true;
                } else if !stemmed[i] {
                    ids[i] = format!("{}_{}", candidate.stem, ids[i]);
                    stemmed[i] = true;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        // Structural duplicates: first keeps the id, later ones count up.
        let mut seen: FxHashMap<String, usize> = FxHashMap::default();
        for (i, &slot) in group.iter().enumerate() {
            let mut id = ids[i].clone();
            let count = seen.entry(id.clone()).or_insert(0);
            *count += 1;
            if *count > 1 || taken.contains(id.as_str()) {
                let mut n = (*count).max(2);
                loop {
                    let next = format!("{id}_{n}");
                    if !taken.contains(next.as_str()) && !ids.contains(&next) {
                        id = next;
                        break;
                    }
                    n += 1;
                }
            }
            let id = SmolStr::from(id);
            taken.insert(id.clone());
            final_ids[slot] = Some(id);
        }
    }

    final_ids
        .into_iter()
        .zip(candidates)
        .map(|(id, candidate)| id.unwrap_or_else(|| candidate.raw_id.clone()))
        .collect()
}

/// Positions in `ids` that clash with another entry or an already final id.
fn colliding(ids: &[String], taken: &FxHashSet<SmolStr>) -> Vec<usize> {
    let mut counts: FxHashMap<&str, usize> = FxHashMap::default();
    for id in ids {
        *counts.entry(id.as_str()).or_insert(0) += 1;
    }
    (0..ids.len())
        .filter(|&i| counts[ids[i].as_str()] > 1 || taken.contains(ids[i].as_str()))
        .collect()
}
