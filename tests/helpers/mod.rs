//! Shared fixtures and assertions for integration tests.

pub mod document_fixtures;
pub mod spec_assertions;
