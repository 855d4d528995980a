use std::sync::Arc;

use crate::dictionary::{DictionaryStore, Snapshot};
use crate::expander::Expandable;
use crate::lexer::{Lexer, Token};

/// A token with at least one sub-word missing from both dictionaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub token: Token,
    pub unknown_parts: Vec<String>,
}

pub struct Checker {
    store: Arc<DictionaryStore>,
}

impl Checker {
    pub fn new(store: Arc<DictionaryStore>) -> Checker {
        Checker { store }
    }

    /// Scans `text` against one snapshot of the dictionaries. Results come
    /// out in document order.
    pub fn scan(&self, text: &str) -> Vec<CheckResult> {
        let snapshot = self.store.snapshot();
        Lexer::new(text)
            .filter_map(|token| {
                let unknown_parts = unknown_in(&snapshot, token.expand());
                if unknown_parts.is_empty() {
                    return None;
                }
                Some(CheckResult {
                    token,
                    unknown_parts,
                })
            })
            .collect()
    }

    pub fn unknown_parts(&self, word: &str) -> Vec<String> {
        unknown_in(&self.store.snapshot(), word.expand())
    }
}

fn unknown_in(snapshot: &Snapshot, parts: Vec<String>) -> Vec<String> {
    parts
        .into_iter()
        .filter(|part| !snapshot.contains(part))
        .collect()
}
