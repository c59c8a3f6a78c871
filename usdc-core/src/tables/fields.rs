//! Field table: pairs of `(token-index, representation-word)`, deduplicated
//! so that two identical `(name, value)` registrations return the same
//! field index. Mirrors the prototype's `fields`/`reps`/`repsMap` triple.

use std::collections::HashMap;

use crate::rep::Representation;

#[derive(Default)]
pub struct FieldTable {
    field_tokens: Vec<u32>,
    reps: Vec<u64>,
    dedup: HashMap<(u32, u64), u32>,
}

impl FieldTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `(field_token, rep)`, returning the (possibly pre-existing)
    /// field index.
    pub fn add(&mut self, field_token: u32, rep: Representation) -> u32 {
        let word = rep.encode();
        let key = (field_token, word);
        if let Some(&idx) = self.dedup.get(&key) {
            return idx;
        }
        let idx = self.field_tokens.len() as u32;
        self.dedup.insert(key, idx);
        self.field_tokens.push(field_token);
        self.reps.push(word);
        idx
    }

    pub fn len(&self) -> usize {
        self.field_tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.field_tokens.is_empty()
    }

    pub fn field_tokens(&self) -> &[u32] {
        &self.field_tokens
    }

    pub fn reps(&self) -> &[u64] {
        &self.reps
    }

    pub fn from_parts(field_tokens: Vec<u32>, reps: Vec<u64>) -> Self {
        let dedup = field_tokens
            .iter()
            .zip(reps.iter())
            .enumerate()
            .map(|(i, (&t, &r))| ((t, r), i as u32))
            .collect();
        Self {
            field_tokens,
            reps,
            dedup,
        }
    }
}
