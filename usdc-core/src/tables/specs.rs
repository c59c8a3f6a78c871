//! Spec table: `(path-index, field-set-offset, spec-type-tag)` triples.
//! `path-index` here doubles as the spec's own index, same as the
//! prototype's `addSpec`.

use std::collections::HashMap;

use crate::valuetype::SpecType;

#[derive(Default)]
pub struct SpecTable {
    paths: Vec<i32>,
    fsets: Vec<i32>,
    types: Vec<i32>,
    by_path: HashMap<i32, (i32, i32)>,
}

impl SpecTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_spec(&mut self, fset_offset: u64, spec_type: SpecType) -> u32 {
        let path_index = self.paths.len() as i32;
        let fset = fset_offset as i32;
        let ty = spec_type as i32;
        self.paths.push(path_index);
        self.fsets.push(fset);
        self.types.push(ty);
        self.by_path.insert(path_index, (fset, ty));
        path_index as u32
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> &[i32] {
        &self.paths
    }

    pub fn fsets(&self) -> &[i32] {
        &self.fsets
    }

    pub fn types(&self) -> &[i32] {
        &self.types
    }

    pub fn from_parts(paths: Vec<i32>, fsets: Vec<i32>, types: Vec<i32>) -> Self {
        let by_path = paths
            .iter()
            .zip(fsets.iter().zip(types.iter()))
            .map(|(&p, (&f, &t))| (p, (f, t)))
            .collect();
        Self {
            paths,
            fsets,
            types,
            by_path,
        }
    }

    pub fn lookup(&self, path_index: i32) -> Option<(u64, i32)> {
        self.by_path.get(&path_index).map(|&(f, t)| (f as u64, t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn adds_record_sequential_indices_and_are_looked_up_by_path() {
        let mut table = SpecTable::new();
        let i0 = table.add_spec(0, SpecType::PseudoRoot);
        let i1 = table.add_spec(4, SpecType::Prim);
        assert_eq!((i0, i1), (0, 1));
        assert_eq!(table.lookup(1), Some((4, SpecType::Prim as i32)));
    }
}
