//! Path table: parallel `(path, token, jump)` streams. `token` is stored
//! negated when the path denotes a prim, a one-bit tag riding along the
//! token index itself rather than a separate flag word.

#[derive(Default)]
pub struct PathTable {
    paths: Vec<i32>,
    tokens: Vec<i32>,
    jumps: Vec<i32>,
}

impl PathTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_path(&mut self, path_index: i32, token_index: i32, jump: i32, is_prim: bool) {
        let token = if is_prim { -token_index } else { token_index };
        self.paths.push(path_index);
        self.tokens.push(token);
        self.jumps.push(jump);
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

    pub fn tokens(&self) -> &[i32] {
        &self.tokens
    }

    pub fn jumps(&self) -> &[i32] {
        &self.jumps
    }

    pub fn from_parts(paths: Vec<i32>, tokens: Vec<i32>, jumps: Vec<i32>) -> Self {
        Self { paths, tokens, jumps }
    }

    /// Absolute token index for path entry `i` (the negation used to flag
    /// prims is an encoding detail, invisible once decoded).
    pub fn token_index_at(&self, i: usize) -> Option<i32> {
        self.tokens.get(i).map(|&t| t.abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn prim_paths_store_negated_token() {
        let mut table = PathTable::new();
        table.add_path(0, 5, 0, true);
        table.add_path(1, 5, 1, false);
        assert_eq!(table.tokens(), &[-5, 5]);
        assert_eq!(table.token_index_at(0), Some(5));
        assert_eq!(table.token_index_at(1), Some(5));
    }

    #[test]
    fn zero_token_stays_zero_when_negated() {
        let mut table = PathTable::new();
        table.add_path(0, 0, 0, true);
        assert_eq!(table.tokens(), &[0]);
    }
}
