//! Field sets: a single flat, `-1`-terminated sequence of field indices.
//! A spec references one run by the index its first element starts at.

#[derive(Default)]
pub struct FieldSetTable {
    flat: Vec<i32>,
}

impl FieldSetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `indices` followed by the `-1` sentinel, returning the
    /// offset the run starts at.
    pub fn add_field_set(&mut self, indices: &[u32]) -> u64 {
        let start = self.flat.len() as u64;
        self.flat.extend(indices.iter().map(|&i| i as i32));
        self.flat.push(-1);
        start
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.flat
    }

    pub fn from_flat(flat: Vec<i32>) -> Self {
        Self { flat }
    }

    /// Walks the flat array from `offset` until the sentinel.
    pub fn field_set_at(&self, offset: u64) -> Vec<u32> {
        let mut out = Vec::new();
        let mut i = offset as usize;
        while let Some(&v) = self.flat.get(i) {
            if v < 0 {
                break;
            }
            out.push(v as u32);
            i += 1;
        }
        out
    }
}
