//! Write-data cache: `(fingerprint, value-type) -> file offset`, so two
//! fields writing byte-identical payloads share one out-of-line blob.
//!
//! `Fingerprint` canonicalises whatever sequence the encoder is about to
//! emit into a hashable form; floating-point components go through
//! `ordered_float::OrderedFloat` since `f32`/`f64` aren't `Eq`/`Hash` on
//! their own. Scalar vs. array call sites are kept apart by the `array`
//! flag on `CacheKey`: the source format reuses the same `ValueType` tag
//! for a lone vector and an array of vectors, so the type alone can't
//! distinguish the two shapes.

use std::collections::HashMap;

use ordered_float::OrderedFloat;

use crate::valuetype::ValueType;

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Fingerprint {
    TokenIndices(Vec<u32>),
    Ints(Vec<i32>),
    Floats(Vec<OrderedFloat<f32>>),
    Doubles(Vec<OrderedFloat<f64>>),
}

impl Fingerprint {
    pub fn floats(values: &[f32]) -> Self {
        Fingerprint::Floats(values.iter().copied().map(OrderedFloat).collect())
    }

    pub fn doubles(values: &[f64]) -> Self {
        Fingerprint::Doubles(values.iter().copied().map(OrderedFloat).collect())
    }
}

#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct CacheKey {
    pub ty: ValueType,
    pub array: bool,
    pub fingerprint: Fingerprint,
}

impl CacheKey {
    pub fn new(ty: ValueType, array: bool, fingerprint: Fingerprint) -> Self {
        Self { ty, array, fingerprint }
    }
}

#[derive(Default)]
pub struct WriteDataCache {
    map: HashMap<CacheKey, u64>,
}

impl WriteDataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<u64> {
        self.map.get(key).copied()
    }

    pub fn insert(&mut self, key: CacheKey, offset: u64) {
        self.map.insert(key, offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn identical_float_fingerprints_hit_the_cache() {
        let mut cache = WriteDataCache::new();
        let key = CacheKey::new(ValueType::Float, true, Fingerprint::floats(&[1.0, 2.0, 3.0]));
        assert!(cache.get(&key).is_none());
        cache.insert(key.clone(), 128);
        assert_eq!(cache.get(&key), Some(128));
    }

    #[test]
    fn scalar_and_array_shapes_dont_collide() {
        let mut cache = WriteDataCache::new();
        let scalar = CacheKey::new(ValueType::Vec3f, false, Fingerprint::floats(&[1.0, 2.0, 3.0]));
        let array = CacheKey::new(ValueType::Vec3f, true, Fingerprint::floats(&[1.0, 2.0, 3.0]));
        cache.insert(scalar.clone(), 10);
        assert_ne!(scalar, array);
        assert!(cache.get(&array).is_none());
    }
}
