//! Field encoder dispatch (§4.4): one method per value-type family, each
//! deciding inline vs out-of-line, writing bytes to the sink, consulting
//! the write-data cache before emitting an out-of-line blob, and finally
//! registering the field with the representation table.

pub mod timesamples;

use tracing::trace;

use crate::{
    error::CrateError,
    ioutil::Writer,
    rep::Representation,
    tables::cache::{CacheKey, Fingerprint},
    valuetype::{Specifier, ValueType},
    value::Value,
    writer::{strip_chars, CrateWriter},
};
use usdc_base::Result;

impl<W: Writer> CrateWriter<W> {
    /// Registers `value` under `field_name`, inferring its `ValueType`
    /// from the variant unless `ty_override` names one explicitly —
    /// mirroring the source's `type = UnregisteredValue` default-then-
    /// infer argument (§2b).
    pub fn add_field(&mut self, field_name: &str, value: Value, ty_override: Option<ValueType>) -> Result<u32> {
        let ty = ty_override.unwrap_or_else(|| value.inferred_type());
        match (&value, ty) {
            (Value::Token(s), ValueType::Token) => self.add_field_token_scalar(field_name, s),
            (Value::TokenArray(v), ValueType::Token) => self.add_field_token_array(field_name, v),
            (Value::Asset(s), ValueType::Asset) => self.add_field_asset(field_name, s),
            (Value::TokenVector(v), ValueType::TokenVector) => self.add_field_token_vector(field_name, v),
            (Value::PathListOpAdd(p), ValueType::PathListOp) => self.add_field_path_list_op(field_name, *p),
            (Value::PathVectorSingle(p), ValueType::PathVector) => self.add_field_path_vector(field_name, *p),
            (Value::Specifier(s), ValueType::Specifier) => self.add_field_specifier(field_name, *s),
            (Value::Int(i), ValueType::Int) => self.add_field_int_scalar(field_name, *i),
            (Value::IntArray(v), ValueType::Int) => self.add_field_int_array(field_name, v),
            (Value::Float(f), ValueType::Float) => self.add_field_float_scalar(field_name, *f),
            (Value::FloatArray(v), ValueType::Float) => self.add_field_float_array(field_name, v),
            (Value::Double(d), ValueType::Double) => self.add_field_double_scalar(field_name, *d),
            (Value::DoubleArray(v), ValueType::Double) => self.add_field_double_array(field_name, v),
            (Value::Vec2i(v), ValueType::Vec2i) => self.add_field_vec_i(field_name, v, ValueType::Vec2i),
            (Value::Vec3i(v), ValueType::Vec3i) => self.add_field_vec_i(field_name, v, ValueType::Vec3i),
            (Value::Vec4i(v), ValueType::Vec4i) => self.add_field_vec_i(field_name, v, ValueType::Vec4i),
            (Value::Vec2f(v), ValueType::Vec2f) => self.add_field_vec_f(field_name, v, ValueType::Vec2f),
            (Value::Vec3f(v), ValueType::Vec3f) => self.add_field_vec_f(field_name, v, ValueType::Vec3f),
            (Value::Vec4f(v), ValueType::Vec4f) => self.add_field_vec_f(field_name, v, ValueType::Vec4f),
            (Value::Vec2fArray(v), ValueType::Vec2f) => self.add_field_vec_f_array::<2>(field_name, v, ValueType::Vec2f),
            (Value::Vec3fArray(v), ValueType::Vec3f) => self.add_field_vec_f_array::<3>(field_name, v, ValueType::Vec3f),
            (Value::Vec4fArray(v), ValueType::Vec4f) => self.add_field_vec_f_array::<4>(field_name, v, ValueType::Vec4f),
            (Value::Vec2d(v), ValueType::Vec2d) => self.add_field_vec_d(field_name, v, ValueType::Vec2d),
            (Value::Vec3d(v), ValueType::Vec3d) => self.add_field_vec_d(field_name, v, ValueType::Vec3d),
            (Value::Vec4d(v), ValueType::Vec4d) => self.add_field_vec_d(field_name, v, ValueType::Vec4d),
            (Value::Vec2dArray(v), ValueType::Vec2d) => self.add_field_vec_d_array::<2>(field_name, v, ValueType::Vec2d),
            (Value::Vec3dArray(v), ValueType::Vec3d) => self.add_field_vec_d_array::<3>(field_name, v, ValueType::Vec3d),
            (Value::Vec4dArray(v), ValueType::Vec4d) => self.add_field_vec_d_array::<4>(field_name, v, ValueType::Vec4d),
            (Value::Matrix2d(m), ValueType::Matrix2d) => self.add_field_matrix::<2>(field_name, std::slice::from_ref(m), false),
            (Value::Matrix3d(m), ValueType::Matrix3d) => self.add_field_matrix::<3>(field_name, std::slice::from_ref(m), false),
            (Value::Matrix4d(m), ValueType::Matrix4d) => self.add_field_matrix::<4>(field_name, std::slice::from_ref(m), false),
            (Value::Matrix2dArray(v), ValueType::Matrix2d) => self.add_field_matrix::<2>(field_name, v, true),
            (Value::Matrix3dArray(v), ValueType::Matrix3d) => self.add_field_matrix::<3>(field_name, v, true),
            (Value::Matrix4dArray(v), ValueType::Matrix4d) => self.add_field_matrix::<4>(field_name, v, true),
            (Value::Bool(b), ValueType::Bool) => self.add_field_bool(field_name, *b),
            (Value::Variability(b), ValueType::Variability) => self.add_field_variability(field_name, *b),
            (Value::TimeSamples(samples), ValueType::TimeSamples) => self.add_field_time_samples(field_name, samples),
            _ => Err(CrateError::TypeUnsupported {
                type_name: value_type_name(ty),
            }
            .into()),
        }
    }

    fn register(&mut self, field_name: &str, rep: Representation) -> Result<u32> {
        self.add_field_rep(field_name, rep)
    }

    fn add_field_token_scalar(&mut self, field_name: &str, data: &str) -> Result<u32> {
        let normalized = strip_chars(data, '"');
        let token = self.intern_token(&normalized);
        let rep = Representation::new(ValueType::Token, false, true, false, token as u64)?;
        self.register(field_name, rep)
    }

    fn add_field_token_array(&mut self, field_name: &str, data: &[String]) -> Result<u32> {
        let tokens: Vec<u32> = data.iter().map(|t| self.intern_token(&strip_chars(t, '"'))).collect();
        let key = CacheKey::new(
            ValueType::Token,
            true,
            Fingerprint::TokenIndices(tokens.clone()),
        );
        let offset = match self.cache.get(&key) {
            Some(offset) => offset,
            None => {
                let offset = self.pos()?;
                self.writer.write_u32(tokens.len() as u32)?;
                for &t in &tokens {
                    self.writer.write_u32(t)?;
                }
                self.cache.insert(key, offset);
                offset
            }
        };
        let rep = Representation::new(ValueType::Token, true, false, false, offset)?;
        self.register(field_name, rep)
    }

    fn add_field_asset(&mut self, field_name: &str, data: &str) -> Result<u32> {
        let normalized = strip_chars(data, '@');
        let token = self.intern_token(&normalized);
        let rep = Representation::new(ValueType::Asset, false, true, false, token as u64)?;
        self.register(field_name, rep)
    }

    fn add_field_token_vector(&mut self, field_name: &str, data: &[String]) -> Result<u32> {
        let tokens: Vec<u32> = data.iter().map(|t| self.intern_token(&strip_chars(t, '"'))).collect();
        let key = CacheKey::new(
            ValueType::TokenVector,
            false,
            Fingerprint::TokenIndices(tokens.clone()),
        );
        let offset = match self.cache.get(&key) {
            Some(offset) => offset,
            None => {
                let offset = self.pos()?;
                self.writer.write_u64(tokens.len() as u64)?;
                for &t in &tokens {
                    self.writer.write_u32(t)?;
                }
                self.writer.write_all(&[0u8; 4])?;
                self.cache.insert(key, offset);
                offset
            }
        };
        let rep = Representation::new(ValueType::TokenVector, false, false, false, offset)?;
        self.register(field_name, rep)
    }

    fn add_field_path_list_op(&mut self, field_name: &str, path_index: i32) -> Result<u32> {
        const OP_ADD: u64 = 259;
        let offset = self.pos()?;
        self.writer.write_u64(OP_ADD)?;
        self.writer.write_all(&[0u8; 1])?;
        self.writer.write_i32(path_index)?;
        let rep = Representation::new(ValueType::PathListOp, false, false, false, offset)?;
        self.register(field_name, rep)
    }

    fn add_field_path_vector(&mut self, field_name: &str, path_index: i32) -> Result<u32> {
        let offset = self.pos()?;
        self.writer.write_u64(1)?;
        self.writer.write_i32(path_index)?;
        let rep = Representation::new(ValueType::PathVector, false, false, false, offset)?;
        self.register(field_name, rep)
    }

    fn add_field_specifier(&mut self, field_name: &str, spec: Specifier) -> Result<u32> {
        let rep = Representation::new(ValueType::Specifier, false, true, false, spec as u64)?;
        self.register(field_name, rep)
    }

    fn add_field_int_scalar(&mut self, field_name: &str, data: i32) -> Result<u32> {
        // Sign-extend into the full 48-bit payload, matching the source's
        // `payload & PAYLOAD_MASK` on a two's-complement Python int: a
        // zero-extending `as u32 as u64` would leave bits 32-47 clear for
        // negative values, diverging from the on-disk representation word.
        const PAYLOAD_MASK: u64 = (1u64 << 48) - 1;
        let payload = (data as i64 as u64) & PAYLOAD_MASK;
        let rep = Representation::new(ValueType::Int, false, true, false, payload)?;
        self.register(field_name, rep)
    }

    fn add_field_int_array(&mut self, field_name: &str, data: &[i32]) -> Result<u32> {
        let compress = data.len() >= 16;
        let key = CacheKey::new(ValueType::Int, true, Fingerprint::Ints(data.to_vec()));
        let offset = match self.cache.get(&key) {
            Some(offset) => {
                trace!(field = field_name, offset, "int array write-data cache hit");
                offset
            }
            None => {
                let offset = self.pos()?;
                self.writer.write_u32(data.len() as u32)?;
                if compress {
                    crate::compress::write_compressed_i32(&mut self.writer, data)?;
                } else {
                    for &v in data {
                        self.writer.write_i32(v)?;
                    }
                }
                self.cache.insert(key, offset);
                offset
            }
        };
        let rep = Representation::new(ValueType::Int, true, false, compress, offset)?;
        self.register(field_name, rep)
    }

    fn add_field_float_scalar(&mut self, field_name: &str, data: f32) -> Result<u32> {
        let bits = data.to_le_bytes();
        let payload = u32::from_le_bytes(bits) as u64;
        let rep = Representation::new(ValueType::Float, false, true, false, payload)?;
        self.register(field_name, rep)
    }

    fn add_field_float_array(&mut self, field_name: &str, data: &[f32]) -> Result<u32> {
        let key = CacheKey::new(ValueType::Float, true, Fingerprint::floats(data));
        let offset = match self.cache.get(&key) {
            Some(offset) => offset,
            None => {
                let offset = self.pos()?;
                self.writer.write_u32(data.len() as u32)?;
                for &f in data {
                    self.writer.write_f32(f)?;
                }
                self.cache.insert(key, offset);
                offset
            }
        };
        let rep = Representation::new(ValueType::Float, true, false, false, offset)?;
        self.register(field_name, rep)
    }

    /// The source packs a scalar double field's payload from the IEEE
    /// bits of the value cast to `f32`, not the `f64`'s own 8 bytes. This
    /// is very likely a bug in the prototype, but write and read must stay
    /// mutually consistent, so it's replicated verbatim here; see the
    /// matching note on the reader's double-scalar path.
    fn add_field_double_scalar(&mut self, field_name: &str, data: f64) -> Result<u32> {
        let as_f32 = data as f32;
        let payload = u32::from_le_bytes(as_f32.to_le_bytes()) as u64;
        let rep = Representation::new(ValueType::Double, false, true, false, payload)?;
        self.register(field_name, rep)
    }

    fn add_field_double_array(&mut self, field_name: &str, data: &[f64]) -> Result<u32> {
        let key = CacheKey::new(ValueType::Double, true, Fingerprint::doubles(data));
        let offset = match self.cache.get(&key) {
            Some(offset) => offset,
            None => {
                let offset = self.pos()?;
                self.writer.write_u32(data.len() as u32)?;
                for &d in data {
                    self.writer.write_f64(d)?;
                }
                self.cache.insert(key, offset);
                offset
            }
        };
        let rep = Representation::new(ValueType::Double, true, false, false, offset)?;
        self.register(field_name, rep)
    }

    fn add_field_vec_i(&mut self, field_name: &str, data: &[i32], ty: ValueType) -> Result<u32> {
        // Integer vector components always fit a signed 32-bit lane; the
        // source's "whole byte" inline fast path is float/double-only, so
        // these are always written out of line as a single row.
        let key = CacheKey::new(ty, false, Fingerprint::Ints(data.to_vec()));
        let offset = match self.cache.get(&key) {
            Some(offset) => offset,
            None => {
                let offset = self.pos()?;
                for &v in data {
                    self.writer.write_i32(v)?;
                }
                self.cache.insert(key, offset);
                offset
            }
        };
        let rep = Representation::new(ty, false, false, false, offset)?;
        self.register(field_name, rep)
    }

    fn add_field_vec_f(&mut self, field_name: &str, data: &[f32], ty: ValueType) -> Result<u32> {
        if is_whole_bytes(data) {
            let payload = pack_whole_bytes(data);
            let rep = Representation::new(ty, false, true, false, payload)?;
            return self.register(field_name, rep);
        }
        let key = CacheKey::new(ty, false, Fingerprint::floats(data));
        let offset = match self.cache.get(&key) {
            Some(offset) => offset,
            None => {
                let offset = self.pos()?;
                for &v in data {
                    self.writer.write_f32(v)?;
                }
                self.cache.insert(key, offset);
                offset
            }
        };
        let rep = Representation::new(ty, false, false, false, offset)?;
        self.register(field_name, rep)
    }

    fn add_field_vec_f_array<const N: usize>(&mut self, field_name: &str, data: &[[f32; N]], ty: ValueType) -> Result<u32> {
        let flat: Vec<f32> = data.iter().flatten().copied().collect();
        let key = CacheKey::new(ty, true, Fingerprint::floats(&flat));
        let offset = match self.cache.get(&key) {
            Some(offset) => offset,
            None => {
                let offset = self.pos()?;
                self.writer.write_u32(data.len() as u32)?;
                for v in data {
                    for &c in v {
                        self.writer.write_f32(c)?;
                    }
                }
                self.cache.insert(key, offset);
                offset
            }
        };
        let rep = Representation::new(ty, true, false, false, offset)?;
        self.register(field_name, rep)
    }

    fn add_field_vec_d(&mut self, field_name: &str, data: &[f64], ty: ValueType) -> Result<u32> {
        let key = CacheKey::new(ty, false, Fingerprint::doubles(data));
        let offset = match self.cache.get(&key) {
            Some(offset) => offset,
            None => {
                let offset = self.pos()?;
                for &v in data {
                    self.writer.write_f64(v)?;
                }
                self.cache.insert(key, offset);
                offset
            }
        };
        let rep = Representation::new(ty, false, false, false, offset)?;
        self.register(field_name, rep)
    }

    fn add_field_vec_d_array<const N: usize>(&mut self, field_name: &str, data: &[[f64; N]], ty: ValueType) -> Result<u32> {
        let flat: Vec<f64> = data.iter().flatten().copied().collect();
        let key = CacheKey::new(ty, true, Fingerprint::doubles(&flat));
        let offset = match self.cache.get(&key) {
            Some(offset) => offset,
            None => {
                let offset = self.pos()?;
                self.writer.write_u32(data.len() as u32)?;
                for v in data {
                    for &c in v {
                        self.writer.write_f64(c)?;
                    }
                }
                self.cache.insert(key, offset);
                offset
            }
        };
        let rep = Representation::new(ty, true, false, false, offset)?;
        self.register(field_name, rep)
    }

    fn add_field_matrix<const N: usize>(&mut self, field_name: &str, data: &[[[f64; N]; N]], array: bool) -> Result<u32> {
        let ty = match N {
            2 => ValueType::Matrix2d,
            3 => ValueType::Matrix3d,
            4 => ValueType::Matrix4d,
            _ => unreachable!("matrix dimension must be 2, 3, or 4"),
        };
        let flat: Vec<f64> = data.iter().flatten().flatten().copied().collect();
        let key = CacheKey::new(ty, array, Fingerprint::doubles(&flat));
        let offset = match self.cache.get(&key) {
            Some(offset) => offset,
            None => {
                let offset = self.pos()?;
                if array {
                    self.writer.write_u32(data.len() as u32)?;
                }
                for matrix in data {
                    for row in matrix {
                        for &c in row {
                            self.writer.write_f64(c)?;
                        }
                    }
                }
                self.cache.insert(key, offset);
                offset
            }
        };
        let rep = Representation::new(ty, array, false, false, offset)?;
        self.register(field_name, rep)
    }

    fn add_field_bool(&mut self, field_name: &str, data: bool) -> Result<u32> {
        let rep = Representation::new(ValueType::Bool, false, true, false, data as u64)?;
        self.register(field_name, rep)
    }

    fn add_field_variability(&mut self, field_name: &str, data: bool) -> Result<u32> {
        let rep = Representation::new(ValueType::Variability, false, true, false, data as u64)?;
        self.register(field_name, rep)
    }
}

fn is_whole_bytes(values: &[f32]) -> bool {
    values.iter().all(|&f| {
        f.fract() == 0.0 && {
            let i = f as i64;
            i >= i8::MIN as i64 && i <= i8::MAX as i64
        }
    })
}

fn pack_whole_bytes(values: &[f32]) -> u64 {
    let mut payload: u64 = 0;
    for (i, &v) in values.iter().enumerate() {
        let byte = v as i64 as i8 as u8;
        payload |= (byte as u64) << (8 * i);
    }
    payload
}

fn value_type_name(ty: ValueType) -> &'static str {
    match ty {
        ValueType::Half => "half",
        ValueType::QuatD => "quatd",
        ValueType::QuatF => "quatf",
        ValueType::QuatH => "quath",
        ValueType::Vec2h => "vec2h",
        ValueType::Vec3h => "vec3h",
        ValueType::Vec4h => "vec4h",
        _ => "unsupported",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ioutil::MemWriter, rep::Representation, writer::CrateWriterOptions};
    use test_log::test;

    fn new_writer() -> CrateWriter<MemWriter> {
        CrateWriter::new(MemWriter::new(), CrateWriterOptions::default()).unwrap()
    }

    #[test]
    fn token_scalar_field_is_inline() {
        let mut w = new_writer();
        let idx = w.add_field("typeName", Value::Token("Xform".into()), None).unwrap();
        let rep = Representation::decode(w.fields.reps()[idx as usize]).unwrap();
        assert!(rep.inline);
        assert_eq!(rep.ty, ValueType::Token);
    }

    #[test]
    fn token_text_strips_quotes_before_interning() {
        let mut w = new_writer();
        w.add_field("typeName", Value::Token("\"Xform\"".into()), None).unwrap();
        assert_eq!(w.tokens.get(0), Some("Xform"));
    }

    #[test]
    fn asset_text_strips_at_delimiters() {
        let mut w = new_writer();
        w.add_field("filename", Value::Asset("@textures/a.png@".into()), None)
            .unwrap();
        assert_eq!(w.tokens.get(0), Some("textures/a.png"));
    }

    #[test]
    fn negative_int_scalar_sign_extends_into_the_48_bit_payload() {
        let mut w = new_writer();
        let idx = w.add_field("startFrame", Value::Int(-1), None).unwrap();
        let rep = Representation::decode(w.fields.reps()[idx as usize]).unwrap();
        assert_eq!(rep.payload, (1u64 << 48) - 1);
        assert_eq!(rep.payload as u32 as i32, -1);
    }

    #[test]
    fn int_array_of_sixteen_is_compressed() {
        let mut w = new_writer();
        let values: Vec<i32> = (1..=16).collect();
        let idx = w.add_field("indices", Value::IntArray(values), None).unwrap();
        let rep = Representation::decode(w.fields.reps()[idx as usize]).unwrap();
        assert!(rep.compressed);
    }

    #[test]
    fn int_array_under_sixteen_is_not_compressed() {
        let mut w = new_writer();
        let values: Vec<i32> = vec![1, 2, 3];
        let idx = w.add_field("indices", Value::IntArray(values), None).unwrap();
        let rep = Representation::decode(w.fields.reps()[idx as usize]).unwrap();
        assert!(!rep.compressed);
    }

    #[test]
    fn identical_int_arrays_under_different_names_share_one_blob() {
        let mut w = new_writer();
        let values: Vec<i32> = (1..=16).collect();
        let a = w.add_field("a", Value::IntArray(values.clone()), None).unwrap();
        let b = w.add_field("b", Value::IntArray(values), None).unwrap();
        let rep_a = Representation::decode(w.fields.reps()[a as usize]).unwrap();
        let rep_b = Representation::decode(w.fields.reps()[b as usize]).unwrap();
        assert_eq!(rep_a.payload, rep_b.payload);
    }

    #[test]
    fn whole_byte_vec3f_is_inline_with_no_out_of_line_bytes() {
        let mut w = new_writer();
        let pos_before = w.pos().unwrap();
        let idx = w.add_field("extent", Value::Vec3f([1.0, 2.0, 3.0]), None).unwrap();
        let pos_after = w.pos().unwrap();
        let rep = Representation::decode(w.fields.reps()[idx as usize]).unwrap();
        assert!(rep.inline);
        assert_eq!(pos_before, pos_after);
        assert_eq!(rep.payload & 0xff, 1);
        assert_eq!((rep.payload >> 8) & 0xff, 2);
        assert_eq!((rep.payload >> 16) & 0xff, 3);
    }

    #[test]
    fn non_whole_byte_vec3f_is_out_of_line() {
        let mut w = new_writer();
        let idx = w.add_field("extent", Value::Vec3f([1.5, 2.0, 3.0]), None).unwrap();
        let rep = Representation::decode(w.fields.reps()[idx as usize]).unwrap();
        assert!(!rep.inline);
    }

    #[test]
    fn double_scalar_packs_f32_bits_per_the_known_source_quirk() {
        let mut w = new_writer();
        let idx = w.add_field("radius", Value::Double(2.5), None).unwrap();
        let rep = Representation::decode(w.fields.reps()[idx as usize]).unwrap();
        let expected = u32::from_le_bytes((2.5f32).to_le_bytes()) as u64;
        assert_eq!(rep.payload, expected);
    }

    #[test]
    fn unsupported_type_is_rejected() {
        let mut w = new_writer();
        let err = w.add_field("unused", Value::Bool(true), Some(ValueType::Half));
        assert!(err.is_err());
    }
}
