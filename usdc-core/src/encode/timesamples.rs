//! Time-sampled track encoder (§4.5). A track is a sequence of `(time,
//! value)` pairs sharing one inner value-type; each sample's value is
//! written once as a raw scalar/array blob (deduplicated within the track),
//! followed by a *times locus* and a *values vector*.
//!
//! The values vector's leading field is the literal constant `8`, not a
//! stored length, so locating the times locus that precedes it falls to
//! the reader: the 8 bytes immediately before the values vector are always
//! an `(offset:u48, type:u8, elem:u8)` triad, whether they're a fresh
//! times blob's self-reference (whose offset equals the values vector's
//! own start, since nothing sits between them) or the tail of a
//! back-reference locus (whose offset points at an earlier times blob's
//! `count` field instead). See `reader.rs` and DESIGN.md.

use std::collections::HashMap;

use crate::{
    error::CrateError,
    ioutil::Writer,
    rep::Representation,
    value::{TimeSample, Value},
    valuetype::ValueType,
    writer::CrateWriter,
};
use usdc_base::Result;

/// Byte length of a freshly-written times locus: `size:u64 | count:u64 |
/// time:f64 × count | payload-offset:u48 | type:u8 | elem:u8`.
pub(crate) fn fresh_locus_len(count: usize) -> u64 {
    24 + 8 * count as u64
}

/// `elem` tag used on each sample's value-vector entry: 0 for a scalar
/// value, 128 for a non-scalar sequence of more than one element (§4.5
/// step 4). `reader.rs` matches on these same tags to decode a sample back.
const ELEM_SCALAR: u8 = 0;
pub(crate) const ELEM_SEQUENCE: u8 = 128;

impl<W: Writer> CrateWriter<W> {
    pub(crate) fn add_field_time_samples(&mut self, field_name: &str, samples: &[TimeSample]) -> Result<u32> {
        let mut track_cache: HashMap<(ValueType, u8, Vec<u8>), u64> = HashMap::new();
        let mut value_entries = Vec::with_capacity(samples.len());
        for sample in samples {
            let (ty, elem, bytes) = raw_sample_bytes(&sample.value)?;
            let key = (ty, elem, bytes.clone());
            let offset = match track_cache.get(&key) {
                Some(&off) => off,
                None => {
                    let off = self.pos()?;
                    self.writer.write_all(&bytes)?;
                    track_cache.insert(key, off);
                    off
                }
            };
            value_entries.push((offset, ty.tag(), elem));
        }

        let times: Vec<f64> = samples.iter().map(|s| s.time).collect();
        self.write_times_locus(&times)?;

        let values_vector_start = self.pos()?;
        self.writer.write_u64(8)?;
        self.writer.write_u64(value_entries.len() as u64)?;
        for (offset, tag, elem) in value_entries {
            self.writer.write_le_uint(offset, 6)?;
            self.writer.write_u8(tag)?;
            self.writer.write_u8(elem)?;
        }

        let rep = Representation::new(ValueType::TimeSamples, false, false, false, values_vector_start)?;
        self.register(field_name, rep)
    }

    /// Writes the times locus: either a back-reference to an earlier track's
    /// identical timebase, or a fresh inline times blob.
    fn write_times_locus(&mut self, times: &[f64]) -> Result<()> {
        if let Some((cached_times, cached_start)) = &self.cached_times {
            if cached_times.as_slice() == times {
                // `8:u64 | (cached_start+8):u48 | DoubleVector:u8 | 0:u8` —
                // the pointer skips the referenced blob's own `size:u64`
                // field and lands directly on its `count:u64` field.
                let target = *cached_start + 8;
                self.writer.write_u64(8)?;
                self.writer.write_le_uint(target, 6)?;
                self.writer.write_u8(ValueType::DoubleVector.tag())?;
                self.writer.write_u8(ELEM_SCALAR)?;
                return Ok(());
            }
        }

        let start = self.pos()?;
        self.writer.write_u64(8 * (times.len() as u64 + 2))?;
        self.writer.write_u64(times.len() as u64)?;
        for &t in times {
            self.writer.write_f64(t)?;
        }
        let trailer_pos = self.pos()?;
        let self_ref = trailer_pos + 8;
        self.writer.write_le_uint(self_ref, 6)?;
        self.writer.write_u8(ValueType::DoubleVector.tag())?;
        self.writer.write_u8(ELEM_SCALAR)?;

        if self.frames_ref.is_none() {
            self.frames_ref = Some(start);
        }
        self.cached_times = Some((times.to_vec(), start));
        Ok(())
    }
}

/// Serialises one sample's value to the raw bytes written at its own
/// out-of-line offset, with the `(ValueType, elem)` tag pair the values
/// vector records alongside it. Only the scalar/array families useful as
/// animated attribute values are supported; anything else is
/// `TypeUnsupported`.
fn raw_sample_bytes(value: &Value) -> Result<(ValueType, u8, Vec<u8>)> {
    match value {
        Value::Int(v) => Ok((ValueType::Int, ELEM_SCALAR, v.to_le_bytes().to_vec())),
        Value::Float(v) => Ok((ValueType::Float, ELEM_SCALAR, v.to_le_bytes().to_vec())),
        Value::Double(v) => Ok((ValueType::Double, ELEM_SCALAR, v.to_le_bytes().to_vec())),
        Value::Bool(v) => Ok((ValueType::Bool, ELEM_SCALAR, vec![*v as u8])),
        Value::Vec3f(v) => Ok((ValueType::Vec3f, ELEM_SCALAR, flatten_f32(v))),
        Value::Vec3d(v) => Ok((ValueType::Vec3d, ELEM_SCALAR, flatten_f64(v))),
        Value::IntArray(v) => Ok((ValueType::Int, sequence_elem(v.len()), int_array_bytes(v))),
        Value::FloatArray(v) => Ok((ValueType::Float, sequence_elem(v.len()), f32_array_bytes(v))),
        Value::DoubleArray(v) => Ok((ValueType::Double, sequence_elem(v.len()), f64_array_bytes(v))),
        other => Err(CrateError::TypeUnsupported {
            type_name: time_sample_type_name(other),
        }
        .into()),
    }
}

fn sequence_elem(len: usize) -> u8 {
    if len > 1 {
        ELEM_SEQUENCE
    } else {
        ELEM_SCALAR
    }
}

fn flatten_f32<const N: usize>(v: &[f32; N]) -> Vec<u8> {
    v.iter().flat_map(|c| c.to_le_bytes()).collect()
}

fn flatten_f64<const N: usize>(v: &[f64; N]) -> Vec<u8> {
    v.iter().flat_map(|c| c.to_le_bytes()).collect()
}

fn int_array_bytes(v: &[i32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + v.len() * 4);
    out.extend_from_slice(&(v.len() as u32).to_le_bytes());
    for &x in v {
        out.extend_from_slice(&x.to_le_bytes());
    }
    out
}

fn f32_array_bytes(v: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + v.len() * 4);
    out.extend_from_slice(&(v.len() as u32).to_le_bytes());
    for &x in v {
        out.extend_from_slice(&x.to_le_bytes());
    }
    out
}

fn f64_array_bytes(v: &[f64]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + v.len() * 8);
    out.extend_from_slice(&(v.len() as u32).to_le_bytes());
    for &x in v {
        out.extend_from_slice(&x.to_le_bytes());
    }
    out
}

fn time_sample_type_name(value: &Value) -> &'static str {
    match value {
        Value::Token(_) | Value::TokenArray(_) => "token",
        Value::Asset(_) => "asset",
        Value::Matrix2d(_) | Value::Matrix3d(_) | Value::Matrix4d(_) => "matrix",
        _ => "unsupported time-sample value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ioutil::MemWriter, writer::CrateWriterOptions};
    use test_log::test;

    fn new_writer() -> CrateWriter<MemWriter> {
        CrateWriter::new(MemWriter::new(), CrateWriterOptions::default()).unwrap()
    }

    fn track(times: &[f64], values: &[f32]) -> Vec<TimeSample> {
        times
            .iter()
            .zip(values.iter())
            .map(|(&t, &v)| TimeSample { time: t, value: Value::Float(v) })
            .collect()
    }

    #[test]
    fn time_samples_field_is_registered_not_inline() {
        let mut w = new_writer();
        let samples = track(&[0.0, 1.0, 2.0], &[1.0, 2.0, 3.0]);
        let idx = w.add_field("visibility", Value::TimeSamples(samples), None).unwrap();
        let rep = Representation::decode(w.fields.reps()[idx as usize]).unwrap();
        assert_eq!(rep.ty, ValueType::TimeSamples);
        assert!(!rep.inline);
    }

    #[test]
    fn second_track_with_identical_timebase_reuses_the_first_times_blob() {
        let mut w = new_writer();
        let times = [0.0, 1.0, 2.0];
        w.add_field("a", Value::TimeSamples(track(&times, &[1.0, 2.0, 3.0])), None)
            .unwrap();
        let first_times_start = w.frames_ref.unwrap();

        w.add_field("b", Value::TimeSamples(track(&times, &[9.0, 8.0, 7.0])), None)
            .unwrap();

        // frames_ref tracks only the *first* fresh times blob written.
        assert_eq!(w.frames_ref, Some(first_times_start));
    }

    #[test]
    fn track_with_different_timebase_writes_its_own_times_blob() {
        let mut w = new_writer();
        w.add_field("a", Value::TimeSamples(track(&[0.0, 1.0], &[1.0, 2.0])), None)
            .unwrap();
        let first_start = w.frames_ref.unwrap();

        w.add_field("b", Value::TimeSamples(track(&[0.0, 1.0, 2.0], &[1.0, 2.0, 3.0])), None)
            .unwrap();

        assert_eq!(w.frames_ref, Some(first_start));
        assert_ne!(w.cached_times.as_ref().unwrap().1, first_start);
    }

    #[test]
    fn repeated_value_within_one_track_shares_one_offset() {
        let mut w = new_writer();
        let samples = track(&[0.0, 1.0, 2.0], &[5.0, 5.0, 5.0]);
        w.add_field("constant", Value::TimeSamples(samples), None).unwrap();
        // No assertion beyond "doesn't panic and produces a well-formed
        // field"; byte-sharing is exercised indirectly via the reader
        // round-trip tests in `reader.rs` and `src/test.rs`.
    }

    #[test]
    fn unsupported_inner_value_is_rejected() {
        let mut w = new_writer();
        let samples = vec![TimeSample { time: 0.0, value: Value::Token("x".into()) }];
        assert!(w.add_field("bad", Value::TimeSamples(samples), None).is_err());
    }
}
