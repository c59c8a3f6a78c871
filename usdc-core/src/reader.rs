//! `CrateReader`: the inverse of `writer.rs` (§4.8). Opens a byte source,
//! seeks the table of contents, eagerly materialises the six tables, then
//! decodes field values lazily on request by seeking back into the body.
//! Never mutates the source it reads from.

use tracing::{debug, instrument};

use crate::{
    encode::timesamples::{fresh_locus_len, ELEM_SEQUENCE},
    error::CrateError,
    ioutil::Reader,
    rep::Representation,
    tables::{FieldSetTable, FieldTable, PathTable, SpecTable, TokenTable},
    toc::{self, SectionTable},
    value::{TimeSample, Value},
    valuetype::{Specifier, SpecType, ValueType},
};
use usdc_base::Result;

/// Boot-header validation knobs a caller sets up front, mirroring
/// `CrateWriterOptions`. Not a CLI or env-var surface.
#[derive(Clone, Copy, Debug)]
pub struct CrateReaderOptions {
    /// The newest format minor version this core is prepared to read.
    pub max_supported_minor_version: u8,
    /// When set, opening a file whose minor version exceeds
    /// `max_supported_minor_version` fails fast with `MalformedHeader`
    /// rather than attempting a best-effort read.
    pub deny_future_versions: bool,
}

impl Default for CrateReaderOptions {
    fn default() -> Self {
        CrateReaderOptions {
            max_supported_minor_version: 6,
            deny_future_versions: false,
        }
    }
}

pub struct CrateReader<R: Reader> {
    reader: R,
    minor_version: u8,
    section_table: SectionTable,
    tokens: TokenTable,
    fields: FieldTable,
    fieldsets: FieldSetTable,
    paths: PathTable,
    specs: SpecTable,
}

impl<R: Reader> CrateReader<R> {
    #[instrument(skip_all)]
    pub fn open(mut reader: R, options: CrateReaderOptions) -> Result<Self> {
        let header = toc::read_boot_header(&mut reader)?;
        if options.deny_future_versions && header.minor_version > options.max_supported_minor_version {
            return Err(CrateError::MalformedHeader {
                detail: format!(
                    "format minor version {} is newer than the supported {}",
                    header.minor_version, options.max_supported_minor_version
                ),
            }
            .into());
        }
        let section_table = toc::read_table_of_contents(&mut reader, header.toc_offset)?;
        let tokens = toc::read_tokens_section(&mut reader, &section_table)?;
        let fields = toc::read_fields_section(&mut reader, &section_table)?;
        let fieldsets = toc::read_fieldsets_section(&mut reader, &section_table)?;
        let paths = toc::read_paths_section(&mut reader, &section_table)?;
        let specs = toc::read_specs_section(&mut reader, &section_table)?;
        debug!(
            minor_version = header.minor_version,
            tokens = tokens.len(),
            fields = fields.len(),
            specs = specs.len(),
            "opened crate file"
        );
        Ok(CrateReader {
            reader,
            minor_version: header.minor_version,
            section_table,
            tokens,
            fields,
            fieldsets,
            paths,
            specs,
        })
    }

    pub fn minor_version(&self) -> u8 {
        self.minor_version
    }

    pub fn section_table(&self) -> &SectionTable {
        &self.section_table
    }

    pub fn tokens(&self) -> &TokenTable {
        &self.tokens
    }

    pub fn paths(&self) -> &PathTable {
        &self.paths
    }

    pub fn specs(&self) -> &SpecTable {
        &self.specs
    }

    /// Absolute value of `index` into the token table (§4.8: negated
    /// indices carry the prim one-bit tag, invisible to this lookup).
    pub fn token_at(&self, index: i32) -> Option<&str> {
        self.tokens.get(index.unsigned_abs())
    }

    /// Walks the flat field-set array from `offset` until the `-1` sentinel.
    pub fn field_set(&self, offset: u64) -> Vec<u32> {
        self.fieldsets.field_set_at(offset)
    }

    pub fn field_name(&self, field_index: u32) -> Option<&str> {
        let token = *self.fields.field_tokens().get(field_index as usize)?;
        self.tokens.get(token)
    }

    pub fn field_rep(&self, field_index: u32) -> Result<Representation> {
        let word = *self.fields.reps().get(field_index as usize).ok_or(CrateError::ShortRead {
            context: "field table",
            needed: field_index as usize + 1,
            got: self.fields.len(),
        })?;
        Representation::decode(word)
    }

    /// Resolves every field of the spec at `spec_index` to `(name, value)`
    /// pairs (§6's read-side consumer contract).
    pub fn resolve_spec(&mut self, spec_index: i32) -> Result<Vec<(String, Value)>> {
        let (fset_offset, type_tag) = self.specs.lookup(spec_index).ok_or_else(|| CrateError::ShortRead {
            context: "spec table",
            needed: spec_index as usize + 1,
            got: self.specs.len(),
        })?;
        let _ = SpecType::from_tag(type_tag)?;
        let field_indices = self.field_set(fset_offset);
        let mut out = Vec::with_capacity(field_indices.len());
        for idx in field_indices {
            let name = self.field_name(idx).unwrap_or_default().to_string();
            let rep = self.field_rep(idx)?;
            let value = self.value_for(rep)?;
            out.push((name, value));
        }
        Ok(out)
    }

    pub fn spec_type(&self, spec_index: i32) -> Result<SpecType> {
        let (_, type_tag) = self.specs.lookup(spec_index).ok_or(CrateError::ShortRead {
            context: "spec table",
            needed: spec_index as usize + 1,
            got: self.specs.len(),
        })?;
        SpecType::from_tag(type_tag)
    }

    /// Decodes a representation word to the `Value` it describes, seeking
    /// into the body for out-of-line payloads as needed. Inline scalars are
    /// decoded straight from the payload bits.
    pub fn value_for(&mut self, rep: Representation) -> Result<Value> {
        match rep.ty {
            ValueType::Token if rep.array => self.read_token_array(rep.payload),
            ValueType::Token => Ok(Value::Token(self.token_at(rep.payload as i32).unwrap_or("").to_string())),
            ValueType::Asset => Ok(Value::Asset(self.token_at(rep.payload as i32).unwrap_or("").to_string())),
            ValueType::TokenVector => self.read_token_vector(rep.payload),
            ValueType::PathListOp => self.read_path_list_op(rep.payload),
            ValueType::PathVector => self.read_path_vector(rep.payload),
            ValueType::Specifier => Ok(Value::Specifier(Specifier::from_tag(rep.payload)?)),
            ValueType::Int if rep.array => self.read_int_array(rep.payload, rep.compressed),
            ValueType::Int => Ok(Value::Int(rep.payload as u32 as i32)),
            ValueType::Float if rep.array => self.read_f32_array(rep.payload),
            ValueType::Float => Ok(Value::Float(inline_f32(rep.payload))),
            ValueType::Double if rep.array => self.read_f64_array(rep.payload),
            // See the matching note on `encode::add_field_double_scalar`:
            // the payload only ever carries an `f32`'s bits, not an `f64`'s.
            ValueType::Double => Ok(Value::Double(inline_f32(rep.payload) as f64)),
            ValueType::Vec2i => self.read_fixed_i32::<2>(rep.payload).map(Value::Vec2i),
            ValueType::Vec3i => self.read_fixed_i32::<3>(rep.payload).map(Value::Vec3i),
            ValueType::Vec4i => self.read_fixed_i32::<4>(rep.payload).map(Value::Vec4i),
            ValueType::Vec2f if rep.array => self.read_vec_f_array::<2>(rep.payload).map(Value::Vec2fArray),
            ValueType::Vec2f if rep.inline => Ok(Value::Vec2f(unpack_whole_bytes::<2>(rep.payload))),
            ValueType::Vec2f => self.read_fixed_f32::<2>(rep.payload).map(Value::Vec2f),
            ValueType::Vec3f if rep.array => self.read_vec_f_array::<3>(rep.payload).map(Value::Vec3fArray),
            ValueType::Vec3f if rep.inline => Ok(Value::Vec3f(unpack_whole_bytes::<3>(rep.payload))),
            ValueType::Vec3f => self.read_fixed_f32::<3>(rep.payload).map(Value::Vec3f),
            ValueType::Vec4f if rep.array => self.read_vec_f_array::<4>(rep.payload).map(Value::Vec4fArray),
            ValueType::Vec4f if rep.inline => Ok(Value::Vec4f(unpack_whole_bytes::<4>(rep.payload))),
            ValueType::Vec4f => self.read_fixed_f32::<4>(rep.payload).map(Value::Vec4f),
            ValueType::Vec2d if rep.array => self.read_vec_d_array::<2>(rep.payload).map(Value::Vec2dArray),
            ValueType::Vec2d => self.read_fixed_f64::<2>(rep.payload).map(Value::Vec2d),
            ValueType::Vec3d if rep.array => self.read_vec_d_array::<3>(rep.payload).map(Value::Vec3dArray),
            ValueType::Vec3d => self.read_fixed_f64::<3>(rep.payload).map(Value::Vec3d),
            ValueType::Vec4d if rep.array => self.read_vec_d_array::<4>(rep.payload).map(Value::Vec4dArray),
            ValueType::Vec4d => self.read_fixed_f64::<4>(rep.payload).map(Value::Vec4d),
            ValueType::Matrix2d if rep.array => self.read_matrix_array::<2>(rep.payload).map(Value::Matrix2dArray),
            ValueType::Matrix2d => self.read_matrix::<2>(rep.payload).map(Value::Matrix2d),
            ValueType::Matrix3d if rep.array => self.read_matrix_array::<3>(rep.payload).map(Value::Matrix3dArray),
            ValueType::Matrix3d => self.read_matrix::<3>(rep.payload).map(Value::Matrix3d),
            ValueType::Matrix4d if rep.array => self.read_matrix_array::<4>(rep.payload).map(Value::Matrix4dArray),
            ValueType::Matrix4d => self.read_matrix::<4>(rep.payload).map(Value::Matrix4d),
            ValueType::Bool => Ok(Value::Bool(rep.payload != 0)),
            ValueType::Variability => Ok(Value::Variability(rep.payload != 0)),
            ValueType::TimeSamples => self.read_time_samples(rep.payload),
            other => Err(CrateError::TypeUnsupported {
                type_name: unsupported_name(other),
            }
            .into()),
        }
    }

    /// Reads an out-of-line array's element count: 4 bytes when this file's
    /// minor version is below 7, 8 bytes otherwise (§4.8, scenario 6). Only
    /// the generic scalar/vector/matrix array families use this branch;
    /// `TokenVector`/`PathListOp`/`PathVector` have their own fixed framing
    /// per §4.4's table and aren't version-gated.
    fn read_array_len(&mut self) -> Result<u64> {
        if self.minor_version < 7 {
            Ok(self.reader.read_u32()? as u64)
        } else {
            self.reader.read_u64()
        }
    }

    fn read_token_array(&mut self, offset: u64) -> Result<Value> {
        self.reader.rewind_to(offset)?;
        let count = self.reader.read_u32()? as usize;
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let idx = self.reader.read_u32()?;
            out.push(self.tokens.get(idx).unwrap_or("").to_string());
        }
        Ok(Value::TokenArray(out))
    }

    fn read_token_vector(&mut self, offset: u64) -> Result<Value> {
        self.reader.rewind_to(offset)?;
        let count = self.reader.read_u64()? as usize;
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let idx = self.reader.read_u32()?;
            out.push(self.tokens.get(idx).unwrap_or("").to_string());
        }
        self.reader.read_bytes(4)?;
        Ok(Value::TokenVector(out))
    }

    fn read_path_list_op(&mut self, offset: u64) -> Result<Value> {
        self.reader.rewind_to(offset)?;
        self.reader.read_u64()?;
        self.reader.read_u8()?;
        let path_index = self.reader.read_i32()?;
        Ok(Value::PathListOpAdd(path_index))
    }

    fn read_path_vector(&mut self, offset: u64) -> Result<Value> {
        self.reader.rewind_to(offset)?;
        self.reader.read_u64()?;
        let path_index = self.reader.read_i32()?;
        Ok(Value::PathVectorSingle(path_index))
    }

    fn read_int_array(&mut self, offset: u64, compressed: bool) -> Result<Value> {
        self.reader.rewind_to(offset)?;
        let count = self.read_array_len()? as usize;
        let values = if compressed {
            crate::compress::read_compressed_i32(&mut self.reader, count)?
        } else {
            (0..count).map(|_| self.reader.read_i32()).collect::<Result<Vec<_>>>()?
        };
        Ok(Value::IntArray(values))
    }

    fn read_f32_array(&mut self, offset: u64) -> Result<Value> {
        self.reader.rewind_to(offset)?;
        let count = self.read_array_len()? as usize;
        let values = (0..count).map(|_| self.reader.read_f32()).collect::<Result<Vec<_>>>()?;
        Ok(Value::FloatArray(values))
    }

    fn read_f64_array(&mut self, offset: u64) -> Result<Value> {
        self.reader.rewind_to(offset)?;
        let count = self.read_array_len()? as usize;
        let values = (0..count).map(|_| self.reader.read_f64()).collect::<Result<Vec<_>>>()?;
        Ok(Value::DoubleArray(values))
    }

    fn read_fixed_i32<const N: usize>(&mut self, offset: u64) -> Result<[i32; N]> {
        self.reader.rewind_to(offset)?;
        let mut out = [0i32; N];
        for slot in &mut out {
            *slot = self.reader.read_i32()?;
        }
        Ok(out)
    }

    fn read_fixed_f32<const N: usize>(&mut self, offset: u64) -> Result<[f32; N]> {
        self.reader.rewind_to(offset)?;
        let mut out = [0f32; N];
        for slot in &mut out {
            *slot = self.reader.read_f32()?;
        }
        Ok(out)
    }

    fn read_fixed_f64<const N: usize>(&mut self, offset: u64) -> Result<[f64; N]> {
        self.reader.rewind_to(offset)?;
        let mut out = [0f64; N];
        for slot in &mut out {
            *slot = self.reader.read_f64()?;
        }
        Ok(out)
    }

    fn read_vec_f_array<const N: usize>(&mut self, offset: u64) -> Result<Vec<[f32; N]>> {
        self.reader.rewind_to(offset)?;
        let count = self.read_array_len()? as usize;
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let mut v = [0f32; N];
            for slot in &mut v {
                *slot = self.reader.read_f32()?;
            }
            out.push(v);
        }
        Ok(out)
    }

    fn read_vec_d_array<const N: usize>(&mut self, offset: u64) -> Result<Vec<[f64; N]>> {
        self.reader.rewind_to(offset)?;
        let count = self.read_array_len()? as usize;
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let mut v = [0f64; N];
            for slot in &mut v {
                *slot = self.reader.read_f64()?;
            }
            out.push(v);
        }
        Ok(out)
    }

    fn read_matrix<const N: usize>(&mut self, offset: u64) -> Result<[[f64; N]; N]> {
        self.reader.rewind_to(offset)?;
        self.read_one_matrix::<N>()
    }

    fn read_matrix_array<const N: usize>(&mut self, offset: u64) -> Result<Vec<[[f64; N]; N]>> {
        self.reader.rewind_to(offset)?;
        let count = self.read_array_len()? as usize;
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(self.read_one_matrix::<N>()?);
        }
        Ok(out)
    }

    fn read_one_matrix<const N: usize>(&mut self) -> Result<[[f64; N]; N]> {
        let mut m = [[0f64; N]; N];
        for row in &mut m {
            for slot in row.iter_mut() {
                *slot = self.reader.read_f64()?;
            }
        }
        Ok(m)
    }

    fn read_time_samples(&mut self, values_vector_start: u64) -> Result<Value> {
        self.reader.rewind_to(values_vector_start)?;
        let marker = self.reader.read_u64()?;
        if marker != 8 {
            return Err(CrateError::MalformedRepresentation {
                detail: format!("values vector at {values_vector_start} has leading field {marker}, expected 8"),
            }
            .into());
        }
        let count = self.reader.read_u64()? as usize;
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let offset = self.reader.read_le_uint(6)?;
            let tag = self.reader.read_u8()?;
            let elem = self.reader.read_u8()?;
            entries.push((offset, tag, elem));
        }

        let times = self.read_times_locus(values_vector_start, count)?;
        if times.len() != count {
            return Err(CrateError::PayloadMismatch {
                expected: count,
                actual: times.len(),
            }
            .into());
        }

        let mut samples = Vec::with_capacity(count);
        for (time, (offset, tag, elem)) in times.into_iter().zip(entries) {
            let ty = ValueType::from_tag(tag)?;
            let value = self.read_raw_sample(offset, ty, elem)?;
            samples.push(TimeSample { time, value });
        }
        Ok(Value::TimeSamples(samples))
    }

    /// Locates the times locus immediately preceding `values_vector_start`
    /// by reading the `(offset:u48, type:u8, elem:u8)` triad in the 8 bytes
    /// right before it. A freshly-written times blob's trailing
    /// self-reference always equals `values_vector_start` exactly (nothing
    /// is written between the two); anything else is a back-reference whose
    /// offset points directly at an earlier times blob's `count:u64` field.
    fn read_times_locus(&mut self, values_vector_start: u64, count: usize) -> Result<Vec<f64>> {
        let trailer_pos = values_vector_start.checked_sub(8).ok_or(CrateError::PayloadMismatch {
            expected: 8,
            actual: values_vector_start as usize,
        })?;
        self.reader.rewind_to(trailer_pos)?;
        let offset = self.reader.read_le_uint(6)?;
        self.reader.read_u8()?;
        self.reader.read_u8()?;

        if offset == values_vector_start {
            let locus_start = values_vector_start
                .checked_sub(fresh_locus_len(count))
                .ok_or(CrateError::PayloadMismatch {
                    expected: fresh_locus_len(count) as usize,
                    actual: values_vector_start as usize,
                })?;
            return self.read_fresh_times(locus_start, count);
        }
        self.read_times_at_count_field(offset, count)
    }

    fn read_fresh_times(&mut self, start: u64, count: usize) -> Result<Vec<f64>> {
        self.reader.rewind_to(start)?;
        self.reader.read_u64()?;
        self.read_times_at_count_field(start + 8, count)
    }

    fn read_times_at_count_field(&mut self, count_field: u64, count: usize) -> Result<Vec<f64>> {
        self.reader.rewind_to(count_field)?;
        let stored_count = self.reader.read_u64()? as usize;
        if stored_count != count {
            return Err(CrateError::PayloadMismatch {
                expected: count,
                actual: stored_count,
            }
            .into());
        }
        let mut times = Vec::with_capacity(count);
        for _ in 0..count {
            times.push(self.reader.read_f64()?);
        }
        Ok(times)
    }

    fn read_raw_sample(&mut self, offset: u64, ty: ValueType, elem: u8) -> Result<Value> {
        self.reader.rewind_to(offset)?;
        match ty {
            ValueType::Int if elem != ELEM_SEQUENCE => Ok(Value::Int(self.reader.read_i32()?)),
            ValueType::Int => {
                let count = self.reader.read_u32()? as usize;
                let values = (0..count).map(|_| self.reader.read_i32()).collect::<Result<Vec<_>>>()?;
                Ok(Value::IntArray(values))
            }
            ValueType::Float if elem != ELEM_SEQUENCE => Ok(Value::Float(self.reader.read_f32()?)),
            ValueType::Float => {
                let count = self.reader.read_u32()? as usize;
                let values = (0..count).map(|_| self.reader.read_f32()).collect::<Result<Vec<_>>>()?;
                Ok(Value::FloatArray(values))
            }
            ValueType::Double if elem != ELEM_SEQUENCE => Ok(Value::Double(self.reader.read_f64()?)),
            ValueType::Double => {
                let count = self.reader.read_u32()? as usize;
                let values = (0..count).map(|_| self.reader.read_f64()).collect::<Result<Vec<_>>>()?;
                Ok(Value::DoubleArray(values))
            }
            ValueType::Bool => Ok(Value::Bool(self.reader.read_u8()? != 0)),
            ValueType::Vec3f => {
                let mut c = [0f32; 3];
                for slot in &mut c {
                    *slot = self.reader.read_f32()?;
                }
                Ok(Value::Vec3f(c))
            }
            ValueType::Vec3d => {
                let mut c = [0f64; 3];
                for slot in &mut c {
                    *slot = self.reader.read_f64()?;
                }
                Ok(Value::Vec3d(c))
            }
            other => Err(CrateError::MalformedRepresentation {
                detail: format!("unsupported time-sample value type tag {}", other.tag()),
            }
            .into()),
        }
    }
}

fn inline_f32(payload: u64) -> f32 {
    f32::from_le_bytes((payload as u32).to_le_bytes())
}

fn unpack_whole_bytes<const N: usize>(payload: u64) -> [f32; N] {
    let mut out = [0f32; N];
    for (i, slot) in out.iter_mut().enumerate() {
        let byte = ((payload >> (8 * i)) & 0xff) as u8;
        *slot = (byte as i8) as f32;
    }
    out
}

fn unsupported_name(ty: ValueType) -> &'static str {
    match ty {
        ValueType::Half => "half",
        ValueType::QuatD => "quatd",
        ValueType::QuatF => "quatf",
        ValueType::QuatH => "quath",
        ValueType::Vec2h => "vec2h",
        ValueType::Vec3h => "vec3h",
        ValueType::Vec4h => "vec4h",
        ValueType::Invalid => "invalid",
        _ => "unsupported",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ioutil::MemWriter, value::Value, valuetype::SpecType, writer::{CrateWriter, CrateWriterOptions}};
    use test_log::test;

    fn round_trip(build: impl FnOnce(&mut CrateWriter<MemWriter>)) -> CrateReader<crate::ioutil::MemReader> {
        let mut w = CrateWriter::new(MemWriter::new(), CrateWriterOptions::default()).unwrap();
        build(&mut w);
        let written = w.finish().unwrap();
        let r = written.try_into_reader().unwrap();
        CrateReader::open(r, CrateReaderOptions::default()).unwrap()
    }

    #[test]
    fn empty_file_round_trips_to_empty_tables() {
        let reader = round_trip(|_| {});
        assert_eq!(reader.tokens().len(), 0);
        assert_eq!(reader.specs().len(), 0);
    }

    #[test]
    fn single_prim_round_trips_its_fields() {
        let mut reader = round_trip(|w| {
            let specifier = w.add_field("specifier", Value::Specifier(Specifier::Def), None).unwrap();
            let order = w
                .add_field("xformOpOrder", Value::TokenVector(vec![]), None)
                .unwrap();
            let fset = w.add_field_set(&[specifier, order]);
            w.add_path(0, "Sphere", 0, true);
            w.add_spec(fset, SpecType::Prim);
        });

        assert_eq!(reader.specs().len(), 1);
        assert_eq!(reader.spec_type(0).unwrap(), SpecType::Prim);
        let fields = reader.resolve_spec(0).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0], ("specifier".to_string(), Value::Specifier(Specifier::Def)));
        assert_eq!(fields[1], ("xformOpOrder".to_string(), Value::TokenVector(vec![])));
    }

    #[test]
    fn dedup_int_array_round_trips_to_one_shared_representation() {
        let mut reader = round_trip(|w| {
            let values: Vec<i32> = (1..=16).collect();
            w.add_field("a", Value::IntArray(values.clone()), None).unwrap();
            w.add_field("b", Value::IntArray(values), None).unwrap();
        });
        let rep_a = reader.field_rep(0).unwrap();
        let rep_b = reader.field_rep(1).unwrap();
        assert_eq!(rep_a.payload, rep_b.payload);
        assert!(rep_a.compressed);
        let value = reader.value_for(rep_a).unwrap();
        assert_eq!(value, Value::IntArray((1..=16).collect()));
    }

    #[test]
    fn whole_byte_vec3f_round_trips_without_reading_out_of_line_bytes() {
        let mut reader = round_trip(|w| {
            w.add_field("extent", Value::Vec3f([1.0, 2.0, 3.0]), None).unwrap();
        });
        let rep = reader.field_rep(0).unwrap();
        assert!(rep.inline);
        assert_eq!(reader.value_for(rep).unwrap(), Value::Vec3f([1.0, 2.0, 3.0]));
    }

    #[test]
    fn double_scalar_round_trips_through_the_known_f32_bug() {
        let mut reader = round_trip(|w| {
            w.add_field("radius", Value::Double(2.5), None).unwrap();
        });
        let rep = reader.field_rep(0).unwrap();
        let value = reader.value_for(rep).unwrap();
        assert_eq!(value, Value::Double(2.5f32 as f64));
    }

    #[test]
    fn time_samples_with_shared_timebase_round_trip_independently() {
        use crate::value::TimeSample;
        let mut reader = round_trip(|w| {
            let times = [0.0, 1.0, 2.0];
            let a: Vec<TimeSample> = times
                .iter()
                .zip([1.0f32, 2.0, 3.0])
                .map(|(&t, v)| TimeSample { time: t, value: Value::Float(v) })
                .collect();
            let b: Vec<TimeSample> = times
                .iter()
                .zip([9.0f32, 8.0, 7.0])
                .map(|(&t, v)| TimeSample { time: t, value: Value::Float(v) })
                .collect();
            w.add_field("a", Value::TimeSamples(a), None).unwrap();
            w.add_field("b", Value::TimeSamples(b), None).unwrap();
        });

        let rep_a = reader.field_rep(0).unwrap();
        let rep_b = reader.field_rep(1).unwrap();
        let Value::TimeSamples(samples_a) = reader.value_for(rep_a).unwrap() else {
            panic!("expected TimeSamples");
        };
        let Value::TimeSamples(samples_b) = reader.value_for(rep_b).unwrap() else {
            panic!("expected TimeSamples");
        };
        assert_eq!(samples_a.iter().map(|s| s.time).collect::<Vec<_>>(), vec![0.0, 1.0, 2.0]);
        assert_eq!(samples_b.iter().map(|s| s.time).collect::<Vec<_>>(), vec![0.0, 1.0, 2.0]);
        assert_eq!(samples_a[1].value, Value::Float(2.0));
        assert_eq!(samples_b[1].value, Value::Float(8.0));
    }

    #[test]
    fn tampering_minor_version_to_seven_breaks_a_version_six_int_array_read() {
        let mut w = CrateWriter::new(MemWriter::new(), CrateWriterOptions::default()).unwrap();
        let values: Vec<i32> = vec![1, 2, 3];
        w.add_field("indices", Value::IntArray(values), None).unwrap();
        let written = w.finish().unwrap();
        let mut bytes = written.try_into_reader().unwrap();
        let mut raw = Vec::new();
        std::io::Read::read_to_end(&mut bytes, &mut raw).unwrap();
        raw[9] = 7; // tamper the minor version byte
        let reader = crate::ioutil::MemReader::from(raw);
        let mut reader = CrateReader::open(reader, CrateReaderOptions::default()).unwrap();
        let rep = reader.field_rep(0).unwrap();
        // The int array was written with a 4-byte count prefix (format 6);
        // reading it back as format 7 misreads the count and should fail
        // well before it would succeed by coincidence.
        assert!(reader.value_for(rep).is_err());
    }

    #[test]
    fn denying_future_versions_rejects_a_tampered_header() {
        let mut w = CrateWriter::new(MemWriter::new(), CrateWriterOptions::default()).unwrap();
        w.add_field("x", Value::Bool(true), None).unwrap();
        let written = w.finish().unwrap();
        let mut bytes = written.try_into_reader().unwrap();
        let mut raw = Vec::new();
        std::io::Read::read_to_end(&mut bytes, &mut raw).unwrap();
        raw[9] = 7;
        let reader = crate::ioutil::MemReader::from(raw);
        let opened = CrateReader::open(
            reader,
            CrateReaderOptions { deny_future_versions: true, ..CrateReaderOptions::default() },
        );
        assert!(opened.is_err());
    }
}
