//! The tagged union of values the public write API accepts, plus a
//! convenience type-inference helper mirroring the prototype's
//! `getValueType`/`getTupleValueType` (kept even though the enum itself
//! already carries its tag: `add_field`'s `Option<ValueType>` override is
//! the part of that inference path actually worth preserving).

use crate::valuetype::{Specifier, ValueType};

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Token(String),
    TokenArray(Vec<String>),
    Asset(String),
    TokenVector(Vec<String>),
    PathListOpAdd(i32),
    PathVectorSingle(i32),
    Specifier(Specifier),
    Int(i32),
    IntArray(Vec<i32>),
    Float(f32),
    FloatArray(Vec<f32>),
    Double(f64),
    DoubleArray(Vec<f64>),
    Vec2i([i32; 2]),
    Vec3i([i32; 3]),
    Vec4i([i32; 4]),
    Vec2f([f32; 2]),
    Vec3f([f32; 3]),
    Vec4f([f32; 4]),
    Vec2d([f64; 2]),
    Vec3d([f64; 3]),
    Vec4d([f64; 4]),
    Vec2fArray(Vec<[f32; 2]>),
    Vec3fArray(Vec<[f32; 3]>),
    Vec4fArray(Vec<[f32; 4]>),
    Vec2dArray(Vec<[f64; 2]>),
    Vec3dArray(Vec<[f64; 3]>),
    Vec4dArray(Vec<[f64; 4]>),
    Matrix2d([[f64; 2]; 2]),
    Matrix3d([[f64; 3]; 3]),
    Matrix4d([[f64; 4]; 4]),
    Matrix2dArray(Vec<[[f64; 2]; 2]>),
    Matrix3dArray(Vec<[[f64; 3]; 3]>),
    Matrix4dArray(Vec<[[f64; 4]; 4]>),
    Bool(bool),
    Variability(bool),
    TimeSamples(Vec<TimeSample>),
}

/// One `(time, value)` pair of a time-sampled track (§4.5). `value` must be
/// one of the scalar/array kinds `CrateWriter::add_field_time_samples`
/// knows how to write out-of-line per sample; see `encode::timesamples`.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeSample {
    pub time: f64,
    pub value: Value,
}

impl Value {
    /// The `ValueType` this value would encode as, absent an explicit
    /// override. Mirrors the prototype's default-then-infer path: callers
    /// normally don't need to pass a type alongside a `Value`, since the
    /// variant already pins it down, but `add_field` still accepts an
    /// override for parity with the source's `type = UnregisteredValue`
    /// default argument.
    pub fn inferred_type(&self) -> ValueType {
        match self {
            Value::Token(_) | Value::TokenArray(_) => ValueType::Token,
            Value::Asset(_) => ValueType::Asset,
            Value::TokenVector(_) => ValueType::TokenVector,
            Value::PathListOpAdd(_) => ValueType::PathListOp,
            Value::PathVectorSingle(_) => ValueType::PathVector,
            Value::Specifier(_) => ValueType::Specifier,
            Value::Int(_) | Value::IntArray(_) => ValueType::Int,
            Value::Float(_) | Value::FloatArray(_) => ValueType::Float,
            Value::Double(_) | Value::DoubleArray(_) => ValueType::Double,
            Value::Vec2i(_) => ValueType::Vec2i,
            Value::Vec3i(_) => ValueType::Vec3i,
            Value::Vec4i(_) => ValueType::Vec4i,
            Value::Vec2f(_) | Value::Vec2fArray(_) => ValueType::Vec2f,
            Value::Vec3f(_) | Value::Vec3fArray(_) => ValueType::Vec3f,
            Value::Vec4f(_) | Value::Vec4fArray(_) => ValueType::Vec4f,
            Value::Vec2d(_) | Value::Vec2dArray(_) => ValueType::Vec2d,
            Value::Vec3d(_) | Value::Vec3dArray(_) => ValueType::Vec3d,
            Value::Vec4d(_) | Value::Vec4dArray(_) => ValueType::Vec4d,
            Value::Matrix2d(_) | Value::Matrix2dArray(_) => ValueType::Matrix2d,
            Value::Matrix3d(_) | Value::Matrix3dArray(_) => ValueType::Matrix3d,
            Value::Matrix4d(_) | Value::Matrix4dArray(_) => ValueType::Matrix4d,
            Value::Bool(_) => ValueType::Bool,
            Value::Variability(_) => ValueType::Variability,
            Value::TimeSamples(_) => ValueType::TimeSamples,
        }
    }
}
