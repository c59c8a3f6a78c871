//! The value-type tag registry, plus the two small enumerations
//! (`Specifier`, `SpecType`) that share the same "fixed integer tag" shape.
//!
//! Tag numbers are copied verbatim from the prototype's `ValueType` enum so
//! representation words stay bit-compatible with real `.usdc` files, even
//! though this crate's field encoders (§4.4) only implement a subset of the
//! 56 tags. The rest exist so the decoder can validate a tag is at least
//! *in range* and so `TypeUnsupported` has something concrete to report.

use crate::error::CrateError;
use usdc_base::Result;

macro_rules! value_type {
    ($($variant:ident = $tag:literal,)*) => {
        #[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        #[allow(non_camel_case_types)]
        pub enum ValueType {
            $($variant = $tag,)*
        }

        impl ValueType {
            pub fn tag(self) -> u8 {
                self as u8
            }

            pub fn from_tag(tag: u8) -> Result<Self> {
                match tag {
                    $($tag => Ok(ValueType::$variant),)*
                    other => Err(CrateError::MalformedRepresentation {
                        detail: format!("value type tag {other} out of range"),
                    }
                    .into()),
                }
            }
        }
    };
}

value_type! {
    Invalid = 0,
    Bool = 1,
    UChar = 2,
    Int = 3,
    UInt = 4,
    Int64 = 5,
    UInt64 = 6,
    Half = 7,
    Float = 8,
    Double = 9,
    StringTy = 10,
    Token = 11,
    Asset = 12,
    Matrix2d = 13,
    Matrix3d = 14,
    Matrix4d = 15,
    QuatD = 16,
    QuatF = 17,
    QuatH = 18,
    Vec2d = 19,
    Vec2f = 20,
    Vec2h = 21,
    Vec2i = 22,
    Vec3d = 23,
    Vec3f = 24,
    Vec3h = 25,
    Vec3i = 26,
    Vec4d = 27,
    Vec4f = 28,
    Vec4h = 29,
    Vec4i = 30,
    Dictionary = 31,
    TokenListOp = 32,
    StringListOp = 33,
    PathListOp = 34,
    ReferenceListOp = 35,
    IntListOp = 36,
    Int64ListOp = 37,
    UIntListOp = 38,
    UInt64ListOp = 39,
    PathVector = 40,
    TokenVector = 41,
    Specifier = 42,
    Permission = 43,
    Variability = 44,
    VariantSelectionMap = 45,
    TimeSamples = 46,
    Payload = 47,
    DoubleVector = 48,
    LayerOffsetVector = 49,
    StringVector = 50,
    ValueBlock = 51,
    Value = 52,
    UnregisteredValue = 53,
    UnregisteredValueListOp = 54,
    PayloadListOp = 55,
}

impl ValueType {
    /// True for the ~20 families §4.4's dispatch table actually encodes.
    /// The rest (half/quat tags, list-ops other than PathListOp, etc.)
    /// decode-validate but have no encoder: attempting to write one is
    /// `TypeUnsupported`.
    pub fn is_encodable(self) -> bool {
        use ValueType::*;
        matches!(
            self,
            Token
                | Asset
                | TokenVector
                | PathListOp
                | PathVector
                | Specifier
                | Int
                | Float
                | Double
                | Vec2i | Vec3i | Vec4i
                | Vec2f | Vec3f | Vec4f
                | Vec2d | Vec3d | Vec4d
                | Matrix2d | Matrix3d | Matrix4d
                | Bool
                | Variability
                | TimeSamples
        )
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Specifier {
    Def = 0,
    Over = 1,
    Class = 2,
}

impl Specifier {
    pub fn from_tag(tag: u64) -> Result<Self> {
        match tag {
            0 => Ok(Specifier::Def),
            1 => Ok(Specifier::Over),
            2 => Ok(Specifier::Class),
            other => Err(CrateError::MalformedRepresentation {
                detail: format!("specifier tag {other} out of range"),
            }
            .into()),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum SpecType {
    Attribute = 1,
    Connection = 2,
    Expression = 3,
    Mapper = 4,
    MapperArg = 5,
    Prim = 6,
    PseudoRoot = 7,
    Relationship = 8,
    RelationshipTarget = 9,
    Variant = 10,
    VariantSet = 11,
}

impl SpecType {
    pub fn from_tag(tag: i32) -> Result<Self> {
        match tag {
            1 => Ok(SpecType::Attribute),
            2 => Ok(SpecType::Connection),
            3 => Ok(SpecType::Expression),
            4 => Ok(SpecType::Mapper),
            5 => Ok(SpecType::MapperArg),
            6 => Ok(SpecType::Prim),
            7 => Ok(SpecType::PseudoRoot),
            8 => Ok(SpecType::Relationship),
            9 => Ok(SpecType::RelationshipTarget),
            10 => Ok(SpecType::Variant),
            11 => Ok(SpecType::VariantSet),
            other => Err(CrateError::MalformedRepresentation {
                detail: format!("spec type tag {other} out of range"),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn tag_round_trips_for_every_variant() {
        for tag in 0u8..=55 {
            let ty = ValueType::from_tag(tag).unwrap();
            assert_eq!(ty.tag(), tag);
        }
    }

    #[test]
    fn out_of_range_tag_is_malformed() {
        assert!(ValueType::from_tag(56).is_err());
    }

    #[test]
    fn half_and_quat_tags_are_not_encodable() {
        assert!(!ValueType::Half.is_encodable());
        assert!(!ValueType::QuatF.is_encodable());
        assert!(!ValueType::Vec2h.is_encodable());
    }
}
