//! The 64-bit representation word: bit 63 ARRAY, bit 62 INLINE, bit 61
//! COMPRESSED, bits 48-55 the value-type tag, bits 0-47 the payload.
//!
//! Modelled as a plain struct with explicit shift/mask constants rather
//! than a bit-field type, so the packing is visible at every call site.

use crate::{error::CrateError, valuetype::ValueType};
use usdc_base::Result;

const ARRAY_BIT: u64 = 1 << 63;
const INLINE_BIT: u64 = 1 << 62;
const COMPRESSED_BIT: u64 = 1 << 61;
const TYPE_SHIFT: u32 = 48;
const TYPE_MASK: u64 = 0xff;
const PAYLOAD_MASK: u64 = (1 << 48) - 1;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct Representation {
    pub ty: ValueType,
    pub array: bool,
    pub inline: bool,
    pub compressed: bool,
    pub payload: u64,
}

impl Representation {
    pub fn new(ty: ValueType, array: bool, inline: bool, compressed: bool, payload: u64) -> Result<Self> {
        if payload > PAYLOAD_MASK {
            return Err(CrateError::MalformedRepresentation {
                detail: format!("payload {payload:#x} exceeds 48 bits"),
            }
            .into());
        }
        Ok(Representation {
            ty,
            array,
            inline,
            compressed,
            payload,
        })
    }

    pub fn encode(self) -> u64 {
        let mut word = ((self.ty.tag() as u64) << TYPE_SHIFT) | (self.payload & PAYLOAD_MASK);
        if self.array {
            word |= ARRAY_BIT;
        }
        if self.inline {
            word |= INLINE_BIT;
        }
        if self.compressed {
            word |= COMPRESSED_BIT;
        }
        word
    }

    pub fn decode(word: u64) -> Result<Self> {
        let tag = ((word >> TYPE_SHIFT) & TYPE_MASK) as u8;
        let ty = ValueType::from_tag(tag)?;
        Ok(Representation {
            ty,
            array: word & ARRAY_BIT != 0,
            inline: word & INLINE_BIT != 0,
            compressed: word & COMPRESSED_BIT != 0,
            payload: word & PAYLOAD_MASK,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn encode_decode_round_trips_bit_for_bit() {
        let rep = Representation::new(ValueType::Int, true, false, true, 0x1234).unwrap();
        let word = rep.encode();
        let decoded = Representation::decode(word).unwrap();
        assert_eq!(decoded, rep);
        assert_eq!(decoded.encode(), word);
    }

    #[test]
    fn payload_over_48_bits_rejected() {
        assert!(Representation::new(ValueType::Int, false, true, false, 1 << 48).is_err());
    }

    #[test]
    fn unknown_type_tag_is_malformed() {
        let word = (56u64 << TYPE_SHIFT) | INLINE_BIT;
        assert!(Representation::decode(word).is_err());
    }
}
