//! Stand-in for USD's 32-bit integer compression primitive.
//!
//! The real codec used by USD crate files is itself out of scope: this
//! crate treats integer packing as an external, pure byte-in/byte-out
//! function and never introspects the bitstream it produces. What's here
//! is a self-contained delta + zig-zag + LEB128 varint encoding that fills
//! the same slot behind the same boundary (`pack`/`unpack`), not a
//! reimplementation of USD's undocumented on-disk bitstream.

use crate::error::CrateError;
use usdc_base::Result;

pub fn pack(values: &[i32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 2);
    let mut prev: i64 = 0;
    for &v in values {
        let delta = v as i64 - prev;
        prev = v as i64;
        write_varint(zigzag_encode(delta), &mut out);
    }
    out
}

pub fn unpack(data: &[u8], count: usize) -> Result<Vec<i32>> {
    let mut out = Vec::with_capacity(count);
    let mut pos = 0;
    let mut prev: i64 = 0;
    for _ in 0..count {
        let (zigzagged, consumed) = read_varint(&data[pos..]).ok_or_else(|| CrateError::CompressionFailure {
            detail: "truncated int-pack varint stream".to_string(),
        })?;
        pos += consumed;
        let delta = zigzag_decode(zigzagged);
        let value = prev + delta;
        prev = value;
        let value_i32 = i32::try_from(value).map_err(|_| CrateError::CompressionFailure {
            detail: format!("int-pack value {value} out of i32 range"),
        })?;
        out.push(value_i32);
    }
    Ok(out)
}

fn zigzag_encode(v: i64) -> u64 {
    ((v << 1) ^ (v >> 63)) as u64
}

fn zigzag_decode(v: u64) -> i64 {
    ((v >> 1) as i64) ^ -((v & 1) as i64)
}

fn write_varint(mut v: u64, out: &mut Vec<u8>) {
    loop {
        let byte = (v & 0x7f) as u8;
        v >>= 7;
        if v == 0 {
            out.push(byte);
            break;
        }
        out.push(byte | 0x80);
    }
}

fn read_varint(data: &[u8]) -> Option<(u64, usize)> {
    let mut result: u64 = 0;
    let mut shift = 0;
    for (i, &byte) in data.iter().enumerate() {
        result |= ((byte & 0x7f) as u64) << shift;
        if byte & 0x80 == 0 {
            return Some((result, i + 1));
        }
        shift += 7;
        if shift >= 64 {
            return None;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn round_trips_mixed_sign_values() {
        let values = vec![1, 2, 3, -4, 1_000_000, -1_000_000, 0, i32::MAX, i32::MIN];
        let packed = pack(&values);
        let unpacked = unpack(&packed, values.len()).unwrap();
        assert_eq!(unpacked, values);
    }

    #[test]
    fn round_trips_sixteen_element_run() {
        let values: Vec<i32> = (1..=16).collect();
        let packed = pack(&values);
        let unpacked = unpack(&packed, values.len()).unwrap();
        assert_eq!(unpacked, values);
    }

    #[test]
    fn truncated_stream_is_compression_failure() {
        let values = vec![1, 2, 3];
        let packed = pack(&values);
        let err = unpack(&packed[..1], values.len());
        assert!(err.is_err());
    }
}
