//! LZ4 block (de)compression, used for the token blob and wrapped around
//! `intpack`'s varint stream for every compressed-i32 section.

use crate::error::CrateError;
use usdc_base::Result;

pub fn compress(data: &[u8]) -> Vec<u8> {
    lz4_flex::block::compress(data)
}

pub fn decompress(data: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
    lz4_flex::block::decompress(data, uncompressed_size).map_err(|e| {
        CrateError::CompressionFailure {
            detail: format!("lz4 decompress: {e}"),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn round_trips_arbitrary_bytes() {
        let data = b"PXR-USDC token soup token soup token soup".to_vec();
        let packed = compress(&data);
        let unpacked = decompress(&packed, data.len()).unwrap();
        assert_eq!(unpacked, data);
    }
}
