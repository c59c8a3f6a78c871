//! Pure byte-in/byte-out compression adapters, plus the "compressed-i32"
//! framing every section built from integer streams shares: `lz4-size:u64
//! | lz4(int-pack(values))`. Nothing here knows about tokens, fields, or
//! representation words.

pub mod intpack;
pub mod lz4;

use crate::ioutil::{Reader, Writer};
use usdc_base::Result;

pub fn write_compressed_i32<W: Writer>(writer: &mut W, values: &[i32]) -> Result<()> {
    let packed = intpack::pack(values);
    let compressed = lz4::compress(&packed);
    writer.write_u64(compressed.len() as u64)?;
    writer.write_all(&compressed)?;
    Ok(())
}

pub fn read_compressed_i32<R: Reader>(reader: &mut R, count: usize) -> Result<Vec<i32>> {
    let size = reader.read_u64()? as usize;
    let bytes = reader.read_bytes(size)?;
    // int-pack's varint never exceeds 5 bytes per zig-zagged i32.
    let hint = count.saturating_mul(5) + 1;
    let packed = lz4::decompress(&bytes, hint)?;
    intpack::unpack(&packed, count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ioutil::MemWriter;
    use test_log::test;

    #[test]
    fn compressed_i32_round_trips_through_a_mem_writer() {
        let values: Vec<i32> = vec![1, 2, 3, -4, 1_000_000, 0];
        let mut w = MemWriter::new();
        write_compressed_i32(&mut w, &values).unwrap();
        let mut r = w.try_into_reader().unwrap();
        let decoded = read_compressed_i32(&mut r, values.len()).unwrap();
        assert_eq!(decoded, values);
    }
}
