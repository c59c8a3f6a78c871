//! Boot header and table-of-contents (de)serialisation (§4.7, §6). The
//! only module that knows the six sections' exact byte layouts; writer.rs
//! and reader.rs call through it rather than poke table internals
//! themselves.

use tracing::debug;

use crate::{
    compress::{lz4, read_compressed_i32, write_compressed_i32},
    error::CrateError,
    ioutil::{Reader, Writer},
    tables::{FieldSetTable, FieldTable, PathTable, SpecTable, TokenTable},
};
use usdc_base::Result;

pub const MAGIC: &[u8; 8] = b"PXR-USDC";
const BOOT_HEADER_LEN: u64 = 88;
const SECTION_NAMES: [&str; 6] = ["TOKENS", "STRINGS", "FIELDS", "FIELDSETS", "PATHS", "SPECS"];

#[derive(Clone, Debug)]
pub struct SectionEntry {
    pub name: String,
    pub start: u64,
    pub size: u64,
}

pub type SectionTable = Vec<SectionEntry>;

pub fn write_placeholder_boot_header<W: Writer>(writer: &mut W, minor_version: u8) -> Result<()> {
    write_boot_header(writer, minor_version, 0)
}

pub fn rewrite_boot_header<W: Writer>(writer: &mut W, minor_version: u8, toc_offset: u64) -> Result<()> {
    write_boot_header(writer, minor_version, toc_offset)
}

fn write_boot_header<W: Writer>(writer: &mut W, minor_version: u8, toc_offset: u64) -> Result<()> {
    writer.rewind_to(0)?;
    writer.write_all(MAGIC)?;
    writer.write_u8(0)?;
    writer.write_u8(minor_version)?;
    writer.write_all(&[0u8; 6])?;
    writer.write_u64(toc_offset)?;
    writer.write_all(&[0u8; 64])?;
    writer.rewind_to(BOOT_HEADER_LEN)?;
    Ok(())
}

pub struct BootHeader {
    pub minor_version: u8,
    pub toc_offset: u64,
}

pub fn read_boot_header<R: Reader>(reader: &mut R) -> Result<BootHeader> {
    reader.rewind_to(0)?;
    let magic = reader.read_bytes(8)?;
    if magic != MAGIC {
        return Err(CrateError::MalformedHeader {
            detail: format!("bad magic {magic:?}"),
        }
        .into());
    }
    reader.rewind_to(9)?;
    let minor_version = reader.read_u8()?;
    reader.rewind_to(16)?;
    let toc_offset = reader.read_u64()?;
    if toc_offset == 0 {
        return Err(CrateError::MalformedHeader {
            detail: "table of contents offset is zero: file was never finished".to_string(),
        }
        .into());
    }
    Ok(BootHeader {
        minor_version,
        toc_offset,
    })
}

#[allow(clippy::too_many_arguments)]
pub fn write_sections<W: Writer>(
    writer: &mut W,
    tokens: &TokenTable,
    fields: &FieldTable,
    fieldsets: &FieldSetTable,
    paths: &PathTable,
    specs: &SpecTable,
) -> Result<SectionTable> {
    let mut toc = Vec::with_capacity(6);
    toc.push(write_tokens_section(writer, tokens)?);
    toc.push(write_strings_section(writer)?);
    toc.push(write_fields_section(writer, fields)?);
    toc.push(write_fieldsets_section(writer, fieldsets)?);
    toc.push(write_paths_section(writer, paths)?);
    toc.push(write_specs_section(writer, specs)?);
    Ok(toc)
}

fn section<W: Writer>(
    writer: &mut W,
    name: &str,
    body: impl FnOnce(&mut W) -> Result<()>,
) -> Result<SectionEntry> {
    let start = writer.pos()?;
    body(writer)?;
    let size = writer.pos()? - start;
    debug!(name, start, size, "wrote section");
    Ok(SectionEntry {
        name: name.to_string(),
        start,
        size,
    })
}

fn write_tokens_section<W: Writer>(writer: &mut W, tokens: &TokenTable) -> Result<SectionEntry> {
    section(writer, "TOKENS", |writer| {
        writer.write_u64(tokens.len() as u64)?;
        let mut buf = Vec::new();
        for token in tokens.as_slice() {
            buf.extend_from_slice(token.as_bytes());
            buf.push(0);
        }
        writer.write_u64(buf.len() as u64)?;
        let compressed = lz4::compress(&buf);
        writer.write_u64(compressed.len() as u64)?;
        writer.write_all(&compressed)?;
        Ok(())
    })
}

fn write_strings_section<W: Writer>(writer: &mut W) -> Result<SectionEntry> {
    section(writer, "STRINGS", |writer| {
        writer.write_u64(0)?;
        Ok(())
    })
}

fn write_fields_section<W: Writer>(writer: &mut W, fields: &FieldTable) -> Result<SectionEntry> {
    section(writer, "FIELDS", |writer| {
        writer.write_u64(fields.len() as u64)?;
        let field_tokens: Vec<i32> = fields.field_tokens().iter().map(|&t| t as i32).collect();
        write_compressed_i32(writer, &field_tokens)?;
        let mut buf = Vec::with_capacity(fields.reps().len() * 8);
        for &rep in fields.reps() {
            buf.extend_from_slice(&rep.to_le_bytes());
        }
        let compressed = lz4::compress(&buf);
        writer.write_u64(compressed.len() as u64)?;
        writer.write_all(&compressed)?;
        Ok(())
    })
}

fn write_fieldsets_section<W: Writer>(writer: &mut W, fieldsets: &FieldSetTable) -> Result<SectionEntry> {
    section(writer, "FIELDSETS", |writer| {
        let flat = fieldsets.as_slice();
        writer.write_u64(flat.len() as u64)?;
        write_compressed_i32(writer, flat)?;
        Ok(())
    })
}

fn write_paths_section<W: Writer>(writer: &mut W, paths: &PathTable) -> Result<SectionEntry> {
    section(writer, "PATHS", |writer| {
        let count = paths.len() as u64;
        writer.write_u64(count)?;
        writer.write_u64(count)?;
        write_compressed_i32(writer, paths.paths())?;
        write_compressed_i32(writer, paths.tokens())?;
        write_compressed_i32(writer, paths.jumps())?;
        Ok(())
    })
}

fn write_specs_section<W: Writer>(writer: &mut W, specs: &SpecTable) -> Result<SectionEntry> {
    section(writer, "SPECS", |writer| {
        writer.write_u64(specs.len() as u64)?;
        write_compressed_i32(writer, specs.paths())?;
        write_compressed_i32(writer, specs.fsets())?;
        write_compressed_i32(writer, specs.types())?;
        Ok(())
    })
}

pub fn write_table_of_contents<W: Writer>(writer: &mut W, toc: &SectionTable) -> Result<u64> {
    let toc_start = writer.pos()?;
    writer.write_u64(toc.len() as u64)?;
    for entry in toc {
        let mut name = [0u8; 16];
        let bytes = entry.name.as_bytes();
        name[..bytes.len()].copy_from_slice(bytes);
        writer.write_all(&name)?;
        writer.write_u64(entry.start)?;
        writer.write_u64(entry.size)?;
    }
    Ok(toc_start)
}

pub fn read_table_of_contents<R: Reader>(reader: &mut R, toc_offset: u64) -> Result<SectionTable> {
    reader.rewind_to(toc_offset)?;
    let count = reader.read_u64()? as usize;
    let mut toc = Vec::with_capacity(count);
    for _ in 0..count {
        let raw = reader.read_bytes(16)?;
        let nul = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        let name = String::from_utf8_lossy(&raw[..nul]).into_owned();
        let start = reader.read_u64()?;
        let size = reader.read_u64()?;
        toc.push(SectionEntry { name, start, size });
    }
    Ok(toc)
}

pub fn find_section<'a>(toc: &'a SectionTable, name: &str) -> Option<&'a SectionEntry> {
    toc.iter().find(|e| e.name == name)
}

pub fn read_tokens_section<R: Reader>(reader: &mut R, toc: &SectionTable) -> Result<TokenTable> {
    let Some(entry) = find_section(toc, "TOKENS") else {
        return Ok(TokenTable::new());
    };
    if entry.size == 0 {
        return Ok(TokenTable::new());
    }
    reader.rewind_to(entry.start)?;
    let _count = reader.read_u64()?;
    let uncompressed_size = reader.read_u64()? as usize;
    let compressed_size = reader.read_u64()? as usize;
    let compressed = reader.read_bytes(compressed_size)?;
    let buf = lz4::decompress(&compressed, uncompressed_size)?;
    let text = String::from_utf8(buf).map_err(|e| CrateError::CompressionFailure {
        detail: format!("token blob not utf-8: {e}"),
    })?;
    // The writer NUL-terminates every token including the last, which
    // leaves one trailing empty token after the split; the prototype
    // keeps it on read, so this does too (§4.3).
    let tokens: Vec<String> = text.split('\0').map(str::to_string).collect();
    Ok(TokenTable::from_ordered(tokens))
}

pub fn read_fields_section<R: Reader>(reader: &mut R, toc: &SectionTable) -> Result<FieldTable> {
    let Some(entry) = find_section(toc, "FIELDS") else {
        return Ok(FieldTable::new());
    };
    if entry.size == 0 {
        return Ok(FieldTable::new());
    }
    reader.rewind_to(entry.start)?;
    let count = reader.read_u64()? as usize;
    let field_tokens: Vec<u32> = read_compressed_i32(reader, count)?
        .into_iter()
        .map(|t| t as u32)
        .collect();
    let size = reader.read_u64()? as usize;
    let compressed = reader.read_bytes(size)?;
    let buf = lz4::decompress(&compressed, count * 8)?;
    if buf.len() != count * 8 {
        return Err(CrateError::PayloadMismatch {
            expected: count * 8,
            actual: buf.len(),
        }
        .into());
    }
    let reps = buf
        .chunks_exact(8)
        .map(|c| u64::from_le_bytes(c.try_into().unwrap()))
        .collect();
    Ok(FieldTable::from_parts(field_tokens, reps))
}

pub fn read_fieldsets_section<R: Reader>(reader: &mut R, toc: &SectionTable) -> Result<FieldSetTable> {
    let Some(entry) = find_section(toc, "FIELDSETS") else {
        return Ok(FieldSetTable::new());
    };
    if entry.size == 0 {
        return Ok(FieldSetTable::new());
    }
    reader.rewind_to(entry.start)?;
    let count = reader.read_u64()? as usize;
    let flat = read_compressed_i32(reader, count)?;
    Ok(FieldSetTable::from_flat(flat))
}

pub fn read_paths_section<R: Reader>(reader: &mut R, toc: &SectionTable) -> Result<PathTable> {
    let Some(entry) = find_section(toc, "PATHS") else {
        return Ok(PathTable::new());
    };
    if entry.size == 0 {
        return Ok(PathTable::new());
    }
    reader.rewind_to(entry.start)?;
    let count = reader.read_u64()? as usize;
    let _count_again = reader.read_u64()? as usize;
    let paths = read_compressed_i32(reader, count)?;
    let tokens = read_compressed_i32(reader, count)?;
    let jumps = read_compressed_i32(reader, count)?;
    Ok(PathTable::from_parts(paths, tokens, jumps))
}

pub fn read_specs_section<R: Reader>(reader: &mut R, toc: &SectionTable) -> Result<SpecTable> {
    let Some(entry) = find_section(toc, "SPECS") else {
        return Ok(SpecTable::new());
    };
    if entry.size == 0 {
        return Ok(SpecTable::new());
    }
    reader.rewind_to(entry.start)?;
    let count = reader.read_u64()? as usize;
    let paths = read_compressed_i32(reader, count)?;
    let fsets = read_compressed_i32(reader, count)?;
    let types = read_compressed_i32(reader, count)?;
    Ok(SpecTable::from_parts(paths, fsets, types))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ioutil::MemWriter;
    use test_log::test;

    #[test]
    fn boot_header_round_trips_minor_version_and_toc_offset() {
        let mut w = MemWriter::new();
        write_placeholder_boot_header(&mut w, 6).unwrap();
        rewrite_boot_header(&mut w, 6, 12345).unwrap();
        let mut r = w.try_into_reader().unwrap();
        let header = read_boot_header(&mut r).unwrap();
        assert_eq!(header.minor_version, 6);
        assert_eq!(header.toc_offset, 12345);
    }

    #[test]
    fn empty_file_sections_and_toc_round_trip() {
        let mut w = MemWriter::new();
        write_placeholder_boot_header(&mut w, 6).unwrap();
        let toc = write_sections(
            &mut w,
            &TokenTable::new(),
            &FieldTable::new(),
            &FieldSetTable::new(),
            &PathTable::new(),
            &SpecTable::new(),
        )
        .unwrap();
        let toc_offset = write_table_of_contents(&mut w, &toc).unwrap();
        rewrite_boot_header(&mut w, 6, toc_offset).unwrap();
        let mut r = w.try_into_reader().unwrap();
        let header = read_boot_header(&mut r).unwrap();
        let read_toc = read_table_of_contents(&mut r, header.toc_offset).unwrap();
        assert_eq!(read_toc.len(), 6);
        assert_eq!(read_toc.iter().map(|e| e.name.clone()).collect::<Vec<_>>(), SECTION_NAMES);
    }
}
