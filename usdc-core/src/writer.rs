//! `CrateWriter`: the public write-session object. Owns the byte sink and
//! all six tables for the life of one file, the way `LayerWriter` owns one
//! `submerge` layer's block-end-offset bookkeeping. There's no block/track/
//! chunk nesting in a crate file, so the consuming-self builder chain that
//! pattern uses collapses to a single `new` / `finish`.

use tracing::{info, instrument};

use crate::{
    ioutil::Writer,
    tables::{FieldSetTable, FieldTable, PathTable, SpecTable, TokenTable, WriteDataCache},
    toc,
    valuetype::SpecType,
};
use usdc_base::Result;

/// Boot-header/TOC-writer configuration. Not a CLI or env-var surface;
/// just the constructor-level knobs a caller sets up front.
#[derive(Clone, Copy, Debug)]
pub struct CrateWriterOptions {
    /// Format minor version stamped into the boot header. The core only
    /// emits 0.6.x bodies; this exists so a caller can't silently drift
    /// onto an unintended version number.
    pub format_minor_version: u8,
}

impl Default for CrateWriterOptions {
    fn default() -> Self {
        CrateWriterOptions {
            format_minor_version: 6,
        }
    }
}

pub struct CrateWriter<W: Writer> {
    pub(crate) writer: W,
    pub(crate) options: CrateWriterOptions,
    pub(crate) tokens: TokenTable,
    pub(crate) fields: FieldTable,
    pub(crate) fieldsets: FieldSetTable,
    pub(crate) paths: PathTable,
    pub(crate) specs: SpecTable,
    pub(crate) cache: WriteDataCache,
    /// Offset of the first TimeSamples times-vector written this session,
    /// so later tracks sharing the same timebase can back-reference it
    /// instead of re-emitting it (§4.5 step 3). `None` until the first one
    /// is written.
    pub(crate) frames_ref: Option<u64>,
    /// The most recently written fresh times vector's own values and start
    /// offset, so a later track can detect it shares the same timebase and
    /// emit a back-reference instead of re-emitting the times (§4.5 step 3).
    pub(crate) cached_times: Option<(Vec<f64>, u64)>,
}

impl<W: Writer> CrateWriter<W> {
    #[instrument(skip_all)]
    pub fn new(mut writer: W, options: CrateWriterOptions) -> Result<Self> {
        toc::write_placeholder_boot_header(&mut writer, options.format_minor_version)?;
        Ok(CrateWriter {
            writer,
            options,
            tokens: TokenTable::new(),
            fields: FieldTable::new(),
            fieldsets: FieldSetTable::new(),
            paths: PathTable::new(),
            specs: SpecTable::new(),
            cache: WriteDataCache::new(),
            frames_ref: None,
            cached_times: None,
        })
    }

    pub fn add_field_set(&mut self, field_indices: &[u32]) -> u64 {
        self.fieldsets.add_field_set(field_indices)
    }

    pub fn add_path(&mut self, path_index: i32, token: &str, jump: i32, is_prim: bool) {
        let token_index = self.tokens.intern(token) as i32;
        self.paths.add_path(path_index, token_index, jump, is_prim);
    }

    pub fn add_spec(&mut self, field_set_offset: u64, spec_type: SpecType) -> u32 {
        self.specs.add_spec(field_set_offset, spec_type)
    }

    /// Writes the six sections, then the table of contents, then
    /// back-patches the boot header with the TOC's offset. Consumes the
    /// session: there is no incremental-flush contract (§5), a file is
    /// either fully built or abandoned.
    #[instrument(skip_all)]
    pub fn finish(mut self) -> Result<W> {
        let section_table = toc::write_sections(
            &mut self.writer,
            &self.tokens,
            &self.fields,
            &self.fieldsets,
            &self.paths,
            &self.specs,
        )?;
        let toc_offset = toc::write_table_of_contents(&mut self.writer, &section_table)?;
        toc::rewrite_boot_header(&mut self.writer, self.options.format_minor_version, toc_offset)?;
        info!(
            tokens = self.tokens.len(),
            fields = self.fields.len(),
            specs = self.specs.len(),
            "finished crate file"
        );
        Ok(self.writer)
    }

    pub(crate) fn pos(&mut self) -> Result<u64> {
        self.writer.pos()
    }

    pub(crate) fn intern_token(&mut self, s: &str) -> u32 {
        self.tokens.intern(s)
    }

    pub(crate) fn add_field_rep(
        &mut self,
        field_name: &str,
        rep: crate::rep::Representation,
    ) -> Result<u32> {
        let token = self.tokens.intern(field_name);
        Ok(self.fields.add(token, rep))
    }
}

/// Normalises token/asset text the way the source's encoders do before
/// interning: stray `"` characters are stripped from token text, `@`
/// delimiters from asset text (§2b).
pub(crate) fn strip_chars(s: &str, ch: char) -> String {
    s.chars().filter(|&c| c != ch).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ioutil::MemWriter;
    use test_log::test;

    #[test]
    fn new_writer_reserves_boot_header_space() {
        let w = MemWriter::new();
        let mut writer = CrateWriter::new(w, CrateWriterOptions::default()).unwrap();
        assert_eq!(writer.pos().unwrap(), 88);
    }

    #[test]
    fn strip_chars_removes_quotes() {
        assert_eq!(strip_chars("\"Xform\"", '"'), "Xform");
    }
}
