//! A `.usdc` crate-file codec: the binary container Pixar's USD format uses
//! to store a scene layer as six flat, deduplicating tables (tokens,
//! strings, fields, field sets, paths, specs) behind a small boot header and
//! table of contents.
//!
//! - `rep`: the 64-bit representation word every field value decodes
//!   through (array/inline/compressed bits, a type tag, a 48-bit payload).
//! - `valuetype`: the value-type tag registry, plus `Specifier`/`SpecType`.
//! - `value`: the tagged `Value`/`TimeSample` union the public write API
//!   accepts and the read API returns.
//! - `tables`: the five deduplicating tables and the out-of-line write-data
//!   cache.
//! - `compress`: the shared `lz4(int-pack(values))` framing and its two
//!   codecs.
//! - `toc`: boot header and table-of-contents (de)serialisation; the only
//!   module that knows the six sections' exact byte layouts.
//! - `encode`: the field encoder dispatch (one method per value-type
//!   family) plus the time-sampled track encoder.
//! - `writer` / `reader`: the public `CrateWriter` / `CrateReader` session
//!   objects built on top of the above.
//! - `ioutil`: byte I/O primitives and the in-memory/on-disk backends.
//! - `error`: the codec's error taxonomy.

#![allow(dead_code)]

pub mod compress;
pub mod encode;
pub mod error;
pub mod ioutil;
pub mod rep;
pub mod reader;
pub mod tables;
pub mod toc;
pub mod value;
pub mod valuetype;
pub mod writer;

pub use error::CrateError;
pub use ioutil::{FileReader, FileWriter, MemReader, MemWriter, Reader, Writer};
pub use reader::{CrateReader, CrateReaderOptions};
pub use rep::Representation;
pub use value::{TimeSample, Value};
pub use valuetype::{SpecType, Specifier, ValueType};
pub use writer::{CrateWriter, CrateWriterOptions};

#[cfg(test)]
mod test;
