//! The box stream: a flat, ordered serialization of an archive.
//!
//! ```text
//! header:  magic "\xffSBX" | version u32 | entry count u64
//! entry:   kind u8 | path length u64 | path bytes
//! file:    compression id u8 | length u64 | stored length u64 | stored bytes
//! ```
//!
//! Integers are little-endian. Entries appear in the archive's insertion
//! order, so ancestors are normally written before their descendants.

mod compression;
mod header;
mod reader;
mod writer;

pub use self::compression::{constants, Compression, ParseCompressionError};
pub use self::reader::{read_archive, read_archive_with};
pub(crate) use self::writer::StreamWriter;

pub(crate) const ENTRY_DIRECTORY: u8 = 0x00;
pub(crate) const ENTRY_FILE: u8 = 0x01;
