use std::io::Write;

use super::{Capability, ViewFactory};
use crate::{
    error::{BoxError, Result},
    format::{Compression, StreamWriter},
    Archive,
};

/// Capability producing a [`BoxExporter`].
#[derive(Debug, Clone, Copy)]
pub struct Export;

impl Capability for Export {
    const NAME: &'static str = "export";
    type View<'a> = BoxExporter<'a>;
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ExportFactory;

impl ViewFactory<Export> for ExportFactory {
    fn construct<'a>(&self, archive: &'a Archive) -> std::result::Result<BoxExporter<'a>, BoxError> {
        Ok(BoxExporter::new(archive))
    }
}

/// Writes an archive as a box stream.
///
/// Content is read when the export runs, not when the exporter is created,
/// so nested archives are serialized at this point too.
#[derive(Debug, Clone, Copy)]
pub struct BoxExporter<'a> {
    archive: &'a Archive,
    compression: Compression,
}

impl<'a> BoxExporter<'a> {
    /// An exporter using the archive's configured compression.
    pub fn new(archive: &'a Archive) -> BoxExporter<'a> {
        BoxExporter {
            archive,
            compression: archive.configuration().compression(),
        }
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    #[inline(always)]
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Writes the stream to `writer` and returns the number of bytes written.
    pub fn export_to<W: Write>(&self, writer: W) -> Result<u64> {
        StreamWriter::new(writer, self.compression).write_archive(self.archive)
    }

    pub fn export(&self) -> Result<Vec<u8>> {
        let mut buf = vec![];
        self.export_to(&mut buf)?;
        Ok(buf)
    }
}
