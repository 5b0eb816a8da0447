use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use super::{
    header::{StreamHeader, HEADER_SIZE},
    Compression, ENTRY_DIRECTORY, ENTRY_FILE,
};
use crate::{error::Result, node::Node, path::ArchivePath, Archive};

/// Serializes an archive into a box stream, one entry per stored node.
pub(crate) struct StreamWriter<W> {
    writer: W,
    compression: Compression,
    written: u64,
}

impl<W: Write> StreamWriter<W> {
    pub(crate) fn new(writer: W, compression: Compression) -> StreamWriter<W> {
        StreamWriter {
            writer,
            compression,
            written: 0,
        }
    }

    /// Writes `archive` and returns the number of bytes produced.
    pub(crate) fn write_archive(mut self, archive: &Archive) -> Result<u64> {
        StreamHeader::new(archive.len() as u64).write(&mut self.writer)?;
        self.written += HEADER_SIZE;

        for node in archive.contents() {
            self.write_node(node)?;
        }

        self.writer.flush()?;

        tracing::debug!(
            archive = archive.name(),
            entries = archive.len(),
            bytes = self.written,
            compression = %self.compression,
            "exported archive"
        );

        Ok(self.written)
    }

    fn write_node(&mut self, node: &Node) -> Result<()> {
        let content = match node.content() {
            Some(content) => content,
            None => {
                self.write_u8(ENTRY_DIRECTORY)?;
                return self.write_path(node.path());
            }
        };

        let mut raw = vec![];
        content.open()?.read_to_end(&mut raw)?;

        let mut stored = Cursor::new(Vec::with_capacity(raw.len()));
        self.compression
            .compress(&mut stored, &mut Cursor::new(&raw))?;
        let stored = stored.into_inner();

        self.write_u8(ENTRY_FILE)?;
        self.write_path(node.path())?;
        self.write_u8(self.compression.id())?;
        self.write_u64(raw.len() as u64)?;
        self.write_u64(stored.len() as u64)?;
        self.writer.write_all(&stored)?;
        self.written += stored.len() as u64;

        tracing::trace!(
            path = %node.path(),
            kind = %node.kind(),
            length = raw.len(),
            stored = stored.len(),
            "wrote entry"
        );

        Ok(())
    }

    fn write_path(&mut self, path: &ArchivePath) -> Result<()> {
        let bytes = path.as_str().as_bytes();
        self.write_u64(bytes.len() as u64)?;
        self.writer.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    #[inline(always)]
    fn write_u8(&mut self, value: u8) -> Result<()> {
        self.writer.write_u8(value)?;
        self.written += 1;
        Ok(())
    }

    #[inline(always)]
    fn write_u64(&mut self, value: u64) -> Result<()> {
        self.writer.write_u64::<LittleEndian>(value)?;
        self.written += 8;
        Ok(())
    }
}
