use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use super::{header::StreamHeader, Compression, ENTRY_DIRECTORY, ENTRY_FILE};
use crate::{
    asset::ByteAsset,
    config::Configuration,
    error::{parse_path, Error, Result},
    node::{Content, Node},
    path::ArchivePath,
    Archive,
};

/// Rebuilds an archive named `name` from a box stream, using the default
/// configuration.
///
/// Entries are restored exactly as written, in stream order: no missing
/// ancestors are created. Every file entry becomes an in-memory `ByteAsset`;
/// nested archives that were exported into the stream come back as plain
/// files.
pub fn read_archive<R: Read>(name: &str, reader: R) -> Result<Archive> {
    read_archive_with(name, Configuration::default(), reader)
}

pub fn read_archive_with<R: Read>(
    name: &str,
    configuration: Configuration,
    mut reader: R,
) -> Result<Archive> {
    let header = StreamHeader::read(&mut reader)?;
    let mut archive = Archive::with_configuration(name, configuration)?;

    for _ in 0..header.entries {
        let kind = reader.read_u8()?;
        let path = read_path(&mut reader)?;

        match kind {
            ENTRY_DIRECTORY => archive.restore(Node::directory(path))?,
            ENTRY_FILE => {
                let bytes = read_file(&mut reader, &path)?;
                archive.restore(Node {
                    path,
                    content: Some(Content::from(ByteAsset::from(bytes))),
                })?;
            }
            other => {
                return Err(Error::Format(format!(
                    "unknown entry kind {:#x} at `{}`",
                    other, path
                )))
            }
        }
    }

    tracing::debug!(
        archive = name,
        entries = header.entries,
        "imported archive"
    );

    Ok(archive)
}

fn read_exact_len<R: Read>(reader: &mut R, len: u64, what: &str) -> Result<Vec<u8>> {
    let mut buf = vec![];
    reader.take(len).read_to_end(&mut buf)?;
    if buf.len() as u64 != len {
        return Err(Error::Format(format!(
            "truncated {}: expected {} bytes, found {}",
            what,
            len,
            buf.len()
        )));
    }
    Ok(buf)
}

fn read_path<R: Read>(reader: &mut R) -> Result<ArchivePath> {
    let len = reader.read_u64::<LittleEndian>()?;
    let bytes = read_exact_len(reader, len, "path")?;
    let raw = String::from_utf8(bytes)
        .map_err(|_| Error::Format("entry path is not valid UTF-8".into()))?;
    parse_path(&raw)
}

fn read_file<R: Read>(reader: &mut R, path: &ArchivePath) -> Result<Vec<u8>> {
    let compression = Compression::from_id(reader.read_u8()?);
    let length = reader.read_u64::<LittleEndian>()?;
    let stored_length = reader.read_u64::<LittleEndian>()?;
    let stored = read_exact_len(reader, stored_length, "entry content")?;

    let mut bytes = vec![];
    compression.decompress_write(Cursor::new(stored), &mut bytes)?;

    if bytes.len() as u64 != length {
        return Err(Error::Format(format!(
            "`{}` decompressed to {} bytes, expected {}",
            path,
            bytes.len(),
            length
        )));
    }

    tracing::trace!(%path, %compression, length, stored = stored_length, "read entry");
    Ok(bytes)
}
