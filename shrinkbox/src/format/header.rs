use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};

// Make some attempt to not accidentally load plain text files,
// and also make it break almost immediately in any UTF-8 compliant text parser.
pub(crate) const MAGIC_BYTES: &[u8; 4] = b"\xffSBX";

pub(crate) const VERSION: u32 = 0x1;

/// Encoded size of a `StreamHeader` in bytes.
pub(crate) const HEADER_SIZE: u64 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StreamHeader {
    pub(crate) magic_bytes: [u8; 4],
    pub(crate) version: u32,
    pub(crate) entries: u64,
}

impl StreamHeader {
    pub(crate) fn new(entries: u64) -> StreamHeader {
        StreamHeader {
            magic_bytes: *MAGIC_BYTES,
            version: VERSION,
            entries,
        }
    }

    pub(crate) fn write<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&self.magic_bytes)?;
        writer.write_u32::<LittleEndian>(self.version)?;
        writer.write_u64::<LittleEndian>(self.entries)
    }

    pub(crate) fn read<R: Read>(reader: &mut R) -> Result<StreamHeader> {
        let mut magic_bytes = [0u8; 4];
        reader.read_exact(&mut magic_bytes)?;

        if &magic_bytes != MAGIC_BYTES {
            return Err(Error::Format("magic bytes invalid or not found".into()));
        }

        let version = reader.read_u32::<LittleEndian>()?;
        if version != VERSION {
            return Err(Error::Format(format!("unsupported version {}", version)));
        }

        let entries = reader.read_u64::<LittleEndian>()?;

        Ok(StreamHeader {
            magic_bytes,
            version,
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn header_layout() {
        let mut buf = vec![];
        StreamHeader::new(3).write(&mut buf).unwrap();
        assert_eq!(buf.len() as u64, HEADER_SIZE);
        assert_eq!(&buf[..4], MAGIC_BYTES);
        assert_eq!(StreamHeader::read(&mut Cursor::new(buf)).unwrap().entries, 3);
    }

    #[test]
    fn rejects_text() {
        let err = StreamHeader::read(&mut Cursor::new(b"hello world, not a box")).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn rejects_future_version() {
        let mut buf = MAGIC_BYTES.to_vec();
        buf.extend_from_slice(&2u32.to_le_bytes());
        buf.extend_from_slice(&0u64.to_le_bytes());
        assert!(matches!(
            StreamHeader::read(&mut Cursor::new(buf)),
            Err(Error::Format(_))
        ));
    }
}
