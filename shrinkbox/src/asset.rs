//! Byte-producing content that can be stored at a leaf.

use std::fmt;
use std::io::{Cursor, Read};
use std::sync::Arc;

/// A repeatable source of bytes.
///
/// `open` must be side-effect free: exporting an archive may open the same
/// asset more than once, and several exports may read it concurrently.
pub trait Asset: Send + Sync + fmt::Debug {
    fn open(&self) -> std::io::Result<Box<dyn Read + '_>>;
}

/// An asset backed by an in-memory buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct ByteAsset(Arc<[u8]>);

impl ByteAsset {
    pub fn new<B: Into<Vec<u8>>>(bytes: B) -> ByteAsset {
        ByteAsset(bytes.into().into())
    }

    #[inline(always)]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for ByteAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteAsset").field("len", &self.0.len()).finish()
    }
}

impl Asset for ByteAsset {
    fn open(&self) -> std::io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(Cursor::new(&self.0[..])))
    }
}

impl From<Vec<u8>> for ByteAsset {
    fn from(value: Vec<u8>) -> Self {
        ByteAsset::new(value)
    }
}

impl From<&[u8]> for ByteAsset {
    fn from(value: &[u8]) -> Self {
        ByteAsset::new(value)
    }
}

impl From<String> for ByteAsset {
    fn from(value: String) -> Self {
        ByteAsset::new(value)
    }
}

impl From<&str> for ByteAsset {
    fn from(value: &str) -> Self {
        ByteAsset::new(value)
    }
}

/// An asset with no bytes at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmptyAsset;

impl Asset for EmptyAsset {
    fn open(&self) -> std::io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(std::io::empty()))
    }
}

/// Reads an asset to the end.
pub fn read_all(asset: &dyn Asset) -> std::io::Result<Vec<u8>> {
    let mut buf = vec![];
    asset.open()?.read_to_end(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_asset_is_repeatable() {
        let asset = ByteAsset::from("hello");
        assert_eq!(read_all(&asset).unwrap(), b"hello");
        assert_eq!(read_all(&asset).unwrap(), b"hello");
    }

    #[test]
    fn empty_asset_reads_nothing() {
        assert!(read_all(&EmptyAsset).unwrap().is_empty());
    }
}
