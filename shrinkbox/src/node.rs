use std::{
    fmt,
    hash::{Hash, Hasher},
    io::{Cursor, Read},
    sync::Arc,
};

use crate::{
    asset::{Asset, ByteAsset, EmptyAsset},
    format::Compression,
    path::ArchivePath,
    view::export::BoxExporter,
    Archive,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Directory,
    File,
    Archive,
}

impl NodeKind {
    #[inline(always)]
    pub fn is_directory(self) -> bool {
        self == NodeKind::Directory
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Directory => "directory",
            NodeKind::File => "file",
            NodeKind::Archive => "archive",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The exporter used to turn a nested archive into bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExportFormat {
    Box(Compression),
}

impl Default for ExportFormat {
    fn default() -> Self {
        ExportFormat::Box(Compression::Stored)
    }
}

/// What a leaf holds.
#[derive(Clone)]
pub enum Content {
    Asset(Arc<dyn Asset>),
    /// A whole archive, exported with `format` only when the content is opened.
    Archive {
        archive: Arc<Archive>,
        format: ExportFormat,
    },
}

impl Content {
    pub fn asset<A: Asset + 'static>(asset: A) -> Content {
        Content::Asset(Arc::new(asset))
    }

    /// Nests `archive`. Passing an `Arc` shares it with the caller; passing an
    /// owned `Archive` stores that snapshot.
    pub fn archive<A: Into<Arc<Archive>>>(archive: A, format: ExportFormat) -> Content {
        Content::Archive {
            archive: archive.into(),
            format,
        }
    }

    #[inline(always)]
    pub fn kind(&self) -> NodeKind {
        match self {
            Content::Asset(_) => NodeKind::File,
            Content::Archive { .. } => NodeKind::Archive,
        }
    }

    /// Opens a fresh byte stream over this content.
    pub fn open(&self) -> crate::Result<Box<dyn Read + '_>> {
        match self {
            Content::Asset(asset) => Ok(asset.open()?),
            Content::Archive { archive, format } => {
                let bytes = match format {
                    ExportFormat::Box(compression) => BoxExporter::new(archive)
                        .with_compression(*compression)
                        .export()?,
                };
                Ok(Box::new(Cursor::new(bytes)))
            }
        }
    }

    pub fn read_all(&self) -> crate::Result<Vec<u8>> {
        let mut buf = vec![];
        self.open()?.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Content::Asset(asset) => f.debug_tuple("Asset").field(asset).finish(),
            Content::Archive { archive, format } => f
                .debug_struct("Archive")
                .field("name", &archive.name())
                .field("format", format)
                .finish(),
        }
    }
}

impl From<Arc<dyn Asset>> for Content {
    fn from(value: Arc<dyn Asset>) -> Self {
        Content::Asset(value)
    }
}

impl From<ByteAsset> for Content {
    fn from(value: ByteAsset) -> Self {
        Content::asset(value)
    }
}

impl From<EmptyAsset> for Content {
    fn from(value: EmptyAsset) -> Self {
        Content::asset(value)
    }
}

impl From<Vec<u8>> for Content {
    fn from(value: Vec<u8>) -> Self {
        Content::asset(ByteAsset::from(value))
    }
}

impl From<&[u8]> for Content {
    fn from(value: &[u8]) -> Self {
        Content::asset(ByteAsset::from(value))
    }
}

impl From<String> for Content {
    fn from(value: String) -> Self {
        Content::asset(ByteAsset::from(value))
    }
}

impl From<&str> for Content {
    fn from(value: &str) -> Self {
        Content::asset(ByteAsset::from(value))
    }
}

/// The entry stored at one path: a leaf when it has content, otherwise a
/// directory marker.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) path: ArchivePath,
    pub(crate) content: Option<Content>,
}

impl Node {
    pub(crate) fn directory(path: ArchivePath) -> Node {
        Node {
            path,
            content: None,
        }
    }

    #[inline(always)]
    pub fn path(&self) -> &ArchivePath {
        &self.path
    }

    #[inline(always)]
    pub fn content(&self) -> Option<&Content> {
        self.content.as_ref()
    }

    #[inline(always)]
    pub fn is_directory(&self) -> bool {
        self.content.is_none()
    }

    #[inline(always)]
    pub fn is_leaf(&self) -> bool {
        self.content.is_some()
    }

    pub fn kind(&self) -> NodeKind {
        self.content
            .as_ref()
            .map(Content::kind)
            .unwrap_or(NodeKind::Directory)
    }
}

// Only the path and directory-ness take part in equality; content is not compared.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.is_directory() == other.is_directory()
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
        self.is_directory().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_content_identity() {
        let path = ArchivePath::new("/a.txt").unwrap();
        let a = Node {
            path: path.clone(),
            content: Some(Content::from("one")),
        };
        let b = Node {
            path: path.clone(),
            content: Some(Content::from("two")),
        };
        assert_eq!(a, b);
        assert_ne!(a, Node::directory(path));
    }

    #[test]
    fn kinds() {
        let path = ArchivePath::new("/a").unwrap();
        assert_eq!(Node::directory(path.clone()).kind(), NodeKind::Directory);
        let leaf = Node {
            path,
            content: Some(Content::from(EmptyAsset)),
        };
        assert_eq!(leaf.kind(), NodeKind::File);
        assert!(leaf.is_leaf());
        assert_eq!(leaf.content().unwrap().read_all().unwrap(), Vec::<u8>::new());
    }
}
