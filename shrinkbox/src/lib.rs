//! In-memory archives addressed by canonical paths.
//!
//! An [`Archive`] is a named tree of nodes. Leaves carry [`Content`], either
//! an [`Asset`] or a whole nested archive; every other node is a directory
//! marker. Archives can be merged through a [`Filter`] and adapted to other
//! representations through typed views, such as the box stream written by
//! [`view::export::Export`].

mod archive;
mod asset;
mod config;
mod error;
mod filter;
pub mod format;
mod formatter;
mod node;
pub mod path;
mod tree;
pub mod view;

pub use archive::Archive;
pub use asset::{read_all, Asset, ByteAsset, EmptyAsset};
pub use config::{Configuration, ConfigurationBuilder, ConflictPolicy};
pub use error::{BoxError, Error, Result};
pub use filter::{filters, Filter, FilterExt};
pub use format::{read_archive, read_archive_with, Compression};
pub use formatter::Formatter;
pub use node::{Content, ExportFormat, Node, NodeKind};
pub use path::{ArchivePath, PathError};
pub use tree::ArchiveTree;
pub use view::{
    export::{BoxExporter, Export},
    resources::{ResourceContext, Resources},
    Capability, ViewFactory, ViewLoader,
};

#[doc(hidden)]
pub use comde;
