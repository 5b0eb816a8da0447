use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::{
    config::Configuration,
    error::{parse_path, Error, Result},
    filter::{filters, Filter},
    formatter::Formatter,
    node::{Content, ExportFormat, Node},
    path::ArchivePath,
    tree::ArchiveTree,
    view::Capability,
};

/// A named, in-memory archive.
///
/// Every mutating operation returns `&mut Archive`, so calls chain:
///
/// ```
/// use shrinkbox::Archive;
///
/// let mut archive = Archive::new("app.war")?;
/// archive
///     .add_at("<web-app/>", "/WEB-INF/web.xml")?
///     .add_directory_at("/META-INF")?;
///
/// assert!(archive.get_at("/WEB-INF")?.unwrap().is_directory());
/// assert_eq!(archive.len(), 3);
/// # Ok::<(), shrinkbox::Error>(())
/// ```
///
/// An archive has no internal locking. It is `Send` and `Sync`, but callers
/// that mutate one archive from several threads must wrap it in a lock.
#[derive(Clone)]
pub struct Archive {
    name: String,
    configuration: Configuration,
    tree: ArchiveTree,
}

impl Archive {
    /// An empty archive using `Configuration::default()`.
    pub fn new<S: Into<String>>(name: S) -> Result<Archive> {
        Archive::with_configuration(name, Configuration::default())
    }

    pub fn with_configuration<S: Into<String>>(
        name: S,
        configuration: Configuration,
    ) -> Result<Archive> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::InvalidArgument("archive name must not be empty"));
        }

        Ok(Archive {
            name,
            configuration,
            tree: ArchiveTree::new(),
        })
    }

    #[inline(always)]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline(always)]
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    #[inline(always)]
    pub fn tree(&self) -> &ArchiveTree {
        &self.tree
    }

    fn put(&mut self, path: ArchivePath, content: Option<Content>) -> Result<&mut Self> {
        self.tree
            .put(path, content, self.configuration.conflict_policy())?;
        Ok(self)
    }

    /// Stores `content` at `target`, creating any missing parent directories.
    pub fn add<C: Into<Content>>(&mut self, content: C, target: &ArchivePath) -> Result<&mut Self> {
        self.put(target.clone(), Some(content.into()))
    }

    pub fn add_at<C: Into<Content>>(&mut self, content: C, target: &str) -> Result<&mut Self> {
        let target = parse_path(target)?;
        self.put(target, Some(content.into()))
    }

    /// Stores `content` at `target/name`.
    pub fn add_named<C: Into<Content>>(
        &mut self,
        content: C,
        target: &ArchivePath,
        name: &str,
    ) -> Result<&mut Self> {
        if name.trim().is_empty() {
            return Err(Error::InvalidArgument("entry name must not be empty"));
        }
        let target = target
            .try_join(name)
            .map_err(|source| Error::invalid_path(name, source))?;
        self.put(target, Some(content.into()))
    }

    /// Nests `archive` at `target/<archive name>`. It is exported with
    /// `format` whenever this entry is opened.
    ///
    /// An `Arc<Archive>` is recorded as is, so the caller keeps a shared
    /// reference to the nested archive.
    pub fn add_archive<A: Into<Arc<Archive>>>(
        &mut self,
        archive: A,
        target: &ArchivePath,
        format: ExportFormat,
    ) -> Result<&mut Self> {
        let archive = archive.into();
        let name = archive.name.clone();
        self.add_named(Content::archive(archive, format), target, &name)
    }

    pub fn add_directory(&mut self, path: &ArchivePath) -> Result<&mut Self> {
        self.put(path.clone(), None)
    }

    pub fn add_directory_at(&mut self, path: &str) -> Result<&mut Self> {
        let path = parse_path(path)?;
        self.put(path, None)
    }

    pub fn add_directories<'p, I>(&mut self, paths: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = &'p ArchivePath>,
    {
        for path in paths {
            self.add_directory(path)?;
        }
        Ok(self)
    }

    pub fn add_directories_at<I, S>(&mut self, paths: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for path in paths {
            self.add_directory_at(path.as_ref())?;
        }
        Ok(self)
    }

    /// Stores `node` verbatim, without creating ancestors.
    pub(crate) fn restore(&mut self, node: Node) -> Result<()> {
        self.tree.restore(node)
    }

    #[inline(always)]
    pub fn get(&self, path: &ArchivePath) -> Option<&Node> {
        self.tree.get(path)
    }

    pub fn get_at(&self, path: &str) -> Result<Option<&Node>> {
        Ok(self.tree.get(&parse_path(path)?))
    }

    #[inline(always)]
    pub fn contains(&self, path: &ArchivePath) -> bool {
        self.tree.contains(path)
    }

    /// Paths directly below `path`, in insertion order.
    pub fn children<'a>(&'a self, path: &ArchivePath) -> impl Iterator<Item = &'a ArchivePath> + 'a {
        self.tree.children(path)
    }

    /// Removes the node at `path` only; its descendants stay in place.
    pub fn delete(&mut self, path: &ArchivePath) -> bool {
        let removed = self.tree.remove(path);
        tracing::trace!(archive = %self.name, %path, removed, "delete");
        removed
    }

    /// Removes the node at `path` together with everything below it, returning
    /// how many nodes were removed.
    pub fn delete_recursive(&mut self, path: &ArchivePath) -> usize {
        let mut doomed: Vec<ArchivePath> = self.tree.descendants(path).cloned().collect();
        if !path.is_root() {
            doomed.push(path.clone());
        }

        let removed = doomed.iter().filter(|p| self.tree.remove(p)).count();
        tracing::debug!(archive = %self.name, %path, removed, "delete recursive");
        removed
    }

    /// Copies every entry of `source` into this archive at the same path.
    pub fn merge(&mut self, source: &Archive) -> Result<&mut Self> {
        self.merge_with(source, &ArchivePath::root(), filters::include_all())
    }

    pub fn merge_at(&mut self, source: &Archive, at: &ArchivePath) -> Result<&mut Self> {
        self.merge_with(source, at, filters::include_all())
    }

    pub fn merge_filtered<F: Filter>(&mut self, source: &Archive, filter: F) -> Result<&mut Self> {
        self.merge_with(source, &ArchivePath::root(), filter)
    }

    /// Copies the entries of `source` whose resolved path passes `filter`,
    /// placing each at `at` joined with its path in `source`.
    ///
    /// Entries are applied one at a time in `source`'s insertion order and
    /// an existing entry at a resolved path is overwritten. The merge is not
    /// transactional: if an entry fails, entries applied before it stay.
    /// Content is shared with `source`, not copied.
    ///
    /// `filter` decides which source entries are copied, not which paths may
    /// exist afterwards: an included entry still gets its missing ancestors
    /// created as directories, even where `filter` rejects those ancestor
    /// paths.
    pub fn merge_with<F: Filter>(
        &mut self,
        source: &Archive,
        at: &ArchivePath,
        filter: F,
    ) -> Result<&mut Self> {
        let mut merged = 0usize;
        let mut skipped = 0usize;

        for node in source.contents() {
            let target = at.join(node.path());
            if !filter.include(&target) {
                skipped += 1;
                continue;
            }

            self.put(target, node.content().cloned())?;
            merged += 1;
        }

        tracing::debug!(
            archive = %self.name,
            source = %source.name,
            at = %at,
            merged,
            skipped,
            "merged archive"
        );

        Ok(self)
    }

    /// Builds the `C` view over this archive using the configured registry.
    pub fn as_view<C: Capability>(&self) -> Result<C::View<'_>> {
        self.configuration.views().load::<C>(self)
    }

    /// All nodes except the root, in insertion order.
    pub fn contents(&self) -> impl Iterator<Item = &Node> {
        self.tree.contents()
    }

    pub fn contents_filtered<'a, F: Filter + 'a>(
        &'a self,
        filter: F,
    ) -> impl Iterator<Item = &'a Node> + 'a {
        self.tree
            .contents()
            .filter(move |node| filter.include(node.path()))
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn format(&self, formatter: Formatter) -> String {
        formatter.format(self)
    }
}

impl fmt::Display for Archive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(Formatter::Simple))
    }
}

impl fmt::Debug for Archive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archive")
            .field("name", &self.name)
            .field("entries", &self.tree.len())
            .finish()
    }
}

// Equal archives have the same name and the same set of (path, kind) nodes;
// insertion order and content are not compared.
impl PartialEq for Archive {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.tree == other.tree
    }
}

impl Eq for Archive {}

impl Hash for Archive {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.tree.hash(state);
    }
}
