//! A request-path lookup over an archive, shaped like a web application
//! context: the archive `shop.war` answers requests under `/shop`.

use super::{Capability, ViewFactory};
use crate::{
    error::{BoxError, Result},
    node::Node,
    path::ArchivePath,
    Archive,
};

/// Capability producing a [`ResourceContext`].
#[derive(Debug, Clone, Copy)]
pub struct Resources;

impl Capability for Resources {
    const NAME: &'static str = "resources";
    type View<'a> = ResourceContext<'a>;
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ResourcesFactory;

impl ViewFactory<Resources> for ResourcesFactory {
    fn construct<'a>(
        &self,
        archive: &'a Archive,
    ) -> std::result::Result<ResourceContext<'a>, BoxError> {
        Ok(ResourceContext::new(archive))
    }
}

#[derive(Debug, Clone)]
pub struct ResourceContext<'a> {
    archive: &'a Archive,
    context_path: String,
}

impl<'a> ResourceContext<'a> {
    pub fn new(archive: &'a Archive) -> ResourceContext<'a> {
        let name = archive.name();
        let stem = match name.rfind('.') {
            Some(i) if i > 0 => &name[..i],
            _ => name,
        };

        ResourceContext {
            archive,
            context_path: format!("/{}", stem),
        }
    }

    /// `/` followed by the archive name without its final extension.
    #[inline(always)]
    pub fn context_path(&self) -> &str {
        &self.context_path
    }

    fn locate(&self, request: &str) -> Option<ArchivePath> {
        let rest = request.strip_prefix(self.context_path.as_str())?;
        if rest.is_empty() {
            return Some(ArchivePath::root());
        }
        if !rest.starts_with('/') {
            return None;
        }
        ArchivePath::new(rest).ok()
    }

    /// The node a request maps to, if the request lies inside this context.
    pub fn resolve(&self, request: &str) -> Option<&'a Node> {
        let path = self.locate(request)?;
        self.archive.get(&path)
    }

    /// The bytes behind a request. Directories and unknown requests yield
    /// `None`.
    pub fn read(&self, request: &str) -> Result<Option<Vec<u8>>> {
        match self.resolve(request).and_then(Node::content) {
            Some(content) => Ok(Some(content.read_all()?)),
            None => Ok(None),
        }
    }

    /// Entries directly below a directory request.
    pub fn list(&self, request: &str) -> Option<Vec<&'a ArchivePath>> {
        let path = self.locate(request)?;
        let node = self.archive.get(&path)?;
        if !node.is_directory() {
            return None;
        }
        Some(self.archive.children(&path).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::war("testServlet.war", "/testServlet")]
    #[case::double_extension("site.tar.gz", "/site.tar")]
    #[case::no_extension("static", "/static")]
    #[case::dotfile(".hidden", "/.hidden")]
    fn context_path(#[case] name: &str, #[case] expected: &str) {
        let archive = Archive::new(name).unwrap();
        assert_eq!(ResourceContext::new(&archive).context_path(), expected);
    }

    #[test]
    fn requests_outside_context() {
        let mut archive = Archive::new("shop.war").unwrap();
        archive.add_at("hi", "/index.html").unwrap();
        let context = ResourceContext::new(&archive);

        assert!(context.resolve("/shop/index.html").is_some());
        assert!(context.resolve("/shopping/index.html").is_none());
        assert!(context.resolve("/other/index.html").is_none());
        assert!(context.resolve("/shop/../index.html").is_none());
        assert!(context.resolve("/shop").unwrap().is_directory());
        assert_eq!(context.read("/shop/index.html").unwrap().unwrap(), b"hi");
        assert_eq!(context.read("/shop/").unwrap(), None);
    }
}
