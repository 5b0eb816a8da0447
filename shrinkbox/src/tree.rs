use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use crate::{
    config::ConflictPolicy,
    error::{Error, Result},
    node::{Content, Node, NodeKind},
    path::ArchivePath,
};

/// Every node of one archive, keyed by path and kept in first-insertion order.
///
/// Structure is carried by the paths alone: a node never links to its
/// children. After any `put`, all proper ancestors of the written path exist
/// as nodes.
///
/// The root `/` is always present, is never yielded by `contents()` and can
/// not be removed.
#[derive(Debug, Clone)]
pub struct ArchiveTree {
    root: Node,

    /// Nodes in insertion order. Replacing a node keeps its slot.
    nodes: Vec<Node>,

    /// Slot of each stored path in `nodes`.
    index: HashMap<ArchivePath, usize>,
}

impl Default for ArchiveTree {
    fn default() -> Self {
        ArchiveTree {
            root: Node::directory(ArchivePath::root()),
            nodes: vec![],
            index: HashMap::new(),
        }
    }
}

impl ArchiveTree {
    pub fn new() -> ArchiveTree {
        ArchiveTree::default()
    }

    /// Number of stored nodes, excluding the root.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, path: &ArchivePath) -> Option<&Node> {
        if path.is_root() {
            return Some(&self.root);
        }
        self.index.get(path).map(|i| &self.nodes[*i])
    }

    #[inline(always)]
    pub fn contains(&self, path: &ArchivePath) -> bool {
        path.is_root() || self.index.contains_key(path)
    }

    /// Inserts or replaces the node at `path` and returns the node it replaced.
    ///
    /// Missing ancestors are created as directory markers, shallowest first.
    /// A write that changes a node between leaf and directory is resolved by
    /// `policy`: under `Overwrite` the later write wins (a leaf written over a
    /// directory also drops that directory's descendants), under `Reject` the
    /// call fails before anything is modified.
    pub fn put(
        &mut self,
        path: ArchivePath,
        content: Option<Content>,
        policy: ConflictPolicy,
    ) -> Result<Option<Node>> {
        if path.is_root() {
            return match content {
                Some(_) => Err(Error::InvalidArgument(
                    "content cannot be stored at the archive root",
                )),
                None => Ok(None),
            };
        }

        let incoming = content
            .as_ref()
            .map(Content::kind)
            .unwrap_or(NodeKind::Directory);

        if policy == ConflictPolicy::Reject {
            self.check_conflicts(&path, incoming)?;
        }

        for ancestor in path.ancestors() {
            match self.index.get(&ancestor).copied() {
                None => self.push(Node::directory(ancestor)),
                Some(i) if self.nodes[i].is_leaf() => {
                    tracing::warn!(
                        path = %ancestor,
                        existing = %self.nodes[i].kind(),
                        descendant = %path,
                        "path conflict: replacing leaf with directory"
                    );
                    self.nodes[i].content = None;
                }
                Some(_) => {}
            }
        }

        tracing::trace!(%path, kind = %incoming, "put");

        let existing_slot = self.index.get(&path).copied();
        let i = match existing_slot {
            None => {
                self.push(Node { path, content });
                return Ok(None);
            }
            Some(i) => i,
        };

        let existing = self.nodes[i].kind();
        if existing.is_directory() != incoming.is_directory() {
            tracing::warn!(%path, %existing, %incoming, "path conflict: replacing node of different kind");
        }

        let i = if existing.is_directory() && !incoming.is_directory() {
            let dropped = self.remove_descendants(&path);
            if dropped > 0 {
                tracing::warn!(%path, dropped, "dropped descendants of replaced directory");
            }
            self.index[&path]
        } else {
            i
        };

        let previous = std::mem::replace(&mut self.nodes[i], Node { path, content });
        Ok(Some(previous))
    }

    /// Stores `node` exactly as given: no ancestors are created and nothing
    /// is overwritten. Used to rebuild a tree from a box stream, which may
    /// legitimately lack interior directories removed by `remove`.
    ///
    /// Fails with `Error::Format` on the root, on a duplicate path, or when
    /// the node would break the leaf/directory invariant.
    pub(crate) fn restore(&mut self, node: Node) -> Result<()> {
        if node.path.is_root() {
            return Err(Error::Format("entry stored at the archive root".into()));
        }
        if self.index.contains_key(&node.path) {
            return Err(Error::Format(format!("duplicate entry `{}`", node.path)));
        }
        if let Some(leaf) = node
            .path
            .ancestors()
            .find(|ancestor| self.get(ancestor).map_or(false, Node::is_leaf))
        {
            return Err(Error::Format(format!(
                "`{}` is stored below the file `{}`",
                node.path, leaf
            )));
        }
        if node.is_leaf() && self.descendants(&node.path).next().is_some() {
            return Err(Error::Format(format!(
                "file `{}` has entries stored below it",
                node.path
            )));
        }

        tracing::trace!(path = %node.path, kind = %node.kind(), "restore");
        self.push(node);
        Ok(())
    }

    fn check_conflicts(&self, path: &ArchivePath, incoming: NodeKind) -> Result<()> {
        for ancestor in path.ancestors() {
            if let Some(node) = self.get(&ancestor) {
                if node.is_leaf() {
                    return Err(Error::PathConflict {
                        path: ancestor,
                        existing: node.kind(),
                        incoming: NodeKind::Directory,
                    });
                }
            }
        }

        if let Some(node) = self.get(path) {
            if node.is_directory() != incoming.is_directory() {
                return Err(Error::PathConflict {
                    path: path.clone(),
                    existing: node.kind(),
                    incoming,
                });
            }
        }

        Ok(())
    }

    #[inline(always)]
    fn push(&mut self, node: Node) {
        self.index.insert(node.path.clone(), self.nodes.len());
        self.nodes.push(node);
    }

    /// Removes exactly the node at `path`. Descendants are left in place.
    pub fn remove(&mut self, path: &ArchivePath) -> bool {
        let i = match self.index.remove(path) {
            Some(i) => i,
            None => return false,
        };

        self.nodes.remove(i);
        self.reindex_from(i);
        true
    }

    fn remove_descendants(&mut self, path: &ArchivePath) -> usize {
        let before = self.nodes.len();
        self.nodes
            .retain(|node| node.path == *path || !node.path.starts_with(path));
        let dropped = before - self.nodes.len();
        if dropped > 0 {
            self.index.retain(|p, _| p == path || !p.starts_with(path));
            self.reindex_from(0);
        }
        dropped
    }

    fn reindex_from(&mut self, start: usize) {
        for (offset, node) in self.nodes[start..].iter().enumerate() {
            if let Some(slot) = self.index.get_mut(&node.path) {
                *slot = start + offset;
            }
        }
    }

    /// Paths exactly one segment below `path`, in insertion order.
    pub fn children<'a>(&'a self, path: &ArchivePath) -> impl Iterator<Item = &'a ArchivePath> + 'a {
        let parent = path.clone();
        let depth = path.depth() + 1;
        self.nodes
            .iter()
            .map(|node| &node.path)
            .filter(move |p| p.depth() == depth && p.starts_with(&parent))
    }

    /// Every stored path strictly below `path`, in insertion order.
    pub fn descendants<'a>(
        &'a self,
        path: &ArchivePath,
    ) -> impl Iterator<Item = &'a ArchivePath> + 'a {
        let ancestor = path.clone();
        self.nodes
            .iter()
            .map(|node| &node.path)
            .filter(move |p| **p != ancestor && p.starts_with(&ancestor))
    }

    /// All stored nodes in insertion order.
    pub fn contents(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }
}

impl PartialEq for ArchiveTree {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .nodes
                .iter()
                .all(|node| other.get(&node.path) == Some(node))
    }
}

impl Eq for ArchiveTree {}

impl Hash for ArchiveTree {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut nodes: Vec<&Node> = self.nodes.iter().collect();
        nodes.sort_by(|a, b| a.path.cmp(&b.path));
        nodes.len().hash(state);
        for node in nodes {
            node.hash(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tracing_test::traced_test;

    fn p(raw: &str) -> ArchivePath {
        ArchivePath::new(raw).unwrap()
    }

    fn put_file(tree: &mut ArchiveTree, raw: &str, body: &str) -> Option<Node> {
        tree.put(p(raw), Some(Content::from(body)), ConflictPolicy::Overwrite)
            .unwrap()
    }

    fn paths(tree: &ArchiveTree) -> Vec<&str> {
        tree.contents().map(|n| n.path().as_str()).collect()
    }

    #[test]
    fn ancestors_materialized() {
        let mut tree = ArchiveTree::new();
        put_file(&mut tree, "/a/b/c.txt", "A");

        assert!(tree.get(&p("/a")).unwrap().is_directory());
        assert!(tree.get(&p("/a/b")).unwrap().is_directory());
        let leaf = tree.get(&p("/a/b/c.txt")).unwrap();
        assert_eq!(leaf.content().unwrap().read_all().unwrap(), b"A");
        assert_eq!(paths(&tree), vec!["/a", "/a/b", "/a/b/c.txt"]);
    }

    #[test]
    fn root_always_present() {
        let mut tree = ArchiveTree::new();
        assert!(tree.get(&ArchivePath::root()).unwrap().is_directory());
        assert!(!tree.remove(&ArchivePath::root()));
        assert!(tree
            .put(ArchivePath::root(), None, ConflictPolicy::Overwrite)
            .unwrap()
            .is_none());
        assert!(tree.is_empty());
        assert!(matches!(
            tree.put(ArchivePath::root(), Some(Content::from("x")), ConflictPolicy::Overwrite),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn overwrite_keeps_position() {
        let mut tree = ArchiveTree::new();
        put_file(&mut tree, "/one", "1");
        put_file(&mut tree, "/two", "2");
        put_file(&mut tree, "/three", "3");

        let previous = put_file(&mut tree, "/two", "22").unwrap();
        assert_eq!(previous.content().unwrap().read_all().unwrap(), b"2");
        assert_eq!(paths(&tree), vec!["/one", "/two", "/three"]);
        assert_eq!(
            tree.get(&p("/two")).unwrap().content().unwrap().read_all().unwrap(),
            b"22"
        );
    }

    #[test]
    fn unique_paths_after_many_puts() {
        let mut tree = ArchiveTree::new();
        for raw in ["/a/b", "/a", "a/b/", "/a/b/c", "/a//b/c", "/d", "/a/b/c"] {
            put_file(&mut tree, raw, raw);
        }
        tree.put(p("/a"), None, ConflictPolicy::Overwrite).unwrap();

        let unique: HashSet<_> = tree.contents().map(|n| n.path().clone()).collect();
        assert_eq!(unique.len(), tree.len());
    }

    #[test]
    fn remove_does_not_cascade() {
        let mut tree = ArchiveTree::new();
        put_file(&mut tree, "/a/b/c.txt", "A");
        put_file(&mut tree, "/z.txt", "Z");

        assert!(tree.remove(&p("/a")));
        assert!(!tree.remove(&p("/a")));
        assert!(tree.get(&p("/a")).is_none());
        assert!(tree.get(&p("/a/b/c.txt")).is_some());
        assert_eq!(paths(&tree), vec!["/a/b", "/a/b/c.txt", "/z.txt"]);
        // The index must follow the shifted slots.
        assert_eq!(
            tree.get(&p("/z.txt")).unwrap().content().unwrap().read_all().unwrap(),
            b"Z"
        );
    }

    #[test]
    fn children_and_descendants() {
        let mut tree = ArchiveTree::new();
        put_file(&mut tree, "/WEB-INF/classes/Foo.class", "");
        put_file(&mut tree, "/WEB-INF/web.xml", "");
        put_file(&mut tree, "/index.html", "");

        let root = ArchivePath::root();
        let children: Vec<_> = tree.children(&root).map(|p| p.as_str()).collect();
        assert_eq!(children, vec!["/WEB-INF", "/index.html"]);

        let web_inf = p("/WEB-INF");
        let children: Vec<_> = tree.children(&web_inf).map(|p| p.as_str()).collect();
        assert_eq!(children, vec!["/WEB-INF/classes", "/WEB-INF/web.xml"]);

        let descendants: Vec<_> = tree.descendants(&web_inf).map(|p| p.as_str()).collect();
        assert_eq!(
            descendants,
            vec!["/WEB-INF/classes", "/WEB-INF/classes/Foo.class", "/WEB-INF/web.xml"]
        );
        assert_eq!(tree.descendants(&root).count(), tree.len());
    }

    #[test]
    #[traced_test]
    fn leaf_over_directory_drops_descendants() {
        let mut tree = ArchiveTree::new();
        put_file(&mut tree, "/a/b.txt", "B");
        put_file(&mut tree, "/c.txt", "C");

        let previous = put_file(&mut tree, "/a", "now a file").unwrap();
        assert!(previous.is_directory());
        assert!(tree.get(&p("/a")).unwrap().is_leaf());
        assert!(tree.get(&p("/a/b.txt")).is_none());
        assert_eq!(paths(&tree), vec!["/a", "/c.txt"]);
        assert!(logs_contain("path conflict"));
    }

    #[test]
    fn directory_over_leaf_and_leaf_ancestor() {
        let mut tree = ArchiveTree::new();
        put_file(&mut tree, "/a", "A");
        put_file(&mut tree, "/a/b.txt", "B");
        assert!(tree.get(&p("/a")).unwrap().is_directory());

        put_file(&mut tree, "/x", "X");
        let previous = tree.put(p("/x"), None, ConflictPolicy::Overwrite).unwrap();
        assert!(previous.unwrap().is_leaf());
        assert!(tree.get(&p("/x")).unwrap().is_directory());
    }

    #[test]
    fn reject_policy_leaves_tree_untouched() {
        let mut tree = ArchiveTree::new();
        put_file(&mut tree, "/a", "A");
        let before = paths(&tree).join(",");

        let err = tree
            .put(p("/a/b/c"), Some(Content::from("x")), ConflictPolicy::Reject)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::PathConflict {
                existing: NodeKind::File,
                incoming: NodeKind::Directory,
                ..
            }
        ));
        assert!(tree
            .put(p("/a"), None, ConflictPolicy::Reject)
            .is_err());
        assert_eq!(paths(&tree).join(","), before);

        // Same-kind replacement is still allowed.
        assert!(tree
            .put(p("/a"), Some(Content::from("A2")), ConflictPolicy::Reject)
            .is_ok());
    }

    #[test]
    fn restore_skips_ancestors() {
        let mut tree = ArchiveTree::new();
        tree.restore(Node {
            path: p("/a/b/c.txt"),
            content: Some(Content::from("C")),
        })
        .unwrap();
        tree.restore(Node::directory(p("/a"))).unwrap();

        assert_eq!(paths(&tree), vec!["/a/b/c.txt", "/a"]);
        assert!(tree.get(&p("/a/b")).is_none());
    }

    #[test]
    fn restore_rejects_inconsistent_nodes() {
        let mut tree = ArchiveTree::new();
        put_file(&mut tree, "/a/b", "B");

        let below_leaf = Node::directory(p("/a/b/c"));
        assert!(matches!(tree.restore(below_leaf), Err(Error::Format(_))));
        assert!(matches!(
            tree.restore(Node::directory(p("/a"))),
            Err(Error::Format(_))
        ));
        let over_children = Node {
            path: p("/a"),
            content: Some(Content::from("A")),
        };
        let mut other = ArchiveTree::new();
        other.restore(Node::directory(p("/a/x"))).unwrap();
        assert!(matches!(other.restore(over_children), Err(Error::Format(_))));
        assert!(matches!(
            other.restore(Node::directory(ArchivePath::root())),
            Err(Error::Format(_))
        ));
        assert_eq!(paths(&tree), vec!["/a", "/a/b"]);
    }

    #[test]
    fn equality_ignores_order() {
        let mut left = ArchiveTree::new();
        put_file(&mut left, "/a/b", "1");
        put_file(&mut left, "/c", "2");

        let mut right = ArchiveTree::new();
        put_file(&mut right, "/c", "2");
        put_file(&mut right, "/a/b", "1");

        assert_eq!(left, right);

        use std::collections::hash_map::DefaultHasher;
        let hash = |tree: &ArchiveTree| {
            let mut h = DefaultHasher::new();
            tree.hash(&mut h);
            h.finish()
        };
        assert_eq!(hash(&left), hash(&right));

        right.remove(&p("/c"));
        assert_ne!(left, right);
    }
}
