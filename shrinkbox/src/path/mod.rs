use std::{cmp::Ordering, fmt, str::FromStr};

use relative_path::{Component, RelativePath};
use unic_ucd::GeneralCategory;

mod error;

pub use self::error::PathError;

/// The separator used when rendering an `ArchivePath`, independent of platform.
pub const PATH_SEP: char = '/';

/// A canonical location inside an archive.
///
/// The canonical form always begins with a single separator, never ends with
/// one (except for the root, which is exactly `/`), and contains no empty,
/// `.` or `..` segments. Segments are stored NFC-normalized, so two paths are
/// equal exactly when their segment sequences are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ArchivePath(String);

fn is_char_allowed(c: char) -> bool {
    let cat = GeneralCategory::of(c);
    !(c == '\\' || cat == GeneralCategory::Control || (cat.is_separator() && c != ' '))
}

/// Splits `raw` into canonical segments.
///
/// Redundant separators and `.` segments are dropped. A `..` segment is never
/// resolved against its predecessor; it is rejected outright.
pub fn sanitize(raw: &str) -> Result<Vec<String>, PathError> {
    use unic_normal::StrNormalForm;

    let mut out = vec![];

    for component in RelativePath::new(raw).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => return Err(PathError::ParentTraversal),
            Component::Normal(segment) if segment.is_empty() => {}
            Component::Normal(segment) => {
                if segment.trim().is_empty() || !segment.chars().all(is_char_allowed) {
                    return Err(PathError::UnrepresentableStr);
                }
                out.push(segment.nfc().collect::<String>());
            }
        }
    }

    Ok(out)
}

impl ArchivePath {
    pub fn new<S: AsRef<str>>(raw: S) -> Result<ArchivePath, PathError> {
        let raw = raw.as_ref();
        if raw.trim().is_empty() {
            return Err(PathError::EmptyPath);
        }

        Ok(Self::from_segments(sanitize(raw)?))
    }

    /// The root of every archive, `/`.
    pub fn root() -> ArchivePath {
        ArchivePath(PATH_SEP.to_string())
    }

    fn from_segments(segments: Vec<String>) -> ArchivePath {
        let mut s = String::with_capacity(segments.iter().map(|x| x.len() + 1).sum::<usize>() + 1);
        if segments.is_empty() {
            s.push(PATH_SEP);
        }
        for segment in segments {
            s.push(PATH_SEP);
            s.push_str(&segment);
        }
        ArchivePath(s)
    }

    #[inline(always)]
    pub fn is_root(&self) -> bool {
        self.0.len() == 1
    }

    #[inline(always)]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Appends the segments of `child` to the segments of `self`.
    pub fn join(&self, child: &ArchivePath) -> ArchivePath {
        if self.is_root() {
            return child.clone();
        }
        if child.is_root() {
            return self.clone();
        }

        let mut s = String::with_capacity(self.0.len() + child.0.len());
        s.push_str(&self.0);
        s.push_str(&child.0);
        ArchivePath(s)
    }

    /// Parses `raw` as a path relative to `self` and joins it.
    pub fn try_join<S: AsRef<str>>(&self, raw: S) -> Result<ArchivePath, PathError> {
        Ok(self.join(&ArchivePath::new(raw)?))
    }

    /// Returns the path without its final segment. The root has no parent.
    pub fn parent(&self) -> Option<ArchivePath> {
        if self.is_root() {
            return None;
        }

        Some(match self.0.rfind(PATH_SEP) {
            Some(0) | None => ArchivePath::root(),
            Some(pos) => ArchivePath(self.0[..pos].to_string()),
        })
    }

    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.0.rsplit(PATH_SEP).next()
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(PATH_SEP).filter(|x| !x.is_empty())
    }

    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Whether `other` is a segment-wise prefix of `self`. Every path starts
    /// with the root and with itself.
    pub fn starts_with(&self, other: &ArchivePath) -> bool {
        if other.is_root() || self.0 == other.0 {
            return true;
        }

        self.0.starts_with(&other.0) && self.0.as_bytes().get(other.0.len()) == Some(&b'/')
    }

    /// Proper ancestors below the root, shallowest first.
    pub fn ancestors(&self) -> impl Iterator<Item = ArchivePath> + '_ {
        self.0
            .match_indices(PATH_SEP)
            .map(|(i, _)| i)
            .filter(|i| *i > 0)
            .map(move |i| ArchivePath(self.0[..i].to_string()))
    }
}

impl Default for ArchivePath {
    fn default() -> Self {
        ArchivePath::root()
    }
}

impl Ord for ArchivePath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.segments().cmp(other.segments())
    }
}

impl PartialOrd for ArchivePath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl AsRef<str> for ArchivePath {
    #[inline(always)]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ArchivePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ArchivePath::new(s)
    }
}

impl TryFrom<&str> for ArchivePath {
    type Error = PathError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        ArchivePath::new(value)
    }
}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case::leading_separator("/a/b/c", "/a/b/c")]
    #[case::relative("a/b/c", "/a/b/c")]
    #[case::redundant_separators("a//b/./c/", "/a/b/c")]
    #[case::current_dir_prefix("./self", "/self")]
    #[case::many_slashes("///🧊/🧊", "/🧊/🧊")]
    #[case::root("/", "/")]
    #[case::only_dots("./.", "/")]
    #[case::inner_spaces("/my docs/read me.txt", "/my docs/read me.txt")]
    fn sanitisation(#[case] raw: &str, #[case] expected: &str) {
        let path = ArchivePath::new(raw).unwrap();
        assert_eq!(path.as_str(), expected);
    }

    #[rstest]
    #[case::empty("", PathError::EmptyPath)]
    #[case::whitespace("   ", PathError::EmptyPath)]
    #[case::parent("a/../b", PathError::ParentTraversal)]
    #[case::leading_parent("../a", PathError::ParentTraversal)]
    #[case::null("\0", PathError::UnrepresentableStr)]
    #[case::whitespace_segment("a/ /b", PathError::UnrepresentableStr)]
    #[case::backslash(r"a\b", PathError::UnrepresentableStr)]
    fn rejected(#[case] raw: &str, #[case] expected: PathError) {
        assert_eq!(ArchivePath::new(raw).unwrap_err(), expected);
    }

    #[test]
    fn nfc_normalized_segments() {
        let decomposed = ArchivePath::new("/cafe\u{301}").unwrap();
        let composed = ArchivePath::new("/caf\u{e9}").unwrap();
        assert_eq!(decomposed, composed);
    }

    #[test]
    fn redundant_forms_are_equal_both_ways() {
        let messy = ArchivePath::new("a//b/./c/").unwrap();
        let clean = ArchivePath::new("/a/b/c").unwrap();
        assert_eq!(messy, clean);
        assert_eq!(ArchivePath::new(messy.to_string()).unwrap(), clean);
        assert_eq!(
            ArchivePath::root().try_join("a//b/./c/").unwrap(),
            ArchivePath::new("/a").unwrap().try_join("b/c").unwrap()
        );
    }

    #[test]
    fn parent_and_file_name() {
        let path = ArchivePath::new("/WEB-INF/classes/Foo.class").unwrap();
        assert_eq!(path.file_name(), Some("Foo.class"));
        assert_eq!(path.parent().unwrap().as_str(), "/WEB-INF/classes");
        assert_eq!(ArchivePath::new("/a").unwrap().parent(), Some(ArchivePath::root()));
        assert_eq!(ArchivePath::root().parent(), None);
        assert_eq!(ArchivePath::root().file_name(), None);
        assert_eq!(path.depth(), 3);
        assert_eq!(ArchivePath::root().depth(), 0);
    }

    #[test]
    fn ancestors_shallowest_first() {
        let path = ArchivePath::new("/a/b/c.txt").unwrap();
        let ancestors: Vec<String> = path.ancestors().map(|x| x.to_string()).collect();
        assert_eq!(ancestors, vec!["/a", "/a/b"]);
        assert_eq!(ArchivePath::new("/a").unwrap().ancestors().count(), 0);
        assert_eq!(ArchivePath::root().ancestors().count(), 0);
    }

    #[test]
    fn starts_with_is_segment_wise() {
        let path = ArchivePath::new("/app/web.xml").unwrap();
        assert!(path.starts_with(&ArchivePath::new("/app").unwrap()));
        assert!(path.starts_with(&ArchivePath::root()));
        assert!(path.starts_with(&path));
        assert!(!path.starts_with(&ArchivePath::new("/ap").unwrap()));
        assert!(!ArchivePath::new("/application").unwrap().starts_with(&ArchivePath::new("/app").unwrap()));
    }

    #[test]
    fn ordering_compares_segments() {
        let a = ArchivePath::new("/a/b").unwrap();
        let b = ArchivePath::new("/a-c").unwrap();
        // A plain string comparison would order these the other way round.
        assert!(a < b);
        assert!(ArchivePath::root() < a);
    }

    #[test]
    fn join_with_root() {
        let a = ArchivePath::new("/a").unwrap();
        assert_eq!(ArchivePath::root().join(&a), a);
        assert_eq!(a.join(&ArchivePath::root()), a);
        assert!(ArchivePath::root().join(&ArchivePath::root()).is_root());
    }

    fn segments() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("[a-zA-Z][a-zA-Z0-9_.-]{0,6}", 0..4)
    }

    proptest! {
        #[test]
        fn normalization_idempotent(raw in "(/{0,2}(\\.|[a-z]{1,4})){1,5}/?") {
            let path = ArchivePath::new(&raw);
            prop_assume!(path.is_ok());
            let path = path.unwrap();
            prop_assert_eq!(ArchivePath::new(path.to_string()).unwrap(), path);
        }

        #[test]
        fn join_associative(a in segments(), b in segments(), c in segments()) {
            let a = ArchivePath::from_segments(a);
            let b = ArchivePath::from_segments(b);
            let c = ArchivePath::from_segments(c);
            prop_assert_eq!(a.join(&b).join(&c), a.join(&b.join(&c)));
        }

        #[test]
        fn equality_matches_segments(a in segments(), b in segments()) {
            let left = ArchivePath::from_segments(a.clone());
            let right = ArchivePath::from_segments(b.clone());
            prop_assert_eq!(left == right, a == b);
        }
    }
}
