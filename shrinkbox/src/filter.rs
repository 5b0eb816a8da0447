//! Path predicates used to narrow merges and listings.

use std::collections::HashSet;

use regex::Regex;

use crate::{
    error::{Error, Result},
    path::ArchivePath,
};

/// Decides whether a node at `path` takes part in an operation.
pub trait Filter {
    fn include(&self, path: &ArchivePath) -> bool;
}

impl<F> Filter for F
where
    F: Fn(&ArchivePath) -> bool,
{
    #[inline(always)]
    fn include(&self, path: &ArchivePath) -> bool {
        self(path)
    }
}

pub trait FilterExt: Filter + Sized {
    fn and<F: Filter>(self, other: F) -> And<Self, F> {
        And(self, other)
    }

    fn or<F: Filter>(self, other: F) -> Or<Self, F> {
        Or(self, other)
    }

    fn not(self) -> Not<Self> {
        Not(self)
    }
}

impl<T: Filter> FilterExt for T {}

#[derive(Debug, Clone)]
pub struct And<A, B>(A, B);

impl<A: Filter, B: Filter> Filter for And<A, B> {
    fn include(&self, path: &ArchivePath) -> bool {
        self.0.include(path) && self.1.include(path)
    }
}

#[derive(Debug, Clone)]
pub struct Or<A, B>(A, B);

impl<A: Filter, B: Filter> Filter for Or<A, B> {
    fn include(&self, path: &ArchivePath) -> bool {
        self.0.include(path) || self.1.include(path)
    }
}

#[derive(Debug, Clone)]
pub struct Not<A>(A);

impl<A: Filter> Filter for Not<A> {
    fn include(&self, path: &ArchivePath) -> bool {
        !self.0.include(path)
    }
}

/// Ready-made filters.
pub mod filters {
    use super::*;

    #[derive(Debug, Clone, Copy, Default)]
    pub struct IncludeAll;

    impl Filter for IncludeAll {
        #[inline(always)]
        fn include(&self, _path: &ArchivePath) -> bool {
            true
        }
    }

    pub fn include_all() -> IncludeAll {
        IncludeAll
    }

    /// Matches the canonical path string against a regular expression.
    #[derive(Debug, Clone)]
    pub struct RegexFilter {
        regex: Regex,
        include: bool,
    }

    impl Filter for RegexFilter {
        fn include(&self, path: &ArchivePath) -> bool {
            self.regex.is_match(path.as_str()) == self.include
        }
    }

    fn compile(pattern: &str) -> Result<Regex> {
        Regex::new(pattern).map_err(|e| {
            tracing::debug!(pattern, error = %e, "rejected filter pattern");
            Error::InvalidArgument("filter pattern is not a valid regular expression")
        })
    }

    /// Keeps paths whose canonical form matches `pattern`.
    pub fn include_regex(pattern: &str) -> Result<RegexFilter> {
        Ok(RegexFilter {
            regex: compile(pattern)?,
            include: true,
        })
    }

    /// Drops paths whose canonical form matches `pattern`.
    pub fn exclude_regex(pattern: &str) -> Result<RegexFilter> {
        Ok(RegexFilter {
            regex: compile(pattern)?,
            include: false,
        })
    }

    #[derive(Debug, Clone)]
    pub struct PathSetFilter {
        paths: HashSet<ArchivePath>,
        include: bool,
    }

    impl Filter for PathSetFilter {
        fn include(&self, path: &ArchivePath) -> bool {
            self.paths.contains(path) == self.include
        }
    }

    pub fn include_paths<I: IntoIterator<Item = ArchivePath>>(paths: I) -> PathSetFilter {
        PathSetFilter {
            paths: paths.into_iter().collect(),
            include: true,
        }
    }

    pub fn exclude_paths<I: IntoIterator<Item = ArchivePath>>(paths: I) -> PathSetFilter {
        PathSetFilter {
            paths: paths.into_iter().collect(),
            include: false,
        }
    }

    /// Keeps `prefix` itself and everything below it.
    #[derive(Debug, Clone)]
    pub struct Under(ArchivePath);

    impl Filter for Under {
        fn include(&self, path: &ArchivePath) -> bool {
            path.starts_with(&self.0)
        }
    }

    pub fn under(prefix: ArchivePath) -> Under {
        Under(prefix)
    }
}
