use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathError {
    UnrepresentableStr,
    ParentTraversal,
    EmptyPath,
}

impl std::error::Error for PathError {}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl PathError {
    pub fn as_str(&self) -> &str {
        match self {
            PathError::UnrepresentableStr => "unrepresentable string found in path",
            PathError::ParentTraversal => "`..` segments are not allowed in archive paths",
            PathError::EmptyPath => "no path provided",
        }
    }
}
