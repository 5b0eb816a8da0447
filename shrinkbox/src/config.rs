use std::{fmt, sync::Arc};

use crate::{format::Compression, view::ViewLoader};

/// What happens when a write would turn a leaf into a directory or back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// The later write wins and a warning is logged.
    #[default]
    Overwrite,
    /// The write fails with `Error::PathConflict` and nothing is changed.
    Reject,
}

/// Settings shared by an archive and the views built over it.
#[derive(Clone)]
pub struct Configuration {
    views: Arc<ViewLoader>,
    conflict_policy: ConflictPolicy,
    compression: Compression,
}

impl Configuration {
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::default()
    }

    #[inline(always)]
    pub fn views(&self) -> &ViewLoader {
        &self.views
    }

    #[inline(always)]
    pub fn conflict_policy(&self) -> ConflictPolicy {
        self.conflict_policy
    }

    /// Compression applied to file content by the export view.
    #[inline(always)]
    pub fn compression(&self) -> Compression {
        self.compression
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration::builder().build()
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("views", &*self.views)
            .field("conflict_policy", &self.conflict_policy)
            .field("compression", &self.compression)
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct ConfigurationBuilder {
    views: Option<Arc<ViewLoader>>,
    conflict_policy: ConflictPolicy,
    compression: Compression,
}

impl ConfigurationBuilder {
    /// Uses `views` instead of the process-wide default registry.
    pub fn views(mut self, views: ViewLoader) -> Self {
        self.views = Some(Arc::new(views));
        self
    }

    pub fn shared_views(mut self, views: Arc<ViewLoader>) -> Self {
        self.views = Some(views);
        self
    }

    pub fn conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn build(self) -> Configuration {
        Configuration {
            views: self.views.unwrap_or_else(crate::view::default_loader),
            conflict_policy: self.conflict_policy,
            compression: self.compression,
        }
    }
}
