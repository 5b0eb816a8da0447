//! Capability views: typed adapters constructed over an `Archive` on request.
//!
//! A capability is a marker type naming the view it produces. Factories are
//! registered per capability on a [`ViewLoader`], and `Archive::as_view`
//! looks them up through the archive's configuration:
//!
//! ```
//! use shrinkbox::{Archive, view::export::Export};
//!
//! let mut archive = Archive::new("app.war")?;
//! archive.add_at("<web-app/>", "/WEB-INF/web.xml")?;
//!
//! let bytes = archive.as_view::<Export>()?.export()?;
//! assert!(!bytes.is_empty());
//! # Ok::<(), shrinkbox::Error>(())
//! ```
//!
//! Views borrow the archive, so they always observe its current content and
//! never copy the tree.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use lazy_static::lazy_static;

use crate::{
    error::{BoxError, Error, Result},
    Archive,
};

pub mod export;
pub mod resources;

/// Marker for one kind of view.
pub trait Capability: 'static {
    /// Name reported in errors and by `ViewLoader::capabilities`.
    const NAME: &'static str;

    type View<'a>;
}

/// Builds the view for capability `C` over a borrowed archive.
pub trait ViewFactory<C: Capability>: Send + Sync + 'static {
    fn construct<'a>(&self, archive: &'a Archive) -> std::result::Result<C::View<'a>, BoxError>;
}

impl<C, F> ViewFactory<C> for F
where
    C: Capability,
    F: for<'a> Fn(&'a Archive) -> std::result::Result<C::View<'a>, BoxError>
        + Send
        + Sync
        + 'static,
{
    fn construct<'a>(&self, archive: &'a Archive) -> std::result::Result<C::View<'a>, BoxError> {
        self(archive)
    }
}

// Factories for different capabilities have different types, so they are
// stored type-erased and keyed by the capability's TypeId. The box inside is
// always a `Box<dyn ViewFactory<C>>` for the `C` of its key.
struct Registration {
    name: &'static str,
    factory: Box<dyn Any + Send + Sync>,
}

/// Registry mapping capability types to view factories.
#[derive(Default)]
pub struct ViewLoader {
    factories: HashMap<TypeId, Registration>,
}

impl ViewLoader {
    /// An empty registry.
    pub fn new() -> ViewLoader {
        ViewLoader::default()
    }

    /// A registry with the views shipped by this crate: [`export::Export`] and
    /// [`resources::Resources`].
    pub fn with_builtin() -> ViewLoader {
        let mut loader = ViewLoader::new();
        loader
            .register::<export::Export, _>(export::ExportFactory)
            .register::<resources::Resources, _>(resources::ResourcesFactory);
        loader
    }

    /// Registers `factory` for `C`, replacing any earlier registration.
    pub fn register<C, F>(&mut self, factory: F) -> &mut Self
    where
        C: Capability,
        F: ViewFactory<C>,
    {
        let factory: Box<dyn ViewFactory<C>> = Box::new(factory);
        let previous = self.factories.insert(
            TypeId::of::<C>(),
            Registration {
                name: C::NAME,
                factory: Box::new(factory),
            },
        );

        tracing::debug!(
            capability = C::NAME,
            replaced = previous.is_some(),
            "registered view factory"
        );

        self
    }

    pub fn is_registered<C: Capability>(&self) -> bool {
        self.factories.contains_key(&TypeId::of::<C>())
    }

    /// Names of all registered capabilities, sorted.
    pub fn capabilities(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.values().map(|r| r.name).collect();
        names.sort_unstable();
        names
    }

    /// Constructs the `C` view over `archive`.
    pub fn load<'a, C: Capability>(&self, archive: &'a Archive) -> Result<C::View<'a>> {
        let factory = self
            .factories
            .get(&TypeId::of::<C>())
            .and_then(|r| r.factory.downcast_ref::<Box<dyn ViewFactory<C>>>())
            .ok_or(Error::UnsupportedCapability {
                capability: C::NAME,
            })?;

        tracing::debug!(capability = C::NAME, archive = archive.name(), "constructing view");

        factory
            .construct(archive)
            .map_err(|source| Error::AdapterConstructionFailed {
                capability: C::NAME,
                source,
            })
    }
}

impl fmt::Debug for ViewLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewLoader")
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

lazy_static! {
    static ref DEFAULT_VIEWS: Arc<ViewLoader> = Arc::new(ViewLoader::with_builtin());
}

/// The process-wide registry used by `Configuration::default()`.
pub(crate) fn default_loader() -> Arc<ViewLoader> {
    Arc::clone(&DEFAULT_VIEWS)
}
