//! Once-initialised handle to an expensive library.
//!
//! Binding pdfium means locating (and possibly downloading) a 30 MB shared
//! library, so it must happen at most once per renderer. [`LazyLibrary`]
//! wraps a `tokio::sync::OnceCell`: the first `get()` runs the loader,
//! callers arriving while it runs wait on the same initialisation, and
//! everyone afterwards gets the cached `Arc`. A failed load leaves the cell
//! empty so the next caller tries again.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

type Loader<T, E> = Box<dyn Fn() -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// A lazily loaded, shared library handle.
pub struct LazyLibrary<T, E> {
    cell: OnceCell<Arc<T>>,
    loader: Loader<T, E>,
}

impl<T, E> LazyLibrary<T, E>
where
    T: Send + Sync + 'static,
    E: Send + 'static,
{
    pub fn new<F, Fut>(loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            cell: OnceCell::new(),
            loader: Box::new(move || loader().boxed()),
        }
    }

    /// The loaded library, loading it first if nobody has yet.
    pub async fn get(&self) -> Result<Arc<T>, E> {
        self.cell
            .get_or_try_init(|| async { (self.loader)().await.map(Arc::new) })
            .await
            .cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }
}

impl<T, E> fmt::Debug for LazyLibrary<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyLibrary")
            .field("loaded", &self.cell.initialized())
            .finish()
    }
}
