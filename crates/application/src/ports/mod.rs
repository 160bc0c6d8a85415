//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the application core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod clock;
mod editor;
mod storage;
mod token;
mod transport;

use std::future::Future;
use std::pin::Pin;

pub use clock::Clock;
pub use editor::{QueryEditor, ResultsRenderer, TabSurface, TabSurfaceFactory};
pub use storage::{KeyValueStorage, StorageError};
pub use token::TokenRefresher;
pub use transport::{
    CancellationReceiver, CancellationToken, SparqlTransport, TransportError, TransportResponse,
};

/// A boxed future, so that ports stay usable as trait objects.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
