//! Request handler capability.
//!
//! Both listeners dispatch every request they accept to a [`Handler`]. The
//! trait is object-safe so one handler can be shared across protocols behind
//! an `Arc`, and it is blanket-implemented for async closures so callers
//! rarely need to implement it by hand.

use bytes::Bytes;
use futures::future::BoxFuture;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::{Request, Response};
use std::future::Future;
use std::sync::Arc;

/// A shared, clonable request handler.
pub type SharedHandler = Arc<dyn Handler>;

/// Capability invoked for every request received on a started server.
pub trait Handler: Send + Sync + 'static {
    /// Produce the response for one request.
    fn handle(&self, request: Request<Incoming>) -> BoxFuture<'static, Response<Full<Bytes>>>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Request<Incoming>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response<Full<Bytes>>> + Send + 'static,
{
    fn handle(&self, request: Request<Incoming>) -> BoxFuture<'static, Response<Full<Bytes>>> {
        Box::pin(self(request))
    }
}
