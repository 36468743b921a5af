//! Handler trait, type erasure, and state injection.
//!
//! The router holds handlers of different concrete types in one table, so
//! each handler is erased behind `Arc<dyn ErasedHandler>`:
//!
//! ```text
//! async fn list(store, req) -> Result<Response, ApiError>   ← user writes this
//!        ↓ with_state(store, list)
//! move |req| list(Arc::clone(&store), req)                  ← plain Fn(Request)
//!        ↓ router.on(Method::Get, "/recipes", …)
//! Arc::new(FnHandler(closure))                              ← BoxedHandler
//!        ↓ handler.call(req) at request time
//! Box::pin(async { fut.await.into_response() })             ← BoxFuture
//! ```
//!
//! Per request that is one `Arc` clone for the state and one virtual call.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future that resolves to a [`Response`].
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// Satisfied automatically by any `Fn(Request) -> impl Future<Output = impl
/// IntoResponse>`, which covers `async fn name(req: Request)` items and the
/// closures returned by [`with_state`]. Sealed: only the blanket impl below
/// can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

/// Newtype bridging a concrete handler `F` to [`ErasedHandler`].
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

// ── State injection ───────────────────────────────────────────────────────────

/// Binds shared state to a handler that takes it as its first argument.
///
/// The composition root owns the state; each request gets its own `Arc`
/// clone, so handlers never reach for globals.
///
/// ```rust
/// use std::sync::Arc;
/// use recipes::{Method, Request, Router, Status, with_state};
///
/// struct Counter(std::sync::atomic::AtomicU64);
///
/// async fn bump(c: Arc<Counter>, _req: Request) -> Status {
///     c.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
///     Status::NoContent
/// }
///
/// let counter = Arc::new(Counter(Default::default()));
/// let app = Router::new().on(Method::Post, "/bump", with_state(&counter, bump));
/// ```
pub fn with_state<S, F, Fut, R>(state: &Arc<S>, f: F) -> impl Handler
where
    S: Send + Sync + 'static,
    F: Fn(Arc<S>, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    let state = Arc::clone(state);
    move |req: Request| f(Arc::clone(&state), req)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::test_request;
    use crate::status::Status;

    async fn created(_req: Request) -> Status {
        Status::Created
    }

    #[tokio::test]
    async fn plain_async_fn_is_a_handler() {
        let h = created.into_boxed_handler();
        let resp = h.call(test_request("", &[])).await;
        assert_eq!(resp.status_code(), 201);
    }

    #[tokio::test]
    async fn with_state_passes_shared_state() {
        async fn echo(prefix: Arc<String>, req: Request) -> String {
            format!("{prefix}{}", req.param("id").unwrap_or_default())
        }

        let prefix = Arc::new("recipe-".to_owned());
        let h = with_state(&prefix, echo).into_boxed_handler();
        let resp = h.call(test_request("", &[("id", "9")])).await;
        assert_eq!(resp.body(), b"recipe-9");
        assert_eq!(Arc::strong_count(&prefix), 2);
    }
}
