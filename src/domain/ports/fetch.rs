//! Fetch port: how the pagination engine loads one page
//!
//! The engine never talks to a data service directly. Whatever owns the
//! list injects a `PageFetcher`, usually a thin client over the remote
//! collection.

use std::future::Future;

use async_trait::async_trait;

use crate::shared::types::{FetchError, PageEnvelope};

// ── PageFetcher ────────────────────────────────────────────────

/// Port for loading a single page of `T`.
///
/// `A` carries extra arguments the owner wants forwarded on every call
/// (filters, search terms). Implementations must return `Err` on any
/// failure and should resolve with both envelope fields populated.
///
/// Closures of shape `Fn(u32, u32, A) -> impl Future<Output = Result<..>>`
/// implement this trait, which keeps tests and small call sites terse.
#[async_trait]
pub trait PageFetcher<T, A = ()>: Send + Sync {
    async fn fetch(&self, page: u32, page_size: u32, args: A)
        -> Result<PageEnvelope<T>, FetchError>;
}

#[async_trait]
impl<T, A, F, Fut> PageFetcher<T, A> for F
where
    F: Fn(u32, u32, A) -> Fut + Send + Sync,
    Fut: Future<Output = Result<PageEnvelope<T>, FetchError>> + Send + 'static,
    T: Send + 'static,
    A: Send + 'static,
{
    async fn fetch(
        &self,
        page: u32,
        page_size: u32,
        args: A,
    ) -> Result<PageEnvelope<T>, FetchError> {
        (self)(page, page_size, args).await
    }
}
