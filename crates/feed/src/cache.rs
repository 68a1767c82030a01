//! The feed cache: one materialized [`FeedDocument`], rebuilt on demand.
//!
//! Invalidation is pull-based. Every request fingerprints the library; the
//! cached document is served while it is younger than the TTL and the
//! fingerprint is unchanged. Otherwise the caller triggers a rebuild, or
//! joins the one already running, so at most one rebuild is ever in flight.

use crate::error::{ErrorKind, Result};
use crate::models::FeedDocument;
use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use podshelf_library::LibrarySignature;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::instrument;

/// What the cache materializes.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Cheap fingerprint of the inputs; a change forces a rebuild.
    async fn signature(&self) -> LibrarySignature;

    /// Builds a complete document from scratch.
    ///
    /// The returned signature must describe the inputs this build actually
    /// read, not a separate look at the library.
    async fn build(&self) -> Result<Built>;
}

/// A finished build and the fingerprint of what it was built from.
#[derive(Debug)]
pub struct Built {
    pub document: FeedDocument,
    pub signature: LibrarySignature,
}

/// The single cached build.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub document: Arc<FeedDocument>,
    pub built_at: Instant,
    pub signature: LibrarySignature,
}

type Outcome = std::result::Result<Arc<FeedDocument>, ErrorKind>;
type Rebuild = Shared<BoxFuture<'static, Outcome>>;

#[derive(Default)]
struct State {
    entry: Option<CacheEntry>,
    rebuild: Option<Rebuild>,
}

struct Inner<S> {
    source: S,
    ttl: Duration,
    state: Mutex<State>,
}
impl<S> Inner<S> {
    // State is only ever replaced wholesale, so a poisoned lock still guards
    // a consistent value.
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Single-flight cache around a [`FeedSource`].
///
/// Cheap to clone; clones share the cached entry.
pub struct FeedCache<S> {
    inner: Arc<Inner<S>>,
}
impl<S> Clone for FeedCache<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
impl<S: FeedSource + 'static> FeedCache<S> {
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                ttl,
                state: Mutex::default(),
            }),
        }
    }

    pub fn source(&self) -> &S {
        &self.inner.source
    }

    /// The current entry, without checking freshness.
    pub fn entry(&self) -> Option<CacheEntry> {
        self.inner.lock().entry.clone()
    }

    /// Returns the cached document while it is fresh, rebuilding otherwise.
    ///
    /// Within the TTL and with an unchanged signature, repeated calls return
    /// the very same [`Arc`].
    ///
    /// # Errors
    ///
    /// Returns the rebuild's error. A failed rebuild leaves any previous
    /// entry in place.
    #[instrument(skip_all)]
    pub async fn get(&self) -> Result<Arc<FeedDocument>> {
        let signature = self.inner.source.signature().await;
        let rebuild = {
            let mut state = self.inner.lock();
            if let Some(entry) = &state.entry {
                if entry.built_at.elapsed() < self.inner.ttl && entry.signature == signature {
                    tracing::debug!("Serving cached feed");
                    return Ok(Arc::clone(&entry.document));
                }
                tracing::debug!(library_changed = entry.signature != signature, "Cached feed expired");
            }
            self.rebuild(&mut state)
        };
        rebuild.await.map_err(exn::Exn::from)
    }

    /// Rebuilds regardless of TTL and signature.
    ///
    /// If a rebuild is already running, waits for that one instead of
    /// starting a second.
    #[instrument(skip_all)]
    pub async fn refresh(&self) -> Result<Arc<FeedDocument>> {
        let rebuild = self.rebuild(&mut self.inner.lock());
        rebuild.await.map_err(exn::Exn::from)
    }

    /// Joins the in-flight rebuild, or starts one.
    ///
    /// The rebuild is spawned, so it runs to completion even if every caller
    /// waiting on it goes away.
    fn rebuild(&self, state: &mut State) -> Rebuild {
        if let Some(rebuild) = &state.rebuild {
            tracing::debug!("Joining in-flight feed rebuild");
            return rebuild.clone();
        }
        let task = tokio::spawn(Self::run(Arc::clone(&self.inner)));
        let inner = Arc::clone(&self.inner);
        let rebuild = async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    // The task never reached the point where it clears itself.
                    tracing::error!(error = %err, "Feed rebuild task aborted");
                    inner.lock().rebuild = None;
                    Err(ErrorKind::Build)
                },
            }
        }
        .boxed()
        .shared();
        state.rebuild = Some(rebuild.clone());
        rebuild
    }

    async fn run(inner: Arc<Inner<S>>) -> Outcome {
        let started = Instant::now();
        let built = inner.source.build().await;

        let mut state = inner.lock();
        state.rebuild = None;
        match built {
            Ok(Built { document, signature }) => {
                let document = Arc::new(document);
                tracing::info!(
                    items = document.items.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Feed rebuilt"
                );
                state.entry = Some(CacheEntry {
                    document: Arc::clone(&document),
                    built_at: Instant::now(),
                    signature,
                });
                Ok(document)
            },
            Err(err) => {
                tracing::warn!(error = ?err, kept_previous = state.entry.is_some(), "Feed rebuild failed");
                Err((*err).clone())
            },
        }
    }
}
