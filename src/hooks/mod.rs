// src/hooks/mod.rs

//! Named extension points that plugins tap into.
//!
//! Two disciplines are provided:
//!
//! - [`SeriesHook`]: taps run one after another in registration order and
//!   receive `&mut T`, so later taps observe earlier mutations.
//! - [`ParallelHook`]: taps receive a shared `Arc<T>` and run concurrently on
//!   the tokio runtime. Used for observers only.
//!
//! In both cases the first failing tap rejects the whole call. Taps return
//! `anyhow::Result<()>`; the invoking phase decides what a failure means.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, trace};

/// Boxed, sendable future returned by async taps.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What every tap returns.
pub type TapResult = anyhow::Result<()>;

type SeriesFn<T> = dyn for<'a> Fn(&'a mut T) -> BoxFuture<'a, TapResult> + Send + Sync;
type ParallelFn<T> = dyn Fn(Arc<T>) -> BoxFuture<'static, TapResult> + Send + Sync;

/// A tap failed while a hook was being called.
#[derive(Debug, Error)]
#[error("{hook} hook: tap '{tap}' failed: {cause:#}")]
pub struct HookError {
    pub hook: &'static str,
    pub tap: String,
    pub cause: anyhow::Error,
}

struct Tap<F: ?Sized> {
    name: String,
    callback: Arc<F>,
}

impl<F: ?Sized> Clone for Tap<F> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            callback: Arc::clone(&self.callback),
        }
    }
}

/// Taps run in registration order; each one completes before the next starts.
pub struct SeriesHook<T> {
    name: &'static str,
    taps: RwLock<Vec<Tap<SeriesFn<T>>>>,
}

impl<T> fmt::Debug for SeriesHook<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeriesHook")
            .field("name", &self.name)
            .field("taps", &self.tap_names())
            .finish()
    }
}

impl<T> SeriesHook<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            taps: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.taps.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of registered taps, in call order.
    pub fn tap_names(&self) -> Vec<String> {
        self.taps
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|t| t.name.clone())
            .collect()
    }

    fn snapshot(&self) -> Vec<Tap<SeriesFn<T>>> {
        self.taps
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<T: Send + 'static> SeriesHook<T> {
    /// Register an async tap.
    ///
    /// ```ignore
    /// hook.tap("MyPlugin", |asset: &mut Asset| {
    ///     Box::pin(async move {
    ///         asset.content.extend_from_slice(b"\n");
    ///         Ok(())
    ///     })
    /// });
    /// ```
    pub fn tap<F>(&self, name: impl Into<String>, callback: F)
    where
        F: for<'a> Fn(&'a mut T) -> BoxFuture<'a, TapResult> + Send + Sync + 'static,
    {
        let tap = Tap {
            name: name.into(),
            callback: Arc::new(callback) as Arc<SeriesFn<T>>,
        };
        trace!(hook = self.name, tap = %tap.name, "registered tap");
        self.taps
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tap);
    }

    /// Register a tap that does not need to suspend.
    pub fn tap_sync<F>(&self, name: impl Into<String>, callback: F)
    where
        F: Fn(&mut T) -> TapResult + Send + Sync + 'static,
    {
        self.tap(name, move |payload: &mut T| {
            let result = callback(payload);
            Box::pin(async move { result })
        });
    }

    /// Run every tap in order against `payload`.
    ///
    /// Stops at the first failing tap; later taps are not run.
    pub async fn call(&self, payload: &mut T) -> Result<(), HookError> {
        for tap in self.snapshot() {
            debug!(hook = self.name, tap = %tap.name, "calling tap");
            if let Err(cause) = (tap.callback)(payload).await {
                return Err(HookError {
                    hook: self.name,
                    tap: tap.name,
                    cause,
                });
            }
        }
        Ok(())
    }
}

/// Taps all start together and the call resolves once every tap finished,
/// or as soon as one fails.
pub struct ParallelHook<T> {
    name: &'static str,
    taps: RwLock<Vec<Tap<ParallelFn<T>>>>,
}

impl<T> fmt::Debug for ParallelHook<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .taps
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|t| t.name.clone())
            .collect();
        f.debug_struct("ParallelHook")
            .field("name", &self.name)
            .field("taps", &names)
            .finish()
    }
}

impl<T: Send + Sync + 'static> ParallelHook<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            taps: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.taps.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tap<F>(&self, name: impl Into<String>, callback: F)
    where
        F: Fn(Arc<T>) -> BoxFuture<'static, TapResult> + Send + Sync + 'static,
    {
        let tap = Tap {
            name: name.into(),
            callback: Arc::new(callback) as Arc<ParallelFn<T>>,
        };
        trace!(hook = self.name, tap = %tap.name, "registered tap");
        self.taps
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tap);
    }

    pub fn tap_sync<F>(&self, name: impl Into<String>, callback: F)
    where
        F: Fn(&T) -> TapResult + Send + Sync + 'static,
    {
        self.tap(name, move |payload: Arc<T>| {
            let result = callback(&payload);
            Box::pin(async move { result })
        });
    }

    /// Start every tap concurrently and wait for all of them.
    ///
    /// Remaining taps are aborted once one fails.
    pub async fn call(&self, payload: Arc<T>) -> Result<(), HookError> {
        let taps = self
            .taps
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mut set = JoinSet::new();
        for tap in taps {
            debug!(hook = self.name, tap = %tap.name, "starting tap");
            let fut = (tap.callback)(Arc::clone(&payload));
            let name = tap.name;
            set.spawn(async move { (name, fut.await) });
        }

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((_, Ok(()))) => {}
                Ok((tap, Err(cause))) => {
                    set.abort_all();
                    return Err(HookError {
                        hook: self.name,
                        tap,
                        cause,
                    });
                }
                Err(join_err) => {
                    set.abort_all();
                    return Err(HookError {
                        hook: self.name,
                        tap: "<unknown>".to_string(),
                        cause: anyhow::anyhow!("tap task did not complete: {join_err}"),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::anyhow;

    use super::*;

    #[tokio::test]
    async fn series_taps_run_in_registration_order_and_see_mutations() {
        let hook: SeriesHook<Vec<&'static str>> = SeriesHook::new("test");
        hook.tap_sync("first", |log| {
            log.push("first");
            Ok(())
        });
        hook.tap("second", |log: &mut Vec<&'static str>| {
            Box::pin(async move {
                tokio::task::yield_now().await;
                assert_eq!(log.as_slice(), ["first"]);
                log.push("second");
                Ok(())
            })
        });
        hook.tap_sync("third", |log| {
            log.push("third");
            Ok(())
        });

        let mut log = Vec::new();
        hook.call(&mut log).await.unwrap();
        assert_eq!(log, ["first", "second", "third"]);
    }

    #[tokio::test]
    async fn series_error_aborts_remaining_taps() {
        let hook: SeriesHook<u32> = SeriesHook::new("counter");
        hook.tap_sync("inc", |n| {
            *n += 1;
            Ok(())
        });
        hook.tap_sync("boom", |_| Err(anyhow!("boom")));
        hook.tap_sync("never", |n| {
            *n += 100;
            Ok(())
        });

        let mut n = 0;
        let err = hook.call(&mut n).await.unwrap_err();
        assert_eq!(n, 1);
        assert_eq!(err.hook, "counter");
        assert_eq!(err.tap, "boom");
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn series_hook_without_taps_is_a_no_op() {
        let hook: SeriesHook<()> = SeriesHook::new("empty");
        assert!(hook.is_empty());
        hook.call(&mut ()).await.unwrap();
    }

    #[tokio::test]
    async fn parallel_taps_all_run() {
        let hook: ParallelHook<String> = ParallelHook::new("done");
        let count = Arc::new(AtomicUsize::new(0));
        for i in 0..4 {
            let count = Arc::clone(&count);
            hook.tap(format!("observer-{i}"), move |payload: Arc<String>| {
                let count = Arc::clone(&count);
                Box::pin(async move {
                    assert_eq!(payload.as_str(), "stats");
                    count.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
            });
        }

        hook.call(Arc::new("stats".to_string())).await.unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn parallel_hook_rejects_on_first_failure() {
        let hook: ParallelHook<()> = ParallelHook::new("done");
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = Arc::clone(&seen);
            hook.tap_sync("ok", move |_| {
                seen.lock().unwrap().push("ok");
                Ok(())
            });
        }
        hook.tap_sync("fails", |_| Err(anyhow!("observer failed")));

        let err = hook.call(Arc::new(())).await.unwrap_err();
        assert_eq!(err.tap, "fails");
        assert_eq!(err.hook, "done");
    }
}
