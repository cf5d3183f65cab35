//! Observable agency-data state for front ends.
//!
//! `AgencyData` is what a UI binds to: the current records, a loading flag,
//! the last error message, and cache diagnostics, plus `refresh`. State is
//! published through a `tokio::sync::watch` channel so consumers can either
//! poll `snapshot()` or await changes on a `subscribe()`d receiver.
//!
//! At most one fetch is in flight. Overlapping `refresh` calls share it
//! when it satisfies them; a forced refresh that arrives while a
//! cache-preferring one is running waits for it and then does its own
//! network round-trip.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::{BoxFuture, FutureExt, Shared};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::api::{ApiError, PartitionSource};
use crate::cache::{CacheInfo, CacheStorage, Clock, SystemClock};
use crate::fetch::AgencyFetcher;
use crate::models::AgencyRecord;

/// A failed load, as shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct DataError {
    message: String,
}

impl DataError {
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<ApiError> for DataError {
    fn from(e: ApiError) -> Self {
        Self {
            message: e.to_string(),
        }
    }
}

/// Everything a front end renders from.
#[derive(Debug, Clone, Default)]
pub struct DataSnapshot {
    pub data: Option<Arc<Vec<AgencyRecord>>>,
    pub loading: bool,
    pub error: Option<String>,
    pub cache_info: CacheInfo,
}

impl DataSnapshot {
    pub fn records(&self) -> &[AgencyRecord] {
        self.data.as_deref().map(Vec::as_slice).unwrap_or(&[])
    }
}

type LoadResult = Result<Arc<Vec<AgencyRecord>>, DataError>;
type RefreshFuture = Shared<BoxFuture<'static, LoadResult>>;

struct InFlight {
    id: u64,
    forced: bool,
    future: RefreshFuture,
}

enum Step {
    /// Await this load and return its result
    Join(RefreshFuture),
    /// Let this load finish, then look again
    Wait(RefreshFuture),
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

pub struct AgencyData<S, St, C = SystemClock> {
    fetcher: Arc<AgencyFetcher<S, St, C>>,
    state: Arc<watch::Sender<DataSnapshot>>,
    in_flight: Arc<Mutex<Option<InFlight>>>,
    next_id: AtomicU64,
}

impl<S, St, C> AgencyData<S, St, C>
where
    S: PartitionSource + 'static,
    St: CacheStorage + 'static,
    C: Clock + 'static,
{
    /// Wrap a fetcher without loading anything yet.
    pub fn new(fetcher: AgencyFetcher<S, St, C>) -> Self {
        let initial = DataSnapshot {
            cache_info: fetcher.cache_info(),
            ..Default::default()
        };
        let (state, _) = watch::channel(initial);

        Self {
            fetcher: Arc::new(fetcher),
            state: Arc::new(state),
            in_flight: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(0),
        }
    }

    /// Wrap a fetcher and start the initial cache-preferring load on the
    /// current tokio runtime. `loading` is already `true` on return.
    pub fn mount(fetcher: AgencyFetcher<S, St, C>) -> Self {
        let this = Self::new(fetcher);
        let initial = match this.next_step(false) {
            Step::Join(future) | Step::Wait(future) => future,
        };
        tokio::spawn(async move {
            let _ = initial.await;
        });
        this
    }

    pub fn fetcher(&self) -> &AgencyFetcher<S, St, C> {
        &self.fetcher
    }

    pub fn snapshot(&self) -> DataSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DataSnapshot> {
        self.state.subscribe()
    }

    pub fn data(&self) -> Option<Arc<Vec<AgencyRecord>>> {
        self.state.borrow().data.clone()
    }

    pub fn loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    /// Current cache diagnostics, read fresh from storage.
    pub fn cache_info(&self) -> CacheInfo {
        self.fetcher.cache_info()
    }

    /// Reload the data. With `force_refresh` the cache is cleared first so
    /// the partitions come from the network.
    ///
    /// On failure the previous records stay in place and `error` is set.
    pub async fn refresh(&self, force_refresh: bool) -> LoadResult {
        loop {
            match self.next_step(force_refresh) {
                Step::Join(future) => return future.await,
                Step::Wait(future) => {
                    debug!("Forced refresh waiting for in-flight load");
                    let _ = future.await;
                }
            }
        }
    }

    fn next_step(&self, force_refresh: bool) -> Step {
        let mut slot = lock(&self.in_flight);

        if let Some(current) = slot.as_ref() {
            let future = current.future.clone();
            return if current.forced || !force_refresh {
                Step::Join(future)
            } else {
                Step::Wait(future)
            };
        }

        Step::Join(self.start(force_refresh, &mut slot))
    }

    /// Begin a load and record it as the in-flight one. Caller holds the slot.
    fn start(&self, force_refresh: bool, slot: &mut Option<InFlight>) -> RefreshFuture {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let fetcher = Arc::clone(&self.fetcher);
        let state = Arc::clone(&self.state);
        let in_flight = Arc::clone(&self.in_flight);

        info!(force_refresh, "Loading agency data");
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        let future = async move {
            let result: LoadResult = match fetcher.load(force_refresh).await {
                Ok(records) => {
                    info!(count = records.len(), "Agency data loaded");
                    Ok(Arc::new(records))
                }
                Err(e) => {
                    error!(error = %e, "Failed to fetch agency data");
                    Err(e.into())
                }
            };
            let cache_info = fetcher.cache_info();

            // Publish and release the slot under one lock
            let mut slot = lock(&in_flight);
            state.send_modify(|s| {
                match &result {
                    Ok(records) => {
                        s.data = Some(Arc::clone(records));
                        s.error = None;
                    }
                    Err(e) => s.error = Some(e.message().to_string()),
                }
                s.cache_info = cache_info;
                s.loading = false;
            });
            if slot.as_ref().map(|f| f.id) == Some(id) {
                *slot = None;
            }
            drop(slot);

            result
        }
        .boxed()
        .shared();

        *slot = Some(InFlight {
            id,
            forced: force_refresh,
            future: future.clone(),
        });
        future
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::api::Partition;
    use crate::cache::{ManualClock, MemoryStorage, PartitionCache};
    use crate::test_support::{one_field_per_partition, sample_partitions, ScriptedSource};

    type TestData = AgencyData<Arc<ScriptedSource>, Arc<MemoryStorage>, Arc<ManualClock>>;

    struct Harness {
        source: Arc<ScriptedSource>,
        storage: Arc<MemoryStorage>,
        clock: Arc<ManualClock>,
    }

    impl Harness {
        fn new(source: ScriptedSource) -> Self {
            Self {
                source: Arc::new(source),
                storage: Arc::new(MemoryStorage::new()),
                clock: Arc::new(ManualClock::new(Utc::now())),
            }
        }

        fn cache(&self) -> PartitionCache<Arc<MemoryStorage>, Arc<ManualClock>> {
            PartitionCache::with_clock(Arc::clone(&self.storage), Arc::clone(&self.clock))
        }

        fn fetcher(&self) -> AgencyFetcher<Arc<ScriptedSource>, Arc<MemoryStorage>, Arc<ManualClock>> {
            AgencyFetcher::new(Arc::clone(&self.source), self.cache())
        }

        fn mount(&self) -> TestData {
            AgencyData::mount(self.fetcher())
        }

        fn unmounted(&self) -> TestData {
            AgencyData::new(self.fetcher())
        }
    }

    #[tokio::test]
    async fn test_fresh_load() {
        let h = Harness::new(ScriptedSource::new(&one_field_per_partition()));
        let data = h.mount();
        let rx = data.subscribe();

        assert!(rx.borrow().loading);
        assert!(rx.borrow().data.is_none());
        assert!(rx.borrow().error.is_none());

        let records = data.refresh(false).await.expect("load should succeed");
        let snapshot = data.snapshot();
        assert!(!snapshot.loading);
        assert!(snapshot.error.is_none());
        assert_eq!(snapshot.records().len(), 1);
        assert!(Arc::ptr_eq(&records, snapshot.data.as_ref().expect("data set")));

        let a = &snapshot.records()[0];
        assert_eq!(a.name, "A");
        assert_eq!(a.employee_count, Some(1));
        assert_eq!(a.department.as_deref(), Some("Dep 2"));
        assert_eq!(a.statute_references.as_deref(), Some("SFS 3"));
        assert_eq!(a.telephone.as_deref(), Some("4"));
        assert_eq!(a.budget, Some(5.0));
        assert_eq!(a.end_date.as_deref(), Some("2006"));

        // The refresh joined the initial load
        assert_eq!(h.source.calls(), 6);
        assert!(snapshot.cache_info.exists);
    }

    #[tokio::test]
    async fn test_cached_load_skips_network() {
        let raw = sample_partitions();
        let h = Harness::new(ScriptedSource::new(&raw));
        h.cache().set(&raw);
        h.clock.advance(Duration::hours(1));

        let data = h.mount();
        let records = data.refresh(false).await.expect("load should succeed");

        assert_eq!(records.len(), raw.stkt.len());
        assert_eq!(h.source.calls(), 0);
        assert_eq!(data.snapshot().cache_info.age_hours, Some(1.0));
    }

    #[tokio::test]
    async fn test_forced_refresh_bypasses_fresh_cache() {
        let raw = sample_partitions();
        let h = Harness::new(ScriptedSource::new(&raw));
        h.cache().set(&raw);
        h.clock.advance(Duration::minutes(1));

        let data = h.unmounted();
        data.refresh(true).await.expect("refresh should succeed");
        assert_eq!(h.source.calls(), 6);
        assert_eq!(data.snapshot().cache_info.age_hours, Some(0.0));
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_previous_data() {
        let h = Harness::new(ScriptedSource::new(&sample_partitions()));
        let data = h.mount();
        let before = data.refresh(false).await.expect("initial load");

        h.source.fail_all();
        let err = data.refresh(true).await.expect_err("refresh should fail");

        let snapshot = data.snapshot();
        assert!(!snapshot.loading);
        assert_eq!(snapshot.error.as_deref(), Some(err.message()));
        assert!(Arc::ptr_eq(
            snapshot.data.as_ref().expect("data kept"),
            &before
        ));

        h.source.recover();
        data.refresh(true).await.expect("retry should succeed");
        assert!(data.error().is_none());
    }

    #[tokio::test]
    async fn test_initial_failure_has_no_data() {
        let h = Harness::new(ScriptedSource::new(&sample_partitions()));
        h.source.fail(Partition::Wd);

        let data = h.mount();
        let err = data.refresh(false).await.expect_err("load should fail");

        assert_eq!(err.message(), "Failed to fetch wd.json: 500 Internal Server Error");
        assert!(data.data().is_none());
        assert!(!data.loading());
        assert!(h.storage.is_empty());
    }

    #[tokio::test]
    async fn test_overlapping_refreshes_share_one_fetch() {
        let (source, gate) = ScriptedSource::new(&sample_partitions()).gated();
        let h = Harness::new(source);
        let data = h.unmounted();

        let (a, b, _) = tokio::join!(data.refresh(false), data.refresh(false), async {
            gate.add_permits(1);
        });

        let a = a.expect("first refresh");
        let b = b.expect("second refresh");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(h.source.calls(), 6);
    }

    #[tokio::test]
    async fn test_forced_refresh_joins_forced_in_flight() {
        let (source, gate) = ScriptedSource::new(&sample_partitions()).gated();
        let h = Harness::new(source);
        let data = h.unmounted();

        let (a, b, _) = tokio::join!(data.refresh(true), data.refresh(false), async {
            gate.add_permits(1);
        });

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(h.source.calls(), 6);
    }

    #[tokio::test]
    async fn test_forced_refresh_waits_for_cached_in_flight() {
        let (source, gate) = ScriptedSource::new(&sample_partitions()).gated();
        let h = Harness::new(source);
        let data = h.unmounted();

        let (a, b, _) = tokio::join!(data.refresh(false), data.refresh(true), async {
            gate.add_permits(1);
        });

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(h.source.calls(), 12);
        assert!(!data.loading());
    }
}
