//! The worker: lifecycle state plus install and fetch handling.

use std::sync::{Arc, Mutex};

use precache_cache::{CacheBackend, CacheStorage, MatchOptions};
use precache_core::{
    CacheProfile, LifecycleError, LifecycleObserver, LifecycleSignal, Request, Transition,
    WorkerState,
};
use precache_network::Network;

use crate::error::WorkerError;
use crate::install::{precache, InstallReport};
use crate::intercept::{FetchInterceptor, FetchOutcome};

/// An offline asset cache bound to one cache profile.
///
/// Install pre-caches the profile's assets; once active, every fetch is
/// answered cache-first. Before activation fetches go straight to the
/// network.
pub struct ServiceWorker<B: CacheBackend, N: Network> {
    profile: CacheProfile,
    storage: CacheStorage<B>,
    network: Arc<N>,
    interceptor: FetchInterceptor<B, N>,
    state: Mutex<WorkerState>,
    observers: Vec<Arc<dyn LifecycleObserver>>,
}

impl<B: CacheBackend, N: Network> ServiceWorker<B, N> {
    /// Create an uninstalled worker.
    pub fn new(profile: CacheProfile, storage: CacheStorage<B>, network: N) -> Self {
        Self::with_shared_network(profile, storage, Arc::new(network))
    }

    /// Create an uninstalled worker over a shared network.
    pub fn with_shared_network(
        profile: CacheProfile,
        storage: CacheStorage<B>,
        network: Arc<N>,
    ) -> Self {
        let interceptor = FetchInterceptor::new(storage.clone(), Arc::clone(&network));
        Self {
            profile,
            storage,
            network,
            interceptor,
            state: Mutex::new(WorkerState::Uninstalled),
            observers: Vec::new(),
        }
    }

    /// Register a lifecycle observer.
    pub fn with_observer(mut self, observer: Arc<dyn LifecycleObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Override how fetches are matched against the caches.
    pub fn with_match_options(mut self, options: MatchOptions) -> Self {
        self.interceptor = self.interceptor.with_match_options(options);
        self
    }

    pub fn profile(&self) -> &CacheProfile {
        &self.profile
    }

    pub fn storage(&self) -> &CacheStorage<B> {
        &self.storage
    }

    pub fn network(&self) -> &Arc<N> {
        &self.network
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WorkerState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn apply(&self, signal: LifecycleSignal) -> Result<WorkerState, LifecycleError> {
        let transition = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            let from = *state;
            let to = from.transition(signal)?;
            *state = to;
            Transition { from, signal, to }
        };

        for observer in &self.observers {
            observer.on_transition(&transition);
        }
        Ok(transition.to)
    }

    /// Pre-cache every asset of the profile.
    ///
    /// On success the worker is `Installed`. Any failure leaves it
    /// `Redundant`; a new worker is needed to retry.
    pub async fn install(&self) -> Result<InstallReport, WorkerError> {
        self.apply(LifecycleSignal::Install)?;

        match precache(&self.storage, self.network.as_ref(), &self.profile).await {
            Ok(report) => {
                self.apply(LifecycleSignal::InstallSucceeded)?;
                tracing::info!(
                    cache = %report.cache_name,
                    assets = report.assets.len(),
                    bytes = report.bytes,
                    "install complete"
                );
                Ok(report)
            }
            Err(err) => {
                tracing::warn!(cache = %self.profile.cache_name, error = %err, "install failed");
                self.apply(LifecycleSignal::InstallFailed)?;
                Err(err)
            }
        }
    }

    /// Take control of fetches. Old caches are left untouched.
    pub async fn activate(&self) -> Result<(), WorkerError> {
        self.apply(LifecycleSignal::Activate)?;
        self.apply(LifecycleSignal::ActivationComplete)?;
        Ok(())
    }

    /// Install, then activate.
    pub async fn start(&self) -> Result<InstallReport, WorkerError> {
        let report = self.install().await?;
        self.activate().await?;
        Ok(report)
    }

    /// Produce exactly one response for the request.
    pub async fn handle_fetch(&self, request: &Request) -> Result<FetchOutcome, WorkerError> {
        if self.state().is_controlling() {
            self.interceptor.respond(request).await
        } else {
            self.interceptor.passthrough(request).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intercept::CacheStatus;
    use precache_cache::{DiskBackend, MemoryBackend};
    use precache_core::Response;
    use precache_network::{NetworkError, StubNetwork};

    const ORIGIN: &str = "http://localhost:5000";

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Transition>>);

    impl LifecycleObserver for Recorder {
        fn on_transition(&self, transition: &Transition) {
            self.0.lock().unwrap().push(*transition);
        }
    }

    fn profile() -> CacheProfile {
        CacheProfile::new("sushi-pwa-v1")
            .with_origin(ORIGIN)
            .with_assets(["/", "/manifest.json"])
    }

    fn network() -> StubNetwork {
        StubNetwork::new()
            .with_response("http://localhost:5000/", Response::ok("<html>home</html>"))
            .with_response(
                "http://localhost:5000/manifest.json",
                Response::ok(r#"{"name":"Sushi"}"#).with_header("Content-Type", "application/json"),
            )
            .with_response("http://localhost:5000/other.png", Response::ok(vec![7u8; 16]))
    }

    fn get(path: &str) -> Request {
        Request::parse_get(&format!("{ORIGIN}{path}")).unwrap()
    }

    #[tokio::test]
    async fn test_scenario_install_then_serve() {
        let worker = ServiceWorker::new(profile(), CacheStorage::new(MemoryBackend::new()), network());

        let report = worker.start().await.unwrap();
        assert_eq!(report.assets.len(), 2);
        assert_eq!(worker.state(), WorkerState::Active);
        let calls_after_install = worker.network().call_count();
        assert_eq!(calls_after_install, 2);

        let home = worker.handle_fetch(&get("/")).await.unwrap();
        assert_eq!(home.status, CacheStatus::Hit);
        assert_eq!(home.response.text(), "<html>home</html>");
        assert_eq!(worker.network().call_count(), calls_after_install);

        let other = worker.handle_fetch(&get("/other.png")).await.unwrap();
        assert_eq!(other.status, CacheStatus::Miss);
        assert_eq!(other.response.bytes(), &[7u8; 16]);
        assert_eq!(worker.network().call_count(), calls_after_install + 1);

        // The miss is not stored; a second request goes to the network again.
        worker.handle_fetch(&get("/other.png")).await.unwrap();
        assert_eq!(worker.network().calls_to("http://localhost:5000/other.png"), 2);
    }

    #[tokio::test]
    async fn test_every_asset_stored_after_install() {
        let worker = ServiceWorker::new(profile(), CacheStorage::new(MemoryBackend::new()), network());
        worker.install().await.unwrap();

        let cache = worker.storage().open("sushi-pwa-v1").await.unwrap();
        for url in profile().resolve_assets().unwrap() {
            let hit = cache
                .match_request(&Request::get(url.clone()), MatchOptions::default())
                .await
                .unwrap();
            assert!(hit.is_some(), "{} not cached", url);
        }
    }

    #[tokio::test]
    async fn test_failed_install_is_redundant() {
        let network = StubNetwork::new()
            .with_response("http://localhost:5000/", Response::ok("home"))
            .with_error(
                "http://localhost:5000/manifest.json",
                NetworkError::Timeout("30s".into()),
            );
        let worker = ServiceWorker::new(profile(), CacheStorage::new(MemoryBackend::new()), network);

        let err = worker.install().await.unwrap_err();
        assert!(matches!(err, WorkerError::AssetFetch { .. }));
        assert_eq!(worker.state(), WorkerState::Redundant);

        // Cannot activate or reinstall a redundant worker.
        assert!(matches!(
            worker.activate().await,
            Err(WorkerError::Lifecycle(_))
        ));
        assert!(matches!(
            worker.install().await,
            Err(WorkerError::Lifecycle(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_before_activation_bypasses_cache() {
        let worker = ServiceWorker::new(profile(), CacheStorage::new(MemoryBackend::new()), network());
        worker.install().await.unwrap();
        assert_eq!(worker.state(), WorkerState::Installed);

        let outcome = worker.handle_fetch(&get("/")).await.unwrap();
        assert_eq!(outcome.status, CacheStatus::Bypass);
        assert_eq!(worker.network().calls_to("http://localhost:5000/"), 2);

        worker.activate().await.unwrap();
        let outcome = worker.handle_fetch(&get("/")).await.unwrap();
        assert_eq!(outcome.status, CacheStatus::Hit);
    }

    #[tokio::test]
    async fn test_activate_requires_install() {
        let worker = ServiceWorker::new(profile(), CacheStorage::new(MemoryBackend::new()), network());
        assert!(worker.activate().await.is_err());
        assert_eq!(worker.state(), WorkerState::Uninstalled);
    }

    #[tokio::test]
    async fn test_observers_see_every_transition() {
        let recorder = Arc::new(Recorder::default());
        let worker = ServiceWorker::new(profile(), CacheStorage::new(MemoryBackend::new()), network())
            .with_observer(recorder.clone());

        worker.start().await.unwrap();

        let seen: Vec<(WorkerState, WorkerState)> = recorder
            .0
            .lock()
            .unwrap()
            .iter()
            .map(|t| (t.from, t.to))
            .collect();
        assert_eq!(
            seen,
            vec![
                (WorkerState::Uninstalled, WorkerState::Installing),
                (WorkerState::Installing, WorkerState::Installed),
                (WorkerState::Installed, WorkerState::Activating),
                (WorkerState::Activating, WorkerState::Active),
            ]
        );
    }

    #[tokio::test]
    async fn test_reinstall_over_populated_disk_cache() {
        let dir = tempfile::tempdir().unwrap();

        let first = ServiceWorker::new(
            profile(),
            CacheStorage::new(DiskBackend::new(dir.path()).await.unwrap()),
            network(),
        );
        first.start().await.unwrap();

        let second = ServiceWorker::new(
            profile(),
            CacheStorage::new(DiskBackend::new(dir.path()).await.unwrap()),
            network(),
        );
        second.start().await.unwrap();

        let cache = second.storage().open("sushi-pwa-v1").await.unwrap();
        assert_eq!(cache.keys().await.unwrap().len(), 2);
        assert_eq!(second.storage().keys().await.unwrap(), vec!["sushi-pwa-v1"]);
    }

    #[tokio::test]
    async fn test_entries_persist_across_restarts() {
        let dir = tempfile::tempdir().unwrap();

        let online = ServiceWorker::new(
            profile(),
            CacheStorage::new(DiskBackend::new(dir.path()).await.unwrap()),
            network(),
        );
        online.start().await.unwrap();
        drop(online);

        let storage = CacheStorage::new(DiskBackend::new(dir.path()).await.unwrap());
        let hit = storage
            .match_request(&get("/manifest.json"), MatchOptions::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.cache_name, "sushi-pwa-v1");
        assert_eq!(hit.response.content_type(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_new_cache_name_leaves_old_cache() {
        let storage = CacheStorage::new(MemoryBackend::new());

        let v1 = ServiceWorker::new(profile(), storage.clone(), network());
        v1.start().await.unwrap();

        let mut next = profile();
        next.cache_name = "sushi-pwa-v2".to_string();
        let v2 = ServiceWorker::new(next, storage.clone(), network());
        v2.start().await.unwrap();

        assert_eq!(
            storage.keys().await.unwrap(),
            vec!["sushi-pwa-v1", "sushi-pwa-v2"]
        );
    }

    #[tokio::test]
    async fn test_post_goes_to_network() {
        let worker = ServiceWorker::new(profile(), CacheStorage::new(MemoryBackend::new()), network());
        worker.start().await.unwrap();

        let post = Request::new(http::Method::POST, get("/").url().clone());
        let outcome = worker.handle_fetch(&post).await.unwrap();
        assert_eq!(outcome.status, CacheStatus::Miss);
    }
}
