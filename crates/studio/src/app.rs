//! Composition root.
//!
//! [`Studio`] owns the wired-together application: settings, the job
//! store, and (when a credential is available) the API gateway and
//! reconciler. No process-wide singleton; the instance is constructed
//! with [`Studio::init`] and wound down with [`Studio::teardown`].

use std::sync::Arc;
use std::time::Duration;

use sora_core::SoraError;
use sora_events::EventBus;
use sora_gateway::VideoApi;
use sora_store::{JobStore, JobsFileStore, Poller, Reconciler, Settings, StudioPaths};

/// Environment variable selecting the data directory.
pub const DATA_DIR_ENV: &str = "SORA_STUDIO_DIR";

/// Data directory used when [`DATA_DIR_ENV`] is unset.
pub const DEFAULT_DATA_DIR: &str = ".sora-studio";

/// The wired application.
///
/// The store always exists so credential-free commands (list, export)
/// keep working against persisted state; everything that talks to the
/// remote API goes through [`reconciler`](Studio::reconciler) or
/// [`api`](Studio::api) and fails with
/// [`SoraError::NotConfigured`] when no key is present.
pub struct Studio {
    pub paths: StudioPaths,
    pub settings: Settings,
    store: Arc<JobStore>,
    api: Option<Arc<VideoApi>>,
    reconciler: Option<Arc<Reconciler>>,
}

impl Studio {
    /// Build the application from the data directory: load settings,
    /// open the persisted store, and construct the gateway when a
    /// credential resolves.
    pub fn init(paths: StudioPaths) -> Self {
        let settings = Settings::load(&paths.settings_file());
        let store = Arc::new(JobStore::open(
            JobsFileStore::new(paths.jobs_file()),
            EventBus::default(),
        ));

        let api = settings.resolve_api_key().map(|key| Arc::new(VideoApi::new(key)));
        if api.is_none() {
            tracing::warn!("No API key configured; remote operations are unavailable");
        }

        let reconciler = api.as_ref().map(|api| {
            Arc::new(Reconciler::new(
                Arc::clone(&store),
                Arc::clone(api) as Arc<dyn sora_core::RemoteJobs>,
            ))
        });

        Self {
            paths,
            settings,
            store,
            api,
            reconciler,
        }
    }

    /// Resolve the data directory from the environment.
    pub fn paths_from_env() -> StudioPaths {
        let dir = std::env::var(DATA_DIR_ENV).unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
        StudioPaths::new(dir)
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    pub fn api(&self) -> Result<&Arc<VideoApi>, SoraError> {
        self.api.as_ref().ok_or(SoraError::NotConfigured)
    }

    pub fn reconciler(&self) -> Result<&Arc<Reconciler>, SoraError> {
        self.reconciler.as_ref().ok_or(SoraError::NotConfigured)
    }

    /// Start the poll loop at the configured interval.
    pub fn start_poller(&self) -> Result<Poller, SoraError> {
        let reconciler = Arc::clone(self.reconciler()?);
        let interval = Duration::from_secs(self.settings.poll_interval_secs);
        Ok(Poller::start(reconciler, interval))
    }

    /// Wind the application down. The store has no background work of
    /// its own; any running poller must be shut down by its holder.
    pub fn teardown(self) {
        tracing::debug!("Studio teardown complete");
    }
}
