use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::api::AppState;
use crate::clients::{JellyfinClient, RadarrClient, SonarrClient};
use crate::config::SchedulerConfig;
use crate::sync;

#[derive(Debug, Clone, Copy)]
enum SyncJob {
    Users,
    Movies,
    WatchState,
    Series,
}

impl SyncJob {
    const fn name(self) -> &'static str {
        match self {
            Self::Users => "jellyfin users",
            Self::Movies => "radarr movies",
            Self::WatchState => "jellyfin watch state",
            Self::Series => "sonarr series",
        }
    }
}

/// Nightly sync driver. Each job gets its own cron slot; the default stagger
/// runs users first so the watch-state pass sees every linked account.
pub struct Scheduler {
    state: AppState,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(state: AppState, config: SchedulerConfig) -> Self {
        Self { state, config }
    }

    /// Start the cron runner, or return `None` when disabled in config.
    pub async fn start(&self) -> Result<Option<JobScheduler>> {
        if !self.config.enabled {
            info!("Scheduler is disabled in config");
            return Ok(None);
        }

        let mut sched = JobScheduler::new().await?;

        let jobs = [
            (self.config.users_cron.as_str(), SyncJob::Users),
            (self.config.movies_cron.as_str(), SyncJob::Movies),
            (self.config.watch_cron.as_str(), SyncJob::WatchState),
            (self.config.series_cron.as_str(), SyncJob::Series),
        ];

        for (cron_expr, job) in jobs {
            let state = self.state.clone();
            let cron_job = Job::new_async(cron_expr, move |_uuid, _lock| {
                let state = state.clone();
                Box::pin(async move {
                    run_job(&state, job).await;
                })
            })?;
            sched.add(cron_job).await?;
            info!("Scheduled {} sync with cron: {}", job.name(), cron_expr);
        }

        sched.start().await?;
        Ok(Some(sched))
    }
}

async fn run_job(state: &AppState, job: SyncJob) {
    info!("Running scheduled {} sync", job.name());
    let conn = &state.store.conn;

    let outcome: crate::error::SyncResult<()> = match job {
        SyncJob::Users => async {
            let client = JellyfinClient::new(&state.config.jellyfin)?;
            let counts = sync::jellyfin::import_users(conn, &client).await?;
            info!(
                imported = counts.imported,
                updated = counts.updated,
                "scheduled user sync finished"
            );
            Ok(())
        }
        .await,
        SyncJob::Movies => async {
            let client = RadarrClient::new(&state.config.radarr)?;
            let counts = sync::radarr::import_movies(conn, &client).await?;
            info!(
                imported = counts.imported,
                updated = counts.updated,
                "scheduled movie sync finished"
            );
            Ok(())
        }
        .await,
        SyncJob::WatchState => async {
            let client = JellyfinClient::new(&state.config.jellyfin)?;
            let counts = sync::jellyfin::sync_watch_state(conn, &client).await?;
            info!(
                synced = counts.synced,
                updated = counts.updated,
                added = counts.added,
                "scheduled watch-state sync finished"
            );
            Ok(())
        }
        .await,
        SyncJob::Series => async {
            let client = SonarrClient::new(&state.config.sonarr)?;
            let counts = sync::sonarr::import_series(conn, &client).await?;
            info!(
                new_series = counts.new_series,
                new_episodes = counts.new_episodes,
                "scheduled series sync finished"
            );
            Ok(())
        }
        .await,
    };

    if let Err(e) = outcome {
        error!("Scheduled {} sync failed: {}", job.name(), e);
    }
}
