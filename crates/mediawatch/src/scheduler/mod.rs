//! Cron-like daily triggers that delegate to the Recorder.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::Config;
use crate::errors::CoreResult;
use crate::recorder::Recorder;
use crate::utils::calculate_next_scheduled_time_in_tz;

type JobCallback = Arc<dyn Fn() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

struct Job {
    name: String,
    cron_expr: String,
    callback: JobCallback,
}

/// A small cron evaluator: each registered job sleeps until its next
/// scheduled fire time (evaluated in the configured `TIMEZONE`), runs its
/// callback, and reschedules. Callback failures are logged, never
/// propagated. Trigger callbacks are pure delegations to the Recorder.
pub struct Scheduler {
    jobs: Vec<Job>,
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            jobs: Vec::new(),
            cancel: CancellationToken::new(),
            handles: Vec::new(),
        }
    }

    /// Register a cron job. Not yet scheduled until [`Scheduler::start`]
    /// runs. This is the generalized registration surface that an
    /// external wiring layer (e.g. a speech-upload job) can also use.
    pub fn add_job<F, Fut>(&mut self, name: &str, cron_expr: &str, callback: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.jobs.push(Job {
            name: name.to_string(),
            cron_expr: cron_expr.to_string(),
            callback: Arc::new(move || Box::pin(callback())),
        });
    }

    /// Register the two default triggers: daily `requestRecording()` and
    /// `requestHalt()`.
    pub fn with_default_triggers(config: &Config, recorder: Arc<Recorder>) -> CoreResult<Self> {
        let mut scheduler = Self::new();
        let record_cron = config.get("SCHEDULE_RECORD_CRON")?;
        let halt_cron = config.get("SCHEDULE_HALT_CRON")?;

        let record_recorder = Arc::clone(&recorder);
        scheduler.add_job("daily-record", &record_cron, move || {
            let recorder = Arc::clone(&record_recorder);
            async move {
                recorder.request_recording().await;
            }
        });

        let halt_recorder = recorder;
        scheduler.add_job("daily-halt", &halt_cron, move || {
            let recorder = Arc::clone(&halt_recorder);
            async move {
                recorder.request_halt().await;
            }
        });

        Ok(scheduler)
    }

    /// Spawn one task per registered job, each sleeping until its next
    /// scheduled fire time in `timezone`.
    pub fn start(&mut self, timezone: chrono_tz::Tz) {
        for job in &self.jobs {
            if let Err(err) = calculate_next_scheduled_time_in_tz(&job.cron_expr, timezone) {
                error!(job = %job.name, error = %err, "invalid cron expression, job not scheduled");
                continue;
            }
            let callback = Arc::clone(&job.callback);
            let name = job.name.clone();
            let cron_expr = job.cron_expr.clone();
            let cancel = self.cancel.clone();

            let handle = tokio::spawn(async move {
                loop {
                    let next = match calculate_next_scheduled_time_in_tz(&cron_expr, timezone) {
                        Ok(Some(next)) => next,
                        Ok(None) | Err(_) => return,
                    };
                    let next_utc = next.with_timezone(&Utc);
                    let delay = (next_utc - Utc::now()).to_std().unwrap_or(std::time::Duration::ZERO);

                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = cancel.cancelled() => return,
                    }

                    info!(job = %name, "cron trigger fired");
                    callback().await;
                }
            });
            self.handles.push(handle);
        }
    }

    pub fn stop(&mut self) {
        self.cancel.cancel();
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
