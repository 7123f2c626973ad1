//! Tick cadence of the watcher.
//!
//! A scheduler waits out a one-shot deferred start, then initializes the
//! sink, arms the repeating report timer and runs the catalog dump inline
//! before it reports `Running`.
//! Every tick samples the world and hands the report to the sink inside the
//! same task, so ticks never overlap. State changes are published on a watch
//! channel and observed through [`SchedulerHandle`].

use std::sync::Arc;

use tokio::{
    sync::watch,
    task::{JoinError, JoinHandle},
    time::{interval_at, sleep, Instant, MissedTickBehavior},
};
use tracing::{debug, error, info, warn};

use crate::{
    catalog::CatalogDumper,
    config::WatcherConfig,
    sampler::LiveStateSampler,
    sink::{Delivery, ReportSink, SinkError},
    world::WorldSnapshotProvider,
};

/// Lifecycle of a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Constructed, timers not armed yet.
    Unstarted,
    /// Waiting for the deferred start to elapse.
    DeferredWait,
    /// Repeating timer active.
    Running,
    /// Timers cancelled; terminal.
    Stopped,
}

/// One sample-then-send cycle.
#[derive(Clone)]
pub struct ReportPipeline {
    sampler: LiveStateSampler,
    sink: ReportSink,
}

impl ReportPipeline {
    /// Pair a sampler with the sink its reports go to.
    pub fn new(sampler: LiveStateSampler, sink: ReportSink) -> Self {
        Self { sampler, sink }
    }

    /// Sample the world and deliver the report. The report is dropped on return.
    pub fn tick(&self) -> Delivery {
        debug!("report tick");
        let container = self.sampler.sample();
        self.sink.send(&container)
    }
}

/// Drives the deferred start and the repeating report timer.
pub struct ReportScheduler {
    config: WatcherConfig,
    world: Arc<dyn WorldSnapshotProvider>,
    catalog: Option<CatalogDumper>,
}

impl ReportScheduler {
    /// Build an unstarted scheduler. `catalog` is only used when `data_dump` is set.
    pub fn new(
        config: WatcherConfig,
        world: Arc<dyn WorldSnapshotProvider>,
        catalog: Option<CatalogDumper>,
    ) -> Self {
        Self {
            config,
            world,
            catalog,
        }
    }

    /// Arm the deferred start and run the scheduler on its own task.
    pub fn spawn(self) -> SchedulerHandle {
        let (state_tx, state_rx) = watch::channel(SchedulerState::Unstarted);
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(state_tx, stop_rx));
        SchedulerHandle {
            state: state_rx,
            stop: stop_tx,
            task,
        }
    }

    async fn run(self, state: watch::Sender<SchedulerState>, mut stop: watch::Receiver<bool>) {
        let delay = self.config.deferred_start();
        state.send_replace(SchedulerState::DeferredWait);
        info!(?delay, "watcher armed");

        tokio::select! {
            biased;
            _ = stop_requested(&mut stop) => {
                info!("watcher stopped before start");
                state.send_replace(SchedulerState::Stopped);
                return;
            }
            _ = sleep(delay) => {}
        }

        let pipeline = match self.init() {
            Ok(pipeline) => pipeline,
            Err(err) => {
                error!(%err, "watcher init failed");
                state.send_replace(SchedulerState::Stopped);
                return;
            }
        };

        let period = self.config.report_interval();
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        if self.config.data_dump {
            match &self.catalog {
                Some(dumper) => {
                    dumper.run_all();
                }
                None => warn!("data dump enabled but no config database is available"),
            }
        }

        state.send_replace(SchedulerState::Running);
        info!(?period, sink = ?pipeline.sink.mode(), "watcher running");

        loop {
            tokio::select! {
                biased;
                _ = stop_requested(&mut stop) => break,
                _ = ticker.tick() => {
                    pipeline.tick();
                }
            }
        }

        state.send_replace(SchedulerState::Stopped);
        info!("watcher stopped");
    }

    fn init(&self) -> Result<ReportPipeline, SinkError> {
        let sink = ReportSink::from_config(&self.config)?;
        let sampler = LiveStateSampler::new(Arc::clone(&self.world));
        Ok(ReportPipeline::new(sampler, sink))
    }
}

/// Resolves once a stop is requested or every handle is gone.
async fn stop_requested(stop: &mut watch::Receiver<bool>) {
    loop {
        if *stop.borrow_and_update() {
            return;
        }
        if stop.changed().await.is_err() {
            return;
        }
    }
}

/// Control side of a spawned scheduler. Dropping it stops the scheduler.
#[derive(Debug)]
pub struct SchedulerHandle {
    state: watch::Receiver<SchedulerState>,
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Current state.
    pub fn state(&self) -> SchedulerState {
        *self.state.borrow()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<SchedulerState> {
        self.state.clone()
    }

    /// Cancel future ticks. In-flight POSTs are left to finish.
    pub fn stop(&self) {
        self.stop.send_replace(true);
    }

    /// Wait for the scheduler task to end and return its final state.
    pub async fn join(self) -> Result<SchedulerState, JoinError> {
        let SchedulerHandle { state, stop, task } = self;
        task.await?;
        drop(stop);
        let last = *state.borrow();
        Ok(last)
    }
}
