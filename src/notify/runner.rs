// src/notify/runner.rs
//
// The notifier process: one cooperative loop that alternates a dispatcher
// cycle with long-polling the channel for action events.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::db::Database;
use crate::media::MediaStore;
use crate::notify::callback::CallbackHandler;
use crate::notify::channel::Channel;
use crate::notify::dispatcher::{CycleReport, Dispatcher};

/// Remainders shorter than this are slept off instead of polled.
const MIN_POLL: Duration = Duration::from_secs(1);

/// Asks a running notifier to stop at the next cycle or poll boundary.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Stop at the next boundary on SIGINT or SIGTERM. Can only be installed
/// once per process.
pub fn stop_on_signal(stop: StopHandle) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        info!("shutdown requested, finishing the current cycle");
        stop.stop();
    })
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub cycle: CycleReport,
    pub actions_applied: usize,
    pub actions_rejected: usize,
}

pub struct Notifier<C: Channel> {
    db: Database,
    channel: C,
    media: MediaStore,
    interval: Duration,
    stop: StopHandle,
    /// Next update the channel should hand us. Not persisted; after a
    /// restart the channel redelivers whatever was not confirmed.
    next_offset: Option<i64>,
}

impl<C: Channel> Notifier<C> {
    pub fn new(db: Database, channel: C, media: MediaStore, interval: Duration) -> Self {
        Self {
            db,
            channel,
            media,
            interval,
            stop: StopHandle::new(),
            next_offset: None,
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Loop until stopped.
    pub fn run(&mut self) {
        info!(interval_secs = self.interval.as_secs(), "notifier started");
        while !self.stop.is_stopped() {
            self.tick();
        }
        info!("notifier stopped");
    }

    /// One dispatcher cycle, then action events until the interval is used up.
    /// The channel is polled at least once per tick.
    pub fn tick(&mut self) -> TickReport {
        let deadline = Instant::now() + self.interval;
        let mut report = TickReport::default();

        match Dispatcher::new(&self.db, &self.channel, &self.media).run_cycle() {
            Ok(cycle) => report.cycle = cycle,
            Err(e) => error!(error = %e, "dispatcher cycle failed"),
        }

        while !self.stop.is_stopped() {
            let wait = deadline.saturating_duration_since(Instant::now());
            self.poll_once(wait, &mut report);

            let left = deadline.saturating_duration_since(Instant::now());
            if left < MIN_POLL {
                thread::sleep(left);
                break;
            }
        }

        report
    }

    fn poll_once(&mut self, wait: Duration, report: &mut TickReport) {
        let batch = match self.channel.poll_actions(self.next_offset, wait) {
            Ok(batch) => batch,
            Err(e) => {
                warn!(error = %e, "polling for actions failed");
                thread::sleep(wait);
                return;
            }
        };

        if !batch.events.is_empty() {
            debug!(count = batch.events.len(), "action events received");
        }

        let handler = CallbackHandler::new(&self.db, &self.channel);
        for event in &batch.events {
            match handler.handle(event, crate::now_unix()) {
                Ok(_) => report.actions_applied += 1,
                Err(_) => report.actions_rejected += 1,
            }
        }

        if let Some(last) = batch.last_update_id {
            self.next_offset = Some(last + 1);
        }
    }
}
