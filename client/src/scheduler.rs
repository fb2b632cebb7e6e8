//! Trigger scheduling: debounce, heartbeat, page advance, and the
//! one-shot exit flush.
//!
//! One task owns all the timers, so trigger paths never overlap and the
//! buffer sees strictly ordered read-modify-write cycles. Callers talk
//! to the task through a [`SchedulerHandle`].

use std::sync::Arc;

use tokio::select;
use tokio::sync::Mutex;
use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;

use crate::client::SubmissionClient;
use crate::config::ClientConfig;
use crate::form::FormState;
use crate::transport::Delivery;

/// What the page reports to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// A qualifying interaction happened; (re)arm the debounce timer.
    Interaction,
    /// The respondent moved on; submit immediately, then point the form
    /// at `next_page` if given.
    Advance { next_page: Option<String> },
    /// The page is going away (tab hidden, unload). At most one exit
    /// submission goes out per page visit.
    Exit,
}

/// Owns the trigger timers around one [`SubmissionClient`].
pub struct SubmissionScheduler {
    client: Arc<SubmissionClient>,
    form: Arc<Mutex<FormState>>,
    debounce: Duration,
    heartbeat: Duration,
}

impl SubmissionScheduler {
    pub fn new(
        client: Arc<SubmissionClient>,
        form: Arc<Mutex<FormState>>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            client,
            form,
            debounce: config.debounce(),
            heartbeat: config.heartbeat(),
        }
    }

    /// Start the scheduling task.
    pub fn spawn(self) -> SchedulerHandle {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(events_rx, shutdown_rx));
        SchedulerHandle {
            events: events_tx,
            shutdown: shutdown_tx,
            task,
        }
    }

    async fn run(
        self,
        mut events: mpsc::UnboundedReceiver<PageEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        // Matches the page-load baseline: the heartbeat may fire only
        // once a full quiet period has passed.
        let mut last_submission = Instant::now();
        let mut deadline: Option<Instant> = None;
        let mut exit_flushed = false;

        let mut heartbeat =
            tokio::time::interval_at(Instant::now() + self.heartbeat, self.heartbeat);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        self.flush_exit(&mut exit_flushed, &mut last_submission).await;
                        break;
                    }
                }
                event = events.recv() => {
                    match event {
                        Some(PageEvent::Interaction) => {
                            deadline = Some(Instant::now() + self.debounce);
                        }
                        Some(PageEvent::Advance { next_page }) => {
                            deadline = None;
                            self.submit_now(Delivery::normal(), &mut last_submission).await;
                            if let Some(page) = next_page {
                                self.form.lock().await.set_page(page);
                            }
                        }
                        Some(PageEvent::Exit) => {
                            deadline = None;
                            self.flush_exit(&mut exit_flushed, &mut last_submission).await;
                        }
                        None => {
                            // Handle dropped without a shutdown.
                            self.flush_exit(&mut exit_flushed, &mut last_submission).await;
                            break;
                        }
                    }
                }
                _ = maybe_sleep_until(deadline), if deadline.is_some() => {
                    deadline = None;
                    if self.form.lock().await.has_data() {
                        self.submit_now(Delivery::normal(), &mut last_submission).await;
                    } else {
                        tracing::debug!("debounce fired with nothing to submit");
                    }
                }
                _ = heartbeat.tick() => {
                    if !exit_flushed
                        && last_submission.elapsed() >= self.heartbeat
                        && self.form.lock().await.has_data()
                    {
                        tracing::debug!("heartbeat resubmission");
                        self.submit_now(Delivery::normal(), &mut last_submission).await;
                    }
                }
            }
        }
    }

    async fn flush_exit(&self, exit_flushed: &mut bool, last_submission: &mut Instant) {
        if *exit_flushed {
            return;
        }
        *exit_flushed = true;
        self.submit_now(Delivery::fire_and_forget(), last_submission)
            .await;
    }

    /// Submit whatever the form holds right now, merged over the
    /// buffer. Failures are logged and swallowed; no trigger path may
    /// take down the loop.
    async fn submit_now(&self, delivery: Delivery, last_submission: &mut Instant) {
        *last_submission = Instant::now();
        let snapshot = self.form.lock().await.clone();
        match self.client.submit_form(&snapshot, delivery).await {
            Ok(outcome) => tracing::debug!("scheduled submission: {outcome:?}"),
            Err(err) => tracing::warn!("scheduled submission failed: {err}"),
        }
    }
}

async fn maybe_sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Channel to a running scheduler task.
pub struct SchedulerHandle {
    events: mpsc::UnboundedSender<PageEvent>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn interaction(&self) {
        let _ = self.events.send(PageEvent::Interaction);
    }

    pub fn advance(&self, next_page: Option<String>) {
        let _ = self.events.send(PageEvent::Advance { next_page });
    }

    pub fn exit(&self) {
        let _ = self.events.send(PageEvent::Exit);
    }

    /// Flush the exit submission if it has not gone out yet, then stop
    /// the task.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}
