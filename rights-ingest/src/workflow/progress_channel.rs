//! Per-submission progress fan-out with replay
//!
//! Each submission gets a bounded history of its published events and at
//! most one live subscriber. A subscriber first receives the buffered
//! history, then live events. History snapshot and subscriber registration
//! happen under the same lock that `publish` takes, so nothing published in
//! between is lost.
//!
//! Which part of the history is replayed:
//! - a re-attaching subscriber names the last sequence it saw and gets every
//!   buffered event after it, whatever its age
//! - a first attach on a running submission gets events younger than
//!   `replay_window`
//! - a first attach on a closed channel gets the whole buffer (terminal event
//!   included), kept for `retention` and then dropped by
//!   [`ProgressChannel::sweep`]

use rights_common::events::ProgressEvent;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("Submission {0} already has a live subscriber")]
    AlreadySubscribed(Uuid),

    #[error("No progress channel for submission {0}")]
    NotFound(Uuid),
}

/// Buffering limits
#[derive(Debug, Clone, Copy)]
pub struct ChannelConfig {
    /// Events kept per submission
    pub replay_buffer: usize,
    /// Age limit for replay while the submission is still running
    pub replay_window: Duration,
    /// How long a closed channel stays replayable
    pub retention: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            replay_buffer: 64,
            replay_window: Duration::from_millis(2000),
            retention: Duration::from_secs(300),
        }
    }
}

struct Buffered {
    at: Instant,
    event: ProgressEvent,
}

#[derive(Default)]
struct ChannelState {
    history: VecDeque<Buffered>,
    last_sequence: u64,
    live: Option<mpsc::UnboundedSender<ProgressEvent>>,
    closed_at: Option<Instant>,
}

impl ChannelState {
    fn has_live_subscriber(&self) -> bool {
        self.live.as_ref().is_some_and(|tx| !tx.is_closed())
    }
}

/// Registry of per-submission progress channels
pub struct ProgressChannel {
    config: ChannelConfig,
    channels: Mutex<HashMap<Uuid, ChannelState>>,
}

impl Default for ProgressChannel {
    fn default() -> Self {
        Self::new(ChannelConfig::default())
    }
}

impl ProgressChannel {
    pub fn new(config: ChannelConfig) -> Self {
        Self {
            config,
            channels: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> ChannelConfig {
        self.config
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, ChannelState>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make `id` known so subscribers can attach before the first event
    pub fn register(&self, id: Uuid) {
        self.lock().entry(id).or_default();
    }

    /// Stamp `event` with the next sequence number, buffer it and forward it
    /// to the live subscriber, if any. Returns the stamped event.
    ///
    /// Publishing to a closed channel is refused: the event is returned
    /// unstamped and nothing is buffered.
    pub fn publish(&self, id: Uuid, mut event: ProgressEvent) -> ProgressEvent {
        let mut channels = self.lock();
        let state = channels.entry(id).or_default();

        if state.closed_at.is_some() {
            warn!(submission_id = %id, "Event published after channel close, dropped");
            return event;
        }

        state.last_sequence += 1;
        event.sequence = state.last_sequence;

        state.history.push_back(Buffered {
            at: Instant::now(),
            event: event.clone(),
        });
        while state.history.len() > self.config.replay_buffer.max(1) {
            state.history.pop_front();
        }

        if let Some(tx) = &state.live {
            if tx.send(event.clone()).is_err() {
                debug!(submission_id = %id, "Subscriber gone, buffering only");
                state.live = None;
            }
        }

        event
    }

    /// Attach a subscriber
    ///
    /// `after` is the last sequence the caller already holds; replay resumes
    /// right behind it. Fails if another subscriber is still attached. On a
    /// closed channel the subscription replays the retained history and then
    /// ends.
    pub fn open(
        &self,
        id: Uuid,
        after: Option<u64>,
    ) -> Result<ProgressSubscription, ChannelError> {
        let mut channels = self.lock();
        let state = channels.get_mut(&id).ok_or(ChannelError::NotFound(id))?;

        if state.has_live_subscriber() {
            return Err(ChannelError::AlreadySubscribed(id));
        }

        let closed = state.closed_at.is_some();
        let window = self.config.replay_window;
        let replay: VecDeque<ProgressEvent> = state
            .history
            .iter()
            .filter(|b| match after {
                Some(seen) => b.event.sequence > seen,
                None => closed || b.at.elapsed() <= window,
            })
            .map(|b| b.event.clone())
            .collect();

        if let (Some(seen), Some(first)) = (after, state.history.front()) {
            if first.event.sequence > seen + 1 {
                warn!(
                    submission_id = %id,
                    last_seen = seen,
                    oldest_buffered = first.event.sequence,
                    "Resume point already evicted from the replay buffer"
                );
            }
        }

        let (tx, rx) = mpsc::unbounded_channel();
        if closed {
            drop(tx);
        } else {
            state.live = Some(tx);
        }

        debug!(
            submission_id = %id,
            replayed = replay.len(),
            resumed_after = ?after,
            closed,
            "Subscriber attached"
        );

        Ok(ProgressSubscription {
            submission_id: id,
            replay,
            live: rx,
        })
    }

    /// Mark the channel finished and end the live stream (idempotent)
    pub fn close(&self, id: Uuid) {
        let mut channels = self.lock();
        let state = channels.entry(id).or_default();
        if state.closed_at.is_none() {
            state.closed_at = Some(Instant::now());
        }
        state.live = None;
    }

    pub fn is_closed(&self, id: Uuid) -> bool {
        self.lock()
            .get(&id)
            .is_some_and(|state| state.closed_at.is_some())
    }

    pub fn has_subscriber(&self, id: Uuid) -> bool {
        self.lock()
            .get(&id)
            .is_some_and(ChannelState::has_live_subscriber)
    }

    /// Number of channels currently held
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict closed channels older than the retention period
    pub fn sweep(&self) -> usize {
        let retention = self.config.retention;
        let mut channels = self.lock();
        let before = channels.len();
        channels.retain(|_, state| {
            state
                .closed_at
                .map_or(true, |closed_at| closed_at.elapsed() < retention)
        });
        before - channels.len()
    }
}

/// One subscriber's view: buffered history, then live events
#[derive(Debug)]
pub struct ProgressSubscription {
    submission_id: Uuid,
    replay: VecDeque<ProgressEvent>,
    live: mpsc::UnboundedReceiver<ProgressEvent>,
}

impl ProgressSubscription {
    pub fn submission_id(&self) -> Uuid {
        self.submission_id
    }

    /// Next event, or `None` once the channel is closed and drained
    pub async fn next(&mut self) -> Option<ProgressEvent> {
        if let Some(event) = self.replay.pop_front() {
            return Some(event);
        }
        self.live.recv().await
    }
}
