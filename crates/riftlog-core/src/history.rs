//! Memory of handled chat messages.
//!
//! Answers two questions for the observer: has this exact message been
//! handled already, and is it a near-duplicate of a recent one (same author
//! and text within the dedup window). Entries older than the retention
//! horizon are pruned lazily so a long session doesn't grow without bound.
//! Readers must skip messages that are no longer retained, see
//! [`MessageHistory::is_retained`].

use crate::config::ObserverConfig;
use chrono::{DateTime, Utc};
use riftlog_types::ChatMessage;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::debug;

/// Set of handled messages plus the handled messages of each author.
#[derive(Debug)]
pub struct MessageHistory {
    seen: HashSet<ChatMessage>,
    by_author: HashMap<String, Vec<ChatMessage>>,
    dedup_window: chrono::Duration,
    retention: chrono::Duration,
    prune_interval: chrono::Duration,
    last_pruned: Option<DateTime<Utc>>,
}

impl MessageHistory {
    pub fn new(config: &ObserverConfig) -> Self {
        Self {
            seen: HashSet::new(),
            by_author: HashMap::new(),
            dedup_window: to_chrono(config.dedup_window),
            retention: to_chrono(config.history_retention),
            prune_interval: to_chrono(config.prune_interval),
            last_pruned: None,
        }
    }

    /// Whether this exact message (timestamp, author and text) was handled before.
    pub fn is_seen(&self, message: &ChatMessage) -> bool {
        self.seen.contains(message)
    }

    /// Whether `message` is recent enough to be remembered at `now`.
    ///
    /// A message outside the horizon may already have been pruned, so
    /// `is_seen` can no longer vouch for it.
    pub fn is_retained(&self, message: &ChatMessage, now: DateTime<Utc>) -> bool {
        message.timestamp >= self.horizon(now)
    }

    /// Whether a handled message with the same author and text lies within
    /// the dedup window of this message's timestamp.
    pub fn is_duplicate(&self, message: &ChatMessage) -> bool {
        self.by_author.get(&message.author).is_some_and(|handled| {
            handled.iter().any(|previous| {
                previous.same_content(message) && (previous.timestamp - message.timestamp).abs() < self.dedup_window
            })
        })
    }

    /// Record a message and report whether it was a near-duplicate.
    ///
    /// Duplicates are recorded too, so later repeats are measured against
    /// every occurrence rather than only the delivered ones.
    pub fn record(&mut self, message: &ChatMessage) -> bool {
        self.record_at(message, Utc::now())
    }

    pub(crate) fn record_at(&mut self, message: &ChatMessage, now: DateTime<Utc>) -> bool {
        let duplicate = self.is_duplicate(message);

        self.seen.insert(message.clone());
        self.by_author
            .entry(message.author.clone())
            .or_default()
            .push(message.clone());

        let due = self
            .last_pruned
            .is_none_or(|last| now - last >= self.prune_interval);
        if due {
            self.prune(now);
        }

        duplicate
    }

    /// Drop everything older than the retention horizon.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let horizon = self.horizon(now);
        let before = self.len();

        self.seen.retain(|message| message.timestamp >= horizon);
        self.by_author.retain(|_, handled| {
            handled.retain(|message| message.timestamp >= horizon);
            !handled.is_empty()
        });
        self.last_pruned = Some(now);

        let pruned = before - self.len();
        if pruned > 0 {
            debug!(target: "riftlog::history", "Pruned {} handled messages, {} left", pruned, self.len());
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.seen.len()
    }

    fn horizon(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.retention)
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}
