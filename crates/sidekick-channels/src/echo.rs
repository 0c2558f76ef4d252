//! Suppression of the bridge's echoes of our own sends.
//!
//! The bridge reports every message the session sends, including ours, as a
//! `from_me` event. The echo can arrive before the send call returns its id,
//! so own messages seen while a send is in flight are held until the send
//! resolves: matched ones are dropped, the rest are released.

use sidekick_core::message::IncomingMessage;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Sent ids wait this long for their echo.
const ECHO_TTL: Duration = Duration::from_secs(600);
/// Upper bound on remembered sent ids.
const MAX_SENT_IDS: usize = 1024;

#[derive(Debug)]
pub(crate) struct EchoFilter {
    /// Ids of our sends whose echo hasn't been seen yet.
    sent: HashMap<String, Instant>,
    /// Sends awaiting the bridge's answer, by ticket.
    in_flight: HashMap<u64, Instant>,
    next_ticket: u64,
    /// Own messages observed while a send was in flight.
    held: Vec<IncomingMessage>,
    /// A send older than this has been cancelled or timed out.
    send_window: Duration,
}

impl EchoFilter {
    pub(crate) fn new(send_window: Duration) -> Self {
        Self {
            sent: HashMap::new(),
            in_flight: HashMap::new(),
            next_ticket: 0,
            held: Vec::new(),
            send_window,
        }
    }

    /// Mark a send as started.
    pub(crate) fn begin_send(&mut self, now: Instant) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.in_flight.insert(ticket, now);
        ticket
    }

    /// Mark a send as resolved with the id the bridge assigned (`None` on
    /// failure). Returns held messages that no longer need holding.
    pub(crate) fn finish_send(
        &mut self,
        ticket: u64,
        id: Option<&str>,
        now: Instant,
    ) -> Vec<IncomingMessage> {
        self.in_flight.remove(&ticket);
        if let Some(id) = id {
            match self.held.iter().position(|m| m.id == id) {
                Some(pos) => {
                    self.held.remove(pos);
                    debug!("dropped early echo of {id}");
                }
                None => {
                    self.sent.insert(id.to_string(), now);
                }
            }
        }
        self.expire(now)
    }

    /// Decide what to do with one polled message. `Some` means forward it now.
    pub(crate) fn observe(&mut self, msg: IncomingMessage) -> Option<IncomingMessage> {
        if !msg.from_me {
            return Some(msg);
        }
        if self.sent.remove(&msg.id).is_some() {
            debug!("skipping own echo: {}", msg.id);
            return None;
        }
        if !self.in_flight.is_empty() {
            self.held.push(msg);
            return None;
        }
        Some(msg)
    }

    /// Forget stale sends and echo ids. Returns held messages once nothing
    /// is in flight anymore.
    pub(crate) fn expire(&mut self, now: Instant) -> Vec<IncomingMessage> {
        let window = self.send_window;
        self.in_flight
            .retain(|_, started| now.duration_since(*started) < window);
        self.sent
            .retain(|_, at| now.duration_since(*at) < ECHO_TTL);

        if self.sent.len() > MAX_SENT_IDS {
            let mut by_age: Vec<(String, Instant)> =
                self.sent.iter().map(|(k, v)| (k.clone(), *v)).collect();
            by_age.sort_by_key(|(_, at)| *at);
            let excess = self.sent.len() - MAX_SENT_IDS;
            for (id, _) in by_age.into_iter().take(excess) {
                self.sent.remove(&id);
            }
            warn!("echo filter: dropped {excess} unechoed sent id(s)");
        }

        if self.in_flight.is_empty() {
            std::mem::take(&mut self.held)
        } else {
            Vec::new()
        }
    }

    #[cfg(test)]
    pub(crate) fn remembered(&self) -> usize {
        self.sent.len()
    }
}
