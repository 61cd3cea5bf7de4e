//! Last-request-wins refit scheduling.
//!
//! Box sizes can change many times in quick succession (window drags, reveal
//! animations). Only a fit against the latest size is useful, so requests go
//! into a single slot: a new request overwrites an unconsumed one, and the
//! frame loop drains at most one request per tick.

use std::time::{Duration, Instant};

use tracing::trace;

// ---------------------------------------------------------------------------
// PendingSlot
// ---------------------------------------------------------------------------

/// Identifies one submission to a `PendingSlot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Single-slot cell. Submitting replaces whatever is waiting.
#[derive(Debug)]
pub struct PendingSlot<T> {
    slot: Option<(Ticket, T)>,
    latest: u64,
}

impl<T> Default for PendingSlot<T> {
    fn default() -> Self {
        Self {
            slot: None,
            latest: 0,
        }
    }
}

impl<T> PendingSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value`, dropping any unconsumed earlier value.
    pub fn submit(&mut self, value: T) -> Ticket {
        self.latest += 1;
        let ticket = Ticket(self.latest);
        self.slot = Some((ticket, value));
        ticket
    }

    pub fn peek(&self) -> Option<&T> {
        self.slot.as_ref().map(|(_, v)| v)
    }

    pub fn take(&mut self) -> Option<(Ticket, T)> {
        self.slot.take()
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    /// `false` once anything newer has been submitted.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.latest
    }
}

// ---------------------------------------------------------------------------
// RefitScheduler
// ---------------------------------------------------------------------------

/// Why a refit was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefitReason {
    /// Text just changed.
    Initial,
    /// Layout had time to settle after a text change.
    Settled,
    /// The box was resized.
    Resize,
    /// The card's reveal animation finished.
    AnimationComplete,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    reason: RefitReason,
    due: Instant,
}

/// Refit requests for one card.
#[derive(Debug)]
pub struct RefitScheduler {
    slot: PendingSlot<Pending>,
    debounce: Duration,
    animating: bool,
    deferred: bool,
}

impl RefitScheduler {
    pub fn new(debounce: Duration) -> Self {
        Self {
            slot: PendingSlot::new(),
            debounce,
            animating: false,
            deferred: false,
        }
    }

    pub fn set_debounce(&mut self, debounce: Duration) {
        self.debounce = debounce;
    }

    /// While animating, everything but `AnimationComplete` is deferred,
    /// including a request already waiting in the slot.
    pub fn set_animating(&mut self, animating: bool) {
        self.animating = animating;
        if animating && !self.slot.is_empty() {
            trace!(target: "board", "pending refit deferred by animation");
            self.slot.clear();
            self.deferred = true;
        }
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    /// Whether a request was swallowed during the current animation.
    pub fn is_deferred(&self) -> bool {
        self.deferred
    }

    /// Queue a refit. Returns `None` if the request was deferred.
    ///
    /// Resizes are debounced; each new resize restarts the quiet period.
    pub fn request(&mut self, reason: RefitReason, now: Instant) -> Option<Ticket> {
        if self.animating && reason != RefitReason::AnimationComplete {
            trace!(target: "board", ?reason, "refit deferred while animating");
            self.deferred = true;
            return None;
        }
        let due = match reason {
            RefitReason::Resize => now + self.debounce,
            _ => now,
        };
        if let Some(prev) = self.slot.peek() {
            trace!(target: "board", superseded = ?prev.reason, by = ?reason, "refit superseded");
        }
        Some(self.slot.submit(Pending { reason, due }))
    }

    /// End the animation and request the one clean refit it was holding back.
    pub fn animation_complete(&mut self, now: Instant) -> Ticket {
        self.animating = false;
        self.deferred = false;
        self.slot.submit(Pending {
            reason: RefitReason::AnimationComplete,
            due: now,
        })
    }

    /// Drain the pending request if it is due.
    pub fn poll(&mut self, now: Instant) -> Option<(Ticket, RefitReason)> {
        let pending = self.slot.peek()?;
        if pending.due > now || (self.animating && pending.reason != RefitReason::AnimationComplete) {
            return None;
        }
        self.slot.take().map(|(t, p)| (t, p.reason))
    }

    pub fn has_pending(&self) -> bool {
        !self.slot.is_empty()
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.slot.is_current(ticket)
    }

    pub fn cancel(&mut self) {
        self.slot.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn slot_keeps_only_latest() {
        let mut slot = PendingSlot::new();
        let a = slot.submit("first");
        let b = slot.submit("second");
        assert!(!slot.is_current(a));
        assert!(slot.is_current(b));
        assert_eq!(slot.take(), Some((b, "second")));
        assert!(slot.take().is_none());
        // Still current after being drained; nothing newer arrived.
        assert!(slot.is_current(b));
    }

    #[test]
    fn newer_request_overwrites_older() {
        let t0 = Instant::now();
        let mut s = RefitScheduler::new(ms(80));
        s.request(RefitReason::Initial, t0);
        s.request(RefitReason::Settled, t0);
        assert_eq!(s.poll(t0).map(|(_, r)| r), Some(RefitReason::Settled));
        assert!(s.poll(t0).is_none());
    }

    #[test]
    fn one_request_per_poll() {
        let t0 = Instant::now();
        let mut s = RefitScheduler::new(ms(80));
        s.request(RefitReason::Initial, t0);
        assert!(s.poll(t0).is_some());
        assert!(s.poll(t0).is_none());
        assert!(!s.has_pending());
    }

    #[test]
    fn resize_is_debounced_and_restarted() {
        let t0 = Instant::now();
        let mut s = RefitScheduler::new(ms(80));
        s.request(RefitReason::Resize, t0);
        assert!(s.poll(t0 + ms(50)).is_none());
        // Another resize restarts the quiet period.
        s.request(RefitReason::Resize, t0 + ms(50));
        assert!(s.poll(t0 + ms(100)).is_none());
        assert_eq!(
            s.poll(t0 + ms(130)).map(|(_, r)| r),
            Some(RefitReason::Resize)
        );
    }

    #[test]
    fn animation_defers_until_complete() {
        let t0 = Instant::now();
        let mut s = RefitScheduler::new(ms(80));
        s.set_animating(true);
        assert!(s.request(RefitReason::Resize, t0).is_none());
        assert!(s.request(RefitReason::Initial, t0).is_none());
        assert!(s.is_deferred());
        assert!(s.poll(t0 + ms(500)).is_none());

        let ticket = s.animation_complete(t0 + ms(500));
        assert!(!s.is_deferred());
        assert!(!s.is_animating());
        assert_eq!(
            s.poll(t0 + ms(500)),
            Some((ticket, RefitReason::AnimationComplete))
        );
    }

    #[test]
    fn animation_defers_request_already_queued() {
        let t0 = Instant::now();
        let mut s = RefitScheduler::new(ms(80));
        s.request(RefitReason::Resize, t0);
        s.set_animating(true);
        assert!(s.is_deferred());
        assert!(!s.has_pending());
        assert!(s.poll(t0 + ms(200)).is_none());

        s.animation_complete(t0 + ms(550));
        assert_eq!(
            s.poll(t0 + ms(550)).map(|(_, r)| r),
            Some(RefitReason::AnimationComplete)
        );
    }

    #[test]
    fn stale_ticket_detected() {
        let t0 = Instant::now();
        let mut s = RefitScheduler::new(ms(0));
        let (old, _) = {
            s.request(RefitReason::Initial, t0);
            s.poll(t0).unwrap()
        };
        s.request(RefitReason::Resize, t0);
        assert!(!s.is_current(old));
    }
}
