//! Card lifecycle state machine.
//!
//! ```text
//! Covered ──Clicked──▶ Revealing ──RevealFinished──▶ Advice
//!    └──────────────Restore─────────────────────────────┘
//! ```
//!
//! A card is interactive only while covered. `Restore` puts a card that was
//! already visited this session straight into `Advice` without animating.

use statig::prelude::*;
use tracing::info;

use crate::session::BoxId;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardEvent {
    /// The user clicked the card.
    Clicked,
    /// The reveal animation ran to completion.
    RevealFinished,
    /// The card was visited earlier in the session.
    Restore,
}

/// Coarse view of the card state for rendering and scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardPhase {
    Covered,
    Revealing,
    Advice,
}

// ---------------------------------------------------------------------------
// Shared storage
// ---------------------------------------------------------------------------

pub struct CardMachine {
    pub id: BoxId,
}

pub type CardStateMachine = statig::blocking::StateMachine<CardMachine>;

impl CardMachine {
    pub fn new(id: BoxId) -> Self {
        Self { id }
    }

    pub fn phase(state: &State) -> CardPhase {
        match state {
            State::Covered {} => CardPhase::Covered,
            State::Revealing {} => CardPhase::Revealing,
            State::Advice {} => CardPhase::Advice,
        }
    }
}

// ---------------------------------------------------------------------------
// State machine implementation
// ---------------------------------------------------------------------------

#[state_machine(
    initial = "State::covered()",
    state(derive(Debug, Clone, PartialEq))
)]
impl CardMachine {
    /// Showing its cover; waiting for a click.
    #[state]
    fn covered(&mut self, event: &CardEvent) -> Outcome<State> {
        match event {
            CardEvent::Clicked => Transition(State::revealing()),
            CardEvent::Restore => Transition(State::advice()),
            CardEvent::RevealFinished => Handled,
        }
    }

    /// Switching from cover to advice. Further clicks are ignored.
    #[state(entry_action = "enter_revealing")]
    fn revealing(&mut self, event: &CardEvent) -> Outcome<State> {
        match event {
            CardEvent::RevealFinished => Transition(State::advice()),
            _ => Handled,
        }
    }

    /// Showing advice. Terminal for the session.
    #[state]
    fn advice(&mut self, event: &CardEvent) -> Outcome<State> {
        let _ = event;
        Handled
    }

    #[action]
    fn enter_revealing(&mut self) {
        info!(target: "board", id = %self.id, "revealing advice");
    }
}
