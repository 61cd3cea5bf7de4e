//! Per-session flags and the box → advice mapping.
//!
//! A session starts fresh every time the board is launched: nothing has been
//! visited and the introduction has not played. The flags are owned by the
//! board and passed in explicitly; nothing here touches storage.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::config::AdviceEntry;

/// Stable identifier of a box on the board, numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoxId(pub u32);

impl fmt::Display for BoxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "box-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// SessionFlags
// ---------------------------------------------------------------------------

/// One-time UI gates for the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionFlags {
    intro_shown: bool,
    visited: BTreeSet<BoxId>,
}

impl SessionFlags {
    /// State at session start: intro pending, no box visited.
    pub fn start() -> Self {
        Self::default()
    }

    /// Reset in place to the session-start state.
    pub fn reset(&mut self) {
        *self = Self::start();
    }

    pub fn intro_shown(&self) -> bool {
        self.intro_shown
    }

    pub fn mark_intro_shown(&mut self) {
        self.intro_shown = true;
    }

    pub fn is_visited(&self, id: BoxId) -> bool {
        self.visited.contains(&id)
    }

    /// Returns `false` if the box was already visited.
    pub fn mark_visited(&mut self, id: BoxId) -> bool {
        self.visited.insert(id)
    }

    pub fn visited(&self) -> impl Iterator<Item = BoxId> + '_ {
        self.visited.iter().copied()
    }
}

// ---------------------------------------------------------------------------
// AdviceCatalog
// ---------------------------------------------------------------------------

const DEFAULT_ADVICE: &[(u32, &str)] = &[
    (1, "Take one slow breath."),
    (3, "Choose rest tonight."),
    (4, "End your day earlier."),
    (5, "Protect one silent hour."),
    (9, "Eat one real meal."),
    (12, "Give undivided minutes today."),
    (13, "Reach out once today."),
    (14, "Be here a moment."),
];

/// Advice text for each box, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdviceCatalog {
    entries: BTreeMap<BoxId, String>,
}

impl AdviceCatalog {
    /// Built-in advice with `overrides` applied on top.
    pub fn new(overrides: &[AdviceEntry]) -> Self {
        let mut entries: BTreeMap<BoxId, String> = DEFAULT_ADVICE
            .iter()
            .map(|(id, text)| (BoxId(*id), (*text).to_string()))
            .collect();
        for entry in overrides {
            entries.insert(BoxId(entry.id), entry.text.clone());
        }
        Self { entries }
    }

    /// Advice for `id`, or `Advice{n}` when none is configured.
    pub fn advice_for(&self, id: BoxId) -> String {
        self.entries
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("Advice{}", id.0))
    }
}

impl Default for AdviceCatalog {
    fn default() -> Self {
        Self::new(&[])
    }
}
