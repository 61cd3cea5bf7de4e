//! State machines for board entities.

pub mod card_sm;
