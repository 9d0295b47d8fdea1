//! Battleplan - turn-based tactical movement core

pub mod battle;
pub mod core;
pub mod motion;
