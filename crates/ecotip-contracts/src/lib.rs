//! Network-free building blocks for the EcoTip footprint calculator: the
//! emission formula, tip prompt and reply handling, per-session state, the
//! session event log, and chat command parsing.

pub mod activity;
pub mod chat;
pub mod events;
pub mod session;
pub mod tips;
