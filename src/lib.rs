//! Per-guild native audio playback engine for Discord music bots.
//!
//! The command layer resolves a request into a [`audio::Track`], hands it to a
//! guild's player through [`audio::SessionManager`], and renders the
//! [`audio::PlayerEvent`]s the players emit. Voice transport stays behind the
//! [`audio::sink::VoiceSink`] trait.

pub mod audio;
pub mod config;
pub mod error;
pub mod sources;
pub mod vote;

pub use error::{EngineError, Result};
