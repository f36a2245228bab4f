//! Error taxonomy for the playback engine.
//!
//! Track-scoped failures (`ResolutionFailure`, `DecodeFailure`) never abort a
//! session; `SinkDisconnected` is session-scoped and always destroys the player.
//! `SeekUnavailable` is reported back to the caller and is not an error state.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// El resolver no encontró nada o el proveedor falló
    #[error("Could not resolve track: {0}")]
    ResolutionFailure(String),

    /// El proceso decodificador no arrancó o murió
    #[error("Decoder failure: {0}")]
    DecodeFailure(String),

    /// Caché deshabilitada (track largo o en vivo): no hay seek ni restart
    #[error("Seeking is unavailable for this track (no frame cache)")]
    SeekUnavailable,

    /// El bot fue removido del canal de voz
    #[error("Voice sink disconnected")]
    SinkDisconnected,

    #[error("Position {index} is out of range (queue has {len} tracks)")]
    OutOfRange { index: usize, len: usize },

    #[error("Queue is full (max {0} tracks)")]
    QueueFull(usize),

    #[error("Nothing is playing")]
    NothingPlaying,

    #[error("Not connected to a voice channel")]
    NotConnected,

    #[error("Player for this session was destroyed")]
    PlayerDestroyed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
