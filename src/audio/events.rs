use serenity::model::id::GuildId;
use std::fmt;
use tokio::sync::mpsc;

use super::track::Track;

/// Eventos que la capa de comandos convierte en mensajes para el usuario
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    NowPlaying { guild_id: GuildId, track: Track },
    QueueEmpty { guild_id: GuildId },
    TrackError { guild_id: GuildId, track: Track, reason: String },
    /// `reason` presente cuando la sesión terminó por un error fatal
    Destroyed { guild_id: GuildId, reason: Option<String> },
}

impl PlayerEvent {
    pub fn guild_id(&self) -> GuildId {
        match self {
            PlayerEvent::NowPlaying { guild_id, .. }
            | PlayerEvent::QueueEmpty { guild_id }
            | PlayerEvent::TrackError { guild_id, .. }
            | PlayerEvent::Destroyed { guild_id, .. } => *guild_id,
        }
    }
}

impl fmt::Display for PlayerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerEvent::NowPlaying { track, .. } => write!(f, "Now playing: {}", track),
            PlayerEvent::QueueEmpty { .. } => write!(f, "The queue is empty"),
            PlayerEvent::TrackError { track, reason, .. } => {
                write!(f, "There was an error processing {}: {}", track.title(), reason)
            }
            PlayerEvent::Destroyed { reason: Some(reason), .. } => {
                write!(f, "Disconnected because of an error: {}", reason)
            }
            PlayerEvent::Destroyed { reason: None, .. } => write!(f, "Disconnected from voice"),
        }
    }
}

pub type EventSender = mpsc::UnboundedSender<PlayerEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<PlayerEvent>;
