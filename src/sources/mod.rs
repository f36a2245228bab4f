pub mod invidious;
pub mod soundcloud;
pub mod ytdlp;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::{audio::track::Track, error::Result};

pub use invidious::InvidiousClient;
pub use soundcloud::SoundCloudClient;
pub use ytdlp::YtDlpResolver;

/// Capacidad de resolución de tracks; cada proveedor la implementa a su manera
#[async_trait]
pub trait TrackResolver: Send + Sync {
    /// Busca un track por URL o texto; `ResolutionFailure` si no hay resultados
    async fn resolve(&self, query: &str, provider: Provider) -> Result<Track>;

    /// Hasta `amount` tracks: todos los de una playlist o los primeros
    /// resultados de una búsqueda. Nunca devuelve una lista vacía.
    async fn resolve_many(&self, query: &str, provider: Provider, amount: usize) -> Result<Vec<Track>>;

    /// Track relacionado para autoplay
    async fn related(&self, track: &Track) -> Result<Option<Track>>;

    /// URL reproducible y fresca (las URLs de stream expiran)
    async fn stream_url(&self, track: &Track) -> Result<String>;
}

/// Tipos de fuentes de música
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    YouTube,
    YouTubeMusic,
    SoundCloud,
    Direct,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::YouTube => "youtube",
            Provider::YouTubeMusic => "ytmusic",
            Provider::SoundCloud => "soundcloud",
            Provider::Direct => "direct",
        }
    }

    /// Deduce el proveedor a partir del extractor reportado por yt-dlp
    pub fn from_extractor(extractor: &str, requested: Provider) -> Self {
        let extractor = extractor.to_lowercase();
        if extractor.contains("soundcloud") {
            Provider::SoundCloud
        } else if extractor.contains("youtube") {
            if requested == Provider::YouTubeMusic {
                Provider::YouTubeMusic
            } else {
                Provider::YouTube
            }
        } else {
            Provider::Direct
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "youtube" | "yt" => Ok(Provider::YouTube),
            "ytmusic" | "youtube-music" => Ok(Provider::YouTubeMusic),
            "soundcloud" | "sc" => Ok(Provider::SoundCloud),
            "direct" | "url" => Ok(Provider::Direct),
            other => Err(format!("Unknown provider: {}", other)),
        }
    }
}
