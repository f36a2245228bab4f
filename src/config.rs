use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    // Procesos externos
    pub ffmpeg_path: String,
    pub ytdlp_path: String,
    pub invidious_url: String,
    pub soundcloud_client_id: Option<String>,

    // Audio
    pub cache_ceiling_secs: u64,
    pub realtime_pacing: bool,

    // Cola y reproductor
    pub max_queue_size: usize,
    pub command_buffer: usize,
    pub stop_clears_queue: bool,
    pub default_autoplay: bool,
    pub now_playing_messages: bool,

    // Votaciones
    pub vote_timeout_secs: u64,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            ffmpeg_path: std::env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            ytdlp_path: std::env::var("YTDLP_PATH").unwrap_or_else(|_| "yt-dlp".to_string()),
            invidious_url: std::env::var("INVIDIOUS_URL")
                .unwrap_or_else(|_| "https://yewtu.be".to_string()),
            soundcloud_client_id: std::env::var("SOUNDCLOUD_CLIENT_ID")
                .ok()
                .filter(|id| !id.trim().is_empty()),

            cache_ceiling_secs: std::env::var("CACHE_CEILING_SECS")
                .unwrap_or_else(|_| "600".to_string()) // 10 minutos
                .parse()?,
            realtime_pacing: std::env::var("REALTIME_PACING")
                .unwrap_or_else(|_| "true".to_string())
                .parse()?,

            max_queue_size: std::env::var("MAX_QUEUE_SIZE")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()?,
            command_buffer: std::env::var("COMMAND_BUFFER")
                .unwrap_or_else(|_| "32".to_string())
                .parse()?,
            stop_clears_queue: std::env::var("STOP_CLEARS_QUEUE")
                .unwrap_or_else(|_| "true".to_string())
                .parse()?,
            default_autoplay: std::env::var("DEFAULT_AUTOPLAY")
                .unwrap_or_else(|_| "false".to_string())
                .parse()?,
            now_playing_messages: std::env::var("NOW_PLAYING_MESSAGES")
                .unwrap_or_else(|_| "true".to_string())
                .parse()?,

            vote_timeout_secs: std::env::var("VOTE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "15".to_string())
                .parse()?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validates configuration values for correctness.
    ///
    /// # Validation Rules
    ///
    /// - Cache ceiling, queue size and command buffer must be greater than 0
    /// - Vote timeout must be between 1 and 300 seconds
    /// - Executable paths must not be empty
    pub fn validate(&self) -> Result<()> {
        if self.cache_ceiling_secs == 0 {
            anyhow::bail!("Cache ceiling must be greater than 0");
        }

        if self.max_queue_size == 0 {
            anyhow::bail!("Max queue size must be greater than 0");
        }

        if self.command_buffer == 0 {
            anyhow::bail!("Command buffer must be greater than 0");
        }

        if self.vote_timeout_secs == 0 || self.vote_timeout_secs > 300 {
            anyhow::bail!(
                "Vote timeout must be between 1 and 300 seconds, got: {}",
                self.vote_timeout_secs
            );
        }

        if self.ffmpeg_path.trim().is_empty() || self.ytdlp_path.trim().is_empty() {
            anyhow::bail!("ffmpeg and yt-dlp paths must not be empty");
        }

        url::Url::parse(&self.invidious_url)
            .map_err(|e| anyhow::anyhow!("Invalid INVIDIOUS_URL '{}': {}", self.invidious_url, e))?;

        Ok(())
    }

    pub fn vote_timeout(&self) -> Duration {
        Duration::from_secs(self.vote_timeout_secs)
    }

    /// Returns a summary of the current configuration for logging.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Decoder: {} (pacing={})\n  \
            Resolver: {} (related via {}, soundcloud related={})\n  \
            Cache: frames cached for tracks under {}\n  \
            Queue: {} max, stop clears queue={}\n  \
            Defaults: autoplay={}, now playing messages={}\n  \
            Votes: {} per round",
            self.ffmpeg_path,
            self.realtime_pacing,
            self.ytdlp_path,
            self.invidious_url,
            self.soundcloud_client_id.is_some(),
            humantime::format_duration(Duration::from_secs(self.cache_ceiling_secs)),
            self.max_queue_size,
            self.stop_clears_queue,
            self.default_autoplay,
            self.now_playing_messages,
            humantime::format_duration(self.vote_timeout()),
        )
    }
}

/// Default configuration values.
///
/// Used as fallbacks when environment variables are not provided.
impl Default for Config {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ytdlp_path: "yt-dlp".to_string(),
            invidious_url: "https://yewtu.be".to_string(),
            soundcloud_client_id: None,

            cache_ceiling_secs: 600,
            realtime_pacing: true,

            max_queue_size: 1000,
            command_buffer: 32,
            stop_clears_queue: true,
            default_autoplay: false,
            now_playing_messages: true,

            vote_timeout_secs: 15,
        }
    }
}
