//! # Audio Module
//!
//! Native playback engine: one player per voice session, fed by a frame cached
//! decoder source.
//!
//! ## Architecture
//!
//! ### [`frame_cache`] - Frame Cache Source
//! - Wraps one decoder process for one track
//! - Records every decoded frame so seek and repeat replay from memory
//! - Caching is skipped for live streams and tracks over the ceiling
//!
//! ### [`track`] / [`queue`] - Tracks and Queue
//! - Immutable track metadata plus a lazy [`track::SourceFactory`]
//! - FIFO queue with 1-based, validated positions
//!
//! ### [`player`] - Player
//! - Actor per guild: Idle, Loading, Playing, Paused, Destroyed
//! - Repeat, autoplay, stop policy and seek
//! - Drives a dedicated real-time thread ([`pump`]) per track
//!
//! ### [`session`] - Session Manager
//! - Registry of live players keyed by guild
//! - Entries are removed by the player itself when it is destroyed
//!
//! ## Audio Format
//!
//! - **Sample Rate**: 48kHz (Discord standard)
//! - **Bit Depth**: 16-bit signed integers
//! - **Channels**: Stereo (2 channels)
//! - **Frame**: 20ms, 3840 bytes; the voice sink does the Opus encoding
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use guild_audio::{
//!     audio::{decoder::FfmpegLauncher, session::SessionManager, sink::FileSink},
//!     config::Config,
//!     sources::{Provider, YtDlpResolver},
//! };
//! use serenity::model::id::{GuildId, UserId};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = Arc::new(Config::load()?);
//! let resolver = Arc::new(YtDlpResolver::new(&config)?);
//! let launcher = Arc::new(FfmpegLauncher::new(config.ffmpeg_path.clone()));
//! let (sessions, mut events) = SessionManager::new(config, resolver, launcher);
//!
//! let guild_id = GuildId::new(123456789);
//! sessions.join(guild_id, Arc::new(FileSink::create("out.pcm")?));
//! sessions.request(guild_id, "lofi hip hop", Provider::YouTube, UserId::new(1)).await?;
//!
//! while let Some(event) = events.recv().await {
//!     println!("{}", event);
//! }
//! # Ok(())
//! # }
//! ```

pub mod decoder;
pub mod events;
pub mod frame_cache;
pub mod player;
pub mod pump;
pub mod queue;
pub mod session;
pub mod sink;
pub mod track;

#[cfg(test)]
pub(crate) mod testing;

pub use events::PlayerEvent;
pub use player::{PlayerHandle, PlayerSnapshot, PlayerStatus};
pub use session::SessionManager;
pub use track::Track;
