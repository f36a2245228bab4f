use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serenity::model::id::UserId;
use std::{fmt, sync::Arc, time::Duration};
use tracing::{debug, info};

use super::{decoder::DecoderLauncher, frame_cache::FrameCacheSource};
use crate::{
    error::{EngineError, Result},
    sources::{Provider, TrackResolver},
};

/// Metadatos inmutables de un track.
///
/// Se construye con [`Track::new`] y los métodos `with_*`, que consumen el valor
/// y devuelven uno nuevo; una vez en la cola nunca se modifica.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    id: String,
    title: String,
    author: String,
    duration_seconds: u64,
    origin_uri: String,
    provider: Provider,
    is_live_stream: bool,
    requested_by: Option<UserId>,
    requested_at: DateTime<Utc>,
}

impl Track {
    pub fn new(id: impl Into<String>, title: impl Into<String>, origin_uri: impl Into<String>, provider: Provider) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: "Unknown artist".to_string(),
            duration_seconds: 0,
            origin_uri: origin_uri.into(),
            provider,
            is_live_stream: false,
            requested_by: None,
            requested_at: Utc::now(),
        }
    }

    // Getters
    pub fn id(&self) -> &str {
        &self.id
    }
    pub fn title(&self) -> &str {
        &self.title
    }
    pub fn author(&self) -> &str {
        &self.author
    }
    /// 0 = desconocida o en vivo
    pub fn duration_seconds(&self) -> u64 {
        self.duration_seconds
    }
    pub fn origin_uri(&self) -> &str {
        &self.origin_uri
    }
    pub fn provider(&self) -> Provider {
        self.provider
    }
    pub fn is_live_stream(&self) -> bool {
        self.is_live_stream
    }
    pub fn requested_by(&self) -> Option<UserId> {
        self.requested_by
    }
    pub fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }

    // Builders
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_duration(mut self, seconds: u64) -> Self {
        self.duration_seconds = seconds;
        self
    }

    pub fn with_live_stream(mut self, live: bool) -> Self {
        self.is_live_stream = live;
        self
    }

    pub fn with_requested_by(mut self, user_id: UserId) -> Self {
        self.requested_by = Some(user_id);
        self
    }

    /// Solo se cachean frames de tracks con duración conocida bajo el techo
    pub fn can_cache(&self, ceiling_secs: u64) -> bool {
        !self.is_live_stream && self.duration_seconds > 0 && self.duration_seconds < ceiling_secs
    }

    /// Materializa la fuente de audio justo antes de reproducir
    pub async fn open_source(&self, factory: &SourceFactory) -> Result<FrameCacheSource> {
        factory.open(self).await
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} by {}", self.title, self.author)?;
        if self.is_live_stream {
            write!(f, " [live]")
        } else if self.duration_seconds > 0 {
            write!(
                f,
                " [{}]",
                humantime::format_duration(Duration::from_secs(self.duration_seconds))
            )
        } else {
            Ok(())
        }
    }
}

/// Fábrica perezosa de fuentes: URL de stream fresca + proceso decodificador
#[derive(Clone)]
pub struct SourceFactory {
    resolver: Arc<dyn TrackResolver>,
    launcher: Arc<dyn DecoderLauncher>,
    cache_ceiling_secs: u64,
}

impl SourceFactory {
    pub fn new(resolver: Arc<dyn TrackResolver>, launcher: Arc<dyn DecoderLauncher>, cache_ceiling_secs: u64) -> Self {
        Self {
            resolver,
            launcher,
            cache_ceiling_secs,
        }
    }

    pub async fn open(&self, track: &Track) -> Result<FrameCacheSource> {
        // las URLs de stream expiran: siempre se piden al momento de reproducir
        let stream_url = self.resolver.stream_url(track).await?;
        debug!("URL de stream obtenida para {}", track.title());

        let launcher = self.launcher.clone();
        let decoder = tokio::task::spawn_blocking(move || launcher.launch(&stream_url))
            .await
            .map_err(|e| EngineError::DecodeFailure(format!("decoder launch task failed: {}", e)))??;

        let can_cache = track.can_cache(self.cache_ceiling_secs);
        info!("🎚️ Fuente lista para {} (cache={})", track.title(), can_cache);
        Ok(FrameCacheSource::new(decoder, can_cache))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::{track, ScriptedLauncher, ScriptedResolver};

    #[test]
    fn cache_ceiling_excludes_long_live_and_unknown_tracks() {
        assert!(track("a", 180).can_cache(600));
        assert!(!track("b", 600).can_cache(600));
        assert!(!track("c", 0).can_cache(600));
        assert!(!track("d", 120).with_live_stream(true).can_cache(600));
    }

    #[test]
    fn builders_produce_new_values() {
        let base = track("a", 180);
        let other = base.clone().with_author("Someone");
        assert_eq!(base.author(), "Unknown artist");
        assert_eq!(other.author(), "Someone");
        assert_ne!(base, other);
    }

    #[test]
    fn display_shows_duration_or_live_marker() {
        let t = track("a", 185).with_author("Band");
        assert_eq!(t.to_string(), "Track a by Band [3m 5s]");
        let live = track("r", 0).with_live_stream(true);
        assert!(live.to_string().ends_with("[live]"));
    }

    #[tokio::test]
    async fn open_source_fetches_a_fresh_stream_url_each_time() {
        let resolver = Arc::new(ScriptedResolver::new());
        let launcher = Arc::new(ScriptedLauncher::new());
        launcher.script("stream://a", 3);
        let factory = SourceFactory::new(resolver.clone(), launcher.clone(), 600);

        let t = track("a", 180);
        let first = t.open_source(&factory).await.unwrap();
        let _second = t.open_source(&factory).await.unwrap();

        assert!(first.is_cacheable());
        assert_eq!(resolver.stream_url_calls(), 2);
        assert_eq!(launcher.launches("stream://a"), 2);
    }

    #[tokio::test]
    async fn open_source_surfaces_resolution_and_decode_failures() {
        let resolver = Arc::new(ScriptedResolver::new());
        let launcher = Arc::new(ScriptedLauncher::new());
        resolver.fail_stream("gone");
        launcher.fail_launch("stream://broken");
        let factory = SourceFactory::new(resolver, launcher, 600);

        let err = factory.open(&track("gone", 100)).await.err().unwrap();
        assert!(matches!(err, EngineError::ResolutionFailure(_)));

        let err = factory.open(&track("broken", 100)).await.err().unwrap();
        assert!(matches!(err, EngineError::DecodeFailure(_)));
    }
}
