use rand::seq::SliceRandom;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::{
    audio::track::Track,
    error::{EngineError, Result},
    sources::Provider,
};

const API_BASE: &str = "https://api-v2.soundcloud.com";

/// Cliente de la API v2 de SoundCloud, solo para tracks relacionados (autoplay)
pub struct SoundCloudClient {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
}

/// La API devuelve `{"collection": [...]}`, versiones viejas una lista directa
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RelatedResponse {
    Collection { collection: Vec<RelatedTrack> },
    List(Vec<RelatedTrack>),
}

impl RelatedResponse {
    fn into_tracks(self) -> Vec<RelatedTrack> {
        match self {
            RelatedResponse::Collection { collection } => collection,
            RelatedResponse::List(tracks) => tracks,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RelatedTrack {
    id: u64,
    title: String,
    permalink_url: String,
    /// Milisegundos
    duration: Option<u64>,
    user: Option<RelatedUser>,
}

#[derive(Debug, Clone, Deserialize)]
struct RelatedUser {
    username: String,
}

impl SoundCloudClient {
    pub fn new(client_id: impl Into<String>) -> Result<Self> {
        Self::with_base_url(API_BASE, client_id)
    }

    pub fn with_base_url(base_url: impl Into<String>, client_id: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| EngineError::ResolutionFailure(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
        })
    }

    /// Elige al azar uno de los tracks relacionados con `track_id`
    pub async fn random_related(&self, track_id: &str) -> Result<Option<Track>> {
        let url = format!("{}/tracks/{}/related", self.base_url, track_id);
        debug!("🔗 Pidiendo relacionados de SoundCloud: {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("client_id", self.client_id.as_str()),
                ("limit", "5"),
                ("offset", "0"),
            ])
            .send()
            .await
            .map_err(|e| EngineError::ResolutionFailure(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EngineError::ResolutionFailure(format!(
                "SoundCloud returned {} for {}",
                response.status(),
                track_id
            )));
        }

        let body: RelatedResponse = response
            .json()
            .await
            .map_err(|e| EngineError::ResolutionFailure(e.to_string()))?;

        let picked = pick_related(body.into_tracks());
        if let Some(track) = &picked {
            info!("📻 Relacionado elegido en SoundCloud: {}", track.title());
        }
        Ok(picked)
    }
}

fn pick_related(tracks: Vec<RelatedTrack>) -> Option<Track> {
    let mut rng = rand::thread_rng();
    let related = tracks.choose(&mut rng)?.clone();

    let mut track = Track::new(
        related.id.to_string(),
        related.title,
        related.permalink_url,
        Provider::SoundCloud,
    )
    .with_duration(related.duration.unwrap_or(0) / 1000);

    if let Some(user) = related.user {
        track = track.with_author(user.username);
    }
    Some(track)
}
