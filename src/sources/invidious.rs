use rand::seq::SliceRandom;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::{
    audio::track::Track,
    error::{EngineError, Result},
    sources::Provider,
};

/// Cliente mínimo de la API de Invidious para recomendaciones (autoplay)
pub struct InvidiousClient {
    client: reqwest::Client,
    instance: String,
}

#[derive(Debug, Deserialize)]
struct RecommendedResponse {
    #[serde(rename = "recommendedVideos", default)]
    recommended_videos: Vec<RecommendedVideo>,
}

#[derive(Debug, Clone, Deserialize)]
struct RecommendedVideo {
    #[serde(rename = "videoId")]
    video_id: String,
    title: String,
    author: Option<String>,
    #[serde(rename = "lengthSeconds")]
    length_seconds: Option<u64>,
}

impl InvidiousClient {
    pub fn new(instance: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| EngineError::ResolutionFailure(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            instance: instance.into().trim_end_matches('/').to_string(),
        })
    }

    /// Elige al azar uno de los videos recomendados para `video_id`
    pub async fn random_recommendation(&self, video_id: &str) -> Result<Option<Track>> {
        let url = format!("{}/api/v1/videos/{}?fields=recommendedVideos", self.instance, video_id);
        debug!("🔗 Pidiendo recomendaciones: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| EngineError::ResolutionFailure(e.to_string()))?;

        if !response.status().is_success() {
            return Err(EngineError::ResolutionFailure(format!(
                "Invidious returned {} for {}",
                response.status(),
                video_id
            )));
        }

        let body: RecommendedResponse = response
            .json()
            .await
            .map_err(|e| EngineError::ResolutionFailure(e.to_string()))?;

        let picked = pick_recommendation(body.recommended_videos);
        if let Some(track) = &picked {
            info!("📻 Recomendación elegida: {}", track.title());
        }
        Ok(picked)
    }
}

fn pick_recommendation(videos: Vec<RecommendedVideo>) -> Option<Track> {
    let mut rng = rand::thread_rng();
    let video = videos.choose(&mut rng)?.clone();

    let mut track = Track::new(
        video.video_id.clone(),
        video.title,
        format!("https://www.youtube.com/watch?v={}", video.video_id),
        Provider::YouTube,
    )
    .with_duration(video.length_seconds.unwrap_or(0));

    if let Some(author) = video.author {
        track = track.with_author(author);
    }
    Some(track)
}
