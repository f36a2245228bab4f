use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use super::{InvidiousClient, Provider, SoundCloudClient, TrackResolver};
use crate::{
    audio::track::Track,
    config::Config,
    error::{EngineError, Result},
};

/// Resolver basado en `yt-dlp` (metadatos y URL de stream) + Invidious y
/// SoundCloud (relacionados)
pub struct YtDlpResolver {
    program: String,
    invidious: InvidiousClient,
    soundcloud: Option<SoundCloudClient>,
}

#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    id: Option<String>,
    title: Option<String>,
    uploader: Option<String>,
    channel: Option<String>,
    duration: Option<f64>,
    webpage_url: Option<String>,
    url: Option<String>,
    extractor: Option<String>,
    ie_key: Option<String>,
    is_live: Option<bool>,
    #[serde(default)]
    entries: Vec<YtDlpInfo>,
}

impl YtDlpResolver {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            program: config.ytdlp_path.clone(),
            invidious: InvidiousClient::new(config.invidious_url.clone())?,
            soundcloud: config
                .soundcloud_client_id
                .as_deref()
                .map(SoundCloudClient::new)
                .transpose()?,
        })
    }

    /// Traduce la consulta del usuario al objetivo que entiende yt-dlp
    fn search_target(query: &str, provider: Provider, amount: usize) -> Result<String> {
        let query = query.trim();
        if query.is_empty() {
            return Err(EngineError::ResolutionFailure("empty query".to_string()));
        }

        if is_url(query) {
            return Ok(query.to_string());
        }

        match provider {
            Provider::YouTube => Ok(format!("ytsearch{}:{}", amount, query)),
            Provider::SoundCloud => Ok(format!("scsearch{}:{}", amount, query)),
            Provider::YouTubeMusic => Ok(format!(
                "https://music.youtube.com/search?q={}",
                urlencoding::encode(query)
            )),
            Provider::Direct => Err(EngineError::ResolutionFailure(format!(
                "'{}' is not a playable URL",
                query
            ))),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        let output = tokio::process::Command::new(&self.program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| EngineError::ResolutionFailure(format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::ResolutionFailure(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl TrackResolver for YtDlpResolver {
    async fn resolve(&self, query: &str, provider: Provider) -> Result<Track> {
        self.resolve_many(query, provider, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::ResolutionFailure(format!("no results for '{}'", query)))
    }

    async fn resolve_many(&self, query: &str, provider: Provider, amount: usize) -> Result<Vec<Track>> {
        let amount = amount.max(1);
        info!("🔍 Resolviendo '{}' en {} (hasta {})", query, provider, amount);
        let target = Self::search_target(query, provider, amount)?;
        let items = format!("1-{}", amount);

        let json = self
            .run(&[
                "-J",
                "--flat-playlist",
                "--playlist-items",
                &items,
                "--no-warnings",
                "--default-search",
                "ytsearch",
                &target,
            ])
            .await?;

        let mut tracks = parse_tracks(&json, provider)?;
        tracks.truncate(amount);
        Ok(tracks)
    }

    async fn related(&self, track: &Track) -> Result<Option<Track>> {
        match track.provider() {
            Provider::YouTube | Provider::YouTubeMusic => {
                let Some(video_id) = extract_video_id(track.origin_uri()).or_else(|| {
                    (track.id().len() == 11).then(|| track.id().to_string())
                }) else {
                    warn!("⚠️ No se pudo extraer el video ID de {}", track.origin_uri());
                    return Ok(None);
                };
                self.invidious.random_recommendation(&video_id).await
            }
            Provider::SoundCloud => match &self.soundcloud {
                Some(client) => client.random_related(track.id()).await,
                None => {
                    debug!("Sin SOUNDCLOUD_CLIENT_ID, no hay relacionados para {}", track.title());
                    Ok(None)
                }
            },
            Provider::Direct => Ok(None),
        }
    }

    async fn stream_url(&self, track: &Track) -> Result<String> {
        if track.provider() == Provider::Direct {
            return Ok(track.origin_uri().to_string());
        }

        let stdout = self
            .run(&[
                "-g",
                "-f",
                "bestaudio/best",
                "--no-playlist",
                "--no-warnings",
                track.origin_uri(),
            ])
            .await?;

        stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
            .ok_or_else(|| EngineError::ResolutionFailure(format!("no stream URL for {}", track.title())))
    }
}

fn is_url(query: &str) -> bool {
    url::Url::parse(query)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Convierte la salida de `yt-dlp -J` en tracks; las entradas sin URL se descartan
fn parse_tracks(json: &str, requested: Provider) -> Result<Vec<Track>> {
    let info: YtDlpInfo =
        serde_json::from_str(json).map_err(|e| EngineError::ResolutionFailure(format!("bad yt-dlp output: {}", e)))?;

    let infos = if info.entries.is_empty() {
        vec![info]
    } else {
        info.entries
    };

    let tracks: Vec<Track> = infos
        .into_iter()
        .filter_map(|info| track_from_info(info, requested))
        .collect();

    if tracks.is_empty() {
        return Err(EngineError::ResolutionFailure("no playable results".to_string()));
    }
    Ok(tracks)
}

fn track_from_info(info: YtDlpInfo, requested: Provider) -> Option<Track> {
    let origin = info.webpage_url.or(info.url)?;

    let extractor = info.extractor.or(info.ie_key).unwrap_or_default();
    let provider = Provider::from_extractor(&extractor, requested);
    let is_live = info.is_live.unwrap_or(false);

    let mut track = Track::new(
        info.id.unwrap_or_else(|| origin.clone()),
        info.title.unwrap_or_else(|| "Unknown title".to_string()),
        origin,
        provider,
    )
    .with_duration(info.duration.map(|d| d.round() as u64).unwrap_or(0))
    .with_live_stream(is_live);

    if let Some(author) = info.uploader.or(info.channel) {
        track = track.with_author(author);
    }

    Some(track)
}

/// Extrae el video ID de URLs de YouTube (watch, youtu.be, shorts, music)
pub fn extract_video_id(url: &str) -> Option<String> {
    static VIDEO_ID: OnceLock<Regex> = OnceLock::new();
    let re = VIDEO_ID.get_or_init(|| {
        Regex::new(r"(?:youtube\.com/(?:watch\?(?:.*&)?v=|shorts/|embed/)|youtu\.be/)([A-Za-z0-9_-]{11})")
            .expect("valid video id regex")
    });

    re.captures(url).and_then(|c| c.get(1)).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_targets_per_provider() {
        assert_eq!(
            YtDlpResolver::search_target("never gonna", Provider::YouTube, 1).unwrap(),
            "ytsearch1:never gonna"
        );
        assert_eq!(
            YtDlpResolver::search_target("lofi", Provider::SoundCloud, 5).unwrap(),
            "scsearch5:lofi"
        );
        assert_eq!(
            YtDlpResolver::search_target("a b", Provider::YouTubeMusic, 5).unwrap(),
            "https://music.youtube.com/search?q=a%20b"
        );
        assert_eq!(
            YtDlpResolver::search_target("https://example.com/radio.mp3", Provider::YouTube, 1).unwrap(),
            "https://example.com/radio.mp3"
        );
        assert!(YtDlpResolver::search_target("not a url", Provider::Direct, 1).is_err());
        assert!(YtDlpResolver::search_target("   ", Provider::YouTube, 1).is_err());
    }

    #[test]
    fn parses_single_video_output() {
        let json = r#"{
            "id": "dQw4w9WgXcQ",
            "title": "Never Gonna Give You Up",
            "uploader": "Rick Astley",
            "duration": 212.0,
            "webpage_url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "extractor": "youtube",
            "is_live": false
        }"#;

        let track = parse_tracks(json, Provider::YouTube).unwrap().remove(0);
        assert_eq!(track.id(), "dQw4w9WgXcQ");
        assert_eq!(track.author(), "Rick Astley");
        assert_eq!(track.duration_seconds(), 212);
        assert_eq!(track.provider(), Provider::YouTube);
        assert!(!track.is_live_stream());
    }

    #[test]
    fn parses_search_entries_skipping_those_without_url() {
        let json = r#"{
            "extractor": "youtube:search",
            "entries": [
                {"id": "abcdefghijk", "title": "Radio", "channel": "Station", "url": "https://www.youtube.com/watch?v=abcdefghijk", "ie_key": "Youtube", "is_live": true},
                {"id": "zzzzzzzzzzz", "title": "Other"}
            ]
        }"#;

        let tracks = parse_tracks(json, Provider::YouTube).unwrap();
        assert_eq!(tracks.len(), 1);
        let track = &tracks[0];
        assert_eq!(track.title(), "Radio");
        assert_eq!(track.author(), "Station");
        assert!(track.is_live_stream());
        assert_eq!(track.duration_seconds(), 0);
    }

    #[test]
    fn output_without_url_is_a_resolution_failure() {
        let err = parse_tracks(r#"{"title": "x"}"#, Provider::YouTube).err().unwrap();
        assert!(matches!(err, EngineError::ResolutionFailure(_)));
        assert!(parse_tracks("not json", Provider::YouTube).is_err());
        assert!(parse_tracks(r#"{"entries": [{"title": "x"}]}"#, Provider::YouTube).is_err());
    }

    #[test]
    fn parses_every_playlist_entry_in_order() {
        let json = r#"{
            "id": "PL123",
            "title": "Mix",
            "extractor": "youtube:tab",
            "webpage_url": "https://www.youtube.com/playlist?list=PL123",
            "entries": [
                {"id": "aaaaaaaaaaa", "title": "One", "url": "https://www.youtube.com/watch?v=aaaaaaaaaaa", "ie_key": "Youtube", "duration": 100},
                {"id": "bbbbbbbbbbb", "title": "Two", "url": "https://www.youtube.com/watch?v=bbbbbbbbbbb", "ie_key": "Youtube", "duration": 200},
                {"id": "ccccccccccc", "title": "Three", "url": "https://soundcloud.com/x/three", "ie_key": "Soundcloud"}
            ]
        }"#;

        let tracks = parse_tracks(json, Provider::YouTube).unwrap();
        let titles: Vec<&str> = tracks.iter().map(|t| t.title()).collect();
        assert_eq!(titles, vec!["One", "Two", "Three"]);
        assert_eq!(tracks[1].duration_seconds(), 200);
        assert_eq!(tracks[2].provider(), Provider::SoundCloud);
    }

    #[test]
    fn video_id_extraction() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(extract_video_id("https://youtu.be/dQw4w9WgXcQ").as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(
            extract_video_id("https://music.youtube.com/watch?list=x&v=dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(extract_video_id("https://example.com/video"), None);
    }
}
