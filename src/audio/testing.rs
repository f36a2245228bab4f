//! In-memory decoders, resolvers and sinks shared by the engine tests.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use super::{
    decoder::{Decoder, DecoderLauncher},
    events::{EventReceiver, PlayerEvent},
    sink::VoiceSink,
    track::Track,
};
use crate::{
    config::Config,
    error::{EngineError, Result},
    sources::{Provider, TrackResolver},
};

pub fn track(id: &str, secs: u64) -> Track {
    Track::new(id, format!("Track {}", id), format!("https://example.com/{}", id), Provider::YouTube)
        .with_duration(secs)
}

pub fn test_config(pacing: bool) -> Config {
    Config {
        realtime_pacing: pacing,
        ..Config::default()
    }
}

pub async fn next_event(events: &mut EventReceiver) -> PlayerEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for a player event")
        .expect("event channel closed")
}

/// Decoder con frames numerados: el frame `i` contiene `i` en little endian
pub struct ScriptedDecoder {
    total: usize,
    fail_after: Option<usize>,
    release: Option<Arc<AtomicBool>>,
    produced: AtomicUsize,
    pulls: AtomicUsize,
    kills: AtomicUsize,
    killed: AtomicBool,
}

impl ScriptedDecoder {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            fail_after: None,
            release: None,
            produced: AtomicUsize::new(0),
            pulls: AtomicUsize::new(0),
            kills: AtomicUsize::new(0),
            killed: AtomicBool::new(false),
        }
    }

    pub fn failing_after(frames: usize) -> Self {
        Self {
            fail_after: Some(frames),
            ..Self::new(usize::MAX)
        }
    }

    /// Bloquea cada lectura hasta que `release` sea `true` o el decoder muera
    pub fn held(total: usize, release: Arc<AtomicBool>) -> Self {
        Self {
            release: Some(release),
            ..Self::new(total)
        }
    }

    pub fn frame(index: usize) -> Bytes {
        Bytes::copy_from_slice(&(index as u32).to_le_bytes())
    }

    pub fn index_of(frame: &Bytes) -> usize {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&frame[..4]);
        u32::from_le_bytes(raw) as usize
    }

    pub fn pulls(&self) -> usize {
        self.pulls.load(Ordering::SeqCst)
    }

    pub fn kills(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }

    pub fn is_killed(&self) -> bool {
        self.killed.load(Ordering::SeqCst)
    }
}

impl Decoder for ScriptedDecoder {
    fn read_frame(&self) -> Result<Option<Bytes>> {
        self.pulls.fetch_add(1, Ordering::SeqCst);

        if let Some(release) = &self.release {
            while !release.load(Ordering::SeqCst) && !self.is_killed() {
                std::thread::sleep(Duration::from_millis(1));
            }
        }
        if self.is_killed() {
            return Ok(None);
        }

        let produced = self.produced.load(Ordering::SeqCst);
        if self.fail_after.is_some_and(|n| produced >= n) {
            return Err(EngineError::DecodeFailure("scripted failure".to_string()));
        }
        if produced >= self.total {
            return Ok(None);
        }

        self.produced.fetch_add(1, Ordering::SeqCst);
        Ok(Some(Self::frame(produced)))
    }

    fn kill(&self) {
        self.kills.fetch_add(1, Ordering::SeqCst);
        self.killed.store(true, Ordering::SeqCst);
    }
}

#[derive(Clone)]
enum Script {
    Frames(usize),
    Held(usize, Arc<AtomicBool>),
    FailAfter(usize),
    Fail,
}

/// Launcher que crea `ScriptedDecoder`s según la URL de stream
pub struct ScriptedLauncher {
    scripts: Mutex<HashMap<String, Script>>,
    launched: Mutex<Vec<(String, Arc<ScriptedDecoder>)>>,
}

impl ScriptedLauncher {
    pub const DEFAULT_FRAMES: usize = 5;

    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            launched: Mutex::new(Vec::new()),
        }
    }

    pub fn script(&self, url: &str, frames: usize) {
        self.scripts.lock().insert(url.to_string(), Script::Frames(frames));
    }

    /// Los decoders de `url` bloquean hasta que se active el flag devuelto
    pub fn hold(&self, url: &str, frames: usize) -> Arc<AtomicBool> {
        let release = Arc::new(AtomicBool::new(false));
        self.scripts
            .lock()
            .insert(url.to_string(), Script::Held(frames, release.clone()));
        release
    }

    /// El decoder entrega `frames` y después falla
    pub fn fail_after(&self, url: &str, frames: usize) {
        self.scripts.lock().insert(url.to_string(), Script::FailAfter(frames));
    }

    pub fn fail_launch(&self, url: &str) {
        self.scripts.lock().insert(url.to_string(), Script::Fail);
    }

    pub fn launches(&self, url: &str) -> usize {
        self.launched.lock().iter().filter(|(u, _)| u == url).count()
    }

    pub fn decoders(&self, url: &str) -> Vec<Arc<ScriptedDecoder>> {
        self.launched
            .lock()
            .iter()
            .filter(|(u, _)| u == url)
            .map(|(_, d)| d.clone())
            .collect()
    }
}

impl DecoderLauncher for ScriptedLauncher {
    fn launch(&self, stream_url: &str) -> Result<Arc<dyn Decoder>> {
        let script = self
            .scripts
            .lock()
            .get(stream_url)
            .cloned()
            .unwrap_or(Script::Frames(Self::DEFAULT_FRAMES));

        let decoder = Arc::new(match script {
            Script::Frames(n) => ScriptedDecoder::new(n),
            Script::Held(n, release) => ScriptedDecoder::held(n, release),
            Script::FailAfter(n) => ScriptedDecoder::failing_after(n),
            Script::Fail => return Err(EngineError::DecodeFailure(format!("cannot decode {}", stream_url))),
        });

        self.launched.lock().push((stream_url.to_string(), decoder.clone()));
        Ok(decoder)
    }
}

/// Resolver en memoria; la URL de stream de un track es `stream://{id}`
pub struct ScriptedResolver {
    tracks: Mutex<HashMap<String, Track>>,
    playlists: Mutex<HashMap<String, Vec<Track>>>,
    failing_streams: Mutex<HashSet<String>>,
    related: Mutex<Option<Track>>,
    stream_calls: AtomicUsize,
    related_calls: AtomicUsize,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self {
            tracks: Mutex::new(HashMap::new()),
            playlists: Mutex::new(HashMap::new()),
            failing_streams: Mutex::new(HashSet::new()),
            related: Mutex::new(None),
            stream_calls: AtomicUsize::new(0),
            related_calls: AtomicUsize::new(0),
        }
    }

    pub fn add(&self, query: &str, track: Track) {
        self.tracks.lock().insert(query.to_string(), track);
    }

    pub fn add_playlist(&self, query: &str, tracks: Vec<Track>) {
        self.playlists.lock().insert(query.to_string(), tracks);
    }

    pub fn fail_stream(&self, id: &str) {
        self.failing_streams.lock().insert(id.to_string());
    }

    /// El próximo `related` devuelve este track (una sola vez)
    pub fn set_related(&self, track: Track) {
        *self.related.lock() = Some(track);
    }

    pub fn stream_url_calls(&self) -> usize {
        self.stream_calls.load(Ordering::SeqCst)
    }

    pub fn related_calls(&self) -> usize {
        self.related_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TrackResolver for ScriptedResolver {
    async fn resolve(&self, query: &str, _provider: Provider) -> Result<Track> {
        self.tracks
            .lock()
            .get(query)
            .cloned()
            .ok_or_else(|| EngineError::ResolutionFailure(format!("no results for {}", query)))
    }

    async fn resolve_many(&self, query: &str, provider: Provider, amount: usize) -> Result<Vec<Track>> {
        let playlist = self.playlists.lock().get(query).cloned();
        match playlist {
            Some(tracks) => Ok(tracks.into_iter().take(amount.max(1)).collect()),
            None => Ok(vec![self.resolve(query, provider).await?]),
        }
    }

    async fn related(&self, _track: &Track) -> Result<Option<Track>> {
        self.related_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.related.lock().take())
    }

    async fn stream_url(&self, track: &Track) -> Result<String> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_streams.lock().contains(track.id()) {
            return Err(EngineError::ResolutionFailure(format!("{} is unavailable", track.id())));
        }
        Ok(format!("stream://{}", track.id()))
    }
}

/// Sink que guarda los frames recibidos
pub struct CollectingSink {
    frames: Mutex<Vec<Bytes>>,
    connected: AtomicBool,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self {
            frames: Mutex::new(Vec::new()),
            connected: AtomicBool::new(true),
        }
    }

    pub fn frames(&self) -> Vec<Bytes> {
        self.frames.lock().clone()
    }

    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }
}

impl VoiceSink for CollectingSink {
    fn write(&self, frame: Bytes) -> Result<()> {
        if !self.is_connected() {
            return Err(EngineError::SinkDisconnected);
        }
        self.frames.lock().push(frame);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
