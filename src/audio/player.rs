//! Per-guild playback state machine.
//!
//! Each voice session owns one player actor. Control commands arrive through a
//! bounded channel and are applied strictly in arrival order; the actor owns
//! all mutable session state, so no locks are needed outside the frame cache.
//! Frames flow on a separate real-time thread (see [`super::pump`]).

use serde::Serialize;
use serenity::model::id::GuildId;
use std::{sync::Arc, time::Duration};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use super::{
    decoder::{DecoderLauncher, FRAMES_PER_SECOND},
    events::{EventSender, PlayerEvent},
    frame_cache::FrameCacheSource,
    pump::{self, PlaybackEnd, PumpControl},
    queue::{QueuePage, TrackQueue},
    sink::VoiceSink,
    track::{SourceFactory, Track},
};
use crate::{
    config::Config,
    error::{EngineError, Result},
    sources::TrackResolver,
};

const SINK_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlayerStatus {
    Idle,
    Loading,
    Playing,
    Paused,
    Destroyed,
}

/// Estado de la sesión; solo el actor lo toca
#[derive(Debug)]
struct PlayerState {
    current_track: Option<Track>,
    queue: TrackQueue,
    repeat: bool,
    autoplay: bool,
    stopped: bool,
    np_message_enabled: bool,
    loop_play_count: u32,
}

impl PlayerState {
    fn new(config: &Config) -> Self {
        Self {
            current_track: None,
            queue: TrackQueue::new(config.max_queue_size),
            repeat: false,
            autoplay: config.default_autoplay,
            stopped: false,
            np_message_enabled: config.now_playing_messages,
            loop_play_count: 0,
        }
    }
}

/// Vista de solo lectura del player
#[derive(Debug, Clone, Serialize)]
pub struct PlayerSnapshot {
    pub guild_id: GuildId,
    pub status: PlayerStatus,
    pub current_track: Option<Track>,
    pub position_secs: u64,
    pub seekable: bool,
    pub queue_len: usize,
    pub queue_duration_seconds: u64,
    pub repeat: bool,
    pub autoplay: bool,
    pub np_message_enabled: bool,
    pub loop_play_count: u32,
}

#[derive(Debug, Clone, Copy)]
enum SeekTarget {
    Absolute(u64),
    Relative(i64),
}

enum PlayerCommand {
    Enqueue { tracks: Vec<Track>, reply: oneshot::Sender<Result<usize>> },
    Skip { reply: oneshot::Sender<Result<Track>> },
    Stop { reply: oneshot::Sender<()> },
    SetPaused { paused: Option<bool>, reply: oneshot::Sender<Result<bool>> },
    Seek { target: SeekTarget, reply: oneshot::Sender<Result<u64>> },
    Remove { position: usize, reply: oneshot::Sender<Result<Track>> },
    Move { from: usize, to: usize, reply: oneshot::Sender<Result<()>> },
    MoveRelative { position: usize, diff: usize, reply: oneshot::Sender<Result<()>> },
    Swap { first: usize, second: usize, reply: oneshot::Sender<Result<()>> },
    Shuffle { reply: oneshot::Sender<()> },
    Clear { reply: oneshot::Sender<usize> },
    SetRepeat { value: Option<bool>, reply: oneshot::Sender<bool> },
    SetAutoplay { value: Option<bool>, reply: oneshot::Sender<bool> },
    SetNowPlaying { value: Option<bool>, reply: oneshot::Sender<bool> },
    Queue { page: usize, per_page: usize, reply: oneshot::Sender<QueuePage> },
    Snapshot { reply: oneshot::Sender<PlayerSnapshot> },
    Disconnect { reason: Option<String>, reply: oneshot::Sender<()> },
}

/// Dependencias compartidas por todos los players
#[derive(Clone)]
pub struct PlayerContext {
    pub config: Arc<Config>,
    pub resolver: Arc<dyn TrackResolver>,
    pub factory: SourceFactory,
    pub events: EventSender,
}

impl PlayerContext {
    pub fn new(
        config: Arc<Config>,
        resolver: Arc<dyn TrackResolver>,
        launcher: Arc<dyn DecoderLauncher>,
        events: EventSender,
    ) -> Self {
        let factory = SourceFactory::new(resolver.clone(), launcher, config.cache_ceiling_secs);
        Self {
            config,
            resolver,
            factory,
            events,
        }
    }
}

/// Se ejecuta una sola vez cuando el player entra en `Destroyed`
pub type OnDestroy = Box<dyn FnOnce() + Send + 'static>;

/// Handle clonable para enviar comandos a un player
#[derive(Clone)]
pub struct PlayerHandle {
    tx: mpsc::Sender<PlayerCommand>,
    guild_id: GuildId,
    session_id: u64,
}

impl PlayerHandle {
    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    /// `true` cuando el actor ya terminó
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> PlayerCommand) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| EngineError::PlayerDestroyed)?;
        rx.await.map_err(|_| EngineError::PlayerDestroyed)
    }

    /// Agrega un track; devuelve la posición 1-based que ocupó en la cola
    pub async fn enqueue(&self, track: Track) -> Result<usize> {
        self.request(|reply| PlayerCommand::Enqueue { tracks: vec![track], reply }).await?
    }

    /// Agrega varios tracks; devuelve cuántos entraron
    pub async fn enqueue_many(&self, tracks: Vec<Track>) -> Result<usize> {
        self.request(|reply| PlayerCommand::Enqueue { tracks, reply }).await?
    }

    /// Salta el track actual y devuelve el que estaba sonando
    pub async fn skip(&self) -> Result<Track> {
        self.request(|reply| PlayerCommand::Skip { reply }).await?
    }

    pub async fn stop(&self) -> Result<()> {
        self.request(|reply| PlayerCommand::Stop { reply }).await
    }

    pub async fn pause(&self) -> Result<bool> {
        self.request(|reply| PlayerCommand::SetPaused { paused: Some(true), reply }).await?
    }

    /// Reanuda; si el player quedó inactivo con tracks en cola, arranca el siguiente
    pub async fn resume(&self) -> Result<bool> {
        self.request(|reply| PlayerCommand::SetPaused { paused: Some(false), reply }).await?
    }

    pub async fn toggle_pause(&self) -> Result<bool> {
        self.request(|reply| PlayerCommand::SetPaused { paused: None, reply }).await?
    }

    /// Salta a `secs` desde el inicio del track; devuelve la posición final
    pub async fn seek_to(&self, secs: u64) -> Result<u64> {
        self.request(|reply| PlayerCommand::Seek { target: SeekTarget::Absolute(secs), reply })
            .await?
    }

    /// Avanza (o retrocede con valores negativos) `delta_secs` segundos
    pub async fn seek_by(&self, delta_secs: i64) -> Result<u64> {
        self.request(|reply| PlayerCommand::Seek { target: SeekTarget::Relative(delta_secs), reply })
            .await?
    }

    pub async fn remove(&self, position: usize) -> Result<Track> {
        self.request(|reply| PlayerCommand::Remove { position, reply }).await?
    }

    pub async fn move_track(&self, from: usize, to: usize) -> Result<()> {
        self.request(|reply| PlayerCommand::Move { from, to, reply }).await?
    }

    pub async fn move_relative(&self, position: usize, diff: usize) -> Result<()> {
        self.request(|reply| PlayerCommand::MoveRelative { position, diff, reply }).await?
    }

    pub async fn swap(&self, first: usize, second: usize) -> Result<()> {
        self.request(|reply| PlayerCommand::Swap { first, second, reply }).await?
    }

    pub async fn shuffle(&self) -> Result<()> {
        self.request(|reply| PlayerCommand::Shuffle { reply }).await
    }

    pub async fn clear(&self) -> Result<usize> {
        self.request(|reply| PlayerCommand::Clear { reply }).await
    }

    pub async fn set_repeat(&self, value: bool) -> Result<bool> {
        self.request(|reply| PlayerCommand::SetRepeat { value: Some(value), reply }).await
    }

    pub async fn toggle_repeat(&self) -> Result<bool> {
        self.request(|reply| PlayerCommand::SetRepeat { value: None, reply }).await
    }

    pub async fn set_autoplay(&self, value: bool) -> Result<bool> {
        self.request(|reply| PlayerCommand::SetAutoplay { value: Some(value), reply }).await
    }

    pub async fn toggle_autoplay(&self) -> Result<bool> {
        self.request(|reply| PlayerCommand::SetAutoplay { value: None, reply }).await
    }

    pub async fn toggle_np_messages(&self) -> Result<bool> {
        self.request(|reply| PlayerCommand::SetNowPlaying { value: None, reply }).await
    }

    pub async fn queue_page(&self, page: usize, per_page: usize) -> Result<QueuePage> {
        self.request(|reply| PlayerCommand::Queue { page, per_page, reply }).await
    }

    pub async fn snapshot(&self) -> Result<PlayerSnapshot> {
        self.request(|reply| PlayerCommand::Snapshot { reply }).await
    }

    /// Destruye el player; `reason` se reporta en el evento `Destroyed`
    pub async fn disconnect(&self, reason: Option<String>) -> Result<()> {
        self.request(|reply| PlayerCommand::Disconnect { reason, reply }).await
    }
}

/// Reproducción en curso: la fuente, sus controles y la señal de fin
struct ActivePlayback {
    source: Arc<FrameCacheSource>,
    control: PumpControl,
    ended: oneshot::Receiver<PlaybackEnd>,
}

struct PlayerActor {
    guild_id: GuildId,
    ctx: PlayerContext,
    sink: Arc<dyn VoiceSink>,
    state: PlayerState,
    status: PlayerStatus,
    active: Option<ActivePlayback>,
    on_destroy: Option<OnDestroy>,
}

/// Crea el actor del player y devuelve su handle
pub fn spawn(
    guild_id: GuildId,
    session_id: u64,
    ctx: PlayerContext,
    sink: Arc<dyn VoiceSink>,
    on_destroy: Option<OnDestroy>,
) -> PlayerHandle {
    let (tx, rx) = mpsc::channel(ctx.config.command_buffer);

    let actor = PlayerActor {
        guild_id,
        state: PlayerState::new(&ctx.config),
        ctx,
        sink,
        status: PlayerStatus::Idle,
        active: None,
        on_destroy,
    };
    tokio::spawn(actor.run(rx));

    PlayerHandle {
        tx,
        guild_id,
        session_id,
    }
}

async fn wait_for_end(active: &mut Option<ActivePlayback>) -> PlaybackEnd {
    match active {
        Some(playback) => (&mut playback.ended)
            .await
            .unwrap_or_else(|_| PlaybackEnd::DecodeFailed("audio thread stopped unexpectedly".to_string())),
        None => std::future::pending().await,
    }
}

impl PlayerActor {
    async fn run(mut self, mut commands: mpsc::Receiver<PlayerCommand>) {
        info!("🎧 Player iniciado para guild {}", self.guild_id);

        let mut sink_check = tokio::time::interval(SINK_POLL_INTERVAL);
        sink_check.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        while self.status != PlayerStatus::Destroyed {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => self.destroy(None).await,
                },
                end = wait_for_end(&mut self.active) => self.on_playback_end(end).await,
                _ = sink_check.tick() => {
                    if !self.sink.is_connected() {
                        self.destroy(Some("voice connection lost".to_string())).await;
                    }
                }
            }
        }

        // los comandos pendientes reciben PlayerDestroyed
        commands.close();
        debug!("Actor del player de guild {} terminado", self.guild_id);
    }

    async fn handle(&mut self, command: PlayerCommand) {
        match command {
            PlayerCommand::Enqueue { tracks, reply } => {
                let result = self.enqueue(tracks);
                let accepted = result.is_ok();
                let _ = reply.send(result);
                // Idle --queue non-empty--> Loading
                if accepted && self.status == PlayerStatus::Idle {
                    self.play_next().await;
                }
            }
            PlayerCommand::Skip { reply } => {
                let result = self.skip().await;
                let _ = reply.send(result);
            }
            PlayerCommand::Stop { reply } => {
                self.stop().await;
                let _ = reply.send(());
            }
            PlayerCommand::SetPaused { paused, reply } => {
                let result = self.set_paused(paused).await;
                let _ = reply.send(result);
            }
            PlayerCommand::Seek { target, reply } => {
                let result = self.seek(target).await;
                let _ = reply.send(result);
            }
            PlayerCommand::Remove { position, reply } => {
                let _ = reply.send(self.state.queue.remove_at(position));
            }
            PlayerCommand::Move { from, to, reply } => {
                let _ = reply.send(self.state.queue.move_track(from, to));
            }
            PlayerCommand::MoveRelative { position, diff, reply } => {
                let _ = reply.send(self.state.queue.move_relative(position, diff));
            }
            PlayerCommand::Swap { first, second, reply } => {
                let _ = reply.send(self.state.queue.swap(first, second));
            }
            PlayerCommand::Shuffle { reply } => {
                self.state.queue.shuffle();
                let _ = reply.send(());
            }
            PlayerCommand::Clear { reply } => {
                let _ = reply.send(self.state.queue.clear());
            }
            PlayerCommand::SetRepeat { value, reply } => {
                self.state.repeat = value.unwrap_or(!self.state.repeat);
                info!("🔁 Repeat {} en guild {}", on_off(self.state.repeat), self.guild_id);
                let _ = reply.send(self.state.repeat);
            }
            PlayerCommand::SetAutoplay { value, reply } => {
                self.state.autoplay = value.unwrap_or(!self.state.autoplay);
                info!("📻 Autoplay {} en guild {}", on_off(self.state.autoplay), self.guild_id);
                let _ = reply.send(self.state.autoplay);
            }
            PlayerCommand::SetNowPlaying { value, reply } => {
                self.state.np_message_enabled = value.unwrap_or(!self.state.np_message_enabled);
                let _ = reply.send(self.state.np_message_enabled);
            }
            PlayerCommand::Queue { page, per_page, reply } => {
                let _ = reply.send(self.state.queue.page(page, per_page));
            }
            PlayerCommand::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            PlayerCommand::Disconnect { reason, reply } => {
                self.destroy(reason).await;
                let _ = reply.send(());
            }
        }
    }

    fn enqueue(&mut self, tracks: Vec<Track>) -> Result<usize> {
        match tracks.len() {
            0 => Ok(0),
            1 => {
                let mut tracks = tracks;
                let track = tracks.remove(0);
                self.state.queue.push_back(track)?;
                Ok(self.state.queue.len())
            }
            _ => self.state.queue.push_many(tracks),
        }
    }

    /// Toma tracks de la cola hasta que uno arranque o la cola se vacíe
    async fn play_next(&mut self) {
        while self.status != PlayerStatus::Destroyed {
            let Some(track) = self.state.queue.pop_front() else {
                self.go_idle();
                return;
            };

            self.state.loop_play_count = 0;
            if self.load_and_play(track, true).await {
                return;
            }
        }
    }

    /// Loading -> Playing. `false` si el track falló y hay que seguir con la cola.
    async fn load_and_play(&mut self, track: Track, announce: bool) -> bool {
        self.status = PlayerStatus::Loading;
        self.state.current_track = Some(track.clone());
        info!("⏳ Cargando {} en guild {}", track.title(), self.guild_id);

        let result = match track.open_source(&self.ctx.factory).await {
            Ok(source) => self.start_playback(Arc::new(source)),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                self.state.stopped = false;
                info!("🎵 Reproduciendo: {} (guild {})", track, self.guild_id);
                if announce && self.state.np_message_enabled {
                    self.emit(PlayerEvent::NowPlaying {
                        guild_id: self.guild_id,
                        track,
                    });
                }
                true
            }
            Err(e) => {
                warn!("⚠️ No se pudo reproducir {}: {}", track.title(), e);
                self.state.current_track = None;
                self.emit(PlayerEvent::TrackError {
                    guild_id: self.guild_id,
                    track,
                    reason: e.to_string(),
                });
                false
            }
        }
    }

    /// Lanza el hilo de tiempo real sobre `source`
    fn start_playback(&mut self, source: Arc<FrameCacheSource>) -> Result<()> {
        let control = PumpControl::new();
        let ended = match pump::spawn(
            self.guild_id,
            source.clone(),
            self.sink.clone(),
            control.clone(),
            self.ctx.config.realtime_pacing,
        ) {
            Ok(ended) => ended,
            Err(e) => {
                source.shutdown();
                return Err(e);
            }
        };

        self.active = Some(ActivePlayback {
            source,
            control,
            ended,
        });
        self.status = PlayerStatus::Playing;
        Ok(())
    }

    async fn on_playback_end(&mut self, end: PlaybackEnd) {
        let Some(active) = self.active.take() else {
            return;
        };

        match end {
            PlaybackEnd::Finished => self.finish_track(active.source).await,
            PlaybackEnd::Cancelled => {
                active.source.shutdown();
            }
            PlaybackEnd::SinkDisconnected => {
                active.source.shutdown();
                self.destroy(Some("voice connection lost".to_string())).await;
            }
            PlaybackEnd::DecodeFailed(reason) => {
                active.source.shutdown();
                if let Some(track) = self.state.current_track.take() {
                    warn!("⚠️ Error decodificando {}: {}", track.title(), reason);
                    self.emit(PlayerEvent::TrackError {
                        guild_id: self.guild_id,
                        track,
                        reason,
                    });
                }
                self.play_next().await;
            }
        }
    }

    /// Fin natural del track: repetir, autoplay o siguiente de la cola
    async fn finish_track(&mut self, source: Arc<FrameCacheSource>) {
        let Some(track) = self.state.current_track.clone() else {
            source.shutdown();
            self.play_next().await;
            return;
        };

        if self.state.repeat && !self.state.stopped {
            self.state.loop_play_count += 1;
            debug!("🔁 Repitiendo {} (vuelta {})", track.title(), self.state.loop_play_count);

            match source.restart() {
                Ok(()) => {
                    if let Err(e) = self.start_playback(source) {
                        error!("❌ No se pudo reiniciar la reproducción: {}", e);
                        self.state.current_track = None;
                        self.play_next().await;
                    }
                }
                Err(_) => {
                    // sin caché: se regenera la fuente desde el track original
                    source.shutdown();
                    if !self.load_and_play(track, false).await {
                        self.play_next().await;
                    }
                }
            }
            return;
        }

        source.shutdown();
        self.state.current_track = None;

        if self.state.queue.is_empty() && self.state.autoplay && !self.state.stopped {
            self.queue_related(&track).await;
        }

        self.play_next().await;
    }

    async fn queue_related(&mut self, last: &Track) {
        match self.ctx.resolver.related(last).await {
            Ok(Some(related)) => {
                info!("📻 Autoplay: {}", related.title());
                if let Err(e) = self.state.queue.push_back(related) {
                    warn!("⚠️ Autoplay no pudo encolar: {}", e);
                }
            }
            Ok(None) => debug!("Autoplay sin recomendaciones para {}", last.title()),
            Err(e) => warn!("⚠️ Autoplay falló para {}: {}", last.title(), e),
        }
    }

    fn go_idle(&mut self) {
        self.status = PlayerStatus::Idle;
        self.state.current_track = None;
        self.state.loop_play_count = 0;
        info!("💤 Cola vacía en guild {}", self.guild_id);
        self.emit(PlayerEvent::QueueEmpty { guild_id: self.guild_id });
    }

    /// Cancela el hilo de audio, libera la fuente y espera a que termine
    async fn halt(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };

        active.control.cancel();
        active.source.shutdown();
        match active.ended.await {
            Ok(end) => debug!("Reproducción detenida: {:?}", end),
            Err(_) => warn!("⚠️ El hilo de audio terminó sin reportar"),
        }
    }

    async fn skip(&mut self) -> Result<Track> {
        if self.active.is_none() {
            return Err(EngineError::NothingPlaying);
        }

        self.halt().await;
        let skipped = self.state.current_track.take().ok_or(EngineError::NothingPlaying)?;
        info!("⏭️ Saltado: {}", skipped.title());
        self.play_next().await;
        Ok(skipped)
    }

    async fn stop(&mut self) {
        self.state.stopped = true;
        self.halt().await;
        self.state.current_track = None;
        self.state.loop_play_count = 0;

        if self.ctx.config.stop_clears_queue {
            self.state.queue.clear();
        }

        self.status = PlayerStatus::Idle;
        info!("⏹️ Reproducción detenida en guild {}", self.guild_id);
    }

    async fn set_paused(&mut self, paused: Option<bool>) -> Result<bool> {
        let Some(active) = &self.active else {
            // resume sobre un player detenido con cola pendiente
            if paused != Some(true) && self.status == PlayerStatus::Idle && !self.state.queue.is_empty() {
                self.play_next().await;
                return Ok(false);
            }
            return Err(EngineError::NothingPlaying);
        };

        let paused = paused.unwrap_or(!active.control.is_paused());
        active.control.set_paused(paused);
        self.status = if paused {
            PlayerStatus::Paused
        } else {
            PlayerStatus::Playing
        };

        info!("{} guild {}", if paused { "⏸️ Pausado" } else { "▶️ Reanudado" }, self.guild_id);
        Ok(paused)
    }

    async fn seek(&mut self, target: SeekTarget) -> Result<u64> {
        let active = self.active.as_ref().ok_or(EngineError::NothingPlaying)?;
        let source = active.source.clone();

        let target_secs = match target {
            SeekTarget::Absolute(secs) => i64::try_from(secs).unwrap_or(i64::MAX),
            SeekTarget::Relative(delta) => i64::try_from(source.position_secs())
                .unwrap_or(i64::MAX)
                .saturating_add(delta),
        }
        .max(0);

        if !source.is_cacheable() {
            if target_secs != 0 {
                return Err(EngineError::SeekUnavailable);
            }

            // volver al inicio sin caché = regenerar la fuente
            let track = self.state.current_track.clone().ok_or(EngineError::NothingPlaying)?;
            self.halt().await;
            if !self.load_and_play(track, false).await {
                self.play_next().await;
            }
            return Ok(0);
        }

        let target_frame = target_secs.saturating_mul(FRAMES_PER_SECOND as i64);
        let seeking = source.clone();
        tokio::task::spawn_blocking(move || seeking.seek(target_frame))
            .await
            .map_err(|e| EngineError::DecodeFailure(format!("seek task failed: {}", e)))??;

        let position = source.position_secs();
        info!("⏩ Seek a {}s en guild {}", position, self.guild_id);
        Ok(position)
    }

    fn snapshot(&self) -> PlayerSnapshot {
        let source = self.active.as_ref().map(|a| &a.source);
        PlayerSnapshot {
            guild_id: self.guild_id,
            status: self.status,
            current_track: self.state.current_track.clone(),
            position_secs: source.map(|s| s.position_secs()).unwrap_or(0),
            seekable: source.is_some_and(|s| s.is_cacheable()),
            queue_len: self.state.queue.len(),
            queue_duration_seconds: self.state.queue.total_duration_seconds(),
            repeat: self.state.repeat,
            autoplay: self.state.autoplay,
            np_message_enabled: self.state.np_message_enabled,
            loop_play_count: self.state.loop_play_count,
        }
    }

    /// Estado terminal: libera todo y se da de baja del registro
    async fn destroy(&mut self, reason: Option<String>) {
        if self.status == PlayerStatus::Destroyed {
            return;
        }

        self.state.stopped = true;
        self.halt().await;
        self.state.queue.clear();
        self.state.current_track = None;
        self.status = PlayerStatus::Destroyed;

        if let Some(on_destroy) = self.on_destroy.take() {
            on_destroy();
        }

        match &reason {
            Some(reason) => error!("❌ Player de guild {} destruido: {}", self.guild_id, reason),
            None => info!("👋 Player de guild {} destruido", self.guild_id),
        }

        self.emit(PlayerEvent::Destroyed {
            guild_id: self.guild_id,
            reason,
        });
    }

    fn emit(&self, event: PlayerEvent) {
        if self.ctx.events.send(event).is_err() {
            debug!("Nadie escucha eventos del player de guild {}", self.guild_id);
        }
    }
}

impl Drop for PlayerActor {
    fn drop(&mut self) {
        // el runtime se cerró sin pasar por destroy
        if let Some(active) = self.active.take() {
            active.control.cancel();
            active.source.shutdown();
        }
    }
}

fn on_off(value: bool) -> &'static str {
    if value {
        "activado"
    } else {
        "desactivado"
    }
}
