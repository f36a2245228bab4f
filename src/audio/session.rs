use dashmap::{mapref::entry::Entry, DashMap};
use futures::future::join_all;
use serenity::model::id::{GuildId, UserId};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{
    decoder::DecoderLauncher,
    events::EventReceiver,
    player::{self, PlayerContext, PlayerHandle},
    sink::VoiceSink,
    track::Track,
};
use crate::{
    config::Config,
    error::{EngineError, Result},
    sources::{Provider, TrackResolver},
    vote::VoteGate,
};

/// Registro de players activos, uno por guild.
///
/// Cada entrada vive exactamente lo mismo que su player: se crea en
/// [`SessionManager::join`] y el propio player la elimina al entrar en
/// `Destroyed`, sea por `leave`, por error fatal o por quedarse solo.
pub struct SessionManager {
    players: Arc<DashMap<GuildId, PlayerHandle>>,
    ctx: PlayerContext,
    next_session: AtomicU64,
}

impl SessionManager {
    /// Creates the registry and the event stream all players report to.
    ///
    /// # Arguments
    ///
    /// * `config` - Shared engine configuration
    /// * `resolver` - Metadata, stream URL and related-track lookups
    /// * `launcher` - Spawns the decoder process for each track
    ///
    /// # Returns
    ///
    /// The manager plus the receiving end of every player's [`PlayerEvent`](super::events::PlayerEvent)s,
    /// which the command layer renders as user messages.
    pub fn new(
        config: Arc<Config>,
        resolver: Arc<dyn TrackResolver>,
        launcher: Arc<dyn DecoderLauncher>,
    ) -> (Self, EventReceiver) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let manager = Self {
            players: Arc::new(DashMap::new()),
            ctx: PlayerContext::new(config, resolver, launcher, events_tx),
            next_session: AtomicU64::new(1),
        };
        (manager, events_rx)
    }

    /// Starts a player for `guild_id`, or returns the live one.
    ///
    /// # Arguments
    ///
    /// * `guild_id` - ID of the Discord server
    /// * `sink` - Voice output the player writes frames into
    ///
    /// # Side Effects
    ///
    /// - Replaces a registry entry whose player already terminated
    /// - The new player deregisters itself when destroyed
    pub fn join(&self, guild_id: GuildId, sink: Arc<dyn VoiceSink>) -> PlayerHandle {
        match self.players.entry(guild_id) {
            Entry::Occupied(existing) if !existing.get().is_closed() => {
                debug!("Reutilizando player existente de guild {}", guild_id);
                existing.get().clone()
            }
            entry => {
                let handle = self.spawn_player(guild_id, sink);
                info!("🔊 Sesión {} iniciada en guild {}", handle.session_id(), guild_id);
                entry.insert(handle.clone());
                handle
            }
        }
    }

    fn spawn_player(&self, guild_id: GuildId, sink: Arc<dyn VoiceSink>) -> PlayerHandle {
        let session_id = self.next_session.fetch_add(1, Ordering::Relaxed);
        let players = self.players.clone();

        // solo borra la entrada si sigue siendo de esta sesión
        let on_destroy: player::OnDestroy = Box::new(move || {
            players.remove_if(&guild_id, |_, handle| handle.session_id() == session_id);
        });

        player::spawn(guild_id, session_id, self.ctx.clone(), sink, Some(on_destroy))
    }

    pub fn get(&self, guild_id: GuildId) -> Option<PlayerHandle> {
        self.players
            .get(&guild_id)
            .map(|entry| entry.value().clone())
            .filter(|handle| !handle.is_closed())
    }

    /// Resuelve `query` y la encola en el player del guild
    pub async fn request(
        &self,
        guild_id: GuildId,
        query: &str,
        provider: Provider,
        requested_by: UserId,
    ) -> Result<Track> {
        let handle = self.get(guild_id).ok_or(EngineError::NotConnected)?;
        let track = self
            .ctx
            .resolver
            .resolve(query, provider)
            .await?
            .with_requested_by(requested_by);

        handle.enqueue(track.clone()).await?;
        Ok(track)
    }

    /// Resuelve hasta `amount` tracks (playlist o resultados de búsqueda) y los
    /// encola de una vez; devuelve los que entraron en la cola
    pub async fn request_many(
        &self,
        guild_id: GuildId,
        query: &str,
        provider: Provider,
        requested_by: UserId,
        amount: usize,
    ) -> Result<Vec<Track>> {
        let handle = self.get(guild_id).ok_or(EngineError::NotConnected)?;
        let mut tracks: Vec<Track> = self
            .ctx
            .resolver
            .resolve_many(query, provider, amount)
            .await?
            .into_iter()
            .map(|track| track.with_requested_by(requested_by))
            .collect();

        let added = handle.enqueue_many(tracks.clone()).await?;
        if added < tracks.len() {
            warn!("⚠️ Cola llena en guild {}: {} de {} tracks agregados", guild_id, added, tracks.len());
        }
        tracks.truncate(added);
        Ok(tracks)
    }

    /// Destruye la sesión del guild; `false` si no había ninguna
    pub async fn leave(&self, guild_id: GuildId) -> bool {
        let Some((_, handle)) = self.players.remove(&guild_id) else {
            return false;
        };

        if let Err(e) = handle.disconnect(None).await {
            debug!("El player de guild {} ya estaba destruido: {}", guild_id, e);
        }
        info!("👋 Sesión {} cerrada en guild {}", handle.session_id(), guild_id);
        true
    }

    /// Reacciona a cambios de oyentes (sin contar al bot); a 0 cierra la sesión
    pub async fn listeners_changed(&self, guild_id: GuildId, listeners: usize) -> bool {
        if listeners > 0 {
            return false;
        }

        if self.players.contains_key(&guild_id) {
            info!("🚪 Canal vacío en guild {}, desconectando", guild_id);
        }
        self.leave(guild_id).await
    }

    /// Votación para una acción disruptiva con los oyentes actuales
    pub fn vote_gate(&self, listeners: usize) -> VoteGate {
        VoteGate::new(listeners, self.ctx.config.vote_timeout())
    }

    pub fn active_sessions(&self) -> usize {
        self.players.len()
    }

    /// Cierra todas las sesiones (apagado del proceso)
    pub async fn shutdown_all(&self) {
        let guilds: Vec<GuildId> = self.players.iter().map(|entry| *entry.key()).collect();
        if guilds.is_empty() {
            return;
        }

        info!("🛑 Cerrando {} sesiones de audio", guilds.len());
        let closed = join_all(guilds.into_iter().map(|guild_id| self.leave(guild_id))).await;
        let failed = closed.iter().filter(|closed| !**closed).count();
        if failed > 0 {
            warn!("⚠️ {} sesiones ya se habían cerrado", failed);
        }
    }
}
