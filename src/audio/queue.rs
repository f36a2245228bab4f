use rand::seq::SliceRandom;
use std::collections::VecDeque;
use tracing::{debug, info};

use super::track::Track;
use crate::error::{EngineError, Result};

/// Cola FIFO de tracks pendientes de un guild.
///
/// Las posiciones que ve el usuario son 1-based y se validan antes de mutar;
/// una posición inválida nunca modifica la cola ni la duración total.
#[derive(Debug, Clone)]
pub struct TrackQueue {
    items: VecDeque<Track>,
    total_duration_seconds: u64,
    max_size: usize,
}

impl TrackQueue {
    pub fn new(max_size: usize) -> Self {
        Self {
            items: VecDeque::new(),
            total_duration_seconds: 0,
            max_size,
        }
    }

    /// Agrega un track al final de la cola
    pub fn push_back(&mut self, track: Track) -> Result<()> {
        if self.items.len() >= self.max_size {
            return Err(EngineError::QueueFull(self.max_size));
        }

        info!("➕ Agregado a la cola: {}", track.title());
        self.total_duration_seconds += track.duration_seconds();
        self.items.push_back(track);
        Ok(())
    }

    /// Agrega varios tracks (playlist) hasta llenar la cola; devuelve cuántos entraron
    pub fn push_many(&mut self, tracks: Vec<Track>) -> Result<usize> {
        let available = self.max_size.saturating_sub(self.items.len());
        if available == 0 && !tracks.is_empty() {
            return Err(EngineError::QueueFull(self.max_size));
        }

        let mut added = 0;
        for track in tracks.into_iter().take(available) {
            self.total_duration_seconds += track.duration_seconds();
            self.items.push_back(track);
            added += 1;
        }

        info!("➕ Agregadas {} canciones a la cola", added);
        Ok(added)
    }

    pub fn pop_front(&mut self) -> Option<Track> {
        let track = self.items.pop_front()?;
        self.total_duration_seconds -= track.duration_seconds();
        debug!("➡️ Siguiente en cola: {}", track.title());
        Some(track)
    }

    pub fn peek_front(&self) -> Option<&Track> {
        self.items.front()
    }

    /// Track en la posición 1-based
    pub fn get(&self, position: usize) -> Option<&Track> {
        position.checked_sub(1).and_then(|idx| self.items.get(idx))
    }

    /// Elimina el track en la posición 1-based
    pub fn remove_at(&mut self, position: usize) -> Result<Track> {
        let idx = self.index_of(position)?;
        let track = self
            .items
            .remove(idx)
            .ok_or(EngineError::OutOfRange { index: position, len: self.items.len() })?;
        self.total_duration_seconds -= track.duration_seconds();
        debug!("❌ Track eliminado en posición {}", position);
        Ok(track)
    }

    /// Mueve un track de `from` a `to` (ambas 1-based)
    pub fn move_track(&mut self, from: usize, to: usize) -> Result<()> {
        let from_idx = self.index_of(from)?;
        let to_idx = self.index_of(to)?;

        if from_idx != to_idx {
            if let Some(track) = self.items.remove(from_idx) {
                self.items.insert(to_idx, track);
            }
            debug!("📍 Track movido de posición {} a {}", from, to);
        }

        Ok(())
    }

    /// Mueve un track `diff` posiciones hacia atrás en la cola
    pub fn move_relative(&mut self, position: usize, diff: usize) -> Result<()> {
        let target = position.checked_add(diff).ok_or(EngineError::OutOfRange {
            index: usize::MAX,
            len: self.items.len(),
        })?;
        self.move_track(position, target)
    }

    pub fn swap(&mut self, first: usize, second: usize) -> Result<()> {
        let a = self.index_of(first)?;
        let b = self.index_of(second)?;
        self.items.swap(a, b);
        debug!("🔁 Tracks #{} y #{} intercambiados", first, second);
        Ok(())
    }

    /// Permutación uniforme de los tracks pendientes
    pub fn shuffle(&mut self) {
        let mut rng = rand::thread_rng();
        self.items.make_contiguous().shuffle(&mut rng);
        info!("🔀 Cola mezclada");
    }

    /// Vacía la cola y devuelve cuántos tracks había
    pub fn clear(&mut self) -> usize {
        let cleared = self.items.len();
        self.items.clear();
        self.total_duration_seconds = 0;
        if cleared > 0 {
            info!("🗑️ Cola limpiada: {} tracks removidos", cleared);
        }
        cleared
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn total_duration_seconds(&self) -> u64 {
        self.total_duration_seconds
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.items.iter()
    }

    /// Obtiene una página específica de la cola (1-based)
    pub fn page(&self, page: usize, per_page: usize) -> QueuePage {
        let per_page = per_page.max(1);
        let safe_page = page.max(1);
        let start = (safe_page - 1).saturating_mul(per_page);
        let total_pages = if self.items.is_empty() {
            1
        } else {
            self.items.len().div_ceil(per_page)
        };

        QueuePage {
            items: self
                .items
                .iter()
                .enumerate()
                .skip(start)
                .take(per_page)
                .map(|(idx, track)| (idx + 1, track.clone()))
                .collect(),
            current_page: safe_page,
            total_pages,
            total_items: self.items.len(),
            total_duration_seconds: self.total_duration_seconds,
        }
    }

    fn index_of(&self, position: usize) -> Result<usize> {
        if position == 0 || position > self.items.len() {
            return Err(EngineError::OutOfRange {
                index: position,
                len: self.items.len(),
            });
        }
        Ok(position - 1)
    }
}

#[derive(Debug, Clone)]
pub struct QueuePage {
    /// (posición 1-based, track)
    pub items: Vec<(usize, Track)>,
    pub current_page: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub total_duration_seconds: u64,
}
