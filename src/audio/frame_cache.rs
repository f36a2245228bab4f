//! Frame-cached seekable audio source.
//!
//! Every frame pulled from the decoder is recorded the first time it is
//! produced, so seeking backwards and looping are served from memory without
//! touching the decoder again. Tracks that are too long (or live) are played
//! forward-only and report [`EngineError::SeekUnavailable`] on seek/restart.
//!
//! Two locks are involved and always taken in this order:
//! 1. `decode_lock` serializes pulls from the decoder (reader vs. seek drain)
//! 2. `state` guards cursor and buffer, and is never held across a decode call

use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::{debug, info};

use super::decoder::{Decoder, FRAMES_PER_SECOND};
use crate::error::{EngineError, Result};

#[derive(Debug, Default)]
struct CacheState {
    frames: Vec<Bytes>,
    cursor: usize,
    decode_done: bool,
}

impl CacheState {
    fn cached_at_cursor(&mut self) -> Option<Bytes> {
        let frame = self.frames.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(frame)
    }
}

pub struct FrameCacheSource {
    decoder: Arc<dyn Decoder>,
    decode_lock: Mutex<()>,
    state: Mutex<CacheState>,
    can_cache: bool,
    shutdown: AtomicBool,
}

impl FrameCacheSource {
    pub fn new(decoder: Arc<dyn Decoder>, can_cache: bool) -> Self {
        debug!("Nueva fuente de audio (cache={})", can_cache);
        Self {
            decoder,
            decode_lock: Mutex::new(()),
            state: Mutex::new(CacheState::default()),
            can_cache,
            shutdown: AtomicBool::new(false),
        }
    }

    /// Siguiente frame para el consumidor de tiempo real; `Ok(None)` es fin de stream
    pub fn next_frame(&self) -> Result<Option<Bytes>> {
        if self.is_shut_down() {
            return Ok(None);
        }

        if let Some(frame) = self.try_cached()? {
            return Ok(frame);
        }

        let _decode = self.decode_lock.lock();

        // un seek pudo haber llenado el hueco mientras esperábamos
        if let Some(frame) = self.try_cached()? {
            return Ok(frame);
        }

        let pulled = self.decoder.read_frame();
        if self.is_shut_down() {
            return Ok(None);
        }

        let mut state = self.state.lock();
        match pulled? {
            Some(frame) if self.can_cache => {
                state.frames.push(frame);
                Ok(state.cached_at_cursor())
            }
            Some(frame) => {
                state.cursor += 1;
                Ok(Some(frame))
            }
            None => {
                state.decode_done = true;
                Ok(None)
            }
        }
    }

    /// `Some(frame)` si se resolvió sin decodificar (frame cacheado o fin de stream)
    fn try_cached(&self) -> Result<Option<Option<Bytes>>> {
        let mut state = self.state.lock();
        if self.can_cache {
            if let Some(frame) = state.cached_at_cursor() {
                return Ok(Some(Some(frame)));
            }
        }
        if state.decode_done {
            return Ok(Some(None));
        }
        Ok(None)
    }

    /// Reposiciona el cursor en `target_frame` (absoluto, se recorta a 0).
    ///
    /// Si el destino está más allá de lo cacheado, drena el decoder hasta
    /// alcanzarlo. Sin caché no modifica nada y devuelve `SeekUnavailable`.
    pub fn seek(&self, target_frame: i64) -> Result<()> {
        if !self.can_cache {
            return Err(EngineError::SeekUnavailable);
        }
        if self.is_shut_down() {
            return Ok(());
        }

        let target = target_frame.max(0) as usize;
        let _decode = self.decode_lock.lock();

        loop {
            {
                let mut state = self.state.lock();
                if target <= state.frames.len() || state.decode_done {
                    state.cursor = target.min(state.frames.len());
                    break;
                }
            }

            if self.is_shut_down() {
                return Ok(());
            }

            match self.decoder.read_frame()? {
                Some(frame) => self.state.lock().frames.push(frame),
                None => self.state.lock().decode_done = true,
            }
        }

        debug!("Seek al frame {}", target);
        Ok(())
    }

    /// Vuelve al inicio sin descartar la caché (loop barato)
    pub fn restart(&self) -> Result<()> {
        if !self.can_cache {
            return Err(EngineError::SeekUnavailable);
        }
        self.state.lock().cursor = 0;
        Ok(())
    }

    /// Mata el proceso y libera el buffer. Idempotente.
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }

        self.decoder.kill();

        let mut state = self.state.lock();
        let released = state.frames.len();
        state.frames = Vec::new();
        state.decode_done = true;
        info!("🧹 Fuente de audio liberada ({} frames en caché)", released);
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    pub fn is_cacheable(&self) -> bool {
        self.can_cache
    }

    pub fn position_frames(&self) -> usize {
        self.state.lock().cursor
    }

    pub fn position_secs(&self) -> u64 {
        self.position_frames() as u64 / FRAMES_PER_SECOND
    }

    pub fn cached_frames(&self) -> usize {
        self.state.lock().frames.len()
    }

    pub fn is_decode_complete(&self) -> bool {
        self.state.lock().decode_done
    }
}

impl Drop for FrameCacheSource {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::ScriptedDecoder;
    use pretty_assertions::assert_eq;

    fn source(frames: usize, can_cache: bool) -> (FrameCacheSource, Arc<ScriptedDecoder>) {
        let decoder = Arc::new(ScriptedDecoder::new(frames));
        (FrameCacheSource::new(decoder.clone(), can_cache), decoder)
    }

    fn drain(source: &FrameCacheSource) -> Vec<Bytes> {
        let mut out = Vec::new();
        while let Some(frame) = source.next_frame().unwrap() {
            out.push(frame);
        }
        out
    }

    #[test]
    fn plays_every_frame_then_end_of_stream() {
        let (source, decoder) = source(5, true);
        let frames = drain(&source);

        assert_eq!(frames.len(), 5);
        assert_eq!(frames[3], ScriptedDecoder::frame(3));
        assert!(source.is_decode_complete());
        assert!(source.next_frame().unwrap().is_none());
        assert_eq!(decoder.pulls(), 6);
    }

    #[test]
    fn seek_back_replays_identical_frames_from_memory() {
        let (source, decoder) = source(20, true);

        let first: Vec<Bytes> = (0..10).map(|_| source.next_frame().unwrap().unwrap()).collect();
        let pulls_before = decoder.pulls();

        source.seek(4).unwrap();
        let replay: Vec<Bytes> = (0..6).map(|_| source.next_frame().unwrap().unwrap()).collect();

        assert_eq!(replay, first[4..10].to_vec());
        assert_eq!(decoder.pulls(), pulls_before);

        source.seek(2).unwrap();
        assert_eq!(source.next_frame().unwrap().unwrap(), first[2]);
    }

    #[test]
    fn seek_forward_drains_the_gap() {
        let (source, _decoder) = source(100, true);
        source.next_frame().unwrap();

        source.seek(60).unwrap();
        assert_eq!(source.cached_frames(), 60);
        assert_eq!(source.position_frames(), 60);
        assert_eq!(source.next_frame().unwrap().unwrap(), ScriptedDecoder::frame(60));
        assert_eq!(source.position_secs(), 1);
    }

    #[test]
    fn seek_past_end_clamps_to_buffer_length() {
        let (source, _decoder) = source(10, true);
        source.seek(500).unwrap();

        assert!(source.is_decode_complete());
        assert_eq!(source.position_frames(), 10);
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn negative_seek_clamps_to_start() {
        let (source, _decoder) = source(10, true);
        drain(&source);
        source.seek(-42).unwrap();
        assert_eq!(source.next_frame().unwrap().unwrap(), ScriptedDecoder::frame(0));
    }

    #[test]
    fn restart_replays_without_decoding_again() {
        let (source, decoder) = source(8, true);
        let first = drain(&source);
        let pulls = decoder.pulls();

        source.restart().unwrap();
        let second = drain(&source);

        assert_eq!(first, second);
        assert_eq!(decoder.pulls(), pulls);
    }

    #[test]
    fn uncached_source_refuses_seek_without_touching_the_cursor() {
        let (source, _decoder) = source(10, false);
        source.next_frame().unwrap();
        source.next_frame().unwrap();

        assert!(matches!(source.seek(0), Err(EngineError::SeekUnavailable)));
        assert!(matches!(source.seek(7), Err(EngineError::SeekUnavailable)));
        assert!(matches!(source.restart(), Err(EngineError::SeekUnavailable)));
        assert_eq!(source.position_frames(), 2);
        assert_eq!(source.cached_frames(), 0);
        assert_eq!(source.next_frame().unwrap().unwrap(), ScriptedDecoder::frame(2));
    }

    #[test]
    fn shutdown_twice_kills_once() {
        let (source, decoder) = source(10, true);
        source.next_frame().unwrap();

        source.shutdown();
        source.shutdown();

        assert_eq!(decoder.kills(), 1);
        assert_eq!(source.cached_frames(), 0);
        assert!(source.next_frame().unwrap().is_none());
        assert!(source.seek(0).is_ok());
    }

    #[test]
    fn decoder_errors_propagate_to_the_reader() {
        let decoder = Arc::new(ScriptedDecoder::failing_after(2));
        let source = FrameCacheSource::new(decoder, true);

        assert!(source.next_frame().unwrap().is_some());
        assert!(source.next_frame().unwrap().is_some());
        assert!(matches!(source.next_frame(), Err(EngineError::DecodeFailure(_))));
    }

    #[test]
    fn concurrent_restart_never_yields_a_torn_cursor() {
        let decoder = Arc::new(ScriptedDecoder::new(2_000));
        let source = Arc::new(FrameCacheSource::new(decoder, true));

        let reader = {
            let source = source.clone();
            std::thread::spawn(move || {
                let mut count = 0;
                while let Some(frame) = source.next_frame().unwrap() {
                    let idx = ScriptedDecoder::index_of(&frame);
                    assert!(idx < 2_000);
                    count += 1;
                    if count > 10_000 {
                        break;
                    }
                }
                count
            })
        };

        for _ in 0..5 {
            source.restart().unwrap();
            std::thread::yield_now();
        }

        let read = reader.join().unwrap();
        assert!(read >= 2_000);
        assert!(source.position_frames() <= source.cached_frames());
    }
}
