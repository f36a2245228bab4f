//! Dedicated real-time thread feeding one player's voice sink.

use serenity::model::id::GuildId;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{frame_cache::FrameCacheSource, sink::VoiceSink};
use crate::error::Result;

const FRAME_DURATION: Duration = Duration::from_millis(20);

/// Por qué terminó la reproducción de un track
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEnd {
    Finished,
    Cancelled,
    SinkDisconnected,
    DecodeFailed(String),
}

/// Controles compartidos entre el actor del player y el hilo de audio
#[derive(Debug, Clone, Default)]
pub struct PumpControl {
    cancel: CancellationToken,
    paused: Arc<AtomicBool>,
}

impl PumpControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Release);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }
}

/// Lanza el hilo que llama a `next_frame` y escribe al sink hasta el final del track
pub fn spawn(
    guild_id: GuildId,
    source: Arc<FrameCacheSource>,
    sink: Arc<dyn VoiceSink>,
    control: PumpControl,
    pacing: bool,
) -> Result<oneshot::Receiver<PlaybackEnd>> {
    let (tx, rx) = oneshot::channel();

    thread::Builder::new()
        .name(format!("audio-pump-{}", guild_id))
        .spawn(move || {
            let end = run(&source, sink.as_ref(), &control, pacing);
            debug!("Hilo de audio de guild {} terminó: {:?}", guild_id, end);
            let _ = tx.send(end);
        })?;

    Ok(rx)
}

fn run(source: &FrameCacheSource, sink: &dyn VoiceSink, control: &PumpControl, pacing: bool) -> PlaybackEnd {
    let mut deadline = Instant::now();

    loop {
        if control.cancel.is_cancelled() {
            return PlaybackEnd::Cancelled;
        }
        if !sink.is_connected() {
            return PlaybackEnd::SinkDisconnected;
        }
        if control.is_paused() {
            thread::sleep(FRAME_DURATION);
            deadline = Instant::now();
            continue;
        }

        match source.next_frame() {
            Ok(Some(frame)) => {
                if let Err(e) = sink.write(frame) {
                    warn!("⚠️ El sink rechazó un frame: {}", e);
                    return PlaybackEnd::SinkDisconnected;
                }
            }
            Ok(None) if control.cancel.is_cancelled() => return PlaybackEnd::Cancelled,
            Ok(None) => return PlaybackEnd::Finished,
            Err(_) if control.cancel.is_cancelled() => return PlaybackEnd::Cancelled,
            Err(e) => return PlaybackEnd::DecodeFailed(e.to_string()),
        }

        if pacing {
            deadline += FRAME_DURATION;
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            } else {
                deadline = now;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{
        sink::MockVoiceSink,
        testing::{CollectingSink, ScriptedDecoder},
    };

    fn source(frames: usize) -> Arc<FrameCacheSource> {
        Arc::new(FrameCacheSource::new(Arc::new(ScriptedDecoder::new(frames)), true))
    }

    #[tokio::test]
    async fn feeds_every_frame_then_reports_finished() {
        let sink = Arc::new(CollectingSink::new());
        let end = spawn(GuildId::new(1), source(12), sink.clone(), PumpControl::new(), false)
            .unwrap()
            .await
            .unwrap();

        assert_eq!(end, PlaybackEnd::Finished);
        assert_eq!(sink.frames().len(), 12);
    }

    #[tokio::test]
    async fn disconnected_sink_stops_the_pump() {
        let mut sink = MockVoiceSink::new();
        sink.expect_is_connected().return_const(false);
        sink.expect_write().never();

        let end = spawn(GuildId::new(1), source(12), Arc::new(sink), PumpControl::new(), false)
            .unwrap()
            .await
            .unwrap();

        assert_eq!(end, PlaybackEnd::SinkDisconnected);
    }

    #[tokio::test]
    async fn write_errors_count_as_disconnects() {
        let mut sink = MockVoiceSink::new();
        sink.expect_is_connected().return_const(true);
        sink.expect_write()
            .times(1)
            .returning(|_| Err(crate::error::EngineError::SinkDisconnected));

        let end = spawn(GuildId::new(1), source(12), Arc::new(sink), PumpControl::new(), false)
            .unwrap()
            .await
            .unwrap();

        assert_eq!(end, PlaybackEnd::SinkDisconnected);
    }

    #[tokio::test]
    async fn cancellation_with_shutdown_returns_promptly() {
        let release = Arc::new(AtomicBool::new(false));
        let decoder = Arc::new(ScriptedDecoder::held(1_000, release));
        let source = Arc::new(FrameCacheSource::new(decoder.clone(), true));
        let control = PumpControl::new();

        let ended = spawn(GuildId::new(1), source.clone(), Arc::new(CollectingSink::new()), control.clone(), false)
            .unwrap();

        control.cancel();
        source.shutdown();

        let end = tokio::time::timeout(Duration::from_secs(5), ended).await.unwrap().unwrap();
        assert_eq!(end, PlaybackEnd::Cancelled);
        assert_eq!(decoder.kills(), 1);
    }

    #[tokio::test]
    async fn decoder_failure_is_reported() {
        let source = Arc::new(FrameCacheSource::new(Arc::new(ScriptedDecoder::failing_after(3)), true));
        let sink = Arc::new(CollectingSink::new());

        let end = spawn(GuildId::new(1), source, sink.clone(), PumpControl::new(), false)
            .unwrap()
            .await
            .unwrap();

        assert!(matches!(end, PlaybackEnd::DecodeFailed(_)));
        assert_eq!(sink.frames().len(), 3);
    }
}
