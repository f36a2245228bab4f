//! External decoder process plumbing.
//!
//! A decoder turns a resolved stream URL into a pull-based sequence of fixed
//! size PCM frames. The production implementation spawns `ffmpeg` and reads
//! 20ms frames (48kHz, stereo, s16le) from its stdout.

use bytes::Bytes;
use parking_lot::Mutex;
use std::{
    io::{BufReader, ErrorKind, Read},
    process::{Child, ChildStdout, Command, Stdio},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
};
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};

/// 20ms de PCM s16le a 48kHz estéreo
pub const FRAME_SIZE: usize = 3840;
pub const FRAMES_PER_SECOND: u64 = 50;

/// Un proceso decodificador en ejecución.
///
/// `read_frame` puede bloquear; `kill` debe poder llamarse desde otro hilo
/// mientras una lectura está en curso y hacer que esa lectura termine.
pub trait Decoder: Send + Sync {
    /// Siguiente frame, `Ok(None)` al terminar el stream
    fn read_frame(&self) -> Result<Option<Bytes>>;

    /// Termina el proceso externo
    fn kill(&self);
}

/// Fábrica de decodificadores a partir de una URL de stream ya resuelta
pub trait DecoderLauncher: Send + Sync {
    fn launch(&self, stream_url: &str) -> Result<Arc<dyn Decoder>>;
}

/// Lanza `ffmpeg` con reconexión para streams HTTP
pub struct FfmpegLauncher {
    program: String,
}

impl FfmpegLauncher {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, stream_url: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-nostdin", "-loglevel", "error"]);

        if stream_url.starts_with("http://") || stream_url.starts_with("https://") {
            cmd.args([
                "-reconnect",
                "1",
                "-reconnect_streamed",
                "1",
                "-reconnect_delay_max",
                "5",
            ]);
        }

        cmd.args(["-i", stream_url]);
        cmd.args(["-vn", "-f", "s16le", "-ar", "48000", "-ac", "2", "pipe:1"]);
        cmd
    }
}

impl DecoderLauncher for FfmpegLauncher {
    fn launch(&self, stream_url: &str) -> Result<Arc<dyn Decoder>> {
        info!("🎛️ Lanzando {} para stream", self.program);
        let decoder = FfmpegDecoder::spawn(self.command(stream_url))?;
        Ok(Arc::new(decoder))
    }
}

/// Proceso `ffmpeg` leyendo frames de su stdout
pub struct FfmpegDecoder {
    child: Mutex<Option<Child>>,
    stdout: Mutex<Option<BufReader<ChildStdout>>>,
    killed: AtomicBool,
    frames_read: AtomicU64,
}

impl FfmpegDecoder {
    pub fn spawn(mut cmd: Command) -> Result<Self> {
        let mut child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| EngineError::DecodeFailure(format!("failed to start decoder: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::DecodeFailure("decoder stdout unavailable".to_string()))?;

        debug!("Decoder iniciado con pid {}", child.id());

        Ok(Self {
            child: Mutex::new(Some(child)),
            stdout: Mutex::new(Some(BufReader::with_capacity(FRAME_SIZE * 8, stdout))),
            killed: AtomicBool::new(false),
            frames_read: AtomicU64::new(0),
        })
    }

    /// EOF de stdout: revisa el código de salida del proceso
    fn finish(&self) -> Result<Option<Bytes>> {
        if self.killed.load(Ordering::Acquire) {
            return Ok(None);
        }

        let mut guard = self.child.lock();
        let Some(child) = guard.as_mut() else {
            return Ok(None);
        };

        let status = child.wait()?;
        *guard = None;

        if !status.success() && self.frames_read.load(Ordering::Relaxed) == 0 {
            return Err(EngineError::DecodeFailure(format!(
                "decoder exited with {} before producing audio",
                status
            )));
        }

        debug!("Decoder terminó ({}) tras {} frames", status, self.frames_read.load(Ordering::Relaxed));
        Ok(None)
    }
}

impl Decoder for FfmpegDecoder {
    fn read_frame(&self) -> Result<Option<Bytes>> {
        let mut guard = self.stdout.lock();
        let Some(reader) = guard.as_mut() else {
            return Ok(None);
        };

        let mut buf = vec![0u8; FRAME_SIZE];
        let mut filled = 0;

        while filled < FRAME_SIZE {
            match reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    if self.killed.load(Ordering::Acquire) {
                        return Ok(None);
                    }
                    return Err(EngineError::DecodeFailure(e.to_string()));
                }
            }
        }

        if filled == 0 {
            *guard = None;
            drop(guard);
            return self.finish();
        }

        // el último frame incompleto queda relleno con silencio
        self.frames_read.fetch_add(1, Ordering::Relaxed);
        Ok(Some(Bytes::from(buf)))
    }

    fn kill(&self) {
        if self.killed.swap(true, Ordering::AcqRel) {
            return;
        }

        if let Some(mut child) = self.child.lock().take() {
            if let Err(e) = child.kill() {
                // ya había terminado por su cuenta
                debug!("kill del decoder: {}", e);
            }
            if let Err(e) = child.wait() {
                warn!("⚠️ No se pudo recoger el proceso decoder: {}", e);
            }
        }
    }
}

impl Drop for FfmpegDecoder {
    fn drop(&mut self) {
        self.kill();
    }
}
