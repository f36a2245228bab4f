use bytes::Bytes;
use parking_lot::Mutex;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    sync::atomic::{AtomicBool, Ordering},
};
use tracing::{error, info};

use crate::error::{EngineError, Result};

/// Salida de voz: recibe frames PCM y se encarga del transporte (Opus, UDP, cifrado).
///
/// Se llama desde el hilo de tiempo real, por eso es síncrona.
#[cfg_attr(test, mockall::automock)]
pub trait VoiceSink: Send + Sync {
    fn write(&self, frame: Bytes) -> Result<()>;

    /// `false` cuando el bot fue removido del canal
    fn is_connected(&self) -> bool;
}

/// Sink que vuelca PCM crudo a un archivo (`ffplay -f s16le -ar 48000 -ac 2`)
pub struct FileSink {
    writer: Mutex<Option<BufWriter<File>>>,
    connected: AtomicBool,
}

impl FileSink {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path.as_ref())?;
        info!("📁 Escribiendo audio en {}", path.as_ref().display());
        Ok(Self {
            writer: Mutex::new(Some(BufWriter::new(file))),
            connected: AtomicBool::new(true),
        })
    }

    /// Cierra el archivo; escrituras posteriores fallan con `SinkDisconnected`
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::Release);
        if let Some(mut writer) = self.writer.lock().take() {
            if let Err(e) = writer.flush() {
                error!("Error al cerrar el archivo de audio: {:?}", e);
            }
        }
    }
}

impl VoiceSink for FileSink {
    fn write(&self, frame: Bytes) -> Result<()> {
        let mut guard = self.writer.lock();
        let writer = guard.as_mut().ok_or(EngineError::SinkDisconnected)?;
        writer.write_all(&frame)?;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}
