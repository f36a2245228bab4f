use anyhow::Result;
use serenity::model::id::{GuildId, UserId};
use std::{path::PathBuf, sync::Arc};
use tracing::{error, info, warn};

use guild_audio::{
    audio::{decoder::FfmpegLauncher, sink::FileSink, PlayerEvent, SessionManager},
    config::Config,
    sources::{Provider, YtDlpResolver},
};

const USAGE: &str = "usage: guild-audio [--provider youtube|ytmusic|soundcloud|direct] [--out FILE] [--amount N] <query or URL>";

/// Argumentos del modo demo
struct DemoArgs {
    query: String,
    provider: Provider,
    out: PathBuf,
    amount: usize,
}

impl DemoArgs {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        let mut provider = Provider::YouTube;
        let mut out = PathBuf::from("guild-audio.pcm");
        let mut amount = 1;
        let mut words = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--provider" => {
                    let value = args.next().ok_or_else(|| anyhow::anyhow!("--provider needs a value"))?;
                    provider = value.parse().map_err(anyhow::Error::msg)?;
                }
                "--out" => {
                    out = args
                        .next()
                        .map(PathBuf::from)
                        .ok_or_else(|| anyhow::anyhow!("--out needs a value"))?;
                }
                "--amount" => {
                    let value = args.next().ok_or_else(|| anyhow::anyhow!("--amount needs a value"))?;
                    amount = value.parse()?;
                }
                _ => words.push(arg),
            }
        }

        if words.is_empty() {
            anyhow::bail!(USAGE);
        }

        Ok(Self {
            query: words.join(" "),
            provider,
            out,
            amount,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Inicializar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("guild_audio=debug".parse()?)
                .add_directive("reqwest=info".parse()?),
        )
        .init();

    info!("🎵 Iniciando guild-audio v{}", env!("CARGO_PKG_VERSION"));

    // Cargar configuración
    let config = Config::load()?;

    // Manejar health check si es necesario
    if std::env::args().any(|arg| arg == "--health-check") {
        return health_check(&config).await;
    }

    info!("{}", config.summary());
    let args = DemoArgs::parse(std::env::args().skip(1))?;

    let config = Arc::new(config);
    let resolver = Arc::new(YtDlpResolver::new(&config)?);
    let launcher = Arc::new(FfmpegLauncher::new(config.ffmpeg_path.clone()));
    let (sessions, mut events) = SessionManager::new(config, resolver, launcher);

    let guild_id = GuildId::new(1);
    let sink = Arc::new(FileSink::create(&args.out)?);
    sessions.join(guild_id, sink.clone());

    let requested = if args.amount > 1 {
        sessions
            .request_many(guild_id, &args.query, args.provider, UserId::new(1), args.amount)
            .await
    } else {
        sessions
            .request(guild_id, &args.query, args.provider, UserId::new(1))
            .await
            .map(|track| vec![track])
    };

    match requested {
        Ok(tracks) => {
            for track in &tracks {
                info!("📋 En cola: {}", track);
            }
        }
        Err(e) => {
            error!("❌ No se pudo resolver '{}': {}", args.query, e);
            sessions.shutdown_all().await;
            return Err(e.into());
        }
    }

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(PlayerEvent::QueueEmpty { .. }) => {
                    info!("✅ Reproducción terminada");
                    break;
                }
                Some(event @ PlayerEvent::Destroyed { .. }) => {
                    warn!("{}", event);
                    break;
                }
                Some(event) => info!("📢 {}", event),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("⚠️ Señal de shutdown recibida, cerrando...");
                break;
            }
        }
    }

    sessions.shutdown_all().await;
    sink.disconnect();
    info!("💾 Audio guardado en {}", args.out.display());

    Ok(())
}

async fn health_check(config: &Config) -> Result<()> {
    // Verificar dependencias críticas
    let yt_dlp = async_process::Command::new(&config.ytdlp_path)
        .arg("--version")
        .output()
        .await?;

    let ffmpeg = async_process::Command::new(&config.ffmpeg_path)
        .arg("-version")
        .output()
        .await?;

    if yt_dlp.status.success() && ffmpeg.status.success() {
        println!("OK");
        Ok(())
    } else {
        anyhow::bail!("Dependencias faltantes");
    }
}
