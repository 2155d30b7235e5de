//! Application entry point for `reed`.
//!
//! # Startup sequence
//!
//! 1. Initialise logging (`REED_LOG`, default `warn`).
//! 2. Parse the command line.
//! 3. Load [`AppConfig`] from disk (returns default on first run).
//! 4. Dispatch: list voices, download a voice, interactive prompt, a
//!    PDF/EPUB read one unit at a time, or a one-shot read.

use std::io::{self, IsTerminal, Read};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;

use reed::cli::{Action, Cli};
use reed::config::{AppConfig, AppPaths, SpeechConfig};
use reed::interactive::{interactive_loop, RustylinePrompt};
use reed::pipeline::{EngineCommand, ProcessPipeline};
use reed::platform::{CommandSpec, PlatformResolver};
use reed::playback::{BlockingSpeaker, PlaybackController, PlaybackEvent, Reporter};
use reed::text::{get_text, read_clipboard, read_document, DocumentKind, Progress};
use reed::voices::{self, DownloadEvent, Downloader};

fn main() -> ExitCode {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::new().filter_or("REED_LOG", "warn")).init();

    // 2. Arguments
    let cli = Cli::parse();

    // 3. Configuration
    let settings = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load settings ({e}); using defaults");
        AppConfig::default()
    });
    let paths = AppPaths::new();

    // 4. Dispatch
    match run(&cli, &settings, &paths) {
        Ok(code) => code,
        Err(e) => {
            log::debug!("{e:?}");
            eprintln!("✗ {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, settings: &AppConfig, paths: &AppPaths) -> Result<ExitCode> {
    let stdin_is_terminal = io::stdin().is_terminal();
    cli.check_pages()?;

    match cli.action(stdin_is_terminal) {
        Action::Voices => list_voices(settings, &paths.data_dir),
        Action::Download(None) => bail!("Usage: reed download <voice-name>"),
        Action::Download(Some(name)) => download_voice(&name, paths),
        Action::Interactive => {
            let config = prepare_config(cli, settings, paths)?;
            run_interactive(settings, config)
        }
        Action::ReadDocument(path, kind) => {
            let config = prepare_config(cli, settings, paths)?;
            read_aloud(cli, settings, &config, &path, kind)
        }
        Action::Speak => {
            let config = prepare_config(cli, settings, paths)?;
            speak_once(cli, settings, &config, stdin_is_terminal)
        }
    }
}

// ---------------------------------------------------------------------------
// Speech
// ---------------------------------------------------------------------------

/// Settings + flags, validated, with the model downloaded if needed.
fn prepare_config(cli: &Cli, settings: &AppConfig, paths: &AppPaths) -> Result<SpeechConfig> {
    let model = voices::resolve_model_path(cli.model.as_deref(), &settings.voice, &paths.data_dir);
    let config = cli.speech_config(settings, model);
    config.validate_values()?;

    let data_dir = paths
        .ensure_data_dir()
        .with_context(|| format!("cannot create {}", paths.data_dir.display()))?;
    if !config.model().exists() {
        voices::ensure_model(&config, data_dir, &Downloader::new()?, &mut print_download)?;
    }
    Ok(config)
}

fn reporter() -> Reporter {
    Arc::new(|event: &PlaybackEvent| println!("{event}"))
}

fn build_pipeline(settings: &AppConfig, resolver: Arc<PlatformResolver>) -> ProcessPipeline {
    let pipeline = ProcessPipeline::new(EngineCommand::from_config(&settings.engine), resolver);
    match settings.player_override().and_then(CommandSpec::from_argv) {
        Some(player) => {
            log::info!("using configured player: {player}");
            pipeline.with_player(player)
        }
        None => pipeline,
    }
}

fn speak_once(
    cli: &Cli,
    settings: &AppConfig,
    config: &SpeechConfig,
    stdin_is_terminal: bool,
) -> Result<ExitCode> {
    let resolver = Arc::new(PlatformResolver::default());

    let mut stdin = io::stdin();
    let piped: Option<&mut dyn Read> = if stdin_is_terminal {
        None
    } else {
        Some(&mut stdin)
    };
    let text = get_text(
        &cli.sources(),
        || read_clipboard(&resolver.resolve_clipboard_command()?),
        piped,
    )?;

    let speaker = BlockingSpeaker::new(Arc::new(build_pipeline(settings, resolver)), reporter());
    speaker.speak(&text, config)?;
    Ok(ExitCode::SUCCESS)
}

fn read_aloud(
    cli: &Cli,
    settings: &AppConfig,
    config: &SpeechConfig,
    path: &Path,
    kind: DocumentKind,
) -> Result<ExitCode> {
    let resolver = Arc::new(PlatformResolver::default());
    let speaker = BlockingSpeaker::new(Arc::new(build_pipeline(settings, resolver)), reporter());

    read_document(
        path,
        kind,
        cli.pages.as_deref(),
        &mut |progress: &Progress| println!("\n{progress}"),
        &mut |text: &str| speaker.speak(text, config).map(drop),
    )?;
    Ok(ExitCode::SUCCESS)
}

fn run_interactive(settings: &AppConfig, config: SpeechConfig) -> Result<ExitCode> {
    let resolver = Arc::new(PlatformResolver::default());
    let pipeline = Arc::new(build_pipeline(settings, Arc::clone(&resolver)));
    let config = Arc::new(config);
    let mut prompt = RustylinePrompt::new().context("cannot start line editor")?;
    let mut stdout = io::stdout();

    let code = if config.is_save_mode() {
        let speaker = BlockingSpeaker::new(pipeline, reporter());
        interactive_loop(&mut prompt, &speaker, &config, &mut stdout)
    } else {
        // Dropping the controller stops anything still playing.
        let controller = PlaybackController::new(pipeline, resolver.suspend_resume(), reporter());
        interactive_loop(&mut prompt, &controller, &config, &mut stdout)
    };

    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}

// ---------------------------------------------------------------------------
// Voice management
// ---------------------------------------------------------------------------

fn print_download(event: DownloadEvent<'_>) {
    println!("{event}");
}

fn list_voices(settings: &AppConfig, data_dir: &Path) -> Result<ExitCode> {
    let installed = voices::list_installed(data_dir)?;
    if installed.is_empty() {
        println!("No voices installed.");
        println!("Download one with: reed download {}", settings.voice);
        return Ok(ExitCode::SUCCESS);
    }

    println!("Installed Voices\n");
    println!("{:<40} {:>10}", "Name", "Size (MB)");
    for voice in installed {
        let star = if voice.name == settings.voice { "  ⭐" } else { "" };
        println!("{:<40} {:>10.1}{star}", voice.name, voice.size_mb());
    }
    Ok(ExitCode::SUCCESS)
}

fn download_voice(name: &str, paths: &AppPaths) -> Result<ExitCode> {
    let name = name.strip_suffix(".onnx").unwrap_or(name);
    let data_dir = paths
        .ensure_data_dir()
        .with_context(|| format!("cannot create {}", paths.data_dir.display()))?;

    Downloader::new()?.download_voice(name, data_dir, &mut print_download)?;
    println!("\n✓ Voice ready! Use with: reed -m {name} \"Hello\"");
    Ok(ExitCode::SUCCESS)
}
