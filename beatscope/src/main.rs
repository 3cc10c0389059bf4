mod audio;
mod audio_api;
mod cli;
mod error;
mod loader;
mod middle;
mod pipeline;
mod sequencer;
mod shared;
#[cfg(test)]
mod testing;
mod tui;
mod viz;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use crossterm::terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use audio_api::AudioCommand;
use loader::sample_loader;
use middle::Middle;
use pipeline::persistence;
use sequencer::PatternLibrary;
use shared::InputEvent;
use viz::PixelSurface;

fn main() {
    let args = cli::Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

// The terminal belongs to the UI, so logs go to a file.
fn init_logging(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

// Built-in patterns plus <project>/.beatscope/patterns.json when present.
fn load_library(project_dir: &Path) -> PatternLibrary {
    let mut library = PatternLibrary::builtin();
    let path = persistence::patterns_file_path(project_dir);
    if path.exists() {
        match library.extend_from_file(&path) {
            Ok(count) => info!(count, "loaded user patterns from {}", path.display()),
            Err(err) => warn!("ignoring {}: {err:#}", path.display()),
        }
    }
    library
}

fn run(args: cli::Args) -> anyhow::Result<()> {
    let project_dir = match args.project_dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("no current directory")?,
    };
    let log_path = args.log_file.unwrap_or_else(|| persistence::default_log_path(&project_dir));
    init_logging(&log_path)?;

    let seed = args.seed.unwrap_or_else(rand::random);
    info!(project = %project_dir.display(), seed, "starting");

    let state = persistence::load_project(&project_dir).unwrap_or_default();
    let fps = (args.fps > 0).then_some(args.fps);
    let mut middle = Middle::new(state, load_library(&project_dir), seed, fps)?;

    let mut audio = audio::start_audio()?;
    for (sound, buffer) in sample_loader::load_kit(&project_dir, audio.sample_rate()) {
        audio.send(AudioCommand::RegisterSample { sound, buffer });
    }
    for cmd in middle.take_commands() {
        audio.send(cmd);
    }
    let mut tap = audio.take_tap().context("analysis tap unavailable")?;

    terminal::enable_raw_mode()?;
    // Enable keyboard enhancement for real press/release detection.
    // Falls back gracefully if the terminal doesn't support it.
    let _ = crossterm::execute!(
        std::io::stdout(),
        crossterm::event::PushKeyboardEnhancementFlags(
            crossterm::event::KeyboardEnhancementFlags::REPORT_EVENT_TYPES
        )
    );
    let _guard = RawModeGuard; // auto drops when out of scope

    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let tick_rate = Duration::from_millis(16); // ~60fps
    let started = Instant::now();
    let mut surface = PixelSurface::new(0, 0);
    let mut tui_state = tui::mode::TuiState::default();

    loop {
        let size = term.size()?;
        let viz_area = tui::view::viz_area(Rect::new(0, 0, size.width, size.height));
        surface.resize(viz_area.width as u32, viz_area.height as u32 * 2);
        // a skipped frame leaves the previous picture on the surface
        middle.draw(started.elapsed().as_secs_f64() * 1000.0, &mut tap, &mut surface);

        let ds = middle.display_state();
        term.draw(|frame| {
            tui::view::render(frame, frame.area(), &ds, &surface);
        })?;

        for event in tui::input::poll_input(tick_rate, &mut tui_state)? {
            if event == InputEvent::Quit {
                // save before quitting
                if let Err(err) = persistence::save_project(&project_dir, middle.state()) {
                    warn!("could not save project: {err:#}");
                }
                info!("quit");
                return Ok(());
            }
            for cmd in middle.handle_input(event) {
                audio.send(cmd);
            }
        }

        for cmd in middle.tick(audio.now()) {
            audio.send(cmd);
        }
    }
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = crossterm::execute!(
            std::io::stdout(),
            crossterm::event::PopKeyboardEnhancementFlags
        );
        let _ = terminal::disable_raw_mode();
    }
}
