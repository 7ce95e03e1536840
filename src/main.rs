//! blockfall - a falling-block puzzle for the terminal.

mod audio;
mod bag;
mod board;
mod game;
mod input;
mod piece;
mod score;
mod tetromino;
mod ui;

use audio::MusicPlayer;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use game::{Action, Game};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    io::{self, stdout},
    path::PathBuf,
    time::{Duration, Instant},
};

/// 60 Hz engine tick.
const TICK_RATE: Duration = Duration::from_micros(1_000_000 / 60);

/// A falling-block puzzle for the terminal.
#[derive(Debug, Parser)]
#[command(name = "blockfall", version, about)]
struct Args {
    /// Path to an MP3/WAV soundtrack.
    #[arg(long, value_name = "FILE", default_value = "assets/music.mp3")]
    music: PathBuf,

    /// Play the soundtrack once instead of looping it.
    #[arg(long)]
    no_loop: bool,

    /// Disable music entirely.
    #[arg(long)]
    no_music: bool,
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    // Log to a file; the terminal belongs to the game.
    let log_dir = std::env::temp_dir().join("blockfall");
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::never(&log_dir, "blockfall.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("blockfall=debug".parse().unwrap()),
        )
        .with_ansi(false)
        .init();
    tracing::info!("blockfall starting up, log={}", log_dir.join("blockfall.log").display());

    let mut music = (!args.no_music).then(|| {
        let mut player = MusicPlayer::new(&args.music);
        player.set_looping(!args.no_loop);
        player.play();
        player
    });

    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run(&mut terminal);

    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;
    if let Some(player) = music.as_mut() {
        player.stop();
    }

    match &result {
        Ok(game) => {
            println!("Thanks for playing!");
            println!(
                "Score: {} | Level: {} | Lines: {}",
                game.score.points, game.score.level, game.score.lines
            );
        }
        Err(e) => eprintln!("blockfall exited with an error: {}", e),
    }

    result.map(|_| ())
}

/// The engine loop: one sequential owner of all game state. Input, gravity
/// and the line-clear flash are merged into this flow; a redraw happens at
/// most once per tick and only when something changed.
fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<Game> {
    let mut game = Game::new(Instant::now());
    let mut dirty = true;

    loop {
        if dirty {
            terminal.draw(|frame| ui::render(frame, &game))?;
            dirty = false;
        }

        // Wait up to one tick for input, then let time-driven state advance.
        if event::poll(TICK_RATE)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if let Some(action) = input::map_key(key) {
                        if action == Action::Quit {
                            tracing::info!("quit requested");
                            return Ok(game);
                        }
                        if game.apply(action, Instant::now()) {
                            dirty = true;
                        }
                    }
                }
                Event::Resize(_, _) => dirty = true,
                _ => {}
            }
        }

        if game.update(Instant::now()) {
            dirty = true;
        }
    }
}
