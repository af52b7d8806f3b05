mod game_input_handler;
mod game_renderer;
mod settings;
pub mod terminal_blockfall;

use std::{
    fs::File,
    io,
    path::{Path, PathBuf},
};

use clap::Parser;

use settings::Settings;

/// Terminal frontend for playing blockfall.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Falling speed from 1 (slow) to 10 (fast); gravity ticks every 1000/speed ms.
    #[arg(short, long)]
    speed: Option<u32>,
    /// JSON settings file (speed, game_fps, rows, columns, keybinds).
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Seed for a reproducible piece sequence.
    #[arg(long)]
    seed: Option<u64>,
    /// The framerate at which to run the main game.
    #[arg(short, long)]
    fps: Option<u32>,
    /// Where to write the log; verbosity is taken from `RUST_LOG`.
    #[arg(long, default_value = "blockfall.log")]
    log_file: PathBuf,
}

fn init_logging(path: &Path) -> io::Result<()> {
    // The terminal is in raw mode while playing, so log records go to a file.
    let file = File::create(path)?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn main() -> Result<(), io::Error> {
    let args = Args::parse();
    init_logging(&args.log_file)?;
    let mut settings = match &args.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if let Some(speed) = args.speed {
        settings.speed = speed;
    }
    if let Some(fps) = args.fps {
        settings.game_fps = fps.into();
    }
    let stdout = io::BufWriter::new(io::stdout());
    let msg = {
        let mut app = terminal_blockfall::App::new(stdout, settings, args.seed);
        app.run()?
    };
    println!("{msg}");
    Ok(())
}
