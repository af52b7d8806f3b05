use std::{
    io::{self, Write},
    sync::mpsc,
    time::{Duration, Instant},
};

use crossterm::{cursor, event::KeyCode, style, terminal, ExecutableCommand};
use blockfall_engine::{Game, GameTime, UniformGenerator};

use crate::game_input_handler::{Command, CommandSignal, CrosstermHandler};
use crate::game_renderer::{GameScreenRenderer, UnicodeRenderer};
use crate::settings::Settings;

#[derive(Debug)]
pub struct App<T: Write> {
    pub term: T,
    pub settings: Settings,
    seed: Option<u64>,
}

impl<T: Write> Drop for App<T> {
    fn drop(&mut self) {
        // Console epilogue: de-initialization.
        let _ = terminal::disable_raw_mode();
        let _ = self.term.execute(terminal::LeaveAlternateScreen);
        let _ = self.term.execute(style::ResetColor);
        let _ = self.term.execute(cursor::Show);
    }
}

impl<T: Write> App<T> {
    pub fn new(mut terminal: T, settings: Settings, seed: Option<u64>) -> Self {
        // Console prologue: initialization.
        let _ = terminal.execute(terminal::EnterAlternateScreen);
        let _ = terminal.execute(terminal::SetTitle("Blockfall"));
        let _ = terminal.execute(cursor::Hide);
        let _ = terminal::enable_raw_mode();
        Self {
            term: terminal,
            settings: settings.validated(),
            seed,
        }
    }

    /// Plays until the player quits, returning a farewell message.
    pub fn run(&mut self) -> io::Result<String> {
        let config = self.settings.game_config();
        let mut game = match self.seed {
            Some(seed) => Game::with_generator(config, UniformGenerator::seeded(seed)),
            None => Game::new(config),
        };
        log::info!("new session: {:?}", game.config());
        let (tx, rx) = mpsc::channel::<CommandSignal>();
        let _input_handler = CrosstermHandler::new(&tx, &self.settings.keybinds);
        let mut renderer = UnicodeRenderer::default();
        let session_started = Instant::now();
        // Engine time must never run backwards, even for inputs read before the last update.
        let mut game_time = GameTime::ZERO;
        let mut advance = |instant: Instant| {
            game_time = game_time.max(instant.saturating_duration_since(session_started));
            game_time
        };
        renderer.render(&mut self.term, &game, &self.settings, Vec::new())?;
        let mut f = 0u32;
        let msg = 'render_loop: loop {
            // Start next frame
            f += 1;
            let next_frame_at =
                session_started + Duration::from_secs_f64(f64::from(f) / self.settings.game_fps);
            let mut new_feedback_events = Vec::new();
            'idle_loop: loop {
                let frame_idle_remaining = next_frame_at.saturating_duration_since(Instant::now());
                match rx.recv_timeout(frame_idle_remaining) {
                    Ok((_, Command::Quit)) => {
                        break 'render_loop format!(
                            "quit with score {} after {} lines",
                            game.state().score,
                            game.state().lines_cleared
                        );
                    }
                    Ok((instant, Command::Game(input))) => {
                        let now = advance(instant);
                        new_feedback_events.extend(game.handle_input(input, now));
                        continue 'idle_loop;
                    }
                    Ok((instant, Command::SpeedUp)) => {
                        self.change_speed(&mut game, 1, advance(instant));
                        continue 'idle_loop;
                    }
                    Ok((instant, Command::SpeedDown)) => {
                        self.change_speed(&mut game, -1, advance(instant));
                        continue 'idle_loop;
                    }
                    Err(mpsc::RecvTimeoutError::Timeout) => {
                        let now = advance(Instant::now());
                        new_feedback_events.extend(game.update(now));
                        break 'idle_loop;
                    }
                    Err(mpsc::RecvTimeoutError::Disconnected) => {
                        break 'render_loop String::from("input handler disconnected");
                    }
                };
            }
            renderer.render(&mut self.term, &game, &self.settings, new_feedback_events)?;
        };
        log::info!("session ended: {msg}");
        Ok(msg)
    }

    fn change_speed(&mut self, game: &mut Game, delta: i32, time: GameTime) {
        if self.settings.nudge_speed(delta) {
            game.set_tick_interval(self.settings.tick_interval(), time);
        }
    }
}

pub fn format_key(key: KeyCode) -> String {
    format!(
        "[{}]",
        match key {
            KeyCode::Char(' ') => "Space".to_string(),
            KeyCode::Left => "←".to_string(),
            KeyCode::Right => "→".to_string(),
            KeyCode::Up => "↑".to_string(),
            KeyCode::Down => "↓".to_string(),
            KeyCode::Enter => "Enter".to_string(),
            KeyCode::Tab => "Tab".to_string(),
            KeyCode::F(n) => format!("F{n}"),
            KeyCode::Char(c) => c.to_uppercase().to_string(),
            KeyCode::Esc => "Esc".to_string(),
            k => format!("{:?}", k),
        }
    )
}
