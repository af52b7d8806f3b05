/*!
The engine of a classic falling-block puzzle game.

A [`Game`] owns the [`Board`], the falling [`ActivePiece`] and the [`GravityTimer`], and is
driven entirely from the outside: frontends feed it [`Input`]s and the current [`GameTime`]
and draw whatever [`Game::state`] and [`Game::scene`] report afterwards.
*/

mod board;
mod gravity_timer;
mod piece;
mod tetromino;
mod tetromino_generators;

use std::{fmt, time::Duration};

pub use board::{Board, Line};
pub use gravity_timer::GravityTimer;
pub use piece::{ActivePiece, Position, RotationDirection};
pub use tetromino::{Shape, Tetromino, TileColor};
pub use tetromino_generators::UniformGenerator;

/// Time elapsed since the frontend's session started.
pub type GameTime = Duration;
pub type FeedbackEvents = Vec<(GameTime, Feedback)>;

#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Input {
    Start,
    Pause,
    MoveLeft,
    MoveRight,
    MoveDown,
    RotateClockwise,
    RotateCounterclockwise,
}

#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GameStatus {
    Idle,
    Running,
    Paused,
    GameOver,
}

/// Message shown on top of the board.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Overlay {
    Prompt,
    Started,
    Paused,
    Resumed,
    GameOver,
}

#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Feedback {
    Message(Overlay),
    PieceLocked(Tetromino),
    LinesCleared(usize),
}

#[derive(PartialEq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameConfig {
    pub rows: usize,
    pub columns: usize,
    pub tick_interval: Duration,
    /// Length of the move cooldown as a fraction of the current tick interval.
    pub move_throttle_factor: f64,
    pub line_clear_bonus: u32,
}

#[derive(Eq, PartialEq, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameState {
    pub status: GameStatus,
    pub board: Board,
    pub active_piece: Option<ActivePiece>,
    pub score: u32,
    pub lines_cleared: usize,
    pub overlay: Option<Overlay>,
    /// Invariant: active exactly while `status == GameStatus::Running`.
    pub gravity_timer: GravityTimer,
}

pub struct Game {
    config: GameConfig,
    state: GameState,
    move_throttled_until: Option<GameTime>,
    tetromino_generator: Box<dyn Iterator<Item = Tetromino>>,
}

impl Overlay {
    pub const fn text(&self) -> &'static str {
        match self {
            Overlay::Prompt => "Press space to start!",
            Overlay::Started => "Game Started!",
            Overlay::Paused => "Game Paused.",
            Overlay::Resumed => "Game Resumed.",
            Overlay::GameOver => "Game Over!",
        }
    }

    /// Whether the message disappears with the next gravity tick.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Overlay::Started | Overlay::Resumed)
    }
}

impl fmt::Display for Overlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            rows: Board::DEFAULT_ROWS,
            columns: Board::DEFAULT_COLUMNS,
            tick_interval: Duration::from_millis(500),
            move_throttle_factor: 0.2,
            line_clear_bonus: 100,
        }
    }
}

impl fmt::Debug for Game {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("Game")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("move_throttled_until", &self.move_throttled_until)
            .field(
                "tetromino_generator",
                &std::any::type_name_of_val(&self.tetromino_generator),
            )
            .finish()
    }
}

/// Maps a speed setting to a gravity interval of `1000 / speed` milliseconds.
///
/// Returns `None` for speeds that are not strictly positive and finite.
///
/// # Examples
///
/// ```
/// # use std::time::Duration;
/// # use blockfall_engine::tick_interval_for_speed;
/// assert_eq!(tick_interval_for_speed(2.0), Some(Duration::from_millis(500)));
/// assert_eq!(tick_interval_for_speed(0.0), None);
/// ```
pub fn tick_interval_for_speed(speed: f64) -> Option<Duration> {
    if !speed.is_finite() || speed <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(1.0 / speed)
        .ok()
        .filter(|interval| !interval.is_zero())
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        Self::with_generator(config, UniformGenerator::new())
    }

    /// A game whose pieces are drawn from `generator` instead of at random.
    ///
    /// Should the generator ever run dry, the next spawn ends the game. A zero
    /// `tick_interval` is replaced by the default one.
    pub fn with_generator<G>(mut config: GameConfig, generator: G) -> Self
    where
        G: IntoIterator<Item = Tetromino>,
        G::IntoIter: 'static,
    {
        if config.tick_interval.is_zero() {
            let tick_interval = GameConfig::default().tick_interval;
            log::warn!("zero gravity interval configured, using {tick_interval:?}");
            config.tick_interval = tick_interval;
        }
        let state = GameState {
            status: GameStatus::Idle,
            board: Board::new(config.rows, config.columns),
            active_piece: None,
            score: 0,
            lines_cleared: 0,
            overlay: Some(Overlay::Prompt),
            gravity_timer: GravityTimer::new(config.tick_interval),
        };
        Game {
            config,
            state,
            move_throttled_until: None,
            tetromino_generator: Box::new(generator.into_iter()),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn status(&self) -> GameStatus {
        self.state.status
    }

    pub fn tick_interval(&self) -> Duration {
        self.state.gravity_timer.interval()
    }

    /// When the next gravity tick is due, if the game is running.
    pub fn next_tick_at(&self) -> Option<GameTime> {
        self.state.gravity_timer.next_tick()
    }

    /// The board with the active piece painted in.
    pub fn scene(&self) -> Vec<Line> {
        let mut lines = self.state.board.lines().to_vec();
        if let Some(piece) = &self.state.active_piece {
            for ((x, y), color) in piece.tiles() {
                if let Some(cell) = usize::try_from(y)
                    .ok()
                    .zip(usize::try_from(x).ok())
                    .and_then(|(y, x)| lines.get_mut(y)?.get_mut(x))
                {
                    *cell = Some(color);
                }
            }
        }
        lines
    }

    /// Fires every gravity tick due at or before `time`.
    pub fn update(&mut self, time: GameTime) -> FeedbackEvents {
        let mut feedback_events = Vec::new();
        while let Some(tick_time) = self.state.gravity_timer.fire_due(time) {
            self.gravity_tick(tick_time, &mut feedback_events);
        }
        feedback_events
    }

    /// Applies a player input at `time`, after catching up on gravity.
    ///
    /// Inputs that are not valid in the current state are ignored.
    pub fn handle_input(&mut self, input: Input, time: GameTime) -> FeedbackEvents {
        let mut feedback_events = self.update(time);
        match (input, self.state.status) {
            (Input::Start, GameStatus::Idle | GameStatus::GameOver | GameStatus::Paused) => {
                self.start(time, &mut feedback_events);
            }
            (Input::Pause, GameStatus::Running) => {
                feedback_events.extend(self.pause(time));
            }
            (Input::Pause, GameStatus::Paused) => {
                feedback_events.extend(self.resume(time));
            }
            (Input::MoveLeft, GameStatus::Running) => {
                if self.throttle_allows(time) {
                    self.move_active_piece(-1, 0);
                }
            }
            (Input::MoveRight, GameStatus::Running) => {
                if self.throttle_allows(time) {
                    self.move_active_piece(1, 0);
                }
            }
            (Input::MoveDown, GameStatus::Running) => {
                if self.throttle_allows(time) {
                    self.drop_or_lock(time, &mut feedback_events);
                }
            }
            (Input::RotateClockwise, GameStatus::Running) => {
                self.rotate_active_piece(RotationDirection::Clockwise);
            }
            (Input::RotateCounterclockwise, GameStatus::Running) => {
                self.rotate_active_piece(RotationDirection::Counterclockwise);
            }
            (input, status) => {
                log::trace!("ignoring {input:?} while {status:?}");
            }
        }
        feedback_events
    }

    /// Suspends a running game. Does nothing in any other state.
    pub fn pause(&mut self, time: GameTime) -> FeedbackEvents {
        if self.state.status != GameStatus::Running {
            return Vec::new();
        }
        self.state.gravity_timer.stop();
        self.state.status = GameStatus::Paused;
        self.state.overlay = Some(Overlay::Paused);
        log::info!("game paused");
        vec![(time, Feedback::Message(Overlay::Paused))]
    }

    /// Continues a paused game. Does nothing in any other state.
    pub fn resume(&mut self, time: GameTime) -> FeedbackEvents {
        if self.state.status != GameStatus::Paused {
            return Vec::new();
        }
        self.state.gravity_timer.start(time);
        self.state.status = GameStatus::Running;
        self.state.overlay = Some(Overlay::Resumed);
        log::info!("game resumed");
        vec![(time, Feedback::Message(Overlay::Resumed))]
    }

    /// Speed-change notification: sets the gravity interval, restarting the timer if it runs.
    ///
    /// A zero interval is rejected and `false` returned.
    pub fn set_tick_interval(&mut self, interval: Duration, time: GameTime) -> bool {
        if interval.is_zero() {
            log::warn!("rejecting zero gravity interval");
            return false;
        }
        self.state.gravity_timer.set_interval(interval, time);
        log::info!("gravity interval set to {interval:?}");
        true
    }

    /// Current cooldown applied after a horizontal or downward move.
    pub fn move_throttle_window(&self) -> Duration {
        let factor = self.config.move_throttle_factor;
        if !factor.is_finite() || factor <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(self.tick_interval().as_secs_f64() * factor)
            .unwrap_or(Duration::ZERO)
    }

    fn start(&mut self, time: GameTime, feedback_events: &mut FeedbackEvents) {
        self.state.board.reset();
        self.state.score = 0;
        self.state.lines_cleared = 0;
        self.state.active_piece = None;
        self.move_throttled_until = None;
        self.state.status = GameStatus::Running;
        self.state.overlay = Some(Overlay::Started);
        self.state.gravity_timer.start(time);
        log::info!("game started");
        feedback_events.push((time, Feedback::Message(Overlay::Started)));
        self.spawn_piece(time, feedback_events);
    }

    fn end(&mut self, time: GameTime, feedback_events: &mut FeedbackEvents) {
        self.state.gravity_timer.stop();
        self.state.status = GameStatus::GameOver;
        self.state.overlay = Some(Overlay::GameOver);
        self.state.active_piece = None;
        log::info!(
            "game over with score {} after {} lines",
            self.state.score,
            self.state.lines_cleared
        );
        feedback_events.push((time, Feedback::Message(Overlay::GameOver)));
    }

    fn spawn_piece(&mut self, time: GameTime, feedback_events: &mut FeedbackEvents) {
        let Some(tetromino) = self.tetromino_generator.next() else {
            log::warn!("piece generator ran out");
            self.end(time, feedback_events);
            return;
        };
        let piece = ActivePiece::spawn(tetromino, &self.state.board);
        // Newly spawned piece conflicts with board - Game over.
        if !piece.fits(&self.state.board) {
            self.end(time, feedback_events);
            return;
        }
        log::debug!("spawned {tetromino} at {:?}", piece.pos);
        self.state.active_piece = Some(piece);
    }

    fn gravity_tick(&mut self, time: GameTime, feedback_events: &mut FeedbackEvents) {
        if self.state.overlay.is_some_and(|overlay| overlay.is_transient()) {
            self.state.overlay = None;
        }
        self.drop_or_lock(time, feedback_events);
    }

    fn drop_or_lock(&mut self, time: GameTime, feedback_events: &mut FeedbackEvents) {
        let Some(piece) = self.state.active_piece.as_mut() else {
            return;
        };
        if !piece.translate(&self.state.board, 0, 1) {
            self.lock_active_piece(time, feedback_events);
        }
    }

    fn lock_active_piece(&mut self, time: GameTime, feedback_events: &mut FeedbackEvents) {
        let Some(piece) = self.state.active_piece.take() else {
            return;
        };
        piece.lock_into(&mut self.state.board);
        log::debug!("locked {} at {:?}", piece.tetromino, piece.pos);
        feedback_events.push((time, Feedback::PieceLocked(piece.tetromino)));
        let n_lines_cleared = self.state.board.clear_full_lines();
        if n_lines_cleared > 0 {
            let bonus = self.config.line_clear_bonus;
            self.state.score = self
                .state
                .score
                .saturating_add(bonus.saturating_mul(n_lines_cleared as u32));
            self.state.lines_cleared += n_lines_cleared;
            log::debug!(
                "cleared {n_lines_cleared} lines, score {}",
                self.state.score
            );
            feedback_events.push((time, Feedback::LinesCleared(n_lines_cleared)));
        }
        self.spawn_piece(time, feedback_events);
    }

    fn move_active_piece(&mut self, dx: isize, dy: isize) -> bool {
        self.state
            .active_piece
            .as_mut()
            .is_some_and(|piece| piece.translate(&self.state.board, dx, dy))
    }

    fn rotate_active_piece(&mut self, direction: RotationDirection) -> bool {
        self.state
            .active_piece
            .as_mut()
            .is_some_and(|piece| piece.rotate(&self.state.board, direction))
    }

    fn throttle_allows(&mut self, time: GameTime) -> bool {
        if self
            .move_throttled_until
            .is_some_and(|throttled_until| time < throttled_until)
        {
            return false;
        }
        self.move_throttled_until = Some(time + self.move_throttle_window());
        true
    }
}
