use std::{collections::HashMap, fs, io, path::Path, time::Duration};

use blockfall_engine::{tick_interval_for_speed, Board, GameConfig, Input};
use crossterm::event::KeyCode;

/// User-adjustable frontend settings, loadable from a JSON file.
///
/// Missing fields fall back to [`Settings::default`].
#[serde_with::serde_as]
#[derive(PartialEq, Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Speed slider value; gravity ticks every `1000 / speed` ms.
    pub speed: u32,
    pub game_fps: f64,
    pub rows: usize,
    pub columns: usize,
    #[serde_as(as = "Vec<(_, _)>")]
    pub keybinds: HashMap<KeyCode, Input>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            speed: 2,
            game_fps: 30.0,
            rows: Board::DEFAULT_ROWS,
            columns: Board::DEFAULT_COLUMNS,
            keybinds: default_keybinds(),
        }
    }
}

pub fn default_keybinds() -> HashMap<KeyCode, Input> {
    HashMap::from([
        (KeyCode::Char(' '), Input::Start),
        (KeyCode::Char('p'), Input::Pause),
        (KeyCode::Left, Input::MoveLeft),
        (KeyCode::Right, Input::MoveRight),
        (KeyCode::Down, Input::MoveDown),
        (KeyCode::Char('z'), Input::RotateClockwise),
        (KeyCode::Char('x'), Input::RotateCounterclockwise),
    ])
}

impl Settings {
    pub const MIN_SPEED: u32 = 1;
    pub const MAX_SPEED: u32 = 10;
    // Widest piece is four cells, tallest four rows.
    const MIN_ROWS: usize = 4;
    const MIN_COLUMNS: usize = 4;
    // Keeps every screen coordinate of the board and panel within `u16`.
    const MAX_ROWS: usize = 200;
    const MAX_COLUMNS: usize = 200;

    pub fn load(path: &Path) -> io::Result<Self> {
        let settings_str = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&settings_str)?;
        Ok(settings)
    }

    /// Replaces out-of-range values with the nearest usable ones.
    pub fn validated(mut self) -> Self {
        let speed = self.speed.clamp(Self::MIN_SPEED, Self::MAX_SPEED);
        if speed != self.speed {
            log::warn!("speed {} out of range, using {speed}", self.speed);
            self.speed = speed;
        }
        if !self.game_fps.is_finite() || self.game_fps <= 0.0 {
            let game_fps = Settings::default().game_fps;
            log::warn!("invalid frame rate {}, using {game_fps}", self.game_fps);
            self.game_fps = game_fps;
        }
        if self.rows < Self::MIN_ROWS || self.columns < Self::MIN_COLUMNS {
            log::warn!(
                "board {}x{} too small, using at least {}x{}",
                self.columns,
                self.rows,
                Self::MIN_COLUMNS,
                Self::MIN_ROWS
            );
            self.rows = self.rows.max(Self::MIN_ROWS);
            self.columns = self.columns.max(Self::MIN_COLUMNS);
        }
        if self.rows > Self::MAX_ROWS || self.columns > Self::MAX_COLUMNS {
            log::warn!(
                "board {}x{} too large, using at most {}x{}",
                self.columns,
                self.rows,
                Self::MAX_COLUMNS,
                Self::MAX_ROWS
            );
            self.rows = self.rows.min(Self::MAX_ROWS);
            self.columns = self.columns.min(Self::MAX_COLUMNS);
        }
        self
    }

    pub fn tick_interval(&self) -> Duration {
        tick_interval_for_speed(f64::from(self.speed))
            .unwrap_or_else(|| GameConfig::default().tick_interval)
    }

    /// Moves the speed slider by `delta`, staying in range. Returns whether it changed.
    pub fn nudge_speed(&mut self, delta: i32) -> bool {
        let speed = self
            .speed
            .saturating_add_signed(delta)
            .clamp(Self::MIN_SPEED, Self::MAX_SPEED);
        let changed = speed != self.speed;
        self.speed = speed;
        changed
    }

    pub fn game_config(&self) -> GameConfig {
        GameConfig {
            rows: self.rows,
            columns: self.columns,
            tick_interval: self.tick_interval(),
            ..GameConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_controls() {
        let settings = Settings::default();
        assert_eq!(settings.tick_interval(), Duration::from_millis(500));
        assert_eq!(settings.keybinds[&KeyCode::Char(' ')], Input::Start);
        assert_eq!(settings.keybinds[&KeyCode::Char('z')], Input::RotateClockwise);
        assert_eq!(settings.keybinds.len(), 7);
        let config = settings.game_config();
        assert_eq!((config.rows, config.columns), (20, 10));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let settings: Settings = serde_json::from_str(r#"{ "speed": 5, "columns": 12 }"#).unwrap();
        assert_eq!(settings.speed, 5);
        assert_eq!(settings.columns, 12);
        assert_eq!(settings.rows, 20);
        assert_eq!(settings.keybinds, default_keybinds());
        assert_eq!(settings.tick_interval(), Duration::from_millis(200));
    }

    #[test]
    fn keybinds_survive_json() {
        let mut settings = Settings::default();
        settings.keybinds.insert(KeyCode::Up, Input::RotateClockwise);
        let json = serde_json::to_string(&settings).unwrap();
        let parsed: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn malformed_file_is_an_io_error() {
        let path = std::env::temp_dir().join(format!("blockfall-settings-{}.json", std::process::id()));
        fs::write(&path, "{ speed: fast }").unwrap();
        let err = Settings::load(&path).unwrap_err();
        fs::remove_file(&path).unwrap();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn validation_clamps_values() {
        let settings = Settings {
            speed: 0,
            game_fps: f64::NAN,
            rows: 2,
            columns: 30,
            ..Settings::default()
        }
        .validated();
        assert_eq!(settings.speed, Settings::MIN_SPEED);
        assert_eq!(settings.game_fps, 30.0);
        assert_eq!((settings.rows, settings.columns), (4, 30));
        let fast = Settings { speed: 99, ..Settings::default() }.validated();
        assert_eq!(fast.speed, Settings::MAX_SPEED);
        let huge = Settings {
            rows: 100_000,
            columns: 40_000,
            ..Settings::default()
        }
        .validated();
        assert_eq!((huge.rows, huge.columns), (Settings::MAX_ROWS, Settings::MAX_COLUMNS));
    }

    #[test]
    fn nudging_speed_stays_in_range() {
        let mut settings = Settings::default();
        assert!(settings.nudge_speed(1));
        assert_eq!(settings.tick_interval().as_millis(), 333);
        settings.speed = Settings::MAX_SPEED;
        assert!(!settings.nudge_speed(1));
        settings.speed = Settings::MIN_SPEED;
        assert!(!settings.nudge_speed(-1));
        assert!(settings.nudge_speed(4));
        assert_eq!(settings.speed, 5);
    }
}
