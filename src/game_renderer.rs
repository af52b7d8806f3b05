use std::{
    collections::VecDeque,
    io::{self, Write},
};

use crossterm::{
    cursor::MoveTo,
    style::{Color, Print, PrintStyledContent, Stylize},
    terminal, QueueableCommand,
};
use blockfall_engine::{Feedback, FeedbackEvents, Game, GameStatus, GameTime, Input, TileColor};

use crate::settings::Settings;

pub trait GameScreenRenderer {
    fn render<T>(
        &mut self,
        term: &mut T,
        game: &Game,
        settings: &Settings,
        new_feedback_events: FeedbackEvents,
    ) -> io::Result<()>
    where
        T: Write;
}

#[derive(Clone, Default, Debug)]
pub struct UnicodeRenderer {
    recent_feedback: VecDeque<(GameTime, Feedback)>,
}

impl UnicodeRenderer {
    const RECENT_FEEDBACK_LEN: usize = 5;
    const PANEL_WIDTH: u16 = 24;
}

pub fn tile_color(tile: TileColor) -> Color {
    match tile {
        TileColor::Cyan => Color::Rgb { r: 0, g: 159, b: 218 },
        TileColor::Blue => Color::Rgb { r: 0, g: 101, b: 189 },
        TileColor::Orange => Color::Rgb { r: 255, g: 121, b: 0 },
        TileColor::Yellow => Color::Rgb { r: 254, g: 203, b: 0 },
        TileColor::Green => Color::Rgb { r: 105, g: 190, b: 40 },
        TileColor::Purple => Color::Rgb { r: 149, g: 45, b: 152 },
        TileColor::Red => Color::Rgb { r: 237, g: 41, b: 57 },
    }
}

fn describe(feedback: &Feedback) -> String {
    match feedback {
        Feedback::Message(overlay) => overlay.text().to_string(),
        Feedback::PieceLocked(tetromino) => format!("{tetromino} locked"),
        Feedback::LinesCleared(1) => "Single!".to_string(),
        Feedback::LinesCleared(2) => "Double!".to_string(),
        Feedback::LinesCleared(3) => "Triple!".to_string(),
        Feedback::LinesCleared(n) => format!("{n} lines!"),
    }
}

fn format_keybinds(input: Input, settings: &Settings) -> String {
    let mut keys: Vec<String> = settings
        .keybinds
        .iter()
        .filter(|&(_, &bound)| bound == input)
        .map(|(key, _)| crate::terminal_blockfall::format_key(*key))
        .collect();
    keys.sort();
    keys.join(" ")
}

impl GameScreenRenderer for UnicodeRenderer {
    fn render<T>(
        &mut self,
        term: &mut T,
        game: &Game,
        settings: &Settings,
        new_feedback_events: FeedbackEvents,
    ) -> io::Result<()>
    where
        T: Write,
    {
        for evt in new_feedback_events {
            self.recent_feedback.push_front(evt);
        }
        self.recent_feedback.truncate(Self::RECENT_FEEDBACK_LEN);
        let state = game.state();
        let scene = game.scene();
        let rows = u16::try_from(scene.len()).unwrap_or(u16::MAX);
        let columns = u16::try_from(game.config().columns).unwrap_or(u16::MAX);
        let w_board = columns.saturating_mul(2).saturating_add(2);
        let h_board = rows.saturating_add(2);
        let (w_console, h_console) = terminal::size().unwrap_or((0, 0));
        let x_main = w_console.saturating_sub(w_board.saturating_add(Self::PANEL_WIDTH)) / 2;
        let y_main = h_console.saturating_sub(h_board) / 2;
        // Begin frame update.
        term.queue(terminal::BeginSynchronizedUpdate)?
            .queue(terminal::Clear(terminal::ClearType::All))?;
        // Board: frame.
        let horizontal = "═".repeat(2 * usize::from(columns));
        term.queue(MoveTo(x_main, y_main))?
            .queue(Print(format!("╔{horizontal}╗")))?;
        for y in 1..=rows {
            term.queue(MoveTo(x_main, y_main.saturating_add(y)))?
                .queue(Print("║"))?
                .queue(MoveTo(
                    x_main.saturating_add(w_board - 1),
                    y_main.saturating_add(y),
                ))?
                .queue(Print("║"))?;
        }
        term.queue(MoveTo(x_main, y_main.saturating_add(h_board - 1)))?
            .queue(Print(format!("╚{horizontal}╝")))?;
        // Board: grid dots, locked tiles and the active piece.
        for (y, line) in (0u16..).zip(scene.iter()) {
            term.queue(MoveTo(x_main + 1, y_main.saturating_add(1).saturating_add(y)))?;
            for cell in line {
                match cell {
                    Some(tile) => term.queue(PrintStyledContent("██".with(tile_color(*tile))))?,
                    None => term.queue(PrintStyledContent(" .".dark_grey()))?,
                };
            }
        }
        // Overlay bar across the middle of the board.
        if let Some(overlay) = state.overlay {
            let w = usize::from(w_board);
            let text: String = overlay.text().chars().take(w).collect();
            term.queue(MoveTo(x_main, y_main.saturating_add(1 + rows / 2)))?
                .queue(PrintStyledContent(format!("{text:^w$}").bold().reverse()))?;
        }
        // Side panel.
        let status = match state.status {
            GameStatus::Idle => "Ready",
            GameStatus::Running => "Playing",
            GameStatus::Paused => "Paused",
            GameStatus::GameOver => "Game over",
        };
        #[rustfmt::skip]
        let mut panel = vec![
            format!("Score:  {:>8}", state.score),
            format!("Lines:  {:>8}", state.lines_cleared),
            format!("Speed:  {:>2} ({}ms)", settings.speed, game.tick_interval().as_millis()),
            format!("Status: {status}"),
            String::new(),
            format!("Start   {}", format_keybinds(Input::Start, settings)),
            format!("Pause   {}", format_keybinds(Input::Pause, settings)),
            format!("Move    {} {} {}",
                format_keybinds(Input::MoveLeft, settings),
                format_keybinds(Input::MoveRight, settings),
                format_keybinds(Input::MoveDown, settings)),
            format!("Rotate  {} {}",
                format_keybinds(Input::RotateClockwise, settings),
                format_keybinds(Input::RotateCounterclockwise, settings)),
            "Speed   + -".to_string(),
            "Quit    Esc".to_string(),
            String::new(),
        ];
        panel.extend(self.recent_feedback.iter().map(|(_, fb)| describe(fb)));
        let x_panel = x_main.saturating_add(w_board).saturating_add(2);
        for (y, line) in (0u16..).zip(panel.iter()) {
            term.queue(MoveTo(x_panel, y_main.saturating_add(1).saturating_add(y)))?
                .queue(Print(line))?;
        }
        term.queue(MoveTo(0, 0))?
            .queue(terminal::EndSynchronizedUpdate)?;
        term.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use blockfall_engine::{GameConfig, Tetromino};

    use super::*;

    fn render_to_string(renderer: &mut UnicodeRenderer, game: &Game, events: FeedbackEvents) -> String {
        let mut out = Vec::new();
        renderer
            .render(&mut out, game, &Settings::default(), events)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn idle_screen_shows_prompt_and_controls() {
        let game = Game::with_generator(GameConfig::default(), vec![Tetromino::T]);
        let screen = render_to_string(&mut UnicodeRenderer::default(), &game, Vec::new());
        assert!(screen.contains("Press space to start!"));
        assert!(screen.contains("Score:         0"));
        assert!(screen.contains("Speed:   2 (500ms)"));
        assert!(screen.contains("Rotate  [Z] [X]"));
        assert!(screen.contains("Start   [Space]"));
        assert_eq!(screen.matches(" .").count(), 200);
        assert!(!screen.contains("██"));
    }

    #[test]
    fn running_screen_draws_piece_and_feedback() {
        let mut game = Game::with_generator(GameConfig::default(), vec![Tetromino::O; 2]);
        let events = game.handle_input(Input::Start, Duration::ZERO);
        let mut renderer = UnicodeRenderer::default();
        let screen = render_to_string(&mut renderer, &game, events);
        assert_eq!(screen.matches("██").count(), 4);
        assert!(screen.contains("Game Started!"));
        assert!(screen.contains("Status: Playing"));
        // Transient overlay is gone after a tick but stays in the feedback list.
        let events = game.update(Duration::from_millis(500));
        let screen = render_to_string(&mut renderer, &game, events);
        assert_eq!(screen.matches("Game Started!").count(), 1);
    }

    #[test]
    fn feedback_list_is_bounded() {
        let game = Game::with_generator(GameConfig::default(), vec![Tetromino::T]);
        let mut renderer = UnicodeRenderer::default();
        let events = (0..10)
            .map(|i| (Duration::from_millis(i), Feedback::LinesCleared(2)))
            .collect();
        let screen = render_to_string(&mut renderer, &game, events);
        assert_eq!(screen.matches("Double!").count(), UnicodeRenderer::RECENT_FEEDBACK_LEN);
    }

    #[test]
    fn oversized_board_setting_renders() {
        let settings = Settings {
            columns: 40_000,
            ..Settings::default()
        }
        .validated();
        let game = Game::new(settings.game_config());
        let mut out = Vec::new();
        UnicodeRenderer::default()
            .render(&mut out, &game, &settings, Vec::new())
            .unwrap();
        let screen = String::from_utf8(out).unwrap();
        assert_eq!(screen.matches(" .").count(), 20 * 200);
    }

    #[test]
    fn describes_feedback() {
        assert_eq!(describe(&Feedback::PieceLocked(Tetromino::S)), "S locked");
        assert_eq!(describe(&Feedback::LinesCleared(4)), "4 lines!");
    }
}
