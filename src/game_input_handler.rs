use std::{
    collections::HashMap,
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::Sender,
        Arc,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use blockfall_engine::Input;

#[derive(Eq, PartialEq, Clone, Copy, Hash, Debug)]
pub enum Command {
    Game(Input),
    SpeedUp,
    SpeedDown,
    Quit,
}

pub type CommandSignal = (Instant, Command);

#[derive(Debug)]
pub struct CrosstermHandler {
    handles: Option<(JoinHandle<()>, Arc<AtomicBool>)>,
}

impl Drop for CrosstermHandler {
    fn drop(&mut self) {
        if let Some((_handle, running_flag)) = self.handles.take() {
            running_flag.store(false, Ordering::Release);
        }
    }
}

impl CrosstermHandler {
    const POLL_INTERVAL: Duration = Duration::from_millis(50);

    pub fn new(sender: &Sender<CommandSignal>, keybinds: &HashMap<KeyCode, Input>) -> Self {
        let flag = Arc::new(AtomicBool::new(true));
        let handle = Self::spawn(sender.clone(), flag.clone(), keybinds.clone());
        CrosstermHandler {
            handles: Some((handle, flag)),
        }
    }

    fn spawn(
        sender: Sender<CommandSignal>,
        flag: Arc<AtomicBool>,
        keybinds: HashMap<KeyCode, Input>,
    ) -> JoinHandle<()> {
        thread::spawn(move || {
            while flag.load(Ordering::Acquire) {
                // Poll so the stop flag is seen without waiting for another key.
                if let Some(delay) = Self::poll_delay(event::poll(Self::POLL_INTERVAL)) {
                    thread::sleep(delay);
                    continue;
                }
                let event = match event::read() {
                    Ok(event) => event,
                    // Spurious io::Error: ignore.
                    Err(_) => continue,
                };
                let instant = Instant::now();
                let Some(command) = command_for_event(&event, &keybinds) else {
                    continue;
                };
                if sender.send((instant, command)).is_err() {
                    // Receiver gone: nobody left to play.
                    break;
                }
            }
        })
    }

    /// Pause before the next poll, or `None` if an event is ready to be read.
    ///
    /// A failing poll returns at once, so errors back off for a full interval.
    fn poll_delay(poll_result: io::Result<bool>) -> Option<Duration> {
        match poll_result {
            Ok(true) => None,
            Ok(false) => Some(Duration::ZERO),
            Err(err) => {
                log::debug!("polling terminal events failed: {err}");
                Some(Self::POLL_INTERVAL)
            }
        }
    }
}

/// Maps a terminal event to a command, or `None` if the event is irrelevant.
pub fn command_for_event(event: &Event, keybinds: &HashMap<KeyCode, Input>) -> Option<Command> {
    let Event::Key(KeyEvent {
        code,
        modifiers,
        kind: KeyEventKind::Press | KeyEventKind::Repeat,
        ..
    }) = event
    else {
        return None;
    };
    match code {
        KeyCode::Esc => Some(Command::Quit),
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Some(Command::Quit),
        KeyCode::Char('+') => Some(Command::SpeedUp),
        KeyCode::Char('-') => Some(Command::SpeedDown),
        code => keybinds.get(code).map(|&input| Command::Game(input)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::default_keybinds;

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn bound_keys_become_game_inputs() {
        let keybinds = default_keybinds();
        assert_eq!(
            command_for_event(&press(KeyCode::Char('x')), &keybinds),
            Some(Command::Game(Input::RotateCounterclockwise))
        );
        assert_eq!(
            command_for_event(&press(KeyCode::Left), &keybinds),
            Some(Command::Game(Input::MoveLeft))
        );
        assert_eq!(command_for_event(&press(KeyCode::Char('q')), &keybinds), None);
    }

    #[test]
    fn quit_and_speed_keys() {
        let keybinds = default_keybinds();
        assert_eq!(command_for_event(&press(KeyCode::Esc), &keybinds), Some(Command::Quit));
        let ctrl_c = Event::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(command_for_event(&ctrl_c, &keybinds), Some(Command::Quit));
        assert_eq!(command_for_event(&press(KeyCode::Char('c')), &keybinds), None);
        assert_eq!(
            command_for_event(&press(KeyCode::Char('+')), &keybinds),
            Some(Command::SpeedUp)
        );
        assert_eq!(
            command_for_event(&press(KeyCode::Char('-')), &keybinds),
            Some(Command::SpeedDown)
        );
    }

    #[test]
    fn failing_poll_backs_off() {
        let not_a_tty = io::Error::other("not a tty");
        assert_eq!(
            CrosstermHandler::poll_delay(Err(not_a_tty)),
            Some(CrosstermHandler::POLL_INTERVAL)
        );
        assert_eq!(CrosstermHandler::poll_delay(Ok(false)), Some(Duration::ZERO));
        assert_eq!(CrosstermHandler::poll_delay(Ok(true)), None);
    }

    #[test]
    fn releases_and_other_events_are_ignored() {
        let keybinds = default_keybinds();
        let release = Event::Key(KeyEvent::new_with_kind(
            KeyCode::Down,
            KeyModifiers::NONE,
            KeyEventKind::Release,
        ));
        assert_eq!(command_for_event(&release, &keybinds), None);
        assert_eq!(command_for_event(&Event::Resize(80, 24), &keybinds), None);
        assert_eq!(command_for_event(&Event::FocusLost, &keybinds), None);
    }
}
