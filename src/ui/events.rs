// Keyboard and mouse input, bridged from crossterm's blocking event API
// into the async app loop over a channel.

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEventKind};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

const INPUT_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub enum AppEvent {
    Quit,
    TogglePlayPause,
    NextTrack,
    PreviousTrack,
    SeekForward,
    SeekBackward,
    /// Left click somewhere on screen; the app decides whether it landed on
    /// the progress bar.
    Click { column: u16, row: u16 },
    ReloadScene,
}

pub struct EventHandler {
    receiver: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    /// Spawn the blocking input reader and hand back the receiving side.
    pub fn spawn() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();

        tokio::task::spawn_blocking(move || loop {
            match event::poll(INPUT_POLL) {
                Ok(true) => {
                    let Ok(raw) = event::read() else { continue };
                    let Some(app_event) = translate(raw) else { continue };
                    if sender.send(app_event).is_err() {
                        // App loop is gone, nothing left to do.
                        break;
                    }
                }
                Ok(false) => {
                    if sender.is_closed() {
                        break;
                    }
                }
                Err(err) => {
                    debug!("Input poll failed: {}", err);
                    break;
                }
            }
        });

        Self { receiver }
    }

    pub async fn next_event(&mut self) -> Option<AppEvent> {
        self.receiver.recv().await
    }
}

fn translate(raw: Event) -> Option<AppEvent> {
    match raw {
        Event::Key(KeyEvent {
            code,
            kind: KeyEventKind::Press,
            ..
        }) => match code {
            KeyCode::Char('q') | KeyCode::Esc => Some(AppEvent::Quit),
            KeyCode::Char(' ') => Some(AppEvent::TogglePlayPause),
            KeyCode::Char('n') => Some(AppEvent::NextTrack),
            KeyCode::Char('p') => Some(AppEvent::PreviousTrack),
            KeyCode::Right => Some(AppEvent::SeekForward),
            KeyCode::Left => Some(AppEvent::SeekBackward),
            KeyCode::Char('r') => Some(AppEvent::ReloadScene),
            _ => None,
        },
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => Some(AppEvent::Click {
                column: mouse.column,
                row: mouse.row,
            }),
            _ => None,
        },
        _ => None,
    }
}
