use crate::error::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Controller action requested from the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    StartCamera,
    StopCamera,
    SwitchCamera,
    CapturePhoto,
    ImportFromGallery,
    ClearGallery,
    DeleteSelected,
    SelectNext,
    Status,
    Quit,
}

/// Key bindings of the interactive shell
pub fn command_for_key(code: KeyCode, modifiers: KeyModifiers) -> Option<KeyCommand> {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Some(KeyCommand::Quit);
    }

    match code {
        KeyCode::Char('s') => Some(KeyCommand::StartCamera),
        KeyCode::Char('x') => Some(KeyCommand::StopCamera),
        KeyCode::Char('w') => Some(KeyCommand::SwitchCamera),
        KeyCode::Char(' ') | KeyCode::Enter => Some(KeyCommand::CapturePhoto),
        KeyCode::Char('g') => Some(KeyCommand::ImportFromGallery),
        KeyCode::Char('c') => Some(KeyCommand::ClearGallery),
        KeyCode::Char('d') | KeyCode::Delete => Some(KeyCommand::DeleteSelected),
        KeyCode::Char('n') | KeyCode::Right => Some(KeyCommand::SelectNext),
        KeyCode::Char('i') => Some(KeyCommand::Status),
        KeyCode::Char('q') | KeyCode::Esc => Some(KeyCommand::Quit),
        _ => None,
    }
}

/// Reads key presses in raw mode and forwards them as commands
pub struct KeyboardInputHandler {
    cancellation_token: CancellationToken,
}

impl KeyboardInputHandler {
    pub fn new() -> Self {
        Self {
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Start listening for keyboard input
    pub async fn start(&self, commands: mpsc::UnboundedSender<KeyCommand>) -> Result<()> {
        info!("Starting keyboard input handler");

        let cancellation_token = self.cancellation_token.clone();

        // crossterm polling blocks, keep it off the async workers
        task::spawn_blocking(move || {
            // Raw mode delivers single key presses without echo
            if let Err(e) = enable_raw_mode() {
                error!("Failed to enable raw mode for keyboard input: {}", e);
                let _ = commands.send(KeyCommand::Quit);
                return;
            }

            debug!("Raw mode enabled - keyboard handler active");

            loop {
                // Check if we should stop
                if cancellation_token.is_cancelled() {
                    debug!("Keyboard input handler stopping");
                    break;
                }

                // Short poll so cancellation is noticed quickly
                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => {
                        let Ok(Event::Key(key_event)) = event::read() else {
                            continue;
                        };
                        // Ignore release and repeat events
                        if key_event.kind != KeyEventKind::Press {
                            continue;
                        }

                        match command_for_key(key_event.code, key_event.modifiers) {
                            Some(command) => {
                                debug!("Key {:?} -> {:?}", key_event.code, command);
                                // Receiver gone or quit requested
                                if commands.send(command).is_err() || command == KeyCommand::Quit
                                {
                                    break;
                                }
                            }
                            None => debug!("Unbound key pressed: {:?}", key_event.code),
                        }
                    }
                    Ok(false) => {
                        // No event available, continue polling
                    }
                    Err(e) => {
                        warn!("Error polling for keyboard events: {}", e);
                    }
                }
            }

            // Leave raw mode before the task exits
            if let Err(e) = disable_raw_mode() {
                error!("Failed to disable raw mode: {}", e);
            } else {
                debug!("Raw mode disabled");
            }
        });

        Ok(())
    }

    /// Stop the keyboard input handler
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping keyboard input handler");
        self.cancellation_token.cancel();

        // Let the blocking task notice the token and leave raw mode
        tokio::time::sleep(Duration::from_millis(200)).await;
        // In case the task never got the chance
        let _ = disable_raw_mode();

        Ok(())
    }
}

impl Default for KeyboardInputHandler {
    fn default() -> Self {
        Self::new()
    }
}
