use std::path::PathBuf;
use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind, MouseEvent};
use tokio::sync::mpsc;

use crate::browser::remote::PackageRecord;
use crate::error::Result;

/// Application events. Everything that mutates panel state funnels through
/// this enum on the main loop; background tasks only send.
#[derive(Debug)]
pub enum Event {
    /// A key press event.
    Key(KeyEvent),
    /// A mouse event.
    Mouse(MouseEvent),
    /// A periodic tick for rendering and debounced persistence.
    Tick,
    /// Terminal resize event.
    Resize(u16, u16),
    /// Watcher reported these local subtrees as stale.
    SubtreeStale(Vec<PathBuf>),
    /// A category page fetch finished for one panel.
    PackagePage {
        panel: String,
        tag: String,
        generation: u64,
        result: std::result::Result<Vec<PackageRecord>, String>,
    },
    /// A package manifest fetch finished.
    Manifest {
        package: String,
        result: std::result::Result<Vec<String>, String>,
    },
}

/// Polls crossterm input on a background task and multiplexes it with
/// application events onto one channel. A poll window with no input becomes
/// a tick, so ticks arrive at roughly `tick_rate` while idle.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    tx: mpsc::UnboundedSender<Event>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let event_tx = tx.clone();

        tokio::spawn(async move {
            loop {
                let event = if event::poll(tick_rate).unwrap_or(false) {
                    match event::read() {
                        // Release and repeat key events are dropped so every
                        // forwarded key is a single press.
                        Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                            Some(Event::Key(key))
                        }
                        Ok(CrosstermEvent::Mouse(mouse)) => Some(Event::Mouse(mouse)),
                        Ok(CrosstermEvent::Resize(w, h)) => Some(Event::Resize(w, h)),
                        _ => None,
                    }
                } else {
                    Some(Event::Tick)
                };
                if let Some(event) = event {
                    if event_tx.send(event).is_err() {
                        return;
                    }
                }
            }
        });

        Self { rx, tx }
    }

    /// Sender clone for background tasks (the watcher, remote fetches).
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    /// Receive the next event, waiting until one is available.
    pub async fn next(&mut self) -> Result<Event> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| crate::error::AppError::Terminal("event channel closed".into()))
    }
}
