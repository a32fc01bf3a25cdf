use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent, KeyEventKind};
use futures::{FutureExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Terminal events
#[derive(Clone, Debug)]
pub enum Event {
    /// Render tick
    Tick,
    /// Periodic data refresh is due
    Refresh,
    /// Key press event
    Key(KeyEvent),
    /// Terminal resize
    Resize(u16, u16),
    /// Error reading terminal input
    Error(String),
}

/// Event handler managing terminal input and timers
pub struct EventHandler {
    receiver: mpsc::UnboundedReceiver<Event>,
    cancel: CancellationToken,
}

impl EventHandler {
    /// Start the input task. `refresh_every` of zero disables periodic
    /// refresh events.
    pub fn new(tick_rate: Duration, refresh_every: Duration) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        tokio::spawn(input_loop(sender, cancel.clone(), tick_rate, refresh_every));

        Self { receiver, cancel }
    }

    /// Receive the next event
    pub async fn next(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Shutdown the event handler
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn input_loop(
    sender: mpsc::UnboundedSender<Event>,
    cancel: CancellationToken,
    tick_rate: Duration,
    refresh_every: Duration,
) {
    let mut reader = EventStream::new();
    let mut tick_interval = tokio::time::interval(tick_rate);
    tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let refresh_enabled = !refresh_every.is_zero();
    let mut refresh_interval = tokio::time::interval(if refresh_enabled {
        refresh_every
    } else {
        Duration::from_secs(3600)
    });
    refresh_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The caller loads the first snapshot itself
    refresh_interval.reset();

    loop {
        let crossterm_event = reader.next().fuse();

        tokio::select! {
            _ = cancel.cancelled() => break,

            _ = tick_interval.tick() => {
                let _ = sender.send(Event::Tick);
            }

            _ = refresh_interval.tick(), if refresh_enabled => {
                let _ = sender.send(Event::Refresh);
            }

            maybe_event = crossterm_event => {
                match maybe_event {
                    Some(Ok(CrosstermEvent::Key(key))) => {
                        // Filter out release events (important for Windows)
                        if key.kind == KeyEventKind::Press {
                            let _ = sender.send(Event::Key(key));
                        }
                    }
                    Some(Ok(CrosstermEvent::Resize(w, h))) => {
                        let _ = sender.send(Event::Resize(w, h));
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        let _ = sender.send(Event::Error(e.to_string()));
                    }
                    None => break,
                }
            }
        }
    }
}
