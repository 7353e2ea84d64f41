use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, EventStream, KeyEvent};
use futures::StreamExt;
use tokio::sync::{Notify, mpsc};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::warn;

#[derive(Clone, Debug)]
pub enum Event {
    Key(KeyEvent),
    /// Time to take the next sample.
    Tick,
    Resize,
}

/// Merges terminal input with the sampling cadence.
///
/// The background task ends when the receiver is dropped or the terminal
/// input stream fails.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    restart: Arc<Notify>,
    _task: tokio::task::JoinHandle<()>,
}

impl EventHandler {
    pub fn new(sample_period: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel::<Event>();
        let restart = Arc::new(Notify::new());
        let task = tokio::spawn(pump(tx, sample_period, Arc::clone(&restart)));

        Self {
            rx,
            restart,
            _task: task,
        }
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Start a fresh sampling period now, after an out-of-band refresh, so
    /// the next tick lands a full period later.
    pub fn restart_period(&self) {
        self.restart.notify_one();
    }
}

fn sampling_interval(period: Duration) -> Interval {
    // The first tick of a tokio interval fires immediately; skip it since
    // the app samples once at startup.
    let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

async fn pump(tx: mpsc::UnboundedSender<Event>, period: Duration, restart: Arc<Notify>) {
    let mut reader = EventStream::new();
    let mut ticks = sampling_interval(period);

    loop {
        let event = tokio::select! {
            input = reader.next() => match input {
                Some(Ok(CrosstermEvent::Key(key))) => Event::Key(key),
                Some(Ok(CrosstermEvent::Resize(_, _))) => Event::Resize,
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    warn!("terminal input failed: {e}");
                    break;
                }
                None => break,
            },
            _ = ticks.tick() => Event::Tick,
            () = restart.notified() => {
                ticks.reset();
                continue;
            }
        };

        if tx.send(event).is_err() {
            break;
        }
    }
}
