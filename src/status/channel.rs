use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::error::ObserverError;

use super::{StatusEvent, StatusObserver};

/// Forwards events into an unbounded tokio channel, e.g. for a tray thread.
pub struct ChannelObserver {
    tx: UnboundedSender<StatusEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, UnboundedReceiver<StatusEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl StatusObserver for ChannelObserver {
    fn notify(&self, event: &StatusEvent) -> Result<(), ObserverError> {
        self.tx
            .send(event.clone())
            .map_err(|_| ObserverError("status receiver dropped".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn dropped_receiver_is_an_observer_error() {
        let (observer, rx) = ChannelObserver::new();
        drop(rx);
        let result = observer.notify(&StatusEvent::Stopped {
            at: Utc::now(),
            key_held: false,
        });
        assert!(result.is_err());
    }
}
