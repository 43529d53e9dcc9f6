//! Settings change notification.
//!
//! The settings file is owned by the outer surface; the core holds a
//! [`SettingsWatch`] and re-reads the current value on notification. Only the
//! owner of the [`SettingsStore`] publishes updates.

use tokio::sync::watch;

use crate::schema::Settings;

/// Writing half, held by whichever layer owns settings persistence.
pub struct SettingsStore {
    tx: watch::Sender<Settings>,
}

/// Reading half handed to core components.
#[derive(Clone)]
pub struct SettingsWatch {
    rx: watch::Receiver<Settings>,
}

impl SettingsStore {
    /// Create a store seeded with `initial`, plus one watch handle.
    pub fn new(initial: Settings) -> (Self, SettingsWatch) {
        let (tx, rx) = watch::channel(initial);
        (Self { tx }, SettingsWatch { rx })
    }

    /// Publish a new settings value to every watch handle.
    pub fn update(&self, settings: Settings) {
        // Receivers may all be gone; the store outliving them is fine.
        let _ = self.tx.send(settings);
    }
}

impl SettingsWatch {
    /// The current settings value.
    pub fn current(&self) -> Settings {
        self.rx.borrow().clone()
    }

    /// Wait for the next change notification and return the new value.
    /// Returns `None` once the store is dropped.
    pub async fn changed(&mut self) -> Option<Settings> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}
