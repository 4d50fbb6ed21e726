//! Shared selection state
//!
//! The selected sensor and district are held in a [`SelectionStore`] that is
//! cloned into every component needing it. Writers go through the store's
//! methods; readers either take a copy with [`SelectionStore::current`] or
//! wait for changes on a [`SelectionStore::subscribe`] receiver.

use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub sensor: Option<String>,
    pub district: Option<String>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.sensor.is_none() && self.district.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct SelectionStore {
    tx: watch::Sender<Selection>,
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new(Selection::default())
    }
}

impl SelectionStore {
    pub fn new(initial: Selection) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn current(&self) -> Selection {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Selection> {
        self.tx.subscribe()
    }

    pub fn select_sensor(&self, sensor_id: impl Into<String>) {
        let sensor_id = sensor_id.into();
        debug!("Selected sensor {}", sensor_id);
        self.tx.send_if_modified(|s| replace(&mut s.sensor, Some(sensor_id)));
    }

    pub fn select_district(&self, district: impl Into<String>) {
        let district = district.into();
        debug!("Selected district {}", district);
        self.tx.send_if_modified(|s| replace(&mut s.district, Some(district)));
    }

    pub fn clear_sensor(&self) {
        self.tx.send_if_modified(|s| replace(&mut s.sensor, None));
    }

    pub fn clear(&self) {
        self.tx.send_if_modified(|s| {
            let changed = !s.is_empty();
            *s = Selection::default();
            changed
        });
    }
}

/// Store `value` in `slot`, reporting whether it changed
fn replace(slot: &mut Option<String>, value: Option<String>) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}
