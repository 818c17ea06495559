mod observer;
mod portal;

use crate::core::events::{EventEmitter, ListenerId};
use crate::core::models::{Theme, ThemeMode};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

pub use observer::ThemeObserver;
pub use portal::{PortalAppearance, PortalNotificationCenter, COLOR_SCHEME_CHANGED};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ThemeError {
    #[error("Failed to connect to the appearance service: {0}")]
    Connection(String),

    #[error("Failed to subscribe to {name}: {reason}")]
    Subscribe { name: String, reason: String },

    #[error("Appearance notification listener has stopped")]
    Disconnected,
}

pub trait AppearanceQuery {
    fn is_dark_mode(&self) -> bool;

    fn current_theme(&self) -> Theme {
        Theme::from_dark_mode(self.is_dark_mode())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

// Callbacks run on the thread that owns the center.
pub trait NotificationCenter {
    fn subscribe(
        &self,
        name: &str,
        callback: Box<dyn FnMut()>,
    ) -> Result<SubscriptionId, ThemeError>;

    fn unsubscribe(&self, id: SubscriptionId);
}

#[derive(Default)]
pub struct SubscriptionTable {
    callbacks: EventEmitter<String>,
    live: RefCell<HashMap<SubscriptionId, ListenerId>>,
    next_id: Cell<u64>,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: &str, mut callback: Box<dyn FnMut()>) -> SubscriptionId {
        let id = SubscriptionId::from_raw(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        let listener = self.callbacks.on(name.to_string(), move || callback());
        self.live.borrow_mut().insert(id, listener);
        id
    }

    /// Returns `false` when `id` was not live.
    pub fn remove(&self, id: SubscriptionId) -> bool {
        let listener = self.live.borrow_mut().remove(&id);
        match listener {
            Some(listener) => self.callbacks.off(listener),
            None => false,
        }
    }

    pub fn dispatch(&self, name: &str) -> usize {
        self.callbacks.emit(name.to_string())
    }

    pub fn len(&self) -> usize {
        self.live.borrow().len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedAppearance(pub Theme);

impl AppearanceQuery for FixedAppearance {
    fn is_dark_mode(&self) -> bool {
        self.0.is_dark()
    }
}

pub fn appearance_for(mode: ThemeMode) -> Result<Rc<dyn AppearanceQuery>, ThemeError> {
    match mode.pinned() {
        Some(theme) => {
            tracing::debug!(?theme, "Using pinned theme");
            Ok(Rc::new(FixedAppearance(theme)))
        }
        None => Ok(Rc::new(PortalAppearance::connect()?)),
    }
}
