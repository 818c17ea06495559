use crate::core::events::{EventEmitter, ListenerId};
use crate::core::models::{AnimationKind, Theme};
use crate::icons::animation::{AnimationDescriptor, FrameRange};
use crate::icons::paths::IconPathTable;
use crate::icons::{IconError, ProviderError};
use crate::theme::{AppearanceQuery, NotificationCenter, ThemeObserver};
use std::fmt;
use std::rc::Rc;

pub const SEQUENCE_FRAMES: FrameRange = FrameRange::fixed(1, 9);
pub const SEQUENCE_SPEED_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconEvent {
    ThemeChanged,
}

// Nothing is cached: every getter re-reads the appearance.
pub struct IconSet {
    paths: IconPathTable,
    appearance: Rc<dyn AppearanceQuery>,
}

impl IconSet {
    pub fn new(
        paths: IconPathTable,
        appearance: Rc<dyn AppearanceQuery>,
    ) -> Result<Self, IconError> {
        paths.validate()?;
        Ok(Self { paths, appearance })
    }

    pub fn current_theme(&self) -> Theme {
        self.appearance.current_theme()
    }

    pub fn lock_animation(&self, is_reverse: bool) -> AnimationDescriptor {
        self.sequence(AnimationKind::Lock)
            .with_speed(SEQUENCE_SPEED_MS)
            .with_reverse(is_reverse)
    }

    pub fn unlock_animation(&self) -> AnimationDescriptor {
        self.lock_animation(true)
    }

    pub fn spinner_animation(&self) -> AnimationDescriptor {
        self.sequence(AnimationKind::Spinner)
            .with_speed(SEQUENCE_SPEED_MS)
            .with_repeat(true)
            .with_reverse(false)
    }

    fn sequence(&self, kind: AnimationKind) -> AnimationDescriptor {
        let theme = self.current_theme();
        let pattern = self.paths.resolve(kind, theme);
        AnimationDescriptor::from_file_sequence(pattern, SEQUENCE_FRAMES)
    }
}

impl fmt::Debug for IconSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IconSet")
            .field("paths", &self.paths)
            .finish()
    }
}

pub struct IconProvider {
    icons: IconSet,
    events: EventEmitter<IconEvent>,
    observer: ThemeObserver,
}

impl IconProvider {
    pub fn new(
        paths: IconPathTable,
        appearance: Rc<dyn AppearanceQuery>,
        center: Rc<dyn NotificationCenter>,
        notification: &str,
    ) -> Result<Self, ProviderError> {
        let icons = IconSet::new(paths, appearance)?;
        let events = EventEmitter::new();
        let emitter = events.clone();
        let observer = ThemeObserver::start(center, notification, move || {
            let listeners = emitter.emit(IconEvent::ThemeChanged);
            tracing::debug!(listeners, "Emitted theme change");
        })?;

        Ok(Self {
            icons,
            events,
            observer,
        })
    }

    pub fn current_theme(&self) -> Theme {
        self.icons.current_theme()
    }

    pub fn lock_animation(&self, is_reverse: bool) -> AnimationDescriptor {
        self.icons.lock_animation(is_reverse)
    }

    pub fn unlock_animation(&self) -> AnimationDescriptor {
        self.icons.unlock_animation()
    }

    pub fn spinner_animation(&self) -> AnimationDescriptor {
        self.icons.spinner_animation()
    }

    pub fn on(&self, event: IconEvent, callback: impl FnMut() + 'static) -> ListenerId {
        self.events.on(event, callback)
    }

    pub fn off(&self, id: ListenerId) -> bool {
        self.events.off(id)
    }

    pub fn listener_count(&self, event: IconEvent) -> usize {
        self.events.listener_count(event)
    }

    pub fn is_watching(&self) -> bool {
        self.observer.is_subscribed()
    }

    /// Drops the OS subscription. Safe to call repeatedly.
    pub fn destroy(&mut self) {
        self.observer.destroy();
    }
}

impl fmt::Debug for IconProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IconProvider")
            .field("icons", &self.icons)
            .field("events", &self.events)
            .field("observer", &self.observer)
            .finish()
    }
}
