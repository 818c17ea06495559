use crate::theme::{NotificationCenter, SubscriptionId, ThemeError};
use std::fmt;
use std::rc::Rc;

/// A destroyed observer never resubscribes; build a new one instead.
pub struct ThemeObserver {
    center: Rc<dyn NotificationCenter>,
    notification: String,
    handle: Option<SubscriptionId>,
}

impl ThemeObserver {
    pub fn start(
        center: Rc<dyn NotificationCenter>,
        notification: &str,
        mut on_change: impl FnMut() + 'static,
    ) -> Result<Self, ThemeError> {
        let name = notification.to_string();
        let handle = center.subscribe(
            notification,
            Box::new(move || {
                tracing::info!(notification = %name, "Appearance change notification received");
                on_change();
            }),
        )?;

        tracing::info!(notification, ?handle, "Subscribed to appearance changes");

        Ok(Self {
            center,
            notification: notification.to_string(),
            handle: Some(handle),
        })
    }

    pub fn is_subscribed(&self) -> bool {
        self.handle.is_some()
    }

    /// Releases the subscription. Later calls do nothing.
    pub fn destroy(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.center.unsubscribe(handle);
            tracing::info!(
                notification = %self.notification,
                ?handle,
                "Unsubscribed from appearance changes"
            );
        }
    }
}

impl Drop for ThemeObserver {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl fmt::Debug for ThemeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeObserver")
            .field("notification", &self.notification)
            .field("handle", &self.handle)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::testing::FakeNotificationCenter;
    use std::cell::{Cell, RefCell};

    const NAME: &str = "appearance.changed";

    fn counting_observer(
        center: &Rc<FakeNotificationCenter>,
    ) -> (ThemeObserver, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let observer = ThemeObserver::start(center.clone(), NAME, move || {
            counter.set(counter.get() + 1)
        })
        .unwrap();
        (observer, calls)
    }

    #[test]
    fn test_start_subscribes_once() {
        let center = Rc::new(FakeNotificationCenter::new());
        let (observer, _) = counting_observer(&center);

        assert!(observer.is_subscribed());
        assert_eq!(center.subscribe_calls(), vec![NAME.to_string()]);
        assert_eq!(center.live_subscriptions(), 1);
    }

    #[test]
    fn test_notification_invokes_callback_once() {
        let center = Rc::new(FakeNotificationCenter::new());
        let (_observer, calls) = counting_observer(&center);

        center.fire(NAME);
        assert_eq!(calls.get(), 1);
        center.fire(NAME);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let center = Rc::new(FakeNotificationCenter::new());
        let (mut observer, calls) = counting_observer(&center);

        observer.destroy();
        observer.destroy();

        assert!(!observer.is_subscribed());
        assert_eq!(center.unsubscribe_calls().len(), 1);
        assert_eq!(center.fire(NAME), 0);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_drop_releases_subscription() {
        let center = Rc::new(FakeNotificationCenter::new());
        let (mut observer, _) = counting_observer(&center);
        observer.destroy();
        drop(observer);
        assert_eq!(center.unsubscribe_calls().len(), 1);

        let (observer, _) = counting_observer(&center);
        drop(observer);
        assert_eq!(center.unsubscribe_calls().len(), 2);
        assert_eq!(center.live_subscriptions(), 0);
    }

    #[test]
    fn test_registration_failure_propagates() {
        let center = Rc::new(FakeNotificationCenter::failing());
        let result = ThemeObserver::start(center.clone(), NAME, || {});

        assert!(matches!(result, Err(ThemeError::Subscribe { .. })));
        assert!(center.unsubscribe_calls().is_empty());
    }

    #[test]
    fn test_destroy_from_inside_callback() {
        let center = Rc::new(FakeNotificationCenter::new());
        let slot: Rc<RefCell<Option<ThemeObserver>>> = Rc::new(RefCell::new(None));

        let inner = Rc::clone(&slot);
        let observer = ThemeObserver::start(center.clone(), NAME, move || {
            if let Some(observer) = inner.borrow_mut().as_mut() {
                observer.destroy();
            }
        })
        .unwrap();
        *slot.borrow_mut() = Some(observer);

        assert_eq!(center.fire(NAME), 1);
        assert_eq!(center.unsubscribe_calls().len(), 1);
        assert_eq!(center.fire(NAME), 0);
    }
}
