use crate::theme::{AppearanceQuery, NotificationCenter, SubscriptionId, SubscriptionTable, ThemeError};
use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use zbus::blocking::{Connection, Proxy};
use zbus::zvariant::OwnedValue;

const PORTAL_DESTINATION: &str = "org.freedesktop.portal.Desktop";
const PORTAL_PATH: &str = "/org/freedesktop/portal/desktop";
const SETTINGS_INTERFACE: &str = "org.freedesktop.portal.Settings";
const APPEARANCE_NAMESPACE: &str = "org.freedesktop.appearance";
const COLOR_SCHEME_KEY: &str = "color-scheme";

pub const COLOR_SCHEME_CHANGED: &str = "org.freedesktop.appearance.color-scheme";

// color-scheme values: 0 no preference, 1 prefer dark, 2 prefer light
const PREFER_DARK: u32 = 1;

fn settings_proxy(connection: &Connection) -> Result<Proxy<'static>, ThemeError> {
    Proxy::new(connection, PORTAL_DESTINATION, PORTAL_PATH, SETTINGS_INTERFACE)
        .map_err(|e| ThemeError::Connection(e.to_string()))
}

fn session_bus() -> Result<Connection, ThemeError> {
    Connection::session().map_err(|e| ThemeError::Connection(e.to_string()))
}

fn notification_name(namespace: &str, key: &str) -> String {
    format!("{namespace}.{key}")
}

fn is_setting_name(name: &str) -> bool {
    matches!(name.rsplit_once('.'), Some((namespace, key)) if !namespace.is_empty() && !key.is_empty())
}

fn is_prefer_dark(color_scheme: u32) -> bool {
    color_scheme == PREFER_DARK
}

pub struct PortalAppearance {
    proxy: Proxy<'static>,
}

impl PortalAppearance {
    pub fn connect() -> Result<Self, ThemeError> {
        let connection = session_bus()?;
        Ok(Self {
            proxy: settings_proxy(&connection)?,
        })
    }

    fn read_color_scheme(&self) -> zbus::Result<u32> {
        let value: OwnedValue = self
            .proxy
            .call("ReadOne", &(APPEARANCE_NAMESPACE, COLOR_SCHEME_KEY))?;
        Ok(u32::try_from(value)?)
    }
}

impl AppearanceQuery for PortalAppearance {
    fn is_dark_mode(&self) -> bool {
        match self.read_color_scheme() {
            Ok(scheme) => is_prefer_dark(scheme),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read color scheme, assuming light");
                false
            }
        }
    }
}

pub struct PortalNotificationCenter {
    table: SubscriptionTable,
    pending: RefCell<mpsc::UnboundedReceiver<String>>,
    listening: Arc<AtomicBool>,
}

impl PortalNotificationCenter {
    pub fn connect() -> Result<Self, ThemeError> {
        let connection = session_bus()?;
        let proxy = settings_proxy(&connection)?;
        let signals = proxy
            .receive_signal("SettingChanged")
            .map_err(|e| ThemeError::Connection(e.to_string()))?;

        let (tx, rx) = mpsc::unbounded_channel::<String>();
        let listening = Arc::new(AtomicBool::new(true));
        let listening_flag = Arc::clone(&listening);

        std::thread::Builder::new()
            .name("portal-settings".to_string())
            .spawn(move || {
                // keeps the bus connection alive for as long as signals arrive
                let _proxy = proxy;
                for message in signals {
                    match message.body().deserialize::<(String, String, OwnedValue)>() {
                        Ok((namespace, key, _value)) => {
                            if tx.send(notification_name(&namespace, &key)).is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Ignoring malformed SettingChanged signal");
                        }
                    }
                }
                listening_flag.store(false, Ordering::SeqCst);
                tracing::debug!("Portal settings listener stopped");
            })
            .map_err(|e| ThemeError::Connection(e.to_string()))?;

        tracing::info!(destination = PORTAL_DESTINATION, "Listening for portal setting changes");

        Ok(Self::from_channel(rx, listening))
    }

    fn from_channel(rx: mpsc::UnboundedReceiver<String>, listening: Arc<AtomicBool>) -> Self {
        Self {
            table: SubscriptionTable::new(),
            pending: RefCell::new(rx),
            listening,
        }
    }

    /// Runs callbacks for queued notifications on the calling thread. Names
    /// queued before the listener stopped are delivered before `Disconnected`.
    pub fn dispatch_pending(&self) -> Result<usize, ThemeError> {
        let mut invoked = 0;
        loop {
            let next = self.pending.borrow_mut().try_recv();
            match next {
                Ok(name) => {
                    tracing::debug!(notification = %name, "Dispatching portal notification");
                    invoked += self.table.dispatch(&name);
                }
                Err(TryRecvError::Empty) => return Ok(invoked),
                Err(TryRecvError::Disconnected) => {
                    self.listening.store(false, Ordering::SeqCst);
                    tracing::warn!(invoked, "Portal settings listener is gone");
                    return Err(ThemeError::Disconnected);
                }
            }
        }
    }
}

impl NotificationCenter for PortalNotificationCenter {
    fn subscribe(
        &self,
        name: &str,
        callback: Box<dyn FnMut()>,
    ) -> Result<SubscriptionId, ThemeError> {
        if !self.listening.load(Ordering::SeqCst) {
            return Err(ThemeError::Disconnected);
        }
        if !is_setting_name(name) {
            return Err(ThemeError::Subscribe {
                name: name.to_string(),
                reason: "expected <namespace>.<key>".to_string(),
            });
        }
        Ok(self.table.insert(name, callback))
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.table.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn counting(calls: &Rc<Cell<usize>>) -> Box<dyn FnMut()> {
        let counter = Rc::clone(calls);
        Box::new(move || counter.set(counter.get() + 1))
    }

    #[test]
    fn test_notification_name_matches_color_scheme_constant() {
        assert_eq!(
            notification_name(APPEARANCE_NAMESPACE, COLOR_SCHEME_KEY),
            COLOR_SCHEME_CHANGED
        );
    }

    #[test]
    fn test_setting_name_shape() {
        assert!(is_setting_name(COLOR_SCHEME_CHANGED));
        assert!(is_setting_name("org.gnome.desktop.interface.gtk-theme"));
        assert!(!is_setting_name("color-scheme"));
        assert!(!is_setting_name("org.freedesktop.appearance."));
        assert!(!is_setting_name(".color-scheme"));
    }

    #[test]
    fn test_prefer_dark_value() {
        assert!(is_prefer_dark(1));
        assert!(!is_prefer_dark(0));
        assert!(!is_prefer_dark(2));
    }

    #[test]
    fn test_dispatch_pending_delivers_queued_names() {
        let (tx, rx) = mpsc::unbounded_channel();
        let center = PortalNotificationCenter::from_channel(rx, Arc::new(AtomicBool::new(true)));
        let calls = Rc::new(Cell::new(0));
        center.subscribe(COLOR_SCHEME_CHANGED, counting(&calls)).unwrap();

        assert_eq!(center.dispatch_pending(), Ok(0));

        tx.send(COLOR_SCHEME_CHANGED.to_string()).unwrap();
        tx.send("org.gnome.desktop.interface.gtk-theme".to_string()).unwrap();
        tx.send(COLOR_SCHEME_CHANGED.to_string()).unwrap();
        assert_eq!(center.dispatch_pending(), Ok(2));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_dispatch_pending_reports_stopped_listener() {
        let (tx, rx) = mpsc::unbounded_channel();
        let center = PortalNotificationCenter::from_channel(rx, Arc::new(AtomicBool::new(true)));
        let calls = Rc::new(Cell::new(0));
        center.subscribe(COLOR_SCHEME_CHANGED, counting(&calls)).unwrap();

        tx.send(COLOR_SCHEME_CHANGED.to_string()).unwrap();
        drop(tx);

        assert_eq!(center.dispatch_pending(), Err(ThemeError::Disconnected));
        assert_eq!(calls.get(), 1);
        assert_eq!(center.dispatch_pending(), Err(ThemeError::Disconnected));
        assert_eq!(calls.get(), 1);

        let late = center.subscribe(COLOR_SCHEME_CHANGED, Box::new(|| {}));
        assert_eq!(late, Err(ThemeError::Disconnected));
    }

    #[test]
    fn test_subscribe_rejects_bare_key() {
        let (_tx, rx) = mpsc::unbounded_channel();
        let center = PortalNotificationCenter::from_channel(rx, Arc::new(AtomicBool::new(true)));
        let result = center.subscribe("color-scheme", Box::new(|| {}));
        assert!(matches!(result, Err(ThemeError::Subscribe { .. })));
    }
}
