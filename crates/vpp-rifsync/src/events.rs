//! Event bridge: dataplane link events → control-plane port notifications.
//!
//! A background task polls the dataplane event channel and republishes
//! link-state changes as port operational-status notifications, translating
//! the dataplane hardware name back to the owning port object through the
//! host tap name. Unknown names are logged and dropped, never escalated.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use vppsync_types::{PortOid, RawObjectId};

use crate::dataplane::{Dataplane, VppEvent};
use crate::naming;

/// Poll interval of the event bridge.
pub const EVENT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Port operational status carried in notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortOperStatus {
    Up,
    Down,
}

/// Sink for port operational-status notifications.
#[async_trait]
pub trait PortStatusNotifier: Send + Sync {
    /// Emits one status notification for a port object.
    async fn send_port_oper_status(&self, port: PortOid, status: PortOperStatus, flag: bool);
}

/// Bidirectional host-tap ↔ port-object index.
///
/// Written from the synchronous call path when ports are registered, read
/// concurrently by the event bridge; hence the sharded map.
#[derive(Debug, Default)]
pub struct PortsIndex {
    by_tap: DashMap<String, PortOid>,
    by_oid: DashMap<RawObjectId, String>,
}

impl PortsIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a port with its host tap device name.
    pub fn insert(&self, port: PortOid, tap_name: impl Into<String>) {
        let tap_name = tap_name.into();
        self.by_tap.insert(tap_name.clone(), port);
        self.by_oid.insert(port.as_raw(), tap_name);
    }

    /// Removes a port registration.
    pub fn remove(&self, port: PortOid) {
        if let Some((_, tap_name)) = self.by_oid.remove(&port.as_raw()) {
            self.by_tap.remove(&tap_name);
        }
    }

    /// Returns the tap device name of a port.
    pub fn tap_for_port(&self, port: PortOid) -> Option<String> {
        self.by_oid.get(&port.as_raw()).map(|e| e.value().clone())
    }

    /// Returns the port owning a tap device name.
    pub fn port_for_tap(&self, tap_name: &str) -> Option<PortOid> {
        self.by_tap.get(tap_name).map(|e| *e.value())
    }
}

/// Translates one dataplane link event into a port notification.
///
/// Returns true when a notification was emitted.
async fn forward_link_event(
    ports: &PortsIndex,
    notifier: &dyn PortStatusNotifier,
    hwif_name: &str,
    link_up: bool,
) -> bool {
    let Some(tap_name) = naming::hwif_to_tap_name(hwif_name) else {
        info!("No tap mapping for hardware interface {}", hwif_name);
        return false;
    };
    let Some(port) = ports.port_for_tap(tap_name) else {
        info!("Failed to find port oid for tap interface {}", tap_name);
        return false;
    };

    let status = if link_up {
        PortOperStatus::Up
    } else {
        PortOperStatus::Down
    };
    info!(
        "Received port link event for {} state {:?}",
        hwif_name, status
    );
    notifier.send_port_oper_status(port, status, false).await;
    true
}

/// Drains all pending dataplane events once.
pub(crate) async fn drain_events(
    dp: &dyn Dataplane,
    ports: &PortsIndex,
    notifier: &dyn PortStatusNotifier,
) {
    if let Err(e) = dp.sync_for_events().await {
        debug!("Event channel sync failed: {}", e);
    }
    while let Some(event) = dp.dequeue_event().await {
        match event {
            VppEvent::LinkStatus { hwif_name, link_up } => {
                forward_link_event(ports, notifier, &hwif_name, link_up).await;
            }
        }
    }
}

/// Background bridge between dataplane events and port notifications.
pub struct EventBridge;

impl EventBridge {
    /// Spawns the polling loop. The task wakes every
    /// [`EVENT_POLL_INTERVAL`], drains pending events, and exits when the
    /// token is cancelled; join the returned handle on shutdown.
    pub fn spawn(
        dp: Arc<dyn Dataplane>,
        ports: Arc<PortsIndex>,
        notifier: Arc<dyn PortStatusNotifier>,
        token: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(EVENT_POLL_INTERVAL);
            info!("Event bridge started");
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        info!("Event bridge stopping");
                        break;
                    }
                    _ = ticker.tick() => {
                        drain_events(dp.as_ref(), &ports, notifier.as_ref()).await;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Notification sink recording everything it is handed.
    #[derive(Default)]
    pub(crate) struct MockNotifier {
        pub notifications: Mutex<Vec<(PortOid, PortOperStatus, bool)>>,
    }

    impl MockNotifier {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl PortStatusNotifier for MockNotifier {
        async fn send_port_oper_status(&self, port: PortOid, status: PortOperStatus, flag: bool) {
            self.notifications.lock().unwrap().push((port, status, flag));
        }
    }
}
