//! Notification hub - role-filtered in-process broadcast
//!
//! # Message flow
//!
//! ```text
//! Services/Jobs ──▶ Notifier::send() ──▶ NotificationHub
//!                                             │ should_deliver()?
//!                           ┌─────────────────┼─────────────────┐
//!                           ▼                 ▼                 ▼
//!                      SSE stream        SSE stream        SSE stream
//!                      (waiter app)      (manager app)     (kitchen app)
//! ```
//!
//! The subscriber map is process-local and does not survive a restart; the
//! [`Notifier`] trait is the seam for a brokered replacement when running
//! more than one instance.

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use super::{Notification, Notifier};
use crate::db::models::StaffRole;

/// Per-subscriber outbound buffer before the connection is dropped
const SUBSCRIBER_CHANNEL_CAPACITY: usize = 64;

/// One live dashboard connection
#[derive(Debug)]
struct Subscriber {
    restaurant: String,
    roles: Vec<StaffRole>,
    tx: mpsc::Sender<Notification>,
}

/// Pure delivery predicate: same restaurant, and either the notification
/// targets every role or the subscriber holds one of the targeted roles.
pub fn should_deliver(
    subscriber_restaurant: &str,
    subscriber_roles: &[StaffRole],
    notification: &Notification,
) -> bool {
    if subscriber_restaurant != notification.restaurant {
        return false;
    }
    notification.target_roles.is_empty()
        || notification
            .target_roles
            .iter()
            .any(|role| subscriber_roles.contains(role))
}

/// In-process notification broadcaster
#[derive(Debug, Default)]
pub struct NotificationHub {
    subscribers: DashMap<Uuid, Subscriber>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live connection; the receiver feeds one SSE stream
    pub fn subscribe(
        &self,
        restaurant: impl Into<String>,
        roles: Vec<StaffRole>,
    ) -> (Uuid, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CHANNEL_CAPACITY);
        let id = Uuid::new_v4();
        let restaurant = restaurant.into();
        tracing::debug!(subscriber = %id, restaurant = %restaurant, ?roles, "Subscriber connected");
        self.subscribers.insert(
            id,
            Subscriber {
                restaurant,
                roles,
                tx,
            },
        );
        (id, rx)
    }

    /// Remove a connection (stream closed or handler dropped)
    pub fn unsubscribe(&self, id: &Uuid) {
        if self.subscribers.remove(id).is_some() {
            tracing::debug!(subscriber = %id, "Subscriber disconnected");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver to every matching subscriber; a dead subscriber is evicted
    /// without aborting delivery to the rest. Returns the delivered count.
    pub fn broadcast(&self, notification: &Notification) -> usize {
        let mut delivered = 0;
        let mut stale: Vec<Uuid> = Vec::new();

        for entry in self.subscribers.iter() {
            let subscriber = entry.value();
            if !should_deliver(&subscriber.restaurant, &subscriber.roles, notification) {
                continue;
            }
            match subscriber.tx.try_send(notification.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    stale.push(*entry.key());
                }
                Err(mpsc::error::TrySendError::Full(_)) => {
                    // A full buffer means the dashboard stopped reading;
                    // treat it like a write failure and drop the connection.
                    tracing::warn!(subscriber = %entry.key(), "Subscriber buffer full, evicting");
                    stale.push(*entry.key());
                }
            }
        }

        for id in stale {
            self.unsubscribe(&id);
        }
        delivered
    }
}

#[async_trait]
impl Notifier for NotificationHub {
    async fn send(&self, notification: Notification) {
        let delivered = self.broadcast(&notification);
        tracing::debug!(
            event = ?notification.event,
            restaurant = %notification.restaurant,
            delivered,
            "Notification broadcast"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::AlertPriority;
    use crate::notify::NotificationEvent;

    fn notification(restaurant: &str, roles: Vec<StaffRole>) -> Notification {
        Notification {
            restaurant: restaurant.to_string(),
            event: NotificationEvent::OtpHelp,
            title: "OTP help".to_string(),
            message: "Table 4 has not entered the code".to_string(),
            table: None,
            session: None,
            target_roles: roles,
            priority: AlertPriority::Normal,
            sent_at: 0,
        }
    }

    #[test]
    fn delivers_only_to_matching_restaurant() {
        let n = notification("restaurant:a", vec![]);
        assert!(should_deliver("restaurant:a", &[StaffRole::Waiter], &n));
        assert!(!should_deliver("restaurant:b", &[StaffRole::Waiter], &n));
    }

    #[test]
    fn empty_target_roles_means_everyone() {
        let n = notification("restaurant:a", vec![]);
        assert!(should_deliver("restaurant:a", &[StaffRole::Kitchen], &n));
        assert!(should_deliver("restaurant:a", &[], &n));
    }

    #[test]
    fn role_targeting_requires_intersection() {
        let n = notification("restaurant:a", vec![StaffRole::Manager]);
        assert!(should_deliver(
            "restaurant:a",
            &[StaffRole::Manager, StaffRole::Waiter],
            &n
        ));
        assert!(!should_deliver("restaurant:a", &[StaffRole::Waiter], &n));
    }

    #[tokio::test]
    async fn broadcast_filters_and_counts() {
        let hub = NotificationHub::new();
        let (_waiter_id, mut waiter_rx) = hub.subscribe("restaurant:a", vec![StaffRole::Waiter]);
        let (_manager_id, mut manager_rx) =
            hub.subscribe("restaurant:a", vec![StaffRole::Manager]);
        let (_other_id, mut other_rx) = hub.subscribe("restaurant:b", vec![StaffRole::Waiter]);

        let delivered = hub.broadcast(&notification("restaurant:a", vec![StaffRole::Waiter]));
        assert_eq!(delivered, 1);
        assert!(waiter_rx.try_recv().is_ok());
        assert!(manager_rx.try_recv().is_err());
        assert!(other_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn dead_subscriber_is_evicted_without_aborting_broadcast() {
        let hub = NotificationHub::new();
        let (_dead_id, dead_rx) = hub.subscribe("restaurant:a", vec![]);
        let (_live_id, mut live_rx) = hub.subscribe("restaurant:a", vec![]);
        drop(dead_rx);

        let delivered = hub.broadcast(&notification("restaurant:a", vec![]));
        assert_eq!(delivered, 1);
        assert!(live_rx.try_recv().is_ok());
        assert_eq!(hub.subscriber_count(), 1);
    }
}
