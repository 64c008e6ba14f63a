//! Notification stream API Handlers
//!
//! SSE bridge over the in-process hub. One subscription per connection;
//! dropping the stream (client disconnect) unsubscribes through a guard, so
//! the hub never accumulates dead entries beyond its own eviction.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use serde::Deserialize;
use uuid::Uuid;

use crate::core::ServerState;
use crate::db::models::StaffRole;
use crate::notify::{Notification, NotificationHub};
use crate::utils::AppError;

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub restaurant: String,
    /// Comma-separated role list; empty means all roles
    pub roles: Option<String>,
}

fn parse_roles(raw: Option<&str>) -> Result<Vec<StaffRole>, AppError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s.to_ascii_lowercase().as_str() {
            "waiter" => Ok(StaffRole::Waiter),
            "manager" => Ok(StaffRole::Manager),
            "cashier" => Ok(StaffRole::Cashier),
            "kitchen" => Ok(StaffRole::Kitchen),
            other => Err(AppError::validation(format!("Unknown role: {other}"))),
        })
        .collect()
}

/// Unsubscribes when the SSE stream is dropped
struct SubscriptionGuard {
    hub: Arc<NotificationHub>,
    id: Uuid,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.hub.unsubscribe(&self.id);
    }
}

/// GET /api/events?restaurant=&roles= - staff notification stream
pub async fn stream(
    State(state): State<ServerState>,
    Query(query): Query<EventsQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let roles = parse_roles(query.roles.as_deref())?;
    let (id, rx) = state.hub.subscribe(query.restaurant, roles);
    let guard = SubscriptionGuard {
        hub: state.hub.clone(),
        id,
    };

    let stream = futures::stream::unfold((rx, guard), |(mut rx, guard)| async move {
        let notification: Notification = rx.recv().await?;
        let event = match Event::default()
            .event("notification")
            .json_data(&notification)
        {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("Failed to serialize notification: {}", e);
                Event::default().event("notification").data("{}")
            }
        };
        Some((Ok(event), (rx, guard)))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
