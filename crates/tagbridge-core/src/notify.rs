// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Change-notification types.
//!
//! The external client delivers value changes in batches over an explicit
//! mpsc channel instead of invoking a registered callback; the engine owns
//! the receiving end and drains it into the live value store. This keeps
//! ingestion independent of whatever scheduling model the client uses
//! internally.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::types::{TagId, Value};

/// Default capacity of the inbound notification channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

// =============================================================================
// ChangeNotification
// =============================================================================

/// A single value change reported by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeNotification {
    /// The item the change applies to.
    pub item_id: TagId,

    /// The new value.
    pub value: Value,

    /// Timestamp reported with the change.
    pub timestamp: DateTime<Utc>,
}

impl ChangeNotification {
    /// Creates a notification stamped with the current time.
    pub fn new(item_id: impl Into<TagId>, value: Value) -> Self {
        Self {
            item_id: item_id.into(),
            value,
            timestamp: Utc::now(),
        }
    }

    /// Creates a notification with an explicit timestamp.
    pub fn with_timestamp(
        item_id: impl Into<TagId>,
        value: Value,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            value,
            timestamp,
        }
    }
}

/// A batch of change notifications, delivered as one unit.
///
/// Servers coalesce changes per update interval, so a batch may carry
/// changes for several items of one subscription.
pub type ChangeBatch = Vec<ChangeNotification>;

/// Sending half of the inbound notification channel.
pub type NotificationSender = mpsc::Sender<ChangeBatch>;

/// Receiving half of the inbound notification channel.
pub type NotificationReceiver = mpsc::Receiver<ChangeBatch>;

/// Creates the inbound notification channel with the given capacity.
pub fn notification_channel(capacity: usize) -> (NotificationSender, NotificationReceiver) {
    mpsc::channel(capacity.max(1))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_delivers_batches() {
        let (tx, mut rx) = notification_channel(8);

        let batch = vec![
            ChangeNotification::new("Area1.Temp", Value::Float64(72.3)),
            ChangeNotification::new("Area1.Pressure", Value::Float64(1.2)),
        ];
        tx.send(batch.clone()).await.unwrap();

        let received = rx.recv().await.unwrap();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].item_id.as_str(), "Area1.Temp");
    }

    #[test]
    fn test_zero_capacity_clamped() {
        // mpsc panics on zero capacity; the helper clamps instead.
        let (_tx, _rx) = notification_channel(0);
    }
}
