// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Realtime room relay.
//!
//! Tracks which live connection is subscribed to which chat room and fans
//! out "new message in room X" pings. Pings carry no content; clients
//! re-fetch history when they see one. Nothing is buffered, so a ping for a
//! room with no other subscribers is dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Identifies one realtime connection for its lifetime.
pub type ConnectionId = u64;

/// Outbound half of a connection; the socket task drains it.
pub type FrameSender = mpsc::UnboundedSender<String>;

/// Frames accepted from clients.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InboundFrame {
    Join {
        #[serde(rename = "roomId")]
        room_id: String,
    },
    Message {
        #[serde(rename = "roomId")]
        room_id: String,
    },
}

/// Frames pushed to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum OutboundFrame {
    Message {
        #[serde(rename = "roomId")]
        room_id: String,
    },
}

/// Room membership for live connections.
///
/// A connection belongs to at most one room; a later join moves it.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: DashMap<String, HashMap<ConnectionId, FrameSender>>,
    membership: DashMap<ConnectionId, String>,
    next_id: AtomicU64,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_connection_id(&self) -> ConnectionId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Connections currently subscribed to some room.
    pub fn connection_count(&self) -> usize {
        self.membership.len()
    }

    /// Number of subscribers in `room_id`.
    pub fn room_size(&self, room_id: &str) -> usize {
        self.rooms.get(room_id).map(|m| m.len()).unwrap_or(0)
    }

    /// Put `conn` in `room_id`, leaving whatever room it was in before.
    pub fn subscribe(&self, room_id: &str, conn: ConnectionId, sender: FrameSender) {
        if let Some(previous) = self.membership.insert(conn, room_id.to_string()) {
            if previous != room_id {
                self.remove_from_room(&previous, conn);
            }
        }
        self.rooms
            .entry(room_id.to_string())
            .or_default()
            .insert(conn, sender);
        tracing::debug!(conn, room_id, "Relay subscribe");
    }

    /// Drop `conn` from its room, if any.
    pub fn unsubscribe(&self, conn: ConnectionId) {
        if let Some((_, room_id)) = self.membership.remove(&conn) {
            self.remove_from_room(&room_id, conn);
            tracing::debug!(conn, room_id = %room_id, "Relay unsubscribe");
        }
    }

    /// Send `frame` to every subscriber of `room_id` except `except`.
    ///
    /// Returns how many connections accepted the frame.
    pub fn broadcast(
        &self,
        room_id: &str,
        except: Option<ConnectionId>,
        frame: &OutboundFrame,
    ) -> usize {
        let text = match serde_json::to_string(frame) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(room_id, error = %e, "Failed to encode relay frame");
                return 0;
            }
        };

        let Some(members) = self.rooms.get(room_id) else {
            return 0;
        };
        members
            .iter()
            .filter(|(conn, _)| Some(**conn) != except)
            .filter(|(_, sender)| sender.send(text.clone()).is_ok())
            .count()
    }

    /// Apply one raw text frame from `conn`. Malformed frames are ignored.
    pub fn handle_text(&self, conn: ConnectionId, sender: &FrameSender, text: &str) {
        let frame = match serde_json::from_str::<InboundFrame>(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(conn, error = %e, "Ignoring malformed relay frame");
                return;
            }
        };

        match frame {
            InboundFrame::Join { room_id } => self.subscribe(&room_id, conn, sender.clone()),
            InboundFrame::Message { room_id } => {
                let frame = OutboundFrame::Message {
                    room_id: room_id.clone(),
                };
                let delivered = self.broadcast(&room_id, Some(conn), &frame);
                tracing::debug!(conn, room_id = %room_id, delivered, "Relay ping");
            }
        }
    }

    fn remove_from_room(&self, room_id: &str, conn: ConnectionId) {
        if let Some(mut members) = self.rooms.get_mut(room_id) {
            members.remove(&conn);
        }
        self.rooms.remove_if(room_id, |_, members| members.is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connect(
        registry: &RoomRegistry,
    ) -> (ConnectionId, FrameSender, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (registry.next_connection_id(), tx, rx)
    }

    #[test]
    fn test_parse_frames() {
        assert_eq!(
            serde_json::from_str::<InboundFrame>(r#"{"type":"join","roomId":"r1"}"#).unwrap(),
            InboundFrame::Join {
                room_id: "r1".to_string()
            }
        );
        assert!(
            serde_json::from_str::<InboundFrame>(r#"{"type":"leave","roomId":"r1"}"#).is_err()
        );
        assert!(serde_json::from_str::<InboundFrame>(r#"{"type":"join"}"#).is_err());

        let out = serde_json::to_string(&OutboundFrame::Message {
            room_id: "r1".to_string(),
        })
        .unwrap();
        assert_eq!(out, r#"{"type":"message","roomId":"r1"}"#);
    }

    #[test]
    fn test_broadcast_skips_sender() {
        let registry = RoomRegistry::new();
        let (a, a_tx, mut a_rx) = connect(&registry);
        let (b, b_tx, mut b_rx) = connect(&registry);
        registry.handle_text(a, &a_tx, r#"{"type":"join","roomId":"r1"}"#);
        registry.handle_text(b, &b_tx, r#"{"type":"join","roomId":"r1"}"#);

        registry.handle_text(a, &a_tx, r#"{"type":"message","roomId":"r1"}"#);

        assert_eq!(b_rx.try_recv().unwrap(), r#"{"type":"message","roomId":"r1"}"#);
        assert!(a_rx.try_recv().is_err());
    }

    #[test]
    fn test_last_join_wins() {
        let registry = RoomRegistry::new();
        let (a, a_tx, mut a_rx) = connect(&registry);
        registry.subscribe("r1", a, a_tx.clone());
        registry.subscribe("r2", a, a_tx);

        assert_eq!(registry.room_size("r1"), 0);
        assert_eq!(registry.room_size("r2"), 1);
        assert_eq!(registry.connection_count(), 1);

        let frame = OutboundFrame::Message {
            room_id: "r1".to_string(),
        };
        assert_eq!(registry.broadcast("r1", None, &frame), 0);
        assert!(a_rx.try_recv().is_err());
    }

    #[test]
    fn test_unsubscribe_on_disconnect() {
        let registry = RoomRegistry::new();
        let (a, a_tx, _a_rx) = connect(&registry);
        registry.subscribe("r1", a, a_tx);
        registry.unsubscribe(a);
        registry.unsubscribe(a);

        assert_eq!(registry.room_size("r1"), 0);
        assert_eq!(registry.connection_count(), 0);
    }

    #[test]
    fn test_malformed_frames_ignored() {
        let registry = RoomRegistry::new();
        let (a, a_tx, _a_rx) = connect(&registry);
        registry.handle_text(a, &a_tx, "not json");
        registry.handle_text(a, &a_tx, r#"{"type":"join","room":"r1"}"#);
        assert_eq!(registry.connection_count(), 0);
    }

    #[test]
    fn test_ping_to_empty_room_is_dropped() {
        let registry = RoomRegistry::new();
        let frame = OutboundFrame::Message {
            room_id: "nobody".to_string(),
        };
        assert_eq!(registry.broadcast("nobody", None, &frame), 0);
    }
}
