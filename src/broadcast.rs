use crate::models::Meme;
use crate::service::VoteOutcome;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use uuid::Uuid;

/// Event pushed to every connected client after a successful mutation.
/// Delivery is fire-and-forget: no acknowledgement, no retry, no per-client
/// filtering.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ChannelEvent {
    NewMeme(Meme),
    VoteUpdate(VoteOutcome),
    #[serde(rename_all = "camelCase")]
    BidUpdate {
        meme_id: Uuid,
        user_id: String,
        credits: i64,
    },
}

/// Intent a client may submit over the channel instead of the REST path.
/// Both paths run through the same service methods; nothing deduplicates a
/// client that uses both for one logical action.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "camelCase")]
pub enum ClientIntent {
    #[serde(rename_all = "camelCase")]
    Vote { meme_id: Uuid, vote_type: String },
    #[serde(rename_all = "camelCase")]
    PlaceBid {
        meme_id: Uuid,
        user_id: String,
        credits: i64,
    },
}

/// Registry of currently connected channel clients. Explicitly instantiated
/// and injected (one per server process, fresh ones in tests) rather than a
/// process-global.
#[derive(Default)]
pub struct EventBroadcaster {
    connections: RwLock<HashMap<Uuid, UnboundedSender<ChannelEvent>>>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new connection and hands back its id plus the receiving
    /// end the socket task drains.
    pub async fn register(&self) -> (Uuid, UnboundedReceiver<ChannelEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection_id = Uuid::new_v4();
        self.connections.write().await.insert(connection_id, tx);
        (connection_id, rx)
    }

    /// Removes a connection. Returns whether it was still registered.
    pub async fn unregister(&self, connection_id: Uuid) -> bool {
        self.connections
            .write()
            .await
            .remove(&connection_id)
            .is_some()
    }

    /// Delivers an event to every registered connection, returning the
    /// number of clients it reached. Sends to connections whose receiver is
    /// gone simply miss.
    pub async fn broadcast(&self, event: ChannelEvent) -> usize {
        let connections = self.connections.read().await;
        let mut delivered = 0;
        for sender in connections.values() {
            if sender.send(event.clone()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vote_event(count: i64) -> ChannelEvent {
        ChannelEvent::VoteUpdate(VoteOutcome {
            meme_id: Uuid::new_v4(),
            vote_count: count,
        })
    }

    #[tokio::test]
    async fn starts_empty() {
        let broadcaster = EventBroadcaster::new();
        assert_eq!(broadcaster.connection_count().await, 0);
        assert_eq!(broadcaster.broadcast(vote_event(1)).await, 0);
    }

    #[tokio::test]
    async fn broadcast_reaches_every_connection() {
        let broadcaster = EventBroadcaster::new();
        let (_id1, mut rx1) = broadcaster.register().await;
        let (_id2, mut rx2) = broadcaster.register().await;

        let event = vote_event(5);
        assert_eq!(broadcaster.broadcast(event.clone()).await, 2);
        assert_eq!(rx1.recv().await.unwrap(), event);
        assert_eq!(rx2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn unregistered_connection_stops_receiving() {
        let broadcaster = EventBroadcaster::new();
        let (id1, mut rx1) = broadcaster.register().await;
        let (_id2, _rx2) = broadcaster.register().await;

        assert!(broadcaster.unregister(id1).await);
        assert!(!broadcaster.unregister(id1).await);
        assert_eq!(broadcaster.connection_count().await, 1);

        assert_eq!(broadcaster.broadcast(vote_event(2)).await, 1);
        assert!(rx1.try_recv().is_err());
    }

    #[test]
    fn events_serialize_with_camel_case_names() {
        let event = ChannelEvent::BidUpdate {
            meme_id: Uuid::nil(),
            user_id: "NeoSynth".to_string(),
            credits: 150,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "bidUpdate");
        assert_eq!(json["data"]["memeId"], Uuid::nil().to_string());
        assert_eq!(json["data"]["userId"], "NeoSynth");
        assert_eq!(json["data"]["credits"], 150);
    }

    #[test]
    fn intents_deserialize_from_camel_case() {
        let intent: ClientIntent = serde_json::from_str(
            r#"{"action":"placeBid","data":{"memeId":"00000000-0000-0000-0000-000000000000","userId":"GlitchQueen","credits":120}}"#,
        )
        .unwrap();
        match intent {
            ClientIntent::PlaceBid {
                meme_id,
                user_id,
                credits,
            } => {
                assert_eq!(meme_id, Uuid::nil());
                assert_eq!(user_id, "GlitchQueen");
                assert_eq!(credits, 120);
            }
            other => panic!("unexpected intent: {:?}", other),
        }
    }
}
