use crate::{AppState, broadcast::ClientIntent};
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;

/// GET /ws — upgrades to the broadcast channel.
pub async fn channel_handler(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: Arc<AppState>, socket: WebSocket) {
    let (connection_id, mut events) = state.broadcaster.register().await;
    let clients = state.broadcaster.connection_count().await;
    tracing::debug!(
        %connection_id,
        clients,
        "Channel client connected"
    );

    let (mut sink, mut stream) = socket.split();

    // Pump broadcast events out as JSON text frames. Fire-and-forget: a
    // failed send just ends the pump; the read loop below notices the
    // closed socket and unregisters.
    let forward = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let payload = match serde_json::to_string(&event) {
                Ok(payload) => payload,
                Err(err) => {
                    tracing::error!(%err, "Failed to serialize channel event");
                    continue;
                }
            };
            if sink.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => handle_intent(&state, text.as_str()).await,
            Message::Close(_) => break,
            _ => {}
        }
    }

    forward.abort();
    state.broadcaster.unregister(connection_id).await;
    tracing::debug!(%connection_id, "Channel client disconnected");
}

/// Routes an inbound intent through the same service methods the REST
/// handlers use. Rejected intents are logged and dropped, no error frame.
async fn handle_intent(state: &AppState, text: &str) {
    let intent = match serde_json::from_str::<ClientIntent>(text) {
        Ok(intent) => intent,
        Err(err) => {
            tracing::debug!(%err, "Ignoring malformed channel message");
            return;
        }
    };

    let result = match intent {
        ClientIntent::Vote { meme_id, vote_type } => state
            .service
            .apply_vote(meme_id, &vote_type)
            .await
            .map(|_| ()),
        ClientIntent::PlaceBid {
            meme_id,
            user_id,
            credits,
        } => state
            .service
            .apply_bid(meme_id, &user_id, credits)
            .await
            .map(|_| ()),
    };
    if let Err(err) = result {
        tracing::warn!(%err, "Channel intent rejected");
    }
}
