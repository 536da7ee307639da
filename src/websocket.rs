use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::error::Result;
use crate::state::AppState;
use crate::translator::TranslationJob;

/// Target language of the chat channel. The channel has a single fixed
/// target; any target field a client sends is ignored.
const WS_TARGET_LANG: &str = "fer_Latn";

/// One inbound chat message on `/ws/stream/{client_id}`.
#[derive(Debug, Deserialize)]
struct StreamMessage {
    text: String,
    lang: String,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(client_id): Path<u64>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, client_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, client_id: u64) {
    info!("New WebSocket connection for client #{}", client_id);

    let (mut sink, mut receiver) = socket.split();
    let (sender, mut outbound) = mpsc::unbounded_channel::<Message>();
    let session_id = state.registry.register(client_id, sender).await;

    // Writer task: everything addressed to this session goes through the
    // registry channel and out the sink from here.
    let writer = tokio::spawn(async move {
        while let Some(msg) = outbound.recv().await {
            if sink.send(msg).await.is_err() {
                break;
            }
        }
    });

    // Handle incoming messages until the peer closes or the socket errors.
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if let Err(e) = handle_chat_message(&state, session_id, &text).await {
                    error!("Dropping client #{}: {}", client_id, e);
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                info!("Client #{} disconnected", client_id);
                break;
            }
            Err(e) => {
                error!("WebSocket error for client #{}: {}", client_id, e);
                break;
            }
            _ => {}
        }
    }

    // Cleanup. Removal is a no-op if the session is already gone; everyone
    // still connected hears about the departure.
    state.registry.disconnect(session_id).await;
    writer.abort();
    state
        .registry
        .broadcast(&format!("Client #{} left the chat", client_id))
        .await;
    info!("Cleaned up session {} (client #{})", session_id, client_id);
}

/// Stream-translate one chat message into the fixed target language and
/// send each produced chunk back as its own text frame.
async fn handle_chat_message(state: &AppState, session_id: Uuid, text: &str) -> Result<()> {
    let msg: StreamMessage = serde_json::from_str(text)?;
    debug!("Received chat message: {:?}", msg);

    let job = TranslationJob {
        text: msg.text,
        src_lang: msg.lang,
        tgt_lang: WS_TARGET_LANG.to_string(),
        by_sentence: true,
        preprocess: true,
    };

    let mut chunks = state.translator.stream(&job).await?;
    while let Some(chunk) = chunks.next().await {
        state.registry.send_personal(&chunk?, session_id).await?;
    }

    Ok(())
}
