use axum::extract::ws::Message;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// A live WebSocket session.
///
/// `client_id` comes from the URL path, is not validated and may collide
/// between sessions; it is only echoed back in the departure broadcast.
pub struct Connection {
    pub session_id: Uuid,
    pub client_id: u64,
    sender: mpsc::UnboundedSender<Message>,
}

/// Tracks open WebSocket sessions in connection order.
///
/// Sessions are keyed by a registry-generated uuid so duplicate client ids
/// cannot shadow each other. All mutation happens under one lock, so a
/// broadcast never races an insert or removal.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: Mutex<Vec<Connection>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a session and returns its registry-assigned id.
    pub async fn register(&self, client_id: u64, sender: mpsc::UnboundedSender<Message>) -> Uuid {
        let session_id = Uuid::new_v4();
        let mut connections = self.connections.lock().await;
        connections.push(Connection {
            session_id,
            client_id,
            sender,
        });
        debug!("Registered session {} for client #{}", session_id, client_id);
        session_id
    }

    /// Removes a session. Calling this again for the same id is a no-op.
    pub async fn disconnect(&self, session_id: Uuid) -> bool {
        let mut connections = self.connections.lock().await;
        let before = connections.len();
        connections.retain(|c| c.session_id != session_id);
        before != connections.len()
    }

    /// Sends a text frame to exactly one session.
    pub async fn send_personal(&self, message: &str, session_id: Uuid) -> Result<()> {
        let connections = self.connections.lock().await;
        let conn = connections
            .iter()
            .find(|c| c.session_id == session_id)
            .ok_or_else(|| {
                AppError::ConnectionClosed(format!("session {} is not registered", session_id))
            })?;

        conn.sender
            .send(Message::Text(message.to_string()))
            .map_err(|_| AppError::ConnectionClosed(format!("session {} is gone", session_id)))
    }

    /// Sends a text frame to every open session, oldest connection first.
    /// Best-effort: a failed delivery is skipped, the rest still go out.
    pub async fn broadcast(&self, message: &str) {
        let connections = self.connections.lock().await;
        for conn in connections.iter() {
            if conn.sender.send(Message::Text(message.to_string())).is_err() {
                warn!(
                    "Dropped broadcast to closed session {} (client #{})",
                    conn.session_id, conn.client_id
                );
            }
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.lock().await.len()
    }
}
