use crate::connection::ConnectionEvent;
use estimation_system::{ConnectionId, ServerMessage};
use std::collections::HashMap;

pub type ConnectionTx = tokio::sync::mpsc::Sender<ConnectionEvent>;

pub struct ConnectionTxStorage {
    connection_txs: HashMap<ConnectionId, ConnectionTx>,
}

impl ConnectionTxStorage {
    pub fn new() -> Self {
        Self {
            connection_txs: HashMap::new(),
        }
    }

    pub fn insert(&mut self, connection_id: ConnectionId, tx: ConnectionTx) {
        self.connection_txs.insert(connection_id, tx);
    }

    pub fn get(&self, connection_id: &ConnectionId) -> Option<&ConnectionTx> {
        self.connection_txs.get(connection_id)
    }

    pub fn len(&self) -> usize {
        self.connection_txs.len()
    }

    /// Returns false if the connection is unknown or its channel is closed.
    /// A closed channel means the connection actor is gone, so it is dropped.
    pub async fn send(&mut self, to: &ConnectionId, event: ConnectionEvent) -> bool {
        if let Some(tx) = self.connection_txs.get(to) {
            if tx.send(event).await.is_ok() {
                return true;
            }
            log::warn!("Connection {} is gone, dropping its channel", to);
            self.connection_txs.remove(to);
        } else {
            log::warn!("No channel for connection {}", to);
        }
        false
    }

    pub async fn broadcast(&mut self, message: &ServerMessage) {
        let ids: Vec<ConnectionId> = self.connection_txs.keys().copied().collect();
        for connection_id in ids {
            self.send(
                &connection_id,
                ConnectionEvent::ServerMessage(message.clone()),
            )
            .await;
        }
    }

    pub fn remove(&mut self, connection_id: &ConnectionId) -> Option<ConnectionTx> {
        self.connection_txs.remove(connection_id)
    }
}
