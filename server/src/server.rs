use tokio::sync::mpsc::{channel, Sender};

use estimation_system::{
    ClientMessage, ConnectionId, DuplicateCreate, JoinMissing, RejectReason, RoomName,
    ServerMessage, SessionError, SessionPolicy, Username,
};

use super::connection::{ConnectionCommand, ConnectionEvent};
use crate::connection_tx_storage::ConnectionTxStorage;
use crate::registry::SessionRegistry;
use crate::server_state::ServerState;
use crate::session::{Origin, SessionCommand};

pub type ServerTx = Sender<ConnectionCommand>;

struct Server {
    server_state: ServerState,
    registry: SessionRegistry,
    connections: ConnectionTxStorage,
}

impl Server {
    fn new(policy: SessionPolicy, channel_capacity: usize) -> Self {
        Self {
            server_state: ServerState::new(),
            registry: SessionRegistry::new(policy, channel_capacity),
            connections: ConnectionTxStorage::new(),
        }
    }

    async fn handle_connection_command(&mut self, command: ConnectionCommand) {
        match command {
            ConnectionCommand::Connect { tx } => {
                let connection_id = self.server_state.create_connection();
                self.connections.insert(connection_id, tx);
                log::debug!(
                    "Connection {} opened ({} open)",
                    connection_id,
                    self.connections.len()
                );
                self.connections
                    .send(&connection_id, ConnectionEvent::Connected { connection_id })
                    .await;
            }
            ConnectionCommand::Disconnect { from } => self.disconnect(from).await,
            ConnectionCommand::ClientMessage { from, message } => {
                let room = message.room().to_owned();
                if let Err(error) = self.handle_client_message(from, message).await {
                    log::warn!("Rejected request from connection {}: {}", from, error);
                    let room = if room.trim().is_empty() { None } else { Some(room) };
                    self.connections
                        .send(
                            &from,
                            ConnectionEvent::ServerMessage(ServerMessage::rejected(
                                room,
                                RejectReason::from(&error),
                            )),
                        )
                        .await;
                }
            }
        }
    }

    async fn handle_client_message(
        &mut self,
        from: ConnectionId,
        message: ClientMessage,
    ) -> Result<(), SessionError> {
        let origin = match self.origin(from) {
            Some(origin) => origin,
            None => {
                log::warn!("Dropping message from unknown connection {}", from);
                return Ok(());
            }
        };
        message.validate()?;

        match message {
            ClientMessage::CreateRoom { room, username } => {
                self.create_room(origin, room, username).await
            }
            ClientMessage::JoinRoom { room, username } => {
                self.join_room(origin, room, username).await
            }
            ClientMessage::Vote {
                room,
                username,
                vote,
            } => {
                self.forward(
                    &room,
                    SessionCommand::Vote {
                        origin,
                        username,
                        value: vote,
                    },
                )
                .await
            }
            ClientMessage::RevealVotes { room, username } => {
                self.forward(
                    &room,
                    SessionCommand::Reveal {
                        origin,
                        claimed: username,
                    },
                )
                .await
            }
            ClientMessage::ResetVotes { room, username } => {
                self.forward(
                    &room,
                    SessionCommand::Reset {
                        origin,
                        claimed: username,
                    },
                )
                .await
            }
            ClientMessage::LeaveRoom { room } => {
                if !self.registry.contains(&room) {
                    return Err(SessionError::UnknownRoom);
                }
                if !self.server_state.unsubscribe(&from, &room) {
                    return Err(SessionError::NotSubscribed);
                }
                self.forward(&room, SessionCommand::Leave { origin }).await
            }
        }
    }

    async fn create_room(
        &mut self,
        origin: Origin,
        room: RoomName,
        username: Username,
    ) -> Result<(), SessionError> {
        let created = self.registry.create(&room, &username).map(|_| ());
        match created {
            Ok(()) => {
                log::debug!("{} rooms open", self.registry.len());
                self.subscribe(origin, room, username).await
            }
            Err(SessionError::RoomExists)
                if self.registry.policy().duplicate_create == DuplicateCreate::Join =>
            {
                self.subscribe(origin, room, username).await
            }
            Err(error) => Err(error),
        }
    }

    async fn join_room(
        &mut self,
        origin: Origin,
        room: RoomName,
        username: Username,
    ) -> Result<(), SessionError> {
        if !self.registry.contains(&room) {
            match self.registry.policy().join_missing {
                JoinMissing::AutoCreate => {
                    self.registry.create(&room, &username)?;
                }
                JoinMissing::Reject => return Err(SessionError::UnknownRoom),
            }
        }
        self.subscribe(origin, room, username).await
    }

    async fn subscribe(
        &mut self,
        origin: Origin,
        room: RoomName,
        username: Username,
    ) -> Result<(), SessionError> {
        self.server_state.subscribe(origin.connection_id, &room);
        self.forward(&room, SessionCommand::Join { origin, username })
            .await
    }

    async fn forward(&self, room: &str, command: SessionCommand) -> Result<(), SessionError> {
        let session_tx = self.registry.get(room).ok_or(SessionError::UnknownRoom)?;
        if session_tx.send(command).await.is_err() {
            log::warn!("Session for room '{}' is not running", room);
        }
        Ok(())
    }

    async fn disconnect(&mut self, connection_id: ConnectionId) {
        self.connections.remove(&connection_id);
        for room in self.server_state.disconnect(&connection_id) {
            if let Err(error) = self
                .forward(&room, SessionCommand::Disconnect { connection_id })
                .await
            {
                log::warn!("Could not leave room '{}': {}", room, error);
            }
        }
        log::debug!("Connection {} closed", connection_id);
    }

    fn origin(&self, connection_id: ConnectionId) -> Option<Origin> {
        if !self.server_state.is_connected(&connection_id) {
            return None;
        }
        self.connections.get(&connection_id).map(|tx| Origin {
            connection_id,
            tx: tx.clone(),
        })
    }
}

/// Starts the dispatch loop that owns the session registry. Every inbound
/// command passes through it in arrival order.
pub fn spawn_server(policy: SessionPolicy, channel_capacity: usize) -> ServerTx {
    let (srv_tx, mut srv_rx) = channel::<ConnectionCommand>(channel_capacity);

    tokio::spawn(async move {
        let mut server = Box::new(Server::new(policy, channel_capacity));

        while let Some(command) = srv_rx.recv().await {
            server.handle_connection_command(command).await;
        }
    });

    srv_tx
}
