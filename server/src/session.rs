use std::collections::HashMap;

use tokio::sync::mpsc::{channel, Sender};

use estimation_system::{
    ConnectionId, OnDisconnect, RejectReason, RoomName, ServerMessage, SessionError,
    SessionPolicy, SessionRecord, Username, VoteValue,
};

use crate::connection::ConnectionEvent;
use crate::connection_tx_storage::{ConnectionTx, ConnectionTxStorage};

pub type SessionTx = Sender<SessionCommand>;

/// The connection a command came from, with the channel to answer on.
#[derive(Debug, Clone)]
pub struct Origin {
    pub connection_id: ConnectionId,
    pub tx: ConnectionTx,
}

#[derive(Debug)]
pub enum SessionCommand {
    Join {
        origin: Origin,
        username: Username,
    },
    Vote {
        origin: Origin,
        username: Username,
        value: VoteValue,
    },
    Reveal {
        origin: Origin,
        claimed: Option<Username>,
    },
    Reset {
        origin: Origin,
        claimed: Option<Username>,
    },
    Leave {
        origin: Origin,
    },
    /// Like `Leave`, for a connection that is already gone.
    Disconnect {
        connection_id: ConnectionId,
    },
}

/// Sole owner of one room's record and subscribers. Commands are applied one
/// at a time, and each accepted one is followed by a full-state broadcast
/// before the next command is read.
struct Session {
    room: RoomName,
    record: SessionRecord,
    policy: SessionPolicy,
    subscribers: ConnectionTxStorage,
    /// Every name a connection joined under, latest last.
    identities: HashMap<ConnectionId, Vec<Username>>,
}

impl Session {
    fn new(room: RoomName, facilitator: Username, policy: SessionPolicy) -> Self {
        Self {
            room,
            record: SessionRecord::new(facilitator),
            policy,
            subscribers: ConnectionTxStorage::new(),
            identities: HashMap::new(),
        }
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        let (origin, result) = match command {
            SessionCommand::Join { origin, username } => {
                let result = self.join(&origin, username);
                (origin, result)
            }
            SessionCommand::Vote {
                origin,
                username,
                value,
            } => {
                let result = self.vote(&username, value);
                (origin, result)
            }
            SessionCommand::Reveal { origin, claimed } => {
                let result = self.reveal(&origin, claimed);
                (origin, result)
            }
            SessionCommand::Reset { origin, claimed } => {
                let result = self.reset(&origin, claimed);
                (origin, result)
            }
            SessionCommand::Leave { origin } => {
                let result = self.leave(origin.connection_id);
                (origin, result)
            }
            SessionCommand::Disconnect { connection_id } => {
                match self.leave(connection_id) {
                    Ok(true) => self.broadcast().await,
                    Ok(false) => {}
                    Err(error) => log::debug!(
                        "Connection {} left room '{}' twice: {}",
                        connection_id,
                        self.room,
                        error
                    ),
                }
                return;
            }
        };

        match result {
            Ok(true) => self.broadcast().await,
            Ok(false) => {}
            Err(error) => self.reject(origin, error).await,
        }
    }

    fn join(&mut self, origin: &Origin, username: Username) -> Result<bool, SessionError> {
        if self.record.join(&username) {
            log::info!("User {} joined room '{}'", username, self.room);
        }
        self.subscribers
            .insert(origin.connection_id, origin.tx.clone());
        let names = self.identities.entry(origin.connection_id).or_default();
        names.retain(|name| name != &username);
        names.push(username);
        Ok(true)
    }

    fn vote(&mut self, username: &str, value: VoteValue) -> Result<bool, SessionError> {
        self.record.vote(username, value, &self.policy)?;
        log::debug!("User {} voted in room '{}'", username, self.room);
        Ok(true)
    }

    fn reveal(
        &mut self,
        origin: &Origin,
        claimed: Option<Username>,
    ) -> Result<bool, SessionError> {
        let caller = self.caller(origin, claimed)?;
        self.record.reveal(&caller)?;
        log::info!("Votes revealed in room '{}'", self.room);
        Ok(true)
    }

    fn reset(
        &mut self,
        origin: &Origin,
        claimed: Option<Username>,
    ) -> Result<bool, SessionError> {
        let caller = self.caller(origin, claimed)?;
        self.record.reset(&caller)?;
        log::info!("Votes reset in room '{}'", self.room);
        Ok(true)
    }

    /// Unsubscribes the connection. The record only changes when the policy
    /// removes participants and no other connection still speaks for them.
    fn leave(&mut self, connection_id: ConnectionId) -> Result<bool, SessionError> {
        let subscribed = self.subscribers.remove(&connection_id).is_some();
        let names = self.identities.remove(&connection_id);
        if !subscribed && names.is_none() {
            return Err(SessionError::NotSubscribed);
        }
        if self.policy.on_disconnect == OnDisconnect::Retain {
            return Ok(false);
        }

        let mut changed = false;
        for username in names.unwrap_or_default() {
            if self.is_held_elsewhere(&username) {
                continue;
            }
            if self.record.remove_participant(&username) {
                log::info!("User {} left room '{}'", username, self.room);
                changed = true;
            }
        }
        Ok(changed)
    }

    fn is_held_elsewhere(&self, username: &str) -> bool {
        self.identities
            .values()
            .any(|names| names.iter().any(|name| name == username))
    }

    /// The identity this connection joined with wins over whatever it claims.
    fn caller(
        &self,
        origin: &Origin,
        claimed: Option<Username>,
    ) -> Result<Username, SessionError> {
        self.identities
            .get(&origin.connection_id)
            .and_then(|names| names.last().cloned())
            .or(claimed)
            .ok_or(SessionError::NotFacilitator)
    }

    async fn broadcast(&mut self) {
        let message = ServerMessage::UpdateState(self.record.snapshot(&self.room));
        self.subscribers.broadcast(&message).await;
    }

    async fn reject(&self, origin: Origin, error: SessionError) {
        log::warn!(
            "Rejected request from connection {} in room '{}': {}",
            origin.connection_id,
            self.room,
            error
        );
        let message = ServerMessage::rejected(Some(self.room.clone()), RejectReason::from(&error));
        if origin
            .tx
            .send(ConnectionEvent::ServerMessage(message))
            .await
            .is_err()
        {
            log::debug!("Connection {} is gone", origin.connection_id);
        }
    }
}

pub fn spawn_session(
    room: RoomName,
    facilitator: Username,
    policy: SessionPolicy,
    capacity: usize,
) -> SessionTx {
    let (session_tx, mut session_rx) = channel::<SessionCommand>(capacity);

    tokio::spawn(async move {
        let mut session = Session::new(room, facilitator, policy);

        while let Some(command) = session_rx.recv().await {
            session.handle_command(command).await;
        }
        log::debug!("Session for room '{}' terminated", session.room);
    });

    session_tx
}
