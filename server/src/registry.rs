use std::collections::hash_map::Entry;
use std::collections::HashMap;

use estimation_system::{RoomName, SessionError, SessionPolicy};

use crate::session::{spawn_session, SessionTx};

/// Room name to running session. Rooms are never removed.
pub struct SessionRegistry {
    sessions: HashMap<RoomName, SessionTx>,
    policy: SessionPolicy,
    channel_capacity: usize,
}

impl SessionRegistry {
    pub fn new(policy: SessionPolicy, channel_capacity: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            policy,
            channel_capacity,
        }
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    pub fn get(&self, room: &str) -> Option<&SessionTx> {
        self.sessions.get(room)
    }

    pub fn contains(&self, room: &str) -> bool {
        self.sessions.contains_key(room)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Starts a session for `room` owned by `facilitator`. Fails without side
    /// effects when the name is taken.
    pub fn create(&mut self, room: &str, facilitator: &str) -> Result<&SessionTx, SessionError> {
        match self.sessions.entry(room.to_owned()) {
            Entry::Occupied(_) => Err(SessionError::RoomExists),
            Entry::Vacant(entry) => {
                log::info!("Room '{}' created by {}", room, facilitator);
                let session_tx = spawn_session(
                    room.to_owned(),
                    facilitator.to_owned(),
                    self.policy,
                    self.channel_capacity,
                );
                Ok(entry.insert(session_tx))
            }
        }
    }
}
