use std::collections::{HashMap, HashSet};
use std::num::Wrapping;

use estimation_system::{ConnectionId, RoomName};

/// Which rooms each live connection is subscribed to.
pub struct ServerState {
    connection_id_source: Wrapping<ConnectionId>,
    connection_rooms: HashMap<ConnectionId, HashSet<RoomName>>,
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            connection_id_source: Wrapping(0),
            connection_rooms: HashMap::new(),
        }
    }

    pub fn create_connection(&mut self) -> ConnectionId {
        let connection_id = self.new_connection_id();
        self.connection_rooms.insert(connection_id, HashSet::new());
        connection_id
    }

    pub fn is_connected(&self, connection_id: &ConnectionId) -> bool {
        self.connection_rooms.contains_key(connection_id)
    }

    pub fn subscribe(&mut self, connection_id: ConnectionId, room: &str) {
        if let Some(rooms) = self.connection_rooms.get_mut(&connection_id) {
            rooms.insert(room.to_owned());
        }
    }

    pub fn unsubscribe(&mut self, connection_id: &ConnectionId, room: &str) -> bool {
        self.connection_rooms
            .get_mut(connection_id)
            .map_or(false, |rooms| rooms.remove(room))
    }

    /// Forgets the connection and returns the rooms it was subscribed to.
    pub fn disconnect(&mut self, connection_id: &ConnectionId) -> Vec<RoomName> {
        self.connection_rooms
            .remove(connection_id)
            .map(|rooms| rooms.into_iter().collect())
            .unwrap_or_default()
    }

    fn new_connection_id(&mut self) -> ConnectionId {
        loop {
            self.connection_id_source += Wrapping(1);
            let candidate = self.connection_id_source.0;
            if !self.connection_rooms.contains_key(&candidate) {
                break candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_hands_out_distinct_connection_ids() {
        let mut state = ServerState::new();
        let first = state.create_connection();
        let second = state.create_connection();
        assert_ne!(first, second);
        assert!(state.is_connected(&first));
    }

    #[test]
    fn it_skips_ids_still_in_use_after_wrapping() {
        let mut state = ServerState::new();
        let first = state.create_connection();
        state.connection_id_source = Wrapping(ConnectionId::MAX);
        let next = state.create_connection();
        assert_ne!(next, first);
        assert!(state.is_connected(&first));
        assert!(state.is_connected(&next));
    }

    #[test]
    fn it_returns_subscribed_rooms_on_disconnect() {
        let mut state = ServerState::new();
        let connection_id = state.create_connection();
        state.subscribe(connection_id, "T1");
        state.subscribe(connection_id, "T2");
        assert!(state.unsubscribe(&connection_id, "T2"));
        assert!(!state.unsubscribe(&connection_id, "T2"));

        assert_eq!(state.disconnect(&connection_id), vec!["T1".to_string()]);
        assert!(!state.is_connected(&connection_id));
        assert!(!state.unsubscribe(&connection_id, "T1"));
        assert!(state.disconnect(&connection_id).is_empty());
    }
}
