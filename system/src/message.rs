use crate::{RejectReason, RoomName, SessionError, Username, VoteValue, Votes};
use serde::{Deserialize, Serialize};

/// Client → server. Encoded as `{"event": "<name>", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMessage {
    CreateRoom {
        room: RoomName,
        username: Username,
    },
    JoinRoom {
        room: RoomName,
        username: Username,
    },
    Vote {
        room: RoomName,
        username: Username,
        vote: VoteValue,
    },
    /// `username` is only consulted when the connection has not joined `room`.
    RevealVotes {
        room: RoomName,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<Username>,
    },
    #[serde(alias = "resetGame")]
    ResetVotes {
        room: RoomName,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        username: Option<Username>,
    },
    LeaveRoom {
        room: RoomName,
    },
}

impl ClientMessage {
    pub fn room(&self) -> &str {
        match self {
            Self::CreateRoom { room, .. }
            | Self::JoinRoom { room, .. }
            | Self::Vote { room, .. }
            | Self::RevealVotes { room, .. }
            | Self::ResetVotes { room, .. }
            | Self::LeaveRoom { room } => room,
        }
    }

    /// Rejects blank room names and usernames.
    pub fn validate(&self) -> Result<(), SessionError> {
        if is_blank(self.room()) {
            return Err(SessionError::Malformed("room must not be empty".into()));
        }
        match self {
            Self::CreateRoom { username, .. }
            | Self::JoinRoom { username, .. }
            | Self::Vote { username, .. } => {
                if is_blank(username) {
                    Err(SessionError::Malformed("username must not be empty".into()))
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Server → client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMessage {
    UpdateState(SessionSnapshot),
    Rejected {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room: Option<RoomName>,
        reason: RejectReason,
    },
}

impl ServerMessage {
    pub fn rejected(room: Option<RoomName>, reason: RejectReason) -> Self {
        Self::Rejected { room, reason }
    }
}

/// The whole room, as broadcast after every accepted change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub room: RoomName,
    pub facilitator: Username,
    pub votes: Votes,
    pub revealed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: serde_json::Value) -> Result<ClientMessage, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn it_decodes_every_client_event() {
        assert_eq!(
            decode(json!({"event": "createRoom", "data": {"room": "T1", "username": "Alice"}}))
                .expect(""),
            ClientMessage::CreateRoom {
                room: "T1".into(),
                username: "Alice".into()
            }
        );
        assert_eq!(
            decode(json!({"event": "joinRoom", "data": {"room": "T1", "username": "Bob"}}))
                .expect(""),
            ClientMessage::JoinRoom {
                room: "T1".into(),
                username: "Bob".into()
            }
        );
        assert_eq!(
            decode(json!({"event": "vote", "data": {"room": "T1", "username": "Bob", "vote": "5"}}))
                .expect(""),
            ClientMessage::Vote {
                room: "T1".into(),
                username: "Bob".into(),
                vote: "5".into()
            }
        );
        assert_eq!(
            decode(json!({"event": "revealVotes", "data": {"room": "T1"}})).expect(""),
            ClientMessage::RevealVotes {
                room: "T1".into(),
                username: None
            }
        );
        assert_eq!(
            decode(json!({"event": "resetVotes", "data": {"room": "T1", "username": "Alice"}}))
                .expect(""),
            ClientMessage::ResetVotes {
                room: "T1".into(),
                username: Some("Alice".into())
            }
        );
        assert_eq!(
            decode(json!({"event": "leaveRoom", "data": {"room": "T1"}})).expect(""),
            ClientMessage::LeaveRoom { room: "T1".into() }
        );
    }

    #[test]
    fn it_accepts_reset_game_as_reset_votes() {
        assert_eq!(
            decode(json!({"event": "resetGame", "data": {"room": "T1"}})).expect(""),
            ClientMessage::ResetVotes {
                room: "T1".into(),
                username: None
            }
        );
    }

    #[test]
    fn it_refuses_payloads_missing_required_fields() {
        assert!(decode(json!({"event": "createRoom", "data": {"room": "T1"}})).is_err());
        assert!(decode(json!({"event": "vote", "data": {"room": "T1", "username": "Bob"}})).is_err());
        assert!(decode(json!({"event": "joinRoom", "data": {"username": "Bob"}})).is_err());
        assert!(decode(json!({"event": "shuffle", "data": {"room": "T1"}})).is_err());
    }

    #[test]
    fn it_flags_blank_names_as_malformed() {
        let blank_room = ClientMessage::JoinRoom {
            room: " ".into(),
            username: "Bob".into(),
        };
        assert!(matches!(
            blank_room.validate(),
            Err(SessionError::Malformed(_))
        ));

        let blank_user = ClientMessage::Vote {
            room: "T1".into(),
            username: "".into(),
            vote: "5".into(),
        };
        assert!(matches!(
            blank_user.validate(),
            Err(SessionError::Malformed(_))
        ));

        let reveal = ClientMessage::RevealVotes {
            room: "T1".into(),
            username: None,
        };
        assert!(reveal.validate().is_ok());
    }

    #[test]
    fn it_encodes_update_state_with_null_for_missing_votes() {
        let mut votes = Votes::new();
        votes.insert("Alice".into(), None);
        votes.insert("Bob".into(), Some("5".into()));
        let message = ServerMessage::UpdateState(SessionSnapshot {
            room: "T1".into(),
            facilitator: "Alice".into(),
            votes,
            revealed: false,
        });

        let encoded = serde_json::to_string(&message).expect("");
        assert_eq!(
            encoded,
            r#"{"event":"updateState","data":{"room":"T1","facilitator":"Alice","votes":{"Alice":null,"Bob":"5"},"revealed":false}}"#
        );
    }

    #[test]
    fn it_encodes_rejections() {
        let message = ServerMessage::rejected(Some("T1".into()), RejectReason::NotFacilitator);
        assert_eq!(
            serde_json::to_value(&message).expect(""),
            json!({"event": "rejected", "data": {"room": "T1", "reason": "notFacilitator"}})
        );

        let message = ServerMessage::rejected(None, RejectReason::Malformed);
        assert_eq!(
            serde_json::to_value(&message).expect(""),
            json!({"event": "rejected", "data": {"reason": "malformed"}})
        );
    }
}
