use crate::Username;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("malformed request: {0}")]
    Malformed(String),
    #[error("room already exists")]
    RoomExists,
    #[error("room does not exist")]
    UnknownRoom,
    #[error("{0} has not joined the room")]
    NotMember(Username),
    #[error("only the facilitator can reveal or reset votes")]
    NotFacilitator,
    #[error("votes have already been revealed")]
    AlreadyRevealed,
    #[error("connection is not subscribed to the room")]
    NotSubscribed,
}

/// Why a request was turned down. Sent back to the requesting connection only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RejectReason {
    Malformed,
    RoomExists,
    UnknownRoom,
    NotMember,
    NotFacilitator,
    AlreadyRevealed,
    NotSubscribed,
}

impl From<&SessionError> for RejectReason {
    fn from(error: &SessionError) -> Self {
        match error {
            SessionError::Malformed(_) => Self::Malformed,
            SessionError::RoomExists => Self::RoomExists,
            SessionError::UnknownRoom => Self::UnknownRoom,
            SessionError::NotMember(_) => Self::NotMember,
            SessionError::NotFacilitator => Self::NotFacilitator,
            SessionError::AlreadyRevealed => Self::AlreadyRevealed,
            SessionError::NotSubscribed => Self::NotSubscribed,
        }
    }
}
