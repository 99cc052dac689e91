use serde::{Deserialize, Serialize};

/// What `createRoom` does when the room already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateCreate {
    #[default]
    Ignore,
    Join,
}

/// What `joinRoom` does when the room does not exist yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinMissing {
    #[default]
    AutoCreate,
    Reject,
}

/// Who may vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteMembership {
    #[default]
    MembersOnly,
    /// A vote from an unknown participant also makes them a member.
    AutoEnroll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteWhileRevealed {
    #[default]
    Reject,
    Accept,
}

/// What happens to a participant's entry when their last connection to the
/// room goes away. The facilitator role is never handed over either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnDisconnect {
    #[default]
    Retain,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionPolicy {
    pub duplicate_create: DuplicateCreate,
    pub join_missing: JoinMissing,
    pub vote_membership: VoteMembership,
    pub vote_while_revealed: VoteWhileRevealed,
    pub on_disconnect: OnDisconnect,
}
