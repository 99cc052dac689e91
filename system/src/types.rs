use indexmap::IndexMap;

pub type ConnectionId = u32;
pub type RoomName = String;
pub type Username = String;
pub type VoteValue = String;

/// Participants in join order, each with their vote if one was cast.
pub type Votes = IndexMap<Username, Option<VoteValue>>;
