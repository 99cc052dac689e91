use crate::{
    SessionError, SessionPolicy, SessionSnapshot, VoteMembership, VoteValue, VoteWhileRevealed,
    Votes,
};

/// State of a single room. `facilitator` is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    facilitator: String,
    votes: Votes,
    revealed: bool,
}

impl SessionRecord {
    pub fn new(facilitator: impl Into<String>) -> Self {
        let facilitator = facilitator.into();
        let mut votes = Votes::new();
        votes.insert(facilitator.clone(), None);
        Self {
            facilitator,
            votes,
            revealed: false,
        }
    }

    pub fn facilitator(&self) -> &str {
        &self.facilitator
    }

    pub fn votes(&self) -> &Votes {
        &self.votes
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn is_member(&self, username: &str) -> bool {
        self.votes.contains_key(username)
    }

    pub fn is_facilitator(&self, username: &str) -> bool {
        self.facilitator == username
    }

    /// Adds `username` with no vote. Returns false if they were already a
    /// member, in which case their vote is left alone.
    pub fn join(&mut self, username: &str) -> bool {
        if self.votes.contains_key(username) {
            false
        } else {
            self.votes.insert(username.to_owned(), None);
            true
        }
    }

    pub fn vote(
        &mut self,
        username: &str,
        value: VoteValue,
        policy: &SessionPolicy,
    ) -> Result<(), SessionError> {
        if self.revealed && policy.vote_while_revealed == VoteWhileRevealed::Reject {
            return Err(SessionError::AlreadyRevealed);
        }
        match self.votes.get_mut(username) {
            Some(slot) => *slot = Some(value),
            None => match policy.vote_membership {
                VoteMembership::MembersOnly => {
                    return Err(SessionError::NotMember(username.to_owned()))
                }
                VoteMembership::AutoEnroll => {
                    self.votes.insert(username.to_owned(), Some(value));
                }
            },
        }
        Ok(())
    }

    pub fn reveal(&mut self, caller: &str) -> Result<(), SessionError> {
        self.authorize(caller)?;
        self.revealed = true;
        Ok(())
    }

    /// Clears every vote but keeps every participant.
    pub fn reset(&mut self, caller: &str) -> Result<(), SessionError> {
        self.authorize(caller)?;
        for vote in self.votes.values_mut() {
            *vote = None;
        }
        self.revealed = false;
        Ok(())
    }

    /// Drops a participant's entry. The facilitator stays facilitator even
    /// when their own entry is removed.
    pub fn remove_participant(&mut self, username: &str) -> bool {
        self.votes.shift_remove(username).is_some()
    }

    pub fn snapshot(&self, room: &str) -> SessionSnapshot {
        SessionSnapshot {
            room: room.to_owned(),
            facilitator: self.facilitator.clone(),
            votes: self.votes.clone(),
            revealed: self.revealed,
        }
    }

    fn authorize(&self, caller: &str) -> Result<(), SessionError> {
        if self.is_facilitator(caller) {
            Ok(())
        } else {
            Err(SessionError::NotFacilitator)
        }
    }
}
