//! Party entity - the externally visible grouping of characters.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::{CharacterId, PartyId};

/// A party keeps members in recruitment order.
///
/// `chief` is the displayed leader; `master` is the character the other
/// members follow around. They only differ transiently while leadership is
/// being handed over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub id: PartyId,
    chief: CharacterId,
    master: Option<CharacterId>,
    members: Vec<CharacterId>,
}

/// What happened when a member left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyDeparture {
    /// The character was not in this party
    NotMember,
    /// The party lives on with `remaining` members
    Left { remaining: usize },
    /// Only `last` was left behind, so the party no longer exists
    Dissolved { last: CharacterId },
}

impl Party {
    /// Create a two-member party led by `chief`.
    pub fn new(chief: CharacterId, member: CharacterId) -> Result<Self, DomainError> {
        if chief == member {
            return Err(DomainError::constraint(
                "a party needs two distinct characters",
            ));
        }
        Ok(Self {
            id: PartyId::new(),
            chief,
            master: None,
            members: vec![chief, member],
        })
    }

    pub fn with_master(mut self, master: CharacterId) -> Self {
        self.master = Some(master);
        self
    }

    pub fn chief(&self) -> CharacterId {
        self.chief
    }

    pub fn master(&self) -> Option<CharacterId> {
        self.master
    }

    pub fn members(&self) -> &[CharacterId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: CharacterId) -> bool {
        self.members.contains(&id)
    }

    pub fn is_chief(&self, id: CharacterId) -> bool {
        self.chief == id
    }

    /// Add a member. Returns `false` if it was already present.
    pub fn add_member(&mut self, id: CharacterId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.members.push(id);
        true
    }

    /// Remove a member, handing chief/master to the oldest remaining member
    /// when the leaver held them.
    pub fn remove_member(&mut self, id: CharacterId) -> PartyDeparture {
        let Some(index) = self.members.iter().position(|m| *m == id) else {
            return PartyDeparture::NotMember;
        };
        self.members.remove(index);

        if let [last] = self.members.as_slice() {
            let last = *last;
            self.members.clear();
            return PartyDeparture::Dissolved { last };
        }

        if let Some(&first) = self.members.first() {
            if self.chief == id {
                self.chief = first;
            }
            if self.master == Some(id) {
                self.master = Some(first);
            }
        }
        PartyDeparture::Left {
            remaining: self.members.len(),
        }
    }

    /// Make `id` both chief and master.
    pub fn promote(&mut self, id: CharacterId) -> Result<(), DomainError> {
        if !self.contains(id) {
            return Err(DomainError::not_found("PartyMember", id.to_string()));
        }
        self.chief = id;
        self.master = Some(id);
        Ok(())
    }
}
