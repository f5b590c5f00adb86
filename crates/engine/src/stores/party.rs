//! Party storage for runtime state.

use dashmap::DashMap;
use warband_domain::{CharacterId, DomainError, Party, PartyDeparture, PartyId};

#[derive(Default)]
pub struct PartyStore {
    parties: DashMap<PartyId, Party>,
}

impl PartyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, party: Party) -> PartyId {
        let id = party.id;
        self.parties.insert(id, party);
        id
    }

    pub fn get(&self, id: PartyId) -> Option<Party> {
        self.parties.get(&id).map(|r| r.clone())
    }

    /// Add a member. `None` if the party no longer exists.
    pub fn add_member(&self, id: PartyId, member: CharacterId) -> Option<bool> {
        self.parties.get_mut(&id).map(|mut p| p.add_member(member))
    }

    /// Remove a member, dropping the party once dissolved.
    pub fn remove_member(
        &self,
        id: PartyId,
        member: CharacterId,
    ) -> PartyDeparture {
        let departure = match self.parties.get_mut(&id) {
            Some(mut party) => party.remove_member(member),
            None => return PartyDeparture::NotMember,
        };
        if matches!(departure, PartyDeparture::Dissolved { .. }) {
            self.parties.remove(&id);
        }
        departure
    }

    pub fn promote(
        &self,
        id: PartyId,
        leader: CharacterId,
    ) -> Result<(), DomainError> {
        match self.parties.get_mut(&id) {
            Some(mut party) => party.promote(leader),
            None => Err(DomainError::not_found("Party", id.to_string())),
        }
    }
}
