//! Party bookkeeping for hero groups: joining, leaving and leadership.

use std::collections::HashSet;
use std::sync::Arc;

use warband_domain::{AccountId, Character, Party, PartyDeparture, PartyId};

use crate::infrastructure::ports::{CharacterStore, ClientNotice, ClientNotifier, SessionPort};
use crate::stores::PartyStore;

pub struct PartyMembership {
    parties: Arc<PartyStore>,
    characters: Arc<dyn CharacterStore>,
    sessions: Arc<dyn SessionPort>,
    notifier: Arc<dyn ClientNotifier>,
}

impl PartyMembership {
    pub fn new(
        parties: Arc<PartyStore>,
        characters: Arc<dyn CharacterStore>,
        sessions: Arc<dyn SessionPort>,
        notifier: Arc<dyn ClientNotifier>,
    ) -> Self {
        Self {
            parties,
            characters,
            sessions,
            notifier,
        }
    }

    pub fn get(&self, id: PartyId) -> Option<Party> {
        self.parties.get(id)
    }

    /// Put `member` in `leader`'s party, creating a two-member party when
    /// the leader has none. Both records are updated; the caller saves them.
    pub fn join(&self, leader: &mut Character, member: &mut Character) {
        if let Some(party_id) = leader.party {
            match self.parties.add_member(party_id, member.id) {
                Some(added) => {
                    member.party = Some(party_id);
                    if added {
                        self.broadcast(
                            party_id,
                            ClientNotice::PartyMemberAdded {
                                party: party_id,
                                member: member.id,
                            },
                        );
                    } else {
                        tracing::debug!(
                            party_id = %party_id,
                            character_id = %member.id,
                            "Character already in party"
                        );
                    }
                    return;
                }
                None => {
                    tracing::debug!(party_id = %party_id, "Leader referenced a vanished party");
                    leader.party = None;
                }
            }
        }

        let party = match Party::new(leader.id, member.id) {
            Ok(party) => party.with_master(leader.id),
            Err(e) => {
                tracing::warn!(error = %e, leader_id = %leader.id, "Could not create party");
                return;
            }
        };
        let party_id = self.parties.insert(party);
        leader.party = Some(party_id);
        member.party = Some(party_id);
        tracing::info!(party_id = %party_id, chief_id = %leader.id, "Party created");
        self.notifier.notify(
            leader.account_id,
            ClientNotice::PartyCreated {
                party: party_id,
                chief: leader.id,
            },
        );
    }

    /// Take `character` out of its party. If a single member is left the
    /// party is dissolved and that member's record is saved without it.
    pub fn leave(&self, character: &mut Character) {
        let Some(party_id) = character.party.take() else {
            return;
        };
        match self.parties.remove_member(party_id, character.id) {
            PartyDeparture::NotMember => {
                tracing::debug!(party_id = %party_id, character_id = %character.id, "Not a party member");
            }
            PartyDeparture::Left { remaining } => {
                tracing::debug!(party_id = %party_id, character_id = %character.id, remaining, "Left party");
                self.broadcast(
                    party_id,
                    ClientNotice::PartyMemberRemoved {
                        party: party_id,
                        member: character.id,
                    },
                );
            }
            PartyDeparture::Dissolved { last } => {
                tracing::info!(party_id = %party_id, "Party dissolved");
                if let Some(mut remaining) = self.characters.get(last) {
                    remaining.party = None;
                    self.characters.save(&remaining);
                    if self.is_reachable(&remaining) {
                        self.notifier.notify(
                            remaining.account_id,
                            ClientNotice::PartyDissolved { party: party_id },
                        );
                    }
                }
            }
        }
    }

    /// Hand chief and master to `leader` and tell every connected member.
    pub fn promote(&self, party_id: PartyId, leader: &Character) -> bool {
        if let Err(e) = self.parties.promote(party_id, leader.id) {
            tracing::debug!(party_id = %party_id, error = %e, "Promotion skipped");
            return false;
        }
        self.broadcast(
            party_id,
            ClientNotice::PartyLeaderChanged {
                party: party_id,
                leader: leader.id,
            },
        );
        true
    }

    /// Send a notice once to each account with a connected member.
    pub fn broadcast(&self, party_id: PartyId, notice: ClientNotice) {
        let Some(party) = self.parties.get(party_id) else {
            return;
        };
        let mut accounts: HashSet<AccountId> = HashSet::new();
        for member in party.members() {
            let Some(member) = self.characters.get(*member) else {
                continue;
            };
            if self.is_reachable(&member) && accounts.insert(member.account_id) {
                self.notifier.notify(member.account_id, notice.clone());
            }
        }
    }

    fn is_reachable(&self, character: &Character) -> bool {
        character.online && self.sessions.is_connected(character.account_id)
    }
}
