//! Turn-control state: who each master's session is acting as.
//!
//! Keyed by master id. All operations are per-key DashMap operations;
//! there is no lock spanning several masters.

use dashmap::DashMap;
use warband_domain::{AccountId, CharacterId, CombatId, CombatantId};

/// An active control handoff for one combat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlContext {
    pub master: CharacterId,
    /// Account whose session is redirected
    pub account: AccountId,
    pub hero: CharacterId,
    pub combat: CombatId,
    pub combatant: CombatantId,
}

#[derive(Default)]
pub struct ControlContextStore {
    contexts: DashMap<CharacterId, ControlContext>,
    /// Incarnation the master's session had before the outstanding handoff
    anchors: DashMap<CharacterId, CharacterId>,
}

impl ControlContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, master: CharacterId) -> Option<ControlContext> {
        self.contexts.get(&master).map(|r| *r)
    }

    /// Record a context, overwriting any previous one for the same master.
    pub fn insert(&self, context: ControlContext) -> Option<ControlContext> {
        self.contexts.insert(context.master, context)
    }

    pub fn remove(&self, master: CharacterId) -> Option<ControlContext> {
        self.contexts.remove(&master).map(|(_, c)| c)
    }

    /// Remove the master's context only if it still targets `hero`.
    pub fn remove_if_hero(&self, master: CharacterId, hero: CharacterId) -> Option<ControlContext> {
        self.contexts
            .remove_if(&master, |_, ctx| ctx.hero == hero)
            .map(|(_, c)| c)
    }

    /// Remove every context referencing `combat`.
    pub fn drain_combat(&self, combat: CombatId) -> Vec<ControlContext> {
        let masters: Vec<CharacterId> = self
            .contexts
            .iter()
            .filter(|r| r.combat == combat)
            .map(|r| *r.key())
            .collect();
        masters
            .into_iter()
            .filter_map(|master| {
                self.contexts
                    .remove_if(&master, |_, ctx| ctx.combat == combat)
                    .map(|(_, c)| c)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    // -------------------------------------------------------------------------
    // Anchors
    // -------------------------------------------------------------------------

    /// Record the pre-handoff incarnation unless one is already outstanding.
    pub fn anchor_or_insert(&self, master: CharacterId, current: CharacterId) -> CharacterId {
        *self.anchors.entry(master).or_insert(current)
    }

    pub fn anchor(&self, master: CharacterId) -> Option<CharacterId> {
        self.anchors.get(&master).map(|r| *r)
    }

    pub fn take_anchor(&self, master: CharacterId) -> Option<CharacterId> {
        self.anchors.remove(&master).map(|(_, a)| a)
    }

    /// Move context and anchor from `old` to `new`. An anchor pointing at
    /// `old` itself is rewritten to `new`.
    pub fn transfer(&self, old: CharacterId, new: CharacterId) -> Option<ControlContext> {
        if let Some(anchor) = self.take_anchor(old) {
            let anchor = if anchor == old { new } else { anchor };
            self.anchors.insert(new, anchor);
        }
        let mut context = self.remove(old)?;
        context.master = new;
        self.contexts.insert(new, context);
        Some(context)
    }
}
