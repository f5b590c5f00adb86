//! Turn control: hand a master's session to a hero for the hero's combat
//! turn, then hand it back.
//!
//! Per master the state is either idle (no context) or hero-controlled
//! (one [`ControlContext`]). The combat engine calls
//! [`TurnControlCoordinator::prepare_turn_control`] before a combatant acts
//! and [`TurnControlCoordinator::finalize_turn_control`] when its turn ends.
//!
//! All state lives in per-master DashMap entries, so handoffs in different
//! combats never wait on each other.

use std::sync::Arc;

use warband_domain::{AccountId, Character, CharacterId, CombatId};

use crate::infrastructure::ports::{
    ClientNotice, ClientNotifier, CombatPort, Combatant, SessionPort,
};
use crate::stores::{ControlContext, ControlContextStore};

use super::directory::HeroDirectory;

/// Why a master cannot take control of a hero this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ineligible {
    HeroMissing,
    Disconnected,
    NotInCombat,
    MasterIsGhost,
    CrossAccount,
}

pub struct TurnControlCoordinator {
    directory: Arc<HeroDirectory>,
    contexts: Arc<ControlContextStore>,
    sessions: Arc<dyn SessionPort>,
    combat: Arc<dyn CombatPort>,
    notifier: Arc<dyn ClientNotifier>,
}

impl TurnControlCoordinator {
    pub fn new(
        directory: Arc<HeroDirectory>,
        contexts: Arc<ControlContextStore>,
        sessions: Arc<dyn SessionPort>,
        combat: Arc<dyn CombatPort>,
        notifier: Arc<dyn ClientNotifier>,
    ) -> Self {
        Self {
            directory,
            contexts,
            sessions,
            combat,
            notifier,
        }
    }

    /// Decide how `combatant`'s turn starts.
    ///
    /// Returns `true` to let the turn proceed, `false` to pass it.
    pub fn prepare_turn_control(&self, combat: CombatId, combatant: &Combatant) -> bool {
        let Some(character_id) = combatant.character else {
            return true;
        };

        if !self.directory.is_hero(character_id) {
            self.release_control(character_id);
            return true;
        }

        let Some(master) = self.directory.find_master(character_id) else {
            tracing::warn!(hero_id = %character_id, "Hero has no resolvable master, passing turn");
            return false;
        };

        if combatant.dead {
            self.end_handoff(&master, Some(character_id));
            return true;
        }

        let hero = self.directory.characters().get(character_id);
        if let Err(reason) = self.check_eligibility(&master, hero.as_ref(), combat) {
            tracing::warn!(
                master_id = %master.id,
                hero_id = %character_id,
                combat_id = %combat,
                reason = ?reason,
                "Hero turn control refused, passing turn"
            );
            self.abandon(&master);
            return false;
        }

        let account = master.account_id;
        let current = self
            .sessions
            .current_incarnation(account)
            .unwrap_or(master.id);
        let anchor = self.contexts.anchor_or_insert(master.id, current);

        let switched = self.sessions.switch_incarnation(account, character_id)
            && self.sessions.current_incarnation(account) == Some(character_id);
        if !switched {
            tracing::warn!(
                master_id = %master.id,
                hero_id = %character_id,
                "Incarnation switch did not take effect, passing turn"
            );
            self.abandon(&master);
            return false;
        }

        self.sessions.set_tracked_combatant(account, combatant.id);
        let context = ControlContext {
            master: master.id,
            account,
            hero: character_id,
            combat,
            combatant: combatant.id,
        };
        if let Some(previous) = self.contexts.insert(context) {
            tracing::debug!(
                master_id = %master.id,
                previous_hero_id = %previous.hero,
                "Overwrote control context left by an earlier turn"
            );
        }
        tracing::info!(
            master_id = %master.id,
            hero_id = %character_id,
            anchor_id = %anchor,
            combat_id = %combat,
            combatant_id = %combatant.id,
            "Master took control of hero"
        );

        self.push_refresh(account, character_id, Some(combat));
        true
    }

    /// Hand the session back once `combatant`'s turn is over.
    pub fn finalize_turn_control(&self, combatant: &Combatant) {
        let Some(hero_id) = combatant.character else {
            return;
        };
        if !self.directory.is_hero(hero_id) {
            return;
        }
        let Some(master) = self.directory.find_master(hero_id) else {
            return;
        };
        if !self.end_handoff(&master, Some(hero_id)) {
            tracing::debug!(
                master_id = %master.id,
                hero_id = %hero_id,
                "Turn ended without a matching control context"
            );
        }
    }

    /// Who the session of `session_character` is acting as right now.
    pub fn resolve_controlled_actor(&self, session_character: CharacterId) -> CharacterId {
        let Some(character) = self.directory.characters().get(session_character) else {
            return session_character;
        };
        if let Some(current) = self.sessions.current_incarnation(character.account_id) {
            if self.directory.is_hero(current) {
                return current;
            }
        }
        match self.contexts.get(session_character) {
            Some(context) if self.is_valid(&context) => context.hero,
            _ => session_character,
        }
    }

    /// The live context for `master`, ignoring stale ones.
    pub fn active_context(&self, master: CharacterId) -> Option<ControlContext> {
        self.contexts.get(master).filter(|c| self.is_valid(c))
    }

    /// Re-key an in-flight handoff after the master identity changed.
    pub fn transfer_manual_control(&self, old_master: CharacterId, new_master: CharacterId) {
        if let Some(context) = self.contexts.transfer(old_master, new_master) {
            tracing::info!(
                old_master_id = %old_master,
                new_master_id = %new_master,
                hero_id = %context.hero,
                "Transferred hero control"
            );
        }
    }

    /// Drop every handoff referencing a finished combat. Returns how many.
    pub fn release_for_fight(&self, combat: CombatId) -> usize {
        let drained = self.contexts.drain_combat(combat);
        for context in &drained {
            let target = self
                .contexts
                .take_anchor(context.master)
                .unwrap_or(context.master);
            if !self.sessions.is_connected(context.account) {
                continue;
            }
            if self.sessions.current_incarnation(context.account) != Some(target)
                && !self.sessions.switch_incarnation(context.account, target)
            {
                tracing::warn!(master_id = %context.master, "Could not restore incarnation after combat");
                continue;
            }
            self.sessions.reset_tracked_combatant(context.account);
            self.push_refresh(context.account, target, None);
        }
        if !drained.is_empty() {
            tracing::info!(combat_id = %combat, released = drained.len(), "Released hero control for finished combat");
        }
        drained.len()
    }

    /// Drop any handoff held by `master` and restore its incarnation.
    pub fn release_control(&self, master: CharacterId) {
        let has_state =
            self.contexts.get(master).is_some() || self.contexts.anchor(master).is_some();
        if !has_state {
            return;
        }
        if let Some(master) = self.directory.characters().get(master) {
            self.end_handoff(&master, None);
        } else {
            self.contexts.remove(master);
            self.contexts.take_anchor(master);
        }
    }

    /// Release a handoff only if it targets `hero`.
    pub fn release_for_hero(&self, master: &Character, hero: CharacterId) {
        self.end_handoff(master, Some(hero));
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn check_eligibility(
        &self,
        master: &Character,
        hero: Option<&Character>,
        combat: CombatId,
    ) -> Result<(), Ineligible> {
        let hero = hero.ok_or(Ineligible::HeroMissing)?;
        if !master.online || !self.sessions.is_connected(master.account_id) {
            return Err(Ineligible::Disconnected);
        }
        if master.combat != Some(combat) {
            return Err(Ineligible::NotInCombat);
        }
        if master.ghost {
            return Err(Ineligible::MasterIsGhost);
        }
        if !master.same_account(hero) {
            return Err(Ineligible::CrossAccount);
        }
        Ok(())
    }

    /// A context counts only while the master is connected and the hero is
    /// still the same fighter in that combat.
    fn is_valid(&self, context: &ControlContext) -> bool {
        if !self.sessions.is_connected(context.account) {
            return false;
        }
        let still_fighting = self
            .combat
            .combatant(context.combat, context.combatant)
            .map(|c| c.character == Some(context.hero))
            .unwrap_or(false);
        if !still_fighting {
            return false;
        }
        self.directory
            .characters()
            .get(context.master)
            .map(|m| m.combat == Some(context.combat))
            .unwrap_or(false)
    }

    /// Failed handoff: forget any context and the tracked fighter. A session
    /// still sitting on a previous hero is sent back to its anchor.
    fn abandon(&self, master: &Character) {
        let account = master.account_id;
        let leftover = self.contexts.remove(master.id);
        let anchor = self.contexts.take_anchor(master.id);
        if let (Some(context), Some(anchor)) = (leftover, anchor) {
            if self.sessions.current_incarnation(account) == Some(context.hero)
                && self.sessions.switch_incarnation(account, anchor)
            {
                self.push_refresh(account, anchor, master.combat);
            }
        }
        self.sessions.reset_tracked_combatant(account);
    }

    /// Remove the master's context and switch back to the anchor.
    ///
    /// With `hero` set, only a context targeting that hero is released; if
    /// there is no context at all but the session still incarnates `hero`,
    /// the session is switched back anyway. Returns whether anything was
    /// released.
    fn end_handoff(&self, master: &Character, hero: Option<CharacterId>) -> bool {
        let account = master.account_id;
        let released = match hero {
            Some(hero) => {
                self.contexts.remove_if_hero(master.id, hero).is_some()
                    || (self.contexts.get(master.id).is_none()
                        && self.sessions.current_incarnation(account) == Some(hero))
            }
            None => {
                self.contexts.remove(master.id).is_some()
                    || self.contexts.anchor(master.id).is_some()
            }
        };
        if !released {
            return false;
        }

        let target = self.contexts.take_anchor(master.id).unwrap_or(master.id);
        if !self.sessions.is_connected(account) {
            return true;
        }
        if self.sessions.current_incarnation(account) != Some(target)
            && !self.sessions.switch_incarnation(account, target)
        {
            tracing::warn!(master_id = %master.id, target_id = %target, "Could not switch session back");
            return true;
        }

        match master
            .combat
            .and_then(|combat| self.combat.combatant_for_character(combat, master.id))
        {
            Some(own) => self.sessions.set_tracked_combatant(account, own.id),
            None => self.sessions.reset_tracked_combatant(account),
        }
        tracing::debug!(master_id = %master.id, target_id = %target, "Session handed back");
        self.push_refresh(account, target, master.combat);
        true
    }

    /// Stats, spells and inventory of `character`, then either the combat
    /// focus packets (inside a running combat) or the identity packet.
    fn push_refresh(&self, account: AccountId, character: CharacterId, combat: Option<CombatId>) {
        self.notifier.notify(account, ClientNotice::Stats { character });
        self.notifier
            .notify(account, ClientNotice::SpellList { character });
        self.notifier
            .notify(account, ClientNotice::Inventory { character });

        let timeline = combat
            .filter(|c| self.combat.is_active(*c))
            .and_then(|c| self.combat.timeline(c).map(|t| (c, t)));
        match timeline {
            Some((combat, timeline)) => {
                let focus = self
                    .combat
                    .combatant_for_character(combat, character)
                    .map(|c| c.id)
                    .unwrap_or(timeline.active);
                self.notifier.notify(
                    account,
                    ClientNotice::CombatFocus {
                        combat,
                        combatant: focus,
                    },
                );
                self.notifier.notify(
                    account,
                    ClientNotice::TurnStart {
                        combatant: timeline.active,
                    },
                );
                self.notifier
                    .notify(account, ClientNotice::turn_clock(&timeline));
            }
            None => {
                self.notifier
                    .notify(account, ClientNotice::Identity { character });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::infrastructure::ports::{
        CombatTimeline, MockClientNotifier, MockCombatPort, MockSessionPort,
    };
    use crate::test_fixtures::HeroWorld;
    use warband_domain::CombatantId;

    #[test]
    fn hero_turn_hands_control_to_master_and_back() {
        let world = HeroWorld::new();
        world.recruit(world.h1);
        let combat = world.start_combat();
        let turn = world.combatant(combat, world.h1);
        let control = &world.app.heroes.turn_control;

        assert!(control.prepare_turn_control(combat, &turn));
        assert_eq!(control.resolve_controlled_actor(world.master), world.h1);
        assert_eq!(world.sessions.tracked_combatant(world.account), Some(turn.id));

        control.finalize_turn_control(&turn);
        assert_eq!(control.resolve_controlled_actor(world.master), world.master);
        assert!(control.active_context(world.master).is_none());
        assert_eq!(
            world.sessions.tracked_combatant(world.account),
            Some(world.combatant(combat, world.master).id)
        );
    }

    #[test]
    fn disconnected_master_passes_turn_and_leaves_no_context() {
        let world = HeroWorld::new();
        world.recruit(world.h1);
        let combat = world.start_combat();
        let turn = world.combatant(combat, world.h1);
        world.sessions.disconnect(world.account);

        assert!(!world.app.heroes.turn_control.prepare_turn_control(combat, &turn));
        assert!(world.contexts().is_empty());
    }

    #[test]
    fn non_hero_turn_proceeds_without_touching_groups() {
        let world = HeroWorld::new();
        world.recruit(world.h1);
        let combat = world.start_combat();
        let before = world.app.heroes.registry.active_heroes(world.master);

        let own = world.combatant(combat, world.master);
        let monster = Combatant::monster(CombatantId::new(99), combat);
        assert!(world.app.heroes.turn_control.prepare_turn_control(combat, &own));
        assert!(world.app.heroes.turn_control.prepare_turn_control(combat, &monster));

        assert_eq!(world.app.heroes.registry.active_heroes(world.master), before);
        assert!(world.contexts().is_empty());
    }

    #[test]
    fn master_outside_the_combat_passes_turn() {
        let world = HeroWorld::new();
        world.recruit(world.h1);
        let combat = world.start_combat();
        world.update(world.master, |m| m.combat = Some(CombatId::new()));
        let turn = world.combatant(combat, world.h1);

        assert!(!world.app.heroes.turn_control.prepare_turn_control(combat, &turn));
        assert_eq!(world.sessions.tracked_combatant(world.account), None);
    }

    #[test]
    fn dead_hero_proceeds_without_handoff() {
        let world = HeroWorld::new();
        world.recruit(world.h1);
        let combat = world.start_combat();
        let mut turn = world.combatant(combat, world.h1);
        turn.dead = true;

        assert!(world.app.heroes.turn_control.prepare_turn_control(combat, &turn));
        assert!(world.contexts().is_empty());
        assert_eq!(
            world.app.heroes.turn_control.resolve_controlled_actor(world.master),
            world.master
        );
    }

    #[test]
    fn consecutive_hero_turns_keep_original_anchor() {
        let world = HeroWorld::new();
        world.recruit(world.h1);
        world.recruit(world.h2);
        let combat = world.start_combat();
        let control = &world.app.heroes.turn_control;
        let first = world.combatant(combat, world.h1);
        let second = world.combatant(combat, world.h2);

        assert!(control.prepare_turn_control(combat, &first));
        // The engine skipped the end call for the first hero.
        assert!(control.prepare_turn_control(combat, &second));
        assert_eq!(world.contexts().len(), 1);
        assert_eq!(control.resolve_controlled_actor(world.master), world.h2);

        // A late end call for the first hero must not undo the second handoff.
        control.finalize_turn_control(&first);
        assert_eq!(control.resolve_controlled_actor(world.master), world.h2);

        control.finalize_turn_control(&second);
        assert_eq!(world.sessions.current_incarnation(world.account), Some(world.master));
    }

    #[test]
    fn finalize_without_start_is_a_no_op() {
        let world = HeroWorld::new();
        world.recruit(world.h1);
        let combat = world.start_combat();
        world.notifier.clear();

        world
            .app
            .heroes
            .turn_control
            .finalize_turn_control(&world.combatant(combat, world.h1));

        assert!(world.notifier.sent_to(world.account).is_empty());
        assert_eq!(world.sessions.current_incarnation(world.account), Some(world.master));
    }

    #[test]
    fn stale_context_is_ignored_when_hero_leaves_combat() {
        let world = HeroWorld::new();
        world.recruit(world.h1);
        let combat = world.start_combat();
        let turn = world.combatant(combat, world.h1);
        let control = &world.app.heroes.turn_control;
        assert!(control.prepare_turn_control(combat, &turn));

        world.combat.remove_combatant(combat, turn.id);

        assert!(control.active_context(world.master).is_none());
    }

    #[test]
    fn release_for_fight_restores_master() {
        let world = HeroWorld::new();
        world.recruit(world.h1);
        let combat = world.start_combat();
        let control = &world.app.heroes.turn_control;
        assert!(control.prepare_turn_control(combat, &world.combatant(combat, world.h1)));

        world.combat.end(combat);
        assert_eq!(control.release_for_fight(combat), 1);
        assert_eq!(world.sessions.current_incarnation(world.account), Some(world.master));
        assert!(world.contexts().is_empty());
        assert_eq!(control.release_for_fight(combat), 0);
    }

    #[test]
    fn master_own_turn_reclaims_leftover_handoff() {
        let world = HeroWorld::new();
        world.recruit(world.h1);
        let combat = world.start_combat();
        let control = &world.app.heroes.turn_control;
        assert!(control.prepare_turn_control(combat, &world.combatant(combat, world.h1)));

        assert!(control.prepare_turn_control(combat, &world.combatant(combat, world.master)));
        assert_eq!(world.sessions.current_incarnation(world.account), Some(world.master));
        assert!(world.contexts().is_empty());
    }

    #[test]
    fn handoff_pushes_combat_refresh_sequence() {
        let world = HeroWorld::new();
        world.recruit(world.h1);
        let combat = world.start_combat();
        let turn = world.combatant(combat, world.h1);
        world.combat.set_timeline(
            combat,
            CombatTimeline {
                elapsed: Duration::from_millis(4_500),
                turn: 3,
                active: turn.id,
            },
        );
        world.notifier.clear();

        assert!(world.app.heroes.turn_control.prepare_turn_control(combat, &turn));

        let sent = world.notifier.sent_to(world.account);
        assert_eq!(
            sent,
            vec![
                ClientNotice::Stats { character: world.h1 },
                ClientNotice::SpellList { character: world.h1 },
                ClientNotice::Inventory { character: world.h1 },
                ClientNotice::CombatFocus { combat, combatant: turn.id },
                ClientNotice::TurnStart { combatant: turn.id },
                ClientNotice::TurnClock { elapsed_ms: 4_500, turn: 3 },
            ]
        );
    }

    #[test]
    fn refresh_outside_combat_sends_identity() {
        let world = HeroWorld::new();
        world.recruit(world.h1);
        let combat = world.start_combat();
        let control = &world.app.heroes.turn_control;
        assert!(control.prepare_turn_control(combat, &world.combatant(combat, world.h1)));

        world.combat.end(combat);
        world.update(world.master, |m| m.combat = None);
        world.notifier.clear();
        assert_eq!(control.release_for_fight(combat), 1);

        let sent = world.notifier.sent_to(world.account);
        assert_eq!(sent.last(), Some(&ClientNotice::Identity { character: world.master }));
        assert!(!sent
            .iter()
            .any(|n| matches!(n, ClientNotice::CombatFocus { .. } | ClientNotice::TurnStart { .. })));
    }

    #[test]
    fn hero_killed_mid_handoff_releases_control() {
        let world = HeroWorld::new();
        world.recruit(world.h1);
        let combat = world.start_combat();
        let control = &world.app.heroes.turn_control;
        let turn = world.combatant(combat, world.h1);
        assert!(control.prepare_turn_control(combat, &turn));

        world.combat.kill(combat, turn.id);
        let dead = world.combatant(combat, world.h1);
        assert!(dead.dead);

        assert!(control.prepare_turn_control(combat, &dead));
        assert!(world.contexts().is_empty());
        assert_eq!(world.contexts().anchor(world.master), None);
        assert_eq!(world.sessions.current_incarnation(world.account), Some(world.master));
        assert_eq!(control.resolve_controlled_actor(world.master), world.master);
    }

    #[test]
    fn refused_switch_passes_turn() {
        let world = HeroWorld::new();
        world.recruit(world.h1);
        let combat = world.start_combat();
        let turn = world.combatant(combat, world.h1);
        let master = world.character(world.master);

        let mut sessions = MockSessionPort::new();
        sessions.expect_is_connected().return_const(true);
        sessions
            .expect_current_incarnation()
            .return_const(Some(master.id));
        sessions.expect_switch_incarnation().return_const(false);
        sessions.expect_reset_tracked_combatant().times(1).return_const(());
        sessions.expect_set_tracked_combatant().never();

        let mut notifier = MockClientNotifier::new();
        notifier.expect_notify().never();

        let mut combat_port = MockCombatPort::new();
        combat_port
            .expect_combatant_for_character()
            .return_const(None::<Combatant>);

        let control = TurnControlCoordinator::new(
            world.app.heroes.directory.clone(),
            Arc::new(ControlContextStore::new()),
            Arc::new(sessions),
            Arc::new(combat_port),
            Arc::new(notifier),
        );

        assert!(!control.prepare_turn_control(combat, &turn));
    }
}
