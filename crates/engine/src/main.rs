//! Warband Engine - scripted demo of hero mode on in-memory adapters.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use warband_domain::{
    AccountId, CellId, Character, CharacterId, CombatId, CombatantId, Facing, MapId, Position,
    SavePoint,
};
use warband_engine::infrastructure::{
    clock::SystemClock,
    memory::{InMemoryCharacters, InMemoryCombat, InMemorySessions, InMemoryWorld, RecordingNotifier},
    ports::{CharacterStore, Combatant, WorldPort},
    settings::HeroSettings,
};
use warband_engine::{App, AppPorts};

const TOWN: MapId = MapId::new(7411);

fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warband_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = HeroSettings::from_env();
    tracing::info!(
        max_heroes = settings.max_heroes_per_group,
        free_cell_fallback = settings.restore_to_free_cell,
        "Starting Warband Engine demo"
    );

    let characters = Arc::new(InMemoryCharacters::new());
    let sessions = Arc::new(InMemorySessions::new());
    let combat = Arc::new(InMemoryCombat::new());
    let world = Arc::new(InMemoryWorld::new());
    let notifier = Arc::new(RecordingNotifier::new());
    world.add_map(TOWN, (200..260).map(CellId::new));

    let account = AccountId::new();
    let master = characters.insert(
        Character::new(account, "Aldric")
            .with_level(120)
            .with_position(Position::new(TOWN, Some(CellId::new(215)), Facing::SouthWest))
            .online(),
    );
    world.attach(master, TOWN, CellId::new(215));
    sessions.connect(account, master);
    let heroes: Vec<CharacterId> = ["Brenna", "Corin"]
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let cell = CellId::new(230 + i as u16);
            characters.insert(
                Character::new(account, name)
                    .with_level(90)
                    .with_position(Position::new(TOWN, Some(cell), Facing::North))
                    .with_save_point(SavePoint::new(TOWN, cell)),
            )
        })
        .collect();

    let app = App::new(
        AppPorts {
            characters: characters.clone(),
            sessions: sessions.clone(),
            combat: combat.clone(),
            world: world.clone(),
            notifier: notifier.clone(),
            clock: Arc::new(SystemClock::new()),
        },
        settings,
    );
    let registry = &app.heroes.registry;

    for hero in &heroes {
        let outcome = registry.add_hero(master, *hero)?;
        println!("{}", outcome.message);
    }
    println!("{}", registry.roster(master)?);

    // One round of combat: the master, then each hero.
    let fight = CombatId::new();
    let mut fighters = vec![Combatant::for_character(CombatantId::new(1), fight, master)];
    for (i, hero) in heroes.iter().enumerate() {
        fighters.push(Combatant::for_character(
            CombatantId::new(i as i64 + 2),
            fight,
            *hero,
        ));
    }
    fighters.push(Combatant::monster(CombatantId::new(-1), fight));
    for id in std::iter::once(master).chain(heroes.iter().copied()) {
        let mut character = characters.get(id).context("character vanished")?;
        character.combat = Some(fight);
        characters.save(&character);
    }
    combat.start(fight, fighters.clone());

    let control = &app.heroes.turn_control;
    for fighter in &fighters {
        if !control.prepare_turn_control(fight, fighter) {
            println!("Turn of combatant {} passed", fighter.id);
            continue;
        }
        let actor = control.resolve_controlled_actor(master);
        let name = characters.get(actor).map(|c| c.name).unwrap_or_default();
        println!("Combatant {} acts, session plays {}", fighter.id, name);
        control.finalize_turn_control(fighter);
    }

    combat.end(fight);
    control.release_for_fight(fight);
    let mut leader = characters.get(master).context("master vanished")?;
    leader.combat = None;
    characters.save(&leader);
    app.heroes.leadership.restore_group_after_fight(master);

    let first = *heroes.first().context("no hero recruited")?;
    let outcome = app.heroes.leadership.switch_master(master, first)?;
    println!("{}", outcome.message);
    println!("{}", registry.roster(first)?);

    let dissolved = registry.remove_all_for_master(first);
    tracing::info!(
        dissolved,
        notices = notifier.sent_to(account).len(),
        "Demo finished"
    );
    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
