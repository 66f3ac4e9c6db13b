//! End-to-end scenarios over a fully wired engine

use std::time::Duration;

use tokio::sync::mpsc;

use crate::application::ports::inbound::{ChatLine, InteractionTarget, ObjectKind};
use crate::application::ports::outbound::RestrictionStatePort;
use crate::application::services::TriggerService;
use crate::domain::entities::{
    CursedItem, GagTrigger, InvokableAction, SocialTrigger, Trigger, TriggerDetection,
};
use crate::domain::events::{SocialGame, SocialResult};
use crate::domain::value_objects::{AutomationSettings, GagRef, GagType, NewState, PlayerName};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::state::{AutomationEngine, EngineSources};

async fn engine(relay_own_triggers: bool) -> (AutomationEngine, mpsc::UnboundedReceiver<String>) {
    let config = AppConfig {
        relay_own_triggers,
        ..AppConfig::local("self", "Alia Fenn@Lamia")
    };
    AutomationEngine::start(config, EngineSources::default())
        .await
        .unwrap()
}

fn struggle_trigger() -> Trigger {
    Trigger::new(
        "Struggle against gag",
        TriggerDetection::GagState(GagTrigger {
            gag: GagRef::gag("Ball Gag"),
            new_state: NewState::Enabled,
        }),
        InvokableAction::text("/e struggles"),
    )
}

fn apply_ball_gag() -> InvokableAction {
    InvokableAction::Gag {
        gag: GagRef::gag("Ball Gag"),
        new_state: NewState::Enabled,
    }
}

/// Let the dispatcher drain whatever is queued
async fn settle() {
    tokio::time::sleep(Duration::from_millis(100)).await;
}

#[tokio::test]
async fn test_gag_trigger_relays_one_command() {
    let (engine, mut commands) = engine(true).await;
    engine.triggers.create(struggle_trigger()).await.unwrap();
    let me = engine.config.client_uid.clone();

    assert!(engine.executor.execute_action(&apply_ball_gag(), &me).await);

    let command = tokio::time::timeout(Duration::from_secs(2), commands.recv())
        .await
        .unwrap();
    assert_eq!(command.as_deref(), Some("/e struggles"));
    settle().await;
    assert!(commands.try_recv().is_err());

    engine.stop().await.unwrap();
}

#[tokio::test]
async fn test_gag_trigger_denied_relays_nothing() {
    let (engine, mut commands) = engine(false).await;
    engine.triggers.create(struggle_trigger()).await.unwrap();
    let me = engine.config.client_uid.clone();

    assert!(engine.executor.execute_action(&apply_ball_gag(), &me).await);
    settle().await;
    assert!(commands.try_recv().is_err());
    assert!(engine
        .store
        .snapshot()
        .is_gag_worn(&GagType::new("Ball Gag")));

    engine.stop().await.unwrap();
}

#[tokio::test]
async fn test_lost_turn_game_fires_social_trigger() {
    let (engine, mut commands) = engine(true).await;
    engine
        .triggers
        .create(Trigger::new(
            "Sulk after losing",
            TriggerDetection::SocialAction(SocialTrigger {
                game: SocialGame::TurnGame,
                result: SocialResult::Loss,
            }),
            InvokableAction::text("/e sulks"),
        ))
        .await
        .unwrap();

    let rival = PlayerName::new("Rival Name@Lamia");
    let me = engine.config.client_name.clone();
    engine.process_chat(&ChatLine::new(rival.clone(), "rolls 100")).await;
    engine
        .process_chat(&ChatLine::new(me.clone(), "rolls 12 (out of 100)"))
        .await;
    engine
        .process_chat(&ChatLine::new(
            PlayerName::new("rival name@lamia"),
            "rolls 5 (out of 12)",
        ))
        .await;
    let done = engine
        .process_chat(&ChatLine::new(me.clone(), "rolls 1 (out of 5)"))
        .await
        .unwrap();
    assert_eq!(done.loser, me);
    assert_eq!(done.winner, rival);

    let command = tokio::time::timeout(Duration::from_secs(2), commands.recv())
        .await
        .unwrap();
    assert_eq!(command.as_deref(), Some("/e sulks"));

    engine.stop().await.unwrap();
}

#[tokio::test]
async fn test_certain_cursed_loot_applies_timed_gag() {
    let (engine, _commands) = engine(true).await;
    engine
        .settings
        .update(AutomationSettings {
            cursed_loot_enabled: true,
            lock_chance: 100,
            lock_duration_min_secs: 60,
            lock_duration_max_secs: 120,
            loot_confirm_delay_ms: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    engine
        .cursed_loot
        .add_item(CursedItem::gag("Cursed muzzle", GagType::new("Muzzle")));

    engine
        .interact(InteractionTarget {
            object_kind: ObjectKind::Treasure,
            object_id: 5,
            check_line_of_sight: true,
        })
        .unwrap();

    let mut active = Vec::new();
    for _ in 0..200 {
        active = engine.cursed_loot.pool().active().to_vec();
        if !active.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(active.len(), 1);
    let lock_secs = (active[0].release_time - active[0].applied_time).num_seconds();
    assert!((60..=120).contains(&lock_secs));
    assert!(!engine.cursed_loot.pool().has_inactive());
    assert_eq!(engine.cursed_loot.last_opened(), Some(5));

    let snapshot = engine.store.snapshot();
    let slot = snapshot.gags[0].as_ref().unwrap();
    assert_eq!(slot.gag.as_str(), "Muzzle");
    assert!(slot.lock.is_some());
    assert_eq!(engine.remote.pushed().len(), 1);

    engine.stop().await.unwrap();
}
