//! Restraint Automation simulator
//!
//! Runs the automation engine against in-memory adapters and reads commands
//! from stdin:
//! - `chat <Name@World>: <message>` feeds a chat line to the turn-game tracker
//! - `interact <treasure|coffer|other> <id>` fires the world-interaction hook
//! - `loot <id>` puts an object into the party loot table
//! - `curse <gag name>` adds a cursed gag to the loot pool
//! - `gag <name>` / `ungag [name]` run gag actions as the local player
//! - `triggers` prints the trigger list, `state` the restriction snapshot
//! - `quit` stops the engine

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use restraint_automation::application::ports::inbound::{
    ChatLine, InteractionTarget, ObjectKind,
};
use restraint_automation::application::ports::outbound::RestrictionStatePort;
use restraint_automation::application::services::TriggerService;
use restraint_automation::domain::entities::{CursedItem, InvokableAction};
use restraint_automation::domain::value_objects::{GagRef, GagType, NewState, PlayerName};
use restraint_automation::infrastructure::config::AppConfig;
use restraint_automation::infrastructure::state::{AutomationEngine, EngineSources};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "restraint_automation=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Restraint Automation simulator");

    let config = AppConfig::from_env()?;
    tracing::info!("Configuration loaded");
    tracing::info!("  Client: {} ({})", config.client_name, config.client_uid);
    tracing::info!("  Party size: {}", config.party_size);

    let (engine, mut chat_commands) = AutomationEngine::start(config, EngineSources::default()).await?;

    let chat_printer = tokio::spawn(async move {
        while let Some(command) = chat_commands.recv().await {
            println!("> {command}");
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" {
            break;
        }
        if let Err(e) = run_command(&engine, line).await {
            tracing::warn!(error = %e, "Command failed");
        }
    }

    engine.stop().await?;
    chat_printer.abort();
    tracing::info!("Simulator stopped");
    Ok(())
}

async fn run_command(engine: &AutomationEngine, line: &str) -> Result<()> {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();
    let performer = engine.config.client_uid.clone();

    match command {
        "chat" => {
            let (sender, message) = rest
                .split_once(':')
                .ok_or_else(|| anyhow::anyhow!("usage: chat <Name@World>: <message>"))?;
            let sender = PlayerName::new(sender);
            if let Some(done) = engine.process_chat(&ChatLine::new(sender.clone(), message)).await {
                println!("{} wins against {}", done.winner, done.loser);
            } else if let Some(cap) = engine.active_roll_cap(&sender).await {
                println!("{sender} is playing with cap {cap}");
            }
        }
        "interact" => {
            let (kind, id) = rest
                .split_once(' ')
                .ok_or_else(|| anyhow::anyhow!("usage: interact <treasure|coffer|other> <id>"))?;
            let object_id: u64 = id.trim().parse()?;
            let object_kind = match kind {
                "treasure" => ObjectKind::Treasure,
                "coffer" => {
                    engine
                        .world
                        .edit(|t| { t.deep_dungeon_coffers.insert(object_id); });
                    ObjectKind::EventObj
                }
                _ => ObjectKind::Other,
            };
            engine.interact(InteractionTarget {
                object_kind,
                object_id,
                check_line_of_sight: true,
            })?;
        }
        "loot" => {
            let object_id: u64 = rest.parse()?;
            engine.world.edit(|t| {
                t.loot_table.insert(object_id);
            });
        }
        "curse" => {
            engine
                .cursed_loot
                .add_item(CursedItem::gag(format!("Cursed {rest}"), GagType::new(rest)));
        }
        "gag" | "ungag" => {
            let gag = if rest.is_empty() {
                GagRef::Any
            } else {
                GagRef::gag(rest)
            };
            let new_state = if command == "gag" {
                NewState::Enabled
            } else {
                NewState::Disabled
            };
            let action = InvokableAction::Gag { gag, new_state };
            let applied = engine.executor.execute_action(&action, &performer).await;
            println!("{command}: {}", if applied { "done" } else { "refused" });
        }
        "triggers" => {
            let triggers = engine.triggers.list().await;
            println!("{}", serde_json::to_string_pretty(&triggers)?);
        }
        "state" => {
            println!("{}", serde_json::to_string_pretty(&engine.store.snapshot())?);
            println!("{}", serde_json::to_string_pretty(&engine.cursed_loot.pool())?);
        }
        other => anyhow::bail!("unknown command: {other}"),
    }
    Ok(())
}
