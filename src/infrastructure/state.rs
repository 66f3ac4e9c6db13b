//! Engine wiring
//!
//! Builds every adapter and service, starts the background tasks (update
//! loop, trigger dispatcher, cursed-item release sweep) and tears them down
//! again. All state lives in the engine instance; nothing is global.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::application::ports::inbound::{ChatLine, InteractionTarget};
use crate::application::ports::outbound::{
    ClockPort, DeviceBattery, FrameworkError, RandomPort, TriggerRepositoryPort,
};
use crate::application::services::{
    ActionExecutorService, CursedLootPorts, CursedLootService, DeviceBridgeService,
    ExecutorPorts, SettingsService, TriggerDispatchService, TriggerService, TriggerServiceImpl,
    TurnGameCompletion, TurnGameTracker,
};
use crate::domain::entities::LootPool;
use crate::domain::value_objects::{MoodlePresetId, MoodleStatusId, PlayerName};
use crate::infrastructure::channels::{ChannelChatCommands, ChannelEventBus};
use crate::infrastructure::clock::{SystemClock, SystemRandom};
use crate::infrastructure::collaborators::{
    LocalMoodleCatalog, LoggingShockCollar, LoopbackRemoteSession, SimulatedDeviceClient,
};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::framework::{FrameworkHandle, FrameworkLoop, SimulatedWorld, WorldTables};
use crate::infrastructure::interaction_hook::InteractionHook;
use crate::infrastructure::permissions::{RelayGrant, StaticPermissionOracle};
use crate::infrastructure::persistence::{InMemorySettingsRepository, InMemoryTriggerRepository};
use crate::infrastructure::restriction_store::InMemoryRestrictionStore;

const RELEASE_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

/// Time and randomness used by the engine
#[derive(Clone)]
pub struct EngineSources {
    pub clock: Arc<dyn ClockPort>,
    pub random: Arc<dyn RandomPort>,
}

impl Default for EngineSources {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock::new()),
            random: Arc::new(SystemRandom::new()),
        }
    }
}

/// A running automation engine
pub struct AutomationEngine {
    pub config: AppConfig,
    pub settings: Arc<SettingsService>,
    pub triggers: Arc<TriggerServiceImpl>,
    pub executor: Arc<ActionExecutorService>,
    pub cursed_loot: CursedLootService,
    pub devices: Arc<DeviceBridgeService>,
    pub store: Arc<InMemoryRestrictionStore>,
    pub permissions: Arc<StaticPermissionOracle>,
    pub remote: Arc<LoopbackRemoteSession>,
    pub moodles: Arc<LocalMoodleCatalog>,
    pub world: SimulatedWorld,
    turn_games: Mutex<TurnGameTracker>,
    framework: FrameworkHandle,
    clock: Arc<dyn ClockPort>,
    cancel_token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl AutomationEngine {
    /// Build and start the engine; also returns the outbound chat-command feed
    pub async fn start(
        config: AppConfig,
        sources: EngineSources,
    ) -> Result<(Self, mpsc::UnboundedReceiver<String>)> {
        let cancel_token = CancellationToken::new();
        let (bus, events) = ChannelEventBus::new();
        let bus = Arc::new(bus);

        let settings = Arc::new(SettingsService::new(Arc::new(
            InMemorySettingsRepository::new(),
        )));
        // Warm the cache so update-loop reads see stored values
        settings.get().await;

        let trigger_repository: Arc<dyn TriggerRepositoryPort> = match &config.triggers_json {
            Some(json) => Arc::new(
                InMemoryTriggerRepository::from_json(json.as_str())
                    .context("Invalid AUTOMATION_TRIGGERS_JSON")?,
            ),
            None => Arc::new(InMemoryTriggerRepository::new()),
        };
        let triggers = Arc::new(TriggerServiceImpl::new(
            trigger_repository,
            config.client_name.clone(),
        ));
        triggers.reload().await?;

        let store = Arc::new(InMemoryRestrictionStore::new(bus.clone()));
        let permissions = Arc::new(StaticPermissionOracle::new());
        if config.relay_own_triggers {
            permissions.grant(config.client_uid.clone(), RelayGrant::full());
        }
        let remote = Arc::new(LoopbackRemoteSession::new(config.remote_connected));
        let moodles = Arc::new(LocalMoodleCatalog::new(
            vec![MoodleStatusId::new()],
            vec![MoodlePresetId::new()],
        ));
        let devices = Arc::new(DeviceBridgeService::new(
            Arc::new(SimulatedDeviceClient::new(vec![DeviceBattery {
                device_name: "Simulated toy".to_string(),
                level: 1.0,
            }])),
            settings.clone(),
        ));
        let (chat, chat_commands) = ChannelChatCommands::new();

        let executor = Arc::new(ActionExecutorService::new(
            config.client_uid.clone(),
            ExecutorPorts {
                permissions: permissions.clone(),
                state: store.clone(),
                remote: remote.clone(),
                moodles: moodles.clone(),
                shock_collar: Arc::new(LoggingShockCollar),
                devices: devices.clone(),
                chat: Arc::new(chat),
                settings: settings.clone(),
            },
        ));

        let world = SimulatedWorld::new(WorldTables {
            party_size: config.party_size,
            ..Default::default()
        });
        let (framework_loop, framework) = FrameworkLoop::new(Box::new(world.clone()));

        let cursed_loot = CursedLootService::new(
            config.client_uid.clone(),
            CursedLootPorts {
                state: store.clone(),
                remote: remote.clone(),
                framework: Arc::new(framework.clone()),
                clock: sources.clock.clone(),
                random: sources.random.clone(),
                settings: settings.clone(),
            },
            LootPool::default(),
            Handle::current(),
        );
        let hook = InteractionHook::new().with_observer(Arc::new(cursed_loot.clone()));

        let mut tasks = Vec::new();
        tasks.push(tokio::spawn(
            framework_loop.with_hook(hook).run(cancel_token.clone()),
        ));
        tasks.push(tokio::spawn(
            TriggerDispatchService::new(triggers.clone(), executor.clone())
                .run(events, cancel_token.clone()),
        ));
        tasks.push(tokio::spawn(release_sweep(
            cursed_loot.clone(),
            sources.clock.clone(),
            cancel_token.clone(),
        )));

        let turn_games = Mutex::new(TurnGameTracker::new(
            config.client_name.clone(),
            sources.clock.clone(),
            bus,
        ));

        info!(client = %config.client_name, "Automation engine started");
        let engine = Self {
            config,
            settings,
            triggers,
            executor,
            cursed_loot,
            devices,
            store,
            permissions,
            remote,
            moodles,
            world,
            turn_games,
            framework,
            clock: sources.clock,
            cancel_token,
            tasks,
        };
        Ok((engine, chat_commands))
    }

    /// Feed one inbound chat line to the turn-game tracker
    pub async fn process_chat(&self, line: &ChatLine) -> Option<TurnGameCompletion> {
        self.turn_games.lock().await.process_chat(line)
    }

    pub async fn active_roll_cap(&self, player: &PlayerName) -> Option<u32> {
        self.turn_games.lock().await.get_active_cap_for_player(player)
    }

    /// Hand an intercepted interaction call to the update loop
    pub fn interact(&self, target: InteractionTarget) -> Result<(), FrameworkError> {
        self.framework.interact(target)
    }

    pub async fn release_expired(&self) -> usize {
        self.cursed_loot.release_expired(self.clock.now()).await.len()
    }

    /// Cancel background tasks and wait for them to finish
    pub async fn stop(self) -> Result<()> {
        info!("Stopping automation engine");
        self.cancel_token.cancel();
        if self.devices.has_session() {
            self.devices
                .disconnect()
                .await
                .context("Failed to disconnect device bridge")?;
        }
        for task in self.tasks {
            task.await.context("Background task failed")?;
        }
        Ok(())
    }
}

async fn release_sweep(
    cursed_loot: CursedLootService,
    clock: Arc<dyn ClockPort>,
    cancel_token: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            _ = tokio::time::sleep(RELEASE_SWEEP_INTERVAL) => {}
        }
        let released = cursed_loot.release_expired(clock.now()).await;
        if !released.is_empty() {
            debug!(count = released.len(), "Release sweep returned items to the pool");
        }
    }
}
