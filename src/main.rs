//! Persona Flow console bot
//!
//! Loads configuration and the bot bundle, wires the engine to a console
//! transport and runs until stdin closes or Ctrl-C is pressed.

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use persona_flow::adapters::{
    ConsoleTransport, FileSessionStore, FsAssetStore, HttpClassifier, HttpClassifierConfig,
    StaticGeoLookup,
};
use persona_flow::application::{
    ConversationEngine, EngineDependencies, EngineSettings, EngineStats, IdleSweeper,
    IdleSweeperConfig, MediaDispatcher, SessionRegistry, SharedRng, TypingSimulation,
};
use persona_flow::config::{AppConfig, BotBundle, LoggingConfig, TypingConfig};
use persona_flow::domain::foundation::ChatId;
use persona_flow::domain::personality::PersonalityEngine;
use persona_flow::ports::Classifier;

/// How long pending replies may keep flowing after input ends.
const DRAIN_GRACE: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging);

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }

    info!(path = %config.engine.bundle_path.display(), "Loading bot bundle");
    let bundle = BotBundle::load(&config.engine.bundle_path)?;
    let catalog = bundle.catalog()?;
    let scenario = catalog.select(config.engine.scenario.as_deref())?;
    info!(
        scenario = %scenario.name,
        steps = scenario.steps.len(),
        available = ?catalog.names(),
        "Scenario selected"
    );

    let geo = Arc::new(StaticGeoLookup::new(bundle.geo.clone()));
    let personality = PersonalityEngine::new(
        bundle.personality(config.engine.personality.as_deref()),
        geo,
    );

    let mut classifier_config =
        HttpClassifierConfig::new(config.classifier.base_url.clone())
            .with_timeout(config.classifier.timeout());
    if let Some(key) = &config.classifier.api_key {
        classifier_config = classifier_config.with_api_key(key.expose_secret().clone());
    }
    let classifier = HttpClassifier::new(classifier_config)?;
    match classifier.health().await {
        Ok(()) => info!(url = %config.classifier.base_url, "Classifier reachable"),
        Err(e) => warn!(
            url = %config.classifier.base_url,
            error = %e,
            "Classifier health check failed, replies will be treated as neutral until it recovers"
        ),
    }

    let rng = SharedRng::new(config.engine.rng_seed);
    let transport = Arc::new(ConsoleTransport::new().with_typing(config.transport.show_typing));
    let dispatcher = Arc::new(
        MediaDispatcher::new(
            Arc::new(bundle.media.clone()),
            Arc::new(FsAssetStore::new(&config.engine.media_root)),
        )
        .with_rng(rng)
        .with_send_timeout(config.transport.send_timeout()),
    );

    let settings = EngineSettings {
        apology_text: config.engine.apology_text.clone(),
        message_delay_ms: config.engine.message_delay_ms,
        retry_delay_ms: config.engine.retry_delay_ms,
        media_delay_ms: config.engine.media_delay_ms,
        classifier_timeout: config.classifier.timeout(),
        send_timeout: config.transport.send_timeout(),
        typing: typing_simulation(&config.typing),
        worker_idle_timeout: config.engine.worker_idle_timeout(),
        rng_seed: config.engine.rng_seed,
    };

    let mut engine = ConversationEngine::new(
        EngineDependencies {
            scenario,
            personality,
            classifier: Arc::new(classifier),
            transport,
            dispatcher,
            registry: Arc::new(SessionRegistry::new()),
            stats: Arc::new(EngineStats::new()),
        },
        settings,
    )?;

    if config.session.persistence.enabled {
        let store = FileSessionStore::new(&config.session.persistence.storage_path);
        info!(path = %store.file_path().display(), "Session persistence enabled");
        engine = engine.with_session_store(Arc::new(store));
    }
    let engine = Arc::new(engine);
    engine.restore().await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweeper = IdleSweeper::new(
        Arc::clone(&engine),
        IdleSweeperConfig::default()
            .with_interval(config.session.sweep_interval())
            .with_inactive_timeout(config.session.inactive_timeout()),
    );
    let sweeper_shutdown = shutdown_rx.clone();
    let sweeper_task = tokio::spawn(async move { sweeper.run(sweeper_shutdown).await });

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received");
            let _ = shutdown_tx.send(true);
        }
    });

    let inbound = ConsoleTransport::inbound(ChatId::new(config.transport.default_chat.clone()));
    Arc::clone(&engine).run(inbound, shutdown_rx).await;

    if !engine.wait_until_delivered(DRAIN_GRACE).await {
        warn!("Pending replies were not delivered before shutdown");
    }
    sweeper_task.abort();

    let stats = engine.stats().await;
    info!(
        received = stats.received,
        sent = stats.sent,
        failed = stats.failed,
        active_sessions = stats.active_sessions,
        uptime_secs = stats.uptime.as_secs(),
        "Persona Flow stopped"
    );
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let registry = tracing_subscriber::registry().with(logging.env_filter());
    if logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn typing_simulation(config: &TypingConfig) -> TypingSimulation {
    TypingSimulation {
        enabled: config.enabled,
        chars_per_minute: config.chars_per_minute,
        min: Duration::from_millis(config.min_ms),
        max: Duration::from_millis(config.max_ms),
        jitter: config.jitter,
    }
}
