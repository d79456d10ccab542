//! Conversation Engine - top-level coordinator.
//!
//! For each inbound message the engine:
//! 1. Loads or creates the chat's session
//! 2. Classifies the reply (neutral default on any classifier failure)
//! 3. Validates it against the current step and resolves the next step
//! 4. Renders the next step's messages through the personality engine
//! 5. Enqueues the resulting actions and makes sure a drain task runs
//!
//! A broken scenario reference is answered with an apology and leaves the
//! session on its step. Nothing a collaborator does can fail the engine.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use super::drain::OutboundDrainer;
use super::media_dispatcher::MediaDispatcher;
use super::registry::SessionRegistry;
use super::rng::SharedRng;
use super::stats::{EngineStats, StatsReport};
use super::typing::TypingSimulation;
use crate::domain::classification::Classification;
use crate::domain::foundation::{ChatId, StepId, Timestamp, ValidationError};
use crate::domain::personality::PersonalityEngine;
use crate::domain::scenario::{
    sample_or, RetryDecision, Scenario, ScenarioError, ScenarioStateMachine, Step,
    DEFAULT_MESSAGE_DELAY_MS, DEFAULT_RETRY_DELAY_MS,
};
use crate::domain::session::{
    ConversationPhase, MediaPayload, MediaSource, OutboundAction, OutboundPlan, Session,
    SessionSnapshot, UserData,
};
use crate::ports::{
    ClassificationContext, ClassificationRequest, Classifier, InboundMessage, InboundStream,
    SessionStore, SessionStoreError, Transport,
};

const DELIVERY_POLL: Duration = Duration::from_millis(20);

/// Errors raised while processing one inbound message.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    #[error("invalid phase transition: {0}")]
    Phase(#[from] ValidationError),

    #[error("session store: {0}")]
    Store(#[from] SessionStoreError),
}

/// What an inbound message led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
    /// Moved to another step; `forced` when validation had failed.
    Advanced {
        from: StepId,
        to: StepId,
        forced: bool,
    },
    /// Reply accepted on a terminal step.
    Stayed,
    /// Reply rejected; retry message `attempt` was scheduled.
    Retried { attempt: u32 },
    /// Retries used up; moved to the step's timeout target.
    TimedOut { from: StepId, to: StepId },
    /// Retries used up with no timeout target.
    Exhausted,
    /// Scenario integrity error; the apology was scheduled.
    Apologized,
    /// Processing failed internally; nothing was scheduled.
    Aborted,
}

/// Tunables for the engine.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Sent when the scenario graph is broken. Empty disables it.
    pub apology_text: String,
    pub message_delay_ms: u64,
    pub retry_delay_ms: u64,
    pub media_delay_ms: u64,
    pub classifier_timeout: Duration,
    pub send_timeout: Duration,
    pub typing: TypingSimulation,
    /// A per-chat worker exits after this long without messages.
    pub worker_idle_timeout: Duration,
    /// Fixed seed for reproducible runs.
    pub rng_seed: Option<u64>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            apology_text: "Sorry, something went wrong on my side. Can you say that again?"
                .to_string(),
            message_delay_ms: DEFAULT_MESSAGE_DELAY_MS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            media_delay_ms: DEFAULT_RETRY_DELAY_MS,
            classifier_timeout: Duration::from_secs(10),
            send_timeout: Duration::from_secs(30),
            typing: TypingSimulation::default(),
            worker_idle_timeout: Duration::from_secs(300),
            rng_seed: None,
        }
    }
}

/// Collaborators injected into the engine.
pub struct EngineDependencies {
    pub scenario: Arc<Scenario>,
    pub personality: PersonalityEngine,
    pub classifier: Arc<dyn Classifier>,
    pub transport: Arc<dyn Transport>,
    pub dispatcher: Arc<MediaDispatcher>,
    pub registry: Arc<SessionRegistry>,
    pub stats: Arc<EngineStats>,
}

/// Drives every chat through the active scenario.
pub struct ConversationEngine {
    machine: ScenarioStateMachine,
    start_step: StepId,
    personality: PersonalityEngine,
    classifier: Arc<dyn Classifier>,
    dispatcher: Arc<MediaDispatcher>,
    registry: Arc<SessionRegistry>,
    drainer: Arc<OutboundDrainer>,
    store: Option<Arc<dyn SessionStore>>,
    /// Serializes snapshot-and-save so an older set never lands last.
    persist_lock: tokio::sync::Mutex<()>,
    stats: Arc<EngineStats>,
    rng: SharedRng,
    settings: EngineSettings,
}

impl ConversationEngine {
    /// Creates an engine for the given scenario.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Scenario` if the scenario has no steps.
    pub fn new(deps: EngineDependencies, settings: EngineSettings) -> Result<Self, EngineError> {
        let start_step = deps
            .scenario
            .start_step()
            .cloned()
            .ok_or_else(|| ScenarioError::NoSteps(deps.scenario.name.clone()))?;

        let rng = SharedRng::new(settings.rng_seed);
        let drainer = OutboundDrainer::new(
            deps.transport,
            Arc::clone(&deps.dispatcher),
            Arc::clone(&deps.stats),
        )
        .with_typing(settings.typing.clone())
        .with_send_timeout(settings.send_timeout)
        .with_rng(rng.clone());

        Ok(Self {
            machine: ScenarioStateMachine::new(deps.scenario),
            start_step,
            personality: deps.personality,
            classifier: deps.classifier,
            dispatcher: deps.dispatcher,
            registry: deps.registry,
            drainer: Arc::new(drainer),
            store: None,
            persist_lock: tokio::sync::Mutex::new(()),
            stats: deps.stats,
            rng,
            settings,
        })
    }

    /// Persists the session set after every mutation.
    pub fn with_session_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    pub fn scenario(&self) -> &Arc<Scenario> {
        self.machine.scenario()
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn dispatcher(&self) -> &Arc<MediaDispatcher> {
        &self.dispatcher
    }

    pub async fn stats(&self) -> StatsReport {
        self.stats.report(self.registry.len().await)
    }

    pub async fn list_sessions(&self) -> Vec<SessionSnapshot> {
        self.registry.snapshots().await
    }

    pub async fn session(&self, chat_id: &ChatId) -> Option<SessionSnapshot> {
        self.registry.get(chat_id).await.map(|live| live.snapshot())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Inbound processing
    // ─────────────────────────────────────────────────────────────────────

    /// Processes one inbound message.
    ///
    /// Messages for the same chat are serialized by the session lock.
    pub async fn handle_inbound(&self, message: InboundMessage) -> InboundOutcome {
        self.stats.record_received();

        let outcome = loop {
            let (live, created) = self
                .registry
                .get_or_create(&message.chat_id, || {
                    Session::new(
                        message.chat_id.clone(),
                        self.start_step.clone(),
                        Timestamp::now(),
                    )
                })
                .await;
            if created {
                info!(chat_id = %message.chat_id, step = %self.start_step, "Session created");
            }

            let mut session = live.lock().await;
            if live.is_cancelled() {
                // Evicted or removed while this message waited for the lock.
                debug!(chat_id = %message.chat_id, "Session torn down, starting over");
                continue;
            }

            let (outcome, plan) = match self.process(&mut session, &message).await {
                Ok(result) => result,
                Err(EngineError::Scenario(err)) => {
                    error!(
                        chat_id = %message.chat_id,
                        step = %session.current_step(),
                        error = %err,
                        "Scenario integrity error"
                    );
                    (InboundOutcome::Apologized, self.apology_plan())
                }
                Err(err) => {
                    error!(chat_id = %message.chat_id, error = %err, "Inbound processing aborted");
                    (InboundOutcome::Aborted, OutboundPlan::new())
                }
            };

            if !plan.is_empty() {
                if let Err(e) = session.enter_phase(ConversationPhase::DrainingQueue) {
                    debug!(chat_id = %message.chat_id, error = %e, "Phase not advanced");
                }
                debug!(chat_id = %message.chat_id, actions = plan.len(), "Actions enqueued");
                live.queue().push_all(plan.into_actions());
                self.drainer.ensure_draining(&live);
            }

            session.reset_phase();
            live.commit(&session);
            break outcome;
        };

        self.persist().await;
        outcome
    }

    async fn process(
        &self,
        session: &mut Session,
        message: &InboundMessage,
    ) -> Result<(InboundOutcome, OutboundPlan), EngineError> {
        session.touch(Timestamp::now());

        session.enter_phase(ConversationPhase::Classifying)?;
        let classification = self.classify(session, &message.text).await;
        session.apply_classification(&classification);

        session.enter_phase(ConversationPhase::Transitioning)?;
        let step = self.machine.scenario().require_step(session.current_step())?;
        let outcome = self
            .machine
            .validate(&message.text, &classification, session, step);
        debug!(
            chat_id = %session.chat_id(),
            step = %step.id,
            valid = outcome.is_valid,
            retry = outcome.needs_retry,
            force = outcome.force_progress,
            "Reply validated"
        );

        if outcome.needs_retry {
            return self.handle_retry(session, step);
        }

        let forced = !outcome.is_valid;
        match outcome.next_step {
            Some(next) => {
                let (from, plan) = self.enter_step(session, next.clone())?;
                if forced {
                    warn!(chat_id = %session.chat_id(), from = %from, to = %next, "Forced progress");
                } else {
                    info!(chat_id = %session.chat_id(), from = %from, to = %next, "Step transition");
                }
                Ok((
                    InboundOutcome::Advanced {
                        from,
                        to: next,
                        forced,
                    },
                    plan,
                ))
            }
            None => {
                debug!(chat_id = %session.chat_id(), step = %step.id, "Terminal step");
                Ok((InboundOutcome::Stayed, OutboundPlan::new()))
            }
        }
    }

    fn handle_retry(
        &self,
        session: &mut Session,
        step: &Step,
    ) -> Result<(InboundOutcome, OutboundPlan), EngineError> {
        let count = session.retry_count().saturating_add(1);

        match self.machine.retry_decision(step, count) {
            RetryDecision::Retry { attempt } => {
                session.register_retry();
                debug!(chat_id = %session.chat_id(), step = %step.id, attempt, "Retry");
                let plan = self.plan_retry(step, attempt, session.user_data());
                Ok((InboundOutcome::Retried { attempt }, plan))
            }
            RetryDecision::Timeout(target) => {
                let (from, plan) = self.enter_step(session, target.clone())?;
                info!(chat_id = %session.chat_id(), from = %from, to = %target, "Retries exhausted, timing out");
                Ok((InboundOutcome::TimedOut { from, to: target }, plan))
            }
            RetryDecision::Exhausted => {
                session.register_retry();
                info!(chat_id = %session.chat_id(), step = %step.id, "Retries exhausted");
                Ok((InboundOutcome::Exhausted, OutboundPlan::new()))
            }
        }
    }

    /// Moves the session to `next` and plans that step's messages.
    ///
    /// The target is checked before the session is touched.
    fn enter_step(
        &self,
        session: &mut Session,
        next: StepId,
    ) -> Result<(StepId, OutboundPlan), EngineError> {
        let step = self.machine.scenario().require_step(&next)?;
        let from = session.current_step().clone();
        session.advance_to(next);
        session.enter_phase(ConversationPhase::ExecutingStep)?;
        Ok((from, self.plan_step(step, session.user_data())))
    }

    async fn classify(&self, session: &Session, text: &str) -> Classification {
        let request = ClassificationRequest::new(
            text,
            ClassificationContext {
                current_step: session.current_step().clone(),
                previous_step: session.previous_step().cloned(),
                user_data: session.user_data().clone(),
            },
        );

        match timeout(
            self.settings.classifier_timeout,
            self.classifier.classify(&request),
        )
        .await
        {
            Ok(Ok(classification)) => classification,
            Ok(Err(e)) => {
                warn!(chat_id = %session.chat_id(), error = %e, "Classifier failed, using neutral classification");
                Classification::neutral()
            }
            Err(_) => {
                warn!(
                    chat_id = %session.chat_id(),
                    timeout_ms = self.settings.classifier_timeout.as_millis() as u64,
                    "Classifier timed out, using neutral classification"
                );
                Classification::neutral()
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Planning
    // ─────────────────────────────────────────────────────────────────────

    fn plan_step(&self, step: &Step, user_data: &UserData) -> OutboundPlan {
        let mut plan = OutboundPlan::new();

        self.rng.with(|rng| {
            for message in &step.messages {
                let text = self
                    .personality
                    .render(&message.content, &message.variations, user_data, rng);
                let delay = sample_or(message.delay.as_ref(), self.settings.message_delay_ms, rng);
                if text.is_empty() {
                    continue;
                }
                plan.push(OutboundAction::text(text, delay));
            }

            for media in &step.media_messages {
                let source = match (&media.source, &media.category) {
                    (Some(path), _) => MediaSource::Path(path.clone()),
                    (None, Some(category)) => MediaSource::Category(category.clone()),
                    (None, None) => {
                        warn!(step = %step.id, media_type = %media.media_type, "Media message without source or category");
                        continue;
                    }
                };
                let caption = media.caption.as_ref().map(|caption| {
                    self.personality
                        .choose_variation(caption.base(), caption.variations(), rng)
                        .to_string()
                });
                let delay = sample_or(media.delay.as_ref(), self.settings.media_delay_ms, rng);
                plan.push(OutboundAction::media(
                    MediaPayload {
                        media_type: media.media_type,
                        source,
                        caption,
                    },
                    delay,
                ));
            }
        });

        if let Some(sequence) = &step.sequence {
            plan.push(OutboundAction::sequence(sequence.clone(), Duration::ZERO));
        }
        plan
    }

    fn plan_retry(&self, step: &Step, attempt: u32, user_data: &UserData) -> OutboundPlan {
        let mut plan = OutboundPlan::new();
        let Some(template) = step.retry_message(attempt) else {
            return plan;
        };

        self.rng.with(|rng| {
            let text = self
                .personality
                .render(&template.content, &template.variations, user_data, rng);
            let delay = sample_or(template.delay.as_ref(), self.settings.retry_delay_ms, rng);
            if !text.is_empty() {
                plan.push(OutboundAction::text(text, delay));
            }
        });
        plan
    }

    fn apology_plan(&self) -> OutboundPlan {
        let mut plan = OutboundPlan::new();
        if !self.settings.apology_text.is_empty() {
            plan.push(OutboundAction::text(
                self.settings.apology_text.clone(),
                Duration::from_millis(self.settings.message_delay_ms),
            ));
        }
        plan
    }

    // ─────────────────────────────────────────────────────────────────────
    // Session lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Loads stored sessions into the registry.
    ///
    /// Restored sessions start with empty queues and no drain running.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Store` if the store cannot be read.
    pub async fn restore(&self) -> Result<usize, EngineError> {
        let Some(store) = &self.store else {
            return Ok(0);
        };

        let snapshots = store.load_all().await?;
        let count = snapshots.len();
        for snapshot in snapshots {
            if self.scenario().step(&snapshot.current_step).is_none() {
                warn!(
                    chat_id = %snapshot.chat_id,
                    step = %snapshot.current_step,
                    "Restored session points to an unknown step"
                );
            }
            self.registry.insert(Session::from_snapshot(snapshot)).await;
        }

        info!(count, "Sessions restored");
        Ok(count)
    }

    /// Operator removal of one session. Pending actions are discarded.
    pub async fn remove_session(&self, chat_id: &ChatId) -> bool {
        if self.registry.remove(chat_id).await.is_none() {
            return false;
        }
        self.dispatcher.forget(chat_id);

        if let Some(store) = &self.store {
            let _guard = self.persist_lock.lock().await;
            if let Err(e) = store.delete(chat_id).await {
                warn!(chat_id = %chat_id, error = %e, "Failed to delete stored session");
            }
        }
        info!(chat_id = %chat_id, "Session removed");
        true
    }

    /// Evicts sessions idle for longer than `threshold`.
    pub async fn evict_idle(&self, now: Timestamp, threshold: Duration) -> Vec<ChatId> {
        let evicted = self.registry.evict_idle(now, threshold).await;
        if evicted.is_empty() {
            return evicted;
        }

        for chat_id in &evicted {
            self.dispatcher.forget(chat_id);
        }
        info!(count = evicted.len(), "Idle sessions evicted");
        self.persist().await;
        evicted
    }

    /// Waits until no session has queued or in-flight outbound actions.
    ///
    /// # Returns
    /// `false` if `limit` elapsed first
    pub async fn wait_until_delivered(&self, limit: Duration) -> bool {
        let settled = async {
            loop {
                let mut busy = false;
                for chat_id in self.registry.chat_ids().await {
                    if let Some(live) = self.registry.get(&chat_id).await {
                        if live.queue().is_draining() || !live.queue().is_empty() {
                            busy = true;
                            break;
                        }
                    }
                }
                if !busy {
                    return;
                }
                sleep(DELIVERY_POLL).await;
            }
        };
        timeout(limit, settled).await.is_ok()
    }

    async fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let _guard = self.persist_lock.lock().await;
        let snapshots = self.registry.snapshots().await;
        if let Err(e) = store.save_all(&snapshots).await {
            warn!(sessions = snapshots.len(), error = %e, "Failed to persist sessions");
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Inbound routing
    // ─────────────────────────────────────────────────────────────────────

    /// Consumes `inbound` until it ends or `shutdown` flips to true.
    ///
    /// Each chat gets a worker task fed through an unbounded mpsc channel,
    /// so one chat's messages are handled in order and a backlog on one
    /// chat never holds up routing for the others.
    /// Workers exit after `worker_idle_timeout` and are recreated on demand.
    pub async fn run(self: Arc<Self>, mut inbound: InboundStream, mut shutdown: watch::Receiver<bool>) {
        let mut workers: HashMap<ChatId, mpsc::UnboundedSender<InboundMessage>> = HashMap::new();
        let mut tasks = JoinSet::new();
        info!(scenario = %self.scenario().name, "Engine running");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Shutdown requested");
                        break;
                    }
                }
                next = inbound.next() => match next {
                    Some(message) => self.route(&mut workers, &mut tasks, message),
                    None => {
                        info!("Inbound stream ended");
                        break;
                    }
                },
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {
                    workers.retain(|_, tx| !tx.is_closed());
                }
            }
        }

        // Workers finish their buffered messages once their senders drop.
        drop(workers);
        while tasks.join_next().await.is_some() {}
        info!("Engine stopped");
    }

    fn route(
        self: &Arc<Self>,
        workers: &mut HashMap<ChatId, mpsc::UnboundedSender<InboundMessage>>,
        tasks: &mut JoinSet<()>,
        message: InboundMessage,
    ) {
        let message = match workers.get(&message.chat_id) {
            Some(tx) => match tx.send(message) {
                Ok(()) => return,
                Err(mpsc::error::SendError(message)) => message,
            },
            None => message,
        };

        let chat_id = message.chat_id.clone();
        let (tx, rx) = mpsc::unbounded_channel();
        if tx.send(message).is_err() {
            warn!(chat_id = %chat_id, "Failed to hand message to a new worker");
            return;
        }
        debug!(chat_id = %chat_id, "Worker started");
        workers.insert(chat_id.clone(), tx);
        tasks.spawn(Arc::clone(self).worker(chat_id, rx));
    }

    async fn worker(
        self: Arc<Self>,
        chat_id: ChatId,
        mut rx: mpsc::UnboundedReceiver<InboundMessage>,
    ) {
        loop {
            match timeout(self.settings.worker_idle_timeout, rx.recv()).await {
                Ok(Some(message)) => {
                    self.handle_inbound(message).await;
                }
                Ok(None) => break,
                Err(_) => {
                    rx.close();
                    while let Some(message) = rx.recv().await {
                        self.handle_inbound(message).await;
                    }
                    break;
                }
            }
        }
        debug!(chat_id = %chat_id, "Worker exited");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::classifier::{MockClassifier, MockError};
    use crate::adapters::media::InMemoryAssetStore;
    use crate::adapters::storage::InMemorySessionStore;
    use crate::adapters::transport::RecordingTransport;
    use crate::domain::media::MediaConfig;
    use crate::domain::personality::PersonalityProfile;
    use crate::domain::scenario::ScenarioCatalog;
    use crate::ports::NoGeoData;
    use std::collections::BTreeMap;

    const SCENARIO: &str = r#"
start_step: greet
global_rules: {max_retries: 2}
steps:
  greet:
    transitions: {on_success: ask_location}
  ask_location:
    messages:
      - content: "where are you from?"
    retry_messages:
      - content: "come on, where?"
      - content: "last time, where?"
    validation:
      rule: {type: classifier, entity: location}
    transitions: {on_success: ask_age, on_timeout: bye}
  ask_age:
    messages:
      - content: "{{location}} is nice. how old are you?"
    validation:
      rule: {type: classifier, entity: age}
    transitions:
      on_success:
        type: conditional
        conditions:
          - {condition: "age < 19", next_step: too_young}
          - {condition: "age >= 19 && age <= 30", next_step: young}
        default: older
  too_young:
    messages: [{content: "too young"}]
  young:
    messages: [{content: "young"}]
  older:
    messages: [{content: "older"}]
  bye:
    messages: [{content: "bye"}]
"#;

    fn plain_profile() -> PersonalityProfile {
        serde_yaml::from_str(
            r#"
variation_probability: 0.0
typos: {enabled: false}
capitalization: {begin_sentence: true}
"#,
        )
        .unwrap()
    }

    fn scenario() -> Arc<Scenario> {
        let mut raw = BTreeMap::new();
        raw.insert(
            "main".to_string(),
            serde_yaml::from_str::<Scenario>(SCENARIO).unwrap(),
        );
        ScenarioCatalog::new(raw).unwrap().select(None).unwrap()
    }

    fn engine(classifier: MockClassifier, transport: RecordingTransport) -> ConversationEngine {
        let dispatcher = Arc::new(MediaDispatcher::new(
            Arc::new(MediaConfig::default()),
            Arc::new(InMemoryAssetStore::new()),
        ));
        let settings = EngineSettings {
            message_delay_ms: 0,
            retry_delay_ms: 0,
            typing: TypingSimulation::disabled(),
            rng_seed: Some(42),
            ..EngineSettings::default()
        };
        ConversationEngine::new(
            EngineDependencies {
                scenario: scenario(),
                personality: PersonalityEngine::new(plain_profile(), Arc::new(NoGeoData)),
                classifier: Arc::new(classifier),
                transport: Arc::new(transport),
                dispatcher,
                registry: Arc::new(SessionRegistry::new()),
                stats: Arc::new(EngineStats::new()),
            },
            settings,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn first_message_advances_from_start_step() {
        let engine = engine(MockClassifier::new(), RecordingTransport::new());

        let outcome = engine.handle_inbound(InboundMessage::text("c1", "hi")).await;

        assert_eq!(
            outcome,
            InboundOutcome::Advanced {
                from: StepId::new("greet"),
                to: StepId::new("ask_location"),
                forced: false,
            }
        );
        let snapshot = engine.session(&ChatId::new("c1")).await.unwrap();
        assert_eq!(snapshot.current_step.as_str(), "ask_location");
        assert_eq!(snapshot.previous_step.unwrap().as_str(), "greet");
    }

    #[tokio::test]
    async fn detected_entities_are_merged_and_rendered() {
        let classifier = MockClassifier::new()
            .with_classification(Classification::neutral())
            .with_location("Lyon");
        let transport = RecordingTransport::new();
        let engine = engine(classifier, transport.clone());

        engine.handle_inbound(InboundMessage::text("c1", "hi")).await;
        let outcome = engine.handle_inbound(InboundMessage::text("c1", "Lyon")).await;

        assert!(matches!(outcome, InboundOutcome::Advanced { ref to, .. } if to.as_str() == "ask_age"));
        let snapshot = engine.session(&ChatId::new("c1")).await.unwrap();
        assert_eq!(snapshot.user_data.location.as_deref(), Some("Lyon"));
    }

    #[tokio::test]
    async fn retries_then_times_out() {
        let engine = engine(MockClassifier::new(), RecordingTransport::new());
        let chat = || InboundMessage::text("c1", "dunno");

        engine.handle_inbound(InboundMessage::text("c1", "hi")).await;
        assert_eq!(
            engine.handle_inbound(chat()).await,
            InboundOutcome::Retried { attempt: 1 }
        );
        assert_eq!(
            engine.handle_inbound(chat()).await,
            InboundOutcome::Retried { attempt: 2 }
        );
        assert_eq!(
            engine.handle_inbound(chat()).await,
            InboundOutcome::TimedOut {
                from: StepId::new("ask_location"),
                to: StepId::new("bye"),
            }
        );
        let snapshot = engine.session(&ChatId::new("c1")).await.unwrap();
        assert_eq!(snapshot.retry_count, 0);
    }

    #[tokio::test]
    async fn conditional_transition_uses_first_match() {
        let classifier = MockClassifier::new()
            .with_classification(Classification::neutral())
            .with_location("Lyon")
            .with_age(25);
        let engine = engine(classifier, RecordingTransport::new());

        engine.handle_inbound(InboundMessage::text("c1", "hi")).await;
        engine.handle_inbound(InboundMessage::text("c1", "Lyon")).await;
        let outcome = engine.handle_inbound(InboundMessage::text("c1", "25")).await;

        assert!(matches!(outcome, InboundOutcome::Advanced { ref to, .. } if to.as_str() == "young"));
    }

    #[tokio::test]
    async fn classifier_failure_falls_back_to_neutral() {
        let classifier = MockClassifier::new()
            .with_classification(Classification::neutral())
            .with_error(MockError::Network {
                message: "refused".into(),
            });
        let engine = engine(classifier, RecordingTransport::new());

        engine.handle_inbound(InboundMessage::text("c1", "hi")).await;
        let outcome = engine.handle_inbound(InboundMessage::text("c1", "Lyon")).await;

        assert_eq!(outcome, InboundOutcome::Retried { attempt: 1 });
    }

    #[tokio::test]
    async fn dangling_step_is_answered_with_apology() {
        let store = Arc::new(InMemorySessionStore::new());
        let mut snapshot =
            Session::new(ChatId::new("c1"), StepId::new("removed"), Timestamp::now()).snapshot();
        snapshot.retry_count = 1;
        store.save_all(&[snapshot]).await.unwrap();

        let transport = RecordingTransport::new();
        let engine = engine(MockClassifier::new(), transport.clone()).with_session_store(store);
        engine.restore().await.unwrap();

        let outcome = engine.handle_inbound(InboundMessage::text("c1", "hi")).await;

        assert_eq!(outcome, InboundOutcome::Apologized);
        let snapshot = engine.session(&ChatId::new("c1")).await.unwrap();
        assert_eq!(snapshot.current_step.as_str(), "removed");
        assert_eq!(snapshot.retry_count, 1);
    }

    #[tokio::test]
    async fn remove_session_forgets_chat() {
        let engine = engine(MockClassifier::new(), RecordingTransport::new());
        engine.handle_inbound(InboundMessage::text("c1", "hi")).await;

        assert!(engine.remove_session(&ChatId::new("c1")).await);
        assert!(!engine.remove_session(&ChatId::new("c1")).await);
        assert!(engine.list_sessions().await.is_empty());
    }

    #[tokio::test]
    async fn stats_count_received_messages() {
        let engine = engine(MockClassifier::new(), RecordingTransport::new());
        engine.handle_inbound(InboundMessage::text("c1", "hi")).await;
        engine.handle_inbound(InboundMessage::text("c2", "hi")).await;

        let stats = engine.stats().await;
        assert_eq!(stats.received, 2);
        assert_eq!(stats.active_sessions, 2);
    }

    #[tokio::test]
    async fn message_waiting_on_a_removed_session_starts_fresh() {
        let transport = RecordingTransport::new();
        let engine = Arc::new(engine(MockClassifier::new(), transport.clone()));
        let chat = ChatId::new("c1");
        engine.handle_inbound(InboundMessage::text("c1", "hi")).await;
        assert!(engine.wait_until_delivered(Duration::from_secs(5)).await);

        let live = engine.registry().get(&chat).await.unwrap();
        let guard = live.lock().await;
        let pending = tokio::spawn({
            let engine = Arc::clone(&engine);
            async move { engine.handle_inbound(InboundMessage::text("c1", "hello again")).await }
        });
        sleep(Duration::from_millis(20)).await;

        assert!(engine.remove_session(&chat).await);
        drop(guard);

        let outcome = pending.await.unwrap();
        assert_eq!(
            outcome,
            InboundOutcome::Advanced {
                from: StepId::new("greet"),
                to: StepId::new("ask_location"),
                forced: false,
            }
        );
        assert!(engine.wait_until_delivered(Duration::from_secs(5)).await);
        let snapshot = engine.session(&chat).await.unwrap();
        assert_eq!(snapshot.current_step.as_str(), "ask_location");
        assert_eq!(transport.texts_for(&chat).len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_updates_persist_every_session() {
        let store = Arc::new(InMemorySessionStore::new());
        let engine = Arc::new(
            engine(MockClassifier::new(), RecordingTransport::new())
                .with_session_store(store.clone()),
        );

        let mut handles = Vec::new();
        for i in 0..20 {
            let engine = Arc::clone(&engine);
            handles.push(tokio::spawn(async move {
                engine
                    .handle_inbound(InboundMessage::text(format!("c{i}"), "hi"))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.load_all().await.unwrap().len(), 20);
    }
}
