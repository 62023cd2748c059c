// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The generation request lifecycle.
//!
//! One [`GenerationOrchestrator`] runs at most one attempt at a time. Each
//! attempt gets a fresh id and cancellation token; status writes from an
//! attempt that is no longer current are dropped. Failures are classified,
//! and retryable ones schedule a [`RetryCountdown`] that reissues the last
//! request unchanged.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::StreamExt;
use larder_config::model::{GenerationConfig, LarderConfig};
use larder_core::error::LarderError;
use larder_core::traits::Guardrail;
use larder_core::types::{
    ChatMessage, GenerateOptions, Recipe, RecipeIdea, Role, UserProfile,
};
use larder_plugin::ProviderRegistry;
use larder_recipes::{IdeaFilter, ParsedRecipe, filter_ideas, parse_ideas, parse_recipe_markdown};
use larder_resilience::{ApiError, ClassifyContext, ErrorClassifier, RetryCountdown, RetryPolicy};
use larder_storage::PersistenceStore;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::request::{Flavor, GenerationRequest};
use crate::status::RequestStatus;

/// Tunables that are not part of the retry policy.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Consecutive automatic retries allowed before giving up. Zero
    /// disables automatic retries.
    pub max_auto_retries: u32,
    /// API keys used when the store has none for a provider.
    pub fallback_credentials: HashMap<String, String>,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            max_auto_retries: 3,
            fallback_credentials: HashMap::new(),
        }
    }
}

impl OrchestratorSettings {
    /// Takes the retry budget and any `providers.<id>.api_key` values from
    /// the configuration.
    pub fn from_config(config: &LarderConfig) -> Self {
        let fallback_credentials = config
            .providers
            .iter()
            .filter_map(|(id, settings)| {
                let key = settings.api_key.as_deref()?.trim();
                (!key.is_empty()).then(|| (id.clone(), key.to_string()))
            })
            .collect();
        Self {
            max_auto_retries: config.generation.max_auto_retries,
            fallback_credentials,
        }
    }
}

/// Builds the classifier retry policy from the `[generation]` section.
pub fn retry_policy(config: &GenerationConfig) -> RetryPolicy {
    RetryPolicy {
        network_delay: config.network_retry_delay(),
        rate_limit_default: config.rate_limit_retry_delay(),
        backoff_base: config.backoff_base(),
        backoff_max: config.backoff_max(),
        max_retry_after: config.max_retry_after(),
    }
}

/// What one attempt produced.
#[derive(Debug, Clone)]
pub struct AttemptReport {
    /// Final status of the attempt. Idle when it was cancelled.
    pub status: RequestStatus,
    /// Structured recipe extracted from a recipe response.
    pub recipe: Option<Recipe>,
    /// Ideas parsed from an ideas response.
    pub ideas: Vec<RecipeIdea>,
    /// Soft notice, set when a response had no usable structure.
    pub notice: Option<ApiError>,
    /// State names the attempt moved through, in order, with repeats
    /// collapsed. Empty when a newer attempt superseded this one.
    pub transitions: Vec<&'static str>,
}

impl AttemptReport {
    fn new(status: RequestStatus) -> Self {
        Self {
            status,
            recipe: None,
            ideas: Vec::new(),
            notice: None,
            transitions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    User,
    Auto,
}

enum Step {
    Completed(AttemptReport),
    Cancelled,
}

struct Attempt {
    id: u64,
    token: CancellationToken,
}

#[derive(Default)]
struct Control {
    attempt_id: u64,
    token: CancellationToken,
    last_request: Option<GenerationRequest>,
    countdown: Option<RetryCountdown>,
    auto_retries: u32,
    running: bool,
    last_report: Option<AttemptReport>,
    transitions: Vec<&'static str>,
}

struct Shared {
    guardrail: Arc<dyn Guardrail>,
    registry: Arc<ProviderRegistry>,
    store: PersistenceStore,
    classifier: ErrorClassifier,
    settings: OrchestratorSettings,
    status: watch::Sender<RequestStatus>,
    control: Mutex<Control>,
}

/// Drives generation requests from validation to persisted output.
///
/// Cloning is cheap; clones share the same attempt and status, so one clone
/// can cancel a generation another clone is awaiting.
#[derive(Clone)]
pub struct GenerationOrchestrator {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for GenerationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationOrchestrator")
            .field("status", &*self.shared.status.borrow())
            .field("providers", &self.shared.registry.ids())
            .finish()
    }
}

impl GenerationOrchestrator {
    pub fn new(
        guardrail: Arc<dyn Guardrail>,
        registry: Arc<ProviderRegistry>,
        store: PersistenceStore,
        classifier: ErrorClassifier,
        settings: OrchestratorSettings,
    ) -> Self {
        let (status, _) = watch::channel(RequestStatus::Idle);
        Self {
            shared: Arc::new(Shared {
                guardrail,
                registry,
                store,
                classifier,
                settings,
                status,
                control: Mutex::new(Control::default()),
            }),
        }
    }

    /// Runs a new attempt to its end, cancelling any attempt in flight and
    /// any pending retry.
    pub async fn generate(&self, request: GenerationRequest) -> AttemptReport {
        Arc::clone(&self.shared).run(request, Trigger::User).await
    }

    /// Reissues the last request as a fresh user-initiated attempt.
    pub async fn retry_last(&self) -> Option<AttemptReport> {
        let request = self.shared.control().last_request.clone()?;
        Some(Arc::clone(&self.shared).run(request, Trigger::User).await)
    }

    /// Stops the running attempt and any pending retry. The status returns
    /// to Idle and nothing is persisted for the stopped attempt.
    pub fn cancel(&self) {
        self.shared.cancel();
    }

    /// Cancels a pending retry countdown. Returns false when none was
    /// pending.
    pub fn cancel_retry(&self) -> bool {
        let mut control = self.shared.control();
        let Some(countdown) = control.countdown.take() else {
            return false;
        };
        countdown.cancel();
        self.shared.set_status(&mut control, RequestStatus::Idle);
        debug!(attempt = control.attempt_id, "pending retry cancelled");
        true
    }

    /// Cancels everything and forgets the last request.
    pub fn reset(&self) {
        self.shared.cancel();
        let mut control = self.shared.control();
        control.last_request = None;
        control.last_report = None;
        control.auto_retries = 0;
        self.shared.set_status(&mut control, RequestStatus::Idle);
    }

    /// Clears chat and recipe history.
    pub async fn clear_history(&self) {
        self.shared.store.clear_chat_history().await;
        self.shared.store.clear_recipe_history().await;
    }

    pub fn status(&self) -> RequestStatus {
        self.shared.status.borrow().clone()
    }

    /// Receiver that observes every status change.
    pub fn subscribe(&self) -> watch::Receiver<RequestStatus> {
        self.shared.status.subscribe()
    }

    /// Text accumulated by the current or last completed attempt.
    pub fn content(&self) -> String {
        match &*self.shared.status.borrow() {
            RequestStatus::Streaming { content, .. } | RequestStatus::Completed { content, .. } => {
                content.clone()
            }
            _ => String::new(),
        }
    }

    /// Time left before a scheduled retry fires.
    pub fn pending_retry(&self) -> Option<Duration> {
        self.shared
            .control()
            .countdown
            .as_ref()
            .filter(|countdown| !countdown.is_cancelled() && !countdown.is_finished())
            .map(RetryCountdown::remaining)
    }

    /// True while an attempt runs or a retry countdown is pending.
    pub fn is_busy(&self) -> bool {
        let control = self.shared.control();
        control.running
            || control
                .countdown
                .as_ref()
                .is_some_and(|countdown| !countdown.is_cancelled() && !countdown.is_finished())
    }

    /// Report of the most recent attempt that ran to its end, including one
    /// started by an automatic retry.
    pub fn last_report(&self) -> Option<AttemptReport> {
        self.shared.control().last_report.clone()
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.shared.control().last_request.clone()
    }

    pub fn store(&self) -> &PersistenceStore {
        &self.shared.store
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.shared.registry
    }

    pub async fn chat_history(&self) -> Vec<ChatMessage> {
        self.shared.store.chat_history().await
    }

    pub async fn recipe_history(&self) -> Vec<Recipe> {
        self.shared.store.recipe_history().await
    }

    pub async fn recipe_ideas(&self) -> Vec<RecipeIdea> {
        self.shared.store.recipe_ideas().await
    }

    /// Stored ideas matching `filter`, newest batch first.
    pub async fn filter_ideas(&self, filter: &IdeaFilter) -> Vec<RecipeIdea> {
        let ideas = self.shared.store.recipe_ideas().await;
        filter_ideas(&ideas, filter).into_iter().cloned().collect()
    }
}

impl Shared {
    fn control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run(self: Arc<Self>, request: GenerationRequest, trigger: Trigger) -> AttemptReport {
        let attempt = {
            let mut control = self.control();
            self.begin(&mut control, &request, trigger)
        };
        self.drive(attempt, request).await
    }

    fn drive(
        self: Arc<Self>,
        attempt: Attempt,
        request: GenerationRequest,
    ) -> Pin<Box<dyn Future<Output = AttemptReport> + Send>> {
        Box::pin(async move {
            let report = self.attempt(&attempt, &request).await;
            self.finish(&attempt, report)
        })
    }

    /// Supersedes whatever ran before and publishes Validating. Runs under
    /// the control lock so a concurrent `cancel` sees the new attempt.
    fn begin(&self, control: &mut Control, request: &GenerationRequest, trigger: Trigger) -> Attempt {
        if let Some(countdown) = control.countdown.take() {
            countdown.cancel();
        }
        control.token.cancel();
        control.attempt_id += 1;
        control.token = CancellationToken::new();
        control.last_request = Some(request.clone());
        control.last_report = None;
        if trigger == Trigger::User {
            control.auto_retries = 0;
        }
        control.running = true;
        control.transitions.clear();

        debug!(
            attempt = control.attempt_id,
            provider = %request.provider,
            flavor = %request.flavor,
            ?trigger,
            "attempt started"
        );
        self.set_status(control, RequestStatus::Validating);
        Attempt {
            id: control.attempt_id,
            token: control.token.clone(),
        }
    }

    fn finish(&self, attempt: &Attempt, mut report: AttemptReport) -> AttemptReport {
        let mut control = self.control();
        if control.attempt_id == attempt.id {
            report.transitions = control.transitions.clone();
            control.running = false;
            control.last_report = Some(report.clone());
            debug!(attempt = attempt.id, transitions = ?report.transitions, "attempt finished");
        }
        report
    }

    /// Single writer of the status channel. Also records the state name
    /// for the current attempt's transition trace.
    fn set_status(&self, control: &mut Control, status: RequestStatus) {
        let name = status.name();
        if control.transitions.last() != Some(&name) {
            control.transitions.push(name);
        }
        self.status.send_replace(status);
    }

    fn cancel(&self) {
        let mut control = self.control();
        let had_countdown = match control.countdown.take() {
            Some(countdown) => {
                countdown.cancel();
                true
            }
            None => false,
        };
        control.token.cancel();
        control.running = false;
        let in_flight = self.status.borrow().is_in_flight();
        if had_countdown || in_flight {
            self.set_status(&mut control, RequestStatus::Idle);
            debug!(attempt = control.attempt_id, "generation cancelled");
        }
    }

    /// Writes `status` if `attempt` is still the current, uncancelled one.
    fn publish(&self, attempt: &Attempt, status: RequestStatus) -> bool {
        let mut control = self.control();
        if control.attempt_id != attempt.id || attempt.token.is_cancelled() {
            return false;
        }
        if !matches!(status, RequestStatus::Streaming { .. }) {
            debug!(attempt = attempt.id, state = status.name(), "status changed");
        }
        self.set_status(&mut control, status);
        true
    }

    async fn attempt(self: &Arc<Self>, attempt: &Attempt, request: &GenerationRequest) -> AttemptReport {
        let started = Instant::now();
        match self.execute(attempt, request, started).await {
            Ok(Step::Completed(report)) => report,
            Ok(Step::Cancelled) => {
                debug!(attempt = attempt.id, "attempt cancelled");
                AttemptReport::new(RequestStatus::Idle)
            }
            Err(error) => self.fail(attempt, request, error),
        }
    }

    async fn execute(
        &self,
        attempt: &Attempt,
        request: &GenerationRequest,
        started: Instant,
    ) -> Result<Step, LarderError> {
        let validation = self.guardrail.validate_input(&request.prompt);
        if !validation.valid {
            return Err(LarderError::PromptRejected {
                reason: validation.reason.unwrap_or_default(),
            });
        }
        let prompt = validation
            .sanitized_input
            .unwrap_or_else(|| request.prompt.clone());

        let credential = self.credential(&request.provider).await.ok_or_else(|| {
            LarderError::MissingCredential {
                provider: request.provider.clone(),
            }
        })?;
        let provider = self.registry.get(&request.provider).ok_or_else(|| {
            LarderError::AdapterNotFound {
                adapter_type: "provider".to_string(),
                name: request.provider.clone(),
            }
        })?;
        self.store.set_last_provider(&request.provider).await;

        let profile = self.store.profile().await;
        let locale = self.store.preferences().await.locale;
        let system_prompt = match request.flavor {
            Flavor::Recipe => self.guardrail.system_prompt(&profile, locale),
            Flavor::Ideas => self.guardrail.ideas_system_prompt(&profile, locale),
        };
        let options = GenerateOptions {
            model: request.model.clone(),
        };

        if !self.publish(attempt, RequestStatus::Connecting) {
            return Ok(Step::Cancelled);
        }
        let mut stream = tokio::select! {
            biased;
            _ = attempt.token.cancelled() => return Ok(Step::Cancelled),
            result = provider.generate_recipe(&system_prompt, &prompt, &credential, options) => result?,
        };

        let mut content = String::new();
        let mut tokens = 0usize;
        let mut chars = 0usize;
        self.publish(
            attempt,
            RequestStatus::Streaming {
                tokens,
                chars,
                content: String::new(),
            },
        );

        loop {
            if attempt.token.is_cancelled() {
                return Ok(Step::Cancelled);
            }
            let next = tokio::select! {
                biased;
                _ = attempt.token.cancelled() => return Ok(Step::Cancelled),
                next = stream.next() => next,
            };
            let Some(item) = next else {
                break;
            };
            let chunk = item?;
            if !chunk.content.is_empty() {
                tokens += 1;
                chars += chunk.content.chars().count();
                content.push_str(&chunk.content);
                let shown = match request.flavor {
                    Flavor::Recipe => content.clone(),
                    Flavor::Ideas => String::new(),
                };
                self.publish(
                    attempt,
                    RequestStatus::Streaming {
                        tokens,
                        chars,
                        content: shown,
                    },
                );
            }
            if chunk.done {
                break;
            }
        }

        if attempt.token.is_cancelled() {
            return Ok(Step::Cancelled);
        }
        let duration = started.elapsed();
        let Some(report) = self
            .complete(attempt, request, prompt, content, duration, &profile)
            .await
        else {
            return Ok(Step::Cancelled);
        };
        info!(
            provider = %request.provider,
            flavor = %request.flavor,
            tokens,
            chars,
            duration_ms = duration.as_millis() as u64,
            "generation completed"
        );
        Ok(Step::Completed(report))
    }

    /// Stored key first, then the configured fallback.
    async fn credential(&self, provider: &str) -> Option<String> {
        if let Some(key) = self.store.credential(provider).await {
            let key = key.trim();
            if !key.is_empty() {
                return Some(key.to_string());
            }
        }
        self.settings
            .fallback_credentials
            .get(provider)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }

    /// Records the exchange, extracts structure and persists it. Returns
    /// `None` when the attempt is cancelled before it could publish; writes
    /// not yet started are skipped.
    async fn complete(
        &self,
        attempt: &Attempt,
        request: &GenerationRequest,
        prompt: String,
        content: String,
        duration: Duration,
        profile: &UserProfile,
    ) -> Option<AttemptReport> {
        if attempt.token.is_cancelled() {
            return None;
        }
        let assistant = ChatMessage::new(Role::Assistant, content.clone());
        let assistant_id = assistant.id.clone();
        self.store
            .append_chat_messages(&[ChatMessage::new(Role::User, prompt), assistant])
            .await;

        let mut report = AttemptReport::new(RequestStatus::Completed {
            duration,
            content: content.clone(),
        });

        match request.flavor {
            Flavor::Recipe => {
                match parse_recipe_markdown(&content, &profile.allergies)
                    .filter(ParsedRecipe::qualifies)
                {
                    Some(parsed) => {
                        if attempt.token.is_cancelled() {
                            return None;
                        }
                        let recipe = parsed.into_recipe(&request.provider, Some(assistant_id));
                        let added = self.store.add_recipe(recipe.clone()).await;
                        if let Some(idea_id) = &request.from_idea {
                            if attempt.token.is_cancelled() {
                                return None;
                            }
                            let linked = added.then_some(recipe.id.as_str());
                            self.store.mark_idea_used(idea_id, linked).await;
                        }
                        debug!(title = %recipe.title, added, "recipe extracted");
                        report.recipe = Some(recipe);
                    }
                    None => {
                        debug!("response has no structured recipe");
                        report.notice = Some(ApiError::parse_failure());
                    }
                }
            }
            Flavor::Ideas => {
                let ideas = parse_ideas(&content, &request.idea_context);
                if ideas.is_empty() {
                    report.notice = Some(ApiError::parse_failure());
                } else {
                    if attempt.token.is_cancelled() {
                        return None;
                    }
                    let added = self.store.add_recipe_ideas(ideas.clone()).await;
                    debug!(parsed = ideas.len(), added, "ideas extracted");
                    report.ideas = ideas;
                }
            }
        }

        {
            let mut control = self.control();
            if control.attempt_id == attempt.id {
                control.auto_retries = 0;
            }
        }
        if !self.publish(attempt, report.status.clone()) {
            return None;
        }
        Some(report)
    }

    /// Classifies `error`, publishes it and schedules an automatic retry
    /// when the error allows one and the budget is not spent.
    fn fail(
        self: &Arc<Self>,
        attempt: &Attempt,
        request: &GenerationRequest,
        error: LarderError,
    ) -> AttemptReport {
        let mut control = self.control();
        if control.attempt_id != attempt.id || attempt.token.is_cancelled() {
            debug!(attempt = attempt.id, error = %error, "failure of a superseded attempt ignored");
            return AttemptReport::new(RequestStatus::Idle);
        }

        let api_error = self.classifier.classify(
            &error,
            &ClassifyContext {
                provider: Some(&request.provider),
                attempt: control.auto_retries,
            },
        );
        warn!(
            provider = %request.provider,
            code = %api_error.code,
            error = %error,
            "generation failed"
        );

        let status = RequestStatus::Error {
            error: api_error.clone(),
        };
        self.set_status(&mut control, status.clone());
        control.running = false;

        if let Some(delay) = api_error.retry_delay.filter(|_| api_error.should_auto_retry()) {
            if control.auto_retries < self.settings.max_auto_retries {
                control.auto_retries += 1;
                let shared = Arc::clone(self);
                let scheduled = attempt.id;
                control.countdown = Some(RetryCountdown::start(delay, move || async move {
                    let due = shared.retry_due(scheduled);
                    if let Some((attempt, request)) = due {
                        shared.drive(attempt, request).await;
                    }
                }));
                info!(
                    delay_ms = delay.as_millis() as u64,
                    retry = control.auto_retries,
                    max = self.settings.max_auto_retries,
                    "automatic retry scheduled"
                );
            } else {
                info!(
                    retries = control.auto_retries,
                    "automatic retry budget exhausted"
                );
            }
        }

        AttemptReport::new(status)
    }

    /// Starts the automatic retry scheduled by attempt `scheduled`, unless
    /// it was cancelled or something newer has started since. The new
    /// attempt is registered before the lock is released.
    fn retry_due(&self, scheduled: u64) -> Option<(Attempt, GenerationRequest)> {
        let mut control = self.control();
        if control.running || control.attempt_id != scheduled {
            return None;
        }
        let countdown = control.countdown.take()?;
        if countdown.is_cancelled() {
            return None;
        }
        let request = control.last_request.clone()?;
        let attempt = self.begin(&mut control, &request, Trigger::Auto);
        Some((attempt, request))
    }
}
