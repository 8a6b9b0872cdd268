//! # Checkout Widget Loader
//!
//! Sequences everything that has to happen before the hosted widget can be
//! shown: fetch a client token, make sure the vendor script is loaded, wait
//! for the container element, then initialize the widget and hand back
//! whatever outcome it reports.
//!
//! ```text
//! Idle → TokenRequested → TokenReceived → ScriptLoading → ScriptLoaded
//!      → WidgetInitialized → (Succeeded | Failed)
//! ```
//!
//! Token and script are independent signals; the widget is only initialized
//! once both hold, in whichever order they arrive. Browser globals are
//! reached through a [`WidgetHost`] handle so the sequencing runs without a
//! browser.

use crate::checkout::CheckoutIntent;
use crate::error::{CheckoutError, CheckoutResult};
use crate::provider::{ClientSession, ClientToken};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Vendor SDK bundle
pub const PRIMER_SDK_URL: &str = "https://sdk.primer.io/web/v2.57.3/Primer.min.js";

/// Element the widget renders into
pub const DEFAULT_CONTAINER_SELECTOR: &str = ".primer-checkout-container";

/// Loader lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoaderState {
    Idle,
    TokenRequested,
    TokenReceived,
    ScriptLoading,
    ScriptLoaded,
    WidgetInitialized,
    Succeeded,
    Failed,
}

impl LoaderState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoaderState::Succeeded | LoaderState::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScriptStatus {
    NotLoaded,
    Loading,
    Loaded,
}

/// What the caller should do after feeding an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    RequestToken,
    LoadScript,
    InitializeWidget,
    Wait,
}

/// Result reported by the widget's completion callbacks, passed through as-is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaymentOutcome {
    Completed {
        payment: serde_json::Value,
    },
    Failed {
        error: serde_json::Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payment: Option<serde_json::Value>,
    },
}

impl PaymentOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PaymentOutcome::Completed { .. })
    }
}

/// Bounded polling for the widget container
#[derive(Debug, Clone)]
pub struct ContainerPolling {
    /// Wait before the first lookup
    pub initial_delay: Duration,
    /// Wait between lookups
    pub retry_delay: Duration,
    pub max_attempts: u32,
}

impl Default for ContainerPolling {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            retry_delay: Duration::from_millis(1000),
            max_attempts: 5,
        }
    }
}

/// Where to load the widget from and where to put it
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub script_url: String,
    pub container_selector: String,
    pub polling: ContainerPolling,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            script_url: PRIMER_SDK_URL.to_string(),
            container_selector: DEFAULT_CONTAINER_SELECTOR.to_string(),
            polling: ContainerPolling::default(),
        }
    }
}

/// Exchanges the intent for a client token (the session endpoint)
#[async_trait(?Send)]
pub trait TokenSource {
    async fn request_token(&self, intent: &CheckoutIntent) -> CheckoutResult<ClientSession>;
}

/// Handle on the page the widget lives in
#[async_trait(?Send)]
pub trait WidgetHost {
    /// Whether the vendor global is already present
    fn widget_loaded(&self) -> bool;

    /// Inject the vendor script and resolve on its load event
    async fn load_script(&self, url: &str) -> CheckoutResult<()>;

    fn container_exists(&self, selector: &str) -> bool;

    async fn sleep(&self, duration: Duration);

    /// Call the widget's initialization entry point
    async fn show_checkout(&self, token: &ClientToken, container: &str) -> CheckoutResult<()>;

    /// Resolve once the widget calls back with success or failure
    async fn next_outcome(&self) -> PaymentOutcome;
}

/// Poll for `selector` with bounded retries. Returns the attempt on which the
/// container was found.
pub async fn wait_for_container<H>(
    host: &H,
    selector: &str,
    polling: &ContainerPolling,
) -> CheckoutResult<u32>
where
    H: WidgetHost + ?Sized,
{
    host.sleep(polling.initial_delay).await;

    for attempt in 1..=polling.max_attempts {
        if host.container_exists(selector) {
            return Ok(attempt);
        }
        debug!(selector, attempt, "Checkout container not in DOM yet");
        if attempt < polling.max_attempts {
            host.sleep(polling.retry_delay).await;
        }
    }

    Err(CheckoutError::DomNotReady {
        selector: selector.to_string(),
        attempts: polling.max_attempts,
    })
}

/// Checkout widget state machine
#[derive(Debug)]
pub struct CheckoutLoader {
    state: LoaderState,
    token: Option<ClientToken>,
    script: ScriptStatus,
    failure: Option<String>,
    outcome: Option<PaymentOutcome>,
    history: Vec<LoaderState>,
}

impl CheckoutLoader {
    pub fn new() -> Self {
        Self {
            state: LoaderState::Idle,
            token: None,
            script: ScriptStatus::NotLoaded,
            failure: None,
            outcome: None,
            history: vec![LoaderState::Idle],
        }
    }

    pub fn state(&self) -> LoaderState {
        self.state
    }

    /// Every state visited, starting at `Idle`
    pub fn history(&self) -> &[LoaderState] {
        &self.history
    }

    pub fn token(&self) -> Option<&ClientToken> {
        self.token.as_ref()
    }

    /// Message for the error panel, once failed
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn outcome(&self) -> Option<&PaymentOutcome> {
        self.outcome.as_ref()
    }

    /// Both gates hold and the widget has not been started
    pub fn is_ready(&self) -> bool {
        self.state == LoaderState::ScriptLoaded
    }

    fn transition(&mut self, to: LoaderState) {
        if self.state.is_terminal() || self.state == to {
            return;
        }
        debug!(from = ?self.state, to = ?to, "Checkout loader transition");
        self.state = to;
        self.history.push(to);
    }

    /// Advance once token and script status allow it
    fn settle(&mut self) {
        if self.token.is_none() {
            return;
        }
        match (self.state, self.script) {
            (LoaderState::TokenReceived, ScriptStatus::Loading) => {
                self.transition(LoaderState::ScriptLoading)
            }
            (
                LoaderState::TokenReceived | LoaderState::ScriptLoading,
                ScriptStatus::Loaded,
            ) => self.transition(LoaderState::ScriptLoaded),
            _ => {}
        }
    }

    /// Page mounted
    pub fn mount(&mut self) -> Next {
        if self.state != LoaderState::Idle {
            return Next::Wait;
        }
        self.transition(LoaderState::TokenRequested);
        Next::RequestToken
    }

    pub fn token_received(&mut self, token: ClientToken) -> Next {
        if self.state.is_terminal() {
            return Next::Wait;
        }
        self.token = Some(token);
        self.transition(LoaderState::TokenReceived);
        self.settle();

        match (self.state, self.script) {
            (LoaderState::ScriptLoaded, _) => Next::InitializeWidget,
            (_, ScriptStatus::NotLoaded) => Next::LoadScript,
            _ => Next::Wait,
        }
    }

    pub fn script_loading(&mut self) {
        if self.script == ScriptStatus::NotLoaded {
            self.script = ScriptStatus::Loading;
        }
        self.settle();
    }

    pub fn script_loaded(&mut self) -> Next {
        self.script = ScriptStatus::Loaded;
        self.settle();
        if self.is_ready() {
            Next::InitializeWidget
        } else {
            Next::Wait
        }
    }

    pub fn widget_initialized(&mut self) -> CheckoutResult<()> {
        if !self.is_ready() {
            return Err(CheckoutError::Internal(format!(
                "widget initialized in state {:?}",
                self.state
            )));
        }
        self.transition(LoaderState::WidgetInitialized);
        Ok(())
    }

    /// Record the widget's callback
    pub fn record_outcome(&mut self, outcome: PaymentOutcome) {
        if self.state.is_terminal() {
            return;
        }
        let next = match &outcome {
            PaymentOutcome::Completed { .. } => LoaderState::Succeeded,
            PaymentOutcome::Failed { error, .. } => {
                self.failure = Some(
                    CheckoutError::PaymentFailed {
                        details: error.clone(),
                    }
                    .to_string(),
                );
                LoaderState::Failed
            }
        };
        self.outcome = Some(outcome);
        self.transition(next);
    }

    /// Move to `Failed`, keeping the message for the error panel
    pub fn fail(&mut self, err: CheckoutError) -> CheckoutError {
        if !self.state.is_terminal() {
            warn!(state = ?self.state, "Checkout failed: {}", err);
            self.failure = Some(err.to_string());
            self.transition(LoaderState::Failed);
        }
        err
    }

    /// Drive a whole checkout attempt against a host and token source.
    ///
    /// Every error is terminal; the caller offers "try again" by starting a
    /// fresh loader.
    pub async fn run<H, T>(
        &mut self,
        host: &H,
        tokens: &T,
        intent: &CheckoutIntent,
        config: &LoaderConfig,
    ) -> CheckoutResult<PaymentOutcome>
    where
        H: WidgetHost + ?Sized,
        T: TokenSource + ?Sized,
    {
        if host.widget_loaded() {
            self.script_loaded();
        }
        self.mount();

        let session = match tokens.request_token(intent).await {
            Ok(session) => session,
            Err(e) => return Err(self.fail(e)),
        };
        if session.client_token.is_empty() {
            return Err(self.fail(CheckoutError::TokenRequest(
                "session endpoint returned an empty client token".to_string(),
            )));
        }
        info!(order_id = %session.order_id, "Client token received");

        if self.token_received(session.client_token) == Next::LoadScript {
            self.script_loading();
            if let Err(e) = host.load_script(&config.script_url).await {
                return Err(self.fail(e));
            }
            self.script_loaded();
        }

        if !self.is_ready() {
            return Err(self.fail(CheckoutError::Internal(format!(
                "loader stuck in state {:?}",
                self.state
            ))));
        }

        if let Err(e) =
            wait_for_container(host, &config.container_selector, &config.polling).await
        {
            return Err(self.fail(e));
        }

        let token = match self.token.clone() {
            Some(token) => token,
            None => return Err(self.fail(CheckoutError::Internal("token missing".to_string()))),
        };
        if let Err(e) = host.show_checkout(&token, &config.container_selector).await {
            return Err(self.fail(e));
        }
        self.widget_initialized()?;

        let outcome = host.next_outcome().await;
        info!(success = outcome.is_success(), "Checkout widget reported");
        self.record_outcome(outcome.clone());
        Ok(outcome)
    }
}

impl Default for CheckoutLoader {
    fn default() -> Self {
        Self::new()
    }
}
