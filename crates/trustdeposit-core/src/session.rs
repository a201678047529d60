//! The receipt session: one browser, one login, one deposit form.
//!
//! ```text
//! Idle -> BrowserReady -> [AwaitingTwoFactor ->] Authenticated
//!      -> OnTransactionsPage -> FormFilled -> Submitted | AbortedTestMode -> Closed
//! ```
//!
//! Any stage error moves to `Failed { stage, cause }` and then `Closed`.
//! The driver is closed exactly once whichever way the run ends, including
//! cancellation.

use crate::checkpoint::Checkpoints;
use crate::credentials::{Credentials, PortalConfig};
use crate::driver::{CodePrompt, Launcher, PageDriver};
use crate::locator::{LocatorSpec, inspect, locate, locate_and_apply};
use crate::receipt::{MatterTarget, ReceiptFormData};
use crate::selectors::{self, DASHBOARD_FRAGMENT, TRANSACTIONS_CONTENT};
use crate::{Error, Result, totp};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Launch,
    Login,
    TwoFactor,
    Navigate,
    OpenForm,
    FillForm,
    Submit,
}

impl Stage {
    /// Tag used in checkpoint names
    pub fn tag(&self) -> &'static str {
        match self {
            Stage::Launch => "launch",
            Stage::Login => "login",
            Stage::TwoFactor => "two-factor",
            Stage::Navigate => "navigate",
            Stage::OpenForm => "open-form",
            Stage::FillForm => "fill-form",
            Stage::Submit => "submit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    BrowserReady,
    AwaitingTwoFactor,
    Authenticated,
    OnTransactionsPage,
    FormFilled,
    Submitted,
    AbortedTestMode,
    Failed { stage: Stage, cause: String },
    Closed,
}

/// Bounded waits and fixed pauses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timings {
    pub navigation: Duration,
    pub login_pause: Duration,
    pub post_login_settle: Duration,
    pub two_factor_field: Duration,
    pub dashboard: Duration,
    pub transactions_settle: Duration,
    pub page_ready: Duration,
    pub page_content: Duration,
    pub strategy_wait: Duration,
    pub menu_item_wait: Duration,
    pub menu_settle: Duration,
    pub field_pause: Duration,
    pub dropdown_settle: Duration,
    pub contact_option_wait: Duration,
    pub submit_confirmation: Duration,
    pub pre_close: Duration,
    pub observation_window: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            navigation: Duration::from_secs(45),
            login_pause: Duration::from_secs(1),
            post_login_settle: Duration::from_secs(3),
            two_factor_field: Duration::from_secs(15),
            dashboard: Duration::from_secs(45),
            transactions_settle: Duration::from_secs(8),
            page_ready: Duration::from_secs(20),
            page_content: Duration::from_secs(15),
            strategy_wait: crate::locator::DEFAULT_STRATEGY_WAIT,
            menu_item_wait: Duration::from_secs(3),
            menu_settle: Duration::from_secs(2),
            field_pause: Duration::from_millis(500),
            dropdown_settle: Duration::from_secs(2),
            contact_option_wait: Duration::from_secs(2),
            submit_confirmation: Duration::from_secs(3),
            pre_close: Duration::from_secs(5),
            observation_window: Duration::from_secs(30),
        }
    }
}

impl Timings {
    /// No pauses at all, for tests against scripted drivers
    pub fn immediate() -> Self {
        Self {
            navigation: Duration::ZERO,
            login_pause: Duration::ZERO,
            post_login_settle: Duration::ZERO,
            two_factor_field: Duration::ZERO,
            dashboard: Duration::ZERO,
            transactions_settle: Duration::ZERO,
            page_ready: Duration::ZERO,
            page_content: Duration::ZERO,
            strategy_wait: Duration::ZERO,
            menu_item_wait: Duration::ZERO,
            menu_settle: Duration::ZERO,
            field_pause: Duration::ZERO,
            dropdown_settle: Duration::ZERO,
            contact_option_wait: Duration::ZERO,
            submit_confirmation: Duration::ZERO,
            pre_close: Duration::ZERO,
            observation_window: Duration::ZERO,
        }
    }
}

/// Everything a run needs to know besides credentials
#[derive(Debug, Clone)]
pub struct SessionPlan {
    pub portal: PortalConfig,
    pub target: MatterTarget,
    pub receipt: ReceiptFormData,
    pub test_mode: bool,
}

/// Final outcome, always produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Which form fields were filled and which were skipped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillReport {
    pub filled: Vec<String>,
    pub skipped: Vec<(String, String)>,
}

pub struct Session<P: CodePrompt> {
    credentials: Credentials,
    plan: SessionPlan,
    timings: Timings,
    checkpoints: Checkpoints,
    prompt: P,
    state: SessionState,
    stage: Stage,
    history: Vec<SessionState>,
    report: FillReport,
}

impl<P: CodePrompt> Session<P> {
    pub fn new(credentials: Credentials, plan: SessionPlan, prompt: P) -> Self {
        Self {
            credentials,
            plan,
            timings: Timings::default(),
            checkpoints: Checkpoints::default(),
            prompt,
            state: SessionState::Idle,
            stage: Stage::Launch,
            history: vec![SessionState::Idle],
            report: FillReport::default(),
        }
    }

    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    pub fn with_checkpoints(mut self, checkpoints: Checkpoints) -> Self {
        self.checkpoints = checkpoints;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Every state entered, starting with `Idle`
    pub fn history(&self) -> &[SessionState] {
        &self.history
    }

    pub fn fill_report(&self) -> &FillReport {
        &self.report
    }

    /// Run the session until it finishes or `cancel` resolves
    pub async fn run<L, C>(&mut self, launcher: &L, cancel: C) -> SessionResult
    where
        L: Launcher,
        C: Future<Output = ()>,
    {
        tokio::pin!(cancel);

        println!("🚀 Initializing browser...");
        let launched = tokio::select! {
            result = launcher.launch() => result,
            _ = &mut cancel => Err(Error::Interrupted),
        };

        let mut driver = match launched {
            Ok(driver) => driver,
            Err(e) => {
                println!("❌ Automation failed: {}", e);
                self.fail(Stage::Launch, &e);
                self.transition(SessionState::Closed);
                return self.result(Some(&e));
            }
        };
        println!("✅ Browser initialized");
        self.transition(SessionState::BrowserReady);

        let outcome = tokio::select! {
            result = self.drive(&driver) => result,
            _ = &mut cancel => Err(Error::Interrupted),
        };

        match &outcome {
            Ok(()) => {
                println!("🎉 Automation completed successfully!");
                if !self.plan.test_mode {
                    tokio::select! {
                        _ = pause(self.timings.pre_close) => {}
                        _ = &mut cancel => {}
                    }
                }
            }
            Err(e) => {
                println!("❌ Automation failed: {}", e);
                let stage = self.stage;
                self.checkpoint(&driver, &format!("{}-error", stage.tag())).await;
                self.fail(stage, e);
            }
        }

        if let Err(e) = driver.close().await {
            tracing::warn!("Failed to close browser: {}", e);
        }
        println!("🧹 Browser closed");
        self.transition(SessionState::Closed);

        self.result(outcome.as_ref().err())
    }

    async fn drive<D: PageDriver>(&mut self, driver: &D) -> Result<()> {
        self.stage = Stage::Login;
        self.login(driver).await?;

        self.stage = Stage::Navigate;
        self.open_transactions(driver).await?;

        self.stage = Stage::OpenForm;
        self.open_deposit_form(driver).await?;

        self.stage = Stage::FillForm;
        self.fill_form(driver).await;
        self.transition(SessionState::FormFilled);

        if self.plan.test_mode {
            self.transition(SessionState::AbortedTestMode);
            self.hold_for_inspection().await;
        } else {
            self.stage = Stage::Submit;
            self.submit(driver).await?;
            self.transition(SessionState::Submitted);
        }

        Ok(())
    }

    async fn login<D: PageDriver>(&mut self, driver: &D) -> Result<()> {
        println!("🔐 Logging into Smokeball...");
        let wait = self.timings.strategy_wait;

        let base = self.plan.portal.base().to_string();
        driver
            .goto(&base, self.timings.navigation)
            .await
            .map_err(|e| Error::LoginFailed(format!("could not open {}: {}", base, e)))?;
        self.checkpoint(driver, "login-page").await;

        let username = self.credentials.username.as_str();
        locate_and_apply(driver, &selectors::email_field(), Some(username), wait)
            .await
            .map_err(login_failed)?;
        pause(self.timings.login_pause).await;

        let password = self.credentials.password();
        locate_and_apply(driver, &selectors::password_field(), Some(password), wait)
            .await
            .map_err(login_failed)?;
        pause(self.timings.login_pause).await;

        locate_and_apply(driver, &selectors::login_button(), None, wait)
            .await
            .map_err(login_failed)?;
        pause(self.timings.post_login_settle).await;

        let url = driver.current_url().await.map_err(login_failed)?;
        if url.contains(DASHBOARD_FRAGMENT) {
            self.transition(SessionState::Authenticated);
        } else {
            println!("🔐 2FA required...");
            self.transition(SessionState::AwaitingTwoFactor);
            self.stage = Stage::TwoFactor;
            self.two_factor(driver).await.map_err(two_factor_failed)?;
            self.transition(SessionState::Authenticated);
        }

        println!("✅ Successfully logged in");
        Ok(())
    }

    async fn two_factor<D: PageDriver>(&mut self, driver: &D) -> Result<()> {
        let field = locate(
            driver,
            &selectors::two_factor_field(),
            self.timings.two_factor_field,
        )
        .await?;

        let code = self.obtain_code().await?;
        driver.fill(&field.handle, &code).await?;
        pause(self.timings.login_pause).await;

        match locate(driver, &selectors::verify_button(), self.timings.strategy_wait).await {
            Ok(verify) => driver.click(&verify.handle).await?,
            Err(_) => {
                tracing::debug!("No verify button, submitting the code with Enter");
                driver.press(&field.handle, "Enter").await?;
            }
        }

        if !driver.wait_for_url(DASHBOARD_FRAGMENT, self.timings.dashboard).await? {
            return Err(Error::TwoFactorFailed(
                "dashboard did not load after verification".to_string(),
            ));
        }

        println!("✅ 2FA verification successful");
        Ok(())
    }

    /// Generated code when a usable secret exists, otherwise ask the operator
    async fn obtain_code(&self) -> Result<String> {
        if let Some(secret) = self.credentials.totp_secret() {
            match totp::generate_code(secret) {
                Ok(code) => {
                    println!("🔐 Generated 2FA code (valid for {}s)", code.seconds_remaining);
                    return Ok(code.code);
                }
                Err(e) => tracing::warn!("{}; falling back to manual entry", e),
            }
        }

        println!("⚠️ Manual 2FA required - please enter code:");
        let code = self.prompt.request_code().await?;
        let code = code.trim().to_string();
        if code.is_empty() {
            return Err(Error::TwoFactorFailed("no code entered".to_string()));
        }
        Ok(code)
    }

    async fn open_transactions<D: PageDriver>(&mut self, driver: &D) -> Result<()> {
        let target = self.plan.target;
        println!("📋 Navigating to matter transactions...");
        println!("   Matter ID: {}", target.matter_id);
        println!("   Account ID: {}", target.account_id);

        let url = target.transactions_url(self.plan.portal.base());
        println!("🔗 Navigating to: {}", url);
        driver
            .goto(&url, self.timings.navigation)
            .await
            .map_err(|e| Error::Navigation(format!("{}: {}", url, e)))?;

        println!("⏳ Waiting for page to load...");
        pause(self.timings.transactions_settle).await;

        match driver.wait_until_ready(self.timings.page_ready).await {
            Ok(true) => println!("✅ Page load complete"),
            Ok(false) => println!("⚠️ Page load timeout, but continuing..."),
            Err(e) => println!("⚠️ Could not check page load state ({}), continuing...", e),
        }

        // A missing content signal is logged, not fatal. See DESIGN.md.
        match driver.wait_for_selector(TRANSACTIONS_CONTENT, self.timings.page_content).await {
            Ok(true) => println!("✅ Page content loaded"),
            Ok(false) => {
                self.checkpoint(driver, "transactions-page-error").await;
                tracing::warn!("Could not verify transactions page content; continuing");
            }
            Err(e) => {
                self.checkpoint(driver, "transactions-page-error").await;
                tracing::warn!("Could not verify transactions page content: {}", e);
            }
        }

        self.checkpoint(driver, "transactions-page-loaded").await;
        self.transition(SessionState::OnTransactionsPage);
        Ok(())
    }

    async fn open_deposit_form<D: PageDriver>(&mut self, driver: &D) -> Result<()> {
        self.checkpoint(driver, "before-fill-form").await;
        println!("🔘 Clicking \"Deposit Funds\" button...");

        if !self.open_via_create_new(driver).await {
            let wait = self.timings.strategy_wait;
            match locate_and_apply(driver, &selectors::deposit_button(), None, wait).await {
                Ok(found) => println!("✅ Found deposit button ({})", found.strategy),
                Err(e) => {
                    self.checkpoint(driver, "deposit-button-not-found").await;
                    return Err(e);
                }
            }
        }

        pause(self.timings.menu_settle).await;
        self.checkpoint(driver, "deposit-dialog-opened").await;
        Ok(())
    }

    /// "Create New" may open a menu holding the deposit entry
    async fn open_via_create_new<D: PageDriver>(&self, driver: &D) -> bool {
        let opener = selectors::create_new_button();
        if let Err(e) = locate_and_apply(driver, &opener, None, self.timings.strategy_wait).await {
            println!("⚠️ \"Create New\" menu not available: {}", e);
            return false;
        }

        println!("🔘 Found \"Create New\" button, opened menu");
        pause(self.timings.menu_settle).await;
        self.checkpoint(driver, "create-new-menu-opened").await;

        let item = selectors::deposit_menu_item();
        match locate_and_apply(driver, &item, None, self.timings.menu_item_wait).await {
            Ok(found) => {
                println!("✅ Found \"Deposit Funds\" in menu ({})", found.strategy);
                true
            }
            Err(e) => {
                println!("⚠️ {}", e);
                false
            }
        }
    }

    async fn fill_form<D: PageDriver>(&mut self, driver: &D) {
        let receipt = self.plan.receipt.clone();
        println!("💰 Filling receipt form...");

        println!("📅 Filling date: {}", receipt.date_text());
        self.fill_field(driver, "date", &selectors::date_field(), &receipt.date_text())
            .await;

        self.fill_received_from(driver, &receipt.payer_name()).await;

        if let Some(reason) = &receipt.reason {
            println!("📝 Filling reason: {}", reason);
            self.fill_field(driver, "reason", &selectors::reason_field(), reason)
                .await;
        }

        println!("💰 Filling amount: ${}", receipt.amount_text());
        self.fill_field(driver, "amount", &selectors::amount_field(), &receipt.amount_text())
            .await;

        pause(self.timings.field_pause).await;
        self.checkpoint(driver, "form-filled").await;

        match inspect(driver, &selectors::commit_button(), self.timings.strategy_wait).await {
            Ok(button) => match driver.is_enabled(&button.handle).await {
                Ok(enabled) => {
                    println!("🔘 \"Process/Open Receipt\" button enabled: {}", enabled)
                }
                Err(e) => println!("⚠️ Could not read \"Process/Open Receipt\" state: {}", e),
            },
            Err(_) => println!("⚠️ Could not find \"Process/Open Receipt\" button"),
        }
    }

    /// Fill one field; failures are reported and skipped
    async fn fill_field<D: PageDriver>(
        &mut self,
        driver: &D,
        field: &str,
        spec: &LocatorSpec,
        value: &str,
    ) {
        match locate_and_apply(driver, spec, Some(value), self.timings.strategy_wait).await {
            Ok(found) => {
                println!("✅ {} filled ({})", capitalize(field), found.strategy);
                pause(self.timings.field_pause).await;
                self.report.filled.push(field.to_string());
            }
            Err(e) => {
                println!("❌ Failed to fill {}: {}", field, e);
                self.report.skipped.push((field.to_string(), e.to_string()));
            }
        }
    }

    async fn fill_received_from<D: PageDriver>(&mut self, driver: &D, payer: &str) {
        println!("👤 Filling Received From: {}", payer);

        let located = match locate_and_apply(
            driver,
            &selectors::received_from_field(),
            Some(payer),
            self.timings.strategy_wait,
        )
        .await
        {
            Ok(located) => located,
            Err(e) => {
                println!("❌ Failed to fill Received From: {}", e);
                self.report
                    .skipped
                    .push(("received from".to_string(), e.to_string()));
                return;
            }
        };
        self.report.filled.push("received from".to_string());
        pause(self.timings.dropdown_settle).await;

        let contact = selectors::contact_option(payer);
        let selected = match locate(driver, &contact, self.timings.contact_option_wait).await {
            Ok(option) => driver
                .click(&option.handle)
                .await
                .map(|()| format!("✅ Selected contact from dropdown: {}", payer)),
            Err(_) => driver
                .press(&located.handle, "Enter")
                .await
                .map(|()| format!("✅ Entered contact name: {}", payer)),
        };
        match selected {
            Ok(message) => println!("{}", message),
            Err(_) => println!(
                "⚠️ Could not select from dropdown, leaving typed text: {}",
                payer
            ),
        }
        pause(self.timings.field_pause).await;
    }

    async fn hold_for_inspection(&self) {
        let receipt = &self.plan.receipt;
        println!();
        println!("{}", "=".repeat(60));
        println!("🧪 TEST MODE: Stopping before final submission");
        println!("{}", "=".repeat(60));
        println!("✅ Form has been filled successfully!");
        println!("📋 Form Summary:");
        println!("   - Date: {}", receipt.date_text());
        println!("   - Received From: {}", receipt.payer_name());
        println!("   - Reason: {}", receipt.reason.as_deref().unwrap_or("N/A"));
        println!("   - Amount: ${}", receipt.amount_text());
        println!("   - Matter: Pre-filled");
        if !self.report.skipped.is_empty() {
            let skipped: Vec<&str> = self.report.skipped.iter().map(|(f, _)| f.as_str()).collect();
            println!("   - Skipped fields: {}", skipped.join(", "));
        }
        println!();
        println!("⚠️ To actually create the receipt, run with --submit");
        println!("{}", "=".repeat(60));

        let window = self.timings.observation_window;
        if !window.is_zero() {
            println!();
            println!(
                "⏸️ Keeping browser open for {} seconds for inspection...",
                window.as_secs()
            );
            println!("   Press Ctrl+C to close early");
            pause(window).await;
        }
    }

    async fn submit<D: PageDriver>(&mut self, driver: &D) -> Result<()> {
        println!("💾 Clicking \"Process/Open Receipt\" button...");

        locate_and_apply(driver, &selectors::commit_button(), None, self.timings.strategy_wait)
            .await
            .map_err(|e| Error::SubmissionFailed(e.to_string()))?;

        pause(self.timings.submit_confirmation).await;
        self.checkpoint(driver, "after-submit").await;
        println!("✅ Receipt submitted!");
        Ok(())
    }

    async fn checkpoint<D: PageDriver>(&self, driver: &D, name: &str) {
        self.checkpoints.capture(driver, name).await;
    }

    fn transition(&mut self, next: SessionState) {
        tracing::debug!("Session state: {:?} -> {:?}", self.state, next);
        self.state = next.clone();
        self.history.push(next);
    }

    fn fail(&mut self, stage: Stage, error: &Error) {
        self.transition(SessionState::Failed {
            stage,
            cause: error.to_string(),
        });
    }

    fn result(&self, error: Option<&Error>) -> SessionResult {
        let test_mode = self.plan.test_mode;
        match error {
            None => SessionResult {
                success: true,
                message: if test_mode {
                    "Receipt form filled successfully"
                } else {
                    "Receipt created successfully"
                }
                .to_string(),
                error: None,
            },
            Some(e) => SessionResult {
                success: false,
                message: if test_mode {
                    "Failed to fill receipt form"
                } else {
                    "Failed to create receipt"
                }
                .to_string(),
                error: Some(e.to_string()),
            },
        }
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

fn login_failed(e: Error) -> Error {
    match e {
        Error::LoginFailed(_) | Error::Interrupted => e,
        other => Error::LoginFailed(other.to_string()),
    }
}

fn two_factor_failed(e: Error) -> Error {
    match e {
        Error::TwoFactorFailed(_) | Error::Interrupted => e,
        other => Error::TwoFactorFailed(other.to_string()),
    }
}

fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
