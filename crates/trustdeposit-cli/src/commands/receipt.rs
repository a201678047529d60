use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use clap::{ArgAction, Args};
use console::{Term, style};
use rust_decimal::Decimal;
use std::path::PathBuf;
use trustdeposit_browser::{CdpLauncher, LaunchOptions};
use trustdeposit_core::checkpoint::DEFAULT_SCREENSHOT_DIR;
use trustdeposit_core::{
    Checkpoints, CodePrompt, Credentials, EnvSource, MatterTarget, PortalConfig, ReceiptFormData,
    Session, SessionPlan, SessionResult, totp,
};
use uuid::Uuid;

#[derive(Args, Debug, Clone)]
pub struct ReceiptArgs {
    /// Matter whose trust ledger receives the deposit
    #[arg(long, default_value = "ce2582fe-b415-4f95-b9b9-c79c903a4654")]
    pub matter_id: Uuid,

    /// Trust account, when not the firm's default
    #[arg(long)]
    pub account_id: Option<Uuid>,

    /// Deposit amount
    #[arg(long, default_value = "81.70")]
    pub amount: Decimal,

    /// Payer last name
    #[arg(long, default_value = "Stanford")]
    pub lastname: String,

    /// Payer first name
    #[arg(long, default_value = "Logan")]
    pub firstname: String,

    /// Reason for the deposit
    #[arg(long, default_value = "On account of test search fees")]
    pub reason: String,

    /// Date deposited (DD/MM/YYYY)
    #[arg(long, default_value = "21/11/2025", value_parser = parse_date)]
    pub date: NaiveDate,

    /// Stop before the final submission
    #[arg(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true",
        value_name = "BOOL"
    )]
    pub test_mode: bool,

    /// Actually create the receipt (overrides --test-mode)
    #[arg(long)]
    pub submit: bool,

    /// Directory for diagnostic screenshots
    #[arg(long, default_value = DEFAULT_SCREENSHOT_DIR)]
    pub screenshot_dir: PathBuf,

    /// Path to the Chrome binary
    #[arg(long, env = "TRUSTDEPOSIT_CHROME")]
    pub chrome_path: Option<PathBuf>,

    /// Reuse a named Chrome profile under ~/.trustdeposit/profiles
    #[arg(long)]
    pub profile: Option<String>,

    /// Run Chrome without a window
    #[arg(long)]
    pub headless: bool,
}

impl ReceiptArgs {
    pub fn test_mode(&self) -> bool {
        self.test_mode && !self.submit
    }
}

fn parse_date(raw: &str) -> std::result::Result<NaiveDate, String> {
    ReceiptFormData::parse_date(raw).map_err(|e| e.to_string())
}

/// Reads a 2FA code typed at the terminal
struct TerminalPrompt;

#[async_trait]
impl CodePrompt for TerminalPrompt {
    async fn request_code(&self) -> trustdeposit_core::Result<String> {
        let line = tokio::task::spawn_blocking(|| Term::stdout().read_line())
            .await
            .map_err(|e| trustdeposit_core::Error::Prompt(e.to_string()))??;
        Ok(line)
    }
}

/// Resolves on Ctrl+C
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

pub fn execute(args: ReceiptArgs) -> Result<SessionResult> {
    let test_mode = args.test_mode();

    let receipt = ReceiptFormData::new(
        args.date,
        args.amount,
        args.lastname.clone(),
        args.firstname.clone(),
        Some(args.reason.clone()),
    )?;

    let mut target = MatterTarget::new(args.matter_id);
    if let Some(account_id) = args.account_id {
        target = target.with_account(account_id);
    }

    let source = EnvSource::new();
    let credentials = Credentials::load(&source).with_context(|| {
        format!(
            "Set {} and {} in the environment",
            source.var_name(trustdeposit_core::credentials::USERNAME_KEY),
            source.var_name(trustdeposit_core::credentials::PASSWORD_KEY)
        )
    })?;
    let portal = PortalConfig::load(&source)?;

    if let Some(secret) = credentials.totp_secret() {
        if let Err(e) = totp::validate_secret(secret) {
            tracing::warn!("{}; 2FA will require manual input", e);
        }
    }

    print_banner(&receipt, &target, test_mode);

    let launcher = CdpLauncher::new(LaunchOptions {
        chrome_path: args.chrome_path.clone(),
        profile: args.profile.clone(),
        headless: args.headless,
    });
    let plan = SessionPlan {
        portal,
        target,
        receipt,
        test_mode,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(async {
        let mut session = Session::new(credentials, plan, TerminalPrompt)
            .with_checkpoints(Checkpoints::new(&args.screenshot_dir));
        session.run(&launcher, interrupted()).await
    });

    // A pending terminal read must not keep the process alive
    runtime.shutdown_timeout(std::time::Duration::from_millis(100));

    print_outcome(&result);
    Ok(result)
}

fn print_banner(receipt: &ReceiptFormData, target: &MatterTarget, test_mode: bool) {
    println!("{}", style("Smokeball Trust Deposit").bold().cyan());
    println!("{}", style("=======================").cyan());
    println!("  Matter:        {}", target.matter_id);
    println!("  Date:          {}", receipt.date_text());
    println!("  Received From: {}", receipt.payer_name());
    println!("  Amount:        ${}", receipt.amount_text());
    if test_mode {
        println!("  Mode:          {}", style("TEST (will not submit)").yellow());
    } else {
        println!("  Mode:          {}", style("SUBMIT").red().bold());
    }
    println!();
}

fn print_outcome(result: &SessionResult) {
    println!();
    if result.success {
        println!("{} {}", style("✅").green(), style(&result.message).green().bold());
    } else {
        println!("{} {}", style("❌").red(), style(&result.message).red().bold());
        if let Some(error) = &result.error {
            println!("   {}", style(error).dim());
        }
    }
}
