use crate::{Error, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Date format used by the deposit form
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// The firm's trust account
pub const DEFAULT_TRUST_ACCOUNT_ID: Uuid = uuid::uuid!("34154dcb-8a76-4f8c-9281-a9b80e3cca16");

/// Values entered into the deposit form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptFormData {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub last_name: String,
    pub first_name: String,
    pub reason: Option<String>,
}

impl ReceiptFormData {
    pub fn new(
        date: NaiveDate,
        amount: Decimal,
        last_name: impl Into<String>,
        first_name: impl Into<String>,
        reason: Option<String>,
    ) -> Result<Self> {
        let last_name = last_name.into().trim().to_string();
        let first_name = first_name.into().trim().to_string();

        if amount <= Decimal::ZERO {
            return Err(Error::Config(format!("amount must be positive, got {}", amount)));
        }
        if last_name.is_empty() || first_name.is_empty() {
            return Err(Error::Config("payer first and last name are required".to_string()));
        }

        Ok(Self {
            date,
            amount,
            last_name,
            first_name,
            reason: reason
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty()),
        })
    }

    /// Parse a `DD/MM/YYYY` date as typed on the command line
    pub fn parse_date(raw: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|e| {
            Error::Config(format!(
                "invalid date {:?} (expected DD/MM/YYYY): {}",
                raw, e
            ))
        })
    }

    pub fn date_text(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }

    pub fn amount_text(&self) -> String {
        self.amount.to_string()
    }

    /// Contact name as the "Received From" field expects it
    pub fn payer_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}

/// Which matter and trust account a deposit lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatterTarget {
    pub matter_id: Uuid,
    pub account_id: Uuid,
}

impl MatterTarget {
    pub fn new(matter_id: Uuid) -> Self {
        Self {
            matter_id,
            account_id: DEFAULT_TRUST_ACCOUNT_ID,
        }
    }

    pub fn with_account(mut self, account_id: Uuid) -> Self {
        self.account_id = account_id;
        self
    }

    /// Trust transactions screen for this matter, relative to `base`
    pub fn transactions_url(&self, base: &str) -> String {
        format!(
            "{}/#/billing/view-matter/{}/transactions/trust/{}~2FTrust",
            base.trim_end_matches('/'),
            self.matter_id,
            self.account_id
        )
    }
}
