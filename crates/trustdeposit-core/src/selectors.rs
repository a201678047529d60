//! Locator specs for the Smokeball screens this tool drives.
//!
//! The markup carries no stable identifiers, so each target lists several
//! heuristics. Order matters: most specific first.

use crate::locator::{LocatorSpec, Pick, Query};

const TEXT_INPUTS: &str =
    r#"input[type="text"], input[type="email"], input:not([type]), textarea, [role="textbox"]"#;
const COMBOBOXES: &str = r#"[role="combobox"], input[type="text"], input:not([type])"#;
const NUMBER_INPUTS: &str = r#"input[type="number"], [role="spinbutton"]"#;
const BUTTONS: &str = r#"button, [role="button"]"#;
const MENU_ITEMS: &str = r#"[role="menuitem"], [role="option"], li, a"#;
const DROPDOWN_OPTIONS: &str = r#"[role="option"], [role="gridcell"], [role="row"], li"#;

/// Content that indicates the transactions screen has rendered
pub const TRANSACTIONS_CONTENT: &str = r#"button, table, [role="button"]"#;

/// URL fragment of the post-login landing page
pub const DASHBOARD_FRAGMENT: &str = "dashboard";

pub fn email_field() -> LocatorSpec {
    LocatorSpec::new("email field")
        .fill("email input", Query::css(r#"input[type="email"]"#))
        .fill("first textbox", Query::enumerate(TEXT_INPUTS, None, Pick::First))
}

pub fn password_field() -> LocatorSpec {
    LocatorSpec::new("password field")
        .fill("password input", Query::css(r#"input[type="password"]"#))
        .fill("second textbox", Query::enumerate(TEXT_INPUTS, None, Pick::Nth(1)))
}

pub fn login_button() -> LocatorSpec {
    LocatorSpec::new("login button")
        .click("role button 'Log in'", Query::role("button", "Log in"))
        .click("button containing 'log'", Query::text("button", "log"))
        .click("button containing 'sign in'", Query::text(BUTTONS, "sign in"))
}

pub fn two_factor_field() -> LocatorSpec {
    LocatorSpec::new("two-factor code field")
        .fill("role textbox 'Two-Factor Code'", Query::role("textbox", "Two-Factor Code"))
        .fill(
            "placeholder 'Two-Factor Code'",
            Query::css(r#"input[placeholder="Two-Factor Code"]"#),
        )
        .fill(
            "input attribute containing 'code'",
            Query::attribute(
                "input",
                &["placeholder", "aria-label", "name", "autocomplete"],
                "code",
            ),
        )
}

pub fn verify_button() -> LocatorSpec {
    LocatorSpec::new("verify button")
        .click("role button 'Verify'", Query::role("button", "Verify"))
        .click("button containing 'verify'", Query::text(BUTTONS, "verify"))
}

pub fn create_new_button() -> LocatorSpec {
    LocatorSpec::new("create new menu").click(
        "role button 'Create New'",
        Query::role("button", "Create New"),
    )
}

pub fn deposit_menu_item() -> LocatorSpec {
    LocatorSpec::new("deposit funds menu item")
        .click("role menuitem 'Deposit Funds'", Query::role("menuitem", "Deposit Funds"))
        .click(
            "menu entry containing 'deposit'",
            Query::enumerate(MENU_ITEMS, Some("deposit"), Pick::First),
        )
}

pub fn deposit_button() -> LocatorSpec {
    LocatorSpec::new("deposit funds button")
        .click("exact role button 'Deposit Funds'", Query::role_exact("button", "Deposit Funds"))
        .click("role button 'Deposit Funds'", Query::role("button", "Deposit Funds"))
        .click("button containing 'Deposit'", Query::text("button", "Deposit"))
        .click(
            "any button with deposit text",
            Query::enumerate(BUTTONS, Some("deposit"), Pick::First),
        )
        .click(
            "aria-label or title containing 'Deposit'",
            Query::attribute("*", &["aria-label", "title"], "Deposit"),
        )
        .click(
            "test id, class or id containing 'deposit'",
            Query::attribute("*", &["data-testid", "class", "id"], "deposit"),
        )
}

pub fn date_field() -> LocatorSpec {
    LocatorSpec::new("date deposited field")
        .fill("input near 'Date Deposited'", Query::near_label("Date Deposited", TEXT_INPUTS))
        .fill("first text input", Query::enumerate(TEXT_INPUTS, None, Pick::First))
}

pub fn received_from_field() -> LocatorSpec {
    LocatorSpec::new("received from field")
        .fill("combobox near 'Received From'", Query::near_label("Received From", COMBOBOXES))
        .fill("first combobox", Query::enumerate(r#"[role="combobox"]"#, None, Pick::First))
}

/// Dropdown entry for a contact once its name has been typed
pub fn contact_option(payer_name: &str) -> LocatorSpec {
    LocatorSpec::new(format!("contact option '{}'", payer_name))
        .click("role option", Query::role("option", payer_name))
        .click("dropdown entry with name", Query::text(DROPDOWN_OPTIONS, payer_name))
}

pub fn reason_field() -> LocatorSpec {
    LocatorSpec::new("reason field")
        .fill("input near 'Reason'", Query::near_label("Reason", TEXT_INPUTS))
        .fill(
            "input with reason placeholder",
            Query::attribute("input, textarea", &["placeholder", "aria-label", "name"], "reason"),
        )
}

pub fn amount_field() -> LocatorSpec {
    LocatorSpec::new("allocated amount field")
        .fill(
            "number input near 'Amount' in 'Allocated Matters'",
            Query::near_label_in("Allocated Matters", "Amount", NUMBER_INPUTS),
        )
        .fill("last number input", Query::enumerate(NUMBER_INPUTS, None, Pick::Last))
}

pub fn commit_button() -> LocatorSpec {
    LocatorSpec::new("process/open receipt button")
        .click("role button 'Process/Open Receipt'", Query::role("button", "Process/Open Receipt"))
        .click("button containing 'Process'", Query::text("button", "Process"))
}
