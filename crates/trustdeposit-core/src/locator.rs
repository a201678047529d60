//! Ordered fallback chain for finding elements in an unstable UI.
//!
//! A [`LocatorSpec`] lists [`Strategy`] values from most to least specific.
//! [`locate`] asks the driver for each strategy's query in turn and stops at
//! the first visible, enabled match. Strategies after the winner are never
//! evaluated.

use crate::driver::PageDriver;
use crate::{Error, Result};
use serde::Serialize;
use std::time::Duration;

/// Default bound for a single strategy
pub const DEFAULT_STRATEGY_WAIT: Duration = Duration::from_secs(5);

/// One discovery heuristic, interpreted by the page driver.
///
/// Text comparisons are case-insensitive substring matches unless noted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Query {
    /// Accessible role plus accessible name; `exact` requires full equality
    Role {
        role: String,
        name: String,
        exact: bool,
    },
    /// First match of a CSS selector
    Css { selector: String },
    /// Matches of `selector` whose visible text contains `text`
    Text { selector: String, text: String },
    /// Matches of `selector` where any of `attributes` contains `value`
    Attribute {
        selector: String,
        attributes: Vec<String>,
        value: String,
    },
    /// `selector` inside the parent of the element labelled `label`,
    /// optionally searching for the label inside the parent of `section`
    NearLabel {
        label: String,
        section: Option<String>,
        selector: String,
    },
    /// Every match of `selector`, filtered by text or placeholder, then picked by position
    Enumerate {
        selector: String,
        contains: Option<String>,
        pick: Pick,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pick {
    First,
    Last,
    Nth(usize),
}

impl Query {
    pub fn role(role: &str, name: &str) -> Self {
        Query::Role {
            role: role.to_string(),
            name: name.to_string(),
            exact: false,
        }
    }

    pub fn role_exact(role: &str, name: &str) -> Self {
        Query::Role {
            role: role.to_string(),
            name: name.to_string(),
            exact: true,
        }
    }

    pub fn css(selector: &str) -> Self {
        Query::Css {
            selector: selector.to_string(),
        }
    }

    pub fn text(selector: &str, text: &str) -> Self {
        Query::Text {
            selector: selector.to_string(),
            text: text.to_string(),
        }
    }

    pub fn attribute(selector: &str, attributes: &[&str], value: &str) -> Self {
        Query::Attribute {
            selector: selector.to_string(),
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
            value: value.to_string(),
        }
    }

    pub fn near_label(label: &str, selector: &str) -> Self {
        Query::NearLabel {
            label: label.to_string(),
            section: None,
            selector: selector.to_string(),
        }
    }

    pub fn near_label_in(section: &str, label: &str, selector: &str) -> Self {
        Query::NearLabel {
            label: label.to_string(),
            section: Some(section.to_string()),
            selector: selector.to_string(),
        }
    }

    pub fn enumerate(selector: &str, contains: Option<&str>, pick: Pick) -> Self {
        Query::Enumerate {
            selector: selector.to_string(),
            contains: contains.map(str::to_string),
            pick,
        }
    }
}

/// What the caller does with a located element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Interaction {
    Click,
    Fill,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strategy {
    pub name: String,
    pub query: Query,
    pub interaction: Interaction,
}

impl Strategy {
    pub fn new(name: impl Into<String>, query: Query, interaction: Interaction) -> Self {
        Self {
            name: name.into(),
            query,
            interaction,
        }
    }
}

/// A semantic target and the ordered strategies for finding it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorSpec {
    pub target: String,
    pub strategies: Vec<Strategy>,
}

impl LocatorSpec {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            strategies: Vec::new(),
        }
    }

    pub fn click(mut self, name: &str, query: Query) -> Self {
        self.strategies.push(Strategy::new(name, query, Interaction::Click));
        self
    }

    pub fn fill(mut self, name: &str, query: Query) -> Self {
        self.strategies.push(Strategy::new(name, query, Interaction::Fill));
        self
    }

    pub fn strategy_names(&self) -> Vec<String> {
        self.strategies.iter().map(|s| s.name.clone()).collect()
    }
}

/// The winner of a chain run
#[derive(Debug)]
pub struct Located<H> {
    pub handle: H,
    pub strategy_index: usize,
    pub strategy: String,
    pub interaction: Interaction,
}

/// Run the chain, giving each strategy up to `wait` to produce a visible,
/// enabled match
pub async fn locate<D>(
    driver: &D,
    spec: &LocatorSpec,
    wait: Duration,
) -> Result<Located<D::Handle>>
where
    D: PageDriver + ?Sized,
{
    run_chain(driver, spec, wait, Match::Enabled).await
}

/// Like [`locate`], but a visible disabled element also ends the chain.
/// Used to report a control's state without interacting with it.
pub async fn inspect<D>(
    driver: &D,
    spec: &LocatorSpec,
    wait: Duration,
) -> Result<Located<D::Handle>>
where
    D: PageDriver + ?Sized,
{
    run_chain(driver, spec, wait, Match::Visible).await
}

#[derive(Debug, Clone, Copy)]
enum Match {
    Enabled,
    Visible,
}

async fn run_chain<D>(
    driver: &D,
    spec: &LocatorSpec,
    wait: Duration,
    wanted: Match,
) -> Result<Located<D::Handle>>
where
    D: PageDriver + ?Sized,
{
    let mut tried = Vec::with_capacity(spec.strategies.len());

    for (index, strategy) in spec.strategies.iter().enumerate() {
        tried.push(strategy.name.clone());

        let found = match wanted {
            Match::Enabled => driver.find(&strategy.query, wait).await,
            Match::Visible => driver.find_visible(&strategy.query, wait).await,
        };

        match found {
            Ok(Some(handle)) => {
                tracing::debug!(
                    "Located {} with strategy {} ({})",
                    spec.target,
                    index + 1,
                    strategy.name
                );
                return Ok(Located {
                    handle,
                    strategy_index: index,
                    strategy: strategy.name.clone(),
                    interaction: strategy.interaction,
                });
            }
            Ok(None) => {
                tracing::debug!(
                    "{}: strategy {} ({}) found nothing",
                    spec.target,
                    index + 1,
                    strategy.name
                );
            }
            Err(e) => {
                tracing::debug!(
                    "{}: strategy {} ({}) failed: {}",
                    spec.target,
                    index + 1,
                    strategy.name,
                    e
                );
            }
        }
    }

    Err(Error::ElementNotFound {
        target: spec.target.clone(),
        tried,
    })
}

/// Locate and apply the winning strategy's interaction
pub async fn locate_and_apply<D>(
    driver: &D,
    spec: &LocatorSpec,
    value: Option<&str>,
    wait: Duration,
) -> Result<Located<D::Handle>>
where
    D: PageDriver + ?Sized,
{
    let located = locate(driver, spec, wait).await?;

    match (located.interaction, value) {
        (Interaction::Click, _) => driver.click(&located.handle).await?,
        (Interaction::Fill, Some(text)) => driver.fill(&located.handle, text).await?,
        (Interaction::Fill, None) => {
            return Err(Error::Driver(format!(
                "no value supplied to fill {}",
                spec.target
            )));
        }
    }

    Ok(located)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, MockDriver, Script};

    fn chain() -> LocatorSpec {
        LocatorSpec::new("deposit button")
            .click("exact", Query::role_exact("button", "Deposit Funds"))
            .click("loose", Query::role("button", "deposit funds"))
            .click("text", Query::text("button", "Deposit"))
            .click("attribute", Query::attribute("*", &["aria-label"], "Deposit"))
    }

    fn finds(driver: &MockDriver) -> Vec<Query> {
        driver
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Find(q) => Some(q),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_stops_at_first_matching_strategy() {
        let spec = chain();
        let driver = MockDriver::new(Script::new().hit(spec.strategies[2].query.clone()));

        let located = locate(&driver, &spec, Duration::ZERO).await.unwrap();

        assert_eq!(located.strategy_index, 2);
        assert_eq!(located.strategy, "text");
        let queried = finds(&driver);
        assert_eq!(queried.len(), 3);
        assert_eq!(
            queried,
            spec.strategies[..3]
                .iter()
                .map(|s| s.query.clone())
                .collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn test_first_strategy_wins_even_if_later_would_match() {
        let spec = chain();
        let driver = MockDriver::new(
            Script::new()
                .hit(spec.strategies[0].query.clone())
                .hit(spec.strategies[3].query.clone()),
        );

        let located = locate(&driver, &spec, Duration::ZERO).await.unwrap();

        assert_eq!(located.strategy_index, 0);
        assert_eq!(finds(&driver).len(), 1);
    }

    #[tokio::test]
    async fn test_exhaustion_names_target_and_all_strategies() {
        let spec = chain();
        let driver = MockDriver::new(Script::new());

        let err = locate(&driver, &spec, Duration::ZERO).await.unwrap_err();

        match err {
            Error::ElementNotFound { target, tried } => {
                assert_eq!(target, "deposit button");
                assert_eq!(tried, vec!["exact", "loose", "text", "attribute"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(finds(&driver).len(), 4);
    }

    #[tokio::test]
    async fn test_failing_strategy_falls_through() {
        let spec = chain();
        let driver = MockDriver::new(
            Script::new()
                .broken(spec.strategies[0].query.clone())
                .hit(spec.strategies[1].query.clone()),
        );

        let located = locate(&driver, &spec, Duration::ZERO).await.unwrap();
        assert_eq!(located.strategy, "loose");
    }

    #[tokio::test]
    async fn test_disabled_match_falls_through_to_next_strategy() {
        let spec = chain();
        let driver = MockDriver::new(
            Script::new()
                .disabled(spec.strategies[0].query.clone())
                .hit(spec.strategies[1].query.clone()),
        );

        let located = locate(&driver, &spec, Duration::ZERO).await.unwrap();

        assert_eq!(located.strategy, "loose");
        assert_eq!(finds(&driver).len(), 2);
    }

    #[tokio::test]
    async fn test_only_disabled_matches_is_not_found() {
        let spec = chain();
        let mut script = Script::new();
        for strategy in &spec.strategies {
            script = script.disabled(strategy.query.clone());
        }
        let driver = MockDriver::new(script);

        let err = locate(&driver, &spec, Duration::ZERO).await.unwrap_err();

        assert!(matches!(err, Error::ElementNotFound { .. }));
    }

    #[tokio::test]
    async fn test_inspect_accepts_disabled_match() {
        let spec = chain();
        let driver = MockDriver::new(
            Script::new()
                .disabled(spec.strategies[0].query.clone())
                .hit(spec.strategies[1].query.clone()),
        );

        let located = inspect(&driver, &spec, Duration::ZERO).await.unwrap();

        assert_eq!(located.strategy, "exact");
        assert!(!driver.is_enabled(&located.handle).await.unwrap());
        assert!(finds(&driver).is_empty());
    }

    #[tokio::test]
    async fn test_apply_fills_with_value() {
        let query = Query::css("input[type=\"email\"]");
        let spec = LocatorSpec::new("email field").fill("email input", query.clone());
        let driver = MockDriver::new(Script::new().hit(query.clone()));

        locate_and_apply(&driver, &spec, Some("clerk@example.com"), Duration::ZERO)
            .await
            .unwrap();

        assert!(
            driver
                .calls()
                .contains(&Call::Fill(query, "clerk@example.com".to_string()))
        );
    }

    #[tokio::test]
    async fn test_apply_fill_without_value_is_an_error() {
        let query = Query::css("input");
        let spec = LocatorSpec::new("field").fill("any input", query.clone());
        let driver = MockDriver::new(Script::new().hit(query));

        assert!(locate_and_apply(&driver, &spec, None, Duration::ZERO).await.is_err());
    }

    #[test]
    fn test_query_serializes_with_kind_tag() {
        let query = Query::enumerate("button", Some("deposit"), Pick::Nth(1));
        let json = serde_json::to_value(query).unwrap();

        assert_eq!(json["kind"], "enumerate");
        assert_eq!(json["contains"], "deposit");
        assert_eq!(json["pick"]["nth"], 1);

        let first = serde_json::to_value(Pick::First).unwrap();
        assert_eq!(first, "first");
    }
}
