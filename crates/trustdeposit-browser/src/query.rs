//! In-page interpreter for locator queries.
//!
//! Each [`Query`] is serialised to JSON and handed to [`LOCATE_JS`], which
//! finds the first visible, enabled candidate and tags it with a one-off
//! `data-trustdeposit-handle` token. The driver then resolves the token to an
//! element handle with an ordinary CSS lookup.
//!
//! With `allowDisabled` set, a visible disabled candidate is accepted when no
//! enabled one exists. That mode only serves state inspection.

use crate::{Error, Result};
use trustdeposit_core::Query;

pub const HANDLE_ATTRIBUTE: &str = "data-trustdeposit-handle";

/// `(query, token, allowDisabled) => bool`
pub const LOCATE_JS: &str = r#"
(function (query, token, allowDisabled) {
  const lower = (s) => (s == null ? '' : String(s)).trim().toLowerCase();
  const all = (selector, root) => {
    try {
      return Array.from((root || document).querySelectorAll(selector));
    } catch (e) {
      return [];
    }
  };
  const visible = (el) => {
    const style = window.getComputedStyle(el);
    if (style.display === 'none' || style.visibility === 'hidden') return false;
    const rect = el.getBoundingClientRect();
    return rect.width > 0 && rect.height > 0;
  };
  const enabled = (el) => !el.disabled && el.getAttribute('aria-disabled') !== 'true';
  const textOf = (el) => lower(el.innerText || el.textContent || el.value);

  const implicitRoles = {
    button: 'button, input[type="button"], input[type="submit"]',
    textbox: 'input:not([type]), input[type="text"], input[type="email"], input[type="tel"], textarea',
    combobox: 'select',
    option: 'option',
    spinbutton: 'input[type="number"]',
  };
  const byRole = (role) => {
    const implicit = implicitRoles[role];
    return all(implicit ? `[role="${role}"], ${implicit}` : `[role="${role}"]`);
  };
  const accessibleName = (el) => {
    const labelledBy = el.getAttribute('aria-labelledby');
    if (labelledBy) {
      const parts = labelledBy.split(/\s+/)
        .map((id) => document.getElementById(id))
        .filter(Boolean)
        .map((n) => n.textContent);
      if (parts.length) return lower(parts.join(' '));
    }
    const aria = el.getAttribute('aria-label');
    if (aria) return lower(aria);
    if (el.labels && el.labels.length) {
      return lower(Array.from(el.labels).map((l) => l.textContent).join(' '));
    }
    const placeholder = el.getAttribute('placeholder');
    if (placeholder) return lower(placeholder);
    const title = el.getAttribute('title');
    if (title) return lower(title);
    return textOf(el);
  };
  const labelFor = (text, root) => {
    const want = lower(text);
    const nodes = all('label, legend, th, td, span, div, p, h1, h2, h3, h4, h5, h6', root);
    return nodes.find((el) => lower(el.textContent) === want)
      || nodes.find((el) => el.children.length === 0 && lower(el.textContent).includes(want));
  };
  const pick = (els, how) => {
    if (how === 'last') return els[els.length - 1];
    if (how && typeof how.nth === 'number') return els[how.nth];
    return els[0];
  };

  let candidates = [];
  switch (query.kind) {
    case 'role': {
      const want = lower(query.name);
      candidates = byRole(query.role).filter((el) => {
        const name = accessibleName(el);
        return query.exact ? name === want : name.includes(want);
      });
      break;
    }
    case 'css':
      candidates = all(query.selector);
      break;
    case 'text': {
      const want = lower(query.text);
      candidates = all(query.selector).filter((el) => textOf(el).includes(want));
      break;
    }
    case 'attribute': {
      const want = lower(query.value);
      candidates = all(query.selector)
        .filter((el) => query.attributes.some((a) => lower(el.getAttribute(a)).includes(want)));
      break;
    }
    case 'near_label': {
      let root = document;
      if (query.section) {
        const section = labelFor(query.section, document);
        if (!section || !section.parentElement) return false;
        root = section.parentElement;
      }
      const label = labelFor(query.label, root);
      if (!label || !label.parentElement) return false;
      candidates = all(query.selector, label.parentElement);
      break;
    }
    case 'enumerate': {
      let matches = all(query.selector).filter(visible);
      if (query.contains) {
        const want = lower(query.contains);
        matches = matches.filter((el) =>
          textOf(el).includes(want) || lower(el.getAttribute('placeholder')).includes(want));
      }
      const chosen = pick(matches, query.pick);
      candidates = chosen ? [chosen] : [];
      break;
    }
    default:
      return false;
  }

  const shown = candidates.filter(visible);
  const target = shown.find(enabled) || (allowDisabled ? shown[0] : undefined);
  if (!target) return false;
  target.setAttribute('data-trustdeposit-handle', token);
  return true;
})
"#;

/// Expression that runs [`LOCATE_JS`] for `query`, tagging the match with `token`
pub fn locate_expression(query: &Query, token: &str, allow_disabled: bool) -> Result<String> {
    let query = serde_json::to_string(query)
        .map_err(|e| Error::Browser(format!("Failed to encode query: {}", e)))?;
    let token = serde_json::to_string(token)
        .map_err(|e| Error::Browser(format!("Failed to encode token: {}", e)))?;

    Ok(format!(
        "{}({}, {}, {})",
        LOCATE_JS.trim(),
        query,
        token,
        allow_disabled
    ))
}

/// CSS selector for an element tagged with `token`
pub fn handle_selector(token: &str) -> String {
    format!(r#"[{}="{}"]"#, HANDLE_ATTRIBUTE, token)
}

/// Expression that is true when any element matches `selector`
pub fn exists_expression(selector: &str) -> Result<String> {
    let selector = serde_json::to_string(selector)
        .map_err(|e| Error::Browser(format!("Failed to encode selector: {}", e)))?;

    Ok(format!(
        "(() => {{ try {{ return document.querySelector({}) !== null; }} catch (e) {{ return false; }} }})()",
        selector
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use trustdeposit_core::locator::Pick;

    #[test]
    fn test_expression_embeds_query_as_json() {
        let query = Query::role_exact("button", "Deposit Funds");

        let expr = locate_expression(&query, "td-1", false).unwrap();

        assert!(expr.starts_with("(function (query, token, allowDisabled)"));
        assert!(expr.ends_with(
            r#"({"kind":"role","role":"button","name":"Deposit Funds","exact":true}, "td-1", false)"#
        ));
    }

    #[test]
    fn test_disabled_candidates_need_explicit_opt_in() {
        let query = Query::text("button", "Process/Open Receipt");

        let inspect = locate_expression(&query, "td-3", true).unwrap();

        assert!(inspect.ends_with(r#""td-3", true)"#));
        assert!(
            LOCATE_JS.contains("shown.find(enabled) || (allowDisabled ? shown[0] : undefined)")
        );
        assert!(!LOCATE_JS.contains("|| shown[0];"));
    }

    #[test]
    fn test_quotes_in_selectors_are_escaped() {
        let query = Query::css(r#"input[placeholder="Two-Factor Code"]"#);

        let expr = locate_expression(&query, "td-2", false).unwrap();

        assert!(expr.contains(r#""selector":"input[placeholder=\"Two-Factor Code\"]""#));
    }

    #[test]
    fn test_pick_serialises_for_the_script() {
        let nth = serde_json::to_string(&Query::enumerate("input", None, Pick::Nth(1))).unwrap();
        let last =
            serde_json::to_string(&Query::enumerate("input", Some("deposit"), Pick::Last)).unwrap();

        assert!(nth.contains(r#""pick":{"nth":1}"#));
        assert!(last.contains(r#""contains":"deposit","pick":"last""#));
    }

    #[test]
    fn test_script_handles_every_query_kind() {
        for kind in ["'role'", "'css'", "'text'", "'attribute'", "'near_label'", "'enumerate'"] {
            assert!(LOCATE_JS.contains(&format!("case {}", kind)), "{}", kind);
        }
        assert!(LOCATE_JS.contains(HANDLE_ATTRIBUTE));
    }

    #[test]
    fn test_handle_selector() {
        assert_eq!(handle_selector("td-7"), r#"[data-trustdeposit-handle="td-7"]"#);
    }

    #[test]
    fn test_exists_expression_escapes_selector() {
        let expr = exists_expression(r#"button, [role="button"]"#).unwrap();

        assert!(expr.contains(r#"document.querySelector("button, [role=\"button\"]")"#));
    }
}
