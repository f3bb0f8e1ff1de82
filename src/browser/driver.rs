use std::fmt;

use serde::{Deserialize, Serialize};

use crate::agent::error::AgentError;

/// Opaque reference to a live DOM element, issued by a `PageDriver`.
///
/// Only meaningful for the page pass that produced it: after navigation or
/// a DOM mutation the driver may reject it as stale.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementHandle(pub String);

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The browser operations the portal applier needs from a single live page.
///
/// The caller owns the page context; implementors only drive it.
pub trait PageDriver {
    fn navigate(&mut self, url: &str) -> Result<(), AgentError>;

    /// Fixed wait for asynchronous rendering to finish.
    fn settle(&mut self, ms: u64) -> Result<(), AgentError>;

    /// All elements matching a CSS selector, in document order.
    fn find_all(&mut self, selector: &str) -> Result<Vec<ElementHandle>, AgentError>;

    /// Descendants of `parent` matching a CSS selector, in document order.
    fn find_within(
        &mut self,
        parent: &ElementHandle,
        selector: &str,
    ) -> Result<Vec<ElementHandle>, AgentError>;

    /// `Ok(None)` when the attribute is absent.
    fn attribute(&mut self, element: &ElementHandle, name: &str)
    -> Result<Option<String>, AgentError>;

    /// Rendered (visible) text of the element.
    fn text(&mut self, element: &ElementHandle) -> Result<String, AgentError>;

    fn is_visible(&mut self, element: &ElementHandle) -> Result<bool, AgentError>;

    fn clear(&mut self, element: &ElementHandle) -> Result<(), AgentError>;

    fn type_text(&mut self, element: &ElementHandle, text: &str) -> Result<(), AgentError>;

    /// Select the option whose visible text equals `text` exactly.
    /// Fails, leaving the control unchanged, when no option matches.
    fn select_by_visible_text(
        &mut self,
        element: &ElementHandle,
        text: &str,
    ) -> Result<(), AgentError>;

    fn click(&mut self, element: &ElementHandle) -> Result<(), AgentError>;
}

/// Quote a value for use inside a single-quoted CSS attribute selector.
pub fn css_attr_value(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}
