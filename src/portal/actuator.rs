use tracing::{debug, info, warn};

use crate::agent::error::AgentError;
use crate::browser::driver::{ElementHandle, PageDriver};
use crate::portal::form_model::{ControlKind, FieldMapping, PageScan};
use crate::portal::submit_policy::SubmitPolicy;
use crate::resume::profile::ResumeProfile;

/// Case-insensitive substrings that mark a control as a submission.
pub const SUBMIT_KEYWORDS: [&str; 4] = ["submit", "apply", "complete application", "send"];

/// Case-insensitive substrings that mark a control as "go to the next page".
pub const NEXT_KEYWORDS: [&str; 3] = ["next", "continue", ">"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillReport {
    pub filled: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// What submit detection found on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A submit-like control was clicked.
    Submitted { control: String },
    /// A submit-like control was found but the policy refused the click.
    Held { control: String },
    NotFound,
}

// ============================================================================
// Fill phase
// ============================================================================

/// Write mapped profile values into the scanned controls.
///
/// Unknown indices, unknown keys and empty values are skipped. A control that
/// rejects its value is logged and does not stop the remaining fields.
pub fn fill_fields(
    driver: &mut dyn PageDriver,
    scan: &PageScan,
    mapping: &FieldMapping,
    profile: &ResumeProfile,
) -> FillReport {
    let mut report = FillReport::default();

    for (index, key) in mapping.iter() {
        let target = index.trim().parse::<usize>().ok().and_then(|i| scan.get(i));
        let Some((descriptor, handle)) = target else {
            debug!("Mapping index {} does not name a control", index);
            report.skipped += 1;
            continue;
        };

        let Some(value) = profile.fill_value(key) else {
            debug!("No profile value for '{}' (index {})", key, index);
            report.skipped += 1;
            continue;
        };

        match apply_value(driver, descriptor.kind(), handle, value) {
            Ok(()) => {
                debug!("Filled [{}] with '{}'", index, key);
                report.filled += 1;
            }
            Err(e) => {
                warn!("Failed to fill field {} with '{}': {}", index, key, e);
                report.failed += 1;
            }
        }
    }

    report
}

fn apply_value(
    driver: &mut dyn PageDriver,
    kind: ControlKind,
    handle: &ElementHandle,
    value: &str,
) -> Result<(), AgentError> {
    match kind {
        ControlKind::Input | ControlKind::Textarea => {
            driver.clear(handle)?;
            driver.type_text(handle, value)
        }
        ControlKind::Select => driver.select_by_visible_text(handle, value),
    }
}

// ============================================================================
// Submit detection
// ============================================================================

/// Find the first submit-like control and, if the policy allows, click it.
///
/// Candidates are `<button>` elements (by visible text) followed by
/// `input[type=submit]` elements (by `value`). Every matching control is put to
/// the policy before it is clicked: a refusal ends the search as held, and a
/// failed click moves on to the next candidate, which is asked again.
pub fn click_submit(driver: &mut dyn PageDriver, policy: &dyn SubmitPolicy) -> SubmitOutcome {
    let buttons = list_controls(driver, "button");
    let submit_inputs = list_controls(driver, "input[type='submit']");

    let candidates = buttons
        .into_iter()
        .map(|h| (h, TextSource::Text))
        .chain(submit_inputs.into_iter().map(|h| (h, TextSource::Value)));

    for (handle, source) in candidates {
        let text = match control_text(driver, &handle, source) {
            Ok(text) => text,
            Err(e) => {
                debug!("Skipping unreadable submit candidate {}: {}", handle, e);
                continue;
            }
        };

        if !contains_any(&text, &SUBMIT_KEYWORDS) {
            continue;
        }

        info!("Found submit button: {}", text.trim());
        if !policy.allow_submit(&text) {
            info!("Submission held by policy");
            return SubmitOutcome::Held {
                control: text.trim().to_string(),
            };
        }

        match driver.click(&handle) {
            Ok(()) => {
                return SubmitOutcome::Submitted {
                    control: text.trim().to_string(),
                };
            }
            Err(e) => warn!("Clicking submit control '{}' failed: {}", text.trim(), e),
        }
    }

    SubmitOutcome::NotFound
}

// ============================================================================
// Pagination
// ============================================================================

/// Click the first button or link that reads like "next" / "continue" / ">".
/// Returns the clicked control's text, or `None` when nothing could be clicked.
pub fn go_to_next_page(driver: &mut dyn PageDriver) -> Option<String> {
    let candidates = list_controls(driver, "button")
        .into_iter()
        .chain(list_controls(driver, "a"));

    for handle in candidates {
        let text = match driver.text(&handle) {
            Ok(text) => text,
            Err(e) => {
                debug!("Skipping unreadable pagination candidate {}: {}", handle, e);
                continue;
            }
        };

        if !contains_any(&text, &NEXT_KEYWORDS) {
            continue;
        }

        info!("Found next button: {}", text.trim());
        match driver.click(&handle) {
            Ok(()) => return Some(text.trim().to_string()),
            Err(e) => warn!("Clicking pagination control '{}' failed: {}", text.trim(), e),
        }
    }

    None
}

// ============================================================================
// Helpers
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum TextSource {
    Text,
    Value,
}

fn control_text(
    driver: &mut dyn PageDriver,
    handle: &ElementHandle,
    source: TextSource,
) -> Result<String, AgentError> {
    match source {
        TextSource::Text => driver.text(handle),
        TextSource::Value => Ok(driver.attribute(handle, "value")?.unwrap_or_default()),
    }
}

fn list_controls(driver: &mut dyn PageDriver, selector: &str) -> Vec<ElementHandle> {
    driver.find_all(selector).unwrap_or_else(|e| {
        warn!("Could not list '{}' controls: {}", selector, e);
        Vec::new()
    })
}

/// Case-insensitive containment of any keyword.
pub fn contains_any(text: &str, keywords: &[&str]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}
