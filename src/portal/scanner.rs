use tracing::{debug, warn};

use crate::agent::error::AgentError;
use crate::browser::driver::{ElementHandle, PageDriver, css_attr_value};
use crate::portal::form_model::{
    ControlBase, ControlKind, FormElementDescriptor, MAX_SELECT_OPTIONS, PageScan,
};

/// Input types that are never filled.
pub const EXCLUDED_INPUT_TYPES: [&str; 5] = ["hidden", "submit", "button", "image", "reset"];

/// Catalog the visible fillable controls of the current page.
///
/// Order is fixed: inputs, then textareas, then selects, each in document
/// order; indices are contiguous from 0. A control that cannot be inspected
/// is skipped, so this never fails.
pub fn scan_page(driver: &mut dyn PageDriver) -> PageScan {
    let mut scan = PageScan::default();

    for kind in [ControlKind::Input, ControlKind::Textarea, ControlKind::Select] {
        let elements = match driver.find_all(kind.tag()) {
            Ok(elements) => elements,
            Err(e) => {
                warn!("Could not list <{}> controls: {}", kind.tag(), e);
                continue;
            }
        };

        for element in elements {
            match describe(driver, kind, &element, scan.next_index()) {
                Ok(Some(descriptor)) => scan.push(descriptor, element),
                Ok(None) => {}
                Err(e) => warn!("Skipping <{}> {}: {}", kind.tag(), element, e),
            }
        }
    }

    debug!("Scanned {} fillable controls", scan.len());
    scan
}

/// `Ok(None)` when the control is excluded (hidden, or a non-fillable input type).
fn describe(
    driver: &mut dyn PageDriver,
    kind: ControlKind,
    element: &ElementHandle,
    index: usize,
) -> Result<Option<FormElementDescriptor>, AgentError> {
    let input_type = match kind {
        ControlKind::Input => non_empty(driver.attribute(element, "type")?),
        _ => None,
    };

    if let Some(t) = &input_type {
        if EXCLUDED_INPUT_TYPES.contains(&t.to_lowercase().as_str()) {
            return Ok(None);
        }
    }

    if !driver.is_visible(element)? {
        return Ok(None);
    }

    let id = non_empty(driver.attribute(element, "id")?);
    let base = ControlBase {
        index,
        name: non_empty(driver.attribute(element, "name")?),
        placeholder: match kind {
            ControlKind::Select => None,
            _ => non_empty(driver.attribute(element, "placeholder")?),
        },
        label: id.as_deref().and_then(|id| label_for(driver, id)),
        id,
    };

    let descriptor = match kind {
        ControlKind::Input => FormElementDescriptor::Input { base, input_type },
        ControlKind::Textarea => FormElementDescriptor::Textarea { base },
        ControlKind::Select => FormElementDescriptor::Select {
            options: option_texts(driver, element)?,
            base,
        },
    };

    Ok(Some(descriptor))
}

/// Text of the first `<label for=id>`, if any. Lookup faults count as no label.
pub fn label_for(driver: &mut dyn PageDriver, id: &str) -> Option<String> {
    let selector = format!("label[for={}]", css_attr_value(id));
    let label = driver.find_all(&selector).ok()?.into_iter().next()?;
    match driver.text(&label) {
        Ok(text) => non_empty(Some(text.trim().to_string())),
        Err(e) => {
            debug!("Label for '{}' unreadable: {}", id, e);
            None
        }
    }
}

fn option_texts(
    driver: &mut dyn PageDriver,
    select: &ElementHandle,
) -> Result<Vec<String>, AgentError> {
    let options = driver.find_within(select, "option")?;
    options
        .iter()
        .take(MAX_SELECT_OPTIONS)
        .map(|option| driver.text(option).map(|t| t.trim().to_string()))
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
