use serde_json::Value;
use tracing::{debug, warn};

use crate::agent::ai_model::{TextInference, extract_fenced};
use crate::portal::form_model::{FieldMapping, FormElementDescriptor};

/// Best-effort classifier from form controls to resume profile keys.
///
/// Implementations may omit any index they are unsure about; callers must
/// treat the result as partial. A failing classifier returns an empty mapping.
pub trait FieldMapper {
    fn classify(&self, descriptors: &[FormElementDescriptor], known_keys: &[&str]) -> FieldMapping;
}

/// Field mapper backed by a language model: one prompt per page, no retries.
pub struct LlmFieldMapper {
    backend: Box<dyn TextInference>,
}

impl LlmFieldMapper {
    pub fn new(backend: Box<dyn TextInference>) -> Self {
        Self { backend }
    }
}

impl FieldMapper for LlmFieldMapper {
    fn classify(&self, descriptors: &[FormElementDescriptor], known_keys: &[&str]) -> FieldMapping {
        let prompt = build_mapping_prompt(descriptors, known_keys);

        match self.backend.infer_text(&prompt) {
            Ok(response) => parse_mapping(&response),
            Err(e) => {
                warn!("Field mapping request failed: {}", e);
                FieldMapping::new()
            }
        }
    }
}

pub fn build_mapping_prompt(descriptors: &[FormElementDescriptor], known_keys: &[&str]) -> String {
    let fields = serde_json::to_string_pretty(descriptors).unwrap_or_else(|_| "[]".to_string());
    let keys = serde_json::to_string(known_keys).unwrap_or_else(|_| "[]".to_string());

    format!(
        r#"I have a web form with these fields:
{fields}

My resume data keys are: {keys}

Return a JSON object mapping the field "index" (as a string) to the resume data key.
Example: {{"0": "personal_information.name", "2": "education.degree"}}
Only map confident matches. Respond with ONLY the JSON object, no explanation."#
    )
}

/// Parse a model answer into a mapping. Fenced answers are unwrapped first;
/// anything that is not a JSON object yields an empty mapping, and entries
/// whose value is not a string are dropped.
pub fn parse_mapping(response: &str) -> FieldMapping {
    let content = extract_fenced(response);

    let object = match serde_json::from_str::<Value>(content) {
        Ok(Value::Object(object)) => object,
        Ok(other) => {
            warn!("Field mapping is not a JSON object: {}", other);
            return FieldMapping::new();
        }
        Err(e) => {
            warn!("Field mapping is not valid JSON: {}", e);
            return FieldMapping::new();
        }
    };

    let mapping: FieldMapping = object
        .into_iter()
        .filter_map(|(index, key)| match key {
            Value::String(key) => Some((index, key)),
            other => {
                debug!("Ignoring non-string mapping for index {}: {}", index, other);
                None
            }
        })
        .collect();

    debug!("Model mapped {} fields", mapping.len());
    mapping
}
