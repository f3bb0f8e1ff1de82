use std::collections::BTreeMap;
use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::agent::error::AgentError;
use crate::resume::resume_model::ResumeDocument;

/// Flat, read-only view of a resume: dotted keys to display strings.
///
/// Keys look like `personal_information.email`, `education.degree`,
/// `experience.position`, `project.name`, `languages`, `interests`.
/// Only the first entry of each repeated section is used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResumeProfile {
    values: BTreeMap<String, String>,
}

impl ResumeProfile {
    pub fn from_document(doc: &ResumeDocument) -> Self {
        let mut values = BTreeMap::new();

        if let Some(info) = &doc.personal_information {
            flatten_section(&mut values, "personal_information", info);
        }

        let first_entries = [
            ("education", &doc.education_details),
            ("experience", &doc.experience_details),
            ("project", &doc.projects),
        ];
        for (prefix, section) in first_entries {
            if let Some(first) = section.as_ref().and_then(|entries| entries.first()) {
                flatten_section(&mut values, prefix, first);
            }
        }

        if let Some(languages) = &doc.languages {
            let joined = languages
                .iter()
                .map(|l| l.language.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            values.insert("languages".to_string(), joined);
        }

        if let Some(interests) = &doc.interests {
            values.insert("interests".to_string(), interests.join(", "));
        }

        Self { values }
    }

    /// Read a YAML resume document from disk and flatten it.
    pub fn load(path: &Path) -> Result<Self, AgentError> {
        Ok(Self::from_document(&ResumeDocument::load(path)?))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Value worth writing into a form: present and non-empty.
    pub fn fill_value(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }

    pub fn keys(&self) -> Vec<&str> {
        self.values.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ResumeProfile {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn flatten_section(values: &mut BTreeMap<String, String>, prefix: &str, section: &Mapping) {
    for (key, value) in section {
        let (Some(key), Some(value)) = (render_scalar(key), render_scalar(value)) else {
            continue;
        };
        values.insert(format!("{}.{}", prefix, key), value);
    }
}

/// Strings, numbers and booleans render as text; nulls and nested
/// structures have no flat form.
fn render_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => render_scalar(&tagged.value),
        _ => None,
    }
}
