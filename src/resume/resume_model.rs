use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;

use crate::agent::error::AgentError;

/// The nested plain-text resume kept in `plain_text_resume.yaml`.
///
/// Section contents are free-form mappings because the resume is written by
/// hand or by a model; only the section layout is fixed. Sections this type
/// does not name are kept in `other` so a load/save round trip loses nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_information: Option<Mapping>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education_details: Option<Vec<Mapping>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience_details: Option<Vec<Mapping>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<Mapping>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<Language>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interests: Option<Vec<String>>,

    #[serde(flatten)]
    pub other: Mapping,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Language {
    #[serde(default)]
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proficiency: Option<String>,
}

impl ResumeDocument {
    pub fn from_yaml(content: &str) -> Result<Self, AgentError> {
        serde_yaml::from_str(content).map_err(|e| AgentError::yaml("resume document", e))
    }

    pub fn to_yaml(&self) -> Result<String, AgentError> {
        serde_yaml::to_string(self).map_err(|e| AgentError::yaml("resume document", e))
    }

    pub fn load(path: &Path) -> Result<Self, AgentError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AgentError::io(format!("reading {}", path.display()), e))?;
        Self::from_yaml(&content)
    }
}
