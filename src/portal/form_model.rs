use std::collections::BTreeMap;

use serde::Serialize;

use crate::browser::driver::ElementHandle;

/// Options beyond this are not sent to the model.
pub const MAX_SELECT_OPTIONS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Input,
    Textarea,
    Select,
}

impl ControlKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ControlKind::Input => "input",
            ControlKind::Textarea => "textarea",
            ControlKind::Select => "select",
        }
    }
}

/// Attributes every fillable control shares.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ControlBase {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// One visible, fillable control found during a page pass.
///
/// Serializes to the flat JSON record the field-mapping prompt shows the
/// model, e.g. `{"tag":"select","index":2,"name":"degree","options":[...]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "tag", rename_all = "lowercase")]
pub enum FormElementDescriptor {
    Input {
        #[serde(flatten)]
        base: ControlBase,
        #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
        input_type: Option<String>,
    },
    Textarea {
        #[serde(flatten)]
        base: ControlBase,
    },
    Select {
        #[serde(flatten)]
        base: ControlBase,
        options: Vec<String>,
    },
}

impl FormElementDescriptor {
    pub fn base(&self) -> &ControlBase {
        match self {
            FormElementDescriptor::Input { base, .. }
            | FormElementDescriptor::Textarea { base }
            | FormElementDescriptor::Select { base, .. } => base,
        }
    }

    pub fn index(&self) -> usize {
        self.base().index
    }

    pub fn kind(&self) -> ControlKind {
        match self {
            FormElementDescriptor::Input { .. } => ControlKind::Input,
            FormElementDescriptor::Textarea { .. } => ControlKind::Textarea,
            FormElementDescriptor::Select { .. } => ControlKind::Select,
        }
    }
}

/// Result of scanning one page: descriptors and their live handles,
/// index-aligned (`handles[d.index()]` is the control `d` describes).
#[derive(Debug, Clone, Default)]
pub struct PageScan {
    pub descriptors: Vec<FormElementDescriptor>,
    pub handles: Vec<ElementHandle>,
}

impl PageScan {
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn get(&self, index: usize) -> Option<(&FormElementDescriptor, &ElementHandle)> {
        Some((self.descriptors.get(index)?, self.handles.get(index)?))
    }

    pub(crate) fn push(&mut self, descriptor: FormElementDescriptor, handle: ElementHandle) {
        self.descriptors.push(descriptor);
        self.handles.push(handle);
    }

    /// Index the next pushed control will receive.
    pub(crate) fn next_index(&self) -> usize {
        self.descriptors.len()
    }
}

/// Element index (as the model wrote it) to resume profile key.
/// Built fresh for each page and thrown away after filling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMapping(BTreeMap<String, String>);

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index: impl Into<String>, key: impl Into<String>) {
        self.0.insert(index.into(), key.into());
    }

    pub fn get(&self, index: &str) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(i, k)| (i.as_str(), k.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<I: Into<String>, K: Into<String>> FromIterator<(I, K)> for FieldMapping {
    fn from_iter<T: IntoIterator<Item = (I, K)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(i, k)| (i.into(), k.into()))
                .collect(),
        )
    }
}
