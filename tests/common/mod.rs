#![allow(dead_code)]

pub mod fake_page;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use job_assistant::agent::ai_model::{MockTextInference, TextInference};
use job_assistant::agent::error::AgentError;
use job_assistant::portal::form_model::{FieldMapping, FormElementDescriptor};
use job_assistant::portal::mapper::FieldMapper;
use job_assistant::resume::profile::ResumeProfile;

/// Lets a test keep a handle on a mock after boxing it into a component.
#[derive(Clone)]
pub struct SharedMock(pub Rc<MockTextInference>);

impl SharedMock {
    pub fn new(response: &str) -> Self {
        Self(Rc::new(MockTextInference::new(response)))
    }

    pub fn unavailable() -> Self {
        Self(Rc::new(MockTextInference::unavailable()))
    }

    pub fn boxed(&self) -> Box<dyn TextInference> {
        Box::new(self.clone())
    }
}

impl TextInference for SharedMock {
    fn infer_text(&self, prompt: &str) -> Result<String, AgentError> {
        self.0.infer_text(prompt)
    }
}

/// Field mapper with a canned answer that records what it was asked.
pub struct CannedMapper {
    pub mapping: FieldMapping,
    pub calls: Cell<usize>,
    pub seen: RefCell<Vec<Vec<FormElementDescriptor>>>,
}

impl CannedMapper {
    pub fn new<const N: usize>(pairs: [(&str, &str); N]) -> Self {
        Self {
            mapping: pairs.into_iter().collect(),
            calls: Cell::new(0),
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl FieldMapper for CannedMapper {
    fn classify(
        &self,
        descriptors: &[FormElementDescriptor],
        _known_keys: &[&str],
    ) -> FieldMapping {
        self.calls.set(self.calls.get() + 1);
        self.seen.borrow_mut().push(descriptors.to_vec());
        self.mapping.clone()
    }
}

pub fn jane_doe() -> ResumeProfile {
    [
        ("personal_information.name", "Jane Doe"),
        ("personal_information.email", "jane.doe@example.com"),
        ("personal_information.phone", "+1 555 0100"),
        ("education.degree", "BSc Computer Science"),
        ("experience.position", "Backend Engineer"),
        ("languages", "English, French"),
    ]
    .into_iter()
    .collect()
}

pub const JANE_DOE_YAML: &str = r#"personal_information:
  name: Jane
  surname: Doe
  email: jane.doe@example.com
  phone: "+1 555 0100"
  github: https://github.com/janedoe
education_details:
  - degree: BSc Computer Science
    university: University of Example
    graduation_year: 2019
  - degree: High School Diploma
    university: Example High
experience_details:
  - position: Backend Engineer
    company: Acme Corp
    key_responsibilities:
      - Built services
languages:
  - language: English
    proficiency: Native
  - language: French
    proficiency: Professional
interests:
  - Distributed systems
  - Climbing
"#;
