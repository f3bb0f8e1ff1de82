use std::io::{self, BufRead, Write};

use serde::{Deserialize, Serialize};

/// Gate consulted before a submit-like control is clicked.
///
/// Clicking submit is irreversible, so the applier asks once, for the first
/// control whose text looks like a submission, and clicks only on approval.
pub trait SubmitPolicy {
    fn allow_submit(&self, control_text: &str) -> bool;
}

/// Click without asking.
pub struct AutoSubmit;

impl SubmitPolicy for AutoSubmit {
    fn allow_submit(&self, _control_text: &str) -> bool {
        true
    }
}

/// Never click; fill the form and stop at the submit control.
pub struct DryRun;

impl SubmitPolicy for DryRun {
    fn allow_submit(&self, _control_text: &str) -> bool {
        false
    }
}

/// Ask on the terminal. Only an explicit `y` / `yes` approves.
pub struct ConfirmOnConsole;

impl SubmitPolicy for ConfirmOnConsole {
    fn allow_submit(&self, control_text: &str) -> bool {
        print!(
            "About to click \"{}\". Submit the application? [y/N] ",
            control_text.trim()
        );
        if io::stdout().flush().is_err() {
            return false;
        }

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => is_affirmative(&answer),
            Err(_) => false,
        }
    }
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Policy selector used by the config file and CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SubmitMode {
    Auto,
    #[default]
    Confirm,
    DryRun,
}

impl SubmitMode {
    pub fn policy(self) -> Box<dyn SubmitPolicy> {
        match self {
            SubmitMode::Auto => Box::new(AutoSubmit),
            SubmitMode::Confirm => Box::new(ConfirmOnConsole),
            SubmitMode::DryRun => Box::new(DryRun),
        }
    }
}
