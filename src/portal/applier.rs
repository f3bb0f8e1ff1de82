use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::agent::error::AgentError;
use crate::browser::driver::PageDriver;
use crate::portal::actuator::{
    FillReport, SubmitOutcome, click_submit, fill_fields, go_to_next_page,
};
use crate::portal::mapper::FieldMapper;
use crate::portal::scanner::scan_page;
use crate::portal::submit_policy::SubmitPolicy;
use crate::resume::profile::ResumeProfile;
use crate::trace::logger::TraceLogger;
use crate::trace::trace::TraceEvent;

pub const MAX_PAGES: usize = 5;
pub const LOAD_SETTLE_MS: u64 = 5000;
pub const PAGE_SETTLE_MS: u64 = 3000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyConfig {
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    /// Wait after the initial page load.
    #[serde(default = "default_load_settle")]
    pub load_settle_ms: u64,
    /// Wait after each pagination click.
    #[serde(default = "default_page_settle")]
    pub page_settle_ms: u64,
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            max_pages: MAX_PAGES,
            load_settle_ms: LOAD_SETTLE_MS,
            page_settle_ms: PAGE_SETTLE_MS,
        }
    }
}

fn default_max_pages() -> usize { MAX_PAGES }
fn default_load_settle() -> u64 { LOAD_SETTLE_MS }
fn default_page_settle() -> u64 { PAGE_SETTLE_MS }

/// How an apply run ended. None of these is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// A submit-like control was clicked.
    Submitted,
    /// The current page had no fillable controls.
    NoFields,
    /// No submit control and no way to the next page.
    Exhausted,
    /// Every allowed page was processed without a submission.
    PageLimit,
    /// A submit control was found but the submit policy declined it.
    Held,
}

impl fmt::Display for ApplyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ApplyOutcome::Submitted => "submitted",
            ApplyOutcome::NoFields => "no_fields",
            ApplyOutcome::Exhausted => "exhausted",
            ApplyOutcome::PageLimit => "page_limit",
            ApplyOutcome::Held => "held",
        };
        f.write_str(s)
    }
}

/// What the loop did at the end of one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageResult {
    Submitted { control: String },
    Held { control: String },
    NoFields,
    Advanced { control: String },
    Exhausted,
}

impl PageResult {
    fn decision(&self) -> &'static str {
        match self {
            PageResult::Submitted { .. } => "submitted",
            PageResult::Held { .. } => "held",
            PageResult::NoFields => "no_fields",
            PageResult::Advanced { .. } => "advanced",
            PageResult::Exhausted => "exhausted",
        }
    }

    fn control(&self) -> Option<&str> {
        match self {
            PageResult::Submitted { control }
            | PageResult::Held { control }
            | PageResult::Advanced { control } => Some(control),
            PageResult::NoFields | PageResult::Exhausted => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReport {
    /// Zero-based page counter.
    pub page: usize,
    pub descriptors: usize,
    pub mapped: usize,
    pub fill: FillReport,
    pub result: PageResult,
}

/// State of one apply run. Created by `PortalApplier::apply` and handed back
/// when the loop stops; the browser it drove stays with the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationSession {
    pub url: String,
    pub max_pages: usize,
    pub pages: Vec<PageReport>,
    pub outcome: ApplyOutcome,
}

impl ApplicationSession {
    pub fn pages_processed(&self) -> usize {
        self.pages.len()
    }

    pub fn submitted(&self) -> bool {
        self.outcome == ApplyOutcome::Submitted
    }

    pub fn total_filled(&self) -> usize {
        self.pages.iter().map(|p| p.fill.filled).sum()
    }
}

/// Drives a live page through an unknown multi-page application form:
/// scan controls, map them to resume keys, fill, look for a submit control,
/// otherwise paginate, for at most `max_pages` pages.
pub struct PortalApplier<'a> {
    driver: &'a mut dyn PageDriver,
    mapper: &'a dyn FieldMapper,
    profile: &'a ResumeProfile,
    policy: &'a dyn SubmitPolicy,
    config: ApplyConfig,
    tracer: Option<&'a TraceLogger>,
}

/// End of the per-page pass, before pagination.
enum PassEnd {
    Terminal(PageResult),
    Continue,
}

impl<'a> PortalApplier<'a> {
    pub fn new(
        driver: &'a mut dyn PageDriver,
        mapper: &'a dyn FieldMapper,
        profile: &'a ResumeProfile,
        policy: &'a dyn SubmitPolicy,
    ) -> Self {
        Self {
            driver,
            mapper,
            profile,
            policy,
            config: ApplyConfig::default(),
            tracer: None,
        }
    }

    pub fn with_config(mut self, config: ApplyConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_tracer(mut self, tracer: &'a TraceLogger) -> Self {
        self.tracer = Some(tracer);
        self
    }

    /// Navigate to `url` and run the page loop to a terminal outcome.
    ///
    /// Only a failed load (or a page that never settles) is an error.
    pub fn apply(&mut self, url: &str) -> Result<ApplicationSession, AgentError> {
        info!("Navigating to {}", url);
        self.driver.navigate(url).map_err(|e| as_navigation(url, e))?;
        self.driver
            .settle(self.config.load_settle_ms)
            .map_err(|e| as_navigation(url, e))?;

        let mut pages = Vec::new();
        let mut outcome = ApplyOutcome::PageLimit;

        for page in 0..self.config.max_pages {
            info!("Processing page {}...", page + 1);

            let scan = scan_page(&mut *self.driver);
            let known_keys = self.profile.keys();

            let (mapped, fill, end) = if scan.is_empty() {
                info!("No fillable fields found on this page.");
                (0, FillReport::default(), PassEnd::Terminal(PageResult::NoFields))
            } else {
                let mapping = self.mapper.classify(&scan.descriptors, &known_keys);
                let fill = fill_fields(&mut *self.driver, &scan, &mapping, self.profile);
                info!(
                    "Filled {} of {} controls ({} mapped)",
                    fill.filled,
                    scan.len(),
                    mapping.len()
                );

                let end = match click_submit(&mut *self.driver, self.policy) {
                    SubmitOutcome::Submitted { control } => {
                        PassEnd::Terminal(PageResult::Submitted { control })
                    }
                    SubmitOutcome::Held { control } => {
                        PassEnd::Terminal(PageResult::Held { control })
                    }
                    SubmitOutcome::NotFound => PassEnd::Continue,
                };
                (mapping.len(), fill, end)
            };

            let result = match end {
                PassEnd::Terminal(result) => result,
                PassEnd::Continue => match go_to_next_page(&mut *self.driver) {
                    Some(control) => PageResult::Advanced { control },
                    None => PageResult::Exhausted,
                },
            };

            self.trace(page, url, scan.len(), mapped, &fill, &result);

            let terminal = match &result {
                PageResult::Submitted { .. } => Some(ApplyOutcome::Submitted),
                PageResult::Held { .. } => Some(ApplyOutcome::Held),
                PageResult::NoFields => Some(ApplyOutcome::NoFields),
                PageResult::Exhausted => Some(ApplyOutcome::Exhausted),
                PageResult::Advanced { .. } => None,
            };

            pages.push(PageReport {
                page,
                descriptors: scan.len(),
                mapped,
                fill,
                result,
            });

            if let Some(terminal) = terminal {
                outcome = terminal;
                break;
            }

            self.driver
                .settle(self.config.page_settle_ms)
                .map_err(|e| as_navigation(url, e))?;
        }

        match outcome {
            ApplyOutcome::Submitted => info!("Application seemingly submitted or finished."),
            ApplyOutcome::Exhausted => info!("No next page found. Stopping."),
            ApplyOutcome::PageLimit => warn!(
                "Reached the {}-page limit without finding a submit control.",
                self.config.max_pages
            ),
            ApplyOutcome::Held => info!("Form filled; submission left to the user."),
            ApplyOutcome::NoFields => {}
        }

        if let Some(tracer) = self.tracer {
            if outcome == ApplyOutcome::PageLimit {
                tracer.log(
                    &TraceEvent::now(pages.len())
                        .with_url(url)
                        .with_decision(ApplyOutcome::PageLimit),
                );
            }
        }

        Ok(ApplicationSession {
            url: url.to_string(),
            max_pages: self.config.max_pages,
            pages,
            outcome,
        })
    }

    fn trace(
        &self,
        page: usize,
        url: &str,
        descriptors: usize,
        mapped: usize,
        fill: &FillReport,
        result: &PageResult,
    ) {
        let Some(tracer) = self.tracer else {
            return;
        };
        let mut event = TraceEvent::now(page)
            .with_url(url)
            .with_counts(descriptors, mapped, fill.filled, fill.failed)
            .with_decision(result.decision());
        if let Some(control) = result.control() {
            event = event.with_control(control);
        }
        tracer.log(&event);
    }
}

fn as_navigation(url: &str, error: AgentError) -> AgentError {
    match error {
        AgentError::Navigation { .. } => error,
        other => AgentError::Navigation {
            url: url.to_string(),
            reason: other.to_string(),
        },
    }
}
