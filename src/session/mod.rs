//! Three-step session state machine.
//!
//! ```text
//! SelectRegion  --select_region-->  SelectIncome
//! SelectIncome  --select_income-->  ViewDashboard   (request in flight)
//! ViewDashboard --failure-------->  SelectIncome    (error recorded)
//! ViewDashboard --back----------->  SelectIncome    (plan cleared)
//! SelectIncome  --back----------->  SelectRegion    (region cleared)
//! any           --reset---------->  SelectRegion    (everything cleared)
//! ```
//!
//! The machine never performs I/O. Commands that need a plan return a
//! [`Ticket`]; the caller runs the pipeline and reports back through
//! [`Session::complete`], which drops results the session has moved past.

pub mod driver;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::errors::{PlanError, TransitionError};
use crate::key::{build_key, PlanKey};
use crate::reference::{IncomeBracket, Language, Region};
use crate::wire::Plan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Step {
    SelectRegion,
    SelectIncome,
    ViewDashboard,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Step::SelectRegion => "region selection",
            Step::SelectIncome => "income selection",
            Step::ViewDashboard => "dashboard",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketKind {
    Initial,
    LanguageRefresh,
}

/// One generation the session is waiting on.
#[derive(Debug, Clone)]
pub struct Ticket {
    pub id: u64,
    pub kind: TicketKind,
    pub key: PlanKey,
    pub region: Region,
    pub bracket: IncomeBracket,
    pub language: Language,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The plan is now on display.
    Applied,
    /// Initial generation failed; the session is back on income selection.
    Failed(PlanError),
    /// Language refresh failed; the previous plan stays on display.
    Swallowed(PlanError),
    /// The session moved on before the result arrived.
    Stale,
}

#[derive(Debug, Clone)]
pub struct Completion {
    pub outcome: Outcome,
    /// Refresh to run because the language changed while this request was out.
    pub follow_up: Option<Ticket>,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    id: u64,
    abandoned: bool,
}

#[derive(Debug, Clone)]
pub struct Session {
    step: Step,
    region: Option<Region>,
    bracket: Option<IncomeBracket>,
    language: Language,
    plan: Option<Arc<Plan>>,
    error: Option<String>,
    pending: Option<Pending>,
    next_ticket: u64,
}

impl Session {
    pub fn new(language: Language) -> Self {
        Self {
            step: Step::SelectRegion,
            region: None,
            bracket: None,
            language,
            plan: None,
            error: None,
            pending: None,
            next_ticket: 1,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn region(&self) -> Option<&Region> {
        self.region.as_ref()
    }

    pub fn bracket(&self) -> Option<&IncomeBracket> {
        self.bracket.as_ref()
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn plan(&self) -> Option<&Arc<Plan>> {
        self.plan.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn in_flight(&self) -> bool {
        self.pending.is_some()
    }

    /// The plan the dashboard may show right now, if any.
    pub fn displayed_plan(&self) -> Option<&Arc<Plan>> {
        match self.step {
            Step::ViewDashboard if !self.in_flight() => self.plan.as_ref(),
            _ => None,
        }
    }

    pub fn current_key(&self) -> Option<PlanKey> {
        match (&self.region, &self.bracket) {
            (Some(r), Some(b)) => Some(build_key(r, b, &self.language)),
            _ => None,
        }
    }

    pub fn select_region(&mut self, region: Region) -> Result<(), TransitionError> {
        if self.step != Step::SelectRegion {
            return Err(TransitionError::NotAllowed { command: "select_region", step: self.step });
        }
        self.region = Some(region);
        self.error = None;
        self.step = Step::SelectIncome;
        Ok(())
    }

    /// Also the retry path after a failed generation.
    pub fn select_income(&mut self, bracket: IncomeBracket) -> Result<Ticket, TransitionError> {
        if self.in_flight() {
            return Err(TransitionError::Busy);
        }
        if self.step == Step::SelectRegion {
            return Err(TransitionError::NotAllowed { command: "select_income", step: self.step });
        }
        let region = self.region.clone().ok_or(TransitionError::MissingRegion)?;

        self.bracket = Some(bracket.clone());
        self.error = None;
        self.plan = None;
        self.step = Step::ViewDashboard;
        Ok(self.issue(TicketKind::Initial, region, bracket))
    }

    /// Always switches language; returns a refresh ticket when a settled
    /// dashboard should be regenerated.
    pub fn change_language(&mut self, language: Language) -> Option<Ticket> {
        self.language = language;
        if self.step != Step::ViewDashboard || self.plan.is_none() || self.in_flight() {
            return None;
        }
        let region = self.region.clone()?;
        let bracket = self.bracket.clone()?;
        Some(self.issue(TicketKind::LanguageRefresh, region, bracket))
    }

    pub fn back(&mut self) {
        self.error = None;
        match self.step {
            Step::SelectRegion => {}
            Step::SelectIncome => {
                self.abandon_pending();
                self.region = None;
                self.step = Step::SelectRegion;
            }
            Step::ViewDashboard => {
                self.abandon_pending();
                self.plan = None;
                self.step = Step::SelectIncome;
            }
        }
    }

    /// Back to the start; the language selection is kept.
    pub fn reset(&mut self) {
        self.abandon_pending();
        self.step = Step::SelectRegion;
        self.region = None;
        self.bracket = None;
        self.plan = None;
        self.error = None;
    }

    pub fn complete(&mut self, ticket: &Ticket, result: Result<Arc<Plan>, PlanError>) -> Completion {
        let stale = Completion { outcome: Outcome::Stale, follow_up: None };

        match self.pending {
            Some(p) if p.id == ticket.id => {
                // The request is over either way; only its result may be dropped.
                self.pending = None;
                if p.abandoned {
                    tracing::debug!(key = %ticket.key, "discarding result of abandoned request");
                    return stale;
                }
            }
            _ => {
                tracing::debug!(key = %ticket.key, ticket = ticket.id, "discarding result of unknown request");
                return stale;
            }
        }

        let current = self.current_key();
        let same_selection = current
            .as_ref()
            .is_some_and(|k| k.with_language(&ticket.language) == ticket.key);
        if self.step != Step::ViewDashboard || !same_selection {
            tracing::debug!(key = %ticket.key, "discarding result for a previous selection");
            return stale;
        }

        match (ticket.kind, result) {
            (_, Ok(plan)) => {
                self.plan = Some(plan);
                self.error = None;
                let follow_up = if current.as_ref() != Some(&ticket.key) {
                    let region = ticket.region.clone();
                    let bracket = ticket.bracket.clone();
                    Some(self.issue(TicketKind::LanguageRefresh, region, bracket))
                } else {
                    None
                };
                Completion { outcome: Outcome::Applied, follow_up }
            }
            (TicketKind::Initial, Err(e)) => {
                self.error = Some(e.to_string());
                self.plan = None;
                self.step = Step::SelectIncome;
                Completion { outcome: Outcome::Failed(e), follow_up: None }
            }
            (TicketKind::LanguageRefresh, Err(e)) => {
                tracing::warn!(key = %ticket.key, error = %e, "language refresh failed; keeping current plan");
                Completion { outcome: Outcome::Swallowed(e), follow_up: None }
            }
        }
    }

    fn issue(&mut self, kind: TicketKind, region: Region, bracket: IncomeBracket) -> Ticket {
        let id = self.next_ticket;
        self.next_ticket += 1;
        self.pending = Some(Pending { id, abandoned: false });
        Ticket {
            id,
            kind,
            key: build_key(&region, &bracket, &self.language),
            region,
            bracket,
            language: self.language.clone(),
        }
    }

    fn abandon_pending(&mut self) {
        if let Some(p) = self.pending.as_mut() {
            p.abandoned = true;
        }
    }
}
