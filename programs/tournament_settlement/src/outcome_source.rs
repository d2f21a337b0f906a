//! Read-only view of the parent tournament registry that publishes the
//! outcome catalog and results, plus an in-memory registry for development
//! and tests.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::state::{OutcomeId, Selection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutcomeShape {
    /// Pick one option.
    Single,
    /// Ordered top-N pick.
    Ranked { slots: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("selection shape does not match the outcome")]
    ShapeMismatch,

    #[error("option {0} out of range")]
    OutOfRange(u32),

    #[error("expected {expected} ranked options, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("option {0} selected twice")]
    Duplicate(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub id: OutcomeId,
    pub description: String,
    pub start_time: i64,
    pub options: Vec<String>,
    pub shape: OutcomeShape,
    /// Per-slot point values for ranked outcomes.
    #[serde(default)]
    pub point_values: Vec<u64>,
    #[serde(default)]
    pub result: Option<Selection>,
}

impl Outcome {
    pub fn single(id: OutcomeId, description: &str, start_time: i64, options: &[&str]) -> Self {
        Self {
            id,
            description: description.to_string(),
            start_time,
            options: options.iter().map(|o| o.to_string()).collect(),
            shape: OutcomeShape::Single,
            point_values: Vec::new(),
            result: None,
        }
    }

    pub fn ranked(
        id: OutcomeId,
        description: &str,
        start_time: i64,
        options: &[&str],
        point_values: &[u64],
    ) -> Self {
        Self {
            id,
            description: description.to_string(),
            start_time,
            options: options.iter().map(|o| o.to_string()).collect(),
            shape: OutcomeShape::Ranked {
                slots: point_values.len(),
            },
            point_values: point_values.to_vec(),
            result: None,
        }
    }

    pub fn results_finalized(&self) -> bool {
        self.result.is_some()
    }

    /// Checks a prediction or result against this outcome's shape and options.
    pub fn check_selection(&self, selection: &Selection) -> Result<(), SelectionError> {
        let in_range = |option: u32| {
            if (option as usize) < self.options.len() {
                Ok(())
            } else {
                Err(SelectionError::OutOfRange(option))
            }
        };

        match (self.shape, selection) {
            (OutcomeShape::Single, Selection::Single(option)) => in_range(*option),
            (OutcomeShape::Ranked { slots }, Selection::Ranked(options)) => {
                if options.len() != slots {
                    return Err(SelectionError::WrongLength {
                        expected: slots,
                        actual: options.len(),
                    });
                }
                let mut seen = BTreeSet::new();
                for option in options {
                    in_range(*option)?;
                    if !seen.insert(*option) {
                        return Err(SelectionError::Duplicate(*option));
                    }
                }
                Ok(())
            }
            _ => Err(SelectionError::ShapeMismatch),
        }
    }
}

/// Interface consumed from the outcome registry.
pub trait OutcomeSource {
    fn start_time(&self) -> i64;

    fn end_time(&self) -> i64;

    fn outcome(&self, id: OutcomeId) -> Option<&Outcome>;

    /// Open while `now < start - closing_window` and no result is published.
    fn is_betting_window_open(&self, id: OutcomeId, closing_window_secs: i64, now: i64) -> bool {
        match self.outcome(id) {
            Some(outcome) => {
                !outcome.results_finalized()
                    && now < outcome.start_time.saturating_sub(closing_window_secs)
            }
            None => false,
        }
    }

    fn options(&self, id: OutcomeId) -> Option<&[String]> {
        self.outcome(id).map(|o| o.options.as_slice())
    }

    fn options_len(&self, id: OutcomeId) -> Option<usize> {
        self.outcome(id).map(|o| o.options.len())
    }

    fn results(&self, id: OutcomeId) -> Option<&Selection> {
        self.outcome(id).and_then(|o| o.result.as_ref())
    }

    fn point_values(&self, id: OutcomeId) -> Option<&[u64]> {
        self.outcome(id).map(|o| o.point_values.as_slice())
    }

    fn is_closed(&self, now: i64) -> bool {
        now >= self.end_time()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Outcome {0} already exists")]
    DuplicateOutcome(OutcomeId),

    #[error("Unknown outcome {0}")]
    UnknownOutcome(OutcomeId),

    #[error("Result already published for outcome {0}")]
    AlreadyPublished(OutcomeId),

    #[error("Invalid result: {0}")]
    InvalidResult(#[from] SelectionError),
}

/// In-memory outcome registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCatalog {
    pub start_time: i64,
    pub end_time: i64,
    outcomes: Vec<Outcome>,
}

impl OutcomeCatalog {
    pub fn new(start_time: i64, end_time: i64) -> Self {
        Self {
            start_time,
            end_time,
            outcomes: Vec::new(),
        }
    }

    pub fn with_outcome(mut self, outcome: Outcome) -> Result<Self, CatalogError> {
        self.add_outcome(outcome)?;
        Ok(self)
    }

    pub fn add_outcome(&mut self, outcome: Outcome) -> Result<(), CatalogError> {
        if self.outcome(outcome.id).is_some() {
            return Err(CatalogError::DuplicateOutcome(outcome.id));
        }
        self.outcomes.push(outcome);
        Ok(())
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn publish_result(&mut self, id: OutcomeId, result: Selection) -> Result<(), CatalogError> {
        let outcome = self
            .outcomes
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(CatalogError::UnknownOutcome(id))?;
        if outcome.results_finalized() {
            return Err(CatalogError::AlreadyPublished(id));
        }
        outcome.check_selection(&result)?;
        outcome.result = Some(result);
        Ok(())
    }
}

impl OutcomeSource for OutcomeCatalog {
    fn start_time(&self) -> i64 {
        self.start_time
    }

    fn end_time(&self) -> i64 {
        self.end_time
    }

    fn outcome(&self, id: OutcomeId) -> Option<&Outcome> {
        self.outcomes.iter().find(|o| o.id == id)
    }
}
