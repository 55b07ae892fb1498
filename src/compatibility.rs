//! Response shape compatibility checking
//!
//! Walks a baseline JSON value and a candidate JSON value together and stops at
//! the first place where a client of the baseline would break on the candidate.
#![allow(clippy::result_large_err)]

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use tracing::trace;

use crate::kind::{NumberPolicy, ValueKind};

/// Context label used for the top-level comparison
pub const ROOT_CONTEXT: &str = "root";

/// Why a candidate was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// Kinds differ where they must be equal
    TypeIncompatible,
    /// A baseline key is absent from the candidate
    MissingKey,
    /// Exactly one of two compared lists is empty
    EmptyListMismatch,
    /// Heterogeneous lists of different lengths
    LengthMismatch,
}

impl Reason {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Reason::TypeIncompatible => "type_incompatible",
            Reason::MissingKey => "missing_key",
            Reason::EmptyListMismatch => "empty_list_mismatch",
            Reason::LengthMismatch => "length_mismatch",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Reason::TypeIncompatible => "type incompatible",
            Reason::MissingKey => "no such key",
            Reason::EmptyListMismatch => "empty list",
            Reason::LengthMismatch => "length not equal",
        };
        f.write_str(message)
    }
}

/// The first mismatch found between a baseline and a candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{context}: {reason}")]
pub struct Incompatibility {
    pub reason: Reason,
    /// Label of the comparison: the root label or the enclosing object key
    pub context: String,
    /// JSON Pointer to where the mismatch was found (`""` is the document root).
    /// For element drift in a homogeneous list this is the candidate's index.
    pub path: String,
    /// Baseline side of the mismatch
    pub baseline: Value,
    /// Candidate side of the mismatch
    pub candidate: Value,
}

impl Incompatibility {
    fn new(
        reason: Reason,
        context: &str,
        path: impl Into<String>,
        baseline: &Value,
        candidate: &Value,
    ) -> Self {
        Self {
            reason,
            context: context.to_string(),
            path: path.into(),
            baseline: baseline.clone(),
            candidate: candidate.clone(),
        }
    }
}

/// Compatibility checker for JSON responses
#[derive(Debug, Clone)]
pub struct CompatibilityChecker {
    number_policy: NumberPolicy,
    root_context: String,
}

impl CompatibilityChecker {
    /// Create a checker with strict number kinds and the `root` label
    pub fn new() -> Self {
        Self {
            number_policy: NumberPolicy::default(),
            root_context: ROOT_CONTEXT.to_string(),
        }
    }

    /// Set how numbers are classified
    pub fn number_policy(mut self, policy: NumberPolicy) -> Self {
        self.number_policy = policy;
        self
    }

    /// Set the label reported for mismatches at the top level
    pub fn root_context(mut self, label: impl Into<String>) -> Self {
        self.root_context = label.into();
        self
    }

    /// Check `candidate` against `baseline`, starting at the root label
    pub fn check(&self, baseline: &Value, candidate: &Value) -> Result<(), Incompatibility> {
        self.check_in(&self.root_context, baseline, candidate)
    }

    /// Check `candidate` against `baseline` under an explicit context label
    pub fn check_in(
        &self,
        context: &str,
        baseline: &Value,
        candidate: &Value,
    ) -> Result<(), Incompatibility> {
        self.compare(context, "", baseline, candidate)
    }

    fn kind(&self, value: &Value) -> ValueKind {
        ValueKind::of(value, self.number_policy)
    }

    fn compare(
        &self,
        context: &str,
        path: &str,
        baseline: &Value,
        candidate: &Value,
    ) -> Result<(), Incompatibility> {
        trace!(
            context,
            path,
            baseline = %self.kind(baseline),
            candidate = %self.kind(candidate),
            "comparing"
        );

        match (baseline, candidate) {
            (Value::Object(base_map), Value::Object(cand_map)) => {
                for (key, base_value) in base_map {
                    let key_path = pointer_key(path, key);
                    match cand_map.get(key) {
                        Some(cand_value) => self.compare(key, &key_path, base_value, cand_value)?,
                        None => {
                            return Err(Incompatibility::new(
                                Reason::MissingKey,
                                key,
                                key_path,
                                baseline,
                                candidate,
                            ));
                        }
                    }
                }
                Ok(())
            }
            (Value::Array(base_items), Value::Array(cand_items)) => {
                self.compare_lists(context, path, baseline, base_items, candidate, cand_items)
            }
            (Value::Object(_), _) | (Value::Array(_), _) => Err(Incompatibility::new(
                Reason::TypeIncompatible,
                context,
                path,
                baseline,
                candidate,
            )),
            _ if self.kind(baseline) == self.kind(candidate) => Ok(()),
            _ => Err(Incompatibility::new(
                Reason::TypeIncompatible,
                context,
                path,
                baseline,
                candidate,
            )),
        }
    }

    fn compare_lists(
        &self,
        context: &str,
        path: &str,
        baseline: &Value,
        base_items: &[Value],
        candidate: &Value,
        cand_items: &[Value],
    ) -> Result<(), Incompatibility> {
        match (base_items.first(), cand_items.is_empty()) {
            (None, true) => Ok(()),
            (None, false) | (Some(_), true) => Err(Incompatibility::new(
                Reason::EmptyListMismatch,
                context,
                path,
                baseline,
                candidate,
            )),
            (Some(first), false) => {
                let element_kind = self.kind(first);
                let homogeneous = base_items.iter().all(|item| self.kind(item) == element_kind);

                if homogeneous {
                    // Every candidate element must match the first baseline element.
                    let drift = cand_items
                        .iter()
                        .enumerate()
                        .find(|(_, item)| self.kind(item) != element_kind);
                    if let Some((index, drifted)) = drift {
                        return Err(Incompatibility::new(
                            Reason::TypeIncompatible,
                            context,
                            pointer_index(path, index),
                            first,
                            drifted,
                        ));
                    }
                    if element_kind.is_scalar() {
                        return Ok(());
                    }
                } else if base_items.len() != cand_items.len() {
                    return Err(Incompatibility::new(
                        Reason::LengthMismatch,
                        context,
                        path,
                        baseline,
                        candidate,
                    ));
                }

                // zip stops at the shorter list
                for (index, (base_item, cand_item)) in base_items.iter().zip(cand_items).enumerate() {
                    self.compare(context, &pointer_index(path, index), base_item, cand_item)?;
                }
                Ok(())
            }
        }
    }
}

impl Default for CompatibilityChecker {
    fn default() -> Self {
        Self::new()
    }
}

/// Check `candidate` against `baseline` with default options under `context`
pub fn check(context: &str, baseline: &Value, candidate: &Value) -> Result<(), Incompatibility> {
    CompatibilityChecker::new().check_in(context, baseline, candidate)
}

fn pointer_key(path: &str, key: &str) -> String {
    format!("{}/{}", path, key.replace('~', "~0").replace('/', "~1"))
}

fn pointer_index(path: &str, index: usize) -> String {
    format!("{}/{}", path, index)
}
