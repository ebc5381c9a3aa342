//! Label selector matching.
//!
//! A [`Requirement`] is a single key/operator/values test, a [`Term`] ANDs
//! requirements together and a [`Selector`] ORs terms. An empty term matches
//! every label map while an empty selector matches none.

use ers_core::{LabelSelectorRequirement, NodeSelector, NodeSelectorRequirement, NodeSelectorTerm};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// The only node field that `matchFields` may reference
pub const NODE_NAME_FIELD: &str = "metadata.name";

/// Selector construction errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("unknown selector operator: {0}")]
    UnknownOperator(String),

    #[error("selector requirement has an empty key")]
    EmptyKey,

    #[error("operator {operator} on key {key}: {reason}")]
    InvalidValues {
        key: String,
        operator: Operator,
        reason: String,
    },

    #[error("operator {operator} is not supported in {context}")]
    UnsupportedOperator {
        operator: Operator,
        context: &'static str,
    },

    #[error("unsupported field selector key: {0}")]
    UnsupportedField(String),
}

/// Requirement operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
    GreaterThan,
    LessThan,
}

impl FromStr for Operator {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "In" => Ok(Self::In),
            "NotIn" => Ok(Self::NotIn),
            "Exists" => Ok(Self::Exists),
            "DoesNotExist" => Ok(Self::DoesNotExist),
            "Gt" | "GreaterThan" => Ok(Self::GreaterThan),
            "Lt" | "LessThan" => Ok(Self::LessThan),
            other => Err(SelectorError::UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::In => "In",
            Self::NotIn => "NotIn",
            Self::Exists => "Exists",
            Self::DoesNotExist => "DoesNotExist",
            Self::GreaterThan => "Gt",
            Self::LessThan => "Lt",
        };
        f.write_str(s)
    }
}

/// A validated key/operator/values test against a label map
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    In { key: String, values: Vec<String> },
    NotIn { key: String, values: Vec<String> },
    Exists { key: String },
    DoesNotExist { key: String },
    GreaterThan { key: String, bound: i64 },
    LessThan { key: String, bound: i64 },
}

impl Requirement {
    pub fn new(
        key: impl Into<String>,
        operator: Operator,
        values: Vec<String>,
    ) -> Result<Self, SelectorError> {
        let key = key.into();
        if key.is_empty() {
            return Err(SelectorError::EmptyKey);
        }

        let invalid = |key: String, reason: &str| SelectorError::InvalidValues {
            key,
            operator,
            reason: reason.to_string(),
        };

        match operator {
            Operator::In | Operator::NotIn if values.is_empty() => {
                Err(invalid(key, "at least one value is required"))
            }
            Operator::In => Ok(Self::In { key, values }),
            Operator::NotIn => Ok(Self::NotIn { key, values }),
            Operator::Exists => Ok(Self::Exists { key }),
            Operator::DoesNotExist => Ok(Self::DoesNotExist { key }),
            Operator::GreaterThan | Operator::LessThan => {
                let [value] = values.as_slice() else {
                    return Err(invalid(key, "exactly one value is required"));
                };
                let Ok(bound) = value.parse::<i64>() else {
                    return Err(invalid(key, "value must be an integer"));
                };
                if operator == Operator::GreaterThan {
                    Ok(Self::GreaterThan { key, bound })
                } else {
                    Ok(Self::LessThan { key, bound })
                }
            }
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::In { key, .. }
            | Self::NotIn { key, .. }
            | Self::Exists { key }
            | Self::DoesNotExist { key }
            | Self::GreaterThan { key, .. }
            | Self::LessThan { key, .. } => key,
        }
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        let value = labels.get(self.key());
        match self {
            Self::In { values, .. } => value.is_some_and(|v| values.contains(v)),
            // A missing key is not in any set
            Self::NotIn { values, .. } => value.is_none_or(|v| !values.contains(v)),
            Self::Exists { .. } => value.is_some(),
            Self::DoesNotExist { .. } => value.is_none(),
            Self::GreaterThan { bound, .. } => parse_label(value).is_some_and(|v| v > *bound),
            Self::LessThan { bound, .. } => parse_label(value).is_some_and(|v| v < *bound),
        }
    }
}

fn parse_label(value: Option<&String>) -> Option<i64> {
    value.and_then(|v| v.parse::<i64>().ok())
}

/// Requirements ANDed together, plus field requirements for node terms
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Term {
    requirements: Vec<Requirement>,
    field_requirements: Vec<Requirement>,
}

impl Term {
    pub fn new(requirements: Vec<Requirement>) -> Self {
        Self {
            requirements,
            field_requirements: Vec::new(),
        }
    }

    /// Add requirements evaluated against object fields instead of labels
    pub fn with_fields(mut self, field_requirements: Vec<Requirement>) -> Self {
        self.field_requirements = field_requirements;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty() && self.field_requirements.is_empty()
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.matches_with_fields(labels, &BTreeMap::new())
    }

    pub fn matches_with_fields(
        &self,
        labels: &BTreeMap<String, String>,
        fields: &BTreeMap<String, String>,
    ) -> bool {
        self.requirements.iter().all(|r| r.matches(labels))
            && self.field_requirements.iter().all(|r| r.matches(fields))
    }

    /// Build a term from a node selector term (`matchExpressions` and `matchFields`)
    pub fn from_node_selector_term(term: &NodeSelectorTerm) -> Result<Self, SelectorError> {
        let requirements = term
            .match_expressions
            .iter()
            .flatten()
            .map(node_requirement)
            .collect::<Result<Vec<_>, _>>()?;

        let field_requirements = term
            .match_fields
            .iter()
            .flatten()
            .map(|r| {
                if r.key != NODE_NAME_FIELD {
                    return Err(SelectorError::UnsupportedField(r.key.clone()));
                }
                node_requirement(r)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(requirements).with_fields(field_requirements))
    }

    /// Build a term from label selector expressions; numeric operators are rejected
    pub fn from_label_requirements(
        expressions: &[LabelSelectorRequirement],
    ) -> Result<Self, SelectorError> {
        let requirements = expressions
            .iter()
            .map(|r| {
                let operator: Operator = r.operator.parse()?;
                if matches!(operator, Operator::GreaterThan | Operator::LessThan) {
                    return Err(SelectorError::UnsupportedOperator {
                        operator,
                        context: "label selectors",
                    });
                }
                Requirement::new(&r.key, operator, r.values.clone().unwrap_or_default())
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(requirements))
    }
}

fn node_requirement(r: &NodeSelectorRequirement) -> Result<Requirement, SelectorError> {
    let operator: Operator = r.operator.parse()?;
    Requirement::new(&r.key, operator, r.values.clone().unwrap_or_default())
}

/// Terms ORed together
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    terms: Vec<Term>,
}

impl Selector {
    pub fn new(terms: Vec<Term>) -> Self {
        Self { terms }
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.terms.iter().any(|term| term.matches(labels))
    }

    pub fn matches_with_fields(
        &self,
        labels: &BTreeMap<String, String>,
        fields: &BTreeMap<String, String>,
    ) -> bool {
        self.terms
            .iter()
            .any(|term| term.matches_with_fields(labels, fields))
    }

    /// Build a selector from a node selector.
    ///
    /// Terms that fail to build are logged and left out, so they never match.
    pub fn from_node_selector(selector: &NodeSelector) -> Self {
        let terms = selector
            .node_selector_terms
            .iter()
            .filter_map(|term| match Term::from_node_selector_term(term) {
                Ok(term) => Some(term),
                Err(e) => {
                    warn!("Ignoring node selector term: {}", e);
                    None
                }
            })
            .collect();
        Self::new(terms)
    }
}

/// Whether `selector` matches `labels`
pub fn evaluate(selector: &Selector, labels: &BTreeMap<String, String>) -> bool {
    selector.matches(labels)
}

/// Whether every entry of `required` is present in `candidate` with the same value
pub fn contains_all(required: &BTreeMap<String, String>, candidate: &BTreeMap<String, String>) -> bool {
    required
        .iter()
        .all(|(key, value)| candidate.get(key) == Some(value))
}

/// Whether label selector expressions all hold for `labels`.
///
/// An expression list that cannot be built never matches.
pub fn expressions_match(
    expressions: &[LabelSelectorRequirement],
    labels: &BTreeMap<String, String>,
) -> bool {
    match Term::from_label_requirements(expressions) {
        Ok(term) => term.matches(labels),
        Err(e) => {
            warn!("Ignoring label selector expressions: {}", e);
            false
        }
    }
}
