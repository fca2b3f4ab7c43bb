//! Discrete negotiation domains.
//!
//! A [`Domain`] is a list of [`Issue`]s, each with a finite set of
//! [`Value`]s. An [`Outcome`] assigns exactly one value to every issue.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Issue number, unique within a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(pub u32);

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for IssueId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// A discrete value label of an issue.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Value(String);

impl Value {
    /// Creates a value from its label.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Returns the label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Value {
    fn from(label: &str) -> Self {
        Self(label.to_string())
    }
}

impl From<String> for Value {
    fn from(label: String) -> Self {
        Self(label)
    }
}

/// A negotiable attribute with a discrete set of possible values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    id: IssueId,
    name: String,
    values: Vec<Value>,
}

impl Issue {
    /// Creates a new issue.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDomain` if the value set is empty or
    /// contains duplicates.
    pub fn new<V>(
        id: u32,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Result<Self, CoreError>
    where
        V: Into<Value>,
    {
        let issue = Self {
            id: IssueId(id),
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        };
        issue.validate()?;
        Ok(issue)
    }

    fn validate(&self) -> Result<(), CoreError> {
        if self.values.is_empty() {
            return Err(CoreError::InvalidDomain(format!(
                "issue {} ({}) has no values",
                self.id, self.name
            )));
        }
        let mut seen = HashSet::with_capacity(self.values.len());
        for value in &self.values {
            if !seen.insert(value) {
                return Err(CoreError::InvalidDomain(format!(
                    "issue {} ({}) lists value '{value}' twice",
                    self.id, self.name
                )));
            }
        }
        Ok(())
    }

    /// Returns the issue number.
    #[must_use]
    pub const fn id(&self) -> IssueId {
        self.id
    }

    /// Returns the issue name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the discrete values in declaration order.
    #[must_use]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Returns true if `value` belongs to this issue.
    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        self.values.contains(value)
    }
}

/// One complete assignment of values to the issues of a domain.
///
/// Outcomes are immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Outcome {
    values: BTreeMap<IssueId, Value>,
}

impl Outcome {
    /// Creates an outcome without checking it against a domain.
    ///
    /// Offers received from a counterpart are built this way; use
    /// [`Domain::outcome`] to validate.
    #[must_use]
    pub fn new(values: BTreeMap<IssueId, Value>) -> Self {
        Self { values }
    }

    /// Returns the value assigned to `issue`, if any.
    #[must_use]
    pub fn value(&self, issue: IssueId) -> Option<&Value> {
        self.values.get(&issue)
    }

    /// Iterates over `(issue, value)` pairs in issue order.
    pub fn iter(&self) -> impl Iterator<Item = (IssueId, &Value)> {
        self.values.iter().map(|(id, value)| (*id, value))
    }

    /// Returns the number of assigned issues.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no issue is assigned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (issue, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{issue}={value}")?;
        }
        f.write_str("}")
    }
}

/// A discrete multi-issue negotiation domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Issue>", into = "Vec<Issue>")]
pub struct Domain {
    issues: Vec<Issue>,
}

impl Domain {
    /// Creates a new domain.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDomain` if there are no issues, issue
    /// numbers repeat, or an issue has an invalid value set.
    pub fn new(issues: Vec<Issue>) -> Result<Self, CoreError> {
        if issues.is_empty() {
            return Err(CoreError::InvalidDomain("domain has no issues".to_string()));
        }
        let mut seen = HashSet::with_capacity(issues.len());
        for issue in &issues {
            issue.validate()?;
            if !seen.insert(issue.id) {
                return Err(CoreError::InvalidDomain(format!(
                    "issue number {} is used twice",
                    issue.id
                )));
            }
        }
        Ok(Self { issues })
    }

    /// Parses a domain from its JSON issue list.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Serialization` on malformed JSON and
    /// `CoreError::InvalidDomain` on an invalid issue list.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let issues: Vec<Issue> =
            serde_json::from_str(json).map_err(|e| CoreError::Serialization(e.to_string()))?;
        Self::new(issues)
    }

    /// Returns the issues in declaration order.
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Looks up an issue by number.
    #[must_use]
    pub fn issue(&self, id: IssueId) -> Option<&Issue> {
        self.issues.iter().find(|issue| issue.id == id)
    }

    /// Returns the number of issues.
    #[must_use]
    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }

    /// Returns the size of the outcome space, or `None` on overflow.
    #[must_use]
    pub fn outcome_count(&self) -> Option<usize> {
        self.issues
            .iter()
            .try_fold(1usize, |acc, issue| acc.checked_mul(issue.values.len()))
    }

    /// Builds a validated outcome from `(issue, value)` pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if an issue or value is unknown or an issue is left
    /// unassigned.
    pub fn outcome<V>(&self, pairs: impl IntoIterator<Item = (u32, V)>) -> Result<Outcome, CoreError>
    where
        V: Into<Value>,
    {
        let mut values = BTreeMap::new();
        for (issue, value) in pairs {
            let id = IssueId(issue);
            let value = value.into();
            let known = self.issue(id).ok_or(CoreError::UnknownIssue(id))?;
            if !known.contains(&value) {
                return Err(CoreError::UnknownValue { issue: id, value });
            }
            values.insert(id, value);
        }
        if let Some(missing) = self.issues.iter().find(|i| !values.contains_key(&i.id)) {
            return Err(CoreError::MissingIssue(missing.id));
        }
        Ok(Outcome::new(values))
    }

    /// Enumerates every outcome of the domain.
    ///
    /// Order is lexicographic over value declaration order, with the last
    /// issue varying fastest.
    #[must_use]
    pub fn outcomes(&self) -> Vec<Outcome> {
        let mut out = Vec::with_capacity(self.outcome_count().unwrap_or(0));
        let mut cursor = vec![0usize; self.issues.len()];
        loop {
            let values = self
                .issues
                .iter()
                .zip(&cursor)
                .map(|(issue, &idx)| (issue.id, issue.values[idx].clone()))
                .collect();
            out.push(Outcome::new(values));

            // odometer step, last issue fastest
            let mut pos = self.issues.len();
            loop {
                if pos == 0 {
                    return out;
                }
                pos -= 1;
                cursor[pos] += 1;
                if cursor[pos] < self.issues[pos].values.len() {
                    break;
                }
                cursor[pos] = 0;
            }
        }
    }
}

impl TryFrom<Vec<Issue>> for Domain {
    type Error = CoreError;

    fn try_from(issues: Vec<Issue>) -> Result<Self, Self::Error> {
        Self::new(issues)
    }
}

impl From<Domain> for Vec<Issue> {
    fn from(domain: Domain) -> Self {
        domain.issues
    }
}
