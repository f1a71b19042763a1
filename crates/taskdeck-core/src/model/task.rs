use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::model::category::CategoryId;

/// Opaque, externally issued task identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The five lifecycle states, in board column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Deferred,
    NotStarted,
    InProgress,
    Answered,
    Done,
}

impl Status {
    /// All statuses in the fixed board order.
    pub const ALL: [Self; 5] = [
        Self::Deferred,
        Self::NotStarted,
        Self::InProgress,
        Self::Answered,
        Self::Done,
    ];

    const fn as_str(self) -> &'static str {
        match self {
            Self::Deferred => "deferred",
            Self::NotStarted => "not-started",
            Self::InProgress => "in-progress",
            Self::Answered => "answered",
            Self::Done => "done",
        }
    }
}

/// Who a task belongs to. The reviewer assignment switches which phase
/// field applies regardless of category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Assignee {
    Primary,
    Reviewer,
}

impl Assignee {
    pub const ALL: [Self; 2] = [Self::Primary, Self::Reviewer];

    const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Reviewer => "reviewer",
        }
    }
}

/// Workflow phase for data-change categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataChangePhase {
    SqlDraft,
    SqlReviewRequest,
    SqlReviewOk,
    DeployReviewRequest,
    CustomerReply,
}

impl DataChangePhase {
    pub const ALL: [Self; 5] = [
        Self::SqlDraft,
        Self::SqlReviewRequest,
        Self::SqlReviewOk,
        Self::DeployReviewRequest,
        Self::CustomerReply,
    ];

    /// The phase auto-assigned when work begins.
    #[must_use]
    pub const fn initial() -> Self {
        Self::SqlDraft
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::SqlDraft => "sql-draft",
            Self::SqlReviewRequest => "sql-review-request",
            Self::SqlReviewOk => "sql-review-ok",
            Self::DeployReviewRequest => "deploy-review-request",
            Self::CustomerReply => "customer-reply",
        }
    }
}

/// Workflow phase for inquiry categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InquiryPhase {
    Investigating,
    ReviewRequest,
    ReplyReady,
    Replied,
}

impl InquiryPhase {
    pub const ALL: [Self; 4] = [
        Self::Investigating,
        Self::ReviewRequest,
        Self::ReplyReady,
        Self::Replied,
    ];

    #[must_use]
    pub const fn initial() -> Self {
        Self::Investigating
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::Investigating => "investigating",
            Self::ReviewRequest => "review-request",
            Self::ReplyReady => "reply-ready",
            Self::Replied => "replied",
        }
    }
}

/// Workflow phase for reviewer-assigned tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReviewPhase {
    AwaitingRequest,
    Reviewable,
    Reviewing,
}

impl ReviewPhase {
    pub const ALL: [Self; 3] = [Self::AwaitingRequest, Self::Reviewable, Self::Reviewing];

    #[must_use]
    pub const fn initial() -> Self {
        Self::AwaitingRequest
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::AwaitingRequest => "awaiting-request",
            Self::Reviewable => "reviewable",
            Self::Reviewing => "reviewing",
        }
    }
}

/// A server-held task record as mirrored by the client.
///
/// A task is *running* iff `run_start` is set and `run_end` is not; at
/// most one task in the whole collection may be running at once (see
/// [`crate::running`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub status: Status,
    pub assignee: Option<Assignee>,
    pub category: Option<CategoryId>,
    pub due_date: Option<NaiveDate>,
    pub scheduled_date: Option<NaiveDate>,
    pub completion_date: Option<NaiveDate>,
    pub run_start: Option<DateTime<Utc>>,
    pub run_end: Option<DateTime<Utc>>,
    pub memo: String,
    pub url: String,
    pub priority: Option<String>,
    pub phase_data_change: Option<DataChangePhase>,
    pub phase_inquiry: Option<InquiryPhase>,
    pub phase_review: Option<ReviewPhase>,
}

impl Default for Task {
    fn default() -> Self {
        Self {
            id: TaskId::new(""),
            title: String::new(),
            status: Status::NotStarted,
            assignee: None,
            category: None,
            due_date: None,
            scheduled_date: None,
            completion_date: None,
            run_start: None,
            run_end: None,
            memo: String::new(),
            url: String::new(),
            priority: None,
            phase_data_change: None,
            phase_inquiry: None,
            phase_review: None,
        }
    }
}

impl Task {
    /// Whether this task is currently mid-execution.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.run_start.is_some() && self.run_end.is_none()
    }

    /// Drop both execution timestamps.
    pub fn clear_run(&mut self) {
        self.run_start = None;
        self.run_end = None;
    }
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Assignee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for DataChangePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for InquiryPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ReviewPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase()
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "deferred" => Ok(Self::Deferred),
            "not-started" => Ok(Self::NotStarted),
            "in-progress" => Ok(Self::InProgress),
            "answered" => Ok(Self::Answered),
            "done" => Ok(Self::Done),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Assignee {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = normalize(s);
        match normalized.as_str() {
            "primary" => Ok(Self::Primary),
            "reviewer" => Ok(Self::Reviewer),
            _ => Err(ParseEnumError {
                expected: "assignee",
                got: s.to_string(),
            }),
        }
    }
}
