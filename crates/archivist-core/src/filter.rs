use crate::error::Error;
use crate::storage::models::Status;
use std::fmt;
use std::str::FromStr;

/// Comparison operator of a status filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    pub fn apply<T: Ord>(self, left: &T, right: &T) -> bool {
        match self {
            CompareOp::Eq => left == right,
            CompareOp::Ne => left != right,
            CompareOp::Lt => left < right,
            CompareOp::Le => left <= right,
            CompareOp::Gt => left > right,
            CompareOp::Ge => left >= right,
        }
    }
}

impl FromStr for CompareOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "=" | "==" => Ok(CompareOp::Eq),
            "!=" | "<>" => Ok(CompareOp::Ne),
            "<" => Ok(CompareOp::Lt),
            "<=" => Ok(CompareOp::Le),
            ">" => Ok(CompareOp::Gt),
            ">=" => Ok(CompareOp::Ge),
            other => Err(Error::InvalidFilter(format!("unknown operator '{}'", other))),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// `status <op> threshold`. Several filters combine with AND.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusFilter {
    pub op: CompareOp,
    pub threshold: Status,
}

impl StatusFilter {
    pub const fn new(op: CompareOp, threshold: Status) -> Self {
        Self { op, threshold }
    }

    /// Build a filter from a raw operator and status code, as found in
    /// request payloads.
    pub fn parse(op: &str, status_code: i64) -> Result<Self, Error> {
        let op = op.parse()?;
        let threshold = Status::from_code(status_code).ok_or_else(|| {
            Error::InvalidFilter(format!("unknown status code {}", status_code))
        })?;
        Ok(Self { op, threshold })
    }

    /// Records that finished the build pipeline.
    pub const fn completed() -> Self {
        Self::new(CompareOp::Ge, Status::Complete)
    }

    pub fn matches(&self, status: Status) -> bool {
        self.op.apply(&status, &self.threshold)
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "status {} {}", self.op, self.threshold)
    }
}

pub fn matches_all(filters: &[StatusFilter], status: Status) -> bool {
    filters.iter().all(|f| f.matches(status))
}
