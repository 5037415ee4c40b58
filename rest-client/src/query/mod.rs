//! PostgREST query vocabulary: filter clauses, ordering, pagination, and
//! the single-row modifiers.

pub mod builder;
pub mod rpc;

pub use builder::FilterBuilder;
pub use rpc::RpcBuilder;

use crate::models::{ErrorInfo, QueryResult};
use serde_json::Value;
use std::fmt;

/// Filter operators understood by PostgREST.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ilike,
    Is,
    In,
    Contains,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Like => "like",
            Operator::Ilike => "ilike",
            Operator::Is => "is",
            Operator::In => "in",
            Operator::Contains => "cs",
        }
    }
}

/// One `key=value` pair of the query string. The value is stored already
/// encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    key: String,
    value: String,
}

impl Clause {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// `<column>=<op>.<operand>`
    pub fn filter(column: &str, op: Operator, operand: &str) -> Self {
        Self::new(column, format!("{}.{}", op.as_str(), operand))
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Percent-encode a filter operand.
pub fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Join clauses in call order with `&`.
pub fn render_query(clauses: &[Clause]) -> String {
    clauses
        .iter()
        .map(Clause::to_string)
        .collect::<Vec<_>>()
        .join("&")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Count {
    Exact,
    Planned,
    Estimated,
}

impl Count {
    pub fn as_str(&self) -> &'static str {
        match self {
            Count::Exact => "exact",
            Count::Planned => "planned",
            Count::Estimated => "estimated",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectOptions {
    pub count: Option<Count>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderOptions {
    pub ascending: bool,
    /// `None` leaves null placement to the backend.
    pub nulls_first: Option<bool>,
}

impl Default for OrderOptions {
    fn default() -> Self {
        Self {
            ascending: true,
            nulls_first: None,
        }
    }
}

impl OrderOptions {
    pub fn ascending() -> Self {
        Self::default()
    }

    pub fn descending() -> Self {
        Self {
            ascending: false,
            ..Self::default()
        }
    }

    pub fn nulls_first(mut self, nulls_first: bool) -> Self {
        self.nulls_first = Some(nulls_first);
        self
    }

    /// `<column>.<asc|desc>[.nullsfirst|.nullslast]`
    pub(crate) fn render(&self, column: &str) -> String {
        let direction = if self.ascending { "asc" } else { "desc" };
        match self.nulls_first {
            Some(true) => format!("{}.{}.nullsfirst", column, direction),
            Some(false) => format!("{}.{}.nullslast", column, direction),
            None => format!("{}.{}", column, direction),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertOptions {
    /// Column(s) named in `on_conflict`.
    pub on_conflict: Option<String>,
    /// Keep existing rows instead of merging on conflict.
    pub ignore_duplicates: bool,
}

impl UpsertOptions {
    pub(crate) fn prefer(&self) -> &'static str {
        if self.ignore_duplicates {
            "return=representation,resolution=ignore-duplicates"
        } else {
            "return=representation,resolution=merge-duplicates"
        }
    }
}

/// How an array payload is shaped before it reaches the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowPolicy {
    Many,
    Single,
    MaybeSingle,
}

impl RowPolicy {
    /// `single` wins when both modifiers were requested.
    pub fn from_flags(single: bool, maybe_single: bool) -> Self {
        match (single, maybe_single) {
            (true, _) => RowPolicy::Single,
            (false, true) => RowPolicy::MaybeSingle,
            (false, false) => RowPolicy::Many,
        }
    }

    pub fn apply(self, result: &mut QueryResult<Value>) {
        if self == RowPolicy::Many {
            return;
        }

        let Some(Value::Array(rows)) = result.data.as_mut() else {
            return;
        };

        match rows.len() {
            1 => result.data = rows.pop(),
            0 => {
                result.data = None;
                if self == RowPolicy::Single {
                    result.error = Some(ErrorInfo::new("No rows found"));
                }
            }
            _ => {
                if self == RowPolicy::Single {
                    result.data = None;
                    result.error = Some(ErrorInfo::new("Multiple rows found"));
                }
            }
        }
    }
}
