use super::{
    Clause, Count, Operator, OrderOptions, RowPolicy, SelectOptions, UpsertOptions, encode,
};
use crate::models::QueryResult;
use crate::services::executor::{Executor, PREFER_HEADER, PreparedRequest, RETURN_REPRESENTATION};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt::Display;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub(crate) enum Operation {
    Select,
    Insert { body: Value },
    Upsert { body: Value, options: UpsertOptions },
    Update { body: Value },
    Delete,
}

/// A table query under construction.
///
/// Every method consumes the builder and returns it with one more clause, so
/// two queries never share state; clone a builder to fork a base query.
/// Nothing is sent until [`FilterBuilder::execute`].
#[derive(Clone)]
#[must_use = "a query does nothing until `execute` is called"]
pub struct FilterBuilder {
    executor: Arc<Executor>,
    table: String,
    operation: Operation,
    clauses: Vec<Clause>,
    route_id: Option<String>,
    single: bool,
    maybe_single: bool,
    headers: Vec<(String, String)>,
    fault: Option<String>,
}

impl FilterBuilder {
    pub(crate) fn new(executor: Arc<Executor>, table: &str, operation: Operation) -> Self {
        Self {
            executor,
            table: table.to_string(),
            operation,
            clauses: Vec::new(),
            route_id: None,
            single: false,
            maybe_single: false,
            headers: Vec::new(),
            fault: None,
        }
    }

    /// Builder that fails locally with `message` when executed.
    pub(crate) fn rejected(executor: Arc<Executor>, table: &str, message: String) -> Self {
        Self {
            fault: Some(message),
            ..Self::new(executor, table, Operation::Select)
        }
    }

    fn push(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    fn filter(self, column: &str, op: Operator, value: impl Display) -> Self {
        let operand = encode(&value.to_string());
        self.push(Clause::filter(column, op, &operand))
    }

    /// Comma-joined column list; `""` and `"*"` add nothing.
    pub fn select(self, columns: &str) -> Self {
        self.select_with(columns, SelectOptions::default())
    }

    pub fn select_with(self, columns: &str, options: SelectOptions) -> Self {
        let mut builder = self;
        if !columns.is_empty() && columns != "*" {
            builder = builder.push(Clause::new("select", columns));
        }
        if let Some(count) = options.count {
            builder = builder.count(count);
        }
        builder
    }

    fn count(self, count: Count) -> Self {
        self.push(Clause::new("count", count.as_str()))
    }

    /// On an update, `eq("id", ..)` addresses the row as `<table>/<id>`
    /// instead of adding a filter.
    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        if column == "id" && matches!(self.operation, Operation::Update { .. }) {
            self.route_id = Some(value.to_string());
            return self;
        }
        self.filter(column, Operator::Eq, value)
    }

    pub fn neq(self, column: &str, value: impl Display) -> Self {
        self.filter(column, Operator::Neq, value)
    }

    pub fn gt(self, column: &str, value: impl Display) -> Self {
        self.filter(column, Operator::Gt, value)
    }

    pub fn gte(self, column: &str, value: impl Display) -> Self {
        self.filter(column, Operator::Gte, value)
    }

    pub fn lt(self, column: &str, value: impl Display) -> Self {
        self.filter(column, Operator::Lt, value)
    }

    pub fn lte(self, column: &str, value: impl Display) -> Self {
        self.filter(column, Operator::Lte, value)
    }

    /// `pattern` uses PostgREST wildcard syntax and is encoded as given.
    pub fn like(self, column: &str, pattern: &str) -> Self {
        self.filter(column, Operator::Like, pattern)
    }

    pub fn ilike(self, column: &str, pattern: &str) -> Self {
        self.filter(column, Operator::Ilike, pattern)
    }

    /// `None` matches SQL `NULL`.
    pub fn is(self, column: &str, value: Option<bool>) -> Self {
        let operand = match value {
            None => "null",
            Some(true) => "true",
            Some(false) => "false",
        };
        self.push(Clause::filter(column, Operator::Is, operand))
    }

    pub fn in_<I>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Display,
    {
        let list = values
            .into_iter()
            .map(|v| encode(&v.to_string()))
            .collect::<Vec<_>>()
            .join(",");
        self.push(Clause::filter(column, Operator::In, &format!("({})", list)))
    }

    /// The JSON form of `value` must be contained in the column.
    pub fn contains(self, column: &str, value: impl Into<Value>) -> Self {
        let json = value.into().to_string();
        self.filter(column, Operator::Contains, json)
    }

    pub fn order(self, column: &str, options: OrderOptions) -> Self {
        self.push(Clause::new("order", options.render(column)))
    }

    pub fn limit(self, count: u64) -> Self {
        self.push(Clause::new("limit", count.to_string()))
    }

    /// Inclusive row range. A reversed range selects nothing.
    pub fn range(self, from: u64, to: u64) -> Self {
        let count = to.saturating_add(1).saturating_sub(from);
        self.push(Clause::new("offset", from.to_string()))
            .push(Clause::new("limit", count.to_string()))
    }

    /// Expect exactly one row; zero or several become an error.
    pub fn single(mut self) -> Self {
        self.single = true;
        self
    }

    /// Expect at most one row; zero yields `data: None` without an error.
    pub fn maybe_single(mut self) -> Self {
        self.maybe_single = true;
        self
    }

    /// Set a header for this call only, overriding any default.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn method(&self) -> Method {
        match self.operation {
            Operation::Select => Method::GET,
            Operation::Insert { .. } | Operation::Upsert { .. } => Method::POST,
            Operation::Update { .. } => Method::PATCH,
            Operation::Delete => Method::DELETE,
        }
    }

    /// Path and query string this builder will request.
    pub fn endpoint(&self) -> String {
        let mut path = self.table.clone();
        if let Some(id) = &self.route_id {
            path.push('/');
            path.push_str(&encode(id));
        }

        let mut params = Vec::with_capacity(self.clauses.len() + 1);
        if let Operation::Upsert { options, .. } = &self.operation
            && let Some(column) = &options.on_conflict
        {
            params.push(format!("on_conflict={}", column));
        }
        params.extend(self.clauses.iter().map(Clause::to_string));

        if params.is_empty() {
            path
        } else {
            format!("{}?{}", path, params.join("&"))
        }
    }

    fn prepare(&self) -> PreparedRequest {
        let mut request = PreparedRequest::new(self.method(), self.endpoint());

        match &self.operation {
            Operation::Select => {}
            Operation::Insert { body } | Operation::Update { body } => {
                request = request
                    .with_body(body.clone())
                    .with_header(PREFER_HEADER, RETURN_REPRESENTATION);
            }
            Operation::Upsert { body, options } => {
                request = request
                    .with_body(body.clone())
                    .with_header(PREFER_HEADER, options.prefer());
            }
            Operation::Delete => {
                request = request.with_header(PREFER_HEADER, RETURN_REPRESENTATION);
            }
        }

        request.headers.extend(self.headers.iter().cloned());
        request
    }

    /// Issue the request and shape the rows per `single`/`maybe_single`.
    pub async fn execute(self) -> QueryResult<Value> {
        if let Some(message) = &self.fault {
            tracing::warn!(table = %self.table, error = %message, "Query rejected before dispatch");
            return QueryResult::local_fault(message.clone());
        }

        let request = self.prepare();
        let mut result = self.executor.dispatch(request).await;
        RowPolicy::from_flags(self.single, self.maybe_single).apply(&mut result);
        result
    }

    /// [`execute`](Self::execute), then decode `data` into `T`.
    pub async fn execute_as<T: DeserializeOwned>(self) -> QueryResult<T> {
        self.execute().await.decode()
    }
}
