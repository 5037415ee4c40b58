use crate::models::QueryResult;
use crate::services::executor::{Executor, PreparedRequest};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;

/// A call to a database function exposed at `rpc/<function>`.
#[derive(Clone)]
#[must_use = "an RPC does nothing until `execute` is called"]
pub struct RpcBuilder {
    executor: Arc<Executor>,
    function: String,
    params: Result<Value, String>,
    headers: Vec<(String, String)>,
}

impl RpcBuilder {
    /// `params` that serialize to `null` are sent as `{}`.
    pub(crate) fn new(executor: Arc<Executor>, function: &str, params: Result<Value, String>) -> Self {
        let params = params.map(|value| match value {
            Value::Null => Value::Object(Map::new()),
            other => other,
        });

        Self {
            executor,
            function: function.to_string(),
            params,
            headers: Vec::new(),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn endpoint(&self) -> String {
        format!("rpc/{}", self.function)
    }

    pub async fn execute(self) -> QueryResult<Value> {
        let endpoint = self.endpoint();
        let RpcBuilder {
            executor,
            function,
            params,
            headers,
        } = self;

        let params = match params {
            Ok(params) => params,
            Err(message) => {
                tracing::warn!(function = %function, error = %message, "RPC rejected before dispatch");
                return QueryResult::local_fault(message);
            }
        };

        let mut request = PreparedRequest::new(Method::POST, endpoint).with_body(params);
        request.headers = headers;

        executor.dispatch(request).await
    }

    pub async fn execute_as<T: DeserializeOwned>(self) -> QueryResult<T> {
        self.execute().await.decode()
    }
}
