use crate::config::ApiSettings;
use crate::query::builder::Operation;
use crate::query::{FilterBuilder, RpcBuilder, SelectOptions, UpsertOptions};
use crate::services::{AuthClient, Executor, SessionStore};
use client_core::ClientResult;
use serde::Serialize;
use std::sync::Arc;

/// Entry point: table handles, RPC calls, and auth, all sharing one HTTP
/// client and one session store.
#[derive(Clone)]
pub struct RestClient {
    executor: Arc<Executor>,
    auth: AuthClient,
}

impl RestClient {
    pub fn new(settings: &ApiSettings, store: Arc<dyn SessionStore>) -> ClientResult<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self::with_http_client(http, settings, store))
    }

    pub fn with_http_client(
        http: reqwest::Client,
        settings: &ApiSettings,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let executor = Arc::new(Executor::new(
            http,
            settings.base_url(),
            settings.anon_key.clone(),
            store,
        ));

        Self {
            auth: AuthClient::new(executor.clone()),
            executor,
        }
    }

    /// A fresh handle on `table`. Each builder it hands out starts empty.
    pub fn from(&self, table: &str) -> TableHandle {
        TableHandle {
            executor: self.executor.clone(),
            table: table.to_string(),
        }
    }

    /// Call `rpc/<function>` with `params` as the JSON body.
    pub fn rpc<P: Serialize + ?Sized>(&self, function: &str, params: &P) -> RpcBuilder {
        let params = serde_json::to_value(params).map_err(|e| e.to_string());
        RpcBuilder::new(self.executor.clone(), function, params)
    }

    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    pub fn session_store(&self) -> &Arc<dyn SessionStore> {
        self.executor.session_store()
    }
}

pub struct TableHandle {
    executor: Arc<Executor>,
    table: String,
}

impl TableHandle {
    pub fn name(&self) -> &str {
        &self.table
    }

    fn builder(&self, operation: Operation) -> FilterBuilder {
        FilterBuilder::new(self.executor.clone(), &self.table, operation)
    }

    fn with_body<T: Serialize + ?Sized>(
        &self,
        body: &T,
        operation: impl FnOnce(serde_json::Value) -> Operation,
    ) -> FilterBuilder {
        match serde_json::to_value(body) {
            Ok(body) => self.builder(operation(body)),
            Err(e) => FilterBuilder::rejected(
                self.executor.clone(),
                &self.table,
                format!("Failed to serialize request body: {}", e),
            ),
        }
    }

    pub fn select(&self, columns: &str) -> FilterBuilder {
        self.builder(Operation::Select).select(columns)
    }

    pub fn select_with(&self, columns: &str, options: SelectOptions) -> FilterBuilder {
        self.builder(Operation::Select).select_with(columns, options)
    }

    /// Insert one row (an object) or many (an array).
    pub fn insert<T: Serialize + ?Sized>(&self, rows: &T) -> FilterBuilder {
        self.with_body(rows, |body| Operation::Insert { body })
    }

    pub fn upsert<T: Serialize + ?Sized>(&self, rows: &T, options: UpsertOptions) -> FilterBuilder {
        self.with_body(rows, |body| Operation::Upsert { body, options })
    }

    pub fn update<T: Serialize + ?Sized>(&self, changes: &T) -> FilterBuilder {
        self.with_body(changes, |body| Operation::Update { body })
    }

    pub fn delete(&self) -> FilterBuilder {
        self.builder(Operation::Delete)
    }
}
