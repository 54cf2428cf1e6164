//! Rendered queries and their execution helpers.

use crate::client::GenericClient;
use crate::config::ExecConfig;
use crate::error::{FragError, FragResult};
use crate::value::Param;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// A rendered SQL string with `$1, $2, ...` placeholders plus its bound parameters.
///
/// `params()[i - 1]` is the value for `$i`. Produced by
/// [`Fragment::to_query`](crate::Fragment::to_query).
#[must_use]
#[derive(Debug, Clone)]
pub struct Query {
    sql: String,
    params: Vec<Param>,
    tag: Option<String>,
    config: ExecConfig,
}

impl Query {
    pub(crate) fn new(sql: impl Into<String>, params: Vec<Param>) -> Self {
        Self {
            sql: sql.into(),
            params,
            tag: None,
            config: ExecConfig::default(),
        }
    }

    /// Associate a tag for logging.
    ///
    /// # Example
    /// ```ignore
    /// let rows = sql!("SELECT * FROM users WHERE id = " {id})
    ///     .to_query()?
    ///     .tag("users.by_id")
    ///     .fetch_all(&client)
    ///     .await?;
    /// ```
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Override the execution settings.
    pub fn with_config(mut self, config: ExecConfig) -> Self {
        self.config = config;
        self
    }

    /// Access the SQL string.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn tag_name(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(Param::as_sql).collect()
    }

    pub fn into_parts(self) -> (String, Vec<Param>) {
        (self.sql, self.params)
    }

    // ==================== Execution ====================

    /// Execute the query and return all rows.
    pub async fn fetch_all(&self, conn: &impl GenericClient) -> FragResult<Vec<Row>> {
        let params = self.params_ref();
        self.run(conn, conn.query(&self.sql, &params)).await
    }

    /// Execute the query and return the **first** row.
    ///
    /// Returns [`FragError::NotFound`] when there are no rows.
    pub async fn fetch_one(&self, conn: &impl GenericClient) -> FragResult<Row> {
        let params = self.params_ref();
        self.run(conn, conn.query_one(&self.sql, &params)).await
    }

    /// Execute the query and return the first row, if any.
    pub async fn fetch_opt(&self, conn: &impl GenericClient) -> FragResult<Option<Row>> {
        let params = self.params_ref();
        self.run(conn, conn.query_opt(&self.sql, &params)).await
    }

    /// Execute the query and return affected row count.
    pub async fn execute(&self, conn: &impl GenericClient) -> FragResult<u64> {
        let params = self.params_ref();
        self.run(conn, conn.execute(&self.sql, &params)).await
    }

    async fn run<T, F>(&self, conn: &impl GenericClient, future: F) -> FragResult<T>
    where
        F: Future<Output = FragResult<T>>,
    {
        self.log_sql();
        let started = Instant::now();

        let result = match self.config.query_timeout {
            Some(timeout) => {
                tokio::pin!(future);
                tokio::select! {
                    result = &mut future => result,
                    _ = tokio::time::sleep(timeout) => {
                        if let Some(cancel_token) = conn.cancel_token() {
                            tokio::spawn(async move {
                                let _ = cancel_token.cancel_query(tokio_postgres::NoTls).await;
                            });
                        }
                        Err(FragError::Timeout(timeout))
                    }
                }
            }
            None => future.await,
        };

        self.log_slow(started.elapsed());
        result
    }

    fn log_sql(&self) {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "sqlfrag.sql",
            tag = self.tag.as_deref().unwrap_or("-"),
            params = self.params.len(),
            sql = self.config.truncate(&self.sql),
            "executing"
        );
    }

    #[cfg(feature = "tracing")]
    fn log_slow(&self, elapsed: Duration) {
        let Some(threshold) = self.config.slow_query_threshold else {
            return;
        };
        if elapsed > threshold {
            tracing::warn!(
                target: "sqlfrag.sql",
                tag = self.tag.as_deref().unwrap_or("-"),
                elapsed_ms = elapsed.as_millis() as u64,
                threshold_ms = threshold.as_millis() as u64,
                sql = self.config.truncate(&self.sql),
                "slow query"
            );
        }
    }

    #[cfg(not(feature = "tracing"))]
    fn log_slow(&self, _elapsed: Duration) {}
}
