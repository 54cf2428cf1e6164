use std::time::Duration;

/// Execution settings applied by [`Query`](crate::Query)'s fetch/execute helpers.
///
/// By default there is no timeout and no slow-query threshold, and logged SQL
/// is truncated to 200 bytes.
#[derive(Debug, Clone)]
pub struct ExecConfig {
    /// Query timeout duration. `None` means no timeout (default).
    pub query_timeout: Option<Duration>,
    /// Queries slower than this are logged at `WARN`.
    pub slow_query_threshold: Option<Duration>,
    /// Truncate logged SQL (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            query_timeout: None,
            slow_query_threshold: None,
            max_sql_length: Some(200),
        }
    }
}

impl ExecConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the query timeout duration.
    ///
    /// Queries exceeding this duration are cancelled (best effort) and return
    /// [`FragError::Timeout`](crate::FragError::Timeout).
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    /// Set the slow query threshold.
    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    /// Set maximum SQL length to log.
    pub fn with_max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation in logs.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    /// Cut `sql` to the configured length on a char boundary.
    #[cfg_attr(not(feature = "tracing"), allow(dead_code))]
    pub(crate) fn truncate<'a>(&self, sql: &'a str) -> &'a str {
        let Some(max_bytes) = self.max_sql_length else {
            return sql;
        };
        if sql.len() <= max_bytes {
            return sql;
        }
        let mut end = max_bytes;
        while end > 0 && !sql.is_char_boundary(end) {
            end -= 1;
        }
        &sql[..end]
    }
}
