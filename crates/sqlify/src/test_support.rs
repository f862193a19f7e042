use crate::client::Connection;
use crate::error::{SqlifyError, SqlifyResult};
use crate::value::Value;
use std::sync::Mutex;

/// Connection double that records every call and echoes the bound values
/// back as a single row.
#[derive(Debug, Default)]
pub(crate) struct RecordingConnection {
    calls: Mutex<Vec<(String, Vec<Value>)>>,
    fail_with: Option<String>,
}

impl RecordingConnection {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_with: Some(message.to_string()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn last_call(&self) -> (String, Vec<Value>) {
        self.calls().pop().expect("no calls recorded")
    }
}

impl Connection for RecordingConnection {
    type Row = Vec<Value>;

    async fn query(&self, sql: &str, params: &[Value]) -> SqlifyResult<Vec<Vec<Value>>> {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        match &self.fail_with {
            Some(message) => Err(SqlifyError::Connection(message.clone())),
            None => Ok(vec![params.to_vec()]),
        }
    }
}
