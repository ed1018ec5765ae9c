//! In-memory connection provider for handler and dispatcher tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use sqlbridge_core::traits::{Connection, ConnectionProvider};
use sqlbridge_core::{Database, Error, ResultSet, SqlValue};

/// A statement seen by the scripted connection.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Executed {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

pub(crate) type Journal = Arc<Mutex<Vec<Executed>>>;

/// Answers queries by substring match on the statement text; unmatched
/// queries return an empty result set.
#[derive(Clone, Default)]
pub(crate) struct ScriptedProvider {
    responses: Vec<(String, ResultSet)>,
    failure: Option<String>,
    journal: Journal,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, needle: &str, columns: &[&str], rows: Vec<Vec<SqlValue>>) -> Self {
        let columns = columns.iter().map(ToString::to_string).collect();
        self.responses
            .push((needle.to_string(), ResultSet::new(columns, rows)));
        self
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn database(self) -> (Database, Journal) {
        let journal = self.journal.clone();
        (Database::new(Arc::new(self)), journal)
    }
}

#[async_trait]
impl ConnectionProvider for ScriptedProvider {
    async fn open(&self) -> Result<Box<dyn Connection>, Error> {
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl Connection for ScriptedProvider {
    async fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<ResultSet, Error> {
        self.journal.lock().unwrap().push(Executed {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        if let Some(message) = &self.failure {
            return Err(Error::Query(message.clone()));
        }
        Ok(self
            .responses
            .iter()
            .find(|(needle, _)| sql.contains(needle.as_str()))
            .map(|(_, result)| result.clone())
            .unwrap_or_default())
    }

    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, Error> {
        self.journal.lock().unwrap().push(Executed {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
        match &self.failure {
            Some(message) => Err(Error::Query(message.clone())),
            None => Ok(2),
        }
    }

    async fn close(&mut self) -> Result<(), Error> {
        Ok(())
    }
}
