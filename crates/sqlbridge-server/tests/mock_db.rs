use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use sqlbridge_core::error::Error;
use sqlbridge_core::traits::{Connection, ConnectionProvider};
use sqlbridge_core::types::{ResultSet, SqlValue};

/// In-memory SQL Server stand-in. Statements are matched by substring against
/// canned result sets; everything it sees is recorded.
#[derive(Clone, Default)]
pub struct MockDatabase {
    canned: Arc<RwLock<Vec<(String, ResultSet)>>>,
    statements: Arc<RwLock<Vec<(String, Vec<SqlValue>)>>>,
    down: bool,
}

impl MockDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// A database that refuses every connection.
    pub fn unreachable() -> Self {
        Self {
            down: true,
            ..Self::default()
        }
    }

    /// A small sales catalog: two tables and server metadata.
    pub fn sales() -> Self {
        let db = Self::new();
        db.answer("@@VERSION", &["version"], vec![vec!["Microsoft SQL Server 2022".into()]]);
        db.answer("DB_NAME()", &["database_name"], vec![vec!["sales".into()]]);
        db.answer("@@SERVERNAME", &["server_name"], vec![vec!["sql01".into()]]);
        db.answer(
            "INFORMATION_SCHEMA.TABLES",
            &["TABLE_NAME"],
            vec![vec!["Customers".into()], vec!["Orders".into()]],
        );
        db.answer(
            "INFORMATION_SCHEMA.COLUMNS",
            &[
                "COLUMN_NAME",
                "DATA_TYPE",
                "IS_NULLABLE",
                "COLUMN_DEFAULT",
                "CHARACTER_MAXIMUM_LENGTH",
            ],
            vec![
                vec!["id".into(), "int".into(), "NO".into(), SqlValue::Null, SqlValue::Null],
                vec![
                    "name".into(),
                    "nvarchar".into(),
                    "YES".into(),
                    SqlValue::Null,
                    SqlValue::Int(100),
                ],
            ],
        );
        db.answer(
            "FROM Customers",
            &["id", "name", "logo"],
            vec![
                vec![SqlValue::Int(1), "Ada".into(), SqlValue::Bytes(vec![0xff, 0xfe, 0x00, 0x01])],
                vec![SqlValue::Int(2), "Grace".into(), SqlValue::Null],
            ],
        );
        db
    }

    pub fn answer(&self, needle: &str, columns: &[&str], rows: Vec<Vec<SqlValue>>) {
        let columns = columns.iter().map(ToString::to_string).collect();
        self.canned
            .write()
            .unwrap()
            .push((needle.to_string(), ResultSet::new(columns, rows)));
    }

    /// Statement text seen so far, in order.
    pub fn statements(&self) -> Vec<String> {
        self.statements
            .read()
            .unwrap()
            .iter()
            .map(|(sql, _)| sql.clone())
            .collect()
    }

    pub fn params(&self, index: usize) -> Vec<SqlValue> {
        self.statements.read().unwrap()[index].1.clone()
    }

    fn record(&self, sql: &str, params: &[SqlValue]) {
        self.statements
            .write()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
    }
}

#[async_trait]
impl ConnectionProvider for MockDatabase {
    async fn open(&self) -> Result<Box<dyn Connection>, Error> {
        if self.down {
            return Err(Error::Connection("Login timeout expired".to_string()));
        }
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl Connection for MockDatabase {
    async fn query(&mut self, sql: &str, params: &[SqlValue]) -> Result<ResultSet, Error> {
        self.record(sql, params);
        if sql.contains("missing_table") {
            return Err(Error::Query("Invalid object name 'missing_table'.".to_string()));
        }
        let canned = self.canned.read().unwrap();
        Ok(canned
            .iter()
            .find(|(needle, _)| sql.contains(needle.as_str()))
            .map(|(_, result)| result.clone())
            .unwrap_or_default())
    }

    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, Error> {
        self.record(sql, params);
        Ok(3)
    }

    async fn close(&mut self) -> Result<(), Error> {
        Ok(())
    }
}
