//! Tools backed by the SQL Server database.
//!
//! Every tool converts database failures into a `{success: false, ...}`
//! result; only argument problems escape as `Err`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};

use sqlbridge_core::{
    authorize_write, classify_and_rewrite, Database, Error, QueryPolicy, Row, SqlValue,
};

use crate::error::{HandlerError, RegistryError};
use crate::result::ToolResult;
use crate::tools::{parse_arguments, ToolHandler, ToolRegistry};

/// Row limit applied by `query_database` when the caller gives none.
pub const DEFAULT_QUERY_LIMIT: u32 = 100;

const TABLES_SQL: &str = r"
    SELECT TABLE_NAME
    FROM INFORMATION_SCHEMA.TABLES
    WHERE TABLE_TYPE = 'BASE TABLE'
    ORDER BY TABLE_NAME
";

const COLUMNS_SQL: &str = r"
    SELECT
        COLUMN_NAME,
        DATA_TYPE,
        IS_NULLABLE,
        COLUMN_DEFAULT,
        CHARACTER_MAXIMUM_LENGTH
    FROM INFORMATION_SCHEMA.COLUMNS
    WHERE TABLE_NAME = ?
    ORDER BY ORDINAL_POSITION
";

const VERSION_SQL: &str = "SELECT @@VERSION as version";
const DATABASE_NAME_SQL: &str = "SELECT DB_NAME() as database_name";
const SERVER_NAME_SQL: &str = "SELECT @@SERVERNAME as server_name";

const UNKNOWN: &str = "Unknown";

/// Build the registry of database tools. `execute_non_query` is only
/// registered when the policy enables write operations.
///
/// # Errors
///
/// Returns an error if two tools share a name.
pub fn database_registry(
    db: &Database,
    policy: QueryPolicy,
) -> Result<ToolRegistry, RegistryError> {
    let registry = ToolRegistry::new()
        .register(QueryDatabase::new(db.clone(), policy.max_rows))?
        .register(ListTables::new(db.clone()))?
        .register(DescribeTable::new(db.clone()))?
        .register(GetDatabaseInfo::new(db.clone()))?
        .register(ExecuteStoredProcedure::new(db.clone()))?;

    if policy.write_operations {
        registry.register(ExecuteNonQuery::new(db.clone()))
    } else {
        Ok(registry)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoArgs {}

// --- query_database ---

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct QueryArgs {
    query: String,
    #[serde(default = "default_limit")]
    limit: Option<f64>,
}

#[allow(clippy::unnecessary_wraps)]
fn default_limit() -> Option<f64> {
    Some(f64::from(DEFAULT_QUERY_LIMIT))
}

/// Turn the caller's `limit` into a row count. Fractions are truncated and
/// values past `u32::MAX` saturate; the gate caps the result at `max_rows`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn requested_limit(limit: Option<f64>) -> Result<Option<u32>, HandlerError> {
    match limit {
        None => Ok(None),
        Some(n) if n.is_nan() || n < 0.0 => Err(HandlerError::InvalidArguments {
            tool: QueryDatabase::NAME,
            message: format!("limit must be a non-negative number, got {n}"),
        }),
        Some(n) => Ok(Some(n.trunc().min(f64::from(u32::MAX)) as u32)),
    }
}

/// Run a caller-supplied SELECT through the query gate.
pub struct QueryDatabase {
    db: Database,
    max_rows: u32,
}

impl QueryDatabase {
    pub const NAME: &'static str = "query_database";

    #[must_use]
    pub fn new(db: Database, max_rows: u32) -> Self {
        Self { db, max_rows }
    }
}

#[async_trait]
impl ToolHandler for QueryDatabase {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Execute a SQL query against the database."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "SQL SELECT query to execute"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum rows to return",
                    "default": DEFAULT_QUERY_LIMIT
                }
            },
            "required": ["query"]
        })
    }

    async fn invoke(&self, arguments: Value) -> Result<ToolResult, HandlerError> {
        let args: QueryArgs = parse_arguments(Self::NAME, arguments)?;
        let limit = requested_limit(args.limit)?;

        let query = match classify_and_rewrite(&args.query, limit, self.max_rows, false) {
            Ok(query) => query,
            Err(e) => {
                tracing::warn!("Rejected query: {e}");
                return Ok(ToolResult::rejected(e, &args.query));
            }
        };

        let result = match self.db.fetch(&query, &[]).await {
            Ok(rows) => {
                let row_count = rows.len();
                ToolResult::success()
                    .field("results", rows)
                    .field("row_count", row_count)
                    .field("query", query)
                    .finish()
            }
            Err(e) => failure(Self::NAME, &e).field("query", query).finish(),
        };
        Ok(result)
    }
}

// --- list_tables ---

/// List the base tables of the current database.
pub struct ListTables {
    db: Database,
}

impl ListTables {
    pub const NAME: &'static str = "list_tables";

    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn run(&self) -> Result<ToolResult, Error> {
        let rows = self.db.fetch(TABLES_SQL, &[]).await?;
        let tables = table_names(&rows);
        let table_count = tables.len();
        Ok(ToolResult::success()
            .field("tables", tables)
            .field("table_count", table_count)
            .finish())
    }
}

#[async_trait]
impl ToolHandler for ListTables {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Get a list of all tables in the database."
    }

    fn input_schema(&self) -> Value {
        empty_schema()
    }

    async fn invoke(&self, arguments: Value) -> Result<ToolResult, HandlerError> {
        let NoArgs {} = parse_arguments(Self::NAME, arguments)?;
        Ok(self
            .run()
            .await
            .unwrap_or_else(|e| failure(Self::NAME, &e).finish()))
    }
}

// --- describe_table ---

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DescribeArgs {
    table_name: String,
}

/// Column metadata for one table. Unknown tables yield no columns.
pub struct DescribeTable {
    db: Database,
}

impl DescribeTable {
    pub const NAME: &'static str = "describe_table";

    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ToolHandler for DescribeTable {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Get schema information for a specific table."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "table_name": {
                    "type": "string",
                    "description": "Name of the table to describe"
                }
            },
            "required": ["table_name"]
        })
    }

    async fn invoke(&self, arguments: Value) -> Result<ToolResult, HandlerError> {
        let args: DescribeArgs = parse_arguments(Self::NAME, arguments)?;
        let params = [SqlValue::from(args.table_name.as_str())];

        let result = match self.db.fetch(COLUMNS_SQL, &params).await {
            Ok(columns) => {
                let column_count = columns.len();
                ToolResult::success()
                    .field("table_name", args.table_name)
                    .field("columns", columns)
                    .field("column_count", column_count)
            }
            Err(e) => failure(Self::NAME, &e).field("table_name", args.table_name),
        };
        Ok(result.finish())
    }
}

// --- get_database_info ---

/// Server version, database name, server name and table count.
pub struct GetDatabaseInfo {
    db: Database,
}

impl GetDatabaseInfo {
    pub const NAME: &'static str = "get_database_info";

    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    async fn run(&self) -> Result<ToolResult, Error> {
        let version = self.db.fetch(VERSION_SQL, &[]).await?;
        let database_name = self.db.fetch(DATABASE_NAME_SQL, &[]).await?;
        let server_name = self.db.fetch(SERVER_NAME_SQL, &[]).await?;
        let tables = self.db.fetch(TABLES_SQL, &[]).await?;

        Ok(ToolResult::success()
            .field("database_name", first_value(&database_name, "database_name"))
            .field("server_name", first_value(&server_name, "server_name"))
            .field("version", first_value(&version, "version"))
            .field("table_count", tables.len())
            .finish())
    }
}

#[async_trait]
impl ToolHandler for GetDatabaseInfo {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Get general information about the connected database."
    }

    fn input_schema(&self) -> Value {
        empty_schema()
    }

    async fn invoke(&self, arguments: Value) -> Result<ToolResult, HandlerError> {
        let NoArgs {} = parse_arguments(Self::NAME, arguments)?;
        Ok(self
            .run()
            .await
            .unwrap_or_else(|e| failure(Self::NAME, &e).finish()))
    }
}

// --- execute_stored_procedure ---

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProcedureArgs {
    procedure_name: String,
    #[serde(default)]
    parameters: Option<Map<String, Value>>,
}

/// Call a stored procedure with named parameters.
///
/// Not subject to the SELECT-only gate: procedure execution is always
/// permitted, independent of the write-operations flag.
pub struct ExecuteStoredProcedure {
    db: Database,
}

impl ExecuteStoredProcedure {
    pub const NAME: &'static str = "execute_stored_procedure";

    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

/// `EXEC name @k1 = ?, @k2 = ?` with values in the mapping's order.
fn exec_statement(
    procedure_name: &str,
    parameters: Option<&Map<String, Value>>,
) -> (String, Vec<SqlValue>) {
    match parameters.filter(|p| !p.is_empty()) {
        Some(parameters) => {
            let assignments: Vec<String> =
                parameters.keys().map(|key| format!("@{key} = ?")).collect();
            let values = parameters.values().map(SqlValue::from_json).collect();
            (
                format!("EXEC {procedure_name} {}", assignments.join(", ")),
                values,
            )
        }
        None => (format!("EXEC {procedure_name}"), Vec::new()),
    }
}

#[async_trait]
impl ToolHandler for ExecuteStoredProcedure {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Execute a stored procedure."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "procedure_name": {
                    "type": "string",
                    "description": "Name of the stored procedure"
                },
                "parameters": {
                    "type": "object",
                    "description": "Parameters for the stored procedure"
                }
            },
            "required": ["procedure_name"]
        })
    }

    async fn invoke(&self, arguments: Value) -> Result<ToolResult, HandlerError> {
        let args: ProcedureArgs = parse_arguments(Self::NAME, arguments)?;
        let (statement, values) = exec_statement(&args.procedure_name, args.parameters.as_ref());
        let parameters = args.parameters.map_or(Value::Null, Value::Object);

        let result = match self.db.fetch(&statement, &values).await {
            Ok(rows) => {
                let row_count = rows.len();
                ToolResult::success()
                    .field("procedure_name", args.procedure_name)
                    .field("parameters", parameters)
                    .field("results", rows)
                    .field("row_count", row_count)
            }
            Err(e) => failure(Self::NAME, &e)
                .field("procedure_name", args.procedure_name)
                .field("parameters", parameters),
        };
        Ok(result.finish())
    }
}

// --- execute_non_query ---

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NonQueryArgs {
    query: String,
}

/// Run an INSERT, UPDATE, DELETE or EXEC statement in a transaction.
/// Registered only when write operations are enabled.
pub struct ExecuteNonQuery {
    db: Database,
}

impl ExecuteNonQuery {
    pub const NAME: &'static str = "execute_non_query";

    #[must_use]
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ToolHandler for ExecuteNonQuery {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Execute an INSERT, UPDATE, DELETE or EXEC statement and return the affected row count."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "INSERT, UPDATE, DELETE or EXEC statement to execute"
                }
            },
            "required": ["query"]
        })
    }

    async fn invoke(&self, arguments: Value) -> Result<ToolResult, HandlerError> {
        let args: NonQueryArgs = parse_arguments(Self::NAME, arguments)?;

        // Registration already implies write mode.
        if let Err(e) = authorize_write(&args.query, true) {
            tracing::warn!("Rejected statement: {e}");
            return Ok(ToolResult::rejected(e, &args.query));
        }

        let result = match self.db.execute(&args.query, &[]).await {
            Ok(affected) => ToolResult::success()
                .field("affected_rows", affected)
                .field("query", args.query),
            Err(e) => failure(Self::NAME, &e).field("query", args.query),
        };
        Ok(result.finish())
    }
}

// --- helpers ---

fn empty_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {},
        "required": []
    })
}

fn failure(tool: &str, error: &Error) -> crate::result::ToolResultBuilder {
    tracing::warn!("{tool} failed: {error}");
    ToolResult::failure(error)
}

fn table_names(rows: &[Row]) -> Vec<Value> {
    rows.iter()
        .filter_map(|row| row.get("TABLE_NAME").cloned())
        .collect()
}

fn first_value(rows: &[Row], column: &str) -> Value {
    rows.first()
        .and_then(|row| row.get(column))
        .cloned()
        .unwrap_or_else(|| Value::from(UNKNOWN))
}
