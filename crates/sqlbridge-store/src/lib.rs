//! SQL Server driver for the sqlbridge query executor.

pub mod convert;
pub mod mssql;
pub mod settings;

pub use mssql::{MssqlConnection, MssqlProvider};
pub use settings::ConnectionSettings;
