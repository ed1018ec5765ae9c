pub mod database;
pub mod error;
pub mod gate;
pub mod serialize;
pub mod traits;
pub mod types;

pub use database::Database;
pub use error::Error;
pub use gate::{authorize_write, classify_and_rewrite, QueryKind};
pub use types::{QueryPolicy, ResultSet, Row, SqlValue};
