//! Query safety gate.
//!
//! Classifies caller-supplied SQL by its leading keyword and enforces the
//! read-only and row-limit policy. This is a textual rewrite, not a parser:
//! the query must start with its statement keyword. Leading comments, CTEs
//! (`WITH ...`) and multi-statement batches are not understood.

use std::fmt::Write as _;

use crate::error::Error;

pub const SELECT_ONLY: &str = "Only SELECT queries are allowed for security reasons";
pub const WRITE_KINDS_ONLY: &str =
    "Only INSERT, UPDATE, DELETE, EXEC, EXECUTE operations are allowed";

const SELECT: &str = "SELECT";
const DISTINCT: &str = "DISTINCT";

/// Statement kind derived from the first keyword of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Select,
    Insert,
    Update,
    Delete,
    Exec,
    Unknown,
}

impl QueryKind {
    /// Classify a query by its leading keyword, ignoring case and surrounding
    /// whitespace.
    #[must_use]
    pub fn classify(query: &str) -> Self {
        let upper = query.trim().to_ascii_uppercase();
        match leading_word(&upper) {
            "SELECT" => Self::Select,
            "INSERT" => Self::Insert,
            "UPDATE" => Self::Update,
            "DELETE" => Self::Delete,
            "EXEC" | "EXECUTE" => Self::Exec,
            _ => Self::Unknown,
        }
    }

    /// True for the statement kinds permitted in write mode.
    #[must_use]
    pub fn is_write(self) -> bool {
        matches!(self, Self::Insert | Self::Update | Self::Delete | Self::Exec)
    }
}

/// Validate a query against the read/write policy and bound SELECTs with a
/// `TOP` clause.
///
/// The effective limit is `min(requested_limit or max_limit, max_limit)`; a
/// requested limit of zero counts as absent. Queries that already carry a
/// `TOP` or `LIMIT` keyword are returned unmodified.
///
/// # Errors
///
/// Returns [`Error::InvalidQuery`] when the statement kind is not allowed.
pub fn classify_and_rewrite(
    query: &str,
    requested_limit: Option<u32>,
    max_limit: u32,
    write_ops_enabled: bool,
) -> Result<String, Error> {
    match QueryKind::classify(query) {
        QueryKind::Select => {}
        kind if write_ops_enabled && kind.is_write() => return Ok(query.to_string()),
        _ if write_ops_enabled => return Err(Error::InvalidQuery(WRITE_KINDS_ONLY)),
        _ => return Err(Error::InvalidQuery(SELECT_ONLY)),
    }

    let trimmed = query.trim();
    let upper = trimmed.to_ascii_uppercase();
    if words(&upper).any(|w| w == "TOP" || w == "LIMIT") {
        return Ok(query.to_string());
    }

    let limit = requested_limit
        .filter(|&n| n > 0)
        .unwrap_or(max_limit)
        .min(max_limit);

    Ok(insert_top(trimmed, &upper, limit))
}

/// Check that a statement may run as a write.
///
/// # Errors
///
/// Returns [`Error::WriteOpsDisabled`] when writes are off, and
/// [`Error::InvalidQuery`] unless the statement is INSERT, UPDATE, DELETE or
/// EXEC/EXECUTE.
pub fn authorize_write(query: &str, write_ops_enabled: bool) -> Result<QueryKind, Error> {
    if !write_ops_enabled {
        return Err(Error::WriteOpsDisabled);
    }
    let kind = QueryKind::classify(query);
    if kind.is_write() {
        Ok(kind)
    } else {
        Err(Error::InvalidQuery(WRITE_KINDS_ONLY))
    }
}

/// `trimmed` starts with the SELECT keyword; `upper` is its ASCII-uppercased
/// copy, so byte offsets are shared between the two.
fn insert_top(trimmed: &str, upper: &str, limit: u32) -> String {
    let mut body = trimmed[SELECT.len()..].trim_start();
    let mut distinct = false;

    let offset = trimmed.len() - body.len();
    if leading_word(&upper[offset..]) == DISTINCT {
        distinct = true;
        body = body[DISTINCT.len()..].trim_start();
    }

    let mut rewritten = String::from(SELECT);
    if distinct {
        rewritten.push(' ');
        rewritten.push_str(DISTINCT);
    }
    let _ = write!(rewritten, " TOP {limit}");
    if !body.is_empty() {
        rewritten.push(' ');
        rewritten.push_str(body);
    }
    rewritten
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '@' | '#' | '$')
}

fn leading_word(text: &str) -> &str {
    let end = text.find(|c: char| !is_word_char(c)).unwrap_or(text.len());
    &text[..end]
}

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !is_word_char(c)).filter(|w| !w.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite(query: &str, limit: Option<u32>) -> String {
        classify_and_rewrite(query, limit, 1000, false).unwrap()
    }

    #[test]
    fn classify_leading_keyword() {
        assert_eq!(QueryKind::classify("  select * from t"), QueryKind::Select);
        assert_eq!(QueryKind::classify("INSERT INTO t VALUES (1)"), QueryKind::Insert);
        assert_eq!(QueryKind::classify("update t set a = 1"), QueryKind::Update);
        assert_eq!(QueryKind::classify("Delete FROM t"), QueryKind::Delete);
        assert_eq!(QueryKind::classify("EXEC sp_who"), QueryKind::Exec);
        assert_eq!(QueryKind::classify("execute sp_who"), QueryKind::Exec);
        assert_eq!(QueryKind::classify("DROP TABLE t"), QueryKind::Unknown);
        assert_eq!(QueryKind::classify("WITH x AS (SELECT 1) SELECT * FROM x"), QueryKind::Unknown);
        assert_eq!(QueryKind::classify("SELECTED"), QueryKind::Unknown);
        assert_eq!(QueryKind::classify(""), QueryKind::Unknown);
    }

    #[test]
    fn inserts_top_after_select() {
        assert_eq!(rewrite("SELECT * FROM t", Some(10)), "SELECT TOP 10 * FROM t");
    }

    #[test]
    fn inserts_top_after_distinct() {
        assert_eq!(
            rewrite("SELECT DISTINCT x FROM t", None),
            "SELECT DISTINCT TOP 1000 x FROM t"
        );
    }

    #[test]
    fn preserves_original_casing() {
        assert_eq!(
            rewrite("  select distinct Name from Users  ", Some(5)),
            "SELECT DISTINCT TOP 5 Name from Users"
        );
    }

    #[test]
    fn distinct_must_be_a_whole_word() {
        assert_eq!(
            rewrite("SELECT DISTINCTIVE FROM t", Some(3)),
            "SELECT TOP 3 DISTINCTIVE FROM t"
        );
    }

    #[test]
    fn existing_top_is_left_alone() {
        let query = "SELECT TOP 5 * FROM t";
        assert_eq!(rewrite(query, Some(100)), query);

        let query = "SELECT TOP(5) * FROM t";
        assert_eq!(rewrite(query, Some(100)), query);
    }

    #[test]
    fn existing_limit_is_left_alone() {
        let query = "SELECT * FROM t LIMIT 3";
        assert_eq!(rewrite(query, Some(100)), query);
    }

    #[test]
    fn top_inside_identifier_is_not_a_limit() {
        assert_eq!(
            rewrite("SELECT laptop FROM inventory", Some(2)),
            "SELECT TOP 2 laptop FROM inventory"
        );
    }

    #[test]
    fn unicode_letters_continue_an_identifier() {
        assert_eq!(rewrite("SELECT éTOP FROM t", Some(3)), "SELECT TOP 3 éTOP FROM t");
        assert_eq!(rewrite("SELECT TOPé FROM t", Some(3)), "SELECT TOP 3 TOPé FROM t");
    }

    #[test]
    fn limit_is_capped_at_max() {
        assert_eq!(rewrite("SELECT 1", Some(50_000)), "SELECT TOP 1000 1");
    }

    #[test]
    fn zero_limit_means_max() {
        assert_eq!(rewrite("SELECT a FROM t", Some(0)), "SELECT TOP 1000 a FROM t");
    }

    #[test]
    fn bare_select_gets_no_trailing_space() {
        assert_eq!(rewrite("SELECT", Some(1)), "SELECT TOP 1");
    }

    #[test]
    fn multiline_select_is_rewritten() {
        assert_eq!(
            rewrite("SELECT\n  a,\n  b\nFROM t", Some(7)),
            "SELECT TOP 7 a,\n  b\nFROM t"
        );
    }

    #[test]
    fn read_only_rejects_writes() {
        for query in ["DELETE FROM t", "INSERT INTO t VALUES (1)", "EXEC sp_who", "DROP TABLE t"] {
            let err = classify_and_rewrite(query, None, 1000, false).unwrap_err();
            assert!(matches!(err, Error::InvalidQuery(SELECT_ONLY)), "{query}");
            assert!(err.to_string().contains("SELECT queries are allowed"));
        }
    }

    #[test]
    fn write_mode_permits_write_kinds_unmodified() {
        let query = "UPDATE t SET a = 1";
        assert_eq!(classify_and_rewrite(query, None, 1000, true).unwrap(), query);
    }

    #[test]
    fn write_mode_still_limits_selects() {
        assert_eq!(
            classify_and_rewrite("SELECT * FROM t", Some(10), 1000, true).unwrap(),
            "SELECT TOP 10 * FROM t"
        );
    }

    #[test]
    fn write_mode_rejects_unknown_kinds() {
        let err = classify_and_rewrite("TRUNCATE TABLE t", None, 1000, true).unwrap_err();
        assert!(matches!(err, Error::InvalidQuery(WRITE_KINDS_ONLY)));
    }

    #[test]
    fn authorize_write_requires_flag() {
        assert!(matches!(
            authorize_write("DELETE FROM t", false),
            Err(Error::WriteOpsDisabled)
        ));
        assert_eq!(authorize_write("DELETE FROM t", true).unwrap(), QueryKind::Delete);
        assert!(matches!(
            authorize_write("SELECT 1", true),
            Err(Error::InvalidQuery(WRITE_KINDS_ONLY))
        ));
    }

    #[test]
    fn non_ascii_text_is_preserved() {
        assert_eq!(
            rewrite("SELECT ñame FROM tëst", Some(4)),
            "SELECT TOP 4 ñame FROM tëst"
        );
    }
}
