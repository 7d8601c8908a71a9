use regex::Regex;

lazy_static::lazy_static! {
    /// A read statement: SELECT, optionally behind a WITH (CTE) prologue
    static ref READ_HEAD: Regex = Regex::new(r"(?is)^\s*(?:SELECT|WITH)\b").unwrap();

    /// First WHERE keyword; everything after it is the filter region
    static ref WHERE_KEYWORD: Regex = Regex::new(r"(?is)\bWHERE\b").unwrap();

    /// Supported filter operators: equality, inequality, range, set
    /// membership. LIKE is not on the list - a pattern match can scan
    /// arbitrarily and is not a shape this gate vouches for.
    static ref FILTER_OPERATOR: Regex =
        Regex::new(r"(?is)(!=|<>|<=|>=|=|<|>|\bIN\s*\(|\bBETWEEN\b)").unwrap();
}

/// Cheap textual gate deciding whether a query even has the SHAPE of a
/// replica-safe read: a SELECT with a WHERE clause filtering through at least
/// one supported operator. Everything else (writes, unfiltered scans,
/// pattern-match filters, DDL, anything unrecognizable) fails the gate and is
/// pinned to the primary without ever reaching the SQL parser.
///
/// The gate only vouches for shape. It may ACCEPT text the parser later
/// rejects; that failure degrades to the primary as well.
pub fn is_retriable_shape(text: &str) -> bool {
    if !READ_HEAD.is_match(text) {
        return false;
    }

    let filter_region = match WHERE_KEYWORD.find(text) {
        Some(found) => &text[found.end()..],
        None => return false,
    };

    FILTER_OPERATOR.is_match(filter_region)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filtered_select_is_retriable() {
        assert!(is_retriable_shape("SELECT * FROM torder WHERE id = 1"));
        assert!(is_retriable_shape("select name from tcustomer where age >= 21"));
        assert!(is_retriable_shape(
            "SELECT * FROM torder WHERE id IN (1, 2, 3)"
        ));
        assert!(is_retriable_shape(
            "SELECT * FROM torder WHERE total BETWEEN 10 AND 20"
        ));
        assert!(is_retriable_shape("SELECT * FROM torder WHERE id <> 5"));
    }

    #[test]
    fn test_cte_select_is_retriable() {
        assert!(is_retriable_shape(
            "WITH recent AS (SELECT * FROM torder WHERE id > 100) SELECT * FROM recent WHERE total > 5"
        ));
    }

    #[test]
    fn test_unfiltered_select_is_not_retriable() {
        assert!(!is_retriable_shape("SELECT * FROM torder"));
        assert!(!is_retriable_shape("SELECT count(*) FROM tcustomer"));
    }

    #[test]
    fn test_where_without_supported_operator_is_not_retriable() {
        assert!(!is_retriable_shape(
            "SELECT * FROM tcustomer WHERE name LIKE 'a%'"
        ));
    }

    #[test]
    fn test_writes_are_not_retriable() {
        assert!(!is_retriable_shape("UPDATE torder SET total = 0 WHERE id = 1"));
        assert!(!is_retriable_shape("DELETE FROM torder WHERE id = 1"));
        assert!(!is_retriable_shape("INSERT INTO torder VALUES (1)"));
        assert!(!is_retriable_shape("DROP TABLE torder"));
    }

    #[test]
    fn test_garbage_is_not_retriable() {
        assert!(!is_retriable_shape(""));
        assert!(!is_retriable_shape("   "));
        assert!(!is_retriable_shape("not sql at all"));
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        assert!(is_retriable_shape(
            "\n  SeLeCt *\nFROM torder\nWhErE id = 1"
        ));
    }
}
