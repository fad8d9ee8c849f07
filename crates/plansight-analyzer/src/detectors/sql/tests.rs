//! Tests for lexical helpers

use super::*;

mod mask_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_literals_masked() {
        assert_eq!(
            mask_literals("SELECT * FROM t WHERE note = 'SELECT * OR NOT IN'"),
            "SELECT * FROM t WHERE note = '?'"
        );
    }

    #[test]
    fn test_leading_wildcard_kept() {
        assert_eq!(
            mask_literals("WHERE name LIKE '%phone%' OR sku LIKE 'ab%'"),
            "WHERE name LIKE '%' OR sku LIKE '?'"
        );
    }

    #[test]
    fn test_comments_blanked() {
        let masked = mask_literals("SELECT id -- SELECT *\nFROM t /* LIKE '%x' */");
        assert!(!masked.contains('*'));
        assert!(!masked.contains("LIKE"));
        assert!(masked.contains("FROM t"));
    }

    #[test]
    fn test_doubled_quote() {
        assert_eq!(mask_literals("x = 'it''s' AND y = ''"), "x = '?' AND y = '?'");
    }

    #[test]
    fn test_backslash_is_ordinary_in_standard_sql() {
        assert_eq!(
            mask_literals(r"dir = 'C:\' AND name LIKE '%report'"),
            "dir = '?' AND name LIKE '%'"
        );
    }

    #[test]
    fn test_backslash_escape_for_mysql() {
        let style = QuoteStyle::for_engine("mysql");
        assert_eq!(style, QuoteStyle::Backslash);
        assert_eq!(
            mask_literals_with(r"x = 'it\'s' AND y = 1 # trailing", style),
            "x = '?' AND y = 1  "
        );
    }

    #[test]
    fn test_quote_style_per_engine() {
        assert_eq!(QuoteStyle::for_engine("MariaDB"), QuoteStyle::Backslash);
        assert_eq!(QuoteStyle::for_engine("postgresql"), QuoteStyle::Standard);
        assert_eq!(QuoteStyle::for_engine("sqlserver"), QuoteStyle::Standard);
        assert_eq!(QuoteStyle::for_engine("db2"), QuoteStyle::Standard);
    }

    #[test]
    fn test_masking_is_idempotent() {
        let once = mask_literals_with(r"a = 'x\'y' AND b LIKE '%z'", QuoteStyle::Backslash);
        assert_eq!(mask_literals(&once), once);
    }
}

mod column_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_postgres_filter() {
        assert_eq!(compared_columns("(total > 100::numeric)"), vec!["total"]);
        assert_eq!(
            compared_columns("(((status)::text = 'active'::text) AND (o.region_id = 3))"),
            vec!["status", "region_id"]
        );
    }

    #[test]
    fn test_bracketed_and_quoted() {
        assert_eq!(compared_columns("[o].[total]>(100)"), vec!["total"]);
        assert_eq!(compared_columns("\"SALARY\">1000"), vec!["salary"]);
    }

    #[test]
    fn test_keywords_skipped() {
        assert_eq!(
            compared_columns("deleted_at IS NULL AND kind IN (1, 2)"),
            vec!["deleted_at", "kind"]
        );
    }

    #[test]
    fn test_negated_comparisons() {
        assert_eq!(
            compared_columns("kind NOT IN (1, 2) AND name NOT LIKE 'a%' AND age NOT BETWEEN 1 AND 9"),
            vec!["kind", "name", "age"]
        );
    }

    #[test]
    fn test_where_columns() {
        let sql = "SELECT id FROM users u WHERE u.email = 'a@b.c' AND age >= 21 ORDER BY id";
        assert_eq!(where_columns(sql), vec!["email", "age"]);
        assert!(where_columns("SELECT 1").is_empty());
    }
}

mod word_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mentions_word() {
        assert!(mentions_word("SELECT * FROM Users WHERE id = 1", "users"));
        assert!(!mentions_word("SELECT * FROM users_archive", "users"));
        assert!(!mentions_word("SELECT * FROM app_users", "users"));
    }

    #[test]
    fn test_unqualified() {
        assert_eq!(unqualified("public.orders"), "orders");
        assert_eq!(unqualified("orders"), "orders");
    }
}
