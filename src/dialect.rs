//! Engine-specific SQL syntax rules the core depends on abstractly.

/// Identifier quoting, parameter placeholders and the row-locator
/// strategy for one database engine.
///
/// Engines without a stable physical row locator report
/// `supports_row_locator() == false`; table edits keyed on a locator are
/// rejected for them rather than falling back to value matching.
pub trait SqlDialect: Send + Sync {
    /// Quotes an identifier, doubling embedded quote characters.
    fn quote_identifier(&self, name: &str) -> String;

    /// Placeholder for the 1-based parameter `position`.
    fn placeholder(&self, position: usize) -> String;

    /// Expression selecting the row's physical-position token, ordered
    /// by and compared against the locator column. Also used as the
    /// stable ORDER BY tiebreak.
    fn row_locator_expression(&self) -> String;

    /// Expression projecting the locator as an opaque string in a
    /// result set.
    fn row_locator_select_expression(&self) -> String {
        self.row_locator_expression()
    }

    /// Placeholder (plus any cast) for comparing the locator column
    /// against a bound locator value at `position`.
    fn row_locator_parameter(&self, position: usize) -> String;

    fn supports_row_locator(&self) -> bool {
        true
    }
}

/// PostgreSQL rules: `"ident"` quoting, `$n` placeholders, `ctid` as the
/// row locator. A `ctid` is invalidated by any write that moves the row,
/// including updates to the row itself, so locators are only good until
/// the next reload.
#[derive(Debug, Clone, Default)]
pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn placeholder(&self, position: usize) -> String {
        format!("${}", position)
    }

    fn row_locator_expression(&self) -> String {
        "ctid".to_string()
    }

    fn row_locator_select_expression(&self) -> String {
        // project as text so the token survives the string round trip
        "ctid::text".to_string()
    }

    fn row_locator_parameter(&self, position: usize) -> String {
        format!("${}::tid", position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_plain_identifiers() {
        assert_eq!(PostgresDialect.quote_identifier("users"), "\"users\"");
    }

    #[test]
    fn doubles_embedded_quote_characters() {
        assert_eq!(PostgresDialect.quote_identifier("user\"name"), "\"user\"\"name\"");
    }

    #[test]
    fn placeholders_are_positional() {
        assert_eq!(PostgresDialect.placeholder(3), "$3");
        assert_eq!(PostgresDialect.row_locator_parameter(2), "$2::tid");
    }

    #[test]
    fn postgres_has_a_physical_locator() {
        assert!(PostgresDialect.supports_row_locator());
        assert_eq!(PostgresDialect.row_locator_expression(), "ctid");
        assert_eq!(PostgresDialect.row_locator_select_expression(), "ctid::text");
    }
}
