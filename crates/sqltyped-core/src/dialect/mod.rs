//! SQL dialect support

use crate::metadata::CommentSyntax;
use sqlparser::dialect::{Dialect, MySqlDialect, PostgreSqlDialect};
use std::str::FromStr;

/// Supported SQL dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SqlDialect {
    #[default]
    PostgreSQL,
    MySQL,
}

impl SqlDialect {
    /// Get the sqlparser dialect for parsing
    pub fn parser_dialect(&self) -> Box<dyn Dialect> {
        match self {
            SqlDialect::PostgreSQL => Box::new(PostgreSqlDialect {}),
            SqlDialect::MySQL => Box::new(MySqlDialect {}),
        }
    }

    /// Get default schema name for this dialect
    pub fn default_schema(&self) -> &'static str {
        match self {
            SqlDialect::PostgreSQL => "public",
            SqlDialect::MySQL => "",
        }
    }

    /// Comment forms that may carry a query directive
    pub fn comment_syntax(&self) -> CommentSyntax {
        match self {
            SqlDialect::PostgreSQL => CommentSyntax {
                dash: true,
                hash: false,
                slash_star: true,
            },
            SqlDialect::MySQL => CommentSyntax {
                dash: true,
                hash: true,
                slash_star: true,
            },
        }
    }

    /// Whether emitted SQL uses `?` placeholders unless configured otherwise
    pub fn positional_parameters(&self) -> bool {
        matches!(self, SqlDialect::MySQL)
    }

    /// Whether a lone parameter in `IN (...)` expands to a list at runtime
    pub fn in_list_slices(&self) -> bool {
        matches!(self, SqlDialect::MySQL)
    }

    /// Spell an identifier so that it reads back as `name`
    pub fn quote_identifier(&self, name: &str) -> String {
        let plain = name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && name.chars().all(|c| match self {
                // unquoted PostgreSQL names fold to lower case
                SqlDialect::PostgreSQL => c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_',
                SqlDialect::MySQL => c.is_ascii_alphanumeric() || c == '_',
            });
        if plain {
            return name.to_string();
        }
        let quote = match self {
            SqlDialect::PostgreSQL => '"',
            SqlDialect::MySQL => '`',
        };
        let escaped = name.replace(quote, &format!("{quote}{quote}"));
        format!("{quote}{escaped}{quote}")
    }
}

impl FromStr for SqlDialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgresql" | "postgres" | "pg" => Ok(SqlDialect::PostgreSQL),
            "mysql" | "mysql8" => Ok(SqlDialect::MySQL),
            _ => Err(format!(
                "Unknown dialect: '{}'. Supported dialects: postgresql, mysql.",
                s
            )),
        }
    }
}

impl std::fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlDialect::PostgreSQL => write!(f, "postgresql"),
            SqlDialect::MySQL => write!(f, "mysql"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dialect() {
        assert_eq!("postgres".parse::<SqlDialect>(), Ok(SqlDialect::PostgreSQL));
        assert_eq!("MySQL".parse::<SqlDialect>(), Ok(SqlDialect::MySQL));
        assert!("sqlite".parse::<SqlDialect>().is_err());
    }

    #[test]
    fn test_mysql_defaults() {
        let dialect = SqlDialect::MySQL;
        assert!(dialect.positional_parameters());
        assert!(dialect.comment_syntax().hash);
        assert!(!SqlDialect::PostgreSQL.comment_syntax().hash);
        assert!(SqlDialect::PostgreSQL.comment_syntax().slash_star);
        assert!(!SqlDialect::PostgreSQL.positional_parameters());
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(SqlDialect::PostgreSQL.quote_identifier("user_id"), "user_id");
        assert_eq!(SqlDialect::PostgreSQL.quote_identifier("userId"), "\"userId\"");
        assert_eq!(SqlDialect::MySQL.quote_identifier("userId"), "userId");
        assert_eq!(SqlDialect::MySQL.quote_identifier("full name"), "`full name`");
        assert_eq!(SqlDialect::MySQL.quote_identifier("2fa"), "`2fa`");
    }
}
