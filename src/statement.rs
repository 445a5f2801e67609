//! Parameterized SQL with `:name` placeholders.
//!
//! Statements are written with named placeholders and compiled to
//! PostgreSQL's positional `$n` form right before execution. A statement's
//! text and parameters together form the key of the read cache.

use sqlx::postgres::PgArguments;
use sqlx::Postgres;

use crate::{CatalogError, CatalogResult, Value};

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

/// Query text plus its named bind parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Statement {
    sql: String,
    params: Vec<(String, Value)>,
}

impl Statement {
    /// Statement with no bindings yet. Placeholders are written `:name`.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Bind `value` to `:name`, replacing any earlier binding of that name.
    pub fn bind(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.params.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.params.push((name, value)),
        }
        self
    }

    /// Append raw SQL text.
    pub fn push_sql(mut self, sql: &str) -> Self {
        self.sql.push_str(sql);
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[(String, Value)] {
        &self.params
    }

    /// Value currently bound to `name`.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Rewrite `:name` placeholders into `$n`.
    ///
    /// `::` casts and quoted text are left untouched. A name used twice
    /// shares one position.
    pub fn compile(&self) -> CatalogResult<CompiledStatement> {
        let mut sql = String::with_capacity(self.sql.len());
        let mut order: Vec<&str> = Vec::new();
        let mut values = Vec::new();
        let mut chars = self.sql.char_indices().peekable();
        let mut quote: Option<char> = None;

        while let Some((i, c)) = chars.next() {
            if let Some(q) = quote {
                sql.push(c);
                if c == q {
                    quote = None;
                }
                continue;
            }

            match c {
                '\'' | '"' => {
                    quote = Some(c);
                    sql.push(c);
                }
                ':' => match chars.peek() {
                    Some((_, ':')) => {
                        chars.next();
                        sql.push_str("::");
                    }
                    Some((_, next)) if next.is_ascii_alphabetic() || *next == '_' => {
                        let start = i + 1;
                        let mut end = start;
                        while let Some((j, ch)) = chars.peek() {
                            if ch.is_ascii_alphanumeric() || *ch == '_' {
                                end = j + ch.len_utf8();
                                chars.next();
                            } else {
                                break;
                            }
                        }
                        let name = &self.sql[start..end];
                        let position = match order.iter().position(|n| *n == name) {
                            Some(p) => p + 1,
                            None => {
                                let value = self.param(name).ok_or_else(|| {
                                    CatalogError::Query(format!(
                                        "A value is required for bind parameter '{name}'"
                                    ))
                                })?;
                                order.push(name);
                                values.push(value.clone());
                                order.len()
                            }
                        };
                        sql.push('$');
                        sql.push_str(&position.to_string());
                    }
                    _ => sql.push(':'),
                },
                _ => sql.push(c),
            }
        }

        Ok(CompiledStatement { sql, values })
    }
}

/// A statement in PostgreSQL's positional form, ready to bind.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStatement {
    pub sql: String,
    pub values: Vec<Value>,
}

impl CompiledStatement {
    /// Build a sqlx query with every value bound in position order.
    pub fn query(&self) -> PgQuery<'_> {
        self.values
            .iter()
            .fold(sqlx::query(&self.sql), |query, value| bind_value(query, value))
    }
}

fn bind_value<'q>(query: PgQuery<'q>, value: &Value) -> PgQuery<'q> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(v) => query.bind(*v),
        Value::Int(v) => query.bind(*v),
        Value::Float(v) => query.bind(*v),
        Value::Decimal(v) => query.bind(*v),
        Value::Text(v) => query.bind(v.clone()),
        Value::Timestamp(v) => query.bind(*v),
        Value::Date(v) => query.bind(*v),
        Value::Uuid(v) => query.bind(*v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_placeholders_become_positional() {
        let compiled = Statement::new(
            "SELECT * FROM users WHERE username = :username AND password_hash = :password_hash",
        )
        .bind("username", "admin")
        .bind("password_hash", "abc")
        .compile()
        .unwrap();

        assert_eq!(
            compiled.sql,
            "SELECT * FROM users WHERE username = $1 AND password_hash = $2"
        );
        assert_eq!(compiled.values, vec![Value::from("admin"), Value::from("abc")]);
    }

    #[test]
    fn casts_and_literals_are_left_alone() {
        let compiled = Statement::new("SELECT price::float8, ':x' FROM products WHERE name = :name")
            .bind("name", "Laptop")
            .compile()
            .unwrap();

        assert_eq!(
            compiled.sql,
            "SELECT price::float8, ':x' FROM products WHERE name = $1"
        );
        assert_eq!(compiled.values.len(), 1);
    }

    #[test]
    fn repeated_name_reuses_position() {
        let compiled = Statement::new("SELECT :v, :w, :v")
            .bind("v", 1)
            .bind("w", 2)
            .compile()
            .unwrap();

        assert_eq!(compiled.sql, "SELECT $1, $2, $1");
        assert_eq!(compiled.values, vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn missing_binding_is_a_query_error() {
        let err = Statement::new("SELECT * FROM products WHERE category = :category")
            .compile()
            .unwrap_err();
        assert!(matches!(err, CatalogError::Query(_)));
    }

    #[test]
    fn rebinding_replaces_value() {
        let stmt = Statement::new("SELECT :a").bind("a", 1).bind("a", 2);
        assert_eq!(stmt.params().len(), 1);
        assert_eq!(stmt.param("a"), Some(&Value::Int(2)));
    }

    #[test]
    fn equal_text_and_params_are_equal_keys() {
        let a = Statement::new("SELECT * FROM products WHERE 1=1").bind("x", "y");
        let b = Statement::new("SELECT * FROM products WHERE 1=1").bind("x", "y");
        let c = Statement::new("SELECT * FROM products WHERE 1=1").bind("x", "z");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
