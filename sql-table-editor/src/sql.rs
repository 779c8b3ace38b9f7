//! Parameterized statement building
//!
//! Identifiers (table and column names) are quoted into the SQL text; values
//! are never interpolated, only bound through `?` placeholders. Callers must
//! only pass identifiers that came from schema discovery.

use crate::schema::{IdentityColumn, Value};

/// SQL text plus the positional values bound to its placeholders
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }
}

/// Quote an identifier (table or column name)
///
/// Uses double quotes, escaping any embedded double quote by doubling it.
pub fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// `SELECT *` over a whole table
pub fn select_all(table: &str) -> Statement {
    Statement::new(format!("SELECT * FROM {}", quote_identifier(table)))
}

/// `INSERT` of exactly the given columns
///
/// An empty value list inserts a row of defaults.
pub fn insert(table: &str, values: &[(String, Value)]) -> Statement {
    if values.is_empty() {
        return Statement::new(format!(
            "INSERT INTO {} DEFAULT VALUES",
            quote_identifier(table)
        ));
    }

    let columns = values
        .iter()
        .map(|(column, _)| quote_identifier(column))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; values.len()].join(", ");

    Statement {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(table),
            columns,
            placeholders
        ),
        params: values.iter().map(|(_, value)| value.clone()).collect(),
    }
}

/// `UPDATE` setting the given columns on rows matching every identity column
pub fn update(table: &str, values: &[(String, Value)], identity: &[IdentityColumn]) -> Statement {
    let set_clause = values
        .iter()
        .map(|(column, _)| format!("{} = ?", quote_identifier(column)))
        .collect::<Vec<_>>()
        .join(", ");

    let mut params: Vec<Value> = values.iter().map(|(_, value)| value.clone()).collect();
    let where_clause = identity_predicate(identity, &mut params);

    Statement {
        sql: format!(
            "UPDATE {} SET {} WHERE {}",
            quote_identifier(table),
            set_clause,
            where_clause
        ),
        params,
    }
}

/// `DELETE` of rows matching every identity column
pub fn delete(table: &str, identity: &[IdentityColumn]) -> Statement {
    let mut params = Vec::new();
    let where_clause = identity_predicate(identity, &mut params);

    Statement {
        sql: format!("DELETE FROM {} WHERE {}", quote_identifier(table), where_clause),
        params,
    }
}

/// AND-joined equality over identity columns
///
/// A captured NULL becomes `IS NULL`, since `= NULL` never matches.
fn identity_predicate(identity: &[IdentityColumn], params: &mut Vec<Value>) -> String {
    identity
        .iter()
        .map(|pair| {
            let quoted_column = quote_identifier(&pair.column);
            if pair.value.is_null() {
                format!("{} IS NULL", quoted_column)
            } else {
                params.push(pair.value.clone());
                format!("{} = ?", quoted_column)
            }
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}
