//! Typed invocation of server-side stored procedures.
//!
//! The application never writes query text for widget data. Each operation names one
//! PostgreSQL function and binds a fixed set of named arguments, rendered as
//! `SELECT * FROM "spName"(arg => $1, ...)`. Output parameters come back as columns of the
//! returned row.

use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::{PgConnection, Postgres};

/// Value bound to one named procedure argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcedureArg {
    Int(i32),
    Float(f64),
    Text(String),
    NullableText(Option<String>),
}

impl From<i32> for ProcedureArg {
    fn from(v: i32) -> Self {
        ProcedureArg::Int(v)
    }
}

impl From<f64> for ProcedureArg {
    fn from(v: f64) -> Self {
        ProcedureArg::Float(v)
    }
}

impl From<&str> for ProcedureArg {
    fn from(v: &str) -> Self {
        ProcedureArg::Text(v.to_string())
    }
}

impl From<Option<&str>> for ProcedureArg {
    fn from(v: Option<&str>) -> Self {
        ProcedureArg::NullableText(v.map(str::to_string))
    }
}

/// One call to a named stored procedure with its bound arguments, in binding order.
#[derive(Debug, Clone)]
pub struct ProcedureCall {
    name: &'static str,
    args: Vec<(&'static str, ProcedureArg)>,
}

impl ProcedureCall {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, name: &'static str, value: impl Into<ProcedureArg>) -> Self {
        self.args.push((name, value.into()));
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn args(&self) -> &[(&'static str, ProcedureArg)] {
        &self.args
    }

    /// Renders the invocation using named-argument notation.
    pub fn sql(&self) -> String {
        let args: Vec<String> = self
            .args
            .iter()
            .enumerate()
            .map(|(idx, (name, _))| format!("{} => ${}", name, idx + 1))
            .collect();
        format!(
            "SELECT * FROM {}({})",
            quote_ident(self.name),
            args.join(", ")
        )
    }

    pub async fn fetch_all(&self, conn: &mut PgConnection) -> Result<Vec<PgRow>, sqlx::Error> {
        let sql = self.sql();
        self.bind(&sql).fetch_all(&mut *conn).await
    }

    /// Runs the call and keeps only the first row; later rows are discarded.
    pub async fn fetch_first(&self, conn: &mut PgConnection) -> Result<Option<PgRow>, sqlx::Error> {
        let sql = self.sql();
        self.bind(&sql).fetch_optional(&mut *conn).await
    }

    fn bind<'q>(&'q self, sql: &'q str) -> Query<'q, Postgres, PgArguments> {
        let mut query = sqlx::query(sql);
        for (_, value) in &self.args {
            query = match value {
                ProcedureArg::Int(v) => query.bind(*v),
                ProcedureArg::Float(v) => query.bind(*v),
                ProcedureArg::Text(v) => query.bind(v.as_str()),
                ProcedureArg::NullableText(v) => query.bind(v.as_deref()),
            };
        }
        query
    }
}

/// Quotes a procedure name so its mixed case survives PostgreSQL identifier folding.
fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
