//! The Widget data layer.
//!
//! This module hides the details of talking to the database. It is responsible for:
//! 1.  Opening a dedicated connection per operation and closing it before returning.
//! 2.  Invoking exactly one stored procedure per operation with a fixed set of named arguments.
//! 3.  Turning result rows into `Widget` values, and absence into `None` or a zero row count.
//!
//! Failures are returned to the caller untouched: no logging, no retries, no fallback values.

use crate::app::error::{DataAccessError, DataAccessResult};
use crate::app::procedure::ProcedureCall;
use crate::domain::Widget;
use crate::infra::config::{Config, DEFAULT_TIMEOUT_SECS};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgRow};
use sqlx::{ColumnIndex, Connection, PgConnection, Row};
use std::str::FromStr;
use std::time::Duration;

pub const SP_GET_WIDGETS: &str = "spGetWidgets";
pub const SP_GET_A_WIDGET: &str = "spGetAWidget";
pub const SP_INSERT_WIDGET: &str = "spInsertWidget";
pub const SP_UPDATE_WIDGET: &str = "spUpdateWidget";
pub const SP_DELETE_WIDGET: &str = "spDeleteWidget";

/// Every procedure the data layer depends on.
pub const WIDGET_PROCEDURES: &[&str] = &[
    SP_GET_WIDGETS,
    SP_GET_A_WIDGET,
    SP_INSERT_WIDGET,
    SP_UPDATE_WIDGET,
    SP_DELETE_WIDGET,
];

const NULL_WIDGET: &str = "Widget can not be null.";

/// Column positions of (id, name, description, cost, location) in a procedure's result set.
#[derive(Debug, Clone, Copy)]
struct WidgetColumns {
    first: usize,
}

impl WidgetColumns {
    const fn starting_at(first: usize) -> Self {
        Self { first }
    }

    fn decode(&self, row: &PgRow) -> Result<Widget, sqlx::Error> {
        let at = self.first;
        Ok(Widget {
            id: row.try_get(at)?,
            name: row.try_get(at + 1)?,
            description: row.try_get(at + 2)?,
            cost: row.try_get(at + 3)?,
            location: row.try_get(at + 4)?,
        })
    }
}

/// Reads an affected-row count that a procedure may report as INTEGER or BIGINT.
/// NULL counts as zero.
fn affected_rows<I>(row: &PgRow, index: I) -> Result<u64, sqlx::Error>
where
    I: ColumnIndex<PgRow> + Copy,
{
    let count = match row.try_get::<Option<i64>, _>(index) {
        Ok(count) => count,
        Err(sqlx::Error::ColumnDecode { .. }) => row.try_get::<Option<i32>, _>(index)?.map(i64::from),
        Err(e) => return Err(e),
    };
    Ok(count.unwrap_or(0).max(0) as u64)
}

const LIST_COLUMNS: WidgetColumns = WidgetColumns::starting_at(0);
// spGetAWidget emits two leading columns before the widget fields. Kept as deployed;
// confirm with the schema owner before changing either side.
const SINGLE_COLUMNS: WidgetColumns = WidgetColumns::starting_at(2);

/// The operations the HTTP layer needs from widget storage.
///
/// `None` for a widget argument models a caller that supplied no entity; implementations
/// must reject it with `DataAccessError::InvalidArgument` without touching storage.
#[async_trait]
pub trait WidgetStore: Send + Sync {
    /// All widgets in procedure order; empty when the table is empty.
    async fn list_widgets(&self) -> DataAccessResult<Vec<Widget>>;

    /// The widget with `id`, or `None` when no row matches.
    async fn get_widget_by_id(&self, id: i32) -> DataAccessResult<Option<Widget>>;

    /// Inserts `widget` and returns it carrying the server-assigned id, or `None` when no row
    /// was written.
    async fn insert_widget(&self, widget: Option<&Widget>) -> DataAccessResult<Option<Widget>>;

    /// Replaces the four mutable fields of row `id`; returns the affected-row count.
    async fn update_widget(&self, id: i32, widget: Option<&Widget>) -> DataAccessResult<u64>;

    /// Removes row `id`; returns the affected-row count.
    async fn delete_widget(&self, id: i32) -> DataAccessResult<u64>;

    /// Checks that storage is reachable.
    async fn ping(&self) -> DataAccessResult<()>;
}

#[derive(Debug, Clone, Copy)]
enum Fetch {
    All,
    First,
}

/// PostgreSQL-backed `WidgetStore`. Holds configuration only; no connection outlives a call.
#[derive(Debug, Clone)]
pub struct DataLayer {
    options: PgConnectOptions,
    connect_timeout: Duration,
    command_timeout: Duration,
}

impl DataLayer {
    /// Creates a data layer for `connection_string` with the default 30 second timeouts.
    pub fn new(connection_string: &str) -> DataAccessResult<Self> {
        let options = PgConnectOptions::from_str(connection_string)
            .map_err(DataAccessError::InvalidConnectionString)?;
        let default_timeout = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
        Ok(Self {
            options,
            connect_timeout: default_timeout,
            command_timeout: default_timeout,
        })
    }

    pub fn from_config(config: &Config) -> DataAccessResult<Self> {
        Ok(Self::new(&config.database_url)?
            .with_timeouts(config.connect_timeout, config.command_timeout))
    }

    pub fn with_timeouts(mut self, connect_timeout: Duration, command_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.command_timeout = command_timeout;
        self
    }

    /// Opens a dedicated connection. Callers own it and must hand it to `release`.
    pub async fn connect(&self) -> DataAccessResult<PgConnection> {
        match tokio::time::timeout(self.connect_timeout, PgConnection::connect_with(&self.options))
            .await
        {
            Ok(Ok(conn)) => Ok(conn),
            Ok(Err(e)) => Err(DataAccessError::Connect(e)),
            Err(_) => Err(DataAccessError::Timeout {
                operation: "connect".to_string(),
                timeout: self.connect_timeout,
            }),
        }
    }

    /// Runs one procedure on a fresh connection.
    ///
    /// The connection is closed before the outcome is returned. On timeout it is dropped
    /// instead, which tears the socket down without waiting on the server.
    async fn call(&self, call: &ProcedureCall, fetch: Fetch) -> DataAccessResult<Vec<PgRow>> {
        tracing::debug!(procedure = call.name(), args = call.args().len(), "invoking stored procedure");
        let mut conn = self.connect().await?;

        let outcome = tokio::time::timeout(self.command_timeout, async {
            match fetch {
                Fetch::All => call.fetch_all(&mut conn).await,
                Fetch::First => call
                    .fetch_first(&mut conn)
                    .await
                    .map(|row| row.into_iter().collect()),
            }
        })
        .await;

        match outcome {
            Ok(result) => {
                release(conn).await;
                result.map_err(DataAccessError::procedure(call.name()))
            }
            Err(_) => {
                drop(conn);
                Err(DataAccessError::Timeout {
                    operation: format!("stored procedure {}", call.name()),
                    timeout: self.command_timeout,
                })
            }
        }
    }

    async fn call_for_count(&self, call: &ProcedureCall) -> DataAccessResult<u64> {
        let rows = self.call(call, Fetch::First).await?;
        match rows.first() {
            Some(row) => affected_rows(row, 0).map_err(DataAccessError::procedure(call.name())),
            None => Ok(0),
        }
    }
}

pub async fn release(conn: PgConnection) {
    if let Err(e) = conn.close().await {
        tracing::debug!(error = %e, "connection did not close cleanly; socket dropped");
    }
}

#[async_trait]
impl WidgetStore for DataLayer {
    async fn list_widgets(&self) -> DataAccessResult<Vec<Widget>> {
        let rows = self
            .call(&ProcedureCall::new(SP_GET_WIDGETS), Fetch::All)
            .await?;
        rows.iter()
            .map(|row| LIST_COLUMNS.decode(row))
            .collect::<Result<Vec<_>, _>>()
            .map_err(DataAccessError::procedure(SP_GET_WIDGETS))
    }

    async fn get_widget_by_id(&self, id: i32) -> DataAccessResult<Option<Widget>> {
        let call = ProcedureCall::new(SP_GET_A_WIDGET).arg("aid", id);
        let rows = self.call(&call, Fetch::First).await?;
        rows.first()
            .map(|row| SINGLE_COLUMNS.decode(row))
            .transpose()
            .map_err(DataAccessError::procedure(SP_GET_A_WIDGET))
    }

    async fn insert_widget(&self, widget: Option<&Widget>) -> DataAccessResult<Option<Widget>> {
        let widget = widget.ok_or(DataAccessError::InvalidArgument(NULL_WIDGET))?;

        let call = ProcedureCall::new(SP_INSERT_WIDGET)
            .arg("wid", widget.id)
            .arg("wname", widget.name.as_str())
            .arg("wdescription", widget.description.as_deref())
            .arg("wcost", widget.cost)
            .arg("wlocation", widget.location.as_deref());
        let rows = self.call(&call, Fetch::First).await?;

        let Some(row) = rows.first() else {
            return Ok(None);
        };
        let affected = affected_rows(row, "affected")
            .map_err(DataAccessError::procedure(SP_INSERT_WIDGET))?;
        if affected == 0 {
            return Ok(None);
        }

        // The output parameter is the only source of the new id; the caller's id is a placeholder.
        let aid: Option<i32> = row
            .try_get("aid")
            .map_err(DataAccessError::procedure(SP_INSERT_WIDGET))?;
        let aid = aid.ok_or(DataAccessError::MissingOutput {
            procedure: SP_INSERT_WIDGET,
            parameter: "aid",
        })?;
        Ok(Some(widget.with_id(aid)))
    }

    async fn update_widget(&self, id: i32, widget: Option<&Widget>) -> DataAccessResult<u64> {
        let widget = widget.ok_or(DataAccessError::InvalidArgument(NULL_WIDGET))?;

        let call = ProcedureCall::new(SP_UPDATE_WIDGET)
            .arg("wid", id)
            .arg("wname", widget.name.as_str())
            .arg("wdescription", widget.description.as_deref())
            .arg("wcost", widget.cost)
            .arg("wlocation", widget.location.as_deref());
        self.call_for_count(&call).await
    }

    async fn delete_widget(&self, id: i32) -> DataAccessResult<u64> {
        let call = ProcedureCall::new(SP_DELETE_WIDGET).arg("aid", id);
        self.call_for_count(&call).await
    }

    async fn ping(&self) -> DataAccessResult<()> {
        let conn = self.connect().await?;
        release(conn).await;
        Ok(())
    }
}
