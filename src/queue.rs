//! Script routing, queueing and execution.
//!
//! [`SqlLibrary`] owns the SQL script catalog, the alias → connection-string
//! registry and the per-alias queue buffers. Queued text is expanded by the
//! macro engine, split into per-alias regions on `--DbType = ALIAS` markers
//! and accumulated until [`SqlLibrary::execute`] runs each alias's buffer in
//! `GO`-separated batches against its connection.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use rusqlite::fallible_iterator::FallibleIterator;
use rusqlite::{Batch, Connection};
use tracing::{debug, info};

use crate::error::{FixturaError, Result};
use crate::expand::expand;
use crate::library::Catalog;
use crate::registry::{ItemDictionary, ItemFileType};
use crate::replacement::{ReplacementSet, SqlValue};

lazy_static! {
    // A line consisting solely of GO separates batches within one alias.
    static ref BATCH_SEPARATOR_RE: Regex = Regex::new(r"(?m)^[ \t]*GO[ \t\r]*$").unwrap();
}

/// A single result row: column name/value pairs in driver-reported order.
#[derive(Debug, Clone)]
pub struct ResultRow {
    columns: Vec<(String, SqlValue)>,
}

impl ResultRow {
    /// The value of the named column, if present. Names are matched exactly
    /// as the driver reported them.
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(column, _)| column.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &SqlValue> {
        self.columns.iter().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// The SQL dictionary: catalog, connection registry and execution queue.
///
/// Strictly sequential: scripts queue and execute on the calling thread, and
/// a connection is opened and dropped within the scope of one alias's batch
/// run. Sharing an instance across threads is unsupported; callers serialize.
#[derive(Debug, Default)]
pub struct SqlLibrary {
    catalog: Catalog,
    /// Alias (upper-cased) → connection string.
    connections: BTreeMap<String, String>,
    /// Alias (upper-cased) → accumulated script buffer.
    queued: BTreeMap<String, String>,
}

impl SqlLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    /// Replaces the connection registry wholesale. Aliases are upper-cased
    /// at insertion so later lookups never compare case-insensitively.
    pub fn set_connections<I>(&mut self, connections: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.connections = connections
            .into_iter()
            .map(|(alias, connection_string)| (alias.to_uppercase(), connection_string))
            .collect();
    }

    /// The raw connection string for an alias. The error lists what is
    /// configured, since a missing alias usually means a typo in either the
    /// fixture marker or the test setup.
    pub fn connection(&self, alias: &str) -> Result<&str> {
        let alias = alias.to_uppercase();
        match self.connections.get(&alias) {
            Some(connection_string) => Ok(connection_string),
            None => Err(FixturaError::ConnectionNotFound {
                alias,
                configured: self.configured_aliases(),
            }),
        }
    }

    fn configured_aliases(&self) -> String {
        self.connections
            .keys()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn ensure_connections(&self) -> Result<()> {
        if self.connections.is_empty() {
            return Err(FixturaError::Configuration(
                "Scripts can only be queued once connections have been configured.".to_owned(),
            ));
        }
        Ok(())
    }

    /// The marker expression splitting expanded text into per-alias regions,
    /// built from the currently registered aliases.
    fn marker_expression(&self) -> String {
        let aliases = self
            .connections
            .keys()
            .map(|alias| regex::escape(alias))
            .collect::<Vec<_>>()
            .join("|");
        format!(r"(?i)--DbType\s*=\s*({aliases})")
    }

    /// Expands a catalog item and queues each of its `--DbType = ALIAS`
    /// regions onto the matching alias buffer, in order of appearance.
    pub fn queue_from_catalog(
        &mut self,
        key: &str,
        overrides: &ReplacementSet,
    ) -> Result<&mut Self> {
        self.ensure_connections()?;
        let text = self.catalog.get(key)?.to_owned();
        let expanded = expand(&text, overrides, &self.catalog)?;

        let marker_expression = self.marker_expression();
        let marker = Regex::new(&marker_expression).map_err(|e| {
            FixturaError::Configuration(format!(
                "Invalid db-type marker expression {marker_expression}: {e}"
            ))
        })?;
        let regions: Vec<(String, usize, usize)> = marker
            .captures_iter(&expanded)
            .map(|captures| {
                let whole = captures.get(0).unwrap();
                (captures[1].to_owned(), whole.start(), whole.end())
            })
            .collect();
        if regions.is_empty() {
            return Err(FixturaError::Configuration(format!(
                "The script \"{key}\" contains no recognizable db-type markers. \
                 Expected at least one marker matching {marker_expression}."
            )));
        }
        for (index, (alias, _, body_start)) in regions.iter().enumerate() {
            let body_end = regions
                .get(index + 1)
                .map(|(_, next_start, _)| *next_start)
                .unwrap_or(expanded.len());
            self.append(alias, &expanded[*body_start..body_end]);
        }
        Ok(self)
    }

    /// Appends raw text to the named alias's buffer, with no expansion or
    /// splitting. For ad hoc one-off statements against a known alias.
    pub fn queue_raw(&mut self, alias: &str, sql: &str) -> Result<&mut Self> {
        self.ensure_connections()?;
        self.append(alias, sql);
        Ok(self)
    }

    fn append(&mut self, alias: &str, body: &str) {
        let buffer = self.queued.entry(alias.to_uppercase()).or_default();
        if !buffer.is_empty() {
            buffer.push('\n');
        }
        buffer.push_str(body);
        debug!(alias, bytes = body.len(), "queued script fragment");
    }

    /// The currently buffered text for an alias, if any.
    pub fn queued_sql(&self, alias: &str) -> Option<&str> {
        self.queued
            .get(&alias.to_uppercase())
            .map(String::as_str)
            .filter(|buffer| !buffer.is_empty())
    }

    pub fn has_queued(&self) -> bool {
        self.queued.values().any(|buffer| !buffer.is_empty())
    }

    /// Executes every non-empty alias buffer in alias order and returns all
    /// produced rows in execution order. Each alias's buffer is cleared as
    /// soon as its run finishes, success or failure.
    pub fn execute(&mut self) -> Result<Vec<ResultRow>> {
        if !self.has_queued() {
            return Err(FixturaError::EmptyQueue);
        }
        let mut rows = Vec::new();
        let aliases: Vec<String> = self.queued.keys().cloned().collect();
        for alias in aliases {
            if self
                .queued
                .get(&alias)
                .map_or(true, |buffer| buffer.is_empty())
            {
                continue;
            }
            let connection_string = self.connection(&alias)?.to_owned();
            let sql = self
                .queued
                .get_mut(&alias)
                .map(std::mem::take)
                .unwrap_or_default();
            let produced = run_script(&connection_string, &sql)?;
            info!(alias = %alias, rows = produced.len(), "executed queued script");
            rows.extend(produced);
        }
        Ok(rows)
    }
}

impl ItemDictionary for SqlLibrary {
    fn file_extension(&self) -> &'static str {
        ".sql"
    }
    fn file_type(&self) -> ItemFileType {
        ItemFileType::Sql
    }
    fn catalog(&self) -> &Catalog {
        &self.catalog
    }
    fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

fn open_connection(connection_string: &str) -> rusqlite::Result<Connection> {
    if connection_string == ":memory:" {
        Connection::open_in_memory()
    } else {
        Connection::open(connection_string)
    }
}

/// Runs one alias's buffered script: the connection lives exactly as long
/// as this call, and any driver failure is wrapped together with the script
/// body that provoked it.
fn run_script(connection_string: &str, sql: &str) -> Result<Vec<ResultRow>> {
    let connection = open_connection(connection_string).map_err(|e| FixturaError::Execution {
        message: e.to_string(),
        script: sql.to_owned(),
    })?;
    let mut rows = Vec::new();
    for batch in BATCH_SEPARATOR_RE.split(sql) {
        if batch.trim().is_empty() {
            continue;
        }
        let produced = run_batch(&connection, batch).map_err(|e| FixturaError::Execution {
            message: e.to_string(),
            script: sql.to_owned(),
        })?;
        rows.extend(produced);
    }
    Ok(rows)
}

/// Runs the statements of one batch sequentially, collecting every row of
/// every result set in order.
fn run_batch(connection: &Connection, sql: &str) -> rusqlite::Result<Vec<ResultRow>> {
    let mut rows = Vec::new();
    let mut batch = Batch::new(connection, sql);
    while let Some(mut statement) = batch.next()? {
        let column_names: Vec<String> = statement
            .column_names()
            .into_iter()
            .map(str::to_owned)
            .collect();
        let mut produced = statement.query([])?;
        while let Some(row) = produced.next()? {
            let mut columns = Vec::with_capacity(column_names.len());
            for (index, name) in column_names.iter().enumerate() {
                let value: rusqlite::types::Value = row.get(index)?;
                columns.push((name.clone(), SqlValue::from(value)));
            }
            rows.push(ResultRow { columns });
        }
    }
    Ok(rows)
}
