//! The Shillelagh ORM facade.
//!
//! `Shillelagh` holds a storage connection and a table registry, and exposes the
//! public operations: create and drop tables, insert instance graphs, update single
//! rows, and look up table names.
//!
//! # Design Philosophy
//!
//! - **Explicit over implicit**: every statement runs when its operation is called;
//!   nothing is buffered.
//! - **Ownership clarity**: the facade owns the connection; the registry is shared
//!   through `Arc` so several facades can reuse the same table descriptors.
//! - **Ids flow back**: `insert` writes every generated id onto the instances it
//!   persisted.
//!
//! # Example
//!
//! ```ignore
//! let orm = Shillelagh::new(SqliteConnection::open_memory()?);
//! orm.create_table::<Author>()?;
//! orm.create_table::<Book>()?;
//!
//! let mut author = Author { id: None, name: "Ann".into(), books: vec![book] };
//! orm.insert(&mut author)?;
//! assert!(author.id.is_some());
//! ```

mod cascade;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shillelagh_core::{Connection, Error, Model, Operation, Result, TableObject, TableRegistry};
use shillelagh_query::{StatementMode, UpdateBuilder};
use shillelagh_schema::{create_table_sql, drop_table_sql};

use crate::cascade::GraphInserter;

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for facade behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShillelaghConfig {
    /// How values are rendered into INSERT and UPDATE statements.
    pub statement_mode: StatementMode,
    /// Wrap each insert graph in a transaction and roll it back on failure.
    ///
    /// A rolled-back graph gets its previous ids and foreign keys back. If the
    /// rollback itself fails, the instances keep the ids that were assigned.
    ///
    /// Off by default: rows written before a failing statement stay written.
    pub transactional_graphs: bool,
}

impl Default for ShillelaghConfig {
    fn default() -> Self {
        Self {
            statement_mode: StatementMode::Bound,
            transactional_graphs: false,
        }
    }
}

impl ShillelaghConfig {
    /// Set the statement rendering mode.
    pub const fn statement_mode(mut self, mode: StatementMode) -> Self {
        self.statement_mode = mode;
        self
    }

    /// Enable or disable transactional insert graphs.
    pub const fn transactional_graphs(mut self, enabled: bool) -> Self {
        self.transactional_graphs = enabled;
        self
    }
}

// ============================================================================
// Facade
// ============================================================================

/// The ORM facade over a storage connection.
pub struct Shillelagh<C: Connection> {
    connection: C,
    registry: Arc<TableRegistry>,
    config: ShillelaghConfig,
}

impl<C: Connection> Shillelagh<C> {
    /// Create a facade with a private registry and default configuration.
    pub fn new(connection: C) -> Self {
        Self::with_config(connection, ShillelaghConfig::default())
    }

    /// Create a facade with a private registry.
    pub fn with_config(connection: C, config: ShillelaghConfig) -> Self {
        Self::with_registry(connection, Arc::new(TableRegistry::new()), config)
    }

    /// Create a facade that shares an existing registry.
    pub fn with_registry(connection: C, registry: Arc<TableRegistry>, config: ShillelaghConfig) -> Self {
        Self {
            connection,
            registry,
            config,
        }
    }

    /// Get a reference to the underlying connection.
    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// Get the facade configuration.
    pub fn config(&self) -> &ShillelaghConfig {
        &self.config
    }

    /// Get the shared table registry.
    pub fn registry(&self) -> &Arc<TableRegistry> {
        &self.registry
    }

    /// Give back the connection.
    pub fn into_connection(self) -> C {
        self.connection
    }

    /// Table descriptor for `T`, built on first use.
    pub fn table_object<T: Model + 'static>(&self) -> Result<Arc<TableObject>> {
        self.registry.resolve(&T::model_info(), Operation::Lookup)
    }

    /// Table name for `T`.
    pub fn get_table_name<T: Model + 'static>(&self) -> Result<String> {
        self.table_object::<T>().map(|t| t.table_name().to_string())
    }

    /// Create the table for `T`.
    #[tracing::instrument(level = "debug", skip(self), fields(model = std::any::type_name::<T>()))]
    pub fn create_table<T: Model + 'static>(&self) -> Result<()> {
        let table = self.registry.resolve(&T::model_info(), Operation::CreateTable)?;
        let sql = create_table_sql(&table);

        tracing::info!(table = table.table_name(), "Creating table");
        self.connection
            .execute(&sql, &[])
            .map_err(|e| e.with_sql(&sql))?;
        Ok(())
    }

    /// Drop the table for `T`. Dropping a table that does not exist is not an error.
    #[tracing::instrument(level = "debug", skip(self), fields(model = std::any::type_name::<T>()))]
    pub fn drop_table<T: Model + 'static>(&self) -> Result<()> {
        let table = self.registry.resolve(&T::model_info(), Operation::DropTable)?;
        let sql = drop_table_sql(&table);

        tracing::info!(table = table.table_name(), "Dropping table");
        self.connection
            .execute(&sql, &[])
            .map_err(|e| e.with_sql(&sql))?;
        Ok(())
    }

    /// Insert `obj` and every instance reachable through its relationships.
    ///
    /// One-to-one targets are written before their owner, one-to-many targets after
    /// it. Generated ids are assigned onto each instance as it is written. Returns the
    /// id of `obj`.
    ///
    /// Without `transactional_graphs`, a failure part-way through leaves the rows
    /// already written in place, along with their ids on the instances. With it, a
    /// failed insert or commit is rolled back and every id and foreign key written
    /// onto the graph is put back to its value before the call.
    #[tracing::instrument(level = "debug", skip(self, obj), fields(model = std::any::type_name::<T>()))]
    pub fn insert<T: Model + 'static>(&self, obj: &mut T) -> Result<i64> {
        // Resolve the whole reachable schema before writing anything.
        let table = self.registry.resolve(&T::model_info(), Operation::Insert)?;

        let mut inserter = GraphInserter::new(&self.connection, &self.registry, self.config.statement_mode);

        let result = if self.config.transactional_graphs {
            self.connection.begin()?;
            let result = inserter
                .insert_node(obj)
                .and_then(|id| self.connection.commit().map(|()| id));
            if let Err(e) = &result {
                match self.connection.rollback() {
                    Ok(()) => {
                        tracing::debug!(rows = inserter.rows(), "Rolled back insert graph");
                        inserter.restore(obj);
                    }
                    Err(rollback) => {
                        tracing::warn!(error = %rollback, cause = %e, "Rollback after failed insert failed");
                    }
                }
            }
            result
        } else {
            inserter.insert_node(obj)
        };

        match &result {
            Ok(id) => tracing::info!(
                table = table.table_name(),
                id,
                rows = inserter.rows(),
                "Inserted object graph"
            ),
            Err(e) => tracing::warn!(
                table = table.table_name(),
                rows = inserter.rows(),
                error = %e,
                "Insert failed"
            ),
        }
        result
    }

    /// Update the row of `obj`, keyed by its current id. Relationships are not
    /// followed.
    #[tracing::instrument(level = "debug", skip(self, obj), fields(model = std::any::type_name::<T>()))]
    pub fn update<T: Model + 'static>(&self, obj: &T) -> Result<()> {
        let table = self.registry.resolve(&T::model_info(), Operation::Update)?;
        let id = obj.row_id().ok_or(Error::MissingRowId {
            type_name: std::any::type_name::<T>(),
        })?;

        let Some(stmt) = UpdateBuilder::from_model(&table, obj, id)?
            .mode(self.config.statement_mode)
            .build()
        else {
            tracing::debug!(table = table.table_name(), "No columns to update");
            return Ok(());
        };

        tracing::debug!(table = table.table_name(), id, sql = %stmt.sql, "Executing UPDATE");
        self.connection
            .execute(&stmt.sql, &stmt.params)
            .map_err(|e| e.with_sql(&stmt.sql))?;
        Ok(())
    }
}

impl<C: Connection + std::fmt::Debug> std::fmt::Debug for Shillelagh<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shillelagh")
            .field("connection", &self.connection)
            .field("tables", &self.registry.len())
            .field("config", &self.config)
            .finish()
    }
}
