//! The table registry: builds `TableObject`s from model metadata and caches them.
//!
//! Descriptors live in an arena indexed by [`TableId`]; a `TypeId` map points into
//! it. A build reserves its slot before walking relationship fields, so a schema
//! that refers back to a type already being built (directly or through a cycle)
//! resolves to the reserved index instead of recursing again.
//!
//! Readers take the read lock only. A miss takes the write lock and re-checks
//! before building, so an entry is built at most once per registry.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{Error, Operation, Result, SchemaErrorKind, UnregisteredTableError};
use crate::field::FieldKind;
use crate::identifiers::validate_identifier;
use crate::model::ModelInfo;
use crate::relationship::{RelationshipDescriptor, RelationshipKind};
use crate::table::{TableColumn, TableId, TableObject};
use crate::types::TypeMapper;

/// Process-lifetime cache of table descriptors, keyed by model type.
///
/// Share it between facades with `Arc<TableRegistry>`.
#[derive(Debug, Default)]
pub struct TableRegistry {
    inner: RwLock<RegistryInner>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    by_type: HashMap<TypeId, TableId>,
    /// `None` while a build of that slot is in progress.
    tables: Vec<Option<Arc<TableObject>>>,
}

impl TableRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the descriptor for a model, building it on first use.
    ///
    /// `operation` is only used to word the error when the type has no table marker.
    pub fn resolve(&self, info: &ModelInfo, operation: Operation) -> Result<Arc<TableObject>> {
        if let Some(table) = self.cached(info.type_id) {
            return Ok(table);
        }

        let mut inner = self.write();
        if let Some(table) = inner.cached(info.type_id) {
            return Ok(table);
        }

        let mark = inner.tables.len();
        match inner.build(info, operation) {
            Ok(table) => Ok(table),
            Err(e) => {
                inner.discard_from(mark);
                Err(e)
            }
        }
    }

    /// Descriptor at an arena index (e.g. a relationship target).
    #[must_use]
    pub fn get(&self, id: TableId) -> Option<Arc<TableObject>> {
        self.read().tables.get(id.0).cloned().flatten()
    }

    /// Number of descriptors built so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().tables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cached(&self, type_id: TypeId) -> Option<Arc<TableObject>> {
        self.read().cached(type_id)
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RegistryInner {
    fn cached(&self, type_id: TypeId) -> Option<Arc<TableObject>> {
        let id = self.by_type.get(&type_id)?;
        self.tables.get(id.0).cloned().flatten()
    }

    /// Index for a relationship target: reserved, cached, or freshly built.
    fn ensure(&mut self, info: &ModelInfo, operation: Operation) -> Result<TableId> {
        if let Some(id) = self.by_type.get(&info.type_id) {
            return Ok(*id);
        }
        self.build(info, operation).map(|t| t.id())
    }

    fn build(&mut self, info: &ModelInfo, operation: Operation) -> Result<Arc<TableObject>> {
        let Some(table_name) = info.table else {
            return Err(Error::UnregisteredTable(UnregisteredTableError {
                type_name: info.type_name,
                operation,
            }));
        };
        validate_identifier(table_name, table_name)?;

        let id = TableId(self.tables.len());
        self.tables.push(None);
        self.by_type.insert(info.type_id, id);

        let mut id_column: Option<&'static str> = None;
        let mut columns = Vec::new();
        let mut relationships = Vec::new();

        for field in info.fields {
            match field.kind {
                FieldKind::Id => {
                    if let Some(existing) = id_column {
                        return Err(Error::schema(
                            SchemaErrorKind::DuplicateId,
                            table_name,
                            format!("both `{}` and `{}` are marked as id", existing, field.column_name),
                        ));
                    }
                    validate_identifier(table_name, field.column_name)?;
                    id_column = Some(field.column_name);
                }
                FieldKind::Scalar { semantic, nullable } => {
                    validate_identifier(table_name, field.column_name)?;
                    columns.push(TableColumn::new(
                        field.column_name,
                        TypeMapper::map(semantic),
                        nullable,
                    ));
                }
                FieldKind::ForeignKey { nullable } => {
                    validate_identifier(table_name, field.column_name)?;
                    columns.push(TableColumn::foreign_key(field.column_name, nullable));
                }
                FieldKind::OneToOne { target, nullable } => {
                    validate_identifier(table_name, field.column_name)?;
                    let target_info = target();
                    let target_id = self.ensure(&target_info, operation)?;
                    columns.push(TableColumn::foreign_key(field.column_name, nullable));
                    relationships.push(RelationshipDescriptor::new(
                        field.name,
                        RelationshipKind::OneToOne,
                        target_id,
                        target_info.table.unwrap_or_default(),
                        field.column_name,
                    ));
                }
                FieldKind::OneToMany {
                    target,
                    foreign_key,
                } => {
                    let target_info = target();
                    let target_id = self.ensure(&target_info, operation)?;
                    let target_table = target_info.table.unwrap_or_default();
                    let foreign_key = foreign_key
                        .map_or_else(|| format!("{}_id", table_name), str::to_string);
                    let declared = target_info.fields.iter().any(|f| {
                        f.column_name == foreign_key && matches!(f.kind, FieldKind::ForeignKey { .. })
                    });
                    if !declared {
                        return Err(Error::schema(
                            SchemaErrorKind::MissingForeignKey,
                            table_name,
                            format!(
                                "`{}` must declare a foreign_key field `{}` for relationship `{}`",
                                target_table, foreign_key, field.name
                            ),
                        ));
                    }
                    relationships.push(RelationshipDescriptor::new(
                        field.name,
                        RelationshipKind::OneToMany,
                        target_id,
                        target_table,
                        foreign_key,
                    ));
                }
            }
        }

        let Some(id_column) = id_column else {
            return Err(Error::schema(
                SchemaErrorKind::MissingId,
                table_name,
                "no field is marked as id",
            ));
        };

        let table = Arc::new(TableObject::new(
            id,
            info.type_name,
            table_name,
            id_column,
            columns,
            relationships,
        ));
        tracing::debug!(
            table = table_name,
            model = info.type_name,
            columns = table.columns().len(),
            relationships = table.relationships().len(),
            "Built table descriptor"
        );
        self.tables[id.0] = Some(Arc::clone(&table));
        Ok(table)
    }

    /// Forget every slot reserved at or after `mark`.
    fn discard_from(&mut self, mark: usize) {
        self.by_type.retain(|_, id| id.0 < mark);
        self.tables.truncate(mark);
    }
}
