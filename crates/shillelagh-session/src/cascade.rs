//! Relationship-aware inserts.
//!
//! Walks an instance graph depth-first and writes rows in the order their foreign
//! keys require:
//!
//! - one-to-one targets are inserted before their owner, so the owner's row can
//!   carry the target's generated id;
//! - one-to-many targets are inserted after their owner, each with its foreign-key
//!   field set to the owner's generated id.
//!
//! Ids are written back onto the instances as soon as each row is inserted. The
//! values they replace are kept, in write order, so a rolled-back graph can be put
//! back the way the caller passed it in.

use std::collections::VecDeque;

use shillelagh_core::{
    Connection, Error, Model, Operation, Related, RelationshipKind, Result, SchemaErrorKind,
    TableRegistry,
};
use shillelagh_query::{InsertBuilder, StatementMode};

/// An id value overwritten on an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Overwritten {
    RowId(Option<i64>),
    ForeignKey(Option<i64>),
}

/// Inserts one instance graph through a connection.
pub(crate) struct GraphInserter<'a, C: Connection> {
    conn: &'a C,
    registry: &'a TableRegistry,
    mode: StatementMode,
    overwritten: Vec<Overwritten>,
}

impl<'a, C: Connection> GraphInserter<'a, C> {
    pub(crate) fn new(conn: &'a C, registry: &'a TableRegistry, mode: StatementMode) -> Self {
        Self {
            conn,
            registry,
            mode,
            overwritten: Vec::new(),
        }
    }

    /// Rows written and not restored.
    pub(crate) fn rows(&self) -> usize {
        self.overwritten
            .iter()
            .filter(|o| matches!(o, Overwritten::RowId(_)))
            .count()
    }

    /// Insert `node` and everything reachable from it. Returns the node's id.
    pub(crate) fn insert_node(&mut self, node: &mut dyn Model) -> Result<i64> {
        let table = self.registry.resolve(&node.info(), Operation::Insert)?;

        for rel in table.relationships_of(RelationshipKind::OneToOne) {
            if let Related::One(target) = node.related_mut(rel.field_name) {
                self.insert_node(target)?;
            }
        }

        let stmt = InsertBuilder::from_model(&table, node)?.mode(self.mode).build();
        tracing::debug!(
            table = table.table_name(),
            sql = %stmt.sql,
            params = stmt.params.len(),
            "Executing INSERT"
        );
        self.conn
            .execute(&stmt.sql, &stmt.params)
            .map_err(|e| e.with_sql(&stmt.sql))?;

        let id = self.conn.query_last_inserted_id(table.table_name())?;
        self.overwritten.push(Overwritten::RowId(node.row_id()));
        node.set_row_id(id);
        tracing::debug!(table = table.table_name(), id, "Assigned generated id");

        for rel in table.relationships_of(RelationshipKind::OneToMany) {
            if let Related::Many(targets) = node.related_mut(rel.field_name) {
                for target in targets {
                    let Some(previous) = target.replace_foreign_key(&rel.foreign_key_column_name, Some(id))
                    else {
                        return Err(Error::schema(
                            SchemaErrorKind::MissingForeignKey,
                            rel.target_table.clone(),
                            format!(
                                "instance has no field for foreign key `{}`",
                                rel.foreign_key_column_name
                            ),
                        ));
                    };
                    self.overwritten.push(Overwritten::ForeignKey(previous));
                    self.insert_node(target)?;
                }
            }
        }

        Ok(id)
    }

    /// Put back every id this inserter wrote onto `node`'s graph.
    ///
    /// `node` must be the graph last passed to [`insert_node`](Self::insert_node),
    /// unchanged in shape since.
    pub(crate) fn restore(&mut self, node: &mut dyn Model) {
        let mut pending: VecDeque<Overwritten> = std::mem::take(&mut self.overwritten).into();
        restore_node(self.registry, node, &mut pending);
        if !pending.is_empty() {
            tracing::warn!(left = pending.len(), "Graph changed shape before ids were restored");
        }
    }
}

/// Replays the walk of `insert_node`, consuming overwritten values in write order.
/// Returns `false` once nothing is left to restore.
fn restore_node(registry: &TableRegistry, node: &mut dyn Model, pending: &mut VecDeque<Overwritten>) -> bool {
    let Ok(table) = registry.resolve(&node.info(), Operation::Insert) else {
        return false;
    };

    for rel in table.relationships_of(RelationshipKind::OneToOne) {
        if let Related::One(target) = node.related_mut(rel.field_name) {
            if !restore_node(registry, target, pending) {
                return false;
            }
        }
    }

    match pending.front() {
        Some(Overwritten::RowId(previous)) => {
            node.reset_row_id(*previous);
            pending.pop_front();
        }
        _ => return false,
    }

    for rel in table.relationships_of(RelationshipKind::OneToMany) {
        if let Related::Many(targets) = node.related_mut(rel.field_name) {
            for target in targets {
                match pending.front() {
                    Some(Overwritten::ForeignKey(previous)) => {
                        target.replace_foreign_key(&rel.foreign_key_column_name, *previous);
                        pending.pop_front();
                    }
                    _ => return false,
                }
                if !restore_node(registry, target, pending) {
                    return false;
                }
            }
        }
    }

    !pending.is_empty()
}
