//! Error types for Shillelagh operations.

use std::fmt;

/// The primary error type for all Shillelagh operations.
#[derive(Debug)]
pub enum Error {
    /// The model type has no table metadata.
    UnregisteredTable(UnregisteredTableError),
    /// Model metadata cannot be turned into a table.
    Schema(SchemaError),
    /// A BLOB object could not be encoded or decoded.
    Serialization(SerializationError),
    /// The storage engine rejected a statement.
    Query(QueryError),
    /// The storage engine could not be opened.
    Connection(ConnectionError),
    /// An update was requested for an instance that was never inserted.
    MissingRowId { type_name: &'static str },
}

/// The ORM operation that needed a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateTable,
    DropTable,
    Insert,
    Update,
    Lookup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnregisteredTableError {
    /// Fully qualified name of the offending type.
    pub type_name: &'static str,
    pub operation: Operation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    pub kind: SchemaErrorKind,
    /// Table (or type, when the table is unnamed) the error was found in.
    pub table: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorKind {
    /// No field carries the id marker.
    MissingId,
    /// More than one field carries the id marker.
    DuplicateId,
    /// A table or column name is not a plain SQL identifier.
    InvalidIdentifier,
    /// A one-to-many target does not declare the expected foreign-key field.
    MissingForeignKey,
}

#[derive(Debug)]
pub struct SerializationError {
    pub type_name: &'static str,
    pub source: serde_json::Error,
}

#[derive(Debug)]
pub struct QueryError {
    pub kind: QueryErrorKind,
    pub message: String,
    /// The statement that failed, when known.
    pub sql: Option<String>,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Syntax or unknown table/column.
    Syntax,
    /// Constraint violation.
    Constraint,
    /// A lookup expected a row and found none.
    NotFound,
    /// Anything else reported by the engine.
    Database,
}

#[derive(Debug)]
pub struct ConnectionError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Shorthand for a query error without an underlying source.
    pub fn query(kind: QueryErrorKind, message: impl Into<String>) -> Self {
        Error::Query(QueryError {
            kind,
            message: message.into(),
            sql: None,
            source: None,
        })
    }

    /// Shorthand for a schema error.
    pub fn schema(kind: SchemaErrorKind, table: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Schema(SchemaError {
            kind,
            table: table.into(),
            message: message.into(),
        })
    }

    /// Attach the failing statement to a query error that does not name one yet.
    #[must_use]
    pub fn with_sql(self, sql: &str) -> Self {
        match self {
            Error::Query(mut e) if e.sql.is_none() => {
                e.sql = Some(sql.to_string());
                Error::Query(e)
            }
            other => other,
        }
    }

    /// True when the failure is a missing table marker.
    #[must_use]
    pub const fn is_unregistered_table(&self) -> bool {
        matches!(self, Error::UnregisteredTable(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnregisteredTable(e) => write!(f, "{}", e),
            Error::Schema(e) => write!(f, "{}", e),
            Error::Serialization(e) => write!(f, "{}", e),
            Error::Query(e) => write!(f, "{}", e),
            Error::Connection(e) => write!(f, "{}", e),
            Error::MissingRowId { type_name } => {
                write!(f, "Unable to update {}: instance has no id", type_name)
            }
        }
    }
}

impl fmt::Display for UnregisteredTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self.operation {
            Operation::CreateTable => "create table for",
            Operation::DropTable => "drop table for",
            Operation::Insert => "insert into",
            Operation::Update => "update",
            Operation::Lookup => "find table for",
        };
        write!(
            f,
            "Unable to {} {}. Did you forget to call Shillelagh.createTable or are you missing @Table annotation?",
            action, self.type_name
        )
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid schema for {}: {}", self.table, self.message)
    }
}

impl fmt::Display for SerializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to serialize {}: {}", self.type_name, self.source)
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sql {
            Some(sql) => write!(f, "Query error: {} (sql: {})", self.message, sql),
            None => write!(f, "Query error: {}", self.message),
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Connection error: {}", self.message)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Serialization(e) => Some(&e.source),
            Error::Query(e) => e
                .source
                .as_ref()
                .map(|s| s.as_ref() as &(dyn std::error::Error + 'static)),
            Error::Connection(e) => e
                .source
                .as_ref()
                .map(|s| s.as_ref() as &(dyn std::error::Error + 'static)),
            _ => None,
        }
    }
}

impl std::error::Error for UnregisteredTableError {}
impl std::error::Error for SchemaError {}

impl From<UnregisteredTableError> for Error {
    fn from(err: UnregisteredTableError) -> Self {
        Error::UnregisteredTable(err)
    }
}

impl From<SchemaError> for Error {
    fn from(err: SchemaError) -> Self {
        Error::Schema(err)
    }
}

/// Result type alias for Shillelagh operations.
pub type Result<T> = std::result::Result<T, Error>;
