//! Mapping from Rust field types to SQLite storage classes.
//!
//! The derive macro classifies every scalar field into a [`SemanticType`] at compile
//! time; [`TypeMapper`] turns that classification into the [`StorageType`] used in DDL
//! plus the flags the SQL generator needs when rendering values.

use serde::Serialize;

/// SQLite storage class of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StorageType {
    /// Signed integer (also booleans and dates).
    Integer,
    /// Floating point.
    Real,
    /// UTF-8 text.
    Text,
    /// Raw bytes.
    Blob,
}

impl StorageType {
    /// Get the SQL type name used in `CREATE TABLE`.
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            StorageType::Integer => "INTEGER",
            StorageType::Real => "REAL",
            StorageType::Text => "TEXT",
            StorageType::Blob => "BLOB",
        }
    }
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Declared meaning of a scalar field, as seen by the derive macro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticType {
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    Float32,
    Float64,
    Text,
    /// A point in time, persisted as epoch milliseconds.
    Date,
    /// `Vec<u8>`, persisted as-is.
    Bytes,
    /// Any other type; persisted as an opaque serialized blob.
    Object,
}

/// Result of mapping a [`SemanticType`] to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMapping {
    pub storage_type: StorageType,
    /// Value is an epoch-millisecond integer.
    pub is_date: bool,
    /// Value is a serialized object rather than raw bytes.
    pub is_blob_object: bool,
}

impl TypeMapping {
    const fn plain(storage_type: StorageType) -> Self {
        Self {
            storage_type,
            is_date: false,
            is_blob_object: false,
        }
    }
}

/// Maps semantic field types to storage classes.
///
/// There is no failure path: anything the mapper does not recognize is stored as a
/// serialized BLOB.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeMapper;

impl TypeMapper {
    #[must_use]
    pub const fn map(semantic: SemanticType) -> TypeMapping {
        match semantic {
            SemanticType::Boolean
            | SemanticType::Int8
            | SemanticType::Int16
            | SemanticType::Int32
            | SemanticType::Int64
            | SemanticType::UInt8
            | SemanticType::UInt16
            | SemanticType::UInt32 => TypeMapping::plain(StorageType::Integer),
            SemanticType::Float32 | SemanticType::Float64 => TypeMapping::plain(StorageType::Real),
            SemanticType::Text => TypeMapping::plain(StorageType::Text),
            SemanticType::Date => TypeMapping {
                storage_type: StorageType::Integer,
                is_date: true,
                is_blob_object: false,
            },
            SemanticType::Bytes => TypeMapping::plain(StorageType::Blob),
            SemanticType::Object => TypeMapping {
                storage_type: StorageType::Blob,
                is_date: false,
                is_blob_object: true,
            },
        }
    }

    /// Classify a Rust type by the last segment of its path.
    ///
    /// Used by the derive macro, which only sees type syntax. `Vec<u8>` must be
    /// recognized by the caller since the argument is not part of the name.
    #[must_use]
    pub fn classify(type_name: &str) -> SemanticType {
        match type_name {
            "bool" => SemanticType::Boolean,
            "i8" => SemanticType::Int8,
            "i16" => SemanticType::Int16,
            "i32" => SemanticType::Int32,
            "i64" => SemanticType::Int64,
            "u8" => SemanticType::UInt8,
            "u16" => SemanticType::UInt16,
            "u32" => SemanticType::UInt32,
            "f32" => SemanticType::Float32,
            "f64" => SemanticType::Float64,
            "String" | "char" => SemanticType::Text,
            "DateTime" | "SystemTime" => SemanticType::Date,
            _ => SemanticType::Object,
        }
    }
}
