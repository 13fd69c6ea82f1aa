//! Domain layer: field types, schemas, requests, fetch results
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod error;
pub mod result;
pub mod schema;
pub mod types;
pub mod value;

pub use error::{DomainError, DomainResult};
pub use result::{Cursor, FetchFailure, FetchResult, Page, Row};
pub use schema::{flag_name, FieldDecl, Request, Schema, SchemaBuilder};
pub use types::{resolve, FlagType, ResolvedType, ScalarKind, TypeSpec, DATE_FORMAT};
pub use value::Value;
