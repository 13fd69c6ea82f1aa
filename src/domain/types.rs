//! Field type declarations and their command-line flag encodings.
//!
//! A [`TypeSpec`] is declared once per schema field at startup. [`resolve`]
//! maps it to the [`FlagType`] the flag parser uses, plus whether the flag may
//! be given more than once.

use std::fmt;

use itertools::Itertools;

use crate::domain::error::{DomainError, DomainResult};

/// The only date format accepted on the command line.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Primitive field kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    Int,
    Float,
    String,
    Date,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Int => "int",
            ScalarKind::Float => "float",
            ScalarKind::String => "string",
            ScalarKind::Date => "date",
        };
        f.write_str(name)
    }
}

/// Declared type of a schema field.
///
/// Use the constructor functions rather than the variants directly:
/// [`TypeSpec::optional`] collapses optional-of-optional and
/// [`TypeSpec::union`] collapses single-alternative unions, so the
/// invariants hold for every value built through them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeSpec {
    Scalar(ScalarKind),
    Optional(Box<TypeSpec>),
    List(Box<TypeSpec>),
    Tuple(Vec<TypeSpec>),
    /// Two or more non-null alternatives. Declarable, never bindable.
    Union(Vec<TypeSpec>),
}

impl TypeSpec {
    pub fn bool() -> Self {
        TypeSpec::Scalar(ScalarKind::Bool)
    }

    pub fn int() -> Self {
        TypeSpec::Scalar(ScalarKind::Int)
    }

    pub fn float() -> Self {
        TypeSpec::Scalar(ScalarKind::Float)
    }

    pub fn string() -> Self {
        TypeSpec::Scalar(ScalarKind::String)
    }

    pub fn date() -> Self {
        TypeSpec::Scalar(ScalarKind::Date)
    }

    /// `inner` or absent. `optional(optional(T))` is `optional(T)`.
    pub fn optional(inner: TypeSpec) -> Self {
        match inner {
            TypeSpec::Optional(_) => inner,
            other => TypeSpec::Optional(Box::new(other)),
        }
    }

    pub fn list(inner: TypeSpec) -> Self {
        TypeSpec::List(Box::new(inner))
    }

    pub fn tuple(items: impl IntoIterator<Item = TypeSpec>) -> Self {
        TypeSpec::Tuple(items.into_iter().collect())
    }

    /// Union of alternatives.
    ///
    /// Nested unions are flattened and duplicates dropped. Optional
    /// alternatives make the whole union optional. A single remaining
    /// alternative is returned as-is instead of a one-element union.
    pub fn union(alternatives: impl IntoIterator<Item = TypeSpec>) -> Self {
        let mut nullable = false;
        let mut alts: Vec<TypeSpec> = Vec::new();
        flatten_union(alternatives, &mut alts, &mut nullable);

        let spec = if alts.len() == 1 {
            alts.remove(0)
        } else {
            TypeSpec::Union(alts)
        };
        if nullable {
            TypeSpec::optional(spec)
        } else {
            spec
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, TypeSpec::Optional(_))
    }

    /// Strip one optional layer, if any.
    pub fn non_null(&self) -> &TypeSpec {
        match self {
            TypeSpec::Optional(inner) => inner,
            other => other,
        }
    }

    /// True for `bool` and `optional<bool>`; these bind to toggle pairs.
    pub fn is_bool(&self) -> bool {
        matches!(self.non_null(), TypeSpec::Scalar(ScalarKind::Bool))
    }
}

fn flatten_union(
    alternatives: impl IntoIterator<Item = TypeSpec>,
    out: &mut Vec<TypeSpec>,
    nullable: &mut bool,
) {
    for alt in alternatives {
        match alt {
            TypeSpec::Optional(inner) => {
                *nullable = true;
                flatten_union([*inner], out, nullable);
            }
            TypeSpec::Union(inner) => flatten_union(inner, out, nullable),
            other => {
                if !out.contains(&other) {
                    out.push(other);
                }
            }
        }
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpec::Scalar(kind) => write!(f, "{kind}"),
            TypeSpec::Optional(inner) => write!(f, "optional<{inner}>"),
            TypeSpec::List(inner) => write!(f, "list<{inner}>"),
            TypeSpec::Tuple(items) => write!(f, "tuple<{}>", items.iter().join(", ")),
            TypeSpec::Union(alts) => write!(f, "union<{}>", alts.iter().join(" | ")),
        }
    }
}

/// Primitive encoding a flag parser uses to interpret raw command-line text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FlagType {
    Bool,
    Int,
    Float,
    String,
    Date,
    /// Fixed number of values, one per component, given after a single flag.
    Composite(Vec<FlagType>),
}

impl FlagType {
    /// Number of command-line values one occurrence of the flag consumes.
    pub fn arity(&self) -> usize {
        match self {
            FlagType::Composite(parts) => parts.len(),
            _ => 1,
        }
    }

    /// Placeholder names shown in help, one per consumed value.
    pub fn value_names(&self) -> Vec<String> {
        match self {
            FlagType::Bool => vec!["BOOL".into()],
            FlagType::Int => vec!["INT".into()],
            FlagType::Float => vec!["FLOAT".into()],
            FlagType::String => vec!["TEXT".into()],
            FlagType::Date => vec!["YYYY-MM-DD".into()],
            FlagType::Composite(parts) => parts.iter().flat_map(FlagType::value_names).collect(),
        }
    }
}

impl From<ScalarKind> for FlagType {
    fn from(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::Bool => FlagType::Bool,
            ScalarKind::Int => FlagType::Int,
            ScalarKind::Float => FlagType::Float,
            ScalarKind::String => FlagType::String,
            ScalarKind::Date => FlagType::Date,
        }
    }
}

impl fmt::Display for FlagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagType::Bool => f.write_str("boolean"),
            FlagType::Int => f.write_str("integer"),
            FlagType::Float => f.write_str("number"),
            FlagType::String => f.write_str("string"),
            FlagType::Date => f.write_str("date (YYYY-MM-DD)"),
            FlagType::Composite(parts) => write!(f, "({})", parts.iter().join(", ")),
        }
    }
}

/// Outcome of [`resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    pub flag_type: FlagType,
    /// The flag may be given several times; occurrences are appended in order.
    pub repeatable: bool,
}

impl ResolvedType {
    fn single(flag_type: FlagType) -> Self {
        Self {
            flag_type,
            repeatable: false,
        }
    }
}

/// Map a declared field type to its flag encoding.
///
/// Total over [`TypeSpec`]: every declaration either resolves or fails with
/// [`DomainError::UnsupportedUnion`] / [`DomainError::UnsupportedNesting`].
/// Errors carry an empty field name; callers attach it with
/// `DomainError::for_field`.
pub fn resolve(spec: &TypeSpec) -> DomainResult<ResolvedType> {
    match spec {
        TypeSpec::Scalar(kind) => Ok(ResolvedType::single((*kind).into())),
        TypeSpec::Optional(inner) => resolve(inner),
        TypeSpec::Union(alts) => Err(DomainError::UnsupportedUnion {
            field: String::new(),
            alternatives: alts.len(),
        }),
        TypeSpec::List(inner) => {
            let element = resolve(inner)?;
            if element.repeatable || matches!(element.flag_type, FlagType::Composite(_)) {
                return Err(nesting(spec));
            }
            Ok(ResolvedType {
                flag_type: element.flag_type,
                repeatable: true,
            })
        }
        TypeSpec::Tuple(items) => {
            if items.is_empty() {
                return Err(nesting(spec));
            }
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                let part = resolve(item)?;
                if part.repeatable || matches!(part.flag_type, FlagType::Composite(_)) {
                    return Err(nesting(spec));
                }
                parts.push(part.flag_type);
            }
            Ok(ResolvedType::single(FlagType::Composite(parts)))
        }
    }
}

fn nesting(spec: &TypeSpec) -> DomainError {
    DomainError::UnsupportedNesting {
        field: String::new(),
        shape: spec.to_string(),
    }
}
