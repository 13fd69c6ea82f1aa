//! Schema-to-flags binding.
//!
//! [`CommandBuilder`] turns a request [`Schema`] into a clap [`Command`] with
//! one flag per field, and a [`RequestFactory`] that rebuilds the request from
//! the parsed matches. Flags added by the command itself pass through
//! untouched as [`ExtraFlags`].

use std::any::Any;
use std::collections::{BTreeMap, HashSet};

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgGroup, ArgMatches, Command};
use tracing::{debug, instrument};

use crate::application::ApplicationResult;
use crate::domain::{
    resolve, DomainError, DomainResult, FieldDecl, FlagType, Request, ResolvedType, Schema, Value,
};

/// Builds a command definition from a schema plus command-specific flags.
///
/// ```ignore
/// let bound = CommandBuilder::new("teams")
///     .about("Team data")
///     .with_schema(schema)
///     .with_extra_flags(page_mode_flags())
///     .build()?;
/// ```
#[derive(Debug)]
pub struct CommandBuilder {
    name: String,
    about: Option<String>,
    schema: Option<Schema>,
    extra_flags: Vec<Arg>,
}

impl CommandBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            about: None,
            schema: None,
            extra_flags: Vec::new(),
        }
    }

    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Add a flag that belongs to the command, not to the request schema.
    pub fn with_extra_flag(mut self, arg: Arg) -> Self {
        self.extra_flags.push(arg);
        self
    }

    pub fn with_extra_flags(mut self, args: impl IntoIterator<Item = Arg>) -> Self {
        self.extra_flags.extend(args);
        self
    }

    /// Generate the flags and the request factory.
    ///
    /// Fails if a field type has no flag encoding, or if two flags would
    /// share a name.
    #[instrument(level = "debug", skip(self), fields(command = %self.name))]
    pub fn build(self) -> ApplicationResult<BoundCommand> {
        let schema = match self.schema {
            Some(schema) => schema,
            None => Schema::builder(self.name.clone()).build()?,
        };

        let mut command = Command::new(self.name.clone());
        if let Some(about) = self.about {
            command = command.about(about);
        }

        let mut names = FlagNames::new(&self.name);
        let mut bindings = Vec::with_capacity(schema.fields().len());
        for field in schema.fields() {
            let resolved = resolve(&field.type_spec).map_err(|e| e.for_field(&field.name))?;
            let binding = FlagBinding {
                field: field.name.clone(),
                flag: field.flag_name(),
                resolved,
                toggle: field.type_spec.is_bool(),
            };
            for arg in binding.args(field) {
                names.claim(&arg)?;
                command = command.arg(arg);
            }
            if binding.toggle && field.is_mandatory() {
                command = command.group(
                    ArgGroup::new(format!("{}-toggle", field.name))
                        .args([binding.field.clone(), binding.negated_id()])
                        .required(true),
                );
            }
            debug!(
                field = %field.name,
                flag = %binding.flag,
                flag_type = %binding.resolved.flag_type,
                repeatable = binding.resolved.repeatable,
                "bound field"
            );
            bindings.push(binding);
        }

        for arg in self.extra_flags {
            names.claim(&arg)?;
            command = command.arg(arg);
        }

        Ok(BoundCommand {
            command,
            factory: RequestFactory { schema, bindings },
        })
    }
}

/// Tracks ids and long names already used by a command.
struct FlagNames<'a> {
    command: &'a str,
    ids: HashSet<String>,
    longs: HashSet<String>,
}

impl<'a> FlagNames<'a> {
    fn new(command: &'a str) -> Self {
        Self {
            command,
            ids: HashSet::new(),
            longs: HashSet::new(),
        }
    }

    fn claim(&mut self, arg: &Arg) -> DomainResult<()> {
        let id = arg.get_id().as_str().to_string();
        let long = arg.get_long().map(str::to_string);
        let command = self.command;
        let duplicate = |flag: String| DomainError::DuplicateFlag {
            command: command.to_string(),
            flag,
        };
        if self.ids.contains(&id) {
            return Err(duplicate(long.unwrap_or(id)));
        }
        if let Some(long) = &long {
            if self.longs.contains(long) {
                return Err(duplicate(long.clone()));
            }
            self.longs.insert(long.clone());
        }
        self.ids.insert(id);
        Ok(())
    }
}

/// How one schema field maps onto command-line flags.
#[derive(Debug, Clone)]
pub struct FlagBinding {
    /// Field name; also the clap id of the (positive) flag.
    pub field: String,
    /// Long flag name without leading dashes.
    pub flag: String,
    pub resolved: ResolvedType,
    /// Bound as a `--flag/--no-flag` pair.
    pub toggle: bool,
}

impl FlagBinding {
    /// Clap id of the `--no-<flag>` half of a toggle pair.
    ///
    /// Hyphenated, so it can never collide with a field name.
    pub fn negated_id(&self) -> String {
        format!("no-{}", self.flag)
    }

    fn args(&self, field: &FieldDecl) -> Vec<Arg> {
        if self.toggle {
            let (on, off) = toggle_pair(
                &self.field,
                &self.flag,
                &self.negated_id(),
                &format!("no-{}", self.flag),
            );
            return vec![on.help(field.description.clone()), off];
        }

        let flag_type = &self.resolved.flag_type;
        let mut arg = Arg::new(self.field.clone())
            .long(self.flag.clone())
            .help(field.description.clone())
            .value_parser(clap::value_parser!(String))
            .value_names(flag_type.value_names())
            .num_args(flag_type.arity())
            .required(field.is_mandatory())
            .action(if self.resolved.repeatable {
                ArgAction::Append
            } else {
                ArgAction::Set
            });
        if let Some(default) = &field.default {
            let tokens = default.to_tokens();
            if !tokens.is_empty() {
                arg = arg.default_values(tokens);
            }
        }
        vec![arg]
    }

    /// Typed value given on the command line, or `None` to fall back to the
    /// field's default.
    fn read(&self, matches: &ArgMatches) -> DomainResult<Option<Value>> {
        if self.toggle {
            return Ok(toggle_state(matches, &self.field, &self.negated_id()).map(Value::Bool));
        }
        if !given(matches, &self.field) {
            return Ok(None);
        }

        let occurrences: Vec<Vec<&str>> = matches
            .get_occurrences::<String>(&self.field)
            .map(|occ| occ.map(|values| values.map(String::as_str).collect()).collect())
            .unwrap_or_default();

        let flag_type = &self.resolved.flag_type;
        let value = if self.resolved.repeatable {
            let items = occurrences
                .iter()
                .flatten()
                .map(|raw| Value::parse(flag_type, raw, &self.flag))
                .collect::<DomainResult<Vec<_>>>()?;
            Value::List(items)
        } else {
            let last = occurrences.last().map(Vec::as_slice).unwrap_or_default();
            match flag_type {
                FlagType::Composite(parts) => Value::parse_composite(parts, last, &self.flag)?,
                scalar => match last {
                    [raw] => Value::parse(scalar, raw, &self.flag)?,
                    _ => {
                        return Err(DomainError::FlagFormat {
                            flag: self.flag.clone(),
                            value: last.join(" "),
                            expected: scalar.to_string(),
                        })
                    }
                },
            }
        };
        Ok(Some(value))
    }
}

/// `--<on_long>` / `--<off_long>` flag pair; whichever is given last wins.
pub fn toggle_pair(on_id: &str, on_long: &str, off_id: &str, off_long: &str) -> (Arg, Arg) {
    let on = Arg::new(on_id.to_string())
        .long(on_long.to_string())
        .action(ArgAction::SetTrue)
        .overrides_with(off_id.to_string());
    let off = Arg::new(off_id.to_string())
        .long(off_long.to_string())
        .action(ArgAction::SetTrue)
        .overrides_with(on_id.to_string());
    (on, off)
}

/// State of a toggle pair: `Some(true)` if `on` was given last,
/// `Some(false)` if `off` was, `None` if neither.
pub fn toggle_state(matches: &ArgMatches, on_id: &str, off_id: &str) -> Option<bool> {
    if given(matches, on_id) && matches.get_flag(on_id) {
        Some(true)
    } else if given(matches, off_id) && matches.get_flag(off_id) {
        Some(false)
    } else {
        None
    }
}

fn given(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

/// A command definition together with the factory that reads its requests back.
#[derive(Debug, Clone)]
pub struct BoundCommand {
    command: Command,
    factory: RequestFactory,
}

impl BoundCommand {
    pub fn name(&self) -> &str {
        self.command.get_name()
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn factory(&self) -> &RequestFactory {
        &self.factory
    }

    pub fn into_parts(self) -> (Command, RequestFactory) {
        (self.command, self.factory)
    }
}

/// Rebuilds schema requests from parsed matches.
#[derive(Debug, Clone)]
pub struct RequestFactory {
    schema: Schema,
    bindings: Vec<FlagBinding>,
}

impl RequestFactory {
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn bindings(&self) -> &[FlagBinding] {
        &self.bindings
    }

    /// Long names of the schema-generated flags, one per field, in field order.
    pub fn flag_names(&self) -> Vec<&str> {
        self.bindings.iter().map(|b| b.flag.as_str()).collect()
    }

    /// Build the request from the schema's share of `matches`.
    ///
    /// Values are parsed under their resolved flag type, so malformed text
    /// fails here with [`DomainError::FlagFormat`], before anything is fetched.
    pub fn reconstruct<'m>(&self, matches: &'m ArgMatches) -> ApplicationResult<Invocation<'m>> {
        let mut values = BTreeMap::new();
        for binding in &self.bindings {
            if let Some(value) = binding.read(matches)? {
                values.insert(binding.field.clone(), value);
            }
        }
        debug!(schema = self.schema.name(), given = values.len(), "reconstructing request");
        let request = self.schema.construct(values)?;

        let schema_ids = self
            .bindings
            .iter()
            .flat_map(|b| {
                let mut ids = vec![b.field.clone()];
                if b.toggle {
                    ids.push(b.negated_id());
                }
                ids
            })
            .collect();
        Ok(Invocation {
            request,
            extras: ExtraFlags {
                matches,
                schema_ids,
            },
        })
    }
}

/// A reconstructed request plus the command's own flags.
#[derive(Debug)]
pub struct Invocation<'m> {
    pub request: Request,
    pub extras: ExtraFlags<'m>,
}

/// Parsed values that do not belong to the request schema.
#[derive(Debug)]
pub struct ExtraFlags<'m> {
    matches: &'m ArgMatches,
    schema_ids: HashSet<String>,
}

impl<'m> ExtraFlags<'m> {
    /// Ids of the parsed command-specific arguments.
    pub fn ids(&self) -> Vec<&'m str> {
        self.matches
            .ids()
            .map(|id| id.as_str())
            .filter(|id| !self.schema_ids.contains(*id))
            .collect()
    }

    /// False for schema fields and for ids the command never defined.
    pub fn get_flag(&self, id: &str) -> bool {
        self.get_one::<bool>(id).copied().unwrap_or(false)
    }

    /// `None` for schema fields, undefined ids and values of another type.
    pub fn get_one<T: Any + Clone + Send + Sync + 'static>(&self, id: &str) -> Option<&'m T> {
        if self.schema_ids.contains(id) {
            return None;
        }
        self.matches.try_get_one::<T>(id).ok().flatten()
    }

    /// See [`toggle_state`].
    pub fn toggle(&self, on_id: &str, off_id: &str) -> Option<bool> {
        toggle_state(self.matches, on_id, off_id)
    }
}
