//! Integration tests for schema-to-flag binding and request reconstruction.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use clap::{Arg, ArgAction};
use rstest::rstest;

use natstat_cli::application::{ApplicationError, BoundCommand, CommandBuilder};
use natstat_cli::cli::catalog::{page_mode_flags, Catalog, ALL_PAGES, ONE_PAGE};
use natstat_cli::domain::{
    flag_name, DomainError, FieldDecl, ScalarKind, Schema, TypeSpec, Value,
};

fn games_command() -> BoundCommand {
    let schema = Schema::builder("games")
        .field(FieldDecl::new("sport", TypeSpec::string()).required())
        .field(FieldDecl::new("season", TypeSpec::optional(TypeSpec::int())))
        .field(FieldDecl::new("active", TypeSpec::bool()).default(true))
        .field(FieldDecl::new("teams", TypeSpec::list(TypeSpec::string())))
        .field(FieldDecl::new("date", TypeSpec::optional(TypeSpec::date())))
        .field(FieldDecl::new(
            "date_range",
            TypeSpec::optional(TypeSpec::tuple([TypeSpec::date(), TypeSpec::date()])),
        ))
        .build()
        .unwrap();
    CommandBuilder::new("games")
        .with_schema(schema)
        .with_extra_flags(page_mode_flags())
        .build()
        .unwrap()
}

fn date(y: i32, m: u32, d: u32) -> Value {
    Value::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

/// Some conforming value for a field that has no default.
fn sample(spec: &TypeSpec) -> Value {
    match spec {
        TypeSpec::Scalar(ScalarKind::Bool) => Value::Bool(true),
        TypeSpec::Scalar(ScalarKind::Int) => Value::Int(1),
        TypeSpec::Scalar(ScalarKind::Float) => Value::Float(1.5),
        TypeSpec::Scalar(ScalarKind::String) => Value::from("MBB"),
        TypeSpec::Scalar(ScalarKind::Date) => date(2024, 1, 1),
        TypeSpec::Optional(inner) => sample(inner),
        TypeSpec::List(inner) => Value::List(vec![sample(inner)]),
        TypeSpec::Tuple(items) => Value::Tuple(items.iter().map(sample).collect()),
        TypeSpec::Union(_) => panic!("unions are never bound"),
    }
}

/// Command line that spells out every field's default explicitly.
///
/// Mandatory fields get a sample value, returned alongside so the expected
/// request can be constructed from it.
fn explicit_argv(command: &str, schema: &Schema) -> (Vec<String>, BTreeMap<String, Value>) {
    let mut argv = vec![command.to_string()];
    let mut given = BTreeMap::new();
    for field in schema.fields() {
        let flag = flag_name(&field.name);
        let value = match &field.default {
            Some(default) => default.clone(),
            None if field.is_mandatory() => {
                let value = sample(&field.type_spec);
                given.insert(field.name.clone(), value.clone());
                value
            }
            None => continue,
        };
        match &value {
            Value::Null => {}
            Value::Bool(true) => argv.push(format!("--{flag}")),
            Value::Bool(false) => argv.push(format!("--no-{flag}")),
            Value::List(items) => {
                for item in items {
                    argv.push(format!("--{flag}"));
                    argv.extend(item.to_tokens());
                }
            }
            other => {
                argv.push(format!("--{flag}"));
                argv.extend(other.to_tokens());
            }
        }
    }
    (argv, given)
}

// ============================================================
// Flag generation
// ============================================================

#[test]
fn given_catalog_when_binding_then_flags_are_hyphenated_field_names() {
    let catalog = Catalog::build().unwrap();
    for command in catalog.iter() {
        let schema = command.bound.factory().schema();
        let expected: Vec<String> = schema.fields().iter().map(|f| flag_name(&f.name)).collect();
        let generated: Vec<&str> = command.bound.factory().flag_names();
        assert_eq!(generated, expected, "command {}", command.entry.name);

        let mut longs: Vec<&str> = command
            .bound
            .command()
            .get_arguments()
            .filter_map(Arg::get_long)
            .collect();
        let total = longs.len();
        longs.sort_unstable();
        longs.dedup();
        assert_eq!(longs.len(), total, "duplicate flag in {}", command.entry.name);
    }
}

#[test]
fn given_union_field_when_building_then_unsupported_union() {
    let schema = Schema::builder("teams")
        .field(FieldDecl::new(
            "season",
            TypeSpec::optional(TypeSpec::union([TypeSpec::int(), TypeSpec::string()])),
        ))
        .build()
        .unwrap();
    let err = CommandBuilder::new("teams").with_schema(schema).build().unwrap_err();
    match err {
        ApplicationError::Domain(DomainError::UnsupportedUnion { field, alternatives }) => {
            assert_eq!(field, "season");
            assert_eq!(alternatives, 2);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn given_list_of_tuples_when_building_then_unsupported_nesting() {
    let schema = Schema::builder("games")
        .field(FieldDecl::new(
            "windows",
            TypeSpec::list(TypeSpec::tuple([TypeSpec::date(), TypeSpec::date()])),
        ))
        .build()
        .unwrap();
    let err = CommandBuilder::new("games").with_schema(schema).build().unwrap_err();
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::UnsupportedNesting { .. })
    ));
}

#[test]
fn given_extra_flag_colliding_with_field_when_building_then_duplicate_flag() {
    let schema = Schema::builder("games")
        .field(FieldDecl::new("sport", TypeSpec::string()).required())
        .build()
        .unwrap();
    let err = CommandBuilder::new("games")
        .with_schema(schema)
        .with_extra_flag(Arg::new("sport_code").long("sport").action(ArgAction::Set))
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::DuplicateFlag { .. })
    ));
}

// ============================================================
// Reconstruction
// ============================================================

#[test]
fn given_no_flags_when_reconstructing_then_request_at_defaults() {
    let schema = Schema::builder("venues")
        .field(FieldDecl::new("active", TypeSpec::bool()).default(true))
        .field(FieldDecl::new("season", TypeSpec::optional(TypeSpec::int())).default(2024_i64))
        .field(FieldDecl::new("sport", TypeSpec::string()).default("MBB"))
        .field(FieldDecl::new("books", TypeSpec::list(TypeSpec::string())))
        .build()
        .unwrap();
    let bound = CommandBuilder::new("venues")
        .with_schema(schema.clone())
        .build()
        .unwrap();

    let matches = bound.command().clone().try_get_matches_from(["venues"]).unwrap();
    let invocation = bound.factory().reconstruct(&matches).unwrap();

    assert_eq!(invocation.request, schema.default_request().unwrap());
}

#[test]
fn given_every_default_spelled_out_when_reconstructing_then_request_at_defaults() {
    let schema = Schema::builder("perfs")
        .field(FieldDecl::new("min_minutes", TypeSpec::optional(TypeSpec::float())).default(10_i64))
        .field(FieldDecl::new("ratio", TypeSpec::float()).default(0.25))
        .field(FieldDecl::new("active", TypeSpec::bool()).default(false))
        .field(
            FieldDecl::new("window", TypeSpec::tuple([TypeSpec::date(), TypeSpec::int()]))
                .default(Value::Tuple(vec![date(2024, 2, 29), Value::Int(3)])),
        )
        .field(
            FieldDecl::new("splits", TypeSpec::list(TypeSpec::float()))
                .default(Value::List(vec![Value::Int(2), Value::Float(0.5)])),
        )
        .field(
            FieldDecl::new("books", TypeSpec::list(TypeSpec::string()))
                .default(Value::List(vec![Value::from("fanduel"), Value::from("dk")])),
        )
        .field(FieldDecl::new("season", TypeSpec::optional(TypeSpec::int())))
        .build()
        .unwrap();
    let bound = CommandBuilder::new("perfs")
        .with_schema(schema.clone())
        .build()
        .unwrap();
    let (argv, given) = explicit_argv("perfs", &schema);
    assert!(given.is_empty());
    assert!(argv.iter().any(|a| a == "--min-minutes"), "{argv:?}");

    let matches = bound.command().clone().try_get_matches_from(&argv).unwrap();
    let invocation = bound.factory().reconstruct(&matches).unwrap();

    assert_eq!(invocation.request, schema.default_request().unwrap(), "{argv:?}");
}

#[test]
fn given_catalog_defaults_spelled_out_when_reconstructing_then_request_at_defaults() {
    let catalog = Catalog::build().unwrap();
    for command in catalog.iter() {
        let schema = command.bound.factory().schema();
        let (argv, given) = explicit_argv(command.entry.name, schema);

        let matches = command
            .bound
            .command()
            .clone()
            .try_get_matches_from(&argv)
            .unwrap_or_else(|e| panic!("{argv:?}: {e}"));
        let invocation = command.bound.factory().reconstruct(&matches).unwrap();

        assert_eq!(invocation.request, schema.construct(given).unwrap(), "{argv:?}");
    }
}

#[rstest]
#[case(&["games", "--sport", "MBB"], true)]
#[case(&["games", "--sport", "MBB", "--active"], true)]
#[case(&["games", "--sport", "MBB", "--no-active"], false)]
#[case(&["games", "--sport", "MBB", "--no-active", "--active"], true)]
#[case(&["games", "--sport", "MBB", "--active", "--no-active"], false)]
fn given_toggle_flags_when_reconstructing_then_last_one_wins(
    #[case] args: &[&str],
    #[case] expected: bool,
) {
    let bound = games_command();
    let matches = bound.command().clone().try_get_matches_from(args).unwrap();
    let invocation = bound.factory().reconstruct(&matches).unwrap();
    assert_eq!(invocation.request.get("active"), Some(&Value::Bool(expected)));
}

#[test]
fn given_repeated_list_flag_when_reconstructing_then_all_values_in_order() {
    let bound = games_command();
    let matches = bound
        .command()
        .clone()
        .try_get_matches_from(["games", "--sport", "MBB", "--teams", "DUKE", "--teams", "UNC"])
        .unwrap();
    let invocation = bound.factory().reconstruct(&matches).unwrap();
    assert_eq!(
        invocation.request.get("teams"),
        Some(&Value::List(vec!["DUKE".into(), "UNC".into()]))
    );
    assert_eq!(invocation.request.get("season"), Some(&Value::Null));
}

#[test]
fn given_composite_flag_when_reconstructing_then_tuple_value() {
    let bound = games_command();
    let matches = bound
        .command()
        .clone()
        .try_get_matches_from([
            "games",
            "--sport",
            "MBB",
            "--date-range",
            "2024-01-01",
            "2024-01-31",
        ])
        .unwrap();
    let invocation = bound.factory().reconstruct(&matches).unwrap();
    assert_eq!(
        invocation.request.get("date_range"),
        Some(&Value::Tuple(vec![date(2024, 1, 1), date(2024, 1, 31)]))
    );
}

#[rstest]
#[case("--date", "2024-13-01")]
#[case("--date", "2024-1-5")]
#[case("--season", "twenty")]
fn given_malformed_value_when_reconstructing_then_flag_format_error(
    #[case] flag: &str,
    #[case] raw: &str,
) {
    let bound = games_command();
    let matches = bound
        .command()
        .clone()
        .try_get_matches_from(["games", "--sport", "MBB", flag, raw])
        .unwrap();
    let err = bound.factory().reconstruct(&matches).unwrap_err();
    match err {
        ApplicationError::Domain(DomainError::FlagFormat { flag: f, value, .. }) => {
            assert_eq!(format!("--{f}"), flag);
            assert_eq!(value, raw);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn given_missing_mandatory_flag_when_parsing_then_clap_rejects() {
    let bound = games_command();
    let result = bound.command().clone().try_get_matches_from(["games"]);
    assert!(result.is_err());
}

#[test]
fn given_page_mode_flag_when_reconstructing_then_passed_through_as_extra() {
    let bound = games_command();
    let matches = bound
        .command()
        .clone()
        .try_get_matches_from(["games", "--sport", "MBB", "--one-page"])
        .unwrap();
    let invocation = bound.factory().reconstruct(&matches).unwrap();

    assert_eq!(invocation.extras.toggle(ALL_PAGES, ONE_PAGE), Some(false));
    assert!(invocation.extras.get_flag(ONE_PAGE));
    let ids = invocation.extras.ids();
    assert!(ids.contains(&ONE_PAGE));
    assert!(!ids.contains(&"sport"));
    assert!(!ids.contains(&"no-active"));
    assert!(invocation.extras.get_one::<String>("sport").is_none());
}

#[test]
fn given_undefined_id_when_reading_extras_then_false_or_none() {
    let bound = games_command();
    let matches = bound
        .command()
        .clone()
        .try_get_matches_from(["games", "--sport", "MBB", "--all-pages"])
        .unwrap();
    let invocation = bound.factory().reconstruct(&matches).unwrap();

    assert!(!invocation.extras.get_flag("verbose"));
    assert!(invocation.extras.get_one::<String>("verbose").is_none());
    assert!(invocation.extras.get_one::<String>(ALL_PAGES).is_none());
    assert!(invocation.extras.get_flag(ALL_PAGES));
}

#[test]
fn given_no_page_mode_flag_when_reconstructing_then_toggle_unset() {
    let bound = games_command();
    let matches = bound
        .command()
        .clone()
        .try_get_matches_from(["games", "--sport", "MBB"])
        .unwrap();
    let invocation = bound.factory().reconstruct(&matches).unwrap();
    assert_eq!(invocation.extras.toggle(ALL_PAGES, ONE_PAGE), None);
}
