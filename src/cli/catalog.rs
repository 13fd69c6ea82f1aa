//! The statistics endpoints exposed as subcommands
//!
//! Each entry names an endpoint, the label used in diagnostics, and the
//! request schema its flags are generated from. Every command also gets the
//! `--all-pages/--one-page` toggle.

use clap::Arg;
use tracing::instrument;

use crate::application::{toggle_pair, ApplicationResult, BoundCommand, CommandBuilder};
use crate::domain::{DomainResult, FieldDecl, Schema, TypeSpec};

/// Clap id of `--all-pages`.
pub const ALL_PAGES: &str = "all_pages";
/// Clap id of `--one-page`.
pub const ONE_PAGE: &str = "one_page";

/// One endpoint of the statistics API.
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    /// Subcommand and endpoint name.
    pub name: &'static str,
    /// What the command pulls, e.g. "team codes".
    pub label: &'static str,
    pub about: &'static str,
    schema: fn(&str) -> DomainResult<Schema>,
}

impl CatalogEntry {
    pub fn schema(&self) -> DomainResult<Schema> {
        (self.schema)(self.name)
    }
}

/// Page-mode flags shared by every endpoint command; all pages unless told otherwise.
pub fn page_mode_flags() -> Vec<Arg> {
    let (all, one) = toggle_pair(ALL_PAGES, "all-pages", ONE_PAGE, "one-page");
    vec![
        all.help("Pull all pages or just one (default: all pages)"),
        one,
    ]
}

pub const ENTRIES: &[CatalogEntry] = &[
    CatalogEntry {
        name: "teamcodes",
        label: "team codes",
        about: "Pull team codes",
        schema: teamcodes,
    },
    CatalogEntry {
        name: "leaguecodes",
        label: "league codes",
        about: "Pull league codes",
        schema: sport_only,
    },
    CatalogEntry {
        name: "seasons",
        label: "seasons",
        about: "Pull seasons",
        schema: sport_only,
    },
    CatalogEntry {
        name: "teams",
        label: "team data",
        about: "Pull team data",
        schema: teams,
    },
    CatalogEntry {
        name: "players",
        label: "player data",
        about: "Pull player data",
        schema: players,
    },
    CatalogEntry {
        name: "games",
        label: "game data",
        about: "Pull game data",
        schema: games,
    },
    CatalogEntry {
        name: "teamperfs",
        label: "team performance data",
        about: "Pull team performance data",
        schema: teamperfs,
    },
    CatalogEntry {
        name: "playerperfs",
        label: "player performance data",
        about: "Pull player performance data",
        schema: playerperfs,
    },
    CatalogEntry {
        name: "playbyplay",
        label: "play-by-play data",
        about: "Pull play-by-play data",
        schema: playbyplay,
    },
    CatalogEntry {
        name: "venues",
        label: "venue data",
        about: "Pull venue data",
        schema: venues,
    },
    CatalogEntry {
        name: "moneyline",
        label: "moneyline",
        about: "Pull moneyline data",
        schema: odds,
    },
    CatalogEntry {
        name: "pointspread",
        label: "point spread data",
        about: "Pull point spread data",
        schema: odds,
    },
    CatalogEntry {
        name: "overunder",
        label: "over/under data",
        about: "Pull over/under data",
        schema: odds,
    },
];

fn sport() -> FieldDecl {
    FieldDecl::new("sport", TypeSpec::string())
        .required()
        .describe("Sport code, e.g. MBB or NFL")
}

fn season() -> FieldDecl {
    FieldDecl::new("season", TypeSpec::optional(TypeSpec::int()))
        .describe("Season year (default: current season)")
}

fn team() -> FieldDecl {
    FieldDecl::new("team", TypeSpec::optional(TypeSpec::string())).describe("Team code")
}

fn active(what: &str) -> FieldDecl {
    FieldDecl::new("active", TypeSpec::bool())
        .default(true)
        .describe(format!("Only active {what}"))
}

fn date() -> FieldDecl {
    FieldDecl::new("date", TypeSpec::optional(TypeSpec::date())).describe("Game date")
}

fn date_range() -> FieldDecl {
    FieldDecl::new(
        "date_range",
        TypeSpec::optional(TypeSpec::tuple([TypeSpec::date(), TypeSpec::date()])),
    )
    .describe("First and last game date")
}

fn sport_only(name: &str) -> DomainResult<Schema> {
    Schema::builder(name).field(sport()).build()
}

fn teamcodes(name: &str) -> DomainResult<Schema> {
    Schema::builder(name).field(sport()).field(season()).build()
}

fn teams(name: &str) -> DomainResult<Schema> {
    Schema::builder(name)
        .field(sport())
        .field(season())
        .field(team())
        .field(active("teams"))
        .build()
}

fn players(name: &str) -> DomainResult<Schema> {
    Schema::builder(name)
        .field(sport())
        .field(season())
        .field(team())
        .field(
            FieldDecl::new("positions", TypeSpec::list(TypeSpec::string()))
                .describe("Restrict to these positions (repeatable)"),
        )
        .field(active("players"))
        .build()
}

fn games(name: &str) -> DomainResult<Schema> {
    Schema::builder(name)
        .field(sport())
        .field(season())
        .field(team())
        .field(date())
        .field(date_range())
        .build()
}

fn teamperfs(name: &str) -> DomainResult<Schema> {
    Schema::builder(name)
        .field(sport())
        .field(season())
        .field(team())
        .field(date_range())
        .build()
}

fn playerperfs(name: &str) -> DomainResult<Schema> {
    Schema::builder(name)
        .field(sport())
        .field(season())
        .field(team())
        .field(
            FieldDecl::new("player", TypeSpec::optional(TypeSpec::string()))
                .describe("Player code"),
        )
        .field(
            FieldDecl::new("min_minutes", TypeSpec::optional(TypeSpec::float()))
                .describe("Skip performances with fewer minutes played"),
        )
        .field(date_range())
        .build()
}

fn playbyplay(name: &str) -> DomainResult<Schema> {
    Schema::builder(name)
        .field(sport())
        .field(
            FieldDecl::new("game", TypeSpec::string())
                .required()
                .describe("Game code"),
        )
        .build()
}

fn venues(name: &str) -> DomainResult<Schema> {
    Schema::builder(name)
        .field(sport())
        .field(active("venues"))
        .build()
}

fn odds(name: &str) -> DomainResult<Schema> {
    Schema::builder(name)
        .field(sport())
        .field(season())
        .field(date_range())
        .field(
            FieldDecl::new("books", TypeSpec::list(TypeSpec::string()))
                .describe("Restrict to these sportsbooks (repeatable)"),
        )
        .build()
}

/// A catalog entry with its generated command.
#[derive(Debug, Clone)]
pub struct CatalogCommand {
    pub entry: CatalogEntry,
    pub bound: BoundCommand,
}

/// All endpoint commands, bound once per process.
#[derive(Debug, Clone)]
pub struct Catalog {
    commands: Vec<CatalogCommand>,
}

impl Catalog {
    /// Bind every entry of [`ENTRIES`].
    pub fn build() -> ApplicationResult<Self> {
        Self::from_entries(ENTRIES)
    }

    #[instrument(level = "debug", skip_all, fields(entries = entries.len()))]
    pub fn from_entries(entries: &[CatalogEntry]) -> ApplicationResult<Self> {
        let commands = entries
            .iter()
            .map(|entry| {
                let bound = CommandBuilder::new(entry.name)
                    .about(entry.about)
                    .with_schema(entry.schema()?)
                    .with_extra_flags(page_mode_flags())
                    .build()?;
                Ok(CatalogCommand {
                    entry: *entry,
                    bound,
                })
            })
            .collect::<ApplicationResult<Vec<_>>>()?;
        Ok(Self { commands })
    }

    pub fn get(&self, name: &str) -> Option<&CatalogCommand> {
        self.commands.iter().find(|c| c.entry.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CatalogCommand> {
        self.commands.iter()
    }
}
