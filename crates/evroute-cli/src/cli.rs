//! Argument definitions and parsing

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use evroute_graphql::GraphqlConfig;
use evroute_model::{Location, ModelError, Season};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

fn location(s: &str) -> Result<Location, ModelError> {
    Location::from_str(s)
}

fn season(s: &str) -> Result<Season, ModelError> {
    Season::from_str(s)
}

fn timeout_arg() -> Arg {
    Arg::new("timeout")
        .long("timeout")
        .value_name("SECS")
        .value_parser(value_parser!(u64).range(1..))
        .help("Give up after this many seconds")
}

fn size_arg(default: &'static str) -> Arg {
    Arg::new("size")
        .long("size")
        .default_value(default)
        .value_parser(value_parser!(u32).range(1..=100))
        .help("Results per page")
}

fn pages_arg() -> Arg {
    Arg::new("pages")
        .long("pages")
        .default_value("1")
        .value_parser(value_parser!(u32).range(1..))
        .help("Fetch at most this many pages")
}

fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Output as JSON")
}

pub(crate) fn command() -> Command {
    Command::new("evroute")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compute EV routes and reachability isolines, look up vehicles and stations")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("client-id")
                .long("client-id")
                .global(true)
                .help("Client id sent as x-client-id"),
        )
        .arg(
            Arg::new("app-id")
                .long("app-id")
                .global(true)
                .help("App id sent as x-app-id"),
        )
        .subcommand(
            Command::new("route")
                .about("Compute a route between two points")
                .arg(
                    Arg::new("origin")
                        .long("origin")
                        .required(true)
                        .value_name("LON,LAT")
                        .allow_hyphen_values(true)
                        .value_parser(location)
                        .help("Start of the route"),
                )
                .arg(
                    Arg::new("destination")
                        .long("destination")
                        .required(true)
                        .value_name("LON,LAT")
                        .allow_hyphen_values(true)
                        .value_parser(location)
                        .help("End of the route"),
                )
                .arg(
                    Arg::new("ev")
                        .long("ev")
                        .required(true)
                        .value_name("ID")
                        .help("Vehicle id"),
                )
                .arg(
                    Arg::new("soc")
                        .long("soc")
                        .value_name("KWH")
                        .value_parser(value_parser!(f64))
                        .help("State of charge at departure, in kWh"),
                )
                .arg(
                    Arg::new("verify")
                        .long("verify")
                        .action(ArgAction::SetTrue)
                        .help("Also query the route status directly after subscribing"),
                )
                .arg(timeout_arg())
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("isoline")
                .about("Compute the area reachable from a point")
                .arg(
                    Arg::new("origin")
                        .long("origin")
                        .required(true)
                        .value_name("LON,LAT")
                        .allow_hyphen_values(true)
                        .value_parser(location)
                        .help("Center of the isoline"),
                )
                .arg(
                    Arg::new("vehicle")
                        .long("vehicle")
                        .required(true)
                        .value_name("ID")
                        .help("Vehicle id"),
                )
                .arg(
                    Arg::new("polygons")
                        .long("polygons")
                        .default_value("10")
                        .value_parser(value_parser!(u32).range(1..))
                        .help("Number of reachability bands"),
                )
                .arg(
                    Arg::new("season")
                        .long("season")
                        .default_value("summer")
                        .value_parser(season)
                        .help("summer or winter"),
                )
                .arg(timeout_arg())
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("status")
                .about("Query the status of a route once")
                .arg(Arg::new("id").required(true).help("Route id"))
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("vehicles")
                .about("List vehicles from the catalogue")
                .arg(
                    Arg::new("search")
                        .long("search")
                        .value_name("TEXT")
                        .help("Match make or model"),
                )
                .arg(size_arg("10"))
                .arg(pages_arg())
                .arg(json_arg()),
        )
        .subcommand(
            Command::new("stations")
                .about("List charging stations around a point")
                .arg(
                    Arg::new("near")
                        .long("near")
                        .required(true)
                        .value_name("LON,LAT")
                        .allow_hyphen_values(true)
                        .value_parser(location)
                        .help("Center of the search"),
                )
                .arg(
                    Arg::new("distance")
                        .long("distance")
                        .value_name("METERS")
                        .default_value("3000")
                        .value_parser(value_parser!(u32).range(1..))
                        .help("Search radius"),
                )
                .arg(size_arg("20"))
                .arg(pages_arg())
                .arg(json_arg()),
        )
}

/// Route subcommand arguments
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RouteArgs {
    pub(crate) origin: Location,
    pub(crate) destination: Location,
    pub(crate) ev: String,
    pub(crate) soc_kwh: Option<f64>,
    pub(crate) verify: bool,
    pub(crate) timeout: Option<Duration>,
    pub(crate) json: bool,
}

/// Isoline subcommand arguments
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct IsolineArgs {
    pub(crate) origin: Location,
    pub(crate) vehicle: String,
    pub(crate) polygons: u32,
    pub(crate) season: Season,
    pub(crate) timeout: Option<Duration>,
    pub(crate) json: bool,
}

/// Catalogue listing arguments
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ListArgs {
    pub(crate) size: u32,
    pub(crate) pages: u32,
    pub(crate) json: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Action {
    Route(RouteArgs),
    Isoline(IsolineArgs),
    Status { id: String, json: bool },
    Vehicles { search: Option<String>, list: ListArgs },
    Stations { near: Location, distance: u32, list: ListArgs },
}

/// Parsed command line
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Invocation {
    pub(crate) config_path: Option<PathBuf>,
    pub(crate) client_id: Option<String>,
    pub(crate) app_id: Option<String>,
    pub(crate) action: Action,
}

impl Invocation {
    pub(crate) fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let action = match matches.subcommand() {
            Some(("route", args)) => Action::Route(RouteArgs {
                origin: required::<Location>(args, "origin")?,
                destination: required::<Location>(args, "destination")?,
                ev: required::<String>(args, "ev")?,
                soc_kwh: args.get_one::<f64>("soc").copied(),
                verify: args.get_flag("verify"),
                timeout: timeout(args),
                json: args.get_flag("json"),
            }),
            Some(("isoline", args)) => Action::Isoline(IsolineArgs {
                origin: required::<Location>(args, "origin")?,
                vehicle: required::<String>(args, "vehicle")?,
                polygons: required::<u32>(args, "polygons")?,
                season: required::<Season>(args, "season")?,
                timeout: timeout(args),
                json: args.get_flag("json"),
            }),
            Some(("status", args)) => Action::Status {
                id: required::<String>(args, "id")?,
                json: args.get_flag("json"),
            },
            Some(("vehicles", args)) => Action::Vehicles {
                search: args.get_one::<String>("search").cloned(),
                list: list(args)?,
            },
            Some(("stations", args)) => Action::Stations {
                near: required::<Location>(args, "near")?,
                distance: required::<u32>(args, "distance")?,
                list: list(args)?,
            },
            Some((other, _)) => anyhow::bail!("unknown command `{other}`"),
            None => anyhow::bail!("no command given"),
        };
        Ok(Self {
            config_path: matches.get_one::<PathBuf>("config").cloned(),
            client_id: matches.get_one::<String>("client-id").cloned(),
            app_id: matches.get_one::<String>("app-id").cloned(),
            action,
        })
    }

    /// Defaults, then the config file, then the environment, then flags
    pub(crate) fn resolve_config(&self) -> Result<GraphqlConfig> {
        let base = match &self.config_path {
            Some(path) => GraphqlConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => GraphqlConfig::default(),
        };
        let mut config = base.with_env_overrides();
        if let Some(id) = &self.client_id {
            config = config.with_client_id(id.as_str());
        }
        if let Some(id) = &self.app_id {
            config = config.with_app_id(id.as_str());
        }
        Ok(config)
    }
}

fn required<T: Clone + Send + Sync + 'static>(args: &ArgMatches, name: &str) -> Result<T> {
    args.get_one::<T>(name)
        .cloned()
        .with_context(|| format!("missing --{name}"))
}

fn list(args: &ArgMatches) -> Result<ListArgs> {
    Ok(ListArgs {
        size: required::<u32>(args, "size")?,
        pages: required::<u32>(args, "pages")?,
        json: args.get_flag("json"),
    })
}

fn timeout(args: &ArgMatches) -> Option<Duration> {
    args.get_one::<u64>("timeout").copied().map(Duration::from_secs)
}
