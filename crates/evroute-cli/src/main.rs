//! `evroute` command line client

mod cli;
mod output;

use anyhow::{Context, Result};
use cli::{Action, Invocation, IsolineArgs, ListArgs, RouteArgs};
use evroute_core::{ResolveOptions, Resolution, Resolver, ResourceBackend, ResourceHandle};
use evroute_graphql::{Catalogue, GraphqlClient, IsolineBackend, RouteBackend};
use evroute_model::{
    EnergyUnit, EvSpec, IsolineRequest, Location, Pager, RouteRequest, StationQuery,
};
use serde::Serialize;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Exit status when the backend reports the resource cannot be computed
const EXIT_ABSENT: u8 = 2;

enum Outcome {
    Done,
    Absent,
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("evroute=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn options(verify: bool, timeout: Option<std::time::Duration>) -> ResolveOptions {
    let options = ResolveOptions::new().with_verify_query(verify);
    match timeout {
        Some(after) => options.with_timeout(after),
        None => options,
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn route(client: Arc<GraphqlClient>, args: RouteArgs) -> Result<Outcome> {
    let mut ev = EvSpec::new(args.ev);
    if let Some(kwh) = args.soc_kwh {
        ev = ev.with_state_of_charge(kwh, EnergyUnit::Kwh);
    }
    let request = RouteRequest::new(ev, &args.origin, &args.destination);
    request.validate().context("invalid route request")?;

    info!(origin = %args.origin, destination = %args.destination, "requesting route");
    let resolver = Resolver::new(Arc::new(RouteBackend::new(client)))
        .with_options(options(args.verify, args.timeout));
    match resolver.resolve(&request).await.context("route computation failed")? {
        Resolution::Resolved(update) if args.json => print_json(&update)?,
        Resolution::Resolved(update) => print!("{}", output::route_text(&update)),
        Resolution::Absent { handle, status } => {
            println!("{}", output::absent_text("route", &handle, &status));
            return Ok(Outcome::Absent);
        }
    }
    Ok(Outcome::Done)
}

async fn isoline(client: Arc<GraphqlClient>, args: IsolineArgs) -> Result<Outcome> {
    let request = IsolineRequest::new(args.vehicle, &args.origin)
        .with_polygon_count(args.polygons)
        .with_season(args.season);

    info!(origin = %args.origin, polygons = args.polygons, "requesting isoline");
    let resolver = Resolver::new(Arc::new(IsolineBackend::new(client)))
        .with_options(options(false, args.timeout));
    match resolver.resolve(&request).await.context("isoline computation failed")? {
        Resolution::Resolved(isoline) if args.json => print_json(&isoline)?,
        Resolution::Resolved(isoline) => print!("{}", output::isoline_text(&isoline)),
        Resolution::Absent { handle, status } => {
            println!("{}", output::absent_text("isoline", &handle, &status));
            return Ok(Outcome::Absent);
        }
    }
    Ok(Outcome::Done)
}

async fn status(client: Arc<GraphqlClient>, id: &str, json: bool) -> Result<Outcome> {
    let handle = ResourceHandle::new(id).context("route id must not be empty")?;
    let update = RouteBackend::new(client)
        .query_status(&handle)
        .await
        .with_context(|| format!("querying route {handle}"))?;
    if json {
        print_json(&output::status_json(&handle, &update))?;
    } else {
        print!("{}", output::status_text(&handle, &update));
    }
    Ok(Outcome::Done)
}

async fn vehicles(
    client: Arc<GraphqlClient>,
    search: Option<&str>,
    list: &ListArgs,
) -> Result<Outcome> {
    let catalogue = Catalogue::new(client);
    let mut pager = Pager::new(list.size);
    let mut found = Vec::new();
    for _ in 0..list.pages {
        if pager.is_exhausted() {
            break;
        }
        let page = catalogue
            .vehicles(search, &mut pager)
            .await
            .context("listing vehicles")?;
        found.extend(page);
    }
    info!(count = found.len(), "vehicles listed");
    if list.json {
        print_json(&found)?;
    } else {
        for vehicle in &found {
            println!("{}", output::vehicle_line(vehicle));
        }
    }
    Ok(Outcome::Done)
}

async fn stations(
    client: Arc<GraphqlClient>,
    near: &Location,
    distance: u32,
    list: &ListArgs,
) -> Result<Outcome> {
    let catalogue = Catalogue::new(client);
    let query = StationQuery::around(near).with_distance(distance);
    let mut pager = Pager::new(list.size);
    let mut found = Vec::new();
    for _ in 0..list.pages {
        if pager.is_exhausted() {
            break;
        }
        let page = catalogue
            .stations_around(&query, &mut pager)
            .await
            .context("listing stations")?;
        found.extend(page);
    }
    info!(near = %near, count = found.len(), "stations listed");
    if list.json {
        print_json(&found)?;
    } else {
        for station in &found {
            println!("{}", output::station_line(station));
        }
    }
    Ok(Outcome::Done)
}

async fn run(invocation: Invocation) -> Result<Outcome> {
    let config = invocation.resolve_config()?;
    let client = Arc::new(GraphqlClient::new(config).context("invalid client configuration")?);
    let outcome = match invocation.action {
        Action::Route(args) => route(Arc::clone(&client), args).await,
        Action::Isoline(args) => isoline(Arc::clone(&client), args).await,
        Action::Status { id, json } => status(Arc::clone(&client), &id, json).await,
        Action::Vehicles { search, list } => {
            vehicles(Arc::clone(&client), search.as_deref(), &list).await
        }
        Action::Stations {
            near,
            distance,
            list,
        } => stations(Arc::clone(&client), &near, distance, &list).await,
    };
    client.close().await;
    outcome
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli::command().get_matches();
    init_tracing();

    let result = match Invocation::from_matches(&matches) {
        Ok(invocation) => run(invocation).await,
        Err(err) => Err(err),
    };
    match result {
        Ok(Outcome::Done) => ExitCode::SUCCESS,
        Ok(Outcome::Absent) => ExitCode::from(EXIT_ABSENT),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
