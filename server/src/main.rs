mod config;
mod directory;
mod http;
mod routes;

use std::sync::Arc;

use anyhow::Result;
use chrono::Duration;
use clap::{Args, Parser, Subcommand};
use console_authn::SessionRegistry;
use console_authz::RouteTable;
use console_obs::{ObsConfig, init_tracing};
use tracing::info;

use crate::{
    config::AppConfig,
    directory::StaticDirectory,
    http::{AppState, ServeConfig},
};

#[derive(Parser, Debug)]
#[command(name = "console-server", version, about = "Admin console server")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP server.
    Serve(ServeCommand),
    /// Validate the route table and print its classification.
    #[command(name = "routes:print")]
    RoutesPrint,
}

#[derive(Args, Debug)]
struct ServeCommand {
    #[arg(long, default_value = "0.0.0.0")]
    host: std::net::IpAddr,
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

impl From<&ServeCommand> for ServeConfig {
    fn from(value: &ServeCommand) -> Self {
        ServeConfig::new(value.host, value.port)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(ObsConfig::default())?;
    let cli = Cli::parse();
    match cli.command {
        Command::Serve(cmd) => run_server(cmd).await,
        Command::RoutesPrint => print_routes(),
    }
}

async fn run_server(cmd: ServeCommand) -> Result<()> {
    let config = Arc::new(AppConfig::load()?);
    let table = Arc::new(RouteTable::new(routes::route_table())?);
    let registry = Arc::new(SessionRegistry::new(Duration::minutes(
        config.session_ttl_minutes,
    )));
    let directory = StaticDirectory::new(config.users.clone());
    info!(
        users = config.users.len(),
        protected = table.protected().len(),
        "route table validated"
    );
    let cookie_key = config.cookie_key.clone();
    let state = AppState {
        table,
        registry,
        directory,
        config,
        cookie_key,
    };
    http::serve((&cmd).into(), state).await
}

fn print_routes() -> Result<()> {
    let table = RouteTable::new(routes::route_table())?;
    let summary = serde_json::json!({
        "index": table.index().path,
        "guest_only": table.guest_only().iter().map(|r| r.path.as_str()).collect::<Vec<_>>(),
        "protected": table.protected().iter().map(|r| r.path.as_str()).collect::<Vec<_>>(),
        "public": table.public().iter().map(|r| r.path.as_str()).collect::<Vec<_>>(),
        "not_found": table.not_found().map(|r| r.path.as_str()),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
