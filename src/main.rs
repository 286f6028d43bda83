mod cli;

use clap::Parser;
use cli::{Cli, Commands, HostsCommand};
use imgrelay::api::{self, AppState};
use imgrelay::config::Config;
use imgrelay::observability::init_tracing;

type AnyError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Server(args) => {
            let address = args.address.unwrap_or(config.server.bind_addr);
            api::run(address, config).await?;
        }
        Commands::Hosts { command } => run_hosts(command, config).await?,
    }

    Ok(())
}

async fn run_hosts(command: HostsCommand, config: Config) -> Result<(), AnyError> {
    let state = AppState::open(config)?;

    match command {
        HostsCommand::List => {
            for host in state.registry.list_all()? {
                println!(
                    "{:>4}  {:<16} priority={:<4} {:<8} {}",
                    host.id,
                    host.name,
                    host.priority,
                    if host.is_enabled { "enabled" } else { "disabled" },
                    host.url
                );
            }
        }
        HostsCommand::Test { id } => {
            let outcome = state.service.test_host(id).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    state.registry.persist()?;
    Ok(())
}
