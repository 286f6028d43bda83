use clap::{Parser, Subcommand};
use std::net::SocketAddr;

#[derive(Parser, Debug)]
#[command(name = "imgrelay")]
#[command(about = "Image upload relay with multi-host failover", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Server(ServerArgs),
    /// Inspect and test configured image hosts
    Hosts {
        #[command(subcommand)]
        command: HostsCommand,
    },
}

#[derive(clap::Args, Debug)]
pub struct ServerArgs {
    /// Address to bind the HTTP server to (defaults to server.bind_addr)
    #[arg(long)]
    pub address: Option<SocketAddr>,
}

#[derive(Subcommand, Debug)]
pub enum HostsCommand {
    /// Print every stored host definition in failover order
    List,
    /// Upload a 1x1 test image to one host and print the result
    Test {
        /// Host id as shown by `hosts list`
        id: u64,
    },
}
