mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod services;
mod workflow;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::ticket::{self, CreateArgs, EditArgs};
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::infra::http::HttpTicketBackend;
use crate::workflow::page::PageKind;

#[derive(Parser)]
#[command(name = "ticketdesk", author, version, about = "Ticket tracking client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Ticket(TicketCommand),
    /// Manage CLI configuration.
    Config(ConfigArgs),
}

#[derive(Subcommand)]
enum TicketCommand {
    /// Show your tickets and the tickets assigned to you.
    Dashboard,
    /// Show only the tickets you created.
    Mine,
    /// Create a ticket.
    Create(CreateArgs),
    /// Edit an owned or assigned ticket.
    Edit(EditArgs),
    /// Delete a ticket and unassign its users.
    Delete {
        internal_id: String,
    },
    /// Download a ticket's attachments.
    Files {
        internal_id: String,
        /// Directory to write the files into.
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
    /// Search users by name.
    Search {
        query: String,
    },
}

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config(args) => config_cmd::run(args.command),
        Commands::Ticket(command) => run_ticket(command).await,
    }
}

async fn run_ticket(command: TicketCommand) -> AppResult<()> {
    let config = AppConfig::load()?;
    let backend = Arc::new(HttpTicketBackend::new(&config.api_base_url));
    let ctx = AppContext::new(config, backend)?;
    tracing::debug!(api = %ctx.config.api_base_url, user = %ctx.session.user_id, "session ready");

    match command {
        TicketCommand::Dashboard => ticket::list(&ctx, PageKind::Dashboard).await,
        TicketCommand::Mine => ticket::list(&ctx, PageKind::MyTickets).await,
        TicketCommand::Create(args) => ticket::create(&ctx, args).await,
        TicketCommand::Edit(args) => ticket::edit(&ctx, args).await,
        TicketCommand::Delete { internal_id } => ticket::delete(&ctx, &internal_id).await,
        TicketCommand::Files { internal_id, out } => ticket::files(&ctx, &internal_id, out).await,
        TicketCommand::Search { query } => ticket::search(&ctx, &query).await,
    }
}
