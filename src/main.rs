//! Cadence CLI entry point.

use clap::Parser;

use cadence::cli::{commands, Cli, Commands};
use cadence::infrastructure::logging::Logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match commands::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            cadence::cli::handle_error(err, cli.json);
            return;
        }
    };

    let _logging = match Logging::init(&config.logging) {
        Ok(logging) => logging,
        Err(err) => {
            cadence::cli::handle_error(err, cli.json);
            return;
        }
    };

    let result = match cli.command {
        Commands::Run => commands::run(config).await,
        Commands::Schedule {
            contact,
            campaign,
            task_type,
            delay_days,
            metadata,
        } => {
            commands::schedule(
                config,
                contact,
                campaign,
                &task_type,
                delay_days,
                metadata.as_deref(),
                cli.json,
            )
            .await
        }
        Commands::Cancel { task_id, contact } => {
            commands::cancel(config, task_id, contact, cli.json).await
        }
        Commands::Tasks { status, limit } => {
            commands::tasks(config, status.as_deref(), limit, cli.json).await
        }
        Commands::Status => commands::status(config, cli.json).await,
        Commands::Bulk { max_actions } => commands::bulk(config, max_actions, cli.json).await,
        Commands::Cleanup => commands::cleanup(config, cli.json).await,
        Commands::ClearRestrictions => commands::clear_restrictions(config, cli.json).await,
    };

    if let Err(err) = result {
        cadence::cli::handle_error(err, cli.json);
    }
}
