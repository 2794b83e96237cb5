mod commands;
mod logging;
mod progress;
mod prompt;

use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands};
use datams_core::storage::Database;
use datams_core::users::{self, NewUser};
use datams_core::{AppConfig, DirectoryLayout, ResolutionStats, ResolveEngine};
use dotenv::dotenv;
use progress::CliReporter;
use prompt::{prompt_confirm, prompt_line, prompt_new_password};
use tracing::{error, info, warn};

fn main() -> ExitCode {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match datams_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let args = Cli::parse();

    let result = match args.command {
        Some(Commands::InitDb) => run_init_db(&config),
        Some(Commands::WipeDb) => run_wipe_db(&config),
        Some(Commands::ResolveFiles) => run_resolve_files(&config),
        Some(Commands::CreateUser {
            username,
            email,
            admin,
        }) => run_create_user(&config, username, email, admin),
        Some(Commands::DeleteUser { username }) => run_delete_user(&config, &username),
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:#?}", config);
            Ok(())
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn open_database(config: &AppConfig) -> Result<Database> {
    Database::open(&config.database.path)
        .with_context(|| format!("opening database {}", config.database.path.display()))
}

fn aborted() -> Result<()> {
    info!("Aborted, nothing was changed");
    Ok(())
}

fn run_init_db(config: &AppConfig) -> Result<()> {
    if !prompt_confirm(
        "Are you SURE you want to re-initialize the database? Every stored value will be lost.",
    )? {
        return aborted();
    }
    open_database(config)?.initialize()?;
    info!("Database {} initialized", config.database.path.display());
    Ok(())
}

fn run_wipe_db(config: &AppConfig) -> Result<()> {
    if !prompt_confirm("Are you SURE you want to COMPLETELY DELETE the database?")? {
        return aborted();
    }
    open_database(config)?.wipe()?;
    info!("All tables dropped");
    Ok(())
}

fn print_stats(stats: &ResolutionStats) {
    let rows = [
        ("Files scanned", stats.files_scanned.to_string().normal()),
        ("Unique candidates", stats.candidates.to_string().normal()),
        ("File records", stats.total_records.to_string().normal()),
        ("Unchanged", stats.unchanged.to_string().green()),
        ("Requiring resolution", stats.requiring_resolution.to_string().yellow()),
        ("Non-unique basenames", stats.non_unique.to_string().yellow()),
        ("Resolvable", stats.resolvable.to_string().cyan()),
        ("To drop", stats.to_drop.to_string().red()),
    ];
    println!();
    for (label, value) in rows {
        println!("  {:<22} {:>10}", label, value);
    }
    println!();
}

fn run_resolve_files(config: &AppConfig) -> Result<()> {
    let layout = DirectoryLayout::prepare(config)?;
    let db = open_database(config)?;
    let engine = ResolveEngine::new(layout);
    let reporter = CliReporter::new();

    let plan = engine.plan(&db, &reporter)?;
    print_stats(&plan.stats);
    info!(
        "Scan: {}, Classify: {}",
        format!("{:.2}s", plan.scan_duration.as_secs_f64()).green(),
        format!("{:.2}s", plan.classify_duration.as_secs_f64()).green(),
    );

    if !plan.classification.has_changes() {
        info!("Every file record already points at an existing file");
        return Ok(());
    }

    info!(
        "Proposed changes written to {}",
        plan.proposal_path.display().to_string().cyan()
    );
    if !prompt_confirm("Review the proposed changes. Apply them?")? {
        return aborted();
    }

    let outcome = engine.apply(&db, &plan, &reporter)?;
    info!(
        "{} rows changed, {} discovery files marked in {}",
        format!("{}", outcome.rows_changed).red(),
        format!("{}", outcome.markers_written).cyan(),
        format!("{:.2}s", outcome.duration.as_secs_f64()).green(),
    );
    info!("Change log appended to {}", outcome.applied_log.display());
    Ok(())
}

fn run_create_user(
    config: &AppConfig,
    username: String,
    email: Option<String>,
    admin: bool,
) -> Result<()> {
    let email = match email {
        Some(email) => email,
        None => prompt_line("Email")?,
    };
    let Some(password) = prompt_new_password()? else {
        bail!("password entries do not match");
    };

    let db = open_database(config)?;
    let user = NewUser {
        username,
        email,
        password,
        admin,
    };
    let id = users::create_user(&db, &user)?;
    let role = if admin { "administrator" } else { "user" };
    info!("Created {} `{}` with id {}", role, user.username.green(), id);
    Ok(())
}

fn run_delete_user(config: &AppConfig, username: &str) -> Result<()> {
    if !prompt_confirm(&format!("Are you SURE you want to delete user `{}`?", username))? {
        return aborted();
    }
    let db = open_database(config)?;
    if users::delete_user(&db, username)? {
        info!("Deleted user `{}`", username);
    } else {
        warn!("No user found with username `{}`", username);
    }
    Ok(())
}
