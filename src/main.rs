use budget_tracker::args::{
    Args, BudgetCommand, CategoryCommand, Command, ReportCommand, TransactionCommand,
};
use budget_tracker::{commands, Config, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().budget_home().path();

    if let Command::Init = args.command() {
        commands::init(home)?.print();
        return Ok(());
    }

    let config = Config::load(home)?;
    let mut store = config.open_store(args.common().backend())?;
    debug!("Using the {} backend", store.kind());
    let store = store.as_mut();

    // Route to appropriate command handler
    match args.command() {
        Command::Init => {}

        Command::Category(command) => match command {
            CategoryCommand::Add(a) => commands::add_category(store, a)?.print(),
            CategoryCommand::Update(a) => commands::update_category(store, a)?.print(),
            CategoryCommand::Delete(a) => commands::delete_category(store, a)?.print(),
            CategoryCommand::List => commands::list_categories(store)?.print(),
        },

        Command::Transaction(command) => match command {
            TransactionCommand::Add(a) => commands::add_transaction(store, a)?.print(),
            TransactionCommand::Update(a) => commands::update_transaction(store, a)?.print(),
            TransactionCommand::Delete(a) => commands::delete_transaction(store, a)?.print(),
            TransactionCommand::List(a) => commands::list_transactions(store, a)?.print(),
        },

        Command::Budget(command) => match command {
            BudgetCommand::Add(a) => commands::add_budget(store, a)?.print(),
            BudgetCommand::Update(a) => commands::update_budget(store, a)?.print(),
            BudgetCommand::Delete(a) => commands::delete_budget(store, a)?.print(),
            BudgetCommand::List(a) => commands::list_budgets(store, a)?.print(),
        },

        Command::Report(command) => match command {
            ReportCommand::Month(a) => commands::report_month(store, a)?.print(),
            ReportCommand::Trend(a) => commands::report_trend(store, a)?.print(),
        },
    }
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use the default log level for our crates only.
            EnvFilter::new(format!(
                "budget_tracker={},budget_engine={},{}={}",
                level,
                level,
                env!("CARGO_CRATE_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
