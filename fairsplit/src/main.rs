#![warn(clippy::uninlined_format_args)]

mod bootstrap;

use std::{borrow::Cow, env, process};

use fairsplit_application::{load_event, summarize};
use fairsplit_presentation::SettlementPresenter;

type CliResult<T> = Result<T, Cow<'static, str>>;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn run() -> CliResult<()> {
    bootstrap::init_logging();
    let config = bootstrap::AppConfig::from_env();

    let Some(path) = env::args().nth(1).or(config.snapshot_path) else {
        return Err("Usage: fairsplit <event.json> (or set FAIRSPLIT_SNAPSHOT)".into());
    };

    let event =
        load_event(&path).map_err(|err| format!("Failed to load '{path}': {err}"))?;
    tracing::info!(event = event.name(), people = event.people().len(), "Loaded event");

    let summary = summarize(&event);
    let view = SettlementPresenter::render(&summary, &event);

    println!("{}", event.name());
    println!();
    println!("{}", view.balance_table);
    if let Some(transfer_table) = view.transfer_table {
        println!();
        println!("{transfer_table}");
    }

    Ok(())
}
