mod browser;
mod categoriser;
mod cli;
mod db;
mod error;
mod fmt;
mod importer;
mod models;
mod reports;
mod rules;
mod settings;
mod tui;

use clap::Parser;
use env_logger::Env;

use cli::{Cli, Commands, RulesCommands};

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level)).init();

    let result = match cli.command {
        Commands::Init {
            data_dir,
            rules_file,
        } => cli::init::run(data_dir, rules_file),
        Commands::Load { file, append } => cli::load::run(&file, append),
        Commands::Rules { command } => match command {
            RulesCommands::Load { file, truncate } => cli::rules::load(file, truncate),
            RulesCommands::Add {
                description_pattern,
                type_pattern,
                category,
                essential,
                notes,
            } => cli::rules::add(&description_pattern, &type_pattern, &category, essential, notes),
            RulesCommands::List => cli::rules::list(),
            RulesCommands::Delete { id } => cli::rules::delete(id),
        },
        Commands::Categorise => cli::categorise::run(),
        Commands::Uncategorised => cli::report::uncategorised(),
        Commands::Report { command } => cli::report::dispatch(command),
        Commands::View { filter } => cli::view::run(filter),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
