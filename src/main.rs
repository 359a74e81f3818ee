use anyhow::Result;
use clap::Parser;
use todos::cli::{Cli, Command};
use todos::commands;
use todos::config::Config;
use todos::logging;

fn main() -> Result<()> {
    let args = Cli::parse();
    let config = Config::load()?;
    let data_dir = config.resolve_data_dir(args.data_dir)?;
    let _guard = logging::init(&data_dir, config.log_level())?;

    let command = args.command.unwrap_or(Command::Tui);
    match command {
        Command::Add { text, date, time } => commands::add(&data_dir, text, date, time),
        Command::List { filter } => commands::list(&data_dir, filter),
        Command::Toggle { id } => commands::toggle(&data_dir, id),
        Command::Edit { id, text } => commands::edit(&data_dir, id, text),
        Command::Delete { id } => commands::delete(&data_dir, id),
        Command::ClearCompleted => commands::clear_completed(&data_dir),
        Command::Archived => commands::archived(&data_dir),
        Command::Restore { id } => commands::restore(&data_dir, id),
        Command::Purge { id } => commands::purge(&data_dir, id),
        Command::Tui => commands::tui(&data_dir),
    }
}
