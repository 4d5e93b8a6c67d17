//! Focusline CLI: the `focusline` command.
//!
//! Presentation only; every rule lives in `focusline_core`.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands, ZoneCommands};

fn main() {
    let cli = Cli::parse();
    support::init_logging(cli.log_level.as_deref(), cli.log_dir.as_deref());

    let result = match cli.command {
        Commands::Ping => commands::ping::run(),

        Commands::Add {
            title,
            context,
            zone,
            notes,
            due,
            ref_code,
            json,
        } => commands::item::add(
            &cli.db,
            commands::item::AddArgs {
                title,
                context,
                zone,
                notes,
                due,
                ref_code,
            },
            json,
        ),

        Commands::List {
            status,
            contexts,
            zone,
            all,
            json,
        } => commands::item::list(&cli.db, status, contexts, zone, all, json),

        Commands::Show { item, json } => commands::item::show(&cli.db, &item, json),

        Commands::Status { item, status } => commands::item::set_status(&cli.db, &item, &status),

        Commands::Move { item, index } => commands::item::move_item(&cli.db, &item, index),

        Commands::Edit {
            item,
            title,
            notes,
            clear_notes,
            zone,
            clear_zone,
            due,
            clear_due,
        } => commands::item::edit(
            &cli.db,
            &item,
            commands::item::EditArgs {
                title,
                notes,
                clear_notes,
                zone,
                clear_zone,
                due,
                clear_due,
            },
        ),

        Commands::Zone { command } => match command {
            ZoneCommands::Add { name } => commands::zone::add(&cli.db, &name),
            ZoneCommands::List { json } => commands::zone::list(&cli.db, json),
            ZoneCommands::Delete { zone } => commands::zone::delete(&cli.db, &zone),
        },
    };

    if let Err(message) = result {
        eprintln!("error: {message}");
        std::process::exit(1);
    }
}
