use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use passman::cli::commands::edit::EditArgs;
use passman::cli::{output, Cli, Commands};

fn main() {
    let cli = Cli::parse();

    // Logging goes to stderr so it never mixes with table output.
    let filter = EnvFilter::try_from_env("PASSMAN_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("passman=debug")
        } else {
            EnvFilter::new("passman=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();

    let result = match cli.command {
        Commands::New => passman::cli::commands::new::execute(&cli),
        Commands::List => passman::cli::commands::list::execute(&cli),
        Commands::Add {
            ref title,
            ref url,
            ref username,
            ref notes,
        } => passman::cli::commands::add::execute(
            &cli,
            title,
            url.as_deref(),
            username.as_deref(),
            notes.as_deref(),
        ),
        Commands::Show { id, reveal } => passman::cli::commands::show::execute(&cli, id, reveal),
        Commands::Edit {
            id,
            ref title,
            ref url,
            ref username,
            ref notes,
            secret,
        } => passman::cli::commands::edit::execute(
            &cli,
            id,
            &EditArgs {
                title: title.as_deref(),
                url: url.as_deref(),
                username: username.as_deref(),
                notes: notes.as_deref(),
                secret,
            },
        ),
        Commands::Delete { id, force } => {
            passman::cli::commands::delete::execute(&cli, id, force)
        }
    };

    if let Err(e) = result {
        output::error(&e.to_string());
        if let Some(hint) = e.hint() {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
