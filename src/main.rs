mod cli;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, ReportCommands};
use ledgerview::settings::{load_settings, shellexpand_path};

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut settings = load_settings();
    if let Some(dir) = &cli.data_dir {
        settings.data_dir = shellexpand_path(dir);
    }

    let result = match cli.command {
        Commands::Init => cli::init::run(cli.data_dir),
        Commands::Demo { end } => cli::demo::run(&settings, end),
        Commands::Report { command } => match command {
            ReportCommands::Transactions {
                range,
                expense,
                bucket_by,
                merge,
                no_merge,
            } => {
                let merge = match (merge, no_merge) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                };
                cli::report::transactions(&settings, &range, expense, bucket_by, merge)
            }
            ReportCommands::Balance { range } => cli::report::balance(&settings, &range),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
