mod api;
mod app;
mod cli;
mod error;
#[cfg(feature = "xlsx")]
mod export;
mod fetcher;
mod filter;
mod fmt;
mod logging;
mod mailer;
mod models;
mod notifier;
mod range;
mod settings;
mod store;
mod tui;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    logging::init();

    let mut settings = settings::load_settings();
    if let Some(url) = &cli.api_url {
        settings.api_url = url.clone();
    }
    tracing::info!(api_url = %settings.api_url, "starting");

    let result = match cli.command {
        None | Some(Commands::Dashboard) => cli::dashboard::run(&settings),
        Some(Commands::List { range, filters }) => filters.to_filter_set().and_then(|filters| {
            cli::list::run(cli::build_api(&settings).as_ref(), &range.to_range(), &filters)
        }),
        #[cfg(feature = "xlsx")]
        Some(Commands::Export {
            range,
            filters,
            output,
        }) => filters.to_filter_set().and_then(|filters| {
            let dir = output
                .map(|o| std::path::PathBuf::from(settings::shellexpand_path(&o)))
                .unwrap_or_else(|| settings.export_path());
            cli::export::run(cli::build_api(&settings).as_ref(), &range.to_range(), &filters, dir)
                .map(|_| ())
        }),
        Some(Commands::SendReport { range }) => {
            cli::report::run(cli::build_api(&settings).as_ref(), &range.to_range())
        }
        Some(Commands::Config {
            export_dir,
            timeout,
        }) => cli::config::run(cli.api_url, export_dir, timeout),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
