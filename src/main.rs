mod cli;

use anyhow::Context;
use clap::Parser;
use num_format::{Locale, ToFormattedString};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use repo2text::{analyzer, get_config_path, load_config, Error};

use crate::cli::Cli;

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    setup_tracing(args.verbose);

    if args.config_path {
        let path = get_config_path()?;
        println!("{}", path.display());
        return Ok(());
    }

    let config = load_config().context("Failed to load configuration")?;
    let options = args.into_run_options(&config);

    let report = analyzer::run(&options).context("Conversion failed")?;

    for path in &report.shards {
        println!("Text file saved: {}", path.display());
    }

    if let Some(total) = report.total_tokens {
        println!(
            "Total tokens: {} across {} files",
            total.to_formatted_string(&Locale::en),
            report.files
        );
    }

    print_error_summary(&report.errors);

    Ok(())
}

fn print_error_summary(errors: &[Error]) {
    if errors.is_empty() {
        return;
    }

    println!("\nErrors encountered:");
    for error in errors {
        println!("  - {error}");
    }
}

fn setup_tracing(verbosity: u8) {
    let default_filter = match verbosity {
        0 => "repo2text=info",
        1 => "repo2text=debug",
        _ => "repo2text=trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
