mod cli;
mod commands;
mod config;
mod error;
mod output;

use crate::{
    cli::{Args, Commands},
    commands::{CandidateArgs, CommandExecutor, PreferenceArgs},
    config::AppConfig,
    error::Result,
};
use clap::Parser;
#[cfg(feature = "colored-output")]
use colored::*;
use std::process;
use tracing::{Level, debug, error};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        error!("Application error: {}", e);
        #[cfg(feature = "colored-output")]
        {
            eprintln!("{} {}", "Error:".red().bold(), e);
        }
        #[cfg(not(feature = "colored-output"))]
        {
            eprintln!("Error: {}", e);
        }
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    let config = AppConfig::load(args.config.as_deref())?;
    debug!("Loaded config: {:?}", config);

    let executor = CommandExecutor::new(config).with_overrides(
        args.timeout,
        args.proxy,
        args.proxy_username,
        args.proxy_password,
    );

    match args.command {
        Commands::Resolve {
            input,
            candidates,
            referer,
            lang,
            quality,
            server,
            language,
            subtitle_language,
            deadline,
            output,
            output_file,
        } => {
            executor
                .resolve(
                    input.as_deref(),
                    CandidateArgs {
                        candidates,
                        referer,
                        lang,
                    },
                    PreferenceArgs {
                        quality,
                        server,
                        language,
                        subtitle_language,
                    },
                    deadline,
                    output,
                    output_file.as_deref(),
                )
                .await?;
        }

        Commands::Decrypt {
            payload,
            profile,
            digest,
            key_bits,
            password,
            key,
            iv,
        } => {
            executor.decrypt(&payload, profile, digest, key_bits, password, key, iv)?;
        }

        Commands::Manifest {
            file,
            base_url,
            output,
        } => {
            executor.manifest(&file, &base_url, output)?;
        }

        Commands::Hosters { output } => {
            executor.list_hosters(output)?;
        }

        Commands::Completions { shell } => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Args::command();
            let bin_name = cmd.get_name().to_string();
            generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
        }

        Commands::Config { show, reset } => {
            if reset {
                AppConfig::reset(args.config.as_deref())?;
                println!("✓ Configuration reset to defaults");
            } else if show {
                let config = AppConfig::load(args.config.as_deref())?;
                println!("{}", config.show()?);
            } else {
                println!(
                    "Use --show to display current configuration or --reset to reset to defaults"
                );
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(verbose)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
