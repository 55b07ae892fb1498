//! Compatibility Checker Config CLI
//!
//! View and manage checker configuration.

use clap::{Parser, Subcommand};
use response_compat::CompatConfig;

#[derive(Parser)]
#[command(name = "compat-config")]
#[command(about = "View and manage compatibility checker configuration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show current configuration
    Show {
        /// Config file to load (optional)
        #[arg(short, long)]
        config: Option<String>,

        /// Output as TOML
        #[arg(long)]
        toml: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Initialize a new config file
    Init {
        /// Output path (default: compat.toml)
        #[arg(short, long, default_value = "compat.toml")]
        output: String,
    },

    /// Validate configuration
    Validate {
        /// Config file to validate
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Show { config, toml, json } => {
            let cfg = CompatConfig::load_from(config.as_deref())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&cfg)?);
            } else if toml {
                println!("{}", ::toml::to_string_pretty(&cfg)?);
            } else {
                println!("Compatibility Checker Configuration\n");
                println!("Check:");
                println!("  Number policy: {}", cfg.check.number_policy);
                println!("  Root context: {}", cfg.check.root_context);

                println!("\nFetch:");
                println!("  Timeout: {}s", cfg.fetch.timeout_secs);
                println!("  User-Agent: {}", cfg.fetch.user_agent);
                println!("  Accept: {}", cfg.fetch.accept);

                println!("\nOutput:");
                println!("  Format: {:?}", cfg.output.format);
                println!("  Show diff: {}", cfg.output.show_diff);
            }
        }

        Commands::Init { output } => {
            let cfg = CompatConfig::default();
            cfg.save(&output)?;
            println!("Created config file: {}", output);
        }

        Commands::Validate { config } => {
            match CompatConfig::load_from(config.as_deref()) {
                Ok(cfg) => {
                    println!("Configuration is valid");
                    println!("   Number policy: {}", cfg.check.number_policy);
                    println!("   Output format: {:?}", cfg.output.format);
                }
                Err(e) => {
                    eprintln!("Configuration error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
