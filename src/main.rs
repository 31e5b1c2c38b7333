use clap::{Parser, Subcommand, builder::styling};
use owo_colors::OwoColorize;
use salesforce_extract::{ExtractError, cli};
use salesforce_extract::config::DEFAULT_CONFIG_PATH;

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// Salesforce extract: pull one object's records into a CSV file
#[derive(Parser)]
#[command(name = "sfx", version, styles = STYLES)]
struct Cli {
    /// YAML file holding the `salesforce` credentials group [env: SF_CONFIG]
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Login domain, e.g. `login`, `test`, or `mycompany.my` [env: SF_DOMAIN]
    #[arg(short, long, global = true)]
    domain: Option<String>,

    /// The dotenv file to source defaults from
    #[arg(short, long, global = true, default_value = ".env")]
    env: String,

    /// More verbose logging
    #[arg(long, global = true)]
    debug: bool,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every record of an object and save it as CSV
    Extract {
        /// Object to query, e.g. Account
        entity: String,

        /// Comma-separated fields to select; all fields when omitted
        #[arg(short, long)]
        fields: Vec<String>,

        /// CSV file to write; defaults to <ENTITY>.csv
        #[arg(short, long)]
        output: Option<String>,
    },

    /// List the field names of an object
    Describe {
        /// Object to describe, e.g. Contact
        entity: String,
    },

    /// Test authorization against Salesforce
    Auth,
}

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    let env_loaded = dotenvy::from_filename(&args.env).is_ok();

    let log_level = match args.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    if env_loaded {
        log::debug!("Sourced defaults from {}", args.env);
    }

    let config = args
        .config
        .or_else(|| std::env::var("SF_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let domain = args.domain.or_else(|| std::env::var("SF_DOMAIN").ok());

    // Error messages carry their own "Error" prefix
    if let Err(err) = run(args.command, &config, domain).await {
        log::debug!("Extraction stopped at stage: {}", err.stage());
        eprintln!("{}", err.to_string().red());
        std::process::exit(1);
    }
}

async fn run(command: Commands, config: &str, domain: Option<String>) -> Result<(), ExtractError> {
    match command {
        Commands::Extract {
            entity,
            fields,
            output,
        } => {
            log::info!("Using credentials from {}", config.bright_black());
            let summary =
                cli::extract(config, domain, &entity, &fields, output.as_deref()).await?;
            log::info!(
                "✓ {} ({} {} record(s))",
                summary.green(),
                summary.records,
                summary.entity.cyan()
            );
        }
        Commands::Describe { entity } => {
            let fields = cli::describe(config, domain, &entity).await?;
            for field in fields {
                println!("{}", field);
            }
        }
        Commands::Auth => {
            log::info!("Testing authorization");
            let instance = cli::auth(config, domain).await?;
            log::info!("✓ Authenticated to {}", instance.bright_black());
        }
    }

    Ok(())
}
