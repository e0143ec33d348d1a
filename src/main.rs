use clap::{Parser, Subcommand, builder::styling};
use eyre::Result;
use owo_colors::OwoColorize;
use tickerload::cli::{
    FetchOptions, create_table_statement, fetch_to_ndjson, load_dotenv, load_from_ndjson,
    run_job,
};

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// Ticker Loader: pulls the Polygon.io stock ticker universe into Snowflake, once per run
#[derive(Parser)]
#[command(name = "tickerload", version, styles = STYLES)]
struct Cli {
    /// The dotenv file to source credentials from
    #[arg(short, long, global = true, default_value = ".env")]
    env: String,

    /// More verbose logging
    #[arg(long, global = true)]
    debug: bool,

    /// Command to execute (defaults to `run`)
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every active stock ticker and load it into Snowflake
    Run {
        /// Run date to stamp on every ticker (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        ds: Option<String>,

        /// Page size requested from Polygon.io
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Fetch every active stock ticker to an NDJSON file
    Fetch {
        /// NDJSON file to write
        #[arg(short, long, default_value = "tickers.ndjson")]
        output: String,

        /// Run date to stamp on every ticker (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        ds: Option<String>,

        /// Page size requested from Polygon.io
        #[arg(short, long)]
        limit: Option<u32>,
    },

    /// Load an NDJSON file written by `fetch` into Snowflake
    Load {
        /// NDJSON file to read
        #[arg(short, long, default_value = "tickers.ndjson")]
        input: String,
    },

    /// Print the CREATE TABLE statement for the destination table
    Ddl,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let env_loaded = load_dotenv(&cli.env)?;

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    if env_loaded {
        log::debug!("Loaded environment from {}", cli.env.bright_black());
    } else {
        log::debug!("No dotenv file at {}, using process environment", cli.env.bright_black());
    }

    match cli.command.unwrap_or(Commands::Run {
        ds: None,
        limit: None,
    }) {
        Commands::Run { ds, limit } => {
            log::info!("Running ticker load");
            run_job(&FetchOptions {
                limit,
                run_date: ds,
            })
            .await?;
        }
        Commands::Fetch { output, ds, limit } => {
            log::info!("Fetching tickers to: {}", output.bright_black());
            fetch_to_ndjson(
                &output,
                &FetchOptions {
                    limit,
                    run_date: ds,
                },
            )
            .await?;
        }
        Commands::Load { input } => {
            log::info!("Loading tickers from: {}", input.bright_black());
            load_from_ndjson(&input).await?;
        }
        Commands::Ddl => {
            println!("{};", create_table_statement());
        }
    }

    Ok(())
}
