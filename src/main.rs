mod colors;
mod commands;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use datepoll_core::config::DatePollConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "datepoll")]
#[command(
    about = "Mark the dates that suit you, see which ones suit everyone, and share them as a link"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Identify yourself as a participant
    Join { name: String },

    /// Show who you are identified as
    Whoami,

    /// Select or unselect dates (YYYY-MM-DD)
    Toggle {
        #[arg(required = true)]
        dates: Vec<String>,
    },

    /// Show the month calendar with everyone's picks
    Show {
        /// Month to show (YYYY-MM), defaults to the current month
        #[arg(short, long)]
        month: Option<String>,

        /// Go back a month (repeat for more)
        #[arg(long, action = ArgAction::Count)]
        prev: u8,

        /// Go forward a month (repeat for more)
        #[arg(long, action = ArgAction::Count)]
        next: u8,

        /// View a share link (URL or token) without touching local data
        #[arg(long)]
        link: Option<String>,
    },

    /// List the most preferred dates
    Top {
        /// How many dates to list
        #[arg(short)]
        n: Option<usize>,

        /// Rank a share link (URL or token) instead of local data
        #[arg(long)]
        link: Option<String>,
    },

    /// Print a link that carries everyone's current picks
    Share {
        /// Print only the token, not the full URL
        #[arg(long)]
        token: bool,
    },

    /// Open a share link
    Open {
        link: String,

        /// Replace local selections with the shared ones
        #[arg(long)]
        adopt: bool,
    },

    /// Replace local selections with a JSON file ({"name": ["YYYY-MM-DD", ...]})
    Import { path: PathBuf },
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = DatePollConfig::load()?;

    match cli.command {
        Commands::Join { name } => commands::join::run(&config, &name),
        Commands::Whoami => commands::whoami::run(&config),
        Commands::Toggle { dates } => commands::toggle::run(&config, &dates),
        Commands::Show {
            month,
            prev,
            next,
            link,
        } => {
            let offset = i32::from(next) - i32::from(prev);
            commands::show::run(&config, month.as_deref(), offset, link.as_deref())
        }
        Commands::Top { n, link } => commands::top::run(&config, n, link.as_deref()),
        Commands::Share { token } => commands::share::run(&config, token),
        Commands::Open { link, adopt } => commands::open::run(&config, &link, adopt),
        Commands::Import { path } => commands::import::run(&config, &path),
    }
}

/// Log to stderr, filtered by RUST_LOG (warnings only by default).
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
