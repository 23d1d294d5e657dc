//! Binary entrypoint for the macaronbot CLI.
//!
//! Commands:
//! - `start` - run the bot against the Telegram Bot API
//! - `init` - create a starter `config.toml` and a names file in the data directory
//! - `status` - print a summary of the stored ledger
//!
//! See the library crate docs for module-level details: `macaronbot::`.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

use macaronbot::config::Config;
use macaronbot::macaron::names::DEFAULT_NAMES;
use macaronbot::storage::Store;

#[derive(Parser)]
#[command(name = "macaronbot")]
#[command(about = "A Telegram bot for sharing boxes of macarons")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Start,
    /// Write a default configuration and names file
    Init,
    /// Show ledger statistics
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Start => {
            let config = Config::load(&cli.config).await?.apply_env();
            init_logging(&Some(config.clone()), cli.verbose);
            info!("Starting macaronbot v{}", env!("CARGO_PKG_VERSION"));

            #[cfg(feature = "telegram")]
            {
                let mut server = macaronbot::macaron::BotServer::new(config).await?;
                server.run().await?;
            }

            #[cfg(not(feature = "telegram"))]
            {
                let _ = config;
                eprintln!("Error: the bot needs the 'telegram' feature.");
                eprintln!("Compile with: cargo build --features telegram");
                std::process::exit(1);
            }
        }
        Commands::Init => {
            init_logging(&None, cli.verbose);
            info!("Initializing new macaronbot configuration");
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);
            let cfg = Config::default();

            tokio::fs::create_dir_all(&cfg.storage.data_dir).await?;
            let names_path = cfg.storage.names_path();
            if tokio::fs::metadata(&names_path).await.is_err() {
                let mut names = DEFAULT_NAMES.join("\n");
                names.push('\n');
                tokio::fs::write(&names_path, names).await?;
                info!("Wrote {} starter box names to {}", DEFAULT_NAMES.len(), names_path.display());
            }
        }
        Commands::Status => {
            let config = Config::load(&cli.config).await?;
            init_logging(&Some(config.clone()), cli.verbose);
            let store = Store::open(&config.storage.data_dir, &config.storage.db_file).await?;
            let ledger = store.ledger();
            let remaining: usize = ledger.boxes.iter().map(|b| b.grid.remaining()).sum();
            println!("Data directory: {}", store.data_dir().display());
            println!("Ledger: {}", store.db_path().display());
            println!("Users: {}", ledger.users.len());
            println!("Boxes: {} ({} macarons left)", ledger.boxes.len(), remaining);
            println!("Pending requests: {}", ledger.requests.len());
            for b in &ledger.boxes {
                let (rows, cols) = b.grid.dimensions();
                println!(
                    "  {} owner={} eaters={} {}x{} left={}",
                    b.name,
                    b.owner,
                    b.eaters.len(),
                    rows,
                    cols,
                    b.grid.remaining()
                );
            }
        }
    }

    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity wins over the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse::<log::LevelFilter>().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config
        .as_ref()
        .and_then(|c| c.logging.file.clone())
        .and_then(|path| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Echo to the console only when someone is watching
        let is_tty = atty::is(atty::Stream::Stdout);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
