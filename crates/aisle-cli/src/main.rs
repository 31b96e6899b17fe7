mod annotate;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "aisle")]
#[command(about = "Annotate products with per-retailer category breadcrumbs")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Process product rows: fetch, extract, score, and emit aisles
    Run {
        /// Maximum number of rows to process
        limit: Option<i64>,

        /// Write the CSV preview only; skip database writes
        #[arg(long)]
        preview_only: bool,
    },
    /// Run a single-URL extraction diagnostic and print the outcome
    Test {
        /// Product page URL
        url: String,

        /// Retailer name (guessed from the URL host when omitted)
        retailer: Option<String>,
    },
    /// Database management commands
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Test the database connection
    Ping,
    /// Run pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| {
        let level = std::env::var("AISLE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        EnvFilter::try_new(level)
    })?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Run {
            limit,
            preview_only,
        }) => {
            let config = load_config_or_exit();
            annotate::run_annotation(&config, limit, preview_only).await?;
        }
        Some(Commands::Test { url, retailer }) => {
            let config = load_config_or_exit();
            annotate::run_test_url(&config, &url, retailer.as_deref()).await?;
        }
        Some(Commands::Db { command }) => match command {
            DbCommands::Ping => run_db_ping().await?,
            DbCommands::Migrate => run_db_migrate().await?,
        },
        None => println!("aisle: use `run`, `test <url>`, or `db` (see --help)"),
    }

    Ok(())
}

async fn run_db_ping() -> anyhow::Result<()> {
    let pool = connect_or_exit().await;
    aisle_db::ping(&pool).await?;
    println!("database is healthy");
    Ok(())
}

async fn run_db_migrate() -> anyhow::Result<()> {
    let pool = connect_or_exit().await;
    aisle_db::run_migrations(&pool).await?;
    println!("migrations are up to date");
    Ok(())
}

fn load_config_or_exit() -> aisle_core::AppConfig {
    aisle_core::load_app_config().unwrap_or_else(|e| {
        eprintln!("error: invalid configuration: {e}");
        std::process::exit(1);
    })
}

async fn connect_or_exit() -> sqlx::PgPool {
    aisle_db::connect_pool_from_env().await.unwrap_or_else(|e| {
        match &e {
            aisle_db::DbError::MissingDatabaseUrl => {
                eprintln!("error: database credentials are not set");
                eprintln!("hint: set PGHOST, PGDATABASE, PGUSER, and PGPASSWORD (or PREVIEW_ONLY=1)");
            }
            aisle_db::DbError::Sqlx(sql_err) => {
                eprintln!("error: failed to connect to database: {sql_err}");
            }
            aisle_db::DbError::Config(cfg_err) => {
                eprintln!("error: invalid configuration: {cfg_err}");
            }
            aisle_db::DbError::Migration(mig_err) => {
                eprintln!("error: unexpected migration error during connect: {mig_err}");
            }
        }
        std::process::exit(1);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_without_limit() {
        let cli = Cli::try_parse_from(["aisle", "run"]).expect("valid cli args");
        assert!(matches!(
            cli.command,
            Some(Commands::Run {
                limit: None,
                preview_only: false
            })
        ));
    }

    #[test]
    fn parses_run_with_limit_and_preview_flag() {
        let cli =
            Cli::try_parse_from(["aisle", "run", "250", "--preview-only"]).expect("valid cli args");
        assert!(matches!(
            cli.command,
            Some(Commands::Run {
                limit: Some(250),
                preview_only: true
            })
        ));
    }

    #[test]
    fn parses_test_with_url_only() {
        let cli = Cli::try_parse_from(["aisle", "test", "https://www.tesco.com/p/1"])
            .expect("valid cli args");
        assert!(matches!(
            cli.command,
            Some(Commands::Test { ref url, retailer: None }) if url == "https://www.tesco.com/p/1"
        ));
    }

    #[test]
    fn parses_test_with_retailer() {
        let cli = Cli::try_parse_from(["aisle", "test", "https://example.com/p/1", "tesco"])
            .expect("valid cli args");
        assert!(matches!(
            cli.command,
            Some(Commands::Test { retailer: Some(ref r), .. }) if r == "tesco"
        ));
    }

    #[test]
    fn parses_db_subcommands() {
        let cli = Cli::try_parse_from(["aisle", "db", "ping"]).expect("valid cli args");
        assert!(matches!(
            cli.command,
            Some(Commands::Db {
                command: DbCommands::Ping
            })
        ));

        let cli = Cli::try_parse_from(["aisle", "db", "migrate"]).expect("valid cli args");
        assert!(matches!(
            cli.command,
            Some(Commands::Db {
                command: DbCommands::Migrate
            })
        ));
    }

    #[test]
    fn no_command_is_none() {
        let cli = Cli::try_parse_from(["aisle"]).expect("valid cli args");
        assert!(cli.command.is_none());
    }
}
