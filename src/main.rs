//! Tour Roster operator CLI
//!
//! Runs against the SQLite local store. No hosted remote adapter is linked in, so
//! every command operates in local mode.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tour_roster::db::{self, SqliteLocalStore};
use tour_roster::domain::phone_tail;
use tour_roster::models::RosterData;
use tour_roster::share;
use tour_roster::{Config, Notice, OrchestratorOptions, Session, SyncOrchestrator};

#[derive(Parser)]
#[command(name = "tour-roster", version, about = "Tour-bus roster check-in")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the sync mode and boarding progress of every bus
    Status,
    /// Save the cloud configuration carried by a magic link
    Setup { url: String },
    /// Print the magic link for the saved cloud configuration
    Share { base_url: String },
    /// Append members from a text file to the leader's bus
    Import {
        #[arg(long)]
        user: String,
        #[arg(long)]
        password: String,
        file: PathBuf,
    },
    /// Check a passenger in by the last 3 digits of their phone
    CheckIn {
        #[arg(long)]
        bus: String,
        code: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Database path: {:?}", config.db_path);
    tracing::debug!("App id: {}", config.app_id);

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let local = Arc::new(SqliteLocalStore::new(pool));

    match cli.command {
        Command::Setup { url } => match share::ingest_magic_link(&*local, &url).await? {
            Some(import) => {
                print_notice(&import.notice());
                println!("{}", import.clean_url);
            }
            None => println!("No valid setup code in that link"),
        },
        Command::Status => {
            let session = open_session(&config, local).await;
            let orchestrator = session.orchestrator();
            println!("Mode: {}", orchestrator.mode_kind());
            for bus_id in orchestrator.data().tours.keys() {
                if let Some(summary) = orchestrator.summary(bus_id) {
                    println!(
                        "{:<8} {:<16} {}/{} boarded",
                        bus_id,
                        summary.bus_name,
                        summary.boarded.len(),
                        summary.total()
                    );
                    for member in &summary.pending {
                        println!(
                            "         waiting: {} (...{})",
                            member.name,
                            phone_tail(&member.phone)
                        );
                    }
                }
            }
        }
        Command::Share { base_url } => {
            let session = open_session(&config, local).await;
            let outcome = session.share_link(&base_url, None).await?;
            println!("{}", outcome.url());
            println!("QR code: {}", session.qr_code_url(outcome.url()));
        }
        Command::Import {
            user,
            password,
            file,
        } => {
            let text = tokio::fs::read_to_string(&file).await?;
            let mut session = open_session(&config, local).await;
            session.login_leader(&user, &password)?;
            let added = session.import_members(&text).await?;
            println!("Imported {} members", added);
        }
        Command::CheckIn { bus, code } => {
            let mut session = open_session(&config, local).await;
            session.enter_member_scan(&bus);
            let outcome = session.check_in(&code).await?;
            print_notice(&outcome.notice());
        }
    }

    Ok(())
}

/// Start the orchestrator in local mode and wrap it in a session.
async fn open_session(config: &Config, local: Arc<SqliteLocalStore>) -> Session {
    let orchestrator = SyncOrchestrator::start(OrchestratorOptions {
        app_id: config.app_id.clone(),
        local,
        remote: None,
        seed: RosterData::seed(),
    })
    .await;
    let mut session = Session::new(orchestrator, config.admin_password.clone());
    for notice in session.orchestrator_mut().take_notices() {
        print_notice(&notice);
    }
    session
}

fn print_notice(notice: &Notice) {
    println!("{}: {}", notice.title, notice.message);
}
