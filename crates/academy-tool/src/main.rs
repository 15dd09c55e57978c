//! # academy
//!
//! Operator tool for an Academy store: inspect keys, print values, install
//! default datasets, move snapshots in and out, and decide pending
//! applications from the command line.

use std::fs;
use std::path::PathBuf;

use academy_portal::{Admissions, LogMailer, PortalConfig};
use academy_shared::constants::keys;
use academy_store::snapshot::Snapshot;
use academy_store::{seed, ApplicationStatus, LocalStore, StoreConfig};
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Database file. Defaults to the per-user data directory.
    #[arg(long, env = "ACADEMY_DB_PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List stored keys with their size and schema version.
    Keys,
    /// Print the value stored under a key.
    Get { key: String },
    /// Remove a key.
    Remove { key: String },
    /// Write the bundled datasets for keys that are not stored yet.
    Seed,
    /// Write every entry to a JSON snapshot file.
    Export { file: PathBuf },
    /// Load entries from a JSON snapshot file.
    Import {
        file: PathBuf,
        /// Replace keys that already exist.
        #[arg(long)]
        overwrite: bool,
    },
    /// List applications with the given status.
    Applications {
        #[arg(value_enum, default_value_t = StatusArg::Pending)]
        status: StatusArg,
    },
    /// Approve a pending application and create the student.
    Approve { id: i64 },
    /// Reject a pending application.
    Reject { id: i64 },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StatusArg {
    Pending,
    Approved,
    Rejected,
}

impl From<StatusArg> for ApplicationStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Pending => Self::Pending,
            StatusArg::Approved => Self::Approved,
            StatusArg::Rejected => Self::Rejected,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("warn,academy=info,academy_store=info,academy_portal=info")
        }))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = StoreConfig::from_env();
    if args.db.is_some() {
        config.db_path = args.db.clone();
    }
    let store = LocalStore::open(&config).context("opening store")?;
    let tab = store.open_tab();
    info!(context = %tab.context().short(), "store opened");

    match args.command {
        Command::Keys => {
            for key in tab.keys()? {
                let Some(entry) = tab.entry(&key)? else { continue };
                let known = if keys::ALL.contains(&key.as_str()) { "" } else { " (unknown)" };
                println!(
                    "{key}\t{} bytes\tv{}\trev {}{known}",
                    entry.value.len(),
                    entry.schema_version,
                    entry.revision
                );
            }
            println!("total: {} bytes of {}", store.used_bytes()?, store.quota());
        }
        Command::Get { key } => {
            let raw = tab
                .try_get_item(&key)?
                .with_context(|| format!("key {key:?} is not stored"))?;
            match serde_json::from_str::<serde_json::Value>(&raw) {
                Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                Err(_) => println!("{raw}"),
            }
        }
        Command::Remove { key } => {
            tab.remove_item(&key);
            println!("removed {key}");
        }
        Command::Seed => {
            let written = seed::install_defaults(&tab)?;
            if written.is_empty() {
                println!("all default datasets already stored");
            }
            for key in written {
                println!("seeded {key}");
            }
        }
        Command::Export { file } => {
            let snapshot = tab.export_snapshot()?;
            let json = serde_json::to_string_pretty(&snapshot)?;
            fs::write(&file, json).with_context(|| format!("writing {}", file.display()))?;
            println!("exported {} entries to {}", snapshot.entries.len(), file.display());
        }
        Command::Import { file, overwrite } => {
            let raw = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let snapshot: Snapshot = serde_json::from_str(&raw).context("parsing snapshot")?;
            let stats = tab.import_snapshot(&snapshot, overwrite)?;
            println!("imported {}, skipped {}", stats.imported, stats.skipped);
        }
        Command::Applications { status } => {
            for app in tab.applications(status.into()).list() {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    app.id,
                    app.name,
                    app.email,
                    app.program,
                    app.papers.join(",")
                );
            }
        }
        Command::Approve { id } => {
            let portal = PortalConfig::from_env();
            let mailer = LogMailer::new(portal.mail_from.clone());
            let student = Admissions::new(&tab, &mailer, portal.mail_from.clone()).approve(id)?;
            println!("approved {id}: student {} ({})", student.student_id, student.name);
            for email in mailer.outbox() {
                println!("\n--- mail to {} ---\n{}\n\n{}", email.to, email.subject, email.body);
            }
        }
        Command::Reject { id } => {
            let portal = PortalConfig::from_env();
            let mailer = LogMailer::new(portal.mail_from.clone());
            Admissions::new(&tab, &mailer, portal.mail_from).reject(id)?;
            println!("rejected {id}");
        }
    }

    Ok(())
}
