use std::io::Write;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};

use crate::application::{parse_status, ParcelLedger, Registrar};
use crate::domain::{DistributionEvent, Parcel};
use crate::events::BroadcastSink;
use crate::identity::{Role, DEFAULT_MSP_ID};
use crate::storage::{IdentityRepository, SqliteStore};

/// Postal Tracking Network CLI
#[derive(Parser)]
#[command(name = "postal")]
#[command(about = "Track parcels through the postal network ledger")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "POSTAL_DATABASE", default_value = "postal.db", global = true)]
    pub database: String,

    /// Enrolled user to run commands as
    #[arg(short, long, env = "POSTAL_USER", default_value = "postalWorker", global = true)]
    pub user: String,

    /// MSP id recorded for newly enrolled identities
    #[arg(long, env = "POSTAL_MSP_ID", default_value = DEFAULT_MSP_ID, global = true)]
    pub msp_id: String,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database and enroll the admin identity
    Init,

    /// Create a new postal user
    CreateUser {
        /// Username (must be unique)
        username: String,

        /// Role: client or employee
        #[arg(default_value = "employee")]
        role: String,
    },

    /// List enrolled users
    Users,

    /// Create a new parcel
    CreateParcel {
        /// Parcel ID
        id: String,

        /// Delivery destination
        destination: String,
    },

    /// Move a parcel to a new address
    Transport {
        /// Parcel ID
        id: String,

        /// New current address
        new_address: String,
    },

    /// Change parcel status (GOOD, DAMAGED, DESTROYED)
    ChangeStatus {
        /// Parcel ID
        id: String,

        /// New status
        status: String,
    },

    /// Query parcel information
    Query {
        /// Parcel ID
        id: String,
    },

    /// Invoke a ledger function by name with raw string arguments
    Invoke {
        /// Function name: initLedger, createParcel, transport, changeStatus, queryParcel
        function: String,

        /// Positional arguments
        args: Vec<String>,
    },
}

/// An open database with the ledger and registrar wired to it.
struct Session {
    ledger: ParcelLedger<SqliteStore, BroadcastSink>,
    registrar: Registrar,
}

impl Session {
    async fn open(database: &str, msp_id: &str) -> Result<Self> {
        tracing::debug!(database, "opening ledger database");
        let store = SqliteStore::connect_path(database)
            .await
            .with_context(|| format!("Cannot open {}. Run \"postal init\" first", database))?;
        let registrar = Registrar::new(IdentityRepository::new(store.pool().clone()), msp_id);
        let ledger = ParcelLedger::new(store, BroadcastSink::default());
        Ok(Self { ledger, registrar })
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let Cli {
            database,
            user,
            msp_id,
            command,
            ..
        } = self;

        match command {
            Commands::Init => {
                let store = SqliteStore::init_path(&database).await?;
                let repo = IdentityRepository::new(store.pool().clone());
                Registrar::new(repo, &msp_id).enroll_admin().await?;
                println!("Database initialized: {}", database);
            }

            Commands::CreateUser { username, role } => {
                let session = Session::open(&database, &msp_id).await?;
                let role = Role::from_str(&role)
                    .with_context(|| format!("Invalid role '{}'. Use client or employee", role))?;
                let identity = session
                    .registrar
                    .register_user(&username, role)
                    .await
                    .context("Failed to create user")?;
                println!(
                    "Successfully created user \"{}\" with role \"{}\"",
                    identity.user_id, identity.role
                );
            }

            Commands::Users => {
                let session = Session::open(&database, &msp_id).await?;
                let identities = session.registrar.list().await?;
                println!(
                    "{:<20} {:<10} {:<12} {:<9} Enrolled",
                    "User", "Role", "MSP", "Employee"
                );
                println!("{}", "-".repeat(70));
                for identity in identities {
                    println!(
                        "{:<20} {:<10} {:<12} {:<9} {}",
                        identity.user_id,
                        identity.role,
                        identity.msp_id,
                        if identity.postal_employee { "yes" } else { "no" },
                        identity.enrolled_at.format("%Y-%m-%d %H:%M")
                    );
                }
            }

            Commands::CreateParcel { id, destination } => {
                let session = Session::open(&database, &msp_id).await?;
                let caller = session.registrar.resolve(&user).await?;
                let parcel = session
                    .ledger
                    .create_parcel(&caller, &id, &destination)
                    .await
                    .context("Failed to create parcel")?;
                print_parcel("Parcel created successfully:", &parcel)?;
            }

            Commands::Transport { id, new_address } => {
                let session = Session::open(&database, &msp_id).await?;
                session.registrar.resolve(&user).await?;
                let mut events = session.ledger.sink().subscribe();

                let parcel = session
                    .ledger
                    .transport(&id, &new_address)
                    .await
                    .context("Failed to transport parcel")?;

                let mut stdout = std::io::stdout();
                while let Ok(event) = events.try_recv() {
                    if let Some(distribution) = event.as_distribution() {
                        write_distribution(&mut stdout, &distribution)?;
                    }
                }
                print_parcel("Parcel transported successfully:", &parcel)?;
            }

            Commands::ChangeStatus { id, status } => {
                let status = parse_status(&status).context("Failed to change status")?;
                let session = Session::open(&database, &msp_id).await?;
                session.registrar.resolve(&user).await?;
                let parcel = session
                    .ledger
                    .change_status(&id, status)
                    .await
                    .context("Failed to change status")?;
                print_parcel("Status changed successfully:", &parcel)?;
            }

            Commands::Query { id } => {
                let session = Session::open(&database, &msp_id).await?;
                session.registrar.resolve(&user).await?;
                let parcel = session
                    .ledger
                    .query_parcel(&id)
                    .await
                    .context("Failed to query parcel")?;
                print_parcel("Parcel information:", &parcel)?;
            }

            Commands::Invoke { function, args } => {
                let session = Session::open(&database, &msp_id).await?;
                let caller = session.registrar.resolve(&user).await?;
                let result = session
                    .ledger
                    .invoke(&caller, &function, &args)
                    .await
                    .with_context(|| format!("Failed to invoke {}", function))?;
                println!("{}", result);
            }
        }

        Ok(())
    }
}

/// Banner shown for each delivery observed during a command.
pub fn write_distribution(out: &mut impl Write, event: &DistributionEvent) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "*** DISTRIBUTION EVENT ***")?;
    writeln!(out, "Parcel {}: {}", event.id, event.msg)
}

fn print_parcel(heading: &str, parcel: &Parcel) -> Result<()> {
    println!("{}", heading);
    println!("{}", serde_json::to_string_pretty(parcel)?);
    Ok(())
}
