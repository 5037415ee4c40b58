//! restctl: sign in, browse and edit profiles, and run ad-hoc queries against
//! a PostgREST backend. Every command prints its result envelope as JSON.

use clap::{Parser, Subcommand};
use client_core::observability::init_tracing;
use rest_client::config::get_configuration;
use rest_client::models::{NewProfile, ProfileUpdate, SignInCredentials, SignUpCredentials};
use rest_client::services::{FileSessionStore, ProfileRepository, SessionStore};
use rest_client::{OrderOptions, RestClient};
use secrecy::Secret;
use serde::Serialize;
use serde_json::Value;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "restctl")]
#[command(author, version, about = "Command-line client for a PostgREST backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a new account (does not sign in)
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long, env = "RESTCTL_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        full_name: String,
    },

    /// Sign in and persist the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "RESTCTL_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the persisted session
    Logout,

    /// Show the persisted session
    Whoami,

    /// Manage rows of the profiles table
    #[command(subcommand)]
    Profiles(ProfilesCommand),

    /// Read rows from any table
    Query {
        table: String,

        /// Comma-separated columns
        #[arg(long, default_value = "*")]
        select: String,

        /// Equality filter, repeatable (column=value)
        #[arg(long = "eq", value_name = "COLUMN=VALUE", value_parser = parse_pair)]
        filters: Vec<(String, String)>,

        /// Column to order by
        #[arg(long)]
        order: Option<String>,

        /// Order descending instead of ascending
        #[arg(long, requires = "order")]
        desc: bool,

        #[arg(long)]
        limit: Option<u64>,

        /// Expect exactly one row
        #[arg(long)]
        single: bool,
    },

    /// Call a database function
    Rpc {
        function: String,

        /// JSON arguments
        #[arg(long, value_parser = parse_json)]
        params: Option<Value>,
    },
}

#[derive(Subcommand, Debug)]
enum ProfilesCommand {
    /// List profiles, newest first
    List,

    Get { id: String },

    Create {
        #[arg(long)]
        email: String,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        phone: Option<String>,
    },

    /// Change only the given fields
    Update {
        id: String,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        avatar_url: Option<String>,
    },

    Delete { id: String },
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(column, _)| !column.is_empty())
        .map(|(column, value)| (column.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected COLUMN=VALUE, got '{}'", raw))
}

fn parse_json(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {}", e))
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let settings = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    init_tracing(
        "restctl",
        &settings.logging.level,
        settings.logging.otlp_endpoint.as_deref(),
    )?;

    let store: Arc<dyn SessionStore> = Arc::new(FileSessionStore::new(settings.session.path.clone()));
    let client = RestClient::new(&settings.api, store)?;

    let succeeded = run(cli.command, client).await?;
    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn run(command: Command, client: RestClient) -> anyhow::Result<bool> {
    match command {
        Command::Signup {
            email,
            password,
            full_name,
        } => {
            let credentials = SignUpCredentials {
                email,
                password: Secret::new(password),
                full_name,
            };
            let response = client.auth().sign_up(&credentials).await;
            emit(&response, response.error.is_none())
        }
        Command::Login { email, password } => {
            let credentials = SignInCredentials {
                email,
                password: Secret::new(password),
            };
            let response = client.auth().sign_in_with_password(&credentials).await;
            emit(&response, response.error.is_none())
        }
        Command::Logout => {
            let response = client.auth().sign_out().await;
            emit(&response, true)
        }
        Command::Whoami => {
            let response = client.auth().get_session().await;
            emit(&response, response.data.session.is_some())
        }
        Command::Profiles(command) => run_profiles(command, ProfileRepository::new(client)).await,
        Command::Query {
            table,
            select,
            filters,
            order,
            desc,
            limit,
            single,
        } => {
            let mut query = client.from(&table).select(&select);
            for (column, value) in filters {
                query = query.eq(&column, value);
            }
            if let Some(column) = order {
                let options = if desc {
                    OrderOptions::descending()
                } else {
                    OrderOptions::ascending()
                };
                query = query.order(&column, options);
            }
            if let Some(limit) = limit {
                query = query.limit(limit);
            }
            if single {
                query = query.single();
            }

            let result = query.execute().await;
            emit(&result, result.is_ok())
        }
        Command::Rpc { function, params } => {
            let result = client.rpc(&function, &params).execute().await;
            emit(&result, result.is_ok())
        }
    }
}

async fn run_profiles(command: ProfilesCommand, profiles: ProfileRepository) -> anyhow::Result<bool> {
    match command {
        ProfilesCommand::List => {
            let result = profiles.list().await;
            emit(&result, result.is_ok())
        }
        ProfilesCommand::Get { id } => {
            let result = profiles.get(&id).await;
            emit(&result, result.is_ok())
        }
        ProfilesCommand::Create {
            email,
            full_name,
            phone,
        } => {
            let result = profiles
                .create(&NewProfile {
                    email,
                    full_name,
                    phone,
                })
                .await;
            emit(&result, result.is_ok())
        }
        ProfilesCommand::Update {
            id,
            full_name,
            phone,
            avatar_url,
        } => {
            let changes = ProfileUpdate {
                full_name,
                phone,
                avatar_url,
                notification_preferences: None,
            };
            let result = profiles.update(&id, &changes).await;
            emit(&result, result.is_ok())
        }
        ProfilesCommand::Delete { id } => {
            let result = profiles.delete(&id).await;
            emit(&result, result.is_ok())
        }
    }
}

fn emit<T: Serialize>(value: &T, succeeded: bool) -> anyhow::Result<bool> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(succeeded)
}
