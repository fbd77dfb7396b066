use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use auth::Authenticator;
use auth::Identity;
use auth::SystemClock;
use authctl::commands;
use authctl::config::Config;
use clap::Parser;
use clap::Subcommand;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "authctl")]
#[command(author, version, about = "Issue and check access tokens and password records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue an access token for an identity
    Issue {
        #[arg(long)]
        id: String,

        /// Display name
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        /// Extra claim as key=value (repeatable; JSON values accepted)
        #[arg(long = "claim", value_parser = commands::parse_claim)]
        claims: Vec<(String, serde_json::Value)>,
    },

    /// Validate an access token and print its claims
    Validate {
        token: String,

        /// Skip the expiry window (signature, issuer and audience still checked)
        #[arg(long)]
        lenient: bool,
    },

    /// Hash a password into a storable record
    Hash { password: String },

    /// Check a password against a stored record
    Verify { record: String, password: String },
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authctl=info,auth=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::load().context("Failed to load configuration")?;
    tracing::info!(
        issuer = %config.jwt.issuer,
        audience = %config.jwt.audience,
        expires_in_minutes = config.jwt.expires_in_minutes,
        memory_kib = config.password.memory_kib,
        iterations = config.password.iterations,
        "Configuration loaded"
    );

    let authenticator = Authenticator::new(config.jwt, &config.password, Arc::new(SystemClock))
        .context("Invalid authentication configuration")?;

    let output = match cli.command {
        Commands::Issue {
            id,
            name,
            email,
            claims,
        } => commands::issue(&authenticator, &Identity::new(id, name, email), claims)?,
        Commands::Validate { token, lenient } => {
            commands::validate(&authenticator, &token, lenient)?
        }
        Commands::Hash { password } => commands::hash(&authenticator, &password)?,
        Commands::Verify { record, password } => {
            commands::verify(&authenticator, &record, &password)
        }
    };

    println!("{}", output.stdout);

    Ok(if output.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
