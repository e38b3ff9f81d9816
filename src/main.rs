use adinusa_provider::class::{self, ClassSpec, ClassState};
use adinusa_provider::enrollment::{self, EnrollmentSpec, EnrollmentState};
use adinusa_provider::{ProviderConfig, Session};
use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::{de::DeserializeOwned, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "adinusa", about = "Apply class and enrollment records to the Adinusa API")]
struct Cli {
    #[arg(long, env = "MAIN_API_URL")]
    main_api_url: Option<String>,
    #[arg(long, env = "API_URL")]
    api_url: Option<String>,
    #[arg(long, env = "ADINUSA_USERNAME")]
    username: Option<String>,
    #[arg(long, env = "ADINUSA_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    #[arg(long, env = "ADINUSA_REVOKE_ACK")]
    revoke_ack: Option<String>,
    #[command(subcommand)]
    kind: Kind,
}

#[derive(Subcommand, Debug)]
enum Kind {
    /// Manage a class (batch)
    Class {
        #[command(subcommand)]
        op: Op,
    },
    /// Manage an enrollment
    Enrollment {
        #[command(subcommand)]
        op: Op,
    },
}

#[derive(Subcommand, Debug)]
enum Op {
    /// Check that referenced course/class exist without changing anything
    Validate {
        #[arg(long)]
        spec: PathBuf,
    },
    Create {
        #[arg(long)]
        spec: PathBuf,
    },
    Read {
        #[arg(long)]
        state: PathBuf,
    },
    Update {
        #[arg(long)]
        state: PathBuf,
        #[arg(long)]
        spec: PathBuf,
    },
    Delete {
        #[arg(long)]
        state: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "adinusa_provider=info,adinusa=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let cfg = config_from(&cli)?;
    let session = Session::login(&cfg).await.context("login failed")?;

    match cli.kind {
        Kind::Class { op } => run_class(&session, op).await,
        Kind::Enrollment { op } => run_enrollment(&session, op).await,
    }
}

fn config_from(cli: &Cli) -> anyhow::Result<ProviderConfig> {
    let field = |v: &Option<String>, name: &str| {
        v.clone()
            .with_context(|| format!("{name} is required (flag or environment)"))
    };
    let mut cfg = ProviderConfig::new(
        field(&cli.main_api_url, "main_api_url")?,
        field(&cli.api_url, "api_url")?,
        field(&cli.username, "username")?,
        field(&cli.password, "password")?,
    )?;
    if let Some(ack) = cli.revoke_ack.as_ref().filter(|s| !s.is_empty()) {
        cfg = cfg.with_revoke_ack(ack.clone());
    }
    Ok(cfg)
}

async fn run_class(session: &Session, op: Op) -> anyhow::Result<()> {
    match op {
        Op::Validate { spec } => {
            let spec: ClassSpec = load(&spec).await?;
            spec.validate()?;
            adinusa_provider::lookup::resolve_course_id(session, &spec.course_name).await?;
            tracing::info!(class = %spec.class_name, "class record is valid");
        }
        Op::Create { spec } => {
            let spec: ClassSpec = load(&spec).await?;
            match class::create(session, &spec).await {
                Ok(state) => emit(&state)?,
                Err(e) => {
                    // keep the new ID so a follow-up update can finish activation
                    if let Some(state) = class::created_before_failure(&e, &spec) {
                        emit(&state)?;
                    }
                    return Err(e.into());
                }
            }
        }
        Op::Read { state } => {
            let state: ClassState = load(&state).await?;
            emit(&class::read(session, state.id).await?)?;
        }
        Op::Update { state, spec } => {
            let prior: ClassState = load(&state).await?;
            let desired: ClassSpec = load(&spec).await?;
            emit(&class::update(session, prior.id, &prior.spec, &desired).await?)?;
        }
        Op::Delete { state } => {
            let state: ClassState = load(&state).await?;
            class::delete(session, state.id).await?;
        }
    }
    Ok(())
}

async fn run_enrollment(session: &Session, op: Op) -> anyhow::Result<()> {
    match op {
        Op::Validate { spec } => {
            let spec: EnrollmentSpec = load(&spec).await?;
            let (course_id, batch_id) = enrollment::validate(session, &spec).await?;
            tracing::info!(course_id, batch_id, "enrollment record is valid");
        }
        Op::Create { spec } => {
            let spec: EnrollmentSpec = load(&spec).await?;
            emit(&enrollment::create(session, &spec).await?)?;
        }
        Op::Read { state } => {
            let state: EnrollmentState = load(&state).await?;
            emit(&enrollment::read(session, &state.spec).await?)?;
        }
        Op::Update { state, spec } => {
            let prior: EnrollmentState = load(&state).await?;
            let desired: EnrollmentSpec = load(&spec).await?;
            emit(&enrollment::update(session, &prior.spec, &desired).await?)?;
        }
        Op::Delete { state } => {
            let state: EnrollmentState = load(&state).await?;
            enrollment::delete(session, &state.spec).await?;
        }
    }
    Ok(())
}

async fn load<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn emit<T: Serialize>(state: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(state)?);
    Ok(())
}
