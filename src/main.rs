use finflow::provision::{ProvisionPlan, Provisioner};
use finflow::{FinanceStore, FinflowError};
use mimalloc::MiMalloc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const USAGE: &str = "\
finflow: campaign-finance pipeline store tooling

USAGE:
    finflow <COMMAND>

COMMANDS:
    provision      create/converge the three access roles and their grants
    verify         check the live privilege matrix against expectations
    init-schema    create the campaign-finance tables if missing
    migrate        reconcile hash columns and indexes on older databases
    run            run the FEC extract-transform-load pipeline
";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = &finflow::config::CONFIG;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    let command = std::env::args().nth(1).unwrap_or_else(|| "help".to_string());
    match command.as_str() {
        "provision" => {
            let plan = ProvisionPlan::from_config(cfg)?;
            let pool = finflow::db::connect().await?;
            let outcomes = Provisioner::new(pool).apply(&plan).await?;
            for outcome in &outcomes {
                info!(
                    role = outcome.role,
                    created = outcome.created,
                    "role provisioned"
                );
            }
            info!(database = %cfg.db_name, "provisioning committed");
        }
        "verify" => {
            let pool = finflow::db::connect().await?;
            let violations = finflow::verify::check(&pool, &cfg.db_name).await?;
            if violations.is_empty() {
                info!(database = %cfg.db_name, "privilege matrix matches expectations");
            } else {
                for violation in &violations {
                    error!(%violation, "privilege matrix violation");
                }
                return Err(FinflowError::GrantMismatch(violations.len()).into());
            }
        }
        "init-schema" => {
            let pool = finflow::db::connect().await?;
            FinanceStore::new(pool).init_schema().await?;
            info!(database = %cfg.db_name, "schema initialized");
        }
        "migrate" => {
            let pool = finflow::db::connect().await?;
            let log = finflow::migrate::run(&pool).await?;
            info!(
                applied = log.applied.len(),
                skipped = log.skipped.len(),
                "migrations reconciled"
            );
        }
        "run" => {
            let pool = finflow::db::connect().await?;
            let store = FinanceStore::new(pool);
            let summary = finflow::etl::run(&store).await?;
            info!(
                inserted = summary.contributions_inserted,
                skipped = summary.contributions_skipped,
                "ETL finished"
            );
        }
        "help" | "--help" | "-h" => {
            print!("{USAGE}");
        }
        other => {
            eprint!("{USAGE}");
            return Err(FinflowError::UnknownCommand(other.to_string()).into());
        }
    }
    Ok(())
}
