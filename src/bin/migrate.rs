use anyhow::Context;
use bengale_checkout::{
    config::AppConfig,
    db::{MIGRATIONS_DIR, create_orm_conn, run_migrations},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new("info"))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let database_url = config
        .database_url
        .context("DATABASE_URL must be set to run migrations")?;
    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm, MIGRATIONS_DIR).await?;
    println!("Migrations applied");
    Ok(())
}
