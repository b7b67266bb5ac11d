//! Database seeder for Quotely.
//!
//! Creates the default admin company and user on an empty database so a
//! fresh install can be logged into. Running it again is a no-op.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use quotely_core::auth::hash_password;
use quotely_db::{
    CompanyRepository, UserRepository,
    repositories::{CompanyError, RegisterInput},
};
use quotely_shared::AppConfig;

const ADMIN_COMPANY: &str = "Admin Company";
const ADMIN_EMAIL: &str = "admin@quotesystem.com";
const ADMIN_PASSWORD: &str = "123456";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let db = Arc::new(
        quotely_db::connect(&config.database)
            .await
            .context("Failed to connect to database")?,
    );

    let users = UserRepository::new(db.clone()).count().await?;
    if users > 0 {
        info!(users, "Users already exist, skipping seed");
        return Ok(());
    }

    let input = RegisterInput {
        company_name: ADMIN_COMPANY.to_string(),
        logo_url: None,
        first_name: "Admin".to_string(),
        last_name: "User".to_string(),
        email: ADMIN_EMAIL.to_string(),
        password_hash: hash_password(ADMIN_PASSWORD)?,
    };

    match CompanyRepository::new(db).register(input).await {
        Ok((company, user)) => {
            info!(
                company_id = %company.id,
                user_id = %user.id,
                email = ADMIN_EMAIL,
                "Seeded admin company and user"
            );
        }
        Err(CompanyError::NameTaken(name)) => {
            info!(company = %name, "Admin company already exists, skipping seed");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
