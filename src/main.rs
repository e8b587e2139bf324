//! AlloyDB Connector - Demo Entry Point
//!
//! Initializes the database from `DB_*` environment variables, creates a
//! `users` table from its entity definition, inserts a row and queries it back.

use anyhow::Context;
use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Schema, Set};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use alloydb_connector::{get_db, init_db, version};

mod user {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub name: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "alloydb_connector=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(version = version(), "Starting AlloyDB connector demo");

    init_db().await.context("failed to initialize database")?;
    let db = get_db()
        .context("database handle missing after initialization")?
        .orm();

    // Create the table from the entity definition
    let backend = db.get_database_backend();
    let mut create_table = Schema::new(backend).create_table_from_entity(user::Entity);
    create_table.if_not_exists();
    db.execute(backend.build(&create_table))
        .await
        .context("failed to migrate users table")?;

    let new_user = user::ActiveModel {
        name: Set("demo user".to_string()),
        ..Default::default()
    };
    match new_user.insert(db).await {
        Ok(created) => tracing::info!(id = created.id, "Created user"),
        Err(e) => tracing::error!(error = %e, "Failed to create user"),
    }

    match user::Entity::find().all(db).await {
        Ok(users) => tracing::info!(count = users.len(), "Queried users"),
        Err(e) => tracing::error!(error = %e, "Failed to query users"),
    }

    Ok(())
}
