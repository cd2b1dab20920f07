// Connexion BD partagée par tous les handlers (pool géré par SeaORM)

use sea_orm::{Database, DatabaseConnection, DbErr};
use std::env;

pub async fn establish_connection() -> Result<DatabaseConnection, DbErr> {
    let database_url = env::var("DATABASE_URL")
        .map_err(|_| DbErr::Custom("DATABASE_URL must be set in .env file".to_string()))?;

    Database::connect(&database_url).await
}
