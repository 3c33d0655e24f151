use mongodb::{Client, Database};

pub async fn get_db_client(database_url: &str, database_name: &str) -> Database {
    let client = Client::with_uri_str(database_url)
        .await
        .expect("Failed to connect to MongoDB");

    let db = client.database(database_name);

    match db.list_collection_names().await {
        Ok(collections) => {
            tracing::info!(
                "connected to database {} ({} collections)",
                database_name,
                collections.len()
            );
        }
        Err(e) => {
            tracing::warn!(
                "database {} may not exist or is inaccessible: {}",
                database_name,
                e
            );
        }
    }

    db
}
