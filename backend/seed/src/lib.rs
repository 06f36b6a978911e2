use server::{
    database::{DEMO_ARTICLES, Database, StoreError},
    models::Article,
};
use tracing::{info, warn};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub created: usize,
    pub skipped: usize,
}

/// Creates each article with no upvotes and no comments over a single connection.
pub async fn seed_articles(
    database: &Database,
    names: &[String],
    reset: bool,
) -> Result<Summary, StoreError> {
    if let Database::Memory(_) = database {
        warn!("Seeding an in-memory database, nothing will outlive this process");
    }

    let names: Vec<&str> = if names.is_empty() {
        DEMO_ARTICLES.to_vec()
    } else {
        names.iter().map(String::as_str).collect()
    };

    let mut connection = database.connect().await?;
    let mut summary = Summary::default();

    for name in names {
        if connection.insert_article(&Article::new(name), reset).await? {
            info!("Seeded {name}");
            summary.created += 1;
        } else {
            info!("{name} already exists, skipping");
            summary.skipped += 1;
        }
    }

    Ok(summary)
}
