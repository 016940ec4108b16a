use sqlx::{postgres::PgPoolOptions, Executor, Pool, Postgres};

pub type Database = Postgres;

#[tracing::instrument(skip(db_uri))]
pub async fn connect(db_uri: &str, max_connections: u32) -> Result<Pool<Database>, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(db_uri)
        .await?;

    migrate(&pool).await?;

    Ok(pool)
}

// TODO: move this to sqlx migrations once the schema settles
async fn migrate(pool: &Pool<Database>) -> Result<(), sqlx::Error> {
    pool.execute("CREATE EXTENSION IF NOT EXISTS postgis").await?;

    // route service (KV store)
    pool.execute("CREATE TABLE IF NOT EXISTS routes (token UUID PRIMARY KEY, data JSONB NOT NULL)")
        .await?;

    pool.execute("CREATE TABLE IF NOT EXISTS riders (id UUID PRIMARY KEY, status VARCHAR NOT NULL, data JSONB NOT NULL)")
        .await?;

    pool.execute("CREATE TABLE IF NOT EXISTS bicycles (id UUID PRIMARY KEY, owner_id UUID NOT NULL, qr_code VARCHAR NOT NULL UNIQUE, status VARCHAR NOT NULL, data JSONB NOT NULL)")
        .await?;

    pool.execute("CREATE TABLE IF NOT EXISTS bicycle_locations (bicycle_id UUID PRIMARY KEY REFERENCES bicycles(id), location geometry(Point), expiry TIMESTAMPTZ)")
        .await?;

    pool.execute("CREATE TABLE IF NOT EXISTS rides (id UUID PRIMARY KEY, rider_id UUID NOT NULL, bicycle_id UUID NOT NULL, status VARCHAR NOT NULL, data JSONB NOT NULL)")
        .await?;

    pool.execute("CREATE TABLE IF NOT EXISTS complaints (id UUID PRIMARY KEY, author_id UUID NOT NULL, status VARCHAR NOT NULL, created_at TIMESTAMPTZ NOT NULL, data JSONB NOT NULL)")
        .await?;

    Ok(())
}
