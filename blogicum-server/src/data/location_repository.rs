use crate::domain::location::CreateLocationRequest;
use crate::domain::{DomainError, Location};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

#[async_trait]
pub trait LocationRepository: Send + Sync {
    async fn create(&self, req: CreateLocationRequest) -> Result<Location, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Location, DomainError>;
    async fn save(&self, location: &Location) -> Result<Location, DomainError>;
    async fn delete(&self, id: i64) -> Result<(), DomainError>;
}

pub struct PostgresLocationRepository {
    pool: PgPool,
}

impl PostgresLocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn location_from_row(row: &PgRow) -> Result<Location, DomainError> {
    Ok(Location {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        is_published: row.try_get("is_published")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl LocationRepository for PostgresLocationRepository {
    async fn create(&self, req: CreateLocationRequest) -> Result<Location, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO locations (name, is_published, created_at)
            VALUES ($1, $2, NOW())
            RETURNING id, name, is_published, created_at
            "#,
        )
        .bind(&req.name)
        .bind(req.is_published)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create location: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        location_from_row(&row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Location, DomainError> {
        let row = sqlx::query(
            "SELECT id, name, is_published, created_at FROM locations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => location_from_row(&row),
            None => Err(DomainError::LocationNotFound),
        }
    }

    async fn save(&self, location: &Location) -> Result<Location, DomainError> {
        let row = sqlx::query(
            r#"
            UPDATE locations
            SET name = $1, is_published = $2
            WHERE id = $3
            RETURNING id, name, is_published, created_at
            "#,
        )
        .bind(&location.name)
        .bind(location.is_published)
        .bind(location.id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => location_from_row(&row),
            None => Err(DomainError::LocationNotFound),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM locations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            Err(DomainError::LocationNotFound)
        } else {
            Ok(())
        }
    }
}
