use crate::domain::category::CreateCategoryRequest;
use crate::domain::{Category, DomainError};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn create(&self, req: CreateCategoryRequest) -> Result<Category, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Category, DomainError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Category, DomainError>;
    async fn save(&self, category: &Category) -> Result<Category, DomainError>;
    /// Posts in the category keep existing with `category_id` set to null.
    async fn delete(&self, id: i64) -> Result<(), DomainError>;
}

pub struct PostgresCategoryRepository {
    pool: PgPool,
}

impl PostgresCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const CATEGORY_COLUMNS: &str = "id, title, description, slug, is_published, created_at";

fn category_from_row(row: &PgRow) -> Result<Category, DomainError> {
    Ok(Category {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        slug: row.try_get("slug")?,
        is_published: row.try_get("is_published")?,
        created_at: row.try_get("created_at")?,
    })
}

fn map_write_error(err: sqlx::Error, slug: &str) -> DomainError {
    match err.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => DomainError::SlugTaken(slug.to_string()),
        _ => {
            tracing::error!("Failed to write category: {}", err);
            DomainError::DatabaseError(err.to_string())
        }
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn create(&self, req: CreateCategoryRequest) -> Result<Category, DomainError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO categories (title, description, slug, is_published, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        ))
        .bind(&req.title)
        .bind(&req.description)
        .bind(&req.slug)
        .bind(req.is_published)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &req.slug))?;

        category_from_row(&row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Category, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM categories WHERE id = $1",
            CATEGORY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => category_from_row(&row),
            None => Err(DomainError::CategoryNotFound),
        }
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Category, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM categories WHERE slug = $1",
            CATEGORY_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => category_from_row(&row),
            None => Err(DomainError::CategoryNotFound),
        }
    }

    async fn save(&self, category: &Category) -> Result<Category, DomainError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE categories
            SET title = $1, description = $2, slug = $3, is_published = $4
            WHERE id = $5
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        ))
        .bind(&category.title)
        .bind(&category.description)
        .bind(&category.slug)
        .bind(category.is_published)
        .bind(category.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &category.slug))?;

        match row {
            Some(row) => category_from_row(&row),
            None => Err(DomainError::CategoryNotFound),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            Err(DomainError::CategoryNotFound)
        } else {
            Ok(())
        }
    }
}
