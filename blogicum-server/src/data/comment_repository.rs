use crate::domain::comment::CommentView;
use crate::domain::post::AuthorSummary;
use crate::domain::query::{Page, PageRequest};
use crate::domain::{Comment, DomainError};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, post_id: i64, author_id: i64, text: &str) -> Result<Comment, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Comment, DomainError>;
    async fn update_text(&self, id: i64, text: &str) -> Result<Comment, DomainError>;
    async fn delete(&self, id: i64) -> Result<(), DomainError>;
    /// Comments of a post, oldest first.
    async fn list_for_post(
        &self,
        post_id: i64,
        page: PageRequest,
    ) -> Result<Page<CommentView>, DomainError>;
}

pub struct PostgresCommentRepository {
    pool: PgPool,
}

impl PostgresCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn comment_from_row(row: &PgRow) -> Result<Comment, DomainError> {
    Ok(Comment {
        id: row.try_get("id")?,
        text: row.try_get("text")?,
        created_at: row.try_get("created_at")?,
        post_id: row.try_get("post_id")?,
        author_id: row.try_get("author_id")?,
    })
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn create(&self, post_id: i64, author_id: i64, text: &str) -> Result<Comment, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO comments (text, post_id, author_id, created_at)
            VALUES ($1, $2, $3, NOW())
            RETURNING id, text, created_at, post_id, author_id
            "#,
        )
        .bind(text)
        .bind(post_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create comment: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        comment_from_row(&row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Comment, DomainError> {
        let row = sqlx::query(
            "SELECT id, text, created_at, post_id, author_id FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => comment_from_row(&row),
            None => Err(DomainError::CommentNotFound),
        }
    }

    async fn update_text(&self, id: i64, text: &str) -> Result<Comment, DomainError> {
        let row = sqlx::query(
            r#"
            UPDATE comments SET text = $1
            WHERE id = $2
            RETURNING id, text, created_at, post_id, author_id
            "#,
        )
        .bind(text)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => comment_from_row(&row),
            None => Err(DomainError::CommentNotFound),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            Err(DomainError::CommentNotFound)
        } else {
            Ok(())
        }
    }

    async fn list_for_post(
        &self,
        post_id: i64,
        page: PageRequest,
    ) -> Result<Page<CommentView>, DomainError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;

        page.check_within(total)?;

        let rows = sqlx::query(
            r#"
            SELECT cm.id, cm.text, cm.created_at, cm.post_id, cm.author_id,
                   u.username AS author_username
            FROM comments cm
            JOIN users u ON u.id = cm.author_id
            WHERE cm.post_id = $1
            ORDER BY cm.created_at ASC, cm.id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(post_id)
        .bind(page.size)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let comments = rows
            .iter()
            .map(|row| {
                let comment = comment_from_row(row)?;
                Ok(CommentView {
                    author: AuthorSummary {
                        id: comment.author_id,
                        username: row.try_get("author_username")?,
                    },
                    comment,
                })
            })
            .collect::<Result<Vec<CommentView>, DomainError>>()?;

        Ok(Page::new(comments, page, total))
    }
}
