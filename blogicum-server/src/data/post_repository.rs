use crate::domain::category::CategorySummary;
use crate::domain::location::LocationSummary;
use crate::domain::post::{AuthorSummary, CreatePostRequest};
use crate::domain::query::{Page, PostQuery, PostScope, Visibility};
use crate::domain::{DomainError, Post, PostView};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, author_id: i64, req: CreatePostRequest) -> Result<Post, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Post, DomainError>;
    /// Single post with joins and comment count, no visibility filtering.
    async fn find_view(&self, id: i64) -> Result<PostView, DomainError>;
    async fn save(&self, post: &Post) -> Result<Post, DomainError>;
    async fn delete(&self, id: i64) -> Result<(), DomainError>;
    async fn list(&self, query: &PostQuery) -> Result<Page<PostView>, DomainError>;
}

pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const POST_COLUMNS: &str =
    "id, title, text, pub_date, image, is_published, created_at, author_id, category_id, location_id";

const VIEW_SELECT: &str = r#"
    SELECT p.id, p.title, p.text, p.pub_date, p.image, p.is_published, p.created_at,
           p.author_id, p.category_id, p.location_id,
           u.username AS author_username,
           c.title AS category_title,
           c.slug AS category_slug,
           c.is_published AS category_is_published,
           l.name AS location_name,
           l.is_published AS location_is_published,
           (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id) AS comment_count
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN categories c ON c.id = p.category_id
    LEFT JOIN locations l ON l.id = p.location_id
"#;

fn post_from_row(row: &PgRow) -> Result<Post, DomainError> {
    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        text: row.try_get("text")?,
        pub_date: row.try_get("pub_date")?,
        image: row.try_get("image")?,
        is_published: row.try_get("is_published")?,
        created_at: row.try_get("created_at")?,
        author_id: row.try_get("author_id")?,
        category_id: row.try_get("category_id")?,
        location_id: row.try_get("location_id")?,
    })
}

fn view_from_row(row: &PgRow) -> Result<PostView, DomainError> {
    let post = post_from_row(row)?;

    let category = match post.category_id {
        Some(id) => Some(CategorySummary {
            id,
            title: row
                .try_get::<Option<String>, _>("category_title")?
                .unwrap_or_default(),
            slug: row
                .try_get::<Option<String>, _>("category_slug")?
                .unwrap_or_default(),
            is_published: row
                .try_get::<Option<bool>, _>("category_is_published")?
                .unwrap_or(false),
        }),
        None => None,
    };

    let location = match post.location_id {
        Some(id) => Some(LocationSummary {
            id,
            name: row
                .try_get::<Option<String>, _>("location_name")?
                .unwrap_or_default(),
            is_published: row
                .try_get::<Option<bool>, _>("location_is_published")?
                .unwrap_or(false),
        }),
        None => None,
    };

    Ok(PostView {
        author: AuthorSummary {
            id: post.author_id,
            username: row.try_get("author_username")?,
        },
        category,
        location,
        comment_count: row.try_get("comment_count")?,
        post,
    })
}

/// Appends the scope and visibility predicates. Posts without a category
/// fail the public predicate because `c.is_published` is NULL for them.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &PostQuery) {
    builder.push(" WHERE TRUE");

    match query.scope {
        PostScope::All => {}
        PostScope::Category(category_id) => {
            builder.push(" AND p.category_id = ").push_bind(category_id);
        }
        PostScope::Author(author_id) => {
            builder.push(" AND p.author_id = ").push_bind(author_id);
        }
    }

    if let Visibility::Public { now } = query.visibility {
        builder
            .push(" AND p.pub_date <= ")
            .push_bind(now)
            .push(" AND p.is_published AND c.is_published");
    }
}

fn map_write_error(err: sqlx::Error) -> DomainError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_foreign_key_violation() {
            return DomainError::ValidationError(
                "Referenced category, location or author does not exist".to_string(),
            );
        }
    }
    DomainError::DatabaseError(err.to_string())
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, author_id: i64, req: CreatePostRequest) -> Result<Post, DomainError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO posts (title, text, pub_date, is_published, author_id, category_id, location_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW())
            RETURNING {}
            "#,
            POST_COLUMNS
        ))
        .bind(&req.title)
        .bind(&req.text)
        .bind(req.pub_date)
        .bind(req.is_published)
        .bind(author_id)
        .bind(req.category_id)
        .bind(req.location_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create post: {}", e);
            map_write_error(e)
        })?;

        post_from_row(&row)
    }

    async fn find_by_id(&self, id: i64) -> Result<Post, DomainError> {
        let row = sqlx::query(&format!("SELECT {} FROM posts WHERE id = $1", POST_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => post_from_row(&row),
            None => Err(DomainError::PostNotFound),
        }
    }

    async fn find_view(&self, id: i64) -> Result<PostView, DomainError> {
        let mut builder = QueryBuilder::<Postgres>::new(VIEW_SELECT);
        builder.push(" WHERE p.id = ").push_bind(id);

        let row = builder.build().fetch_optional(&self.pool).await?;

        match row {
            Some(row) => view_from_row(&row),
            None => Err(DomainError::PostNotFound),
        }
    }

    async fn save(&self, post: &Post) -> Result<Post, DomainError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE posts
            SET
                title = $1,
                text = $2,
                pub_date = $3,
                image = $4,
                is_published = $5,
                category_id = $6,
                location_id = $7
            WHERE id = $8
            RETURNING {}
            "#,
            POST_COLUMNS
        ))
        .bind(&post.title)
        .bind(&post.text)
        .bind(post.pub_date)
        .bind(&post.image)
        .bind(post.is_published)
        .bind(post.category_id)
        .bind(post.location_id)
        .bind(post.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?;

        match row {
            Some(row) => post_from_row(&row),
            None => Err(DomainError::PostNotFound),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        // comments go with the post via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            Err(DomainError::PostNotFound)
        } else {
            Ok(())
        }
    }

    async fn list(&self, query: &PostQuery) -> Result<Page<PostView>, DomainError> {
        let total = count_query(query)
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        query.page.check_within(total)?;

        let rows = page_query(query).build().fetch_all(&self.pool).await?;

        let posts = rows
            .iter()
            .map(view_from_row)
            .collect::<Result<Vec<PostView>, DomainError>>()?;

        Ok(Page::new(posts, query.page, total))
    }
}

fn count_query(query: &PostQuery) -> QueryBuilder<'static, Postgres> {
    let mut count = QueryBuilder::<Postgres>::new(
        "SELECT COUNT(*) FROM posts p LEFT JOIN categories c ON c.id = p.category_id",
    );
    push_filters(&mut count, query);
    count
}

fn page_query(query: &PostQuery) -> QueryBuilder<'static, Postgres> {
    let mut select = QueryBuilder::<Postgres>::new(VIEW_SELECT);
    push_filters(&mut select, query);
    select
        .push(" ORDER BY p.pub_date DESC, p.id DESC LIMIT ")
        .push_bind(query.page.size)
        .push(" OFFSET ")
        .push_bind(query.page.offset());
    select
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::query::{PageRequest, POSTS_PER_PAGE};
    use chrono::Utc;

    const PUBLIC_PREDICATE: &str = "AND p.is_published AND c.is_published";

    fn query(scope: PostScope, visibility: Visibility, page: i64) -> PostQuery {
        PostQuery {
            scope,
            visibility,
            page: PageRequest::new(page, POSTS_PER_PAGE),
        }
    }

    fn scopes() -> [PostScope; 3] {
        [PostScope::All, PostScope::Category(3), PostScope::Author(5)]
    }

    #[test]
    fn public_predicate_only_for_public_visibility() {
        let now = Utc::now();
        for scope in scopes() {
            let public = page_query(&query(scope, Visibility::Public { now }, 1));
            assert!(public.sql().contains("p.pub_date <= $"), "{}", public.sql());
            assert!(public.sql().contains(PUBLIC_PREDICATE), "{}", public.sql());

            let count = count_query(&query(scope, Visibility::Public { now }, 1));
            assert!(count.sql().contains(PUBLIC_PREDICATE), "{}", count.sql());
            assert!(count.sql().contains("LEFT JOIN categories c"));

            let unrestricted = page_query(&query(scope, Visibility::Unrestricted, 1));
            assert!(!unrestricted.sql().contains("p.pub_date <="));
            assert!(!unrestricted.sql().contains("is_published AND"));
        }
    }

    #[test]
    fn scope_binds_the_matching_column() {
        let now = Utc::now();

        let all = count_query(&query(PostScope::All, Visibility::Public { now }, 1));
        assert!(!all.sql().contains("p.category_id ="));
        assert!(!all.sql().contains("p.author_id ="));

        let category = count_query(&query(PostScope::Category(3), Visibility::Unrestricted, 1));
        assert!(category.sql().contains("p.category_id = $1"), "{}", category.sql());
        assert!(!category.sql().contains("p.author_id ="));

        let author = count_query(&query(PostScope::Author(5), Visibility::Public { now }, 1));
        assert!(author.sql().contains("p.author_id = $1"), "{}", author.sql());
        assert!(author.sql().contains("p.pub_date <= $2"), "{}", author.sql());
    }

    #[test]
    fn page_query_orders_newest_first_and_paginates() {
        for scope in scopes() {
            let select = page_query(&query(scope, Visibility::Unrestricted, 2));
            let sql = select.sql();
            assert!(
                sql.contains("ORDER BY p.pub_date DESC, p.id DESC LIMIT $"),
                "{}",
                sql
            );
            assert!(sql.contains(" OFFSET $"));
            assert!(sql.find("WHERE TRUE").unwrap() < sql.find("ORDER BY").unwrap());
        }

        let count = count_query(&query(PostScope::All, Visibility::Unrestricted, 1));
        assert!(!count.sql().contains("ORDER BY"));
    }
}
