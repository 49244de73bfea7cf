use crate::data::{CategoryRepository, LocationRepository, PostRepository};
use crate::domain::authorization::{authorize, require_login, Resource};
use crate::domain::post::{CreatePostRequest, PostResponse, UpdatePostRequest};
use crate::domain::validation::{require_non_empty, require_short_text};
use crate::domain::{Actor, DomainError, Post};
use crate::infrastructure::storage::ImageStorage;
use std::sync::Arc;

/// Write side for posts. Every mutation checks login first, then loads the
/// post, then checks ownership.
pub struct BlogService {
    post_repo: Arc<dyn PostRepository + Send + Sync>,
    category_repo: Arc<dyn CategoryRepository + Send + Sync>,
    location_repo: Arc<dyn LocationRepository + Send + Sync>,
    images: Arc<dyn ImageStorage>,
}

impl BlogService {
    pub fn new(
        post_repo: Arc<dyn PostRepository + Send + Sync>,
        category_repo: Arc<dyn CategoryRepository + Send + Sync>,
        location_repo: Arc<dyn LocationRepository + Send + Sync>,
        images: Arc<dyn ImageStorage>,
    ) -> Self {
        Self {
            post_repo,
            category_repo,
            location_repo,
            images,
        }
    }

    async fn validate(
        &self,
        title: &str,
        text: &str,
        category_id: Option<i64>,
        location_id: Option<i64>,
    ) -> Result<(), DomainError> {
        require_short_text("Title", title)?;
        require_non_empty("Text", text)?;

        if let Some(id) = category_id {
            self.category_repo.find_by_id(id).await.map_err(|e| match e {
                DomainError::CategoryNotFound => {
                    DomainError::ValidationError(format!("Category {} does not exist", id))
                }
                other => other,
            })?;
        }
        if let Some(id) = location_id {
            self.location_repo.find_by_id(id).await.map_err(|e| match e {
                DomainError::LocationNotFound => {
                    DomainError::ValidationError(format!("Location {} does not exist", id))
                }
                other => other,
            })?;
        }
        Ok(())
    }

    async fn respond(&self, post_id: i64) -> Result<PostResponse, DomainError> {
        let view = self.post_repo.find_view(post_id).await?;
        Ok(PostResponse::from(view))
    }

    async fn owned_post(&self, post_id: i64, actor: &Actor) -> Result<Post, DomainError> {
        require_login(actor)?;
        let post = self.post_repo.find_by_id(post_id).await?;

        if let Err(e) = authorize(actor, Resource::Post(&post)) {
            tracing::warn!(
                "User {:?} attempted to modify post {} owned by {}",
                actor.id(),
                post_id,
                post.author_id
            );
            return Err(e);
        }
        Ok(post)
    }

    /// Login and ownership check alone, for requests rejected before
    /// reaching a mutation.
    pub async fn ensure_owner(&self, post_id: i64, actor: &Actor) -> Result<(), DomainError> {
        self.owned_post(post_id, actor).await.map(|_| ())
    }

    pub async fn create_post(
        &self,
        actor: &Actor,
        req: CreatePostRequest,
    ) -> Result<PostResponse, DomainError> {
        let author_id = require_login(actor)?;

        self.validate(&req.title, &req.text, req.category_id, req.location_id)
            .await?;

        let post = self.post_repo.create(author_id, req).await?;

        tracing::info!("Post created: id={}, author_id={}", post.id, author_id);

        self.respond(post.id).await
    }

    pub async fn update_post(
        &self,
        post_id: i64,
        actor: &Actor,
        req: UpdatePostRequest,
    ) -> Result<PostResponse, DomainError> {
        let mut post = self.owned_post(post_id, actor).await?;

        req.apply(&mut post);
        self.validate(&post.title, &post.text, post.category_id, post.location_id)
            .await?;

        self.post_repo.save(&post).await?;

        tracing::info!("Post updated: id={}, author_id={}", post_id, post.author_id);

        self.respond(post_id).await
    }

    pub async fn delete_post(&self, post_id: i64, actor: &Actor) -> Result<(), DomainError> {
        let post = self.owned_post(post_id, actor).await?;

        self.post_repo.delete(post_id).await?;

        tracing::info!("Post deleted: id={}, author_id={}", post_id, post.author_id);

        Ok(())
    }

    /// Writes the file first, then points the post at it. A failure after
    /// the write leaves the file orphaned.
    pub async fn attach_image(
        &self,
        post_id: i64,
        actor: &Actor,
        filename: &str,
        data: &[u8],
    ) -> Result<PostResponse, DomainError> {
        let mut post = self.owned_post(post_id, actor).await?;

        let path = self.images.store(filename, data).await?;
        post.image = Some(path);
        self.post_repo.save(&post).await?;

        tracing::info!("Image attached to post {}: {:?}", post_id, post.image);

        self.respond(post_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::feed_service::FeedService;
    use crate::test_support::{actor, Fixture};
    use async_trait::async_trait;
    use chrono::{Duration, Utc};

    struct FakeImages;

    #[async_trait]
    impl ImageStorage for FakeImages {
        async fn store(&self, filename: &str, _data: &[u8]) -> Result<String, DomainError> {
            Ok(format!("post_images/test_{}", filename))
        }
    }

    fn service(fx: &Fixture) -> BlogService {
        BlogService::new(
            fx.repos.posts.clone(),
            fx.repos.categories.clone(),
            fx.repos.locations.clone(),
            Arc::new(FakeImages),
        )
    }

    fn feed(fx: &Fixture) -> FeedService {
        FeedService::new(
            fx.repos.posts.clone(),
            fx.repos.categories.clone(),
            fx.repos.comments.clone(),
            fx.repos.users.clone(),
        )
    }

    fn request(category_id: Option<i64>) -> CreatePostRequest {
        CreatePostRequest {
            title: "Trip".to_string(),
            text: "We went to the mountains".to_string(),
            pub_date: Utc::now() - Duration::minutes(5),
            is_published: true,
            category_id,
            location_id: None,
        }
    }

    #[tokio::test]
    async fn anonymous_cannot_create() {
        let fx = Fixture::new();
        assert!(matches!(
            service(&fx).create_post(&Actor::Anonymous, request(None)).await,
            Err(DomainError::AuthenticationRequired)
        ));
    }

    #[tokio::test]
    async fn create_validates_fields_and_references() {
        let fx = Fixture::new();
        let author = fx.user("author").await;
        let blog = service(&fx);

        let mut empty_title = request(None);
        empty_title.title = "  ".to_string();
        assert!(matches!(
            blog.create_post(&actor(&author), empty_title).await,
            Err(DomainError::ValidationError(_))
        ));

        assert!(matches!(
            blog.create_post(&actor(&author), request(Some(404))).await,
            Err(DomainError::ValidationError(_))
        ));

        let created = blog.create_post(&actor(&author), request(None)).await.unwrap();
        assert_eq!(created.author.username, "author");
        assert_eq!(created.comment_count, 0);
    }

    #[tokio::test]
    async fn foreign_delete_is_forbidden_own_delete_removes_post() {
        let fx = Fixture::new();
        let author = fx.user("author").await;
        let other = fx.user("other").await;
        let cat = fx.category("travel", true).await;
        let post = fx.post(&author, Some(&cat), Utc::now() - Duration::hours(1)).await;
        let blog = service(&fx);

        assert!(matches!(
            blog.delete_post(post.id, &actor(&other)).await,
            Err(DomainError::Forbidden)
        ));

        blog.delete_post(post.id, &actor(&author)).await.unwrap();

        let index = feed(&fx).index(1, Utc::now()).await.unwrap();
        assert!(index.items.iter().all(|p| p.id != post.id));
    }

    #[tokio::test]
    async fn anonymous_delete_needs_login_even_for_missing_post() {
        let fx = Fixture::new();
        assert!(matches!(
            service(&fx).delete_post(12345, &Actor::Anonymous).await,
            Err(DomainError::AuthenticationRequired)
        ));
    }

    #[tokio::test]
    async fn update_applies_partial_changes() {
        let fx = Fixture::new();
        let author = fx.user("author").await;
        let cat = fx.category("travel", true).await;
        let post = fx.post(&author, Some(&cat), Utc::now()).await;

        let updated = service(&fx)
            .update_post(
                post.id,
                &actor(&author),
                UpdatePostRequest {
                    title: Some("Renamed".to_string()),
                    category_id: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.text, post.text);
        assert!(updated.category.is_none());
    }

    #[tokio::test]
    async fn image_is_attached_for_owner_only() {
        let fx = Fixture::new();
        let author = fx.user("author").await;
        let other = fx.user("other").await;
        let post = fx.post(&author, None, Utc::now()).await;
        let blog = service(&fx);

        assert!(matches!(
            blog.attach_image(post.id, &actor(&other), "a.png", b"x").await,
            Err(DomainError::Forbidden)
        ));

        let updated = blog
            .attach_image(post.id, &actor(&author), "a.png", b"x")
            .await
            .unwrap();
        assert_eq!(updated.image.as_deref(), Some("post_images/test_a.png"));
    }
}
