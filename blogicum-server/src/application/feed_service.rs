//! Read side: the index, category and profile listings and the post detail.

use crate::data::{CategoryRepository, CommentRepository, PostRepository, UserRepository};
use crate::domain::comment::CommentResponse;
use crate::domain::post::PostResponse;
use crate::domain::query::{
    Page, PageRequest, PostQuery, PostScope, Visibility, COMMENTS_PER_PAGE, POSTS_PER_PAGE,
};
use crate::domain::user::ProfileResponse;
use crate::domain::{Actor, Category, DomainError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct CategoryPage {
    pub category: Category,
    pub posts: Page<PostResponse>,
}

#[derive(Debug, Serialize)]
pub struct ProfilePage {
    pub profile: ProfileResponse,
    pub posts: Page<PostResponse>,
}

#[derive(Debug, Serialize)]
pub struct PostDetail {
    pub post: PostResponse,
    pub comments: Page<CommentResponse>,
}

pub struct FeedService {
    post_repo: Arc<dyn PostRepository + Send + Sync>,
    category_repo: Arc<dyn CategoryRepository + Send + Sync>,
    comment_repo: Arc<dyn CommentRepository + Send + Sync>,
    user_repo: Arc<dyn UserRepository + Send + Sync>,
}

impl FeedService {
    pub fn new(
        post_repo: Arc<dyn PostRepository + Send + Sync>,
        category_repo: Arc<dyn CategoryRepository + Send + Sync>,
        comment_repo: Arc<dyn CommentRepository + Send + Sync>,
        user_repo: Arc<dyn UserRepository + Send + Sync>,
    ) -> Self {
        Self {
            post_repo,
            category_repo,
            comment_repo,
            user_repo,
        }
    }

    async fn list(
        &self,
        scope: PostScope,
        visibility: Visibility,
        page: i64,
    ) -> Result<Page<PostResponse>, DomainError> {
        let query = PostQuery {
            scope,
            visibility,
            page: PageRequest::new(page, POSTS_PER_PAGE),
        };

        let posts = self.post_repo.list(&query).await?;
        Ok(posts.map(PostResponse::from))
    }

    pub async fn index(
        &self,
        page: i64,
        now: DateTime<Utc>,
    ) -> Result<Page<PostResponse>, DomainError> {
        self.list(PostScope::All, Visibility::Public { now }, page)
            .await
    }

    /// Unpublished categories are reported as missing.
    pub async fn category(
        &self,
        slug: &str,
        page: i64,
        now: DateTime<Utc>,
    ) -> Result<CategoryPage, DomainError> {
        let category = self.category_repo.find_by_slug(slug).await?;
        if !category.is_published {
            tracing::debug!("Category {} is unpublished", slug);
            return Err(DomainError::CategoryNotFound);
        }

        let posts = self
            .list(
                PostScope::Category(category.id),
                Visibility::Public { now },
                page,
            )
            .await?;

        Ok(CategoryPage { category, posts })
    }

    /// The owner sees drafts and scheduled posts; everyone else sees the
    /// public subset.
    pub async fn profile(
        &self,
        username: &str,
        actor: &Actor,
        page: i64,
        now: DateTime<Utc>,
    ) -> Result<ProfilePage, DomainError> {
        let owner = self.user_repo.find_by_username(username).await?;

        let visibility = if actor.id() == Some(owner.id) {
            Visibility::Unrestricted
        } else {
            Visibility::Public { now }
        };

        let posts = self
            .list(PostScope::Author(owner.id), visibility, page)
            .await?;

        Ok(ProfilePage {
            profile: ProfileResponse::from(owner),
            posts,
        })
    }

    pub async fn post_detail(
        &self,
        post_id: i64,
        actor: &Actor,
        comment_page: i64,
        now: DateTime<Utc>,
    ) -> Result<PostDetail, DomainError> {
        let view = self.post_repo.find_view(post_id).await?;

        if actor.id() != Some(view.post.author_id) && !view.is_publicly_visible(now) {
            tracing::debug!("Post {} hidden from {:?}", post_id, actor.id());
            return Err(DomainError::PostNotFound);
        }

        let comments = self
            .comment_repo
            .list_for_post(post_id, PageRequest::new(comment_page, COMMENTS_PER_PAGE))
            .await?;

        Ok(PostDetail {
            post: PostResponse::from(view),
            comments: comments.map(CommentResponse::from),
        })
    }
}
