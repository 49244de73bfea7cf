use crate::data::{CommentRepository, PostRepository, UserRepository};
use crate::domain::authorization::{authorize, require_login, Resource};
use crate::domain::comment::{CommentRequest, CommentResponse, CommentView};
use crate::domain::post::AuthorSummary;
use crate::domain::validation::require_non_empty;
use crate::domain::{Actor, Comment, DomainError};
use std::sync::Arc;

pub struct CommentService {
    comment_repo: Arc<dyn CommentRepository + Send + Sync>,
    post_repo: Arc<dyn PostRepository + Send + Sync>,
    user_repo: Arc<dyn UserRepository + Send + Sync>,
}

impl CommentService {
    pub fn new(
        comment_repo: Arc<dyn CommentRepository + Send + Sync>,
        post_repo: Arc<dyn PostRepository + Send + Sync>,
        user_repo: Arc<dyn UserRepository + Send + Sync>,
    ) -> Self {
        Self {
            comment_repo,
            post_repo,
            user_repo,
        }
    }

    async fn respond(&self, comment: Comment) -> Result<CommentResponse, DomainError> {
        let author = self.user_repo.find_by_id(comment.author_id).await?;
        Ok(CommentResponse::from(CommentView {
            author: AuthorSummary {
                id: author.id,
                username: author.username,
            },
            comment,
        }))
    }

    /// A comment addressed through the wrong post is treated as missing.
    async fn owned_comment(
        &self,
        post_id: i64,
        comment_id: i64,
        actor: &Actor,
    ) -> Result<Comment, DomainError> {
        require_login(actor)?;
        self.post_repo.find_by_id(post_id).await?;

        let comment = self.comment_repo.find_by_id(comment_id).await?;
        if comment.post_id != post_id {
            return Err(DomainError::CommentNotFound);
        }

        if let Err(e) = authorize(actor, Resource::Comment(&comment)) {
            tracing::warn!(
                "User {:?} attempted to modify comment {} owned by {}",
                actor.id(),
                comment_id,
                comment.author_id
            );
            return Err(e);
        }
        Ok(comment)
    }

    pub async fn add_comment(
        &self,
        post_id: i64,
        actor: &Actor,
        req: CommentRequest,
    ) -> Result<CommentResponse, DomainError> {
        let author_id = require_login(actor)?;
        self.post_repo.find_by_id(post_id).await?;
        require_non_empty("Comment", &req.text)?;

        let comment = self
            .comment_repo
            .create(post_id, author_id, &req.text)
            .await?;

        tracing::info!(
            "Comment created: id={}, post_id={}, author_id={}",
            comment.id,
            post_id,
            author_id
        );

        self.respond(comment).await
    }

    pub async fn edit_comment(
        &self,
        post_id: i64,
        comment_id: i64,
        actor: &Actor,
        req: CommentRequest,
    ) -> Result<CommentResponse, DomainError> {
        self.owned_comment(post_id, comment_id, actor).await?;
        require_non_empty("Comment", &req.text)?;

        let comment = self.comment_repo.update_text(comment_id, &req.text).await?;

        tracing::info!("Comment updated: id={}, post_id={}", comment_id, post_id);

        self.respond(comment).await
    }

    pub async fn delete_comment(
        &self,
        post_id: i64,
        comment_id: i64,
        actor: &Actor,
    ) -> Result<(), DomainError> {
        self.owned_comment(post_id, comment_id, actor).await?;

        self.comment_repo.delete(comment_id).await?;

        tracing::info!("Comment deleted: id={}, post_id={}", comment_id, post_id);

        Ok(())
    }
}
