use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::post::AuthorSummary;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub post_id: i64,
    pub author_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentView {
    pub comment: Comment,
    pub author: AuthorSummary,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CommentResponse {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub post_id: i64,
    pub author: AuthorSummary,
}

impl From<CommentView> for CommentResponse {
    fn from(view: CommentView) -> Self {
        Self {
            id: view.comment.id,
            text: view.comment.text,
            created_at: view.comment.created_at,
            post_id: view.comment.post_id,
            author: view.author,
        }
    }
}
