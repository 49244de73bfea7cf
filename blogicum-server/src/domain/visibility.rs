//! Public visibility of posts.
//!
//! A post is public when its publication date has passed, it is published,
//! and it belongs to a published category. Posts without a category are
//! never public. `now` is always passed in by the caller.

use chrono::{DateTime, Utc};

use super::post::{Post, PostView};

pub fn is_publicly_visible(post: &Post, category_published: Option<bool>, now: DateTime<Utc>) -> bool {
    post.pub_date <= now && post.is_published && category_published == Some(true)
}

impl PostView {
    pub fn is_publicly_visible(&self, now: DateTime<Utc>) -> bool {
        is_publicly_visible(
            &self.post,
            self.category.as_ref().map(|c| c.is_published),
            now,
        )
    }
}
