use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::category::CategorySummary;
use super::location::LocationSummary;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub image: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub author_id: i64,
    pub category_id: Option<i64>,
    pub location_id: Option<i64>,
}

fn default_published() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    #[serde(default = "default_published")]
    pub is_published: bool,
    pub category_id: Option<i64>,
    pub location_id: Option<i64>,
}

/// Partial update. `category_id`/`location_id` use a nested option so a
/// client can clear the reference with an explicit `null`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub text: Option<String>,
    pub pub_date: Option<DateTime<Utc>>,
    pub is_published: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub location_id: Option<Option<i64>>,
}

impl UpdatePostRequest {
    pub fn apply(self, post: &mut Post) {
        if let Some(title) = self.title {
            post.title = title;
        }
        if let Some(text) = self.text {
            post.text = text;
        }
        if let Some(pub_date) = self.pub_date {
            post.pub_date = pub_date;
        }
        if let Some(is_published) = self.is_published {
            post.is_published = is_published;
        }
        if let Some(category_id) = self.category_id {
            post.category_id = category_id;
        }
        if let Some(location_id) = self.location_id {
            post.location_id = location_id;
        }
    }
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AuthorSummary {
    pub id: i64,
    pub username: String,
}

/// A post joined with its author, category and location, annotated with
/// the number of comments.
#[derive(Debug, Clone, PartialEq)]
pub struct PostView {
    pub post: Post,
    pub author: AuthorSummary,
    pub category: Option<CategorySummary>,
    pub location: Option<LocationSummary>,
    pub comment_count: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub image: Option<String>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub author: AuthorSummary,
    pub category: Option<CategorySummary>,
    pub location: Option<LocationSummary>,
    pub comment_count: i64,
}

impl From<PostView> for PostResponse {
    fn from(view: PostView) -> Self {
        let PostView {
            post,
            author,
            category,
            location,
            comment_count,
        } = view;

        Self {
            id: post.id,
            title: post.title,
            text: post.text,
            pub_date: post.pub_date,
            image: post.image,
            is_published: post.is_published,
            created_at: post.created_at,
            author,
            category,
            location,
            comment_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_request_distinguishes_null_from_missing() {
        let clear: UpdatePostRequest =
            serde_json::from_str(r#"{"category_id": null}"#).unwrap();
        assert_eq!(clear.category_id, Some(None));
        assert_eq!(clear.location_id, None);

        let keep: UpdatePostRequest = serde_json::from_str(r#"{"title": "x"}"#).unwrap();
        assert_eq!(keep.category_id, None);
    }

    #[test]
    fn create_request_defaults_to_published() {
        let req: CreatePostRequest = serde_json::from_str(
            r#"{"title": "t", "text": "b", "pub_date": "2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(req.is_published);
        assert_eq!(req.category_id, None);
    }
}
