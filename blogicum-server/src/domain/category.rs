use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DomainError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// The part of a category embedded into post listings.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CategorySummary {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub is_published: bool,
}

impl From<&Category> for CategorySummary {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id,
            title: category.title.clone(),
            slug: category.slug.clone(),
            is_published: category.is_published,
        }
    }
}

fn default_published() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCategoryRequest {
    pub title: String,
    pub description: String,
    pub slug: String,
    #[serde(default = "default_published")]
    pub is_published: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategoryRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub slug: Option<String>,
    pub is_published: Option<bool>,
}

impl UpdateCategoryRequest {
    pub fn apply(self, category: &mut Category) {
        if let Some(title) = self.title {
            category.title = title;
        }
        if let Some(description) = self.description {
            category.description = description;
        }
        if let Some(slug) = self.slug {
            category.slug = slug;
        }
        if let Some(is_published) = self.is_published {
            category.is_published = is_published;
        }
    }
}

pub const MAX_SLUG_LENGTH: usize = 50;

/// Slugs are limited to Latin letters, digits, hyphen and underscore.
pub fn validate_slug(slug: &str) -> Result<(), DomainError> {
    if slug.is_empty() || slug.len() > MAX_SLUG_LENGTH {
        return Err(DomainError::ValidationError(format!(
            "Slug must be between 1 and {} characters",
            MAX_SLUG_LENGTH
        )));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(DomainError::ValidationError(format!(
            "Slug '{}' may only contain latin letters, digits, '-' and '_'",
            slug
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_charset() {
        assert!(validate_slug("travel_2024-notes").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("путешествия").is_err());
        assert!(validate_slug("with space").is_err());
        assert!(validate_slug(&"a".repeat(51)).is_err());
    }
}
