//! Staff-only management of categories and locations.

use crate::data::{CategoryRepository, LocationRepository};
use crate::domain::authorization::require_staff;
use crate::domain::category::{validate_slug, CreateCategoryRequest, UpdateCategoryRequest};
use crate::domain::location::{CreateLocationRequest, UpdateLocationRequest};
use crate::domain::validation::{require_non_empty, require_short_text};
use crate::domain::{Actor, Category, DomainError, Location};
use std::sync::Arc;

pub struct CatalogService {
    category_repo: Arc<dyn CategoryRepository + Send + Sync>,
    location_repo: Arc<dyn LocationRepository + Send + Sync>,
}

fn validate_category(title: &str, description: &str, slug: &str) -> Result<(), DomainError> {
    require_short_text("Title", title)?;
    require_non_empty("Description", description)?;
    validate_slug(slug)
}

impl CatalogService {
    pub fn new(
        category_repo: Arc<dyn CategoryRepository + Send + Sync>,
        location_repo: Arc<dyn LocationRepository + Send + Sync>,
    ) -> Self {
        Self {
            category_repo,
            location_repo,
        }
    }

    pub async fn create_category(
        &self,
        actor: &Actor,
        req: CreateCategoryRequest,
    ) -> Result<Category, DomainError> {
        require_staff(actor)?;
        validate_category(&req.title, &req.description, &req.slug)?;

        let category = self.category_repo.create(req).await?;
        tracing::info!("Category created: id={}, slug={}", category.id, category.slug);
        Ok(category)
    }

    pub async fn update_category(
        &self,
        actor: &Actor,
        id: i64,
        req: UpdateCategoryRequest,
    ) -> Result<Category, DomainError> {
        require_staff(actor)?;
        let mut category = self.category_repo.find_by_id(id).await?;

        req.apply(&mut category);
        validate_category(&category.title, &category.description, &category.slug)?;

        let category = self.category_repo.save(&category).await?;
        tracing::info!(
            "Category updated: id={}, published={}",
            category.id,
            category.is_published
        );
        Ok(category)
    }

    /// Posts of the category stay, uncategorized.
    pub async fn delete_category(&self, actor: &Actor, id: i64) -> Result<(), DomainError> {
        require_staff(actor)?;
        self.category_repo.delete(id).await?;
        tracing::info!("Category deleted: id={}", id);
        Ok(())
    }

    pub async fn create_location(
        &self,
        actor: &Actor,
        req: CreateLocationRequest,
    ) -> Result<Location, DomainError> {
        require_staff(actor)?;
        require_short_text("Name", &req.name)?;

        let location = self.location_repo.create(req).await?;
        tracing::info!("Location created: id={}", location.id);
        Ok(location)
    }

    pub async fn update_location(
        &self,
        actor: &Actor,
        id: i64,
        req: UpdateLocationRequest,
    ) -> Result<Location, DomainError> {
        require_staff(actor)?;
        let mut location = self.location_repo.find_by_id(id).await?;

        req.apply(&mut location);
        require_short_text("Name", &location.name)?;

        self.location_repo.save(&location).await
    }

    pub async fn delete_location(&self, actor: &Actor, id: i64) -> Result<(), DomainError> {
        require_staff(actor)?;
        self.location_repo.delete(id).await?;
        tracing::info!("Location deleted: id={}", id);
        Ok(())
    }
}
