//! In-memory store - used when no database is configured, and by tests.
//!
//! Applies the same referential rules as the PostgreSQL schema: comments
//! are removed with their post, and deleting a category or location leaves
//! the referencing posts in place with the reference cleared.
//! Data is lost on process restart.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::category_repository::CategoryRepository;
use super::comment_repository::CommentRepository;
use super::location_repository::LocationRepository;
use super::post_repository::PostRepository;
use super::user_repository::UserRepository;
use crate::domain::category::{CategorySummary, CreateCategoryRequest};
use crate::domain::comment::CommentView;
use crate::domain::location::{CreateLocationRequest, LocationSummary};
use crate::domain::post::{AuthorSummary, CreatePostRequest};
use crate::domain::query::{Page, PageRequest, PostQuery, PostScope, Visibility};
use crate::domain::user::RegisterUserRequest;
use crate::domain::{Category, Comment, DomainError, Location, Post, PostView, User};

#[derive(Default)]
struct Tables {
    last_id: i64,
    users: BTreeMap<i64, User>,
    categories: BTreeMap<i64, Category>,
    locations: BTreeMap<i64, Location>,
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn author(&self, user_id: i64) -> AuthorSummary {
        AuthorSummary {
            id: user_id,
            username: self
                .users
                .get(&user_id)
                .map(|u| u.username.clone())
                .unwrap_or_default(),
        }
    }

    fn view(&self, post: &Post) -> PostView {
        PostView {
            post: post.clone(),
            author: self.author(post.author_id),
            category: post
                .category_id
                .and_then(|id| self.categories.get(&id))
                .map(CategorySummary::from),
            location: post
                .location_id
                .and_then(|id| self.locations.get(&id))
                .map(LocationSummary::from),
            comment_count: self
                .comments
                .values()
                .filter(|c| c.post_id == post.id)
                .count() as i64,
        }
    }

    fn check_references(&self, post: &Post) -> Result<(), DomainError> {
        let category_missing = post
            .category_id
            .is_some_and(|id| !self.categories.contains_key(&id));
        let location_missing = post
            .location_id
            .is_some_and(|id| !self.locations.contains_key(&id));

        if category_missing || location_missing || !self.users.contains_key(&post.author_id) {
            return Err(DomainError::ValidationError(
                "Referenced category, location or author does not exist".to_string(),
            ));
        }
        Ok(())
    }

    fn username_taken(&self, username: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.username == username && Some(u.id) != except)
    }

    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn slug_taken(&self, slug: &str, except: Option<i64>) -> bool {
        self.categories
            .values()
            .any(|c| c.slug == slug && Some(c.id) != except)
    }
}

pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Marks a user as staff. There is no public operation for this.
    #[cfg(test)]
    pub async fn grant_staff(&self, user_id: i64) -> Result<(), DomainError> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(&user_id)
            .ok_or(DomainError::UserNotFound)?;
        user.is_staff = true;
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(
        &self,
        req: RegisterUserRequest,
        password_hash: String,
    ) -> Result<User, DomainError> {
        let mut tables = self.tables.write().await;
        if tables.username_taken(&req.username, None) || tables.email_taken(&req.email, None) {
            return Err(DomainError::UserAlreadyExists);
        }

        let user = User {
            id: tables.next_id(),
            username: req.username,
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            password_hash,
            is_staff: false,
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<User, DomainError> {
        let tables = self.tables.read().await;
        tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned()
            .ok_or(DomainError::UserNotFound)
    }

    async fn find_by_email(&self, email: &str) -> Result<User, DomainError> {
        let tables = self.tables.read().await;
        tables
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(DomainError::UserNotFound)
    }

    async fn find_by_id(&self, id: i64) -> Result<User, DomainError> {
        let tables = self.tables.read().await;
        tables.users.get(&id).cloned().ok_or(DomainError::UserNotFound)
    }

    async fn save(&self, user: &User) -> Result<User, DomainError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user.id) {
            return Err(DomainError::UserNotFound);
        }
        if tables.username_taken(&user.username, Some(user.id))
            || tables.email_taken(&user.email, Some(user.id))
        {
            return Err(DomainError::UserAlreadyExists);
        }
        tables.users.insert(user.id, user.clone());
        Ok(user.clone())
    }
}

#[async_trait]
impl CategoryRepository for MemoryStore {
    async fn create(&self, req: CreateCategoryRequest) -> Result<Category, DomainError> {
        let mut tables = self.tables.write().await;
        if tables.slug_taken(&req.slug, None) {
            return Err(DomainError::SlugTaken(req.slug));
        }

        let category = Category {
            id: tables.next_id(),
            title: req.title,
            description: req.description,
            slug: req.slug,
            is_published: req.is_published,
            created_at: Utc::now(),
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn find_by_id(&self, id: i64) -> Result<Category, DomainError> {
        let tables = self.tables.read().await;
        tables
            .categories
            .get(&id)
            .cloned()
            .ok_or(DomainError::CategoryNotFound)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Category, DomainError> {
        let tables = self.tables.read().await;
        tables
            .categories
            .values()
            .find(|c| c.slug == slug)
            .cloned()
            .ok_or(DomainError::CategoryNotFound)
    }

    async fn save(&self, category: &Category) -> Result<Category, DomainError> {
        let mut tables = self.tables.write().await;
        if !tables.categories.contains_key(&category.id) {
            return Err(DomainError::CategoryNotFound);
        }
        if tables.slug_taken(&category.slug, Some(category.id)) {
            return Err(DomainError::SlugTaken(category.slug.clone()));
        }
        tables.categories.insert(category.id, category.clone());
        Ok(category.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let mut tables = self.tables.write().await;
        if tables.categories.remove(&id).is_none() {
            return Err(DomainError::CategoryNotFound);
        }
        for post in tables.posts.values_mut() {
            if post.category_id == Some(id) {
                post.category_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl LocationRepository for MemoryStore {
    async fn create(&self, req: CreateLocationRequest) -> Result<Location, DomainError> {
        let mut tables = self.tables.write().await;
        let location = Location {
            id: tables.next_id(),
            name: req.name,
            is_published: req.is_published,
            created_at: Utc::now(),
        };
        tables.locations.insert(location.id, location.clone());
        Ok(location)
    }

    async fn find_by_id(&self, id: i64) -> Result<Location, DomainError> {
        let tables = self.tables.read().await;
        tables
            .locations
            .get(&id)
            .cloned()
            .ok_or(DomainError::LocationNotFound)
    }

    async fn save(&self, location: &Location) -> Result<Location, DomainError> {
        let mut tables = self.tables.write().await;
        if !tables.locations.contains_key(&location.id) {
            return Err(DomainError::LocationNotFound);
        }
        tables.locations.insert(location.id, location.clone());
        Ok(location.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let mut tables = self.tables.write().await;
        if tables.locations.remove(&id).is_none() {
            return Err(DomainError::LocationNotFound);
        }
        for post in tables.posts.values_mut() {
            if post.location_id == Some(id) {
                post.location_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create(&self, author_id: i64, req: CreatePostRequest) -> Result<Post, DomainError> {
        let mut tables = self.tables.write().await;
        let post = Post {
            id: 0,
            title: req.title,
            text: req.text,
            pub_date: req.pub_date,
            image: None,
            is_published: req.is_published,
            created_at: Utc::now(),
            author_id,
            category_id: req.category_id,
            location_id: req.location_id,
        };
        tables.check_references(&post)?;

        let post = Post {
            id: tables.next_id(),
            ..post
        };
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find_by_id(&self, id: i64) -> Result<Post, DomainError> {
        let tables = self.tables.read().await;
        tables.posts.get(&id).cloned().ok_or(DomainError::PostNotFound)
    }

    async fn find_view(&self, id: i64) -> Result<PostView, DomainError> {
        let tables = self.tables.read().await;
        let post = tables.posts.get(&id).ok_or(DomainError::PostNotFound)?;
        Ok(tables.view(post))
    }

    async fn save(&self, post: &Post) -> Result<Post, DomainError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&post.id) {
            return Err(DomainError::PostNotFound);
        }
        tables.check_references(post)?;
        tables.posts.insert(post.id, post.clone());
        Ok(post.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let mut tables = self.tables.write().await;
        if tables.posts.remove(&id).is_none() {
            return Err(DomainError::PostNotFound);
        }
        tables.comments.retain(|_, c| c.post_id != id);
        Ok(())
    }

    async fn list(&self, query: &PostQuery) -> Result<Page<PostView>, DomainError> {
        let tables = self.tables.read().await;

        let mut views: Vec<PostView> = tables
            .posts
            .values()
            .filter(|p| match query.scope {
                PostScope::All => true,
                PostScope::Category(id) => p.category_id == Some(id),
                PostScope::Author(id) => p.author_id == id,
            })
            .map(|p| tables.view(p))
            .filter(|v| match query.visibility {
                Visibility::Public { now } => v.is_publicly_visible(now),
                Visibility::Unrestricted => true,
            })
            .collect();

        views.sort_by(|a, b| {
            b.post
                .pub_date
                .cmp(&a.post.pub_date)
                .then(b.post.id.cmp(&a.post.id))
        });

        Page::slice(views, query.page)
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create(&self, post_id: i64, author_id: i64, text: &str) -> Result<Comment, DomainError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&post_id) {
            return Err(DomainError::PostNotFound);
        }
        let comment = Comment {
            id: tables.next_id(),
            text: text.to_string(),
            created_at: Utc::now(),
            post_id,
            author_id,
        };
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn find_by_id(&self, id: i64) -> Result<Comment, DomainError> {
        let tables = self.tables.read().await;
        tables
            .comments
            .get(&id)
            .cloned()
            .ok_or(DomainError::CommentNotFound)
    }

    async fn update_text(&self, id: i64, text: &str) -> Result<Comment, DomainError> {
        let mut tables = self.tables.write().await;
        let comment = tables
            .comments
            .get_mut(&id)
            .ok_or(DomainError::CommentNotFound)?;
        comment.text = text.to_string();
        Ok(comment.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let mut tables = self.tables.write().await;
        match tables.comments.remove(&id) {
            Some(_) => Ok(()),
            None => Err(DomainError::CommentNotFound),
        }
    }

    async fn list_for_post(
        &self,
        post_id: i64,
        page: PageRequest,
    ) -> Result<Page<CommentView>, DomainError> {
        let tables = self.tables.read().await;

        // ids grow with creation time, so map order is oldest first
        let comments: Vec<CommentView> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .map(|c| CommentView {
                comment: c.clone(),
                author: tables.author(c.author_id),
            })
            .collect();

        Page::slice(comments, page)
    }
}
