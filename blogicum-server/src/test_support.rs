//! Fixtures over the in-memory store shared by service and handler tests.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::data::{
    CategoryRepository, CommentRepository, MemoryStore, PostRepository, Repositories,
    UserRepository,
};
use crate::domain::category::CreateCategoryRequest;
use crate::domain::post::CreatePostRequest;
use crate::domain::user::RegisterUserRequest;
use crate::domain::{Actor, Category, Comment, Post, User};

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub repos: Repositories,
}

impl Fixture {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            repos: Repositories::in_memory(store.clone()),
            store,
        }
    }

    pub async fn user(&self, username: &str) -> User {
        UserRepository::create(
            self.store.as_ref(),
            RegisterUserRequest {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                password: String::new(),
                first_name: String::new(),
                last_name: String::new(),
            },
            "not-a-real-hash".to_string(),
        )
        .await
        .unwrap()
    }

    pub async fn staff(&self, username: &str) -> User {
        let user = self.user(username).await;
        self.store.grant_staff(user.id).await.unwrap();
        UserRepository::find_by_id(self.store.as_ref(), user.id)
            .await
            .unwrap()
    }

    pub async fn category(&self, slug: &str, is_published: bool) -> Category {
        CategoryRepository::create(
            self.store.as_ref(),
            CreateCategoryRequest {
                title: slug.to_string(),
                description: format!("About {}", slug),
                slug: slug.to_string(),
                is_published,
            },
        )
        .await
        .unwrap()
    }

    pub async fn post(
        &self,
        author: &User,
        category: Option<&Category>,
        pub_date: DateTime<Utc>,
    ) -> Post {
        self.post_with(author, category, pub_date, true).await
    }

    pub async fn post_with(
        &self,
        author: &User,
        category: Option<&Category>,
        pub_date: DateTime<Utc>,
        is_published: bool,
    ) -> Post {
        PostRepository::create(
            self.store.as_ref(),
            author.id,
            CreatePostRequest {
                title: "A post".to_string(),
                text: "Some text".to_string(),
                pub_date,
                is_published,
                category_id: category.map(|c| c.id),
                location_id: None,
            },
        )
        .await
        .unwrap()
    }

    pub async fn comment(&self, post: &Post, author: &User, text: &str) -> Comment {
        CommentRepository::create(self.store.as_ref(), post.id, author.id, text)
            .await
            .unwrap()
    }
}

pub fn actor(user: &User) -> Actor {
    Actor::from(user)
}
