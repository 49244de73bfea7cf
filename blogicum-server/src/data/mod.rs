pub mod category_repository;
pub mod comment_repository;
pub mod location_repository;
pub mod memory;
pub mod post_repository;
pub mod user_repository;

pub use category_repository::{CategoryRepository, PostgresCategoryRepository};
pub use comment_repository::{CommentRepository, PostgresCommentRepository};
pub use location_repository::{LocationRepository, PostgresLocationRepository};
pub use memory::MemoryStore;
pub use post_repository::{PostRepository, PostgresPostRepository};
pub use user_repository::{PostgresUserRepository, UserRepository};

use sqlx::PgPool;
use std::sync::Arc;

/// The repositories a running server needs, behind trait objects so the
/// services do not care which backend is in use.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository + Send + Sync>,
    pub categories: Arc<dyn CategoryRepository + Send + Sync>,
    pub locations: Arc<dyn LocationRepository + Send + Sync>,
    pub posts: Arc<dyn PostRepository + Send + Sync>,
    pub comments: Arc<dyn CommentRepository + Send + Sync>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            categories: Arc::new(PostgresCategoryRepository::new(pool.clone())),
            locations: Arc::new(PostgresLocationRepository::new(pool.clone())),
            posts: Arc::new(PostgresPostRepository::new(pool.clone())),
            comments: Arc::new(PostgresCommentRepository::new(pool)),
        }
    }

    pub fn in_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            users: store.clone(),
            categories: store.clone(),
            locations: store.clone(),
            posts: store.clone(),
            comments: store,
        }
    }
}
