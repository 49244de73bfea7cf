pub mod auth_service;
pub mod blog_service;
pub mod catalog_service;
pub mod comment_service;
pub mod feed_service;
pub mod profile_service;

pub use auth_service::AuthService;
pub use blog_service::BlogService;
pub use catalog_service::CatalogService;
pub use comment_service::CommentService;
pub use feed_service::FeedService;
pub use profile_service::ProfileService;
