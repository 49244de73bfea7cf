use crate::application::{
    AuthService, BlogService, CatalogService, CommentService, FeedService, ProfileService,
};
use crate::data::Repositories;
use crate::infrastructure::jwt::JwtService;
use crate::infrastructure::storage::ImageStorage;
use crate::presentation::http_handlers;
use actix_web::web;
use std::sync::Arc;

const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Application services shared by every worker.
#[derive(Clone)]
pub struct Services {
    pub auth: Arc<AuthService>,
    pub blog: Arc<BlogService>,
    pub feed: Arc<FeedService>,
    pub comments: Arc<CommentService>,
    pub profiles: Arc<ProfileService>,
    pub catalog: Arc<CatalogService>,
    pub jwt: Arc<JwtService>,
}

impl Services {
    pub fn build(
        repos: &Repositories,
        jwt: Arc<JwtService>,
        images: Arc<dyn ImageStorage>,
    ) -> Self {
        Self {
            auth: Arc::new(AuthService::new(repos.users.clone(), jwt.clone())),
            blog: Arc::new(BlogService::new(
                repos.posts.clone(),
                repos.categories.clone(),
                repos.locations.clone(),
                images,
            )),
            feed: Arc::new(FeedService::new(
                repos.posts.clone(),
                repos.categories.clone(),
                repos.comments.clone(),
                repos.users.clone(),
            )),
            comments: Arc::new(CommentService::new(
                repos.comments.clone(),
                repos.posts.clone(),
                repos.users.clone(),
            )),
            profiles: Arc::new(ProfileService::new(repos.users.clone())),
            catalog: Arc::new(CatalogService::new(
                repos.categories.clone(),
                repos.locations.clone(),
            )),
            jwt,
        }
    }

    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.auth.clone()))
            .app_data(web::Data::new(self.blog.clone()))
            .app_data(web::Data::new(self.feed.clone()))
            .app_data(web::Data::new(self.comments.clone()))
            .app_data(web::Data::new(self.profiles.clone()))
            .app_data(web::Data::new(self.catalog.clone()))
            .app_data(web::Data::new(self.jwt.clone()))
            .app_data(web::PayloadConfig::new(MAX_IMAGE_BYTES))
            // Authentication
            .service(
                web::scope("/api/auth")
                    .route("/register", web::post().to(http_handlers::register))
                    .route("/login", web::post().to(http_handlers::login))
                    .route("/login", web::get().to(http_handlers::login_entry))
                    .route("/me", web::get().to(http_handlers::me)),
            )
            // Posts and their comments
            .service(
                web::scope("/api/posts")
                    .route("", web::get().to(http_handlers::index))
                    .route("", web::post().to(http_handlers::create_post))
                    .route("/{id}", web::get().to(http_handlers::post_detail))
                    .route("/{id}", web::put().to(http_handlers::update_post))
                    .route("/{id}", web::delete().to(http_handlers::delete_post))
                    .route("/{id}/image", web::put().to(http_handlers::attach_image))
                    .route("/{id}/comments", web::post().to(http_handlers::add_comment))
                    .route(
                        "/{id}/comments/{comment_id}",
                        web::put().to(http_handlers::edit_comment),
                    )
                    .route(
                        "/{id}/comments/{comment_id}",
                        web::delete().to(http_handlers::delete_comment),
                    ),
            )
            .route(
                "/api/category/{slug}",
                web::get().to(http_handlers::category_posts),
            )
            .service(
                web::scope("/api/profile")
                    .route("/{username}", web::get().to(http_handlers::profile))
                    .route("/{username}", web::put().to(http_handlers::update_profile)),
            )
            // Staff-only catalog management
            .service(
                web::scope("/api/admin")
                    .route("/categories", web::post().to(http_handlers::create_category))
                    .route(
                        "/categories/{id}",
                        web::put().to(http_handlers::update_category),
                    )
                    .route(
                        "/categories/{id}",
                        web::delete().to(http_handlers::delete_category),
                    )
                    .route("/locations", web::post().to(http_handlers::create_location))
                    .route(
                        "/locations/{id}",
                        web::put().to(http_handlers::update_location),
                    )
                    .route(
                        "/locations/{id}",
                        web::delete().to(http_handlers::delete_location),
                    ),
            );
    }
}
