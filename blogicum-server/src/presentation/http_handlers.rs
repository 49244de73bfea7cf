use crate::application::{
    AuthService, BlogService, CatalogService, CommentService, FeedService, ProfileService,
};
use crate::domain::authorization::{
    login_path, profile_path, require_login, require_staff, OnDenial, LOGIN_PATH,
};
use crate::domain::category::{CreateCategoryRequest, UpdateCategoryRequest};
use crate::domain::comment::CommentRequest;
use crate::domain::location::{CreateLocationRequest, UpdateLocationRequest};
use crate::domain::post::{CreatePostRequest, UpdatePostRequest};
use crate::domain::user::{
    LoginUserRequest, RegisterUserRequest, UpdateProfileRequest, UserResponse,
};
use crate::domain::{Actor, DomainError};
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use std::sync::Arc;

// Ответ с токеном
#[derive(serde::Serialize)]
struct AuthResponse {
    token: String,
    user: UserResponse,
}

#[derive(serde::Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
}

impl PageQuery {
    fn number(&self) -> i64 {
        self.page.unwrap_or(1)
    }
}

#[derive(serde::Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

#[derive(serde::Deserialize)]
pub struct ImageQuery {
    pub filename: String,
}

// Преобразование DomainError в HttpResponse
fn error_to_response(err: DomainError) -> HttpResponse {
    let status_code = err.to_status_code();
    let message = err.to_string();

    if err.is_not_found() {
        tracing::debug!("{}", message);
    }

    match status_code {
        400 => HttpResponse::BadRequest().json(serde_json::json!({ "error": message })),
        401 => HttpResponse::Unauthorized().json(serde_json::json!({ "error": message })),
        403 => HttpResponse::Forbidden().json(serde_json::json!({ "error": message })),
        404 => HttpResponse::NotFound().json(serde_json::json!({ "error": message })),
        409 => HttpResponse::Conflict().json(serde_json::json!({ "error": message })),
        _ => {
            tracing::error!("Request failed: {}", message);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": "Internal server error" }))
        }
    }
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Error handling for mutating endpoints: anonymous actors go to the login
/// entry point, ownership failures follow the endpoint's denial policy.
fn mutation_error(err: DomainError, req: &HttpRequest, on_denial: OnDenial) -> HttpResponse {
    match (err, on_denial) {
        (DomainError::AuthenticationRequired, _) => redirect(&login_path(req.path())),
        (DomainError::Forbidden, OnDenial::Redirect(location)) => {
            tracing::info!("Ownership check failed, redirecting to {}", location);
            redirect(&location)
        }
        (err, _) => error_to_response(err),
    }
}

/// Rejected body or query string, rendered with the extractor's status.
fn bad_payload(err: actix_web::Error) -> HttpResponse {
    let status = err.as_response_error().status_code();
    tracing::debug!("Rejected request payload: {}", err);
    HttpResponse::build(status).json(serde_json::json!({ "error": err.to_string() }))
}

// Payload extractors are taken as `Result` so that access checks are
// reported ahead of a malformed body.
type Payload<T> = Result<T, actix_web::Error>;

fn login_first<T>(
    actor: &Actor,
    req: &HttpRequest,
    payload: Payload<T>,
) -> Result<T, HttpResponse> {
    require_login(actor).map_err(|e| mutation_error(e, req, OnDenial::Forbid))?;
    payload.map_err(bad_payload)
}

fn staff_first<T>(
    actor: &Actor,
    req: &HttpRequest,
    payload: Payload<T>,
) -> Result<T, HttpResponse> {
    require_staff(actor).map_err(|e| mutation_error(e, req, OnDenial::Forbid))?;
    payload.map_err(bad_payload)
}

/// A malformed request against someone else's post is still answered
/// with the post redirect.
async fn owner_first<T>(
    blog_service: &BlogService,
    post_id: i64,
    actor: &Actor,
    req: &HttpRequest,
    payload: Payload<T>,
) -> Result<T, HttpResponse> {
    match payload {
        Ok(payload) => Ok(payload),
        Err(err) => match blog_service.ensure_owner(post_id, actor).await {
            Ok(()) => Err(bad_payload(err)),
            Err(e) => Err(mutation_error(e, req, OnDenial::to_post(post_id))),
        },
    }
}

// ============== Auth Handlers ==============

pub async fn register(
    auth_service: web::Data<Arc<AuthService>>,
    req: web::Json<RegisterUserRequest>,
) -> impl Responder {
    match auth_service.register(req.into_inner()).await {
        Ok((token, user)) => HttpResponse::Created().json(AuthResponse { token, user }),
        Err(err) => error_to_response(err),
    }
}

pub async fn login(
    auth_service: web::Data<Arc<AuthService>>,
    req: web::Json<LoginUserRequest>,
) -> impl Responder {
    match auth_service.login(req.into_inner()).await {
        Ok((token, user)) => HttpResponse::Ok().json(AuthResponse { token, user }),
        Err(err) => error_to_response(err),
    }
}

/// Where anonymous mutations are redirected to.
pub async fn login_entry(query: web::Query<LoginQuery>) -> impl Responder {
    HttpResponse::Unauthorized().json(serde_json::json!({
        "error": "Authentication required",
        "login": LOGIN_PATH,
        "next": query.next,
    }))
}

pub async fn me(
    actor: Actor,
    profile_service: web::Data<Arc<ProfileService>>,
) -> impl Responder {
    match profile_service.me(&actor).await {
        Ok(user) => HttpResponse::Ok().json(user),
        Err(err) => error_to_response(err),
    }
}

// ============== Listing Handlers ==============

pub async fn index(
    feed_service: web::Data<Arc<FeedService>>,
    query: web::Query<PageQuery>,
) -> impl Responder {
    tracing::info!("Listing index page={}", query.number());

    match feed_service.index(query.number(), Utc::now()).await {
        Ok(page) => HttpResponse::Ok().json(page),
        Err(err) => error_to_response(err),
    }
}

pub async fn category_posts(
    feed_service: web::Data<Arc<FeedService>>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> impl Responder {
    let slug = path.into_inner();

    tracing::info!("Listing category {} page={}", slug, query.number());

    match feed_service
        .category(&slug, query.number(), Utc::now())
        .await
    {
        Ok(page) => HttpResponse::Ok().json(page),
        Err(err) => error_to_response(err),
    }
}

pub async fn profile(
    actor: Actor,
    feed_service: web::Data<Arc<FeedService>>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> impl Responder {
    let username = path.into_inner();

    tracing::info!("Listing profile {} page={}", username, query.number());

    match feed_service
        .profile(&username, &actor, query.number(), Utc::now())
        .await
    {
        Ok(page) => HttpResponse::Ok().json(page),
        Err(err) => error_to_response(err),
    }
}

pub async fn post_detail(
    actor: Actor,
    feed_service: web::Data<Arc<FeedService>>,
    path: web::Path<i64>,
    query: web::Query<PageQuery>,
) -> impl Responder {
    let post_id = path.into_inner();

    tracing::info!("Getting post with id={}", post_id);

    match feed_service
        .post_detail(post_id, &actor, query.number(), Utc::now())
        .await
    {
        Ok(detail) => HttpResponse::Ok().json(detail),
        Err(err) => error_to_response(err),
    }
}

// ============== Post Handlers ==============

pub async fn create_post(
    req: HttpRequest,
    actor: Actor,
    blog_service: web::Data<Arc<BlogService>>,
    post_data: Payload<web::Json<CreatePostRequest>>,
) -> impl Responder {
    tracing::info!("Creating post for user_id={:?}", actor.id());

    let post_data = match login_first(&actor, &req, post_data) {
        Ok(data) => data,
        Err(resp) => return resp,
    };

    match blog_service.create_post(&actor, post_data.into_inner()).await {
        Ok(post) => HttpResponse::Created()
            .insert_header((header::LOCATION, profile_path(&post.author.username)))
            .json(post),
        Err(err) => mutation_error(err, &req, OnDenial::Forbid),
    }
}

pub async fn update_post(
    req: HttpRequest,
    actor: Actor,
    blog_service: web::Data<Arc<BlogService>>,
    path: web::Path<i64>,
    post_data: Payload<web::Json<UpdatePostRequest>>,
) -> impl Responder {
    let post_id = path.into_inner();

    tracing::info!("Updating post id={} for user_id={:?}", post_id, actor.id());

    let post_data = match owner_first(&blog_service, post_id, &actor, &req, post_data).await {
        Ok(data) => data,
        Err(resp) => return resp,
    };

    match blog_service
        .update_post(post_id, &actor, post_data.into_inner())
        .await
    {
        Ok(post) => HttpResponse::Ok().json(post),
        Err(err) => mutation_error(err, &req, OnDenial::to_post(post_id)),
    }
}

pub async fn delete_post(
    req: HttpRequest,
    actor: Actor,
    blog_service: web::Data<Arc<BlogService>>,
    path: web::Path<i64>,
) -> impl Responder {
    let post_id = path.into_inner();

    tracing::info!("Deleting post id={} for user_id={:?}", post_id, actor.id());

    match blog_service.delete_post(post_id, &actor).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => mutation_error(err, &req, OnDenial::to_post(post_id)),
    }
}

pub async fn attach_image(
    req: HttpRequest,
    actor: Actor,
    blog_service: web::Data<Arc<BlogService>>,
    path: web::Path<i64>,
    query: Payload<web::Query<ImageQuery>>,
    body: Payload<web::Bytes>,
) -> impl Responder {
    let post_id = path.into_inner();

    let upload = query.and_then(|query| body.map(|body| (query, body)));
    let (query, body) = match owner_first(&blog_service, post_id, &actor, &req, upload).await {
        Ok(upload) => upload,
        Err(resp) => return resp,
    };

    tracing::info!(
        "Uploading image {} ({} bytes) for post id={}",
        query.filename,
        body.len(),
        post_id
    );

    match blog_service
        .attach_image(post_id, &actor, &query.filename, &body)
        .await
    {
        Ok(post) => HttpResponse::Ok().json(post),
        Err(err) => mutation_error(err, &req, OnDenial::to_post(post_id)),
    }
}

// ============== Comment Handlers ==============

pub async fn add_comment(
    req: HttpRequest,
    actor: Actor,
    comment_service: web::Data<Arc<CommentService>>,
    path: web::Path<i64>,
    comment: Payload<web::Json<CommentRequest>>,
) -> impl Responder {
    let post_id = path.into_inner();

    let comment = match login_first(&actor, &req, comment) {
        Ok(comment) => comment,
        Err(resp) => return resp,
    };

    match comment_service
        .add_comment(post_id, &actor, comment.into_inner())
        .await
    {
        Ok(comment) => HttpResponse::Created().json(comment),
        Err(err) => mutation_error(err, &req, OnDenial::Forbid),
    }
}

pub async fn edit_comment(
    req: HttpRequest,
    actor: Actor,
    comment_service: web::Data<Arc<CommentService>>,
    path: web::Path<(i64, i64)>,
    comment: Payload<web::Json<CommentRequest>>,
) -> impl Responder {
    let (post_id, comment_id) = path.into_inner();

    let comment = match login_first(&actor, &req, comment) {
        Ok(comment) => comment,
        Err(resp) => return resp,
    };

    match comment_service
        .edit_comment(post_id, comment_id, &actor, comment.into_inner())
        .await
    {
        Ok(comment) => HttpResponse::Ok().json(comment),
        Err(err) => mutation_error(err, &req, OnDenial::Forbid),
    }
}

pub async fn delete_comment(
    req: HttpRequest,
    actor: Actor,
    comment_service: web::Data<Arc<CommentService>>,
    path: web::Path<(i64, i64)>,
) -> impl Responder {
    let (post_id, comment_id) = path.into_inner();

    match comment_service
        .delete_comment(post_id, comment_id, &actor)
        .await
    {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => mutation_error(err, &req, OnDenial::Forbid),
    }
}

// ============== Profile Handlers ==============

pub async fn update_profile(
    req: HttpRequest,
    actor: Actor,
    profile_service: web::Data<Arc<ProfileService>>,
    path: web::Path<String>,
    profile: Payload<web::Json<UpdateProfileRequest>>,
) -> impl Responder {
    let username = path.into_inner();

    let profile = match login_first(&actor, &req, profile) {
        Ok(profile) => profile,
        Err(resp) => return resp,
    };

    match profile_service
        .update_profile(&username, &actor, profile.into_inner())
        .await
    {
        Ok(user) => HttpResponse::Ok().json(user),
        Err(err) => mutation_error(err, &req, OnDenial::Forbid),
    }
}

// ============== Admin Handlers ==============

pub async fn create_category(
    req: HttpRequest,
    actor: Actor,
    catalog_service: web::Data<Arc<CatalogService>>,
    category: Payload<web::Json<CreateCategoryRequest>>,
) -> impl Responder {
    let category = match staff_first(&actor, &req, category) {
        Ok(category) => category,
        Err(resp) => return resp,
    };

    match catalog_service
        .create_category(&actor, category.into_inner())
        .await
    {
        Ok(category) => HttpResponse::Created().json(category),
        Err(err) => mutation_error(err, &req, OnDenial::Forbid),
    }
}

pub async fn update_category(
    req: HttpRequest,
    actor: Actor,
    catalog_service: web::Data<Arc<CatalogService>>,
    path: web::Path<i64>,
    category: Payload<web::Json<UpdateCategoryRequest>>,
) -> impl Responder {
    let category = match staff_first(&actor, &req, category) {
        Ok(category) => category,
        Err(resp) => return resp,
    };

    match catalog_service
        .update_category(&actor, path.into_inner(), category.into_inner())
        .await
    {
        Ok(category) => HttpResponse::Ok().json(category),
        Err(err) => mutation_error(err, &req, OnDenial::Forbid),
    }
}

pub async fn delete_category(
    req: HttpRequest,
    actor: Actor,
    catalog_service: web::Data<Arc<CatalogService>>,
    path: web::Path<i64>,
) -> impl Responder {
    match catalog_service
        .delete_category(&actor, path.into_inner())
        .await
    {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => mutation_error(err, &req, OnDenial::Forbid),
    }
}

pub async fn create_location(
    req: HttpRequest,
    actor: Actor,
    catalog_service: web::Data<Arc<CatalogService>>,
    location: Payload<web::Json<CreateLocationRequest>>,
) -> impl Responder {
    let location = match staff_first(&actor, &req, location) {
        Ok(location) => location,
        Err(resp) => return resp,
    };

    match catalog_service
        .create_location(&actor, location.into_inner())
        .await
    {
        Ok(location) => HttpResponse::Created().json(location),
        Err(err) => mutation_error(err, &req, OnDenial::Forbid),
    }
}

pub async fn update_location(
    req: HttpRequest,
    actor: Actor,
    catalog_service: web::Data<Arc<CatalogService>>,
    path: web::Path<i64>,
    location: Payload<web::Json<UpdateLocationRequest>>,
) -> impl Responder {
    let location = match staff_first(&actor, &req, location) {
        Ok(location) => location,
        Err(resp) => return resp,
    };

    match catalog_service
        .update_location(&actor, path.into_inner(), location.into_inner())
        .await
    {
        Ok(location) => HttpResponse::Ok().json(location),
        Err(err) => mutation_error(err, &req, OnDenial::Forbid),
    }
}

pub async fn delete_location(
    req: HttpRequest,
    actor: Actor,
    catalog_service: web::Data<Arc<CatalogService>>,
    path: web::Path<i64>,
) -> impl Responder {
    match catalog_service
        .delete_location(&actor, path.into_inner())
        .await
    {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => mutation_error(err, &req, OnDenial::Forbid),
    }
}

#[cfg(test)]
mod tests {
    use crate::data::PostRepository;
    use crate::domain::{DomainError, User};
    use crate::infrastructure::jwt::JwtService;
    use crate::infrastructure::storage::ImageStorage;
    use crate::presentation::Services;
    use crate::test_support::Fixture;
    use actix_web::http::{header, StatusCode};
    use actix_web::{test, App};
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use std::sync::Arc;

    struct NoImages;

    #[async_trait]
    impl ImageStorage for NoImages {
        async fn store(&self, filename: &str, _data: &[u8]) -> Result<String, DomainError> {
            Ok(format!("post_images/{}", filename))
        }
    }

    fn services(fx: &Fixture) -> Services {
        let jwt = Arc::new(JwtService::new("handler-tests-secret-handler-tests-01").unwrap());
        Services::build(&fx.repos, jwt, Arc::new(NoImages))
    }

    fn bearer(services: &Services, user: &User) -> (header::HeaderName, String) {
        let token = services.jwt.generate_token(user).unwrap();
        (header::AUTHORIZATION, format!("Bearer {}", token))
    }

    fn location(resp: &actix_web::dev::ServiceResponse) -> &str {
        resp.headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
    }

    #[actix_web::test]
    async fn anonymous_mutation_redirects_to_login() {
        let fx = Fixture::new();
        let author = fx.user("author").await;
        let post = fx.post(&author, None, Utc::now()).await;
        let services = services(&fx);
        let app = test::init_service(App::new().configure(|cfg| services.configure(cfg))).await;

        let path = format!("/api/posts/{}", post.id);
        let req = test::TestRequest::delete().uri(&path).to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(
            location(&resp),
            format!("/api/auth/login?next={}", urlencoding::encode(&path))
        );
    }

    #[actix_web::test]
    async fn anonymous_malformed_mutation_redirects_to_login() {
        let fx = Fixture::new();
        let author = fx.user("author").await;
        let post = fx.post(&author, None, Utc::now()).await;
        let services = services(&fx);
        let app = test::init_service(App::new().configure(|cfg| services.configure(cfg))).await;

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .set_json(serde_json::json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/api/auth/login?next=%2Fapi%2Fposts");

        let req = test::TestRequest::post()
            .uri(&format!("/api/posts/{}/comments", post.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert!(location(&resp).starts_with("/api/auth/login?next="));

        let req = test::TestRequest::put()
            .uri(&format!("/api/posts/{}/image", post.id))
            .set_payload("png")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert!(location(&resp).starts_with("/api/auth/login?next="));

        let req = test::TestRequest::put()
            .uri("/api/profile/author")
            .set_json(serde_json::json!({ "email": 7 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
    }

    #[actix_web::test]
    async fn malformed_body_is_bad_request_when_logged_in() {
        let fx = Fixture::new();
        let author = fx.user("author").await;
        let services = services(&fx);
        let app = test::init_service(App::new().configure(|cfg| services.configure(cfg))).await;

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(bearer(&services, &author))
            .set_json(serde_json::json!({}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["error"].is_string());
    }

    #[actix_web::test]
    async fn invalid_token_is_treated_as_anonymous() {
        let fx = Fixture::new();
        let services = services(&fx);
        let app = test::init_service(App::new().configure(|cfg| services.configure(cfg))).await;

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header((header::AUTHORIZATION, "Bearer not-a-token"))
            .set_json(serde_json::json!({
                "title": "Hello",
                "text": "World",
                "pub_date": Utc::now(),
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FOUND);
        assert!(location(&resp).starts_with("/api/auth/login?next="));
    }

    #[actix_web::test]
    async fn foreign_post_delete_redirects_to_detail() {
        let fx = Fixture::new();
        let author = fx.user("author").await;
        let other = fx.user("other").await;
        let post = fx.post(&author, None, Utc::now()).await;
        let services = services(&fx);
        let app = test::init_service(App::new().configure(|cfg| services.configure(cfg))).await;

        let req = test::TestRequest::delete()
            .uri(&format!("/api/posts/{}", post.id))
            .insert_header(bearer(&services, &other))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), format!("/api/posts/{}", post.id));

        let req = test::TestRequest::delete()
            .uri(&format!("/api/posts/{}", post.id))
            .insert_header(bearer(&services, &author))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }

    #[actix_web::test]
    async fn foreign_post_edit_redirects_to_detail() {
        let fx = Fixture::new();
        let author = fx.user("author").await;
        let other = fx.user("other").await;
        let post = fx.post(&author, None, Utc::now()).await;
        let services = services(&fx);
        let app = test::init_service(App::new().configure(|cfg| services.configure(cfg))).await;
        let uri = format!("/api/posts/{}", post.id);

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header(bearer(&services, &other))
            .set_json(serde_json::json!({ "title": "Taken over" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), uri);

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header(bearer(&services, &other))
            .set_json(serde_json::json!({ "title": 5 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), uri);

        let req = test::TestRequest::put()
            .uri(&uri)
            .insert_header(bearer(&services, &author))
            .set_json(serde_json::json!({ "title": 5 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let stored = fx.repos.posts.find_by_id(post.id).await.unwrap();
        assert_eq!(stored.title, post.title);
    }

    #[actix_web::test]
    async fn foreign_image_upload_redirects_to_detail() {
        let fx = Fixture::new();
        let author = fx.user("author").await;
        let other = fx.user("other").await;
        let post = fx.post(&author, None, Utc::now()).await;
        let services = services(&fx);
        let app = test::init_service(App::new().configure(|cfg| services.configure(cfg))).await;

        let req = test::TestRequest::put()
            .uri(&format!("/api/posts/{}/image?filename=a.png", post.id))
            .insert_header(bearer(&services, &other))
            .set_payload("png")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), format!("/api/posts/{}", post.id));

        let req = test::TestRequest::put()
            .uri(&format!("/api/posts/{}/image", post.id))
            .insert_header(bearer(&services, &other))
            .set_payload("png")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), format!("/api/posts/{}", post.id));

        let req = test::TestRequest::put()
            .uri(&format!("/api/posts/{}/image?filename=a.png", post.id))
            .insert_header(bearer(&services, &author))
            .set_payload("png")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn foreign_comment_edit_is_forbidden() {
        let fx = Fixture::new();
        let author = fx.user("author").await;
        let other = fx.user("other").await;
        let post = fx.post(&author, None, Utc::now()).await;
        let comment = fx.comment(&post, &author, "mine").await;
        let services = services(&fx);
        let app = test::init_service(App::new().configure(|cfg| services.configure(cfg))).await;

        let req = test::TestRequest::put()
            .uri(&format!("/api/posts/{}/comments/{}", post.id, comment.id))
            .insert_header(bearer(&services, &other))
            .set_json(serde_json::json!({ "text": "hijacked" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn create_post_points_to_author_profile() {
        let fx = Fixture::new();
        let author = fx.user("author").await;
        let services = services(&fx);
        let app = test::init_service(App::new().configure(|cfg| services.configure(cfg))).await;

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(bearer(&services, &author))
            .set_json(serde_json::json!({
                "title": "Hello",
                "text": "World",
                "pub_date": Utc::now(),
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(location(&resp), "/api/profile/author");
    }

    #[actix_web::test]
    async fn unpublished_category_listing_is_not_found() {
        let fx = Fixture::new();
        fx.category("hidden", false).await;
        let services = services(&fx);
        let app = test::init_service(App::new().configure(|cfg| services.configure(cfg))).await;

        let req = test::TestRequest::get()
            .uri("/api/category/hidden")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn scheduled_post_only_on_owner_profile() {
        let fx = Fixture::new();
        let author = fx.user("author").await;
        let cat = fx.category("travel", true).await;
        let scheduled = fx
            .post(&author, Some(&cat), Utc::now() + Duration::days(1))
            .await;
        let services = services(&fx);
        let app = test::init_service(App::new().configure(|cfg| services.configure(cfg))).await;

        let req = test::TestRequest::get().uri("/api/posts").to_request();
        let index: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(index["total"], 0);

        let req = test::TestRequest::get()
            .uri("/api/profile/author")
            .insert_header(bearer(&services, &author))
            .to_request();
        let profile: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(profile["posts"]["items"][0]["id"], scheduled.id);

        let req = test::TestRequest::get()
            .uri(&format!("/api/posts/{}", scheduled.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn page_past_the_end_is_not_found() {
        let fx = Fixture::new();
        let services = services(&fx);
        let app = test::init_service(App::new().configure(|cfg| services.configure(cfg))).await;

        let req = test::TestRequest::get().uri("/api/posts?page=1").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/api/posts?page=2").to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[actix_web::test]
    async fn admin_routes_require_staff() {
        let fx = Fixture::new();
        let user = fx.user("user").await;
        let staff = fx.staff("boss").await;
        let services = services(&fx);
        let app = test::init_service(App::new().configure(|cfg| services.configure(cfg))).await;

        let body = serde_json::json!({
            "title": "Travel",
            "description": "Trips",
            "slug": "travel",
        });

        let req = test::TestRequest::post()
            .uri("/api/admin/categories")
            .insert_header(bearer(&services, &user))
            .set_json(&body)
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::FORBIDDEN
        );

        let req = test::TestRequest::post()
            .uri("/api/admin/categories")
            .insert_header(bearer(&services, &user))
            .set_json(serde_json::json!({ "slug": "travel" }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::FORBIDDEN
        );

        let req = test::TestRequest::post()
            .uri("/api/admin/categories")
            .insert_header(bearer(&services, &staff))
            .set_json(&body)
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::CREATED
        );
    }
}
