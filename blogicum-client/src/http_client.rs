use crate::error::BlogicumClientError;
use crate::models::{
    AuthResponse, Category, CategoryPage, Comment, CommentRequest, CreatePostRequest,
    ErrorResponse, LoginRequest, Post, PostDetail, Page, ProfilePage, RegisterRequest,
    UpdatePostRequest, UpdateProfileRequest, User,
};
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

const LOGIN_PATH: &str = "/api/auth/login";

/// Maps a non-success answer to an error. Redirects are not followed: the
/// server uses them to signal a missing login or a denied mutation.
pub fn classify(status: StatusCode, location: Option<&str>, body: &str) -> BlogicumClientError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|e| e.error)
        .unwrap_or_else(|_| body.to_string());

    match status {
        StatusCode::FOUND | StatusCode::SEE_OTHER => match location {
            Some(target) if target.starts_with(LOGIN_PATH) => {
                let next = target
                    .split_once("next=")
                    .map(|(_, next)| decode_next(next))
                    .unwrap_or_default();
                BlogicumClientError::LoginRequired { next }
            }
            Some(target) => BlogicumClientError::Redirected(target.to_string()),
            None => BlogicumClientError::TransportError(format!("HTTP {}", status)),
        },
        StatusCode::BAD_REQUEST => BlogicumClientError::InvalidRequest(message),
        StatusCode::UNAUTHORIZED => BlogicumClientError::Unauthorized(message),
        StatusCode::FORBIDDEN => BlogicumClientError::Forbidden(message),
        StatusCode::NOT_FOUND => BlogicumClientError::NotFound,
        StatusCode::CONFLICT => BlogicumClientError::Conflict(message),
        _ => BlogicumClientError::TransportError(format!("HTTP {}: {}", status, message)),
    }
}

fn decode_next(next: &str) -> String {
    urlencoding::decode(next)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| next.to_string())
}

/// Builds `path?page=N`, leaving the path alone for the first page.
pub fn paged(path: &str, page: Option<i64>) -> String {
    match page {
        Some(page) => format!("{}?page={}", path, page),
        None => path.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, BlogicumClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .redirect(Policy::none())
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            token: None,
        })
    }

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn get_token(&self) -> Option<&String> {
        self.token.as_ref()
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    fn add_auth_header(&self, mut request: RequestBuilder) -> RequestBuilder {
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn check(response: Response) -> Result<Response, BlogicumClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await.unwrap_or_default();

        tracing::debug!("Request failed with {}: {}", status, body);

        Err(classify(status, location.as_deref(), &body))
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, BlogicumClientError> {
        let response = self.add_auth_header(request).send().await?;
        let response = Self::check(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<(), BlogicumClientError> {
        let response = self.add_auth_header(request).send().await?;
        Self::check(response).await?;
        Ok(())
    }

    // ============== Auth ==============

    pub async fn register(
        &mut self,
        req: RegisterRequest,
    ) -> Result<AuthResponse, BlogicumClientError> {
        let url = self.url("/api/auth/register");
        let auth: AuthResponse = self.send_json(self.client.post(&url).json(&req)).await?;
        self.set_token(auth.token.clone());
        Ok(auth)
    }

    pub async fn login(&mut self, req: LoginRequest) -> Result<AuthResponse, BlogicumClientError> {
        let url = self.url(LOGIN_PATH);
        let auth: AuthResponse = self.send_json(self.client.post(&url).json(&req)).await?;
        self.set_token(auth.token.clone());
        Ok(auth)
    }

    pub async fn me(&self) -> Result<User, BlogicumClientError> {
        let url = self.url("/api/auth/me");
        self.send_json(self.client.get(&url)).await
    }

    // ============== Listings ==============

    pub async fn index(&self, page: Option<i64>) -> Result<Page<Post>, BlogicumClientError> {
        let url = self.url(&paged("/api/posts", page));
        self.send_json(self.client.get(&url)).await
    }

    pub async fn category(
        &self,
        slug: &str,
        page: Option<i64>,
    ) -> Result<CategoryPage, BlogicumClientError> {
        let url = self.url(&paged(&format!("/api/category/{}", slug), page));
        self.send_json(self.client.get(&url)).await
    }

    pub async fn profile(
        &self,
        username: &str,
        page: Option<i64>,
    ) -> Result<ProfilePage, BlogicumClientError> {
        let url = self.url(&paged(&format!("/api/profile/{}", username), page));
        self.send_json(self.client.get(&url)).await
    }

    pub async fn update_profile(
        &self,
        username: &str,
        req: UpdateProfileRequest,
    ) -> Result<User, BlogicumClientError> {
        let url = self.url(&format!("/api/profile/{}", username));
        self.send_json(self.client.put(&url).json(&req)).await
    }

    // ============== Posts ==============

    pub async fn get_post(
        &self,
        id: i64,
        comment_page: Option<i64>,
    ) -> Result<PostDetail, BlogicumClientError> {
        let url = self.url(&paged(&format!("/api/posts/{}", id), comment_page));
        self.send_json(self.client.get(&url)).await
    }

    pub async fn create_post(&self, req: CreatePostRequest) -> Result<Post, BlogicumClientError> {
        let url = self.url("/api/posts");
        self.send_json(self.client.post(&url).json(&req)).await
    }

    pub async fn update_post(
        &self,
        id: i64,
        req: UpdatePostRequest,
    ) -> Result<Post, BlogicumClientError> {
        let url = self.url(&format!("/api/posts/{}", id));
        self.send_json(self.client.put(&url).json(&req)).await
    }

    pub async fn delete_post(&self, id: i64) -> Result<(), BlogicumClientError> {
        let url = self.url(&format!("/api/posts/{}", id));
        self.send_empty(self.client.delete(&url)).await
    }

    pub async fn upload_image(
        &self,
        id: i64,
        filename: &str,
        data: Vec<u8>,
    ) -> Result<Post, BlogicumClientError> {
        let url = self.url(&format!("/api/posts/{}/image", id));
        let request = self
            .client
            .put(&url)
            .query(&[("filename", filename)])
            .body(data);
        self.send_json(request).await
    }

    // ============== Comments ==============

    pub async fn add_comment(
        &self,
        post_id: i64,
        text: String,
    ) -> Result<Comment, BlogicumClientError> {
        let url = self.url(&format!("/api/posts/{}/comments", post_id));
        self.send_json(self.client.post(&url).json(&CommentRequest { text }))
            .await
    }

    pub async fn edit_comment(
        &self,
        post_id: i64,
        comment_id: i64,
        text: String,
    ) -> Result<Comment, BlogicumClientError> {
        let url = self.url(&format!("/api/posts/{}/comments/{}", post_id, comment_id));
        self.send_json(self.client.put(&url).json(&CommentRequest { text }))
            .await
    }

    pub async fn delete_comment(
        &self,
        post_id: i64,
        comment_id: i64,
    ) -> Result<(), BlogicumClientError> {
        let url = self.url(&format!("/api/posts/{}/comments/{}", post_id, comment_id));
        self.send_empty(self.client.delete(&url)).await
    }

    // ============== Admin ==============

    pub async fn create_category(
        &self,
        title: String,
        description: String,
        slug: String,
        is_published: bool,
    ) -> Result<Category, BlogicumClientError> {
        let url = self.url("/api/admin/categories");
        let body = serde_json::json!({
            "title": title,
            "description": description,
            "slug": slug,
            "is_published": is_published,
        });
        self.send_json(self.client.post(&url).json(&body)).await
    }
}
