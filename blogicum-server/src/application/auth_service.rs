use crate::data::UserRepository;
use crate::domain::user::{LoginUserRequest, RegisterUserRequest, UserResponse};
use crate::domain::validation::{
    require_non_empty, validate_email, validate_person_name, validate_username,
};
use crate::domain::DomainError;
use crate::infrastructure::jwt::JwtService;
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use std::sync::Arc;

pub struct AuthService {
    user_repo: Arc<dyn UserRepository + Send + Sync>,
    jwt_service: Arc<JwtService>,
}

impl AuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepository + Send + Sync>,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        Self {
            user_repo,
            jwt_service,
        }
    }

    pub async fn register(
        &self,
        req: RegisterUserRequest,
    ) -> Result<(String, UserResponse), DomainError> {
        tracing::debug!("Registering username={}, email={}", req.username, req.email);

        validate_username(&req.username)?;
        validate_email(&req.email)?;
        validate_person_name("First name", &req.first_name)?;
        validate_person_name("Last name", &req.last_name)?;
        require_non_empty("Password", &req.password)?;

        if self.user_repo.find_by_username(&req.username).await.is_ok() {
            tracing::warn!("Registration failed: username already exists");
            return Err(DomainError::UserAlreadyExists);
        }

        if self.user_repo.find_by_email(&req.email).await.is_ok() {
            tracing::warn!("Registration failed: email already exists");
            return Err(DomainError::UserAlreadyExists);
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(req.password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!("Password hashing failed: {}", e);
                DomainError::InternalError(format!("Password hashing failed: {}", e))
            })?
            .to_string();

        let user = self.user_repo.create(req, password_hash).await?;
        let token = self.jwt_service.generate_token(&user)?;

        tracing::info!(
            "User registered successfully: id={}, username={}",
            user.id,
            user.username
        );
        Ok((token, UserResponse::from(user)))
    }

    pub async fn login(
        &self,
        req: LoginUserRequest,
    ) -> Result<(String, UserResponse), DomainError> {
        tracing::debug!("Login attempt for username={}", req.username);

        let user = match self.user_repo.find_by_username(&req.username).await {
            Ok(u) => u,
            Err(DomainError::UserNotFound) => {
                tracing::warn!("User not found: {}", req.username);
                return Err(DomainError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        let parsed_hash = PasswordHash::new(&user.password_hash).map_err(|e| {
            tracing::error!("Invalid password hash format: {}", e);
            DomainError::InternalError(format!("Invalid password hash: {}", e))
        })?;

        if Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .is_err()
        {
            tracing::warn!("Invalid password for user {}", user.username);
            return Err(DomainError::InvalidCredentials);
        }

        let token = self.jwt_service.generate_token(&user)?;

        tracing::info!(
            "User logged in successfully: id={}, username={}",
            user.id,
            user.username
        );
        Ok((token, UserResponse::from(user)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Actor;
    use crate::test_support::Fixture;

    fn service(fx: &Fixture) -> (AuthService, Arc<JwtService>) {
        let jwt = Arc::new(JwtService::new("test-secret-test-secret-test-secret-00").unwrap());
        (AuthService::new(fx.repos.users.clone(), jwt.clone()), jwt)
    }

    fn register(username: &str, password: &str) -> RegisterUserRequest {
        RegisterUserRequest {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: password.to_string(),
            first_name: String::new(),
            last_name: String::new(),
        }
    }

    #[tokio::test]
    async fn register_then_login() {
        let fx = Fixture::new();
        let (auth, jwt) = service(&fx);

        let (token, user) = auth.register(register("writer", "s3cret")).await.unwrap();
        let actor = Actor::from(jwt.verify_token(&token).unwrap());
        assert_eq!(actor.id(), Some(user.id));

        let (_, logged_in) = auth
            .login(LoginUserRequest {
                username: "writer".to_string(),
                password: "s3cret".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_alike() {
        let fx = Fixture::new();
        let (auth, _) = service(&fx);
        auth.register(register("writer", "s3cret")).await.unwrap();

        for (username, password) in [("writer", "nope"), ("ghost", "s3cret")] {
            let result = auth
                .login(LoginUserRequest {
                    username: username.to_string(),
                    password: password.to_string(),
                })
                .await;
            assert!(matches!(result, Err(DomainError::InvalidCredentials)));
        }
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let fx = Fixture::new();
        let (auth, _) = service(&fx);
        auth.register(register("writer", "one")).await.unwrap();

        let mut again = register("writer", "two");
        again.email = "other@example.com".to_string();
        assert!(matches!(
            auth.register(again).await,
            Err(DomainError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn overlong_account_fields_rejected() {
        let fx = Fixture::new();
        let (auth, _) = service(&fx);

        let long_username = register(&"u".repeat(200), "s3cret");
        assert!(matches!(
            auth.register(long_username).await,
            Err(DomainError::ValidationError(_))
        ));

        let mut long_email = register("writer", "s3cret");
        long_email.email = format!("{}@example.com", "e".repeat(300));
        assert!(matches!(
            auth.register(long_email).await,
            Err(DomainError::ValidationError(_))
        ));

        let mut long_name = register("writer", "s3cret");
        long_name.first_name = "n".repeat(500);
        assert!(matches!(
            auth.register(long_name).await,
            Err(DomainError::ValidationError(_))
        ));

        assert!(auth.register(register("writer", "s3cret")).await.is_ok());
    }

    #[tokio::test]
    async fn empty_password_rejected() {
        let fx = Fixture::new();
        let (auth, _) = service(&fx);
        assert!(matches!(
            auth.register(register("writer", "")).await,
            Err(DomainError::ValidationError(_))
        ));
    }
}
