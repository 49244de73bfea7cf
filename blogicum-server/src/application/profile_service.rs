use crate::data::UserRepository;
use crate::domain::authorization::{authorize, require_login, Resource};
use crate::domain::user::{UpdateProfileRequest, UserResponse};
use crate::domain::validation::{validate_email, validate_person_name, validate_username};
use crate::domain::{Actor, DomainError};
use std::sync::Arc;

pub struct ProfileService {
    user_repo: Arc<dyn UserRepository + Send + Sync>,
}

impl ProfileService {
    pub fn new(user_repo: Arc<dyn UserRepository + Send + Sync>) -> Self {
        Self { user_repo }
    }

    /// The editing user's own view of their account.
    pub async fn me(&self, actor: &Actor) -> Result<UserResponse, DomainError> {
        let user_id = require_login(actor)?;
        let user = self.user_repo.find_by_id(user_id).await?;
        Ok(UserResponse::from(user))
    }

    pub async fn update_profile(
        &self,
        username: &str,
        actor: &Actor,
        req: UpdateProfileRequest,
    ) -> Result<UserResponse, DomainError> {
        require_login(actor)?;
        let mut user = self.user_repo.find_by_username(username).await?;

        if let Err(e) = authorize(actor, Resource::Profile(&user)) {
            tracing::warn!(
                "User {:?} attempted to edit profile of {}",
                actor.id(),
                username
            );
            return Err(e);
        }

        if let Some(new_username) = req.username {
            validate_username(&new_username)?;
            user.username = new_username;
        }
        if let Some(first_name) = req.first_name {
            validate_person_name("First name", &first_name)?;
            user.first_name = first_name;
        }
        if let Some(last_name) = req.last_name {
            validate_person_name("Last name", &last_name)?;
            user.last_name = last_name;
        }
        if let Some(email) = req.email {
            validate_email(&email)?;
            user.email = email;
        }

        let user = self.user_repo.save(&user).await?;

        tracing::info!("Profile updated: id={}, username={}", user.id, user.username);

        Ok(UserResponse::from(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{actor, Fixture};

    fn rename(to: &str) -> UpdateProfileRequest {
        UpdateProfileRequest {
            username: Some(to.to_string()),
            first_name: Some("Ivan".to_string()),
            last_name: None,
            email: None,
        }
    }

    #[tokio::test]
    async fn user_edits_only_own_profile() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        let bob = fx.user("bob").await;
        let profiles = ProfileService::new(fx.repos.users.clone());

        assert!(matches!(
            profiles.update_profile("alice", &actor(&bob), rename("mallory")).await,
            Err(DomainError::Forbidden)
        ));
        assert!(matches!(
            profiles
                .update_profile("alice", &Actor::Anonymous, rename("mallory"))
                .await,
            Err(DomainError::AuthenticationRequired)
        ));

        let updated = profiles
            .update_profile("alice", &actor(&alice), rename("alice2"))
            .await
            .unwrap();
        assert_eq!(updated.username, "alice2");
        assert_eq!(updated.first_name, "Ivan");
    }

    #[tokio::test]
    async fn username_collision_conflicts() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        fx.user("bob").await;
        let profiles = ProfileService::new(fx.repos.users.clone());

        assert!(matches!(
            profiles.update_profile("alice", &actor(&alice), rename("bob")).await,
            Err(DomainError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn overlong_profile_fields_rejected() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        let profiles = ProfileService::new(fx.repos.users.clone());

        let long_last_name = UpdateProfileRequest {
            username: None,
            first_name: None,
            last_name: Some("l".repeat(151)),
            email: None,
        };
        assert!(matches!(
            profiles
                .update_profile("alice", &actor(&alice), long_last_name)
                .await,
            Err(DomainError::ValidationError(_))
        ));

        let long_email = UpdateProfileRequest {
            username: None,
            first_name: None,
            last_name: None,
            email: Some(format!("{}@example.com", "e".repeat(250))),
        };
        assert!(matches!(
            profiles.update_profile("alice", &actor(&alice), long_email).await,
            Err(DomainError::ValidationError(_))
        ));

        assert!(matches!(
            profiles
                .update_profile("alice", &actor(&alice), rename(&"a".repeat(151)))
                .await,
            Err(DomainError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn me_returns_contact_details() {
        let fx = Fixture::new();
        let alice = fx.user("alice").await;
        let me = ProfileService::new(fx.repos.users.clone())
            .me(&actor(&alice))
            .await
            .unwrap();
        assert_eq!(me.email, "alice@example.com");
    }
}
