//! Ownership checks for mutating requests.
//!
//! Each check is a plain predicate; operations pick the one that fits the
//! resource they touch. Anonymous actors never reach the ownership test.

use super::{Actor, Comment, DomainError, Post, User};

pub const LOGIN_PATH: &str = "/api/auth/login";

#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    Post(&'a Post),
    Comment(&'a Comment),
    Profile(&'a User),
}

pub fn can_mutate(actor: &Actor, resource: Resource<'_>) -> bool {
    let Some(actor_id) = actor.id() else {
        return false;
    };

    match resource {
        Resource::Post(post) => post.author_id == actor_id,
        Resource::Comment(comment) => comment.author_id == actor_id,
        Resource::Profile(user) => user.id == actor_id,
    }
}

/// Returns the actor's user id or `AuthenticationRequired`.
pub fn require_login(actor: &Actor) -> Result<i64, DomainError> {
    actor.id().ok_or(DomainError::AuthenticationRequired)
}

pub fn authorize(actor: &Actor, resource: Resource<'_>) -> Result<i64, DomainError> {
    let actor_id = require_login(actor)?;
    if !can_mutate(actor, resource) {
        return Err(DomainError::Forbidden);
    }
    Ok(actor_id)
}

pub fn require_staff(actor: &Actor) -> Result<i64, DomainError> {
    let actor_id = require_login(actor)?;
    if !actor.is_staff() {
        return Err(DomainError::Forbidden);
    }
    Ok(actor_id)
}

/// How a mutation endpoint answers when the ownership check fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnDenial {
    Forbid,
    Redirect(String),
}

impl OnDenial {
    pub fn to_post(post_id: i64) -> Self {
        Self::Redirect(post_detail_path(post_id))
    }
}

pub fn post_detail_path(post_id: i64) -> String {
    format!("/api/posts/{}", post_id)
}

pub fn profile_path(username: &str) -> String {
    format!("/api/profile/{}", username)
}

pub fn login_path(next: &str) -> String {
    format!("{}?next={}", LOGIN_PATH, urlencoding::encode(next))
}
