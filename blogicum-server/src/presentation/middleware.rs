use crate::domain::Actor;
use crate::infrastructure::jwt::JwtService;
use actix_web::dev::Payload;
use actix_web::http::header::Header;
use actix_web::{web, FromRequest, HttpRequest};
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};
use std::future::{ready, Ready};
use std::sync::Arc;

/// Resolves the bearer token, if any, into an [`Actor`]. A missing or
/// invalid token yields `Actor::Anonymous`; mutation handlers then send
/// the client to the login entry point.
pub fn resolve_actor(req: &HttpRequest) -> Actor {
    let auth = match Authorization::<Bearer>::parse(req) {
        Ok(auth) => auth,
        Err(_) => return Actor::Anonymous,
    };

    let jwt_service = match req.app_data::<web::Data<Arc<JwtService>>>() {
        Some(service) => service.get_ref().clone(),
        None => {
            tracing::error!("JWT service not configured");
            return Actor::Anonymous;
        }
    };

    match jwt_service.verify_token(auth.into_scheme().token()) {
        Ok(claims) => Actor::from(claims),
        Err(_) => Actor::Anonymous,
    }
}

impl FromRequest for Actor {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(resolve_actor(req)))
    }
}
