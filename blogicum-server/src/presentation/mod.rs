pub mod http_handlers;
pub mod middleware;
pub mod routes;

pub use routes::Services;
