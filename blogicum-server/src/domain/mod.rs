pub mod authorization;
pub mod category;
pub mod comment;
pub mod error;
pub mod location;
pub mod post;
pub mod query;
pub mod user;
pub mod validation;
pub mod visibility;

pub use category::Category;
pub use comment::Comment;
pub use error::DomainError;
pub use location::Location;
pub use post::{Post, PostView};
pub use user::{Actor, User};
