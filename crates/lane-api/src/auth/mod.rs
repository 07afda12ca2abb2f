pub mod middleware;
pub mod models;

pub use middleware::auth_middleware;
pub use models::OwnerContext;
