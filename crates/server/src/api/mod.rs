pub mod handlers;
pub mod middleware;
pub mod pool;
pub mod purchases;
pub mod routes;

pub use routes::create_router;
