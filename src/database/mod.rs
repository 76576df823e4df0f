pub mod manager;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod repository;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::{InMemoryCatRepository, InMemoryUserRepository};
pub use postgres::{PgCatRepository, PgUserRepository};
pub use query::CatMatch;
pub use repository::{CatRepository, RepositoryError, UserRepository};
