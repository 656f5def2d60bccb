pub mod calculations;
pub mod db;
pub mod models;

pub use db::repository::{RepositoryError, ResultRepository};
pub use models::*;
