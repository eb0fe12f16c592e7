pub mod contact;
pub mod sqlx_repo;
