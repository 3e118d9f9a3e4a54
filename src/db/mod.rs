pub mod appeals;
pub mod connection;
pub mod documents;
pub mod enforcers;
pub mod pagination;
pub mod reports;

pub use connection::{init_db, Database};
