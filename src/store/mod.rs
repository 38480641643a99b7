pub mod postgres;
pub mod traits;

pub use postgres::PostgresStore;
pub use traits::{MovieStore, StoreError};
