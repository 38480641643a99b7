pub mod api;
pub mod config;
pub mod model;
pub mod server;
pub mod store;
pub mod validator;

pub use api::{create_router, AppState, BodyError, Envelope};
pub use config::AppConfig;
pub use model::{Filters, Metadata, Movie, Runtime};
pub use store::{MovieStore, PostgresStore, StoreError};
