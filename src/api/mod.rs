pub mod envelope;
pub mod errors;
pub mod handlers;
pub mod params;
pub mod routes;

pub use envelope::{read_json, read_json_body, write_json, BodyError, Envelope, MAX_BODY_BYTES};
pub use handlers::AppState;
pub use routes::create_router;
