pub mod rest;
pub mod state;

pub use rest::ApiDoc;
pub use state::{AppState, Stores};
