pub mod http;

pub use http::{CoverHttpState, ErrorResponse, GenerateResponse, router};
