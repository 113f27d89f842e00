mod error;
pub mod image;
mod profile;
pub mod prompt;
pub mod providers;
pub mod telemetry;
pub mod types;
pub mod utils;

#[cfg(feature = "server")]
pub mod server;

pub use error::{CoverError, Result};
pub use profile::{
    DEFAULT_API_KEY_ENV, Env, PollConfig, ProviderAuth, ProviderConfig, parse_dotenv,
    resolve_api_key,
};

pub use image::CoverGenerator;
pub use prompt::{Theme, build_prompt, find_theme, themes};
pub use providers::AtlasCloudImages;
pub use types::{
    FailureKind, GenerationRequest, GenerationResult, JobHandle, JobPhase, OutputFormat,
    PollPolicy,
};
