mod atlascloud;
pub mod atlascloud_payload;
mod atlascloud_poll;

pub use atlascloud::{AtlasCloudImages, DEFAULT_BASE_URL, DEFAULT_MODEL};
