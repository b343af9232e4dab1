pub mod models;

pub use models::{FormatDescriptor, VideoMetadata};
