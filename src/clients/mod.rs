pub mod ai;
pub mod blob;

pub use ai::{AiClient, OpenAiClient};
pub use blob::{AzureBlobClient, BlobStore};
