//! Upload and reconstruction pipeline tying the Nest components together.
//!
//! [`UploadPipeline`] is the write path: validate, reserve quota, split
//! into content-defined chunks, store each chunk (dedup hits are the happy
//! path), then persist a [`FileManifest`](nest_types::FileManifest).
//! [`Reconstructor`] is the inverse: fetch the manifest's chunks in order
//! and reassemble the exact original bytes.
//!
//! The HTTP layer depends on these two types plus the
//! [`ManifestRepository`](nest_meta::ManifestRepository) trait; everything
//! is injected, nothing is process-global.

pub mod backend;
pub mod error;
pub mod pipeline;
pub mod reconstruct;

pub use backend::StoreBackend;
pub use error::PipelineError;
pub use pipeline::UploadPipeline;
pub use reconstruct::Reconstructor;

#[cfg(test)]
mod tests;
