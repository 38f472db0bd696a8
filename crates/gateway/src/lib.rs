//! Typed client for the OpenAI `/videos` API.
//!
//! Wraps job submission, listing, retrieval, deletion, remixing, and
//! binary content download behind [`VideoApi`](api::VideoApi), mapping
//! every failure into the shared [`SoraError`](sora_core::SoraError)
//! taxonomy.

pub mod api;

pub use api::{
    ContentVariant, DeleteConfirmation, InputReference, SubmitRequest, VideoApi, DEFAULT_BASE_URL,
};
