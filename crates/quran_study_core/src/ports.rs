//! crates/quran_study_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the content API, the generative-text backend, the speech
//! recognizer and the device storage.

use async_trait::async_trait;

use crate::domain::{Chapter, ChapterContent, Commentary, LastReadMarker};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Network failure: {0}")]
    Network(String),
    #[error("HTTP {status} from {endpoint}")]
    Http { status: u16, endpoint: String },
    #[error("Malformed response: {0}")]
    Malformed(String),
    #[error("Missing credential: {0}")]
    MissingCredential(String),
    #[error("Could not parse generated payload: {0}")]
    Parse(String),
    #[error("Capability unavailable: {0}")]
    Unavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Read-only access to the chapter list, chapter verses and verse commentary.
#[async_trait]
pub trait ContentService: Send + Sync {
    /// The full ordered chapter list.
    async fn list_chapters(&self) -> PortResult<Vec<Chapter>>;

    /// A chapter with all of its verses, including audio locators for the
    /// configured recitation edition.
    async fn chapter_content(&self, chapter_id: u32) -> PortResult<ChapterContent>;

    /// Commentary for one verse, addressed by chapter and position within the chapter.
    async fn commentary(&self, chapter_id: u32, verse_in_chapter: u32) -> PortResult<Commentary>;
}

/// How the generative backend should shape its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    Text,
    Json,
}

#[async_trait]
pub trait TextGenerationService: Send + Sync {
    /// Whether a credential is configured. Checked before any request is issued.
    fn has_credential(&self) -> bool;

    /// Sends one instruction and returns the raw generated text.
    async fn generate(&self, prompt: &str, mode: ResponseMode) -> PortResult<String>;
}

#[async_trait]
pub trait SpeechToTextService: Send + Sync {
    /// Transcribes a single captured utterance, returning the best hypothesis.
    async fn transcribe_audio(&self, audio_data: &[u8]) -> PortResult<String>;
}

/// Durable, device-local key-value storage for the last-read marker.
#[async_trait]
pub trait PreferencesStore: Send + Sync {
    async fn load_last_read(&self) -> PortResult<Option<LastReadMarker>>;
    async fn save_last_read(&self, marker: &LastReadMarker) -> PortResult<()>;
}
