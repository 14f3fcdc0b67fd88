pub mod content_api;
pub mod genai;
pub mod prefs_file;
pub mod sst;

pub use content_api::QuranContentAdapter;
pub use genai::GenAiStudyAdapter;
pub use prefs_file::JsonFilePreferences;
pub use sst::{SpeechUnavailable, WhisperRecitationAdapter};
