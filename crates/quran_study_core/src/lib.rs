pub mod capture;
pub mod domain;
pub mod normalize;
pub mod orchestrator;
pub mod playback;
pub mod ports;
pub mod preferences;
pub mod prompts;
pub mod quiz;
pub mod recitation;
pub mod slots;

pub use domain::{
    filter_chapters, Chapter, ChapterContent, Commentary, LastReadMarker, PartDivisions,
    Prostration, QuizQuestion, Revelation, Verse,
};
pub use ports::{
    ContentService, PortError, PortResult, PreferencesStore, ResponseMode,
    SpeechToTextService, TextGenerationService,
};
