//! services/api/src/web/state.rs
//!
//! Defines the application's shared and session-specific states.

use crate::config::Config;
use quran_study_core::{
    capture::{CaptureSession, SpeechAvailability},
    orchestrator::AiOrchestrator,
    playback::PlaybackController,
    preferences::SessionPreferences,
    quiz::QuizSession,
    slots::{RequestSlots, Slot, Ticket},
    Chapter, ChapterContent, ContentService, SpeechToTextService, Verse,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub content: Arc<dyn ContentService>,
    pub study: AiOrchestrator,
    pub speech: Arc<dyn SpeechToTextService>,
    pub speech_availability: SpeechAvailability,
    /// The single device-local last-read marker.
    pub preferences: Arc<Mutex<SessionPreferences>>,
}

//=========================================================================================
// SessionState (Specific to One WebSocket Connection)
//=========================================================================================

/// The quiz panel: the state machine plus the title it was opened with.
pub struct OpenQuiz {
    pub title: String,
    pub session: QuizSession,
}

/// The state for a single, active WebSocket connection.
pub struct SessionState {
    pub connection_id: Uuid,
    pub chapters: Vec<Chapter>,
    pub content: Option<ChapterContent>,
    /// Owns the target verse and the playing flag.
    pub playback: PlaybackController,
    pub quiz: Option<OpenQuiz>,
    pub capture: CaptureSession,
    slots: RequestSlots,
    /// Cancels the in-flight task of each slot when it is superseded.
    tokens: HashMap<Slot, CancellationToken>,
}

impl SessionState {
    pub fn new(speech_availability: SpeechAvailability) -> Self {
        Self {
            connection_id: Uuid::new_v4(),
            chapters: Vec::new(),
            content: None,
            playback: PlaybackController::new(),
            quiz: None,
            capture: CaptureSession::new(speech_availability),
            slots: RequestSlots::new(),
            tokens: HashMap::new(),
        }
    }

    /// Starts a request for `slot`, cancelling whatever was in flight there.
    pub fn begin(&mut self, slot: Slot) -> (Ticket, CancellationToken) {
        let token = CancellationToken::new();
        if let Some(previous) = self.tokens.insert(slot, token.clone()) {
            previous.cancel();
        }
        (self.slots.issue(slot), token)
    }

    /// Drops any in-flight request for `slot` without starting a new one.
    pub fn abandon(&mut self, slot: Slot) {
        if let Some(previous) = self.tokens.remove(&slot) {
            previous.cancel();
        }
        self.slots.invalidate(slot);
    }

    /// Whether a response carrying `ticket` may still be applied.
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.slots.is_current(ticket)
    }

    /// Cancels every in-flight request. Called when the connection closes.
    pub fn cancel_all(&mut self) {
        for (_, token) in self.tokens.drain() {
            token.cancel();
        }
    }

    pub fn chapter(&self) -> Option<&Chapter> {
        self.content.as_ref().map(|c| &c.chapter)
    }

    /// Resolves a verse of the open chapter by its global id.
    pub fn verse(&self, verse_id: u32) -> Option<&Verse> {
        self.content.as_ref().and_then(|c| c.verse(verse_id))
    }

    /// The verse the study tools and recitation check act on.
    pub fn target_verse(&self) -> Option<&Verse> {
        self.playback.active()
    }
}
