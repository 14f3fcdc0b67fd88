//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the UI shell and the API server for
//! the study session, plus the view records shared with the REST endpoints.

use chrono::{DateTime, Utc};
use quran_study_core::{
    playback::PlaybackEffect,
    prompts::StudyTool,
    quiz::{QuizPhase, QuizSnapshot},
    recitation::MatchVerdict,
    Chapter, ChapterContent, LastReadMarker, Prostration, Verse,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Messages Sent FROM the Client (UI shell) TO the Server
//=========================================================================================
// NOTE: Recitation audio is sent as raw Binary frames (PCM16 mono), not as part of this
// enum. Frames are only kept between `start_recitation` and `stop_recitation`.
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Fetches the chapter list again (the retry action after a failure).
    LoadChapters,

    /// Filters the chapter list for the sidebar search.
    SearchChapters { query: String },

    /// Opens a chapter. Stops playback and clears the target verse.
    SelectChapter { chapter_id: u32 },

    /// Makes a verse the target. While audio is playing, playback follows it.
    SelectVerse { verse_id: u32 },

    TogglePlay { verse_id: u32 },

    /// The shell's player reached the end of the current verse.
    AudioEnded,

    /// The shell's player refused to play.
    PlaybackFailed,

    ShowCommentary { verse_id: u32 },

    /// Runs a study tool. Verse tools act on `verse_id`, or on the target verse when
    /// omitted. `question` is only read by the `question` tool.
    RunTool {
        tool: StudyToolKind,
        #[serde(default)]
        verse_id: Option<u32>,
        #[serde(default)]
        question: Option<String>,
    },

    AnswerQuiz { option: usize },
    NextQuestion,

    /// Closes the AI panel. Responses still in flight are dropped.
    CloseStudyPanel,

    StartRecitation,
    StopRecitation,
    CancelRecitation,

    /// A transcript recognised on the device, checked against the target verse.
    SubmitTranscript { transcript: String },

    CopyVerse { verse_id: u32 },
}

/// The study tools as named on the wire.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StudyToolKind {
    Reflection,
    RecitationRules,
    Vocabulary,
    Supplication,
    ActionSteps,
    Grammar,
    HistoricalContext,
    SimilarVerses,
    ChildFriendly,
    ChapterSummary,
    Question,
    Quiz,
}

impl StudyToolKind {
    pub fn into_tool(self, question: Option<String>) -> StudyTool {
        match self {
            StudyToolKind::Reflection => StudyTool::Reflection,
            StudyToolKind::RecitationRules => StudyTool::RecitationRules,
            StudyToolKind::Vocabulary => StudyTool::Vocabulary,
            StudyToolKind::Supplication => StudyTool::Supplication,
            StudyToolKind::ActionSteps => StudyTool::ActionSteps,
            StudyToolKind::Grammar => StudyTool::Grammar,
            StudyToolKind::HistoricalContext => StudyTool::HistoricalContext,
            StudyToolKind::SimilarVerses => StudyTool::SimilarVerses,
            StudyToolKind::ChildFriendly => StudyTool::ChildFriendly,
            StudyToolKind::ChapterSummary => StudyTool::ChapterSummary,
            StudyToolKind::Question => StudyTool::Question(question.unwrap_or_default()),
            StudyToolKind::Quiz => StudyTool::Quiz,
        }
    }
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (UI shell)
//=========================================================================================
// NOTE: The server never streams audio. Playback messages tell the shell's single
// audio output what to do with the verse's audio locator.
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent once after the connection opens.
    SessionReady {
        connection_id: Uuid,
        speech_available: bool,
        last_read: Option<LastReadView>,
    },

    Chapters { chapters: Vec<ChapterView> },
    /// The chapter list could not be fetched. The shell offers a retry.
    ChaptersUnavailable { message: String },
    SearchResults { chapter_ids: Vec<u32> },

    ChapterLoading { chapter_id: u32 },
    ChapterLoaded { content: ChapterContentView },
    /// Transient notice. The previously open chapter stays open.
    ChapterLoadFailed { message: String },
    LastRead { marker: LastReadView },

    VerseSelected { verse_id: Option<u32> },

    /// Load `reload_url` first when present, then play from the start.
    PlayVerse { verse_id: u32, reload_url: Option<String> },
    PauseAudio,
    AudioStopped,

    CommentaryLoading { verse_id: u32 },
    Commentary { verse_id: u32, text: String },

    StudyLoading { title: String },
    StudyText { title: String, body: String },
    StudyConfigurationError { title: String, message: String },
    StudyFailed { title: String, message: String },
    StudyClosed,

    Quiz { title: String, state: QuizView },

    RecitationListening,
    RecitationTranscribing,
    RecitationResult {
        verse_id: u32,
        transcript: String,
        verdict: VerdictView,
        feedback: String,
    },
    RecitationFailed { message: String },
    SpeechUnavailable { message: String },

    Clipboard { text: String },

    /// Reports a request the server could not act on.
    Error { message: String },
}

impl From<PlaybackEffect> for ServerMessage {
    fn from(effect: PlaybackEffect) -> Self {
        match effect {
            PlaybackEffect::Play { verse, reload } => ServerMessage::PlayVerse {
                verse_id: verse.global_id,
                reload_url: reload,
            },
            PlaybackEffect::Pause => ServerMessage::PauseAudio,
            PlaybackEffect::Stopped => ServerMessage::AudioStopped,
        }
    }
}

//=========================================================================================
// View Records (shared with REST)
//=========================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct ChapterView {
    pub id: u32,
    pub name: String,
    pub transliterated_name: String,
    pub translation: String,
    pub verse_count: u32,
    /// Localized revelation label.
    pub revelation: String,
    pub shows_invocation_header: bool,
}

impl From<&Chapter> for ChapterView {
    fn from(chapter: &Chapter) -> Self {
        Self {
            id: chapter.id,
            name: chapter.name.clone(),
            transliterated_name: chapter.transliterated_name.clone(),
            translation: chapter.translation.clone(),
            verse_count: chapter.verse_count,
            revelation: chapter.revelation.label().to_string(),
            shows_invocation_header: chapter.shows_invocation_header(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct ProstrationView {
    pub id: u32,
    pub obligatory: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct VerseView {
    /// Global verse number, unique across the whole text.
    pub id: u32,
    pub number_in_chapter: u32,
    pub text: String,
    /// The text without the leading invocation phrase.
    pub display_text: String,
    pub juz: u32,
    pub hizb: u32,
    pub hizb_quarter: u32,
    pub manzil: u32,
    pub page: u32,
    pub ruku: u32,
    pub prostration: Option<ProstrationView>,
    pub audio_url: String,
}

impl From<&Verse> for VerseView {
    fn from(verse: &Verse) -> Self {
        let prostration = match verse.prostration {
            Prostration::None => None,
            Prostration::Recommended { id } => Some(ProstrationView { id, obligatory: false }),
            Prostration::Obligatory { id } => Some(ProstrationView { id, obligatory: true }),
        };
        Self {
            id: verse.global_id,
            number_in_chapter: verse.number_in_chapter,
            text: verse.text.clone(),
            display_text: verse.display_text().to_string(),
            juz: verse.divisions.juz,
            hizb: verse.hizb(),
            hizb_quarter: verse.divisions.hizb_quarter,
            manzil: verse.divisions.manzil,
            page: verse.divisions.page,
            ruku: verse.divisions.ruku,
            prostration,
            audio_url: verse.audio_url.clone(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct ChapterContentView {
    pub chapter: ChapterView,
    pub verses: Vec<VerseView>,
}

impl From<&ChapterContent> for ChapterContentView {
    fn from(content: &ChapterContent) -> Self {
        Self {
            chapter: ChapterView::from(&content.chapter),
            verses: content.verses.iter().map(VerseView::from).collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, ToSchema)]
pub struct LastReadView {
    pub chapter_id: u32,
    pub chapter_name: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&LastReadMarker> for LastReadView {
    fn from(marker: &LastReadMarker) -> Self {
        Self {
            chapter_id: marker.chapter_id,
            chapter_name: marker.chapter_name.clone(),
            timestamp: marker.timestamp,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VerdictView {
    Correct,
    Partial,
    Incorrect,
}

impl From<MatchVerdict> for VerdictView {
    fn from(verdict: MatchVerdict) -> Self {
        match verdict {
            MatchVerdict::Correct => VerdictView::Correct,
            MatchVerdict::Partial => VerdictView::Partial,
            MatchVerdict::Incorrect => VerdictView::Incorrect,
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuizPhaseView {
    Loading,
    Failed,
    InProgress,
    Finished,
}

/// Everything the shell needs to render the quiz panel.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct QuizView {
    pub phase: QuizPhaseView,
    pub index: Option<usize>,
    pub question: Option<String>,
    pub options: Vec<String>,
    pub selected_option: Option<usize>,
    /// Revealed only once the current question is answered.
    pub correct_index: Option<usize>,
    pub score: usize,
    pub answered: usize,
    pub total: usize,
}

impl From<QuizSnapshot> for QuizView {
    fn from(snapshot: QuizSnapshot) -> Self {
        let (phase, index, revealed) = match snapshot.phase {
            QuizPhase::Loading => (QuizPhaseView::Loading, None, false),
            QuizPhase::Failed => (QuizPhaseView::Failed, None, false),
            QuizPhase::InProgress { index, answered } => {
                (QuizPhaseView::InProgress, Some(index), answered)
            }
            QuizPhase::Finished => (QuizPhaseView::Finished, None, false),
        };
        let (question, options, correct_index) = match snapshot.question {
            Some(q) => (
                Some(q.question),
                q.options,
                revealed.then_some(q.correct_index),
            ),
            None => (None, Vec::new(), None),
        };
        Self {
            phase,
            index,
            question,
            options,
            selected_option: snapshot.selected_option,
            correct_index,
            score: snapshot.score,
            answered: snapshot.answered,
            total: snapshot.total,
        }
    }
}
