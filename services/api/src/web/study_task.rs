//! services/api/src/web/study_task.rs
//!
//! This module contains the asynchronous "worker" functions spawned by the WebSocket
//! handler. Each one performs a single network round trip, then re-acquires the
//! session lock only to apply its result, and only while its ticket is current.

use crate::web::{
    protocol::{ChapterContentView, ChapterView, LastReadView, QuizView, ServerMessage},
    state::{AppState, SessionState},
};
use axum::extract::ws::Message;
use futures::{Sink, SinkExt};
use quran_study_core::{
    capture::{RECOGNITION_FAILED_MESSAGE, SPEECH_UNAVAILABLE_MESSAGE},
    orchestrator::AiOutcome,
    prompts::StudyTool,
    recitation::match_recitation,
    slots::{Slot, Ticket},
    Chapter, PortError, PortResult, Verse,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub const CHAPTERS_UNAVAILABLE_MESSAGE: &str =
    "عذراً، تعذر جلب بيانات السور. يرجى التحقق من اتصال الإنترنت والمحاولة مرة أخرى.";
pub const CHAPTER_LOAD_FAILED_MESSAGE: &str = "حدث خطأ أثناء تحميل السورة. يرجى المحاولة لاحقاً.";
pub const COMMENTARY_FAILED_MESSAGE: &str = "عذراً، حدث خطأ أثناء جلب التفسير.";

/// The outbound half of a connection, shared between the handler and its workers.
pub type SharedSink<S> = Arc<Mutex<S>>;

/// Serializes and sends one message to the client.
pub async fn send_message<S>(ws_sender: &Mutex<S>, message: &ServerMessage) -> PortResult<()>
where
    S: Sink<Message> + Unpin,
{
    let json = serde_json::to_string(message).map_err(|e| PortError::Unexpected(e.to_string()))?;
    ws_sender
        .lock()
        .await
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| PortError::Unexpected("Failed to send message to client.".to_string()))
}

/// Fetches the chapter list. A failure leaves the list empty and offers a retry.
pub async fn chapters_process<S>(
    app_state: Arc<AppState>,
    session_state_lock: Arc<Mutex<SessionState>>,
    ws_sender: SharedSink<S>,
) -> PortResult<()>
where
    S: Sink<Message> + Unpin + Send,
{
    let message = match app_state.content.list_chapters().await {
        Ok(chapters) => {
            info!("Loaded {} chapters.", chapters.len());
            let views = chapters.iter().map(ChapterView::from).collect();
            session_state_lock.lock().await.chapters = chapters;
            ServerMessage::Chapters { chapters: views }
        }
        Err(e) => {
            error!("Failed to load the chapter list: {}", e);
            ServerMessage::ChaptersUnavailable {
                message: CHAPTERS_UNAVAILABLE_MESSAGE.to_string(),
            }
        }
    };
    send_message(&ws_sender, &message).await
}

/// Opens a chapter and records it as the last-read position.
pub async fn chapter_process<S>(
    app_state: Arc<AppState>,
    session_state_lock: Arc<Mutex<SessionState>>,
    ws_sender: SharedSink<S>,
    ticket: Ticket,
    cancellation_token: CancellationToken,
    chapter_id: u32,
) -> PortResult<()>
where
    S: Sink<Message> + Unpin + Send,
{
    let result = tokio::select! {
        _ = cancellation_token.cancelled() => {
            debug!("Chapter {} load superseded.", chapter_id);
            return Ok(());
        }
        result = app_state.content.chapter_content(chapter_id) => result,
    };

    let content = match result {
        Ok(content) => content,
        Err(e) => {
            error!("Failed to load chapter {}: {}", chapter_id, e);
            if !session_state_lock.lock().await.is_current(ticket) {
                return Ok(());
            }
            let failed = ServerMessage::ChapterLoadFailed {
                message: CHAPTER_LOAD_FAILED_MESSAGE.to_string(),
            };
            return send_message(&ws_sender, &failed).await;
        }
    };

    let (effect, view, chapter) = {
        let mut session = session_state_lock.lock().await;
        if !session.is_current(ticket) {
            return Ok(());
        }
        let effect = session.playback.load_chapter(content.verses.clone());
        let view = ChapterContentView::from(&content);
        let chapter = content.chapter.clone();
        session.content = Some(content);
        session.abandon(Slot::Commentary);
        session.abandon(Slot::Recitation);
        session.capture.cancel();
        (effect, view, chapter)
    };

    send_message(&ws_sender, &ServerMessage::from(effect)).await?;
    send_message(&ws_sender, &ServerMessage::ChapterLoaded { content: view }).await?;
    send_message(&ws_sender, &ServerMessage::VerseSelected { verse_id: None }).await?;

    record_last_read(&app_state, &ws_sender, &chapter).await
}

async fn record_last_read<S>(
    app_state: &AppState,
    ws_sender: &Mutex<S>,
    chapter: &Chapter,
) -> PortResult<()>
where
    S: Sink<Message> + Unpin,
{
    let recorded = app_state
        .preferences
        .lock()
        .await
        .record_last_read(chapter)
        .await;
    match recorded {
        Ok(marker) => {
            let message = ServerMessage::LastRead {
                marker: LastReadView::from(&marker),
            };
            send_message(ws_sender, &message).await
        }
        Err(e) => {
            // Reading continues without a persisted marker.
            warn!("Failed to persist the last-read marker: {}", e);
            Ok(())
        }
    }
}

/// Fetches the commentary of one verse. Failures become a localized apology.
pub async fn commentary_process<S>(
    app_state: Arc<AppState>,
    session_state_lock: Arc<Mutex<SessionState>>,
    ws_sender: SharedSink<S>,
    ticket: Ticket,
    cancellation_token: CancellationToken,
    chapter_id: u32,
    verse: Verse,
) -> PortResult<()>
where
    S: Sink<Message> + Unpin + Send,
{
    let result = tokio::select! {
        _ = cancellation_token.cancelled() => return Ok(()),
        result = app_state.content.commentary(chapter_id, verse.number_in_chapter) => result,
    };

    let text = match result {
        Ok(commentary) => commentary.text,
        Err(e) => {
            warn!(
                "Commentary for {}:{} failed: {}",
                chapter_id, verse.number_in_chapter, e
            );
            COMMENTARY_FAILED_MESSAGE.to_string()
        }
    };

    if !session_state_lock.lock().await.is_current(ticket) {
        debug!("Dropping stale commentary for verse {}.", verse.global_id);
        return Ok(());
    }
    let message = ServerMessage::Commentary {
        verse_id: verse.global_id,
        text,
    };
    send_message(&ws_sender, &message).await
}

/// Runs one study tool through the orchestrator and applies its outcome to the
/// AI panel, or to the quiz when the tool is the quiz.
pub async fn study_process<S>(
    app_state: Arc<AppState>,
    session_state_lock: Arc<Mutex<SessionState>>,
    ws_sender: SharedSink<S>,
    ticket: Ticket,
    cancellation_token: CancellationToken,
    tool: StudyTool,
    chapter: Chapter,
    verse: Option<Verse>,
) -> PortResult<()>
where
    S: Sink<Message> + Unpin + Send,
{
    let outcome = tokio::select! {
        _ = cancellation_token.cancelled() => return Ok(()),
        outcome = app_state.study.run(&tool, &chapter, verse.as_ref()) => outcome,
    };
    let Some(outcome) = outcome else {
        return Ok(());
    };

    let message = {
        let mut session = session_state_lock.lock().await;
        if !session.is_current(ticket) {
            debug!("Dropping stale study outcome '{}'.", outcome.title());
            return Ok(());
        }
        match outcome {
            AiOutcome::Quiz { title, questions } => {
                if questions.is_empty() {
                    warn!("Quiz generation produced no usable questions.");
                }
                match session.quiz.as_mut() {
                    Some(quiz) => {
                        quiz.session.deliver(questions);
                        ServerMessage::Quiz {
                            title,
                            state: QuizView::from(quiz.session.snapshot()),
                        }
                    }
                    None => return Ok(()),
                }
            }
            AiOutcome::Text { title, body } => ServerMessage::StudyText { title, body },
            AiOutcome::ConfigurationError { title, message } => {
                if let Some(quiz) = session.quiz.as_mut() {
                    quiz.session.deliver(Vec::new());
                }
                ServerMessage::StudyConfigurationError { title, message }
            }
            AiOutcome::Failed { title, message } => ServerMessage::StudyFailed { title, message },
        }
    };
    send_message(&ws_sender, &message).await
}

/// Transcribes one captured utterance and checks it against `verse`.
pub async fn recitation_process<S>(
    app_state: Arc<AppState>,
    session_state_lock: Arc<Mutex<SessionState>>,
    ws_sender: SharedSink<S>,
    ticket: Ticket,
    cancellation_token: CancellationToken,
    audio: Vec<u8>,
    verse: Verse,
) -> PortResult<()>
where
    S: Sink<Message> + Unpin + Send,
{
    let result = tokio::select! {
        _ = cancellation_token.cancelled() => return Ok(()),
        result = app_state.speech.transcribe_audio(&audio) => result,
    };

    {
        let mut session = session_state_lock.lock().await;
        if !session.is_current(ticket) {
            return Ok(());
        }
        session.capture.complete();
    }

    let message = match result {
        Ok(transcript) => {
            info!("Recitation transcript: '{}'", transcript);
            recitation_result(&verse, transcript)
        }
        Err(PortError::Unavailable(_)) => ServerMessage::SpeechUnavailable {
            message: SPEECH_UNAVAILABLE_MESSAGE.to_string(),
        },
        Err(e) => {
            error!("Transcription failed: {}", e);
            ServerMessage::RecitationFailed {
                message: RECOGNITION_FAILED_MESSAGE.to_string(),
            }
        }
    };
    send_message(&ws_sender, &message).await
}

/// Grades a transcript against a verse.
pub fn recitation_result(verse: &Verse, transcript: String) -> ServerMessage {
    let verdict = match_recitation(&verse.text, &transcript);
    ServerMessage::RecitationResult {
        verse_id: verse.global_id,
        transcript,
        verdict: verdict.into(),
        feedback: verdict.feedback().to_string(),
    }
}
