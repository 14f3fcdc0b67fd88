//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a WebSocket connection.
//! It applies the synchronous state transitions itself and delegates every network
//! round trip to a worker in `study_task`.

use crate::web::{
    protocol::{ClientMessage, LastReadView, QuizView, ServerMessage},
    state::{AppState, OpenQuiz, SessionState},
    study_task::{
        chapter_process, chapters_process, commentary_process, recitation_process,
        recitation_result, send_message, study_process, SharedSink,
    },
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{Sink, StreamExt};
use quran_study_core::{
    capture::{CaptureStart, SpeechAvailability, SPEECH_UNAVAILABLE_MESSAGE},
    filter_chapters,
    playback::PlaybackEffect,
    prompts::{build_prompt, StudyTool},
    quiz::{Advance, QuizSession, Selection},
    slots::Slot,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    // The sender is wrapped in an Arc<Mutex<>> to allow for shared mutable access across tasks.
    let (sender, mut receiver) = socket.split();
    let ws_sender = Arc::new(Mutex::new(sender));

    let session = SessionState::new(app_state.speech_availability);
    let connection_id = session.connection_id;
    info!("New WebSocket connection established: {}", connection_id);
    let session_state_lock = Arc::new(Mutex::new(session));

    // --- 1. Initialization Phase ---
    let last_read = app_state
        .preferences
        .lock()
        .await
        .last_read()
        .map(LastReadView::from);
    let ready = ServerMessage::SessionReady {
        connection_id,
        speech_available: app_state.speech_availability == SpeechAvailability::Available,
        last_read,
    };
    if send_message(&ws_sender, &ready).await.is_err() {
        error!("Failed to send SessionReady message.");
        return;
    }
    spawn_chapters(&app_state, &session_state_lock, &ws_sender);

    // --- 2. Main Message Loop ---
    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(text.as_str()) {
                Ok(client_msg) => {
                    handle_client_message(client_msg, &app_state, &session_state_lock, &ws_sender)
                        .await;
                }
                Err(e) => warn!("Failed to deserialize client message: {}", e),
            },
            Message::Binary(data) => {
                let mut session = session_state_lock.lock().await;
                if !session.capture.push_audio(&data) {
                    debug!("Dropped {} audio bytes: no capture is listening or it is full.", data.len());
                }
            }
            Message::Close(_) => {
                info!("Client sent close message.");
                break;
            }
            _ => {}
        }
    }

    // --- 3. Cleanup ---
    session_state_lock.lock().await.cancel_all();
    info!("WebSocket connection {} closed.", connection_id);
}

fn spawn_chapters<S>(
    app_state: &Arc<AppState>,
    session_state_lock: &Arc<Mutex<SessionState>>,
    ws_sender: &SharedSink<S>,
) where
    S: Sink<Message> + Unpin + Send + 'static,
{
    let app_state = app_state.clone();
    let session_state_lock = session_state_lock.clone();
    let ws_sender = ws_sender.clone();
    tokio::spawn(async move {
        if let Err(e) = chapters_process(app_state, session_state_lock, ws_sender).await {
            error!("Chapter list process failed: {:?}", e);
        }
    });
}

async fn reply<S>(ws_sender: &SharedSink<S>, message: ServerMessage)
where
    S: Sink<Message> + Unpin,
{
    if let Err(e) = send_message(ws_sender, &message).await {
        warn!("{}", e);
    }
}

async fn reply_playback<S>(ws_sender: &SharedSink<S>, verse_id: Option<u32>, effect: Option<PlaybackEffect>)
where
    S: Sink<Message> + Unpin,
{
    reply(ws_sender, ServerMessage::VerseSelected { verse_id }).await;
    if let Some(effect) = effect {
        reply(ws_sender, effect.into()).await;
    }
}

/// Applies one client message to the session.
pub async fn handle_client_message<S>(
    client_msg: ClientMessage,
    app_state: &Arc<AppState>,
    session_state_lock: &Arc<Mutex<SessionState>>,
    ws_sender: &SharedSink<S>,
) where
    S: Sink<Message> + Unpin + Send + 'static,
{
    match client_msg {
        ClientMessage::LoadChapters => {
            spawn_chapters(app_state, session_state_lock, ws_sender);
        }
        ClientMessage::SearchChapters { query } => {
            let chapter_ids: Vec<u32> = {
                let session = session_state_lock.lock().await;
                let matches = filter_chapters(&session.chapters, &query);
                matches.iter().map(|c| c.id).collect()
            };
            reply(ws_sender, ServerMessage::SearchResults { chapter_ids }).await;
        }
        ClientMessage::SelectChapter { chapter_id } => {
            info!("Opening chapter {}.", chapter_id);
            let (ticket, token) = session_state_lock.lock().await.begin(Slot::Chapter);
            reply(ws_sender, ServerMessage::ChapterLoading { chapter_id }).await;

            let app_state = app_state.clone();
            let session_state_lock = session_state_lock.clone();
            let ws_sender = ws_sender.clone();
            tokio::spawn(async move {
                if let Err(e) =
                    chapter_process(app_state, session_state_lock, ws_sender, ticket, token, chapter_id).await
                {
                    error!("Chapter process failed: {:?}", e);
                }
            });
        }
        ClientMessage::SelectVerse { verse_id } => {
            let effect = {
                let mut session = session_state_lock.lock().await;
                let Some(verse) = session.verse(verse_id).cloned() else {
                    drop(session);
                    return unknown_verse(ws_sender, verse_id).await;
                };
                session.playback.select(verse)
            };
            reply_playback(ws_sender, Some(verse_id), effect).await;
        }
        ClientMessage::TogglePlay { verse_id } => {
            let effect = {
                let mut session = session_state_lock.lock().await;
                let Some(verse) = session.verse(verse_id).cloned() else {
                    drop(session);
                    return unknown_verse(ws_sender, verse_id).await;
                };
                session.playback.toggle_play(verse)
            };
            reply_playback(ws_sender, Some(verse_id), Some(effect)).await;
        }
        ClientMessage::AudioEnded => {
            let (effect, target) = {
                let mut session = session_state_lock.lock().await;
                let effect = session.playback.on_audio_ended();
                (effect, session.playback.active().map(|v| v.global_id))
            };
            reply_playback(ws_sender, target, Some(effect)).await;
        }
        ClientMessage::PlaybackFailed => {
            let effect = session_state_lock.lock().await.playback.on_playback_failed();
            reply(ws_sender, effect.into()).await;
        }
        ClientMessage::ShowCommentary { verse_id } => {
            let prepared = {
                let mut session = session_state_lock.lock().await;
                let chapter_id = session.chapter().map(|c| c.id);
                let verse = session.verse(verse_id).cloned();
                match (chapter_id, verse) {
                    (Some(chapter_id), Some(verse)) => {
                        let (ticket, token) = session.begin(Slot::Commentary);
                        Some((ticket, token, chapter_id, verse))
                    }
                    _ => None,
                }
            };
            let Some((ticket, token, chapter_id, verse)) = prepared else {
                return unknown_verse(ws_sender, verse_id).await;
            };
            reply(ws_sender, ServerMessage::CommentaryLoading { verse_id }).await;

            let app_state = app_state.clone();
            let session_state_lock = session_state_lock.clone();
            let ws_sender = ws_sender.clone();
            tokio::spawn(async move {
                if let Err(e) = commentary_process(
                    app_state, session_state_lock, ws_sender, ticket, token, chapter_id, verse,
                )
                .await
                {
                    error!("Commentary process failed: {:?}", e);
                }
            });
        }
        ClientMessage::RunTool { tool, verse_id, question } => {
            let tool = tool.into_tool(question);
            let prepared = {
                let mut session = session_state_lock.lock().await;
                let Some(chapter) = session.chapter().cloned() else {
                    drop(session);
                    return reply(ws_sender, ServerMessage::Error {
                        message: "No chapter is open.".to_string(),
                    })
                    .await;
                };
                let verse = match verse_id {
                    Some(id) => {
                        let Some(verse) = session.verse(id).cloned() else {
                            drop(session);
                            return unknown_verse(ws_sender, id).await;
                        };
                        Some(verse)
                    }
                    None => session.target_verse().cloned(),
                };
                build_prompt(&tool, &chapter, verse.as_ref()).map(|prompt| {
                    let title = prompt.title;
                    let (ticket, token) = if tool == StudyTool::Quiz {
                        session.abandon(Slot::AiContent);
                        session.quiz = Some(OpenQuiz {
                            title: title.clone(),
                            session: QuizSession::loading(),
                        });
                        session.begin(Slot::Quiz)
                    } else {
                        session.abandon(Slot::Quiz);
                        session.quiz = None;
                        session.begin(Slot::AiContent)
                    };
                    (ticket, token, title, chapter, verse)
                })
            };
            let Some((ticket, token, title, chapter, verse)) = prepared else {
                debug!("Study tool {:?} had nothing to act on.", tool);
                return;
            };

            let loading = if tool == StudyTool::Quiz {
                ServerMessage::Quiz {
                    title,
                    state: QuizView::from(QuizSession::loading().snapshot()),
                }
            } else {
                ServerMessage::StudyLoading { title }
            };
            reply(ws_sender, loading).await;

            let app_state = app_state.clone();
            let session_state_lock = session_state_lock.clone();
            let ws_sender = ws_sender.clone();
            tokio::spawn(async move {
                if let Err(e) = study_process(
                    app_state, session_state_lock, ws_sender, ticket, token, tool, chapter, verse,
                )
                .await
                {
                    error!("Study process failed: {:?}", e);
                }
            });
        }
        ClientMessage::AnswerQuiz { option } => {
            let update = {
                let mut session = session_state_lock.lock().await;
                session.quiz.as_mut().and_then(|quiz| match quiz.session.select(option) {
                    Selection::Ignored => None,
                    Selection::Correct | Selection::Wrong { .. } => Some(ServerMessage::Quiz {
                        title: quiz.title.clone(),
                        state: QuizView::from(quiz.session.snapshot()),
                    }),
                })
            };
            if let Some(message) = update {
                reply(ws_sender, message).await;
            }
        }
        ClientMessage::NextQuestion => {
            let update = {
                let mut session = session_state_lock.lock().await;
                session.quiz.as_mut().and_then(|quiz| match quiz.session.next() {
                    Advance::Ignored => None,
                    Advance::Next { .. } | Advance::Finished { .. } => Some(ServerMessage::Quiz {
                        title: quiz.title.clone(),
                        state: QuizView::from(quiz.session.snapshot()),
                    }),
                })
            };
            if let Some(message) = update {
                reply(ws_sender, message).await;
            }
        }
        ClientMessage::CloseStudyPanel => {
            {
                let mut session = session_state_lock.lock().await;
                session.abandon(Slot::AiContent);
                session.abandon(Slot::Quiz);
                session.quiz = None;
            }
            reply(ws_sender, ServerMessage::StudyClosed).await;
        }
        ClientMessage::StartRecitation => {
            let started = {
                let mut session = session_state_lock.lock().await;
                let started = session.capture.start();
                if started != CaptureStart::Unavailable {
                    session.abandon(Slot::Recitation);
                }
                started
            };
            let message = match started {
                CaptureStart::Unavailable => ServerMessage::SpeechUnavailable {
                    message: SPEECH_UNAVAILABLE_MESSAGE.to_string(),
                },
                CaptureStart::Started | CaptureStart::Restarted => ServerMessage::RecitationListening,
            };
            reply(ws_sender, message).await;
        }
        ClientMessage::StopRecitation => {
            let prepared = {
                let mut session = session_state_lock.lock().await;
                let target = session.target_verse().cloned();
                match target {
                    Some(verse) => session.capture.finish().map(|audio| {
                        let (ticket, token) = session.begin(Slot::Recitation);
                        (ticket, token, audio, verse)
                    }),
                    None => {
                        session.capture.cancel();
                        None
                    }
                }
            };
            let Some((ticket, token, audio, verse)) = prepared else {
                debug!("Recitation stopped with nothing to check.");
                return;
            };
            reply(ws_sender, ServerMessage::RecitationTranscribing).await;

            let app_state = app_state.clone();
            let session_state_lock = session_state_lock.clone();
            let ws_sender = ws_sender.clone();
            tokio::spawn(async move {
                if let Err(e) = recitation_process(
                    app_state, session_state_lock, ws_sender, ticket, token, audio, verse,
                )
                .await
                {
                    error!("Recitation process failed: {:?}", e);
                }
            });
        }
        ClientMessage::CancelRecitation => {
            let mut session = session_state_lock.lock().await;
            session.capture.cancel();
            session.abandon(Slot::Recitation);
        }
        ClientMessage::SubmitTranscript { transcript } => {
            let target = session_state_lock.lock().await.target_verse().cloned();
            match target {
                Some(verse) => reply(ws_sender, recitation_result(&verse, transcript)).await,
                None => debug!("Transcript submitted without a target verse."),
            }
        }
        ClientMessage::CopyVerse { verse_id } => {
            let text = {
                let session = session_state_lock.lock().await;
                session
                    .chapter()
                    .zip(session.verse(verse_id))
                    .map(|(chapter, verse)| verse.clipboard_text(chapter))
            };
            match text {
                Some(text) => reply(ws_sender, ServerMessage::Clipboard { text }).await,
                None => unknown_verse(ws_sender, verse_id).await,
            }
        }
    }
}

async fn unknown_verse<S>(ws_sender: &SharedSink<S>, verse_id: u32)
where
    S: Sink<Message> + Unpin,
{
    warn!("Verse {} is not part of the open chapter.", verse_id);
    reply(ws_sender, ServerMessage::Error {
        message: format!("Verse {} is not part of the open chapter.", verse_id),
    })
    .await;
}
