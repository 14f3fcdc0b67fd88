//! Shared fixtures for the `api` integration tests: in-process HTTP servers, fake
//! ports and a ready-made `AppState`.

#![allow(dead_code)]

use api_lib::{adapters::JsonFilePreferences, config::Config, web::state::AppState};
use async_trait::async_trait;
use axum::Router;
use quran_study_core::{
    capture::SpeechAvailability,
    orchestrator::AiOrchestrator,
    preferences::SessionPreferences,
    Chapter, ChapterContent, Commentary, ContentService, PartDivisions, PortError, PortResult,
    Prostration, ResponseMode, Revelation, SpeechToTextService, TextGenerationService, Verse,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A fresh, not-yet-created directory under the system temp dir.
pub fn temp_dir() -> PathBuf {
    std::env::temp_dir().join(format!("quran-study-test-{}", uuid::Uuid::new_v4()))
}

pub fn chapter(id: u32, name: &str) -> Chapter {
    Chapter {
        id,
        name: name.to_string(),
        transliterated_name: format!("Chapter-{}", id),
        translation: format!("Translation {}", id),
        verse_count: 3,
        revelation: Revelation::Meccan,
    }
}

pub fn verse(global_id: u32, number_in_chapter: u32, text: &str) -> Verse {
    Verse {
        global_id,
        text: text.to_string(),
        number_in_chapter,
        divisions: PartDivisions {
            juz: 1,
            manzil: 1,
            page: 1,
            ruku: 1,
            hizb_quarter: 1,
        },
        prostration: Prostration::None,
        audio_url: format!("https://cdn.example/audio/{}.mp3", global_id),
    }
}

/// Chapter 1 with three verses, global ids 1 to 3.
pub fn opening_chapter() -> ChapterContent {
    ChapterContent {
        chapter: chapter(1, "الفاتحة"),
        verses: vec![
            verse(1, 1, "بسم الله الرحمن الرحيم"),
            verse(2, 2, "الحمد لله رب العالمين"),
            verse(3, 3, "الرحمن الرحيم"),
        ],
    }
}

/// Content served from memory. Commentary for verse 1 is slow, so a later request
/// can overtake it.
pub struct FakeContent {
    pub chapters: Vec<Chapter>,
    pub content: ChapterContent,
    pub fail_list: bool,
}

impl Default for FakeContent {
    fn default() -> Self {
        Self {
            chapters: vec![chapter(1, "الفاتحة"), chapter(2, "البقرة"), chapter(36, "يس")],
            content: opening_chapter(),
            fail_list: false,
        }
    }
}

#[async_trait]
impl ContentService for FakeContent {
    async fn list_chapters(&self) -> PortResult<Vec<Chapter>> {
        if self.fail_list {
            return Err(PortError::Network("offline".to_string()));
        }
        Ok(self.chapters.clone())
    }

    async fn chapter_content(&self, chapter_id: u32) -> PortResult<ChapterContent> {
        if chapter_id == self.content.chapter.id {
            Ok(self.content.clone())
        } else {
            Err(PortError::NotFound(format!("chapter {}", chapter_id)))
        }
    }

    async fn commentary(&self, chapter_id: u32, verse_in_chapter: u32) -> PortResult<Commentary> {
        if verse_in_chapter == 1 {
            tokio::time::sleep(Duration::from_millis(300)).await;
        }
        Ok(Commentary {
            text: format!("تفسير {}:{}", chapter_id, verse_in_chapter),
        })
    }
}

/// A backend with a credential that answers from fixed strings.
pub struct FakeBackend {
    pub credential: bool,
    pub quiz_json: String,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            credential: true,
            quiz_json: r#"{"questions":[
                {"question":"س1","options":["أ","ب"],"correctIndex":1},
                {"question":"س2","options":["ج","د","هـ"],"correctIndex":0}
            ]}"#
                .to_string(),
        }
    }
}

#[async_trait]
impl TextGenerationService for FakeBackend {
    fn has_credential(&self) -> bool {
        self.credential
    }

    async fn generate(&self, _prompt: &str, mode: ResponseMode) -> PortResult<String> {
        match mode {
            ResponseMode::Json => Ok(self.quiz_json.clone()),
            ResponseMode::Text => Ok("نص مولد".to_string()),
        }
    }
}

/// Always hears the same transcript, after `delay`.
pub struct FakeSpeech {
    pub transcript: String,
    pub delay: Duration,
}

#[async_trait]
impl SpeechToTextService for FakeSpeech {
    async fn transcribe_audio(&self, _audio_data: &[u8]) -> PortResult<String> {
        tokio::time::sleep(self.delay).await;
        Ok(self.transcript.clone())
    }
}

pub struct StateBuilder {
    pub content: FakeContent,
    pub backend: FakeBackend,
    pub speech: Option<String>,
    pub speech_delay: Duration,
    pub data_dir: PathBuf,
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self {
            content: FakeContent::default(),
            backend: FakeBackend::default(),
            speech: None,
            speech_delay: Duration::ZERO,
            data_dir: temp_dir(),
        }
    }
}

impl StateBuilder {
    pub fn build(self) -> Arc<AppState> {
        let (speech, speech_availability): (Arc<dyn SpeechToTextService>, SpeechAvailability) =
            match self.speech {
                Some(transcript) => (
                    Arc::new(FakeSpeech {
                        transcript,
                        delay: self.speech_delay,
                    }),
                    SpeechAvailability::Available,
                ),
                None => (
                    Arc::new(api_lib::adapters::SpeechUnavailable),
                    SpeechAvailability::Unavailable,
                ),
            };
        let store = Arc::new(JsonFilePreferences::new(self.data_dir.clone()));
        Arc::new(AppState {
            config: Arc::new(Config {
                data_dir: self.data_dir,
                ..Config::default()
            }),
            content: Arc::new(self.content),
            study: AiOrchestrator::new(Arc::new(self.backend)),
            speech,
            speech_availability,
            preferences: Arc::new(Mutex::new(SessionPreferences::new(store))),
        })
    }
}
