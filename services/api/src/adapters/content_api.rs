//! services/api/src/adapters/content_api.rs
//!
//! This module contains the adapter for the public Quran content API.
//! It implements the `ContentService` port from the `core` crate with one plain
//! request per call: no retries and no timeout beyond the transport's own.

use async_trait::async_trait;
use quran_study_core::domain::{
    Chapter, ChapterContent, Commentary, PartDivisions, Prostration, Revelation, Verse,
};
use quran_study_core::ports::{ContentService, PortError, PortResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ContentService` over HTTP.
#[derive(Clone)]
pub struct QuranContentAdapter {
    http: reqwest::Client,
    base_url: String,
    recitation_edition: String,
    commentary_edition: String,
}

impl QuranContentAdapter {
    /// Creates a new `QuranContentAdapter`.
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        recitation_edition: impl Into<String>,
        commentary_edition: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            recitation_edition: recitation_edition.into(),
            commentary_edition: commentary_edition.into(),
        }
    }

    /// Issues a GET and unwraps the `{ code, status, data }` envelope.
    async fn get_data<T: DeserializeOwned>(&self, path: &str) -> PortResult<T> {
        let endpoint = format!("{}{}", self.base_url, path);
        debug!("GET {}", endpoint);

        let response = self
            .http
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| PortError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Content API returned {} for {}", status, endpoint);
            return Err(PortError::Http {
                status: status.as_u16(),
                endpoint,
            });
        }

        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| PortError::Malformed(format!("{}: {}", endpoint, e)))?;

        match envelope {
            Envelope { code: 200, data: Some(data), .. } => Ok(data),
            Envelope { code, status, .. } => Err(PortError::Malformed(format!(
                "{}: envelope code {} ({})",
                endpoint,
                code,
                status.unwrap_or_default()
            ))),
        }
    }
}

//=========================================================================================
// "Impure" Wire Record Structs
//=========================================================================================

#[derive(Deserialize)]
struct Envelope<T> {
    code: u16,
    status: Option<String>,
    data: Option<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SurahRecord {
    number: u32,
    name: String,
    english_name: String,
    english_name_translation: String,
    number_of_ayahs: u32,
    revelation_type: String,
}
impl SurahRecord {
    fn to_domain(self) -> Chapter {
        let revelation = if self.revelation_type.eq_ignore_ascii_case("medinan") {
            Revelation::Medinan
        } else {
            Revelation::Meccan
        };
        Chapter {
            id: self.number,
            name: self.name,
            transliterated_name: self.english_name,
            translation: self.english_name_translation,
            verse_count: self.number_of_ayahs,
            revelation,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SajdaRecord {
    Flag(bool),
    Detail {
        id: u32,
        #[serde(default)]
        recommended: bool,
        #[serde(default)]
        obligatory: bool,
    },
}
impl SajdaRecord {
    fn to_domain(self) -> Prostration {
        match self {
            SajdaRecord::Flag(_) => Prostration::None,
            SajdaRecord::Detail { id, obligatory: true, .. } => Prostration::Obligatory { id },
            SajdaRecord::Detail { id, recommended: true, .. } => Prostration::Recommended { id },
            SajdaRecord::Detail { .. } => Prostration::None,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AyahRecord {
    number: u32,
    text: String,
    number_in_surah: u32,
    juz: u32,
    manzil: u32,
    page: u32,
    ruku: u32,
    hizb_quarter: u32,
    sajda: SajdaRecord,
    #[serde(default)]
    audio: Option<String>,
}
impl AyahRecord {
    fn to_domain(self) -> Verse {
        Verse {
            global_id: self.number,
            text: self.text,
            number_in_chapter: self.number_in_surah,
            divisions: PartDivisions {
                juz: self.juz,
                manzil: self.manzil,
                page: self.page,
                ruku: self.ruku,
                hizb_quarter: self.hizb_quarter,
            },
            prostration: self.sajda.to_domain(),
            audio_url: self.audio.unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
struct SurahDetailRecord {
    #[serde(flatten)]
    surah: SurahRecord,
    ayahs: Vec<AyahRecord>,
}

#[derive(Deserialize)]
struct CommentaryRecord {
    text: String,
}

//=========================================================================================
// `ContentService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ContentService for QuranContentAdapter {
    async fn list_chapters(&self) -> PortResult<Vec<Chapter>> {
        let records: Vec<SurahRecord> = self.get_data("/surah").await?;
        if records.is_empty() {
            return Err(PortError::Malformed("chapter list is empty".to_string()));
        }
        Ok(records.into_iter().map(SurahRecord::to_domain).collect())
    }

    async fn chapter_content(&self, chapter_id: u32) -> PortResult<ChapterContent> {
        let path = format!("/surah/{}/{}", chapter_id, self.recitation_edition);
        let record: SurahDetailRecord = self.get_data(&path).await?;
        Ok(ChapterContent {
            chapter: record.surah.to_domain(),
            verses: record.ayahs.into_iter().map(AyahRecord::to_domain).collect(),
        })
    }

    async fn commentary(&self, chapter_id: u32, verse_in_chapter: u32) -> PortResult<Commentary> {
        let path = format!(
            "/ayah/{}:{}/{}",
            chapter_id, verse_in_chapter, self.commentary_edition
        );
        let record: CommentaryRecord = self.get_data(&path).await?;
        if record.text.trim().is_empty() {
            return Err(PortError::Malformed(format!("{}: empty commentary", path)));
        }
        Ok(Commentary { text: record.text })
    }
}
