//! crates/quran_study_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any wire or storage format; adapters keep their
//! own records and convert into these.

use chrono::{DateTime, Utc};

/// The invocation phrase embedded at the start of the first verse of most chapters.
pub const INVOCATION: &str = "بِسْمِ ٱللَّهِ ٱلرَّحْمَٰنِ ٱلرَّحِيمِ";

/// Where a chapter was revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Revelation {
    Meccan,
    Medinan,
}

impl Revelation {
    /// Localized label shown next to the chapter title.
    pub fn label(self) -> &'static str {
        match self {
            Revelation::Meccan => "مكية",
            Revelation::Medinan => "مدنية",
        }
    }
}

/// One of the top-level divisions of the text (sura). Identified by a 1-based id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub id: u32,
    pub name: String,
    pub transliterated_name: String,
    pub translation: String,
    pub verse_count: u32,
    pub revelation: Revelation,
}

impl Chapter {
    /// Chapter 1 carries the invocation as its first verse and chapter 9 has none,
    /// so neither gets a separate header.
    pub fn shows_invocation_header(&self) -> bool {
        self.id != 1 && self.id != 9
    }

    fn matches(&self, query: &str) -> bool {
        let lowered = query.to_lowercase();
        self.name.contains(query)
            || self.transliterated_name.to_lowercase().contains(&lowered)
            || self.translation.to_lowercase().contains(&lowered)
            || query.parse::<u32>().map(|n| n == self.id).unwrap_or(false)
    }
}

/// Filters the chapter list for the sidebar search box. An empty query keeps everything.
pub fn filter_chapters<'a>(chapters: &'a [Chapter], query: &str) -> Vec<&'a Chapter> {
    let query = query.trim();
    if query.is_empty() {
        return chapters.iter().collect();
    }
    chapters.iter().filter(|c| c.matches(query)).collect()
}

/// Fixed liturgical subdivisions, used for progress display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PartDivisions {
    pub juz: u32,
    pub manzil: u32,
    pub page: u32,
    pub ruku: u32,
    pub hizb_quarter: u32,
}

/// Prostration marker of a verse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Prostration {
    #[default]
    None,
    Recommended { id: u32 },
    Obligatory { id: u32 },
}

/// An addressable line within a chapter (aya).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verse {
    /// Unique across the whole corpus.
    pub global_id: u32,
    pub text: String,
    pub number_in_chapter: u32,
    pub divisions: PartDivisions,
    pub prostration: Prostration,
    pub audio_url: String,
}

impl Verse {
    /// The hizb this verse falls into (four quarters per hizb).
    pub fn hizb(&self) -> u32 {
        self.divisions.hizb_quarter.div_ceil(4)
    }

    /// Text for display, without the leading invocation phrase.
    pub fn display_text(&self) -> &str {
        match self.text.strip_prefix(INVOCATION) {
            Some(rest) => rest.trim(),
            None => self.text.trim(),
        }
    }

    /// The string placed on the clipboard when the user copies this verse.
    pub fn clipboard_text(&self, chapter: &Chapter) -> String {
        format!(
            "{} [سورة {}: {}]",
            self.text, chapter.name, self.number_in_chapter
        )
    }
}

/// A chapter together with its ordered verses, as returned by the content source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterContent {
    pub chapter: Chapter,
    pub verses: Vec<Verse>,
}

impl ChapterContent {
    pub fn verse(&self, global_id: u32) -> Option<&Verse> {
        self.verses.iter().find(|v| v.global_id == global_id)
    }
}

/// Short exegesis text for one verse (tafsir).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commentary {
    pub text: String,
}

/// A multiple-choice question produced by the quiz tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

/// Remembers the chapter the user opened most recently on this device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastReadMarker {
    pub chapter_id: u32,
    pub chapter_name: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn chapter(id: u32, name: &str) -> Chapter {
        Chapter {
            id,
            name: name.to_string(),
            transliterated_name: format!("Chapter {id}"),
            translation: format!("Translation {id}"),
            verse_count: 5,
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
            audio_url: format!("https://cdn.example/audio/{global_id}.mp3"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{chapter, verse};
    use super::*;

    #[test]
    fn invocation_header_is_skipped_for_first_and_ninth_chapters() {
        assert!(!chapter(1, "الفاتحة").shows_invocation_header());
        assert!(!chapter(9, "التوبة").shows_invocation_header());
        assert!(chapter(2, "البقرة").shows_invocation_header());
    }

    #[test]
    fn display_text_strips_leading_invocation() {
        let v = verse(8, 1, &format!("{} الم", INVOCATION));
        assert_eq!(v.display_text(), "الم");
        let plain = verse(9, 2, "ذَٰلِكَ ٱلْكِتَٰبُ");
        assert_eq!(plain.display_text(), "ذَٰلِكَ ٱلْكِتَٰبُ");
    }

    #[test]
    fn hizb_rounds_quarters_up() {
        let mut v = verse(1, 1, "x");
        v.divisions.hizb_quarter = 1;
        assert_eq!(v.hizb(), 1);
        v.divisions.hizb_quarter = 4;
        assert_eq!(v.hizb(), 1);
        v.divisions.hizb_quarter = 5;
        assert_eq!(v.hizb(), 2);
    }

    #[test]
    fn clipboard_text_names_chapter_and_verse() {
        let c = chapter(112, "سُورَةُ الإِخۡلَاصِ");
        let v = verse(6222, 1, "قُلْ هُوَ ٱللَّهُ أَحَدٌ");
        assert_eq!(
            v.clipboard_text(&c),
            "قُلْ هُوَ ٱللَّهُ أَحَدٌ [سورة سُورَةُ الإِخۡلَاصِ: 1]"
        );
    }

    #[test]
    fn filter_matches_names_translation_and_id() {
        let chapters = vec![chapter(1, "الفاتحة"), chapter(2, "البقرة"), chapter(3, "آل عمران")];
        assert_eq!(filter_chapters(&chapters, "").len(), 3);
        assert_eq!(filter_chapters(&chapters, "البقرة")[0].id, 2);
        assert_eq!(filter_chapters(&chapters, "chapter 3")[0].id, 3);
        assert_eq!(filter_chapters(&chapters, " 1 ")[0].id, 1);
        assert!(filter_chapters(&chapters, "يس").is_empty());
    }
}
