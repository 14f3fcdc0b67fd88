//! Verse-by-verse recitation playback.
//!
//! The controller never drives an audio device itself. Each operation returns the
//! `PlaybackEffect` the owner must apply to its single audio output.

use crate::domain::Verse;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEffect {
    /// Start `verse` from the beginning. `reload` carries the locator to load when the
    /// output currently holds a different resource.
    Play { verse: Verse, reload: Option<String> },
    Pause,
    /// Playback ended or was cut off; nothing is playing.
    Stopped,
}

#[derive(Debug, Default)]
pub struct PlaybackController {
    verses: Vec<Verse>,
    active: Option<Verse>,
    playing: bool,
    loaded_source: Option<String>,
}

impl PlaybackController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the chapter being played. Stops playback and clears the target.
    pub fn load_chapter(&mut self, verses: Vec<Verse>) -> PlaybackEffect {
        self.verses = verses;
        self.active = None;
        self.playing = false;
        PlaybackEffect::Stopped
    }

    pub fn active(&self) -> Option<&Verse> {
        self.active.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn verse(&self, global_id: u32) -> Option<&Verse> {
        self.verses.iter().find(|v| v.global_id == global_id)
    }

    fn is_active(&self, verse: &Verse) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| a.global_id == verse.global_id)
    }

    fn start(&mut self, verse: Verse) -> PlaybackEffect {
        let reload = if self.loaded_source.as_deref() != Some(verse.audio_url.as_str()) {
            self.loaded_source = Some(verse.audio_url.clone());
            Some(verse.audio_url.clone())
        } else {
            None
        };
        self.active = Some(verse.clone());
        self.playing = true;
        PlaybackEffect::Play { verse, reload }
    }

    /// Pauses the active, playing verse; otherwise makes `verse` the target and plays
    /// it from the start.
    pub fn toggle_play(&mut self, verse: Verse) -> PlaybackEffect {
        if self.playing && self.is_active(&verse) {
            self.playing = false;
            return PlaybackEffect::Pause;
        }
        self.start(verse)
    }

    /// Changes the target verse. While playing, playback follows the new target.
    pub fn select(&mut self, verse: Verse) -> Option<PlaybackEffect> {
        if self.is_active(&verse) {
            return None;
        }
        if self.playing {
            return Some(self.start(verse));
        }
        self.active = Some(verse);
        None
    }

    /// The output reached the end of the current verse.
    pub fn on_audio_ended(&mut self) -> PlaybackEffect {
        let next = self.active.as_ref().and_then(|active| {
            let position = self.verses.iter().position(|v| v.global_id == active.global_id)?;
            self.verses.get(position + 1).cloned()
        });
        match next {
            Some(verse) if self.playing => self.start(verse),
            _ => {
                self.playing = false;
                PlaybackEffect::Stopped
            }
        }
    }

    /// The output refused to play.
    pub fn on_playback_failed(&mut self) -> PlaybackEffect {
        self.playing = false;
        PlaybackEffect::Stopped
    }

    pub fn stop(&mut self) -> PlaybackEffect {
        self.playing = false;
        PlaybackEffect::Pause
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::verse;

    fn chapter_of_five() -> (PlaybackController, Vec<Verse>) {
        let verses: Vec<Verse> = (1..=5).map(|n| verse(100 + n, n, "نص")).collect();
        let mut controller = PlaybackController::new();
        controller.load_chapter(verses.clone());
        (controller, verses)
    }

    #[test]
    fn finishing_a_verse_advances_to_the_next() {
        let (mut controller, verses) = chapter_of_five();
        controller.toggle_play(verses[2].clone());
        match controller.on_audio_ended() {
            PlaybackEffect::Play { verse, reload } => {
                assert_eq!(verse.global_id, verses[3].global_id);
                assert_eq!(reload.as_deref(), Some(verses[3].audio_url.as_str()));
            }
            other => panic!("expected Play, got {other:?}"),
        }
        assert_eq!(controller.active().unwrap().global_id, verses[3].global_id);
        assert!(controller.is_playing());
    }

    #[test]
    fn finishing_the_last_verse_stops_and_keeps_target() {
        let (mut controller, verses) = chapter_of_five();
        controller.toggle_play(verses[4].clone());
        assert_eq!(controller.on_audio_ended(), PlaybackEffect::Stopped);
        assert!(!controller.is_playing());
        assert_eq!(controller.active().unwrap().global_id, verses[4].global_id);
    }

    #[test]
    fn toggling_the_playing_verse_pauses() {
        let (mut controller, verses) = chapter_of_five();
        controller.toggle_play(verses[0].clone());
        assert_eq!(controller.toggle_play(verses[0].clone()), PlaybackEffect::Pause);
        assert!(!controller.is_playing());
    }

    #[test]
    fn resuming_the_same_verse_does_not_reload() {
        let (mut controller, verses) = chapter_of_five();
        controller.toggle_play(verses[0].clone());
        controller.toggle_play(verses[0].clone());
        assert_eq!(
            controller.toggle_play(verses[0].clone()),
            PlaybackEffect::Play {
                verse: verses[0].clone(),
                reload: None
            }
        );
    }

    #[test]
    fn toggling_another_verse_switches_source() {
        let (mut controller, verses) = chapter_of_five();
        controller.toggle_play(verses[0].clone());
        match controller.toggle_play(verses[1].clone()) {
            PlaybackEffect::Play { verse, reload } => {
                assert_eq!(verse.global_id, verses[1].global_id);
                assert!(reload.is_some());
            }
            other => panic!("expected Play, got {other:?}"),
        }
    }

    #[test]
    fn selecting_while_paused_only_moves_target() {
        let (mut controller, verses) = chapter_of_five();
        assert_eq!(controller.select(verses[1].clone()), None);
        assert_eq!(controller.active().unwrap().global_id, verses[1].global_id);
        assert!(!controller.is_playing());
    }

    #[test]
    fn selecting_while_playing_follows_the_target() {
        let (mut controller, verses) = chapter_of_five();
        controller.toggle_play(verses[0].clone());
        assert!(matches!(
            controller.select(verses[3].clone()),
            Some(PlaybackEffect::Play { .. })
        ));
    }

    #[test]
    fn loading_a_chapter_stops_and_clears() {
        let (mut controller, verses) = chapter_of_five();
        controller.toggle_play(verses[0].clone());
        assert_eq!(controller.load_chapter(Vec::new()), PlaybackEffect::Stopped);
        assert!(controller.active().is_none());
        assert!(!controller.is_playing());
    }

    #[test]
    fn ended_after_pause_does_not_resume() {
        let (mut controller, verses) = chapter_of_five();
        controller.toggle_play(verses[0].clone());
        controller.stop();
        assert_eq!(controller.on_audio_ended(), PlaybackEffect::Stopped);
        assert_eq!(controller.active().unwrap().global_id, verses[0].global_id);
    }

    #[test]
    fn failed_playback_clears_playing() {
        let (mut controller, verses) = chapter_of_five();
        controller.toggle_play(verses[0].clone());
        controller.on_playback_failed();
        assert!(!controller.is_playing());
    }
}
