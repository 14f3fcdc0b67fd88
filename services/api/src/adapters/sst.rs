//! services/api/src/adapters/sst.rs
//!
//! This module contains the adapters for speech recognition of a recitation.
//! `WhisperRecitationAdapter` implements the `SpeechToTextService` port over the
//! OpenAI transcription endpoint; `SpeechUnavailable` stands in when no credential
//! is configured.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::audio::{AudioInput, CreateTranscriptionRequest},
    Client,
};
use async_trait::async_trait;
use hound::{WavSpec, WavWriter};
use quran_study_core::ports::{PortError, PortResult, SpeechToTextService};
use tracing::debug;

/// Sample rate of the PCM16 frames the browser shell streams to `/ws`.
pub const CAPTURE_SAMPLE_RATE: u32 = 48_000;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// Transcribes one captured utterance with a Whisper model, constrained to one language.
#[derive(Clone)]
pub struct WhisperRecitationAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    language: String,
}

impl WhisperRecitationAdapter {
    /// Creates a new `WhisperRecitationAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String, language: String) -> Self {
        Self {
            client,
            model,
            language,
        }
    }

    /// Wraps little-endian mono PCM16 in a WAV container. A trailing odd byte is dropped.
    pub fn pcm16_to_wav(pcm_data: &[u8], sample_rate: u32) -> Result<Vec<u8>, hound::Error> {
        let mut cursor = std::io::Cursor::new(Vec::new());

        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for chunk in pcm_data.chunks_exact(2) {
            writer.write_sample(i16::from_le_bytes([chunk[0], chunk[1]]))?;
        }
        writer.finalize()?;

        Ok(cursor.into_inner())
    }
}

//=========================================================================================
// `SpeechToTextService` Trait Implementations
//=========================================================================================

#[async_trait]
impl SpeechToTextService for WhisperRecitationAdapter {
    async fn transcribe_audio(&self, audio_data: &[u8]) -> PortResult<String> {
        if audio_data.len() < 2 {
            return Err(PortError::Malformed("no audio captured".to_string()));
        }

        let wav_data = Self::pcm16_to_wav(audio_data, CAPTURE_SAMPLE_RATE)
            .map_err(|e| PortError::Unexpected(format!("Failed to encode WAV: {}", e)))?;
        debug!("Transcribing {} bytes of WAV audio", wav_data.len());

        let request = CreateTranscriptionRequest {
            file: AudioInput::from_vec_u8("recitation.wav".into(), wav_data),
            model: self.model.clone(),
            language: Some(self.language.clone()),
            ..Default::default()
        };

        let response = self
            .client
            .audio()
            .transcription()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        Ok(response.text)
    }
}

/// Used when speech recognition is not configured on this host.
#[derive(Clone, Copy, Debug, Default)]
pub struct SpeechUnavailable;

#[async_trait]
impl SpeechToTextService for SpeechUnavailable {
    async fn transcribe_audio(&self, _audio_data: &[u8]) -> PortResult<String> {
        Err(PortError::Unavailable("speech recognition".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_header_wraps_samples() {
        let pcm: Vec<u8> = [0i16, 1000, -1000, 32767]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        let wav = WhisperRecitationAdapter::pcm16_to_wav(&pcm, CAPTURE_SAMPLE_RATE).unwrap();

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");

        let reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        assert_eq!(reader.spec().sample_rate, CAPTURE_SAMPLE_RATE);
        let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0, 1000, -1000, 32767]);
    }

    #[tokio::test]
    async fn stub_reports_unavailable() {
        let err = SpeechUnavailable.transcribe_audio(&[0, 0]).await.unwrap_err();
        assert!(matches!(err, PortError::Unavailable(_)));
    }
}
