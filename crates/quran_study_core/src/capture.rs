//! Single-utterance speech capture for recitation checks.
//!
//! At most one capture is active. Starting again while listening drops the previous
//! capture's audio.

/// Whether the host can recognize speech at all. Queried once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechAvailability {
    Available,
    Unavailable,
}

pub const SPEECH_UNAVAILABLE_MESSAGE: &str =
    "ميزة التسميع غير متاحة حالياً: لم يتم إعداد خدمة التعرف على الكلام.";
/// Upper bound on one utterance: 60 s of 48 kHz mono PCM16.
pub const MAX_CAPTURE_BYTES: usize = 60 * 48_000 * 2;

pub const RECOGNITION_FAILED_MESSAGE: &str = "تعذر التعرف على التلاوة، حاول مجدداً.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePhase {
    Idle,
    Listening,
    Transcribing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStart {
    Started,
    /// A capture was already running; it was stopped and its audio discarded.
    Restarted,
    Unavailable,
}

#[derive(Debug)]
pub struct CaptureSession {
    availability: SpeechAvailability,
    phase: CapturePhase,
    buffer: Vec<u8>,
}

impl CaptureSession {
    pub fn new(availability: SpeechAvailability) -> Self {
        Self {
            availability,
            phase: CapturePhase::Idle,
            buffer: Vec::new(),
        }
    }

    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    pub fn start(&mut self) -> CaptureStart {
        if self.availability == SpeechAvailability::Unavailable {
            return CaptureStart::Unavailable;
        }
        let restarted = self.phase == CapturePhase::Listening;
        self.buffer.clear();
        self.phase = CapturePhase::Listening;
        if restarted {
            CaptureStart::Restarted
        } else {
            CaptureStart::Started
        }
    }

    /// Buffers a chunk of audio. Returns false when the chunk is dropped: not
    /// listening, or the utterance would exceed `MAX_CAPTURE_BYTES`.
    pub fn push_audio(&mut self, chunk: &[u8]) -> bool {
        if self.phase != CapturePhase::Listening {
            return false;
        }
        if self.buffer.len() + chunk.len() > MAX_CAPTURE_BYTES {
            return false;
        }
        self.buffer.extend_from_slice(chunk);
        true
    }

    /// Ends the utterance and hands back its audio for transcription.
    pub fn finish(&mut self) -> Option<Vec<u8>> {
        if self.phase != CapturePhase::Listening {
            return None;
        }
        self.phase = CapturePhase::Transcribing;
        Some(std::mem::take(&mut self.buffer))
    }

    /// Aborts whatever is going on and returns to idle.
    pub fn cancel(&mut self) {
        self.buffer.clear();
        self.phase = CapturePhase::Idle;
    }

    /// The transcription for the finished utterance arrived (or failed).
    pub fn complete(&mut self) {
        if self.phase == CapturePhase::Transcribing {
            self.phase = CapturePhase::Idle;
        }
    }
}
