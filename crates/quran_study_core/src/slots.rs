//! Request-generation tickets.
//!
//! Each mutable panel keeps a counter. A response may only be applied while its ticket
//! is still the latest issued for that panel, so a slow earlier response can never
//! overwrite a newer one.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Chapter,
    Commentary,
    AiContent,
    Quiz,
    Recitation,
}

impl Slot {
    const COUNT: usize = 5;

    fn index(self) -> usize {
        match self {
            Slot::Chapter => 0,
            Slot::Commentary => 1,
            Slot::AiContent => 2,
            Slot::Quiz => 3,
            Slot::Recitation => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    slot: Slot,
    generation: u64,
}

impl Ticket {
    pub fn slot(&self) -> Slot {
        self.slot
    }
}

#[derive(Debug, Default)]
pub struct RequestSlots {
    latest: [u64; Slot::COUNT],
}

impl RequestSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a new ticket, superseding every earlier ticket of the same slot.
    pub fn issue(&mut self, slot: Slot) -> Ticket {
        let latest = &mut self.latest[slot.index()];
        *latest += 1;
        Ticket {
            slot,
            generation: *latest,
        }
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest[ticket.slot.index()] == ticket.generation
    }

    /// Supersedes any in-flight request without starting a new one.
    pub fn invalidate(&mut self, slot: Slot) {
        self.latest[slot.index()] += 1;
    }
}
