/// An event stamped with its position in the emission order.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequenced<E> {
    pub seq: u64,
    pub event: E,
}

/// Ordered in-process event queue.
///
/// Producers `emit`; consumers `drain` and handle events in emission order.
/// Sequence numbers keep increasing across drains so a consumer can detect
/// whether it has already seen an event, or missed one.
///
/// A bounded bus keeps at most `max_len` undrained events; emitting past
/// that drops the oldest.
#[derive(Debug)]
pub struct EventBus<E> {
    next_seq: u64,
    events: Vec<Sequenced<E>>,
    max_len: Option<usize>,
    dropped: u64,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self {
            next_seq: 0,
            events: Vec::new(),
            max_len: None,
            dropped: 0,
        }
    }

    pub fn bounded(max_len: usize) -> Self {
        Self {
            max_len: Some(max_len.max(1)),
            ..Self::new()
        }
    }

    pub fn emit(&mut self, event: E) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        if let Some(max_len) = self.max_len {
            let excess = (self.events.len() + 1).saturating_sub(max_len);
            if excess > 0 {
                self.events.drain(..excess);
                self.dropped += excess as u64;
            }
        }
        self.events.push(Sequenced { seq, event });
        seq
    }

    pub fn events(&self) -> &[Sequenced<E>] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total number of events ever emitted.
    pub fn emitted(&self) -> u64 {
        self.next_seq
    }

    /// Events discarded undrained because the bus was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn drain(&mut self) -> Vec<Sequenced<E>> {
        std::mem::take(&mut self.events)
    }
}
