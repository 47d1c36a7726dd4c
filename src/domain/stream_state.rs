//! State of the answer stream currently being received.
//!
//! The token buffer only exists while a stream is active. A stream that
//! belongs to a dialog discarded by `reset` is kept as [`StreamState::Draining`]
//! so its remaining tokens and end marker can be swallowed.

/// Phase of the inbound answer stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StreamState {
    /// No stream in progress.
    #[default]
    Idle,
    /// Receiving tokens for the last turn's pending answer.
    Streaming {
        /// Concatenation of every token received so far.
        buffer: String,
    },
    /// Receiving a stream whose dialog was reset; its content is dropped.
    Draining,
}

impl StreamState {
    /// Returns `true` while tokens are accumulated for the current dialog.
    #[must_use]
    pub const fn is_streaming(&self) -> bool {
        matches!(self, Self::Streaming { .. })
    }

    /// Returns `true` while a discarded stream is still being received.
    #[must_use]
    pub const fn is_draining(&self) -> bool {
        matches!(self, Self::Draining)
    }

    /// Returns `true` if no stream of any kind is in progress.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Partial answer assembled so far.
    #[must_use]
    pub fn buffer(&self) -> Option<&str> {
        match self {
            Self::Streaming { buffer } => Some(buffer),
            Self::Idle | Self::Draining => None,
        }
    }

    /// Begins a stream with an empty buffer.
    pub fn start(&mut self) {
        *self = Self::Streaming {
            buffer: String::new(),
        };
    }

    /// Begins a stream whose content will be discarded.
    pub fn drain(&mut self) {
        *self = Self::Draining;
    }

    /// Appends a fragment verbatim. Returns `false` if not streaming.
    pub fn push(&mut self, fragment: &str) -> bool {
        match self {
            Self::Streaming { buffer } => {
                buffer.push_str(fragment);
                true
            }
            Self::Idle | Self::Draining => false,
        }
    }

    /// Ends the stream, returning the assembled text if it was live.
    pub fn finish(&mut self) -> Option<String> {
        match std::mem::take(self) {
            Self::Streaming { buffer } => Some(buffer),
            Self::Idle | Self::Draining => None,
        }
    }

    /// Detaches a live stream from the dialog, dropping its buffer.
    pub fn orphan(&mut self) {
        if self.is_streaming() {
            *self = Self::Draining;
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn tokens_concatenate_without_separators() {
        let mut stream = StreamState::default();
        stream.start();
        for fragment in ["Tw", "o", " peo", "ple", "."] {
            assert!(stream.push(fragment));
        }
        assert_eq!(stream.buffer(), Some("Two people."));
        assert_eq!(stream.finish(), Some("Two people.".to_string()));
        assert!(stream.is_idle());
    }

    #[test]
    fn start_resets_buffer() {
        let mut stream = StreamState::Streaming {
            buffer: "stale".to_string(),
        };
        stream.start();
        assert_eq!(stream.buffer(), Some(""));
    }

    #[test]
    fn push_outside_stream_is_refused() {
        let mut stream = StreamState::Idle;
        assert!(!stream.push("x"));
        stream.drain();
        assert!(!stream.push("x"));
        assert_eq!(stream.finish(), None);
        assert!(stream.is_idle());
    }

    #[test]
    fn orphan_drops_buffer() {
        let mut stream = StreamState::default();
        stream.start();
        stream.push("par");
        stream.orphan();
        assert!(stream.is_draining());
        assert_eq!(stream.buffer(), None);

        let mut idle = StreamState::Idle;
        idle.orphan();
        assert!(idle.is_idle());
    }
}
