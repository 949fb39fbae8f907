//! Value objects of the signaling domain.

use std::fmt;

use uuid::Uuid;

use super::error::ValueObjectError;

/// Maximum length of a display name, counted in Unicode scalar values
pub const MAX_PEER_NAME_CHARS: usize = 20;

/// Server-generated identifier of one connected peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(Uuid);

impl PeerId {
    /// Parse a peer id from its textual form
    pub fn parse(value: &str) -> Result<Self, ValueObjectError> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|_| ValueObjectError::InvalidPeerId(value.to_string()))
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Generates fresh peer ids. A reconnecting client always gets a new one.
pub struct PeerIdFactory;

impl PeerIdFactory {
    pub fn generate() -> PeerId {
        PeerId(Uuid::new_v4())
    }
}

/// Display name chosen by a peer when it joins the room
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerName(String);

impl PeerName {
    /// Validate and wrap a display name.
    ///
    /// The name must be non-empty and at most [`MAX_PEER_NAME_CHARS`] characters
    /// long. Length is counted in `char`s, so multi-byte text is not penalized.
    pub fn new(value: String) -> Result<Self, ValueObjectError> {
        if value.is_empty() {
            return Err(ValueObjectError::EmptyPeerName);
        }
        let chars = value.chars().count();
        if chars > MAX_PEER_NAME_CHARS {
            return Err(ValueObjectError::PeerNameTooLong {
                max: MAX_PEER_NAME_CHARS,
                actual: chars,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for PeerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unix timestamp in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(millis: i64) -> Self {
        Self(millis)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}
