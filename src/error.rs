use std::{fmt, io};

use crate::network::ProtocolState;

/// Anything that goes wrong turning bytes into messages or back.
///
/// These only ever end the offending connection.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("variable length number is longer than {max} bytes")]
    VarNumTooLong { max: usize },
    #[error("unexpected end of data: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },
    #[error("negative length {0}")]
    NegativeLength(i64),
    #[error("length {length} exceeds the limit of {max}")]
    TooLong { length: usize, max: usize },
    #[error("invalid utf-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("unknown opcode 0x{opcode:02X} in the {state:?} state")]
    UnknownOpcode { state: ProtocolState, opcode: i32 },
    #[error("{0} cannot be decoded")]
    DecodeUnsupported(&'static str),
    #[error("{message} is not registered in the {state:?} state")]
    Unregistered { message: &'static str, state: ProtocolState },
    #[error("frame of {length} bytes exceeds the limit of {max}")]
    FrameTooLarge { length: usize, max: usize },
    #[error("bad compression: {0}")]
    Compression(String),
    #[error("invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: i64 },
    #[error("{0}")]
    Invalid(String),
    #[error("nbt: {0}")]
    Nbt(#[from] fastnbt::error::Error),
}
impl CodecError {
    /// Whether more input could turn this into a success.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, CodecError::Truncated { .. })
    }
}

/// Wiring mistakes in protocol construction. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("{state:?} {direction:?}: opcode 0x{opcode:02X} is already bound to {existing}, cannot bind {message}")]
    DuplicateOpcode {
        state: ProtocolState,
        direction: crate::network::Direction,
        opcode: i32,
        existing: &'static str,
        message: &'static str,
    },
    #[error("{state:?} {direction:?}: {message} is already registered")]
    DuplicateType {
        state: ProtocolState,
        direction: crate::network::Direction,
        message: &'static str,
    },
}

/// Reasons a single connection ends.
#[derive(Debug, thiserror::Error)]
pub enum Disconnection {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("io: {0}")]
    Io(#[from] io::Error),
    #[error("kicked: {0}")]
    Kicked(String),
    #[error("connection closed by peer")]
    Closed,
}
impl Disconnection {
    pub fn kick(reason: impl Into<String>) -> Self {
        Disconnection::Kicked(reason.into())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("no profile found for {0}")]
    NotFound(String),
    #[error("io: {0}")]
    Io(#[from] io::Error),
    #[error("malformed profile response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed uuid in profile response: {0}")]
    Uuid(#[from] uuid::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unable to read config: {0}")]
    Io(#[from] io::Error),
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// A volume access outside of `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfBounds<P> {
    pub position: P,
    pub min: P,
    pub max: P,
}
impl<P: fmt::Display> fmt::Display for OutOfBounds<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "position {} is outside of [{}, {}]", self.position, self.min, self.max)
    }
}
impl<P: fmt::Display + fmt::Debug> std::error::Error for OutOfBounds<P> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::V3;

    #[test]
    fn out_of_bounds_names_the_range() {
        let err = OutOfBounds { position: V3(5, 0, 0), min: V3(0, 0, 0), max: V3(3, 3, 3) };
        assert_eq!(err.to_string(), "position (5, 0, 0) is outside of [(0, 0, 0), (3, 3, 3)]");
    }

    #[test]
    fn truncated_is_incomplete() {
        assert!(CodecError::Truncated { needed: 4, available: 1 }.is_incomplete());
        assert!(!CodecError::VarNumTooLong { max: 5 }.is_incomplete());
    }

    #[test]
    fn unknown_opcode_display() {
        let err = CodecError::UnknownOpcode { state: ProtocolState::Status, opcode: 0x7F };
        assert_eq!(err.to_string(), "unknown opcode 0x7F in the Status state");
    }
}
