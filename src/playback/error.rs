use std::path::PathBuf;
use thiserror::Error;

/// Per-track failures. None of them are fatal to the process: the controller
/// releases whatever it acquired and the supervisor moves on to the next track.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("could not open {}: {reason}", path.display())]
    DecodeOpen { path: PathBuf, reason: String },

    #[error("unsupported stream format: {0}")]
    FormatNegotiation(String),

    #[error("no output device available: {0}")]
    OutputDeviceUnavailable(String),

    #[error("output stream failed: {0}")]
    OutputStream(String),

    #[error("could not allocate a {size}-point transform")]
    TransformAllocation { size: usize },

    #[error("decode failed: {0}")]
    DecodeRead(String),
}

impl PlaybackError {
    pub fn decode_open(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::DecodeOpen {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_open_message_names_the_file() {
        let err = PlaybackError::decode_open("/music/missing.mp3", "No such file");
        let msg = err.to_string();
        assert!(msg.contains("/music/missing.mp3"));
        assert!(msg.contains("No such file"));
    }

    #[test]
    fn test_transform_allocation_message() {
        let err = PlaybackError::TransformAllocation { size: 1000 };
        assert_eq!(err.to_string(), "could not allocate a 1000-point transform");
    }
}
