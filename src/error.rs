use std::fmt;
use std::io;

#[derive(Debug)]
pub enum StepwaveError {
    /// A pattern record could not be serialized for persistence.
    PatternEncode(serde_json::Error),
    /// Writing a bounced WAV file failed.
    WavWrite(io::Error),
}

impl fmt::Display for StepwaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepwaveError::PatternEncode(e) => write!(f, "Pattern encode error: {e}"),
            StepwaveError::WavWrite(e) => write!(f, "WAV write error: {e}"),
        }
    }
}

impl std::error::Error for StepwaveError {}

impl From<serde_json::Error> for StepwaveError {
    fn from(e: serde_json::Error) -> Self {
        StepwaveError::PatternEncode(e)
    }
}

impl From<io::Error> for StepwaveError {
    fn from(e: io::Error) -> Self {
        StepwaveError::WavWrite(e)
    }
}
