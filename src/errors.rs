use std::fmt;

#[derive(Debug)]
pub struct TarnError {
    pub message: String,
}

impl TarnError {
    pub fn new(message: &str) -> TarnError {
        TarnError {
            message: message.to_string(),
        }
    }
}

impl fmt::Display for TarnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TarnError {}
