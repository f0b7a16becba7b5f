//! Validated generation topic.

use std::fmt;

use thiserror::Error;

pub const MIN_TOPIC_CHARS: usize = 3;
pub const MAX_TOPIC_CHARS: usize = 200;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopicError {
    #[error("Topic must not be blank")]
    Blank,

    #[error("Topic must be at least 3 characters (got {0})")]
    TooShort(usize),

    #[error("Topic must be at most 200 characters (got {0})")]
    TooLong(usize),
}

/// A topic string of 3 to 200 characters. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic(String);

impl Topic {
    pub fn new(value: impl Into<String>) -> Result<Self, TopicError> {
        let value = value.into();
        let len = value.chars().count();
        if len > 0 && value.trim().is_empty() {
            return Err(TopicError::Blank);
        }
        if len < MIN_TOPIC_CHARS {
            return Err(TopicError::TooShort(len));
        }
        if len > MAX_TOPIC_CHARS {
            return Err(TopicError::TooLong(len));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
