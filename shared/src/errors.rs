use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TagError {
    #[error("a player tag cannot be empty")]
    Empty,
    #[error("'{0}' is not a valid player tag, only letters and digits are allowed")]
    InvalidCharacters(String),
}
