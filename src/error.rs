use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// The vendor endpoint could not be reached or rejected the request
    /// (transport failure, non-200 status, or an error-flagged envelope).
    CannotConnect,
    /// The endpoint answered but the payload did not match the expected shape.
    Decode(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::CannotConnect => write!(f, "cannot connect to thermostat API"),
            Error::Decode(msg) => write!(f, "malformed thermostat payload: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
