use super::*;

pub type Result<T, E = WireError> = std::result::Result<T, E>;

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum WireError {
    #[snafu(display("invalid hex: {message}"))]
    Hex { message: String },

    #[snafu(display("payload is {len} hex characters, need at least {min}"))]
    Truncated { len: usize, min: usize },

    #[snafu(display("{message}"))]
    Parse { message: String },
}

impl From<hex::FromHexError> for WireError {
    fn from(err: hex::FromHexError) -> Self {
        WireError::Hex {
            message: err.to_string(),
        }
    }
}
