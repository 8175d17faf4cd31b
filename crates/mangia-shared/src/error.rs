use thiserror::Error;

#[derive(Error, Debug)]
pub enum CredentialsError {
    /// The stored hash string is not in `salt$digest` form.
    #[error("Malformed password hash")]
    MalformedHash,

    /// Hex decoding of the salt or digest failed.
    #[error("Hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),
}
