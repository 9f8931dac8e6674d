#[derive(Debug, Clone, thiserror::Error)]
pub enum CookieError {
    #[error("cookie name contains a character outside [0x21..0x7E] or an '=' or ';'")]
    InvalidName,

    #[error("cookie value contains a character outside [0x21..0x7E] or a ';'")]
    InvalidValue,

    #[error("cookie value could not be decrypted")]
    DecryptFailed(#[from] wsfab_codec::CodecError),
}
