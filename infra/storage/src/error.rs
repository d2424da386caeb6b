use std::borrow::Cow;

/// A specialized [`StorageError`] enum of this crate.
#[gpilot_derive::gpilot_error]
pub enum StorageError {
    /// No persistence is reachable from this context (e.g. outside a host).
    #[error("Persistence unavailable{}: {message}", format_context(.context))]
    Unavailable { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid storage area{}: {message}", format_context(.context))]
    InvalidArea { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Hardware I/O failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Malformed settings document{}: {source}", format_context(.context))]
    Serialization { source: serde_json::Error, context: Option<Cow<'static, str>> },
}
