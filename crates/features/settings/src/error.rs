use std::borrow::Cow;

#[gpilot_derive::gpilot_error]
pub enum SettingsError {
    #[error("Unknown setting{}: {message}", format_context(.context))]
    UnknownKey { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The value does not have the shape the key expects.
    #[error("Invalid value{}: {message}", format_context(.context))]
    InvalidValue { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Malformed settings payload{}: {source}", format_context(.context))]
    Payload { source: serde_json::Error, context: Option<Cow<'static, str>> },
}
