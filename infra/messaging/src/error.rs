use std::borrow::Cow;

/// Errors raised by the bus, the router and the transport.
#[gpilot_derive::gpilot_error]
pub enum MessagingError {
    /// An internal dynamic cast failed; the type registry is inconsistent.
    #[error("Type mismatch{}: {message}", format_context(.context))]
    TypeMismatch { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Invalid capacity{}: {message}", format_context(.context))]
    InvalidCapacity { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The handler answered with a structured failure reply.
    #[error("Handler failure{}: {message}", format_context(.context))]
    HandlerFailure { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A reply was attempted on an exchange that was already answered.
    #[error("Duplicate reply{}: {message}", format_context(.context))]
    DuplicateReply { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Every listening context ignored the message.
    #[error("No response{}: {message}", format_context(.context))]
    NoResponse { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Reply timed out{}: {message}", format_context(.context))]
    Timeout { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
