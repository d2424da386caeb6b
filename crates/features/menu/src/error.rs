use std::borrow::Cow;

#[gpilot_derive::gpilot_error]
pub enum MenuError {
    /// `update` for an id that was never created.
    #[error("Unknown menu entry{}: {message}", format_context(.context))]
    UnknownEntry { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The host menu API rejected the call.
    #[error("Menu host error{}: {message}", format_context(.context))]
    Host { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
