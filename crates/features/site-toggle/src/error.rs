use std::borrow::Cow;

#[gpilot_derive::gpilot_error]
pub enum SiteToggleError {
    /// Not an absolute URL with a host name.
    #[error("Invalid URL{}: {message}", format_context(.context))]
    InvalidUrl { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
