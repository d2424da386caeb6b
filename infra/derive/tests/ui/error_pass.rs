use gpilot_derive::gpilot_error;
use std::borrow::Cow;

#[gpilot_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Handler failed{}: {message}", format_context(.context))]
    HandlerFailure { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn read() -> Result<(), DemoError> {
    Err(std::io::Error::other("disk")).context("reading settings")
}

fn main() {
    let err = read().unwrap_err();
    assert_eq!(err.code(), "io");
    assert_eq!(err.to_string(), "IO error (reading settings): disk");

    let err = DemoError::HandlerFailure { message: "boom".into(), context: None };
    assert_eq!(err.code(), "handler_failure");

    let err: DemoError = "fallback".into();
    assert_eq!(err.code(), "internal");
}
