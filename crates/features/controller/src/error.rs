use gpilot_menu::MenuError;
use gpilot_messaging::{HandlerError, MessagingError};
use gpilot_settings::SettingsError;
use gpilot_site_toggle::SiteToggleError;
use std::borrow::Cow;

#[gpilot_derive::gpilot_error]
pub enum ControllerError {
    #[error("Invalid payload{}: {message}", format_context(.context))]
    InvalidPayload { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A collaborator needs a setting the user has not filled in.
    #[error("Not configured{}: {message}", format_context(.context))]
    NotConfigured { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Collaborator failed{}: {message}", format_context(.context))]
    Collaborator { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Site error{}: {source}", format_context(.context))]
    Site { source: SiteToggleError, context: Option<Cow<'static, str>> },

    #[error("Settings error{}: {source}", format_context(.context))]
    Settings { source: SettingsError, context: Option<Cow<'static, str>> },

    #[error("Menu error{}: {source}", format_context(.context))]
    Menu { source: MenuError, context: Option<Cow<'static, str>> },

    #[error("Messaging error{}: {source}", format_context(.context))]
    Messaging { source: MessagingError, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl From<ControllerError> for HandlerError {
    /// Failure replies carry the most specific code available.
    fn from(err: ControllerError) -> Self {
        let code = match &err {
            ControllerError::Site { source, .. } => source.code(),
            ControllerError::Settings { source, .. } => source.code(),
            ControllerError::Menu { source, .. } => source.code(),
            ControllerError::Messaging { source, .. } => source.code(),
            other => other.code(),
        };
        Self::new(code, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_error_uses_source_code() {
        let err = ControllerError::from(SiteToggleError::InvalidUrl { message: "nope".into(), context: None });
        let handler = HandlerError::from(err);
        assert_eq!(handler.code(), "invalid_url");
        assert!(handler.message().contains("nope"));

        let handler = HandlerError::from(ControllerError::from("boom"));
        assert_eq!(handler.code(), "internal");
    }
}
