use gpilot_logger::{LevelFilter, Logger, LoggerError};

#[test]
fn second_context_in_one_process_is_rejected() {
    let _logger = Logger::builder()
        .context("background")
        .level(LevelFilter::INFO)
        .init()
        .expect("first init should succeed");

    let err = Logger::builder()
        .context("settings")
        .level(LevelFilter::INFO)
        .init()
        .expect_err("second init should fail");

    assert!(matches!(err, LoggerError::Subscriber { .. }), "expected subscriber error");
    assert_eq!(err.code(), "subscriber");
}
