use hub_logger::{LevelFilter, LogSettings, Logger, LoggerError};

#[test]
fn init_twice_returns_subscriber_error() {
    let logger = Logger::from_settings("integration-init-twice", &LogSettings::default())
        .expect("first init should succeed");
    assert!(!logger.has_file_output(), "console-only logger should not create a file guard");

    let err = Logger::builder()
        .name("integration-init-twice-second")
        .level(LevelFilter::INFO)
        .init()
        .expect_err("second init should fail");

    assert!(
        matches!(err, LoggerError::Subscriber { .. }),
        "expected subscriber error for second init"
    );
}
