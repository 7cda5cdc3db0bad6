use tapegraph::logging::{init_tracing_with, LoggingError};

#[test]
fn subscriber_installs_once() {
    init_tracing_with(Some("tapegraph=trace")).expect("first install succeeds");
    let err = init_tracing_with(None).expect_err("a global subscriber already exists");
    assert!(matches!(err, LoggingError::SubscriberInit(_)));
}
