use std::{error::Error as StdError, time::Duration};

use txguard::{RollbackError, SetupError};

#[test]
fn setup_errors_render_their_stage() {
    let missing = SetupError::MissingUrl;
    let connect = SetupError::Connect {
        timeout: Duration::from_secs(2),
        source: boxed_error("connection refused"),
    };
    let begin = SetupError::Begin {
        begin_sql: "BEGIN READ ONLY".to_string(),
        source: boxed_error("permission denied"),
    };

    assert!(format!("{missing}").contains("no connection url"));
    assert!(format!("{connect}").contains("2s"));
    assert!(format!("{connect}").contains("connection refused"));
    assert!(format!("{begin}").contains("`BEGIN READ ONLY`"));
    assert!(format!("{begin}").contains("permission denied"));
}

#[test]
fn setup_errors_keep_their_sources() {
    let connect = SetupError::Connect {
        timeout: Duration::from_secs(2),
        source: boxed_error("connection refused"),
    };

    let source = connect.source().expect("connect error carries its source");
    assert_eq!(source.to_string(), "connection refused");
}

#[test]
fn rollback_error_renders_and_keeps_its_source() {
    let error = RollbackError {
        source: boxed_error("server closed the connection unexpectedly"),
    };

    assert!(format!("{error}").contains("failed to roll back"));
    let source = error.source().expect("rollback error carries its source");
    assert_eq!(
        source.to_string(),
        "server closed the connection unexpectedly"
    );
}

fn boxed_error(message: &'static str) -> Box<dyn StdError + Send + Sync> {
    Box::new(std::io::Error::other(message))
}
