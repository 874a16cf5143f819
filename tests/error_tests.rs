use std::error::Error;
use std::io;

use ytqueuer_client::QueuerError;

#[test]
fn test_queuer_error_display() {
    let err = QueuerError::IoError(io::Error::new(io::ErrorKind::Other, "disk gone"));
    assert!(format!("{}", err).contains("I/O error"));

    let parse_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
    let err = QueuerError::ParseFailed(parse_err);
    assert!(format!("{}", err).contains("JSON parsing failed"));

    assert_eq!(
        QueuerError::NoSelection.to_string(),
        "You must select a playlist first."
    );
    assert_eq!(
        QueuerError::InvalidClipboard.to_string(),
        "Invalid URL in clipboard."
    );
    assert_eq!(
        QueuerError::EmptyForm("WOL").to_string(),
        "No WOL settings provided. Form was empty."
    );
    assert_eq!(QueuerError::EmptyName.to_string(), "name cannot be empty");

    let err = QueuerError::Backend {
        status: 500,
        message: Some("boom".to_string()),
    };
    assert_eq!(err.to_string(), "Backend returned HTTP 500: boom");

    let err = QueuerError::Backend {
        status: 409,
        message: None,
    };
    assert_eq!(err.to_string(), "Backend returned HTTP 409");
}

#[test]
fn test_describe_backend_failure() {
    let err = QueuerError::Backend {
        status: 500,
        message: Some("database is locked".to_string()),
    };
    assert_eq!(
        err.describe("Failed to clear playlist"),
        "Failed to clear playlist: (500) database is locked"
    );

    // Empty message still shows the status
    let err = QueuerError::Backend {
        status: 400,
        message: Some(String::new()),
    };
    assert_eq!(err.describe("Failed to create CEC"), "Failed to create CEC: (400)");
}

#[tokio::test]
async fn test_describe_no_response() {
    // Nothing listens on port 9 of localhost
    let err = reqwest::Client::new()
        .get("http://127.0.0.1:9/pbcs")
        .send()
        .await
        .unwrap_err();
    let err = QueuerError::from(err);
    assert_eq!(
        err.describe("Failed to get available playlists"),
        "Failed to get available playlists: No response received"
    );
}

#[test]
fn test_describe_local_failure() {
    assert_eq!(
        QueuerError::InvalidClipboard.describe("Failed to get data from clipboard"),
        "Failed to get data from clipboard: Invalid URL in clipboard."
    );
}

#[test]
fn test_is_local() {
    assert!(QueuerError::NoSelection.is_local());
    assert!(QueuerError::InvalidClipboard.is_local());
    assert!(QueuerError::EmptyName.is_local());
    assert!(QueuerError::EmptyForm("CEC").is_local());
    assert!(!QueuerError::ClientNotRecognized.is_local());
    assert!(!QueuerError::Backend {
        status: 500,
        message: None
    }
    .is_local());
}

#[test]
fn test_queuer_error_trait() {
    let err = QueuerError::IoError(io::Error::new(io::ErrorKind::Other, "inner"));
    let _: &dyn Error = &err;
    assert!(err.source().is_some());

    let err = QueuerError::NoSelection;
    assert!(err.source().is_none());
}

#[test]
fn test_error_conversions() {
    let io_err = io::Error::new(io::ErrorKind::NotFound, "missing");
    let err: QueuerError = io_err.into();
    assert!(matches!(err, QueuerError::IoError(_)));

    let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err: QueuerError = json_err.into();
    assert!(matches!(err, QueuerError::ParseFailed(_)));
}
