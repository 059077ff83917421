use std::collections::HashMap;

use super::super::*;
use super::super::record::RequestRecord;

fn record() -> RequestRecord {
    let request = TransportRequest {
        method: Method::Get,
        uri: "http://example.test/state".to_string(),
        headers: HashMap::new(),
        body: None,
        timeout: None,
        redirect_limit: DEFAULT_REDIRECT_LIMIT,
    };
    RequestRecord::new(RequestId::new(1), request, Callbacks::default())
}

#[test]
fn test_valid_transitions() {
    use RequestPhase::*;

    assert!(Building.can_transition_to(Sent));
    assert!(Sent.can_transition_to(Running));
    assert!(Sent.can_transition_to(Aborted));
    for terminal in [Succeeded, HttpError, NetworkError, Aborted] {
        assert!(Running.can_transition_to(terminal));
    }

    assert!(!Building.can_transition_to(Running));
    assert!(!Sent.can_transition_to(Succeeded));
    assert!(!Succeeded.can_transition_to(Aborted));
    assert!(!Aborted.can_transition_to(Running));
}

#[test]
fn test_terminal_phases() {
    use RequestPhase::*;

    for phase in [Succeeded, HttpError, NetworkError, Aborted] {
        assert!(phase.is_terminal());
    }
    for phase in [Building, Sent, Running] {
        assert!(!phase.is_terminal());
    }
}

#[test]
fn test_second_send_is_rejected() {
    let record = record();
    assert_eq!(record.transition(RequestPhase::Sent).unwrap(), RequestPhase::Building);

    let err = record.transition(RequestPhase::Sent).unwrap_err();
    assert!(matches!(err, RequestError::AlreadySent(id) if id == RequestId::new(1)));
    assert_eq!(record.phase(), RequestPhase::Sent);
}

#[test]
fn test_invalid_transition_reports_phases() {
    let record = record();
    let err = record.transition(RequestPhase::Running).unwrap_err();
    match err {
        RequestError::InvalidTransition { from, to, .. } => {
            assert_eq!(from, RequestPhase::Building);
            assert_eq!(to, RequestPhase::Running);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_terminal_phase_is_final() {
    let record = record();
    record.transition(RequestPhase::Sent).unwrap();
    record.transition(RequestPhase::Running).unwrap();
    record.transition(RequestPhase::Succeeded).unwrap();

    assert!(record.transition(RequestPhase::Aborted).is_err());
    assert!(record.transition(RequestPhase::NetworkError).is_err());
    assert_eq!(record.phase(), RequestPhase::Succeeded);
}

#[test]
fn test_classification_precedence() {
    assert_eq!(
        classify(Some(&TransportError::Network("reset".into()))),
        Outcome::NetworkError
    );
    assert_eq!(
        classify(Some(&TransportError::Protocol("HTTP 500".into()))),
        Outcome::HttpError
    );
    assert_eq!(classify(None), Outcome::Succeeded);
}

#[test]
fn test_response_from_completion() {
    let response = WebResponse::from_completion(Completion {
        url: "http://example.test".to_string(),
        status_code: Some(404),
        headers: HashMap::from([("Content-Type".to_string(), "text/plain".to_string())]),
        body: b"missing".to_vec(),
        failure: Some(TransportError::Protocol("HTTP 404".into())),
    });

    assert!(response.is_http_error());
    assert!(!response.is_successful());
    assert_eq!(response.text(), "missing");
    assert_eq!(response.header("content-type"), Some("text/plain"));
    assert_eq!(response.error.as_deref(), Some("HTTP 404"));
}

#[test]
fn test_response_json() {
    #[derive(serde::Deserialize)]
    struct Body {
        name: String,
    }

    let response = WebResponse::from_completion(Completion {
        body: br#"{"name":"frame"}"#.to_vec(),
        ..Default::default()
    });
    let body: Body = response.json().unwrap();
    assert_eq!(body.name, "frame");
    assert!(response.is_successful());
}

#[test]
fn test_method_parsing() {
    assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
    assert_eq!("DELETE".parse::<Method>().unwrap(), Method::Delete);
    assert!("PATCH".parse::<Method>().is_err());
    assert_eq!(Method::Head.to_string(), "HEAD");
}

#[test]
fn test_progress_tracker_strictly_increasing() {
    let mut tracker = ProgressTracker::default();
    assert_eq!(tracker.advance(0.0), None);
    assert_eq!(tracker.advance(0.25), Some(0.25));
    assert_eq!(tracker.advance(0.25), None);
    assert_eq!(tracker.advance(0.1), None);
    assert_eq!(tracker.advance(f32::NAN), None);
    assert_eq!(tracker.advance(7.0), Some(1.0));
    assert_eq!(tracker.advance(1.0), None);
    assert_eq!(tracker.last(), 1.0);
}
