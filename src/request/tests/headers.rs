use std::time::Duration;

use super::super::*;
use super::Harness;

#[test]
fn test_explicit_header_overrides_super_header() {
    let h = Harness::new();
    h.manager.set_super_header("A", "1").unwrap();

    let handle = h.manager.get("http://example.test/a").set_header("A", "2");
    handle.send().unwrap();
    h.cycle();

    let started = h.transport.started();
    assert_eq!(started.len(), 1);
    assert_eq!(started[0].headers.get("A").map(String::as_str), Some("2"));
}

#[test]
fn test_super_headers_are_copied_at_construction() {
    let h = Harness::new();
    h.manager.set_super_header("X-Before", "yes").unwrap();

    let handle = h.manager.get("http://example.test/snapshot");
    h.manager.set_super_header("X-After", "yes").unwrap();
    h.manager.remove_super_header("X-Before");

    let headers = handle.headers();
    assert_eq!(headers.get("X-Before").map(String::as_str), Some("yes"));
    assert!(!headers.contains_key("X-After"));
}

#[test]
fn test_remove_header_drops_default_and_explicit() {
    let h = Harness::new();
    h.manager.set_super_header("Auth", "token").unwrap();
    h.manager.set_super_header("Trace", "on").unwrap();

    let handle = h
        .manager
        .get("http://example.test/remove")
        .set_header("Auth", "override")
        .remove_header("Auth");
    let headers = handle.headers();
    assert!(!headers.contains_key("Auth"));
    assert!(headers.contains_key("Trace"));

    let handle = handle.set_header("Local", "1").remove_super_headers();
    let headers = handle.headers();
    assert_eq!(headers.len(), 1);
    assert!(headers.contains_key("Local"));
}

#[test]
fn test_set_headers_bulk() {
    let h = Harness::new();
    let handle = h
        .manager
        .get("http://example.test/bulk")
        .set_headers([("A", "1"), ("B", "2")]);
    assert_eq!(handle.headers().len(), 2);
}

#[test]
fn test_super_header_validation() {
    let h = Harness::new();
    assert!(matches!(
        h.manager.set_super_header("", "v"),
        Err(RequestError::InvalidHeader(_))
    ));
    assert!(matches!(
        h.manager.set_super_header("K", ""),
        Err(RequestError::InvalidHeader(_))
    ));
    assert!(h.manager.super_headers().is_empty());

    h.manager.set_super_header("K", "v").unwrap();
    assert!(!h.manager.remove_super_header(""));
    assert!(h.manager.remove_super_header("K"));
    assert!(!h.manager.remove_super_header("K"));
}

#[test]
fn test_post_form_sets_body_and_content_type() {
    let h = Harness::new();
    h.manager
        .post_form("http://example.test/form", &[("user", "a b"), ("id", "7")])
        .send()
        .unwrap();
    h.cycle();

    let request = &h.transport.started()[0];
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.body.as_deref(), Some(&b"user=a+b&id=7"[..]));
    assert_eq!(
        request.headers.get("Content-Type").map(String::as_str),
        Some("application/x-www-form-urlencoded")
    );
}

#[test]
fn test_post_json_serializes_value() {
    #[derive(serde::Serialize)]
    struct Payload {
        count: u32,
    }

    let h = Harness::new();
    h.manager
        .post_json("http://example.test/json", &Payload { count: 3 })
        .unwrap()
        .send()
        .unwrap();
    h.cycle();

    let request = &h.transport.started()[0];
    assert_eq!(request.body.as_deref(), Some(&br#"{"count":3}"#[..]));
    assert_eq!(
        request.headers.get("Content-Type").map(String::as_str),
        Some("application/json")
    );
}

#[test]
fn test_post_multipart_sets_boundary_and_body() {
    let h = Harness::new();
    h.manager
        .post_multipart(
            "http://example.test/upload",
            &[
                MultipartSection::field("title", "report"),
                MultipartSection::file("file", "r.csv", Some("text/csv"), b"a,b\n1,2".to_vec()),
            ],
        )
        .send()
        .unwrap();
    h.cycle();

    let request = &h.transport.started()[0];
    assert_eq!(request.method, Method::Post);
    let content_type = request.headers.get("Content-Type").unwrap();
    let boundary = content_type
        .strip_prefix("multipart/form-data; boundary=")
        .unwrap();
    assert!(!boundary.is_empty());

    let body = String::from_utf8(request.body.clone().unwrap()).unwrap();
    let expected = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"title\"\r\n\r\n\
         report\r\n\
         --{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"r.csv\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         a,b\n1,2\r\n\
         --{boundary}--\r\n"
    );
    assert_eq!(body, expected);
}

#[test]
fn test_verb_factories() {
    let h = Harness::new();
    assert_eq!(h.manager.put_str("http://t/p", "x").method(), Method::Put);
    assert_eq!(h.manager.delete("http://t/d").method(), Method::Delete);
    assert_eq!(h.manager.head("http://t/h").method(), Method::Head);
    assert_eq!(h.manager.post_json_str("http://t/j", "{}").method(), Method::Post);
    assert_eq!(h.manager.request(Method::Get, "http://t/g").uri(), "http://t/g");
}

#[test]
fn test_config_defaults_reach_handle() {
    let h = Harness::with_config(RequestConfig {
        default_timeout_secs: Some(5),
        redirect_limit: 3,
    });

    let handle = h.manager.get("http://example.test/config");
    assert_eq!(handle.timeout(), Some(Duration::from_secs(5)));
    assert_eq!(handle.redirect_limit(), 3);

    handle
        .set_timeout(Duration::from_millis(250))
        .set_redirect_limit(0)
        .send()
        .unwrap();
    h.cycle();

    let request = &h.transport.started()[0];
    assert_eq!(request.timeout, Some(Duration::from_millis(250)));
    assert_eq!(request.redirect_limit, 0);
}

#[test]
fn test_default_redirect_limit() {
    let h = Harness::new();
    assert_eq!(h.manager.get("http://t").redirect_limit(), DEFAULT_REDIRECT_LIMIT);
    assert_eq!(DEFAULT_REDIRECT_LIMIT, 32);
}
