use super::super::*;
use super::{Harness, events, observe};

#[test]
fn test_progress_reported_only_when_increasing() {
    let h = Harness::new();
    let log = events();
    let uri = "http://example.test/download";
    let control = h.transport.control(uri);

    observe(h.manager.get(uri), &log).send().unwrap();
    h.cycle();

    for value in [0.25, 0.25, 0.1, 0.5, f32::NAN, 0.75] {
        control.lock().progress(0.0, value);
        h.cycle();
    }

    let downloads: Vec<_> = log
        .lock()
        .iter()
        .filter(|e| e.starts_with("down"))
        .cloned()
        .collect();
    assert_eq!(downloads, vec!["down:0.25", "down:0.5", "down:0.75"]);
}

#[test]
fn test_progress_is_clamped() {
    let h = Harness::new();
    let log = events();
    let uri = "http://example.test/clamp";
    let control = h.transport.control(uri);

    let sent = observe(h.manager.get(uri), &log).send().unwrap();
    h.cycle();
    control.lock().progress(-1.0, 3.5);
    h.cycle();

    assert_eq!(*log.lock(), vec!["down:1".to_string()]);
    assert_eq!(sent.progress(), (0.0, 1.0));
}

#[test]
fn test_upload_reported_before_download() {
    let h = Harness::new();
    let log = events();
    let uri = "http://example.test/both";
    let control = h.transport.control(uri);

    observe(h.manager.put_str(uri, "payload"), &log).send().unwrap();
    h.cycle();
    control.lock().progress(0.5, 0.2);
    h.cycle();

    assert_eq!(*log.lock(), vec!["up:0.5", "down:0.2"]);
}

#[test]
fn test_final_progress_flushed_before_terminal_callback() {
    let h = Harness::new();
    let log = events();
    let uri = "http://example.test/flush";
    let control = h.transport.control(uri);

    observe(h.manager.get(uri), &log).send().unwrap();
    h.cycle();
    control.lock().progress(0.0, 0.4);
    h.cycle();

    // Completes between ticks; the drive cycle must report 1.0 first.
    {
        let mut control = control.lock();
        control.progress(1.0, 1.0);
        control.succeed(200, "done");
    }
    h.scheduler.drive();

    assert_eq!(
        *log.lock(),
        vec!["down:0.4", "up:1", "down:1", "success:200"]
    );
}

#[test]
fn test_tick_skips_requests_not_in_flight() {
    let h = Harness::new();
    let uri = "http://example.test/pending";
    let control = h.transport.control(uri);

    h.manager.get(uri).send().unwrap();
    assert_eq!(h.manager.tick(), 0);

    h.scheduler.drive();
    assert_eq!(h.manager.tick(), 1);
    assert_eq!(control.lock().polls, 1);
}

#[test]
fn test_no_progress_after_terminal() {
    let h = Harness::new();
    let log = events();
    let uri = "http://example.test/after";
    let control = h.transport.control(uri);
    control.lock().succeed(200, "");

    observe(h.manager.get(uri), &log).send().unwrap();
    h.cycles(2);
    control.lock().progress(1.0, 1.0);
    h.cycles(2);

    assert_eq!(*log.lock(), vec!["success:200".to_string()]);
}
