use std::{
    sync::{mpsc, Arc},
    thread,
    time::{Duration, Instant},
};

use libc::{SIGINT, SIGTERM};
use libinterrupt::{
    InterruptHandler, InterruptMonitor, InterruptState, SignalListener,
};

mod common;
use common::{SharedBuf, SETTLE};

#[test]
fn stop_now_scenario() {
    let buf = SharedBuf::default();
    let (tx, rx) = mpsc::channel();
    let handler = InterruptHandler::with_source(rx, buf.clone()).unwrap();

    let h0 = handler.status();
    assert!(!h0.interrupted);

    handler.set_message("stop now");
    tx.send(SIGINT).unwrap();
    assert!(h0.notifier.wait_timeout(SETTLE));

    let h1 = handler.status();
    assert!(h1.interrupted);
    assert_ne!(h1.notifier, h0.notifier);
    assert!(h0.notifier.is_fired());
    assert!(!h1.notifier.is_fired());
    assert_eq!(buf.writes_of("stop now"), 1);

    drop(tx);
    handler.shutdown().unwrap();
}

#[test]
fn every_signal_is_handled() {
    let buf = SharedBuf::default();
    let (tx, rx) = mpsc::channel();
    let handler = InterruptHandler::with_source(rx, buf.clone()).unwrap();
    handler.set_message("MSG-AGAIN");

    for &sig in &[SIGINT, SIGTERM, SIGINT] {
        let status = handler.status();
        tx.send(sig).unwrap();
        assert!(status.notifier.wait_timeout(SETTLE), "signal {}", sig);
    }

    assert_eq!(buf.writes_of("MSG-AGAIN"), 3);
    drop(tx);
    handler.shutdown().unwrap();
}

#[test]
fn no_signal_means_no_interrupt() {
    let (tx, rx) = mpsc::channel::<i32>();
    let handler =
        InterruptHandler::with_source(rx, SharedBuf::default()).unwrap();

    let status = handler.status();
    assert!(!status.interrupted);
    assert!(!status.wait_timeout(Duration::from_millis(100)));
    assert!(!handler.status().interrupted);

    drop(tx);
    handler.shutdown().unwrap();
}

#[test]
fn monitor_shares_state_with_handler() {
    let (tx, rx) = mpsc::channel();
    let handler =
        InterruptHandler::with_source(rx, SharedBuf::default()).unwrap();
    let monitor = handler.monitor();

    let status = monitor.status();
    tx.send(SIGTERM).unwrap();
    assert!(status.wait_timeout(SETTLE));
    assert!(handler.status().interrupted);
    assert!(monitor.status().interrupted);

    drop(tx);
    handler.shutdown().unwrap();
}

#[test]
fn listener_exits_when_source_closes() {
    let state = Arc::new(InterruptState::new(SharedBuf::default()));
    let (tx, rx) = mpsc::channel();
    let listener = SignalListener::spawn(Arc::clone(&state), rx).unwrap();

    let status = state.status();
    tx.send(SIGINT).unwrap();
    assert!(status.notifier.wait_timeout(SETTLE));
    assert!(!listener.is_finished());

    drop(tx);
    let deadline = Instant::now() + SETTLE;
    while !listener.is_finished() {
        assert!(Instant::now() < deadline, "listener still running");
        thread::sleep(Duration::from_millis(5));
    }

    listener.join().unwrap();
    assert!(state.status().interrupted);
}
