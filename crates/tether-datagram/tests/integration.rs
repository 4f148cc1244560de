//! Integration tests for the datagram client and server.
//!
//! Servers bind port 0 and the tests discover the assigned port through
//! `local_addr`. Loopback delivery is reliable in practice, but sends are
//! still retried under a deadline so a dropped datagram cannot wedge a test.

use std::{
    net::SocketAddr,
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use tether_core::{DatagramHandler, ErrorKind, Service};
use tether_datagram::{DatagramClient, DatagramServer};

const STARTUP_DEADLINE: Duration = Duration::from_secs(5);

fn wait_for_addr(service: &dyn Service) -> SocketAddr {
    let deadline = Instant::now() + STARTUP_DEADLINE;
    loop {
        if let Some(addr) = service.local_addr() {
            return addr;
        }
        assert!(Instant::now() < deadline, "server did not come up in time");
        thread::sleep(Duration::from_millis(1));
    }
}

fn start_echo_server() -> (Arc<DatagramServer>, thread::JoinHandle<tether_core::Result<()>>) {
    let server = Arc::new(DatagramServer::echo());
    let runner = Arc::clone(&server);
    let handle = thread::spawn(move || runner.start(0));
    wait_for_addr(&*server);
    (server, handle)
}

/// Sends `payload` until a reply shows up, re-sending every 100 ms in case a
/// datagram went missing. Panics past the deadline.
fn exchange(client: &DatagramClient, payload: &[u8]) -> (Vec<u8>, SocketAddr) {
    let deadline = Instant::now() + STARTUP_DEADLINE;
    loop {
        client.send(payload).unwrap();

        let attempt_deadline = Instant::now() + Duration::from_millis(100);
        while Instant::now() < attempt_deadline {
            if let Some(reply) = client.receive().unwrap() {
                return reply;
            }
            thread::sleep(Duration::from_millis(1));
        }
        assert!(Instant::now() < deadline, "no echo reply before deadline");
    }
}

#[test]
fn test_echo_round_trip() {
    let (server, handle) = start_echo_server();
    let port = server.local_addr().unwrap().port();

    let client = DatagramClient::with_destination("127.0.0.1", port).unwrap();
    let (payload, sender) = exchange(&client, b"ping");
    assert_eq!(payload, b"ping");
    assert_eq!(sender.port(), port);

    server.stop();
    handle.join().unwrap().unwrap();
}

#[test]
fn test_available_byte_count_sees_pending_datagram() {
    let (server, handle) = start_echo_server();
    let port = server.local_addr().unwrap().port();

    let client = DatagramClient::with_destination("127.0.0.1", port).unwrap();
    client.send(b"sized").unwrap();

    let deadline = Instant::now() + STARTUP_DEADLINE;
    loop {
        let available = client.available_byte_count().unwrap();
        if available > 0 {
            assert_eq!(available, 5);
            break;
        }
        assert!(Instant::now() < deadline, "echo reply never became visible");
        thread::sleep(Duration::from_millis(1));
    }

    // The peek did not consume it.
    let (payload, _) = client.receive().unwrap().unwrap();
    assert_eq!(payload, b"sized");
    assert_eq!(client.available_byte_count().unwrap(), 0);

    server.stop();
    handle.join().unwrap().unwrap();
}

#[test]
fn test_stop_is_idempotent_and_prompt() {
    let server = Arc::new(DatagramServer::echo());
    server.stop(); // stopping a non-running server isn't an error

    let runner = Arc::clone(&server);
    let handle = thread::spawn(move || runner.start(0));
    wait_for_addr(&*server);
    assert!(server.is_running());

    let stop_started = Instant::now();
    server.stop();
    handle.join().unwrap().unwrap();
    assert!(stop_started.elapsed() < Duration::from_secs(2));

    server.stop(); // already stopped, still a no-op
    assert!(!server.is_running());
}

#[test]
fn test_restart_leaves_one_server_on_port() {
    let server = Arc::new(DatagramServer::echo());

    let first = Arc::clone(&server);
    let first_handle = thread::spawn(move || first.start(0));
    let addr = wait_for_addr(&*server);

    // Second start on the same port while the first loop is active: the
    // first run must end and exactly one functioning server stays bound.
    let second = Arc::clone(&server);
    let second_handle = thread::spawn(move || second.start(addr.port()));
    first_handle.join().unwrap().unwrap();
    let rebound = wait_for_addr(&*server);
    assert_eq!(rebound.port(), addr.port());

    let client = DatagramClient::with_destination("127.0.0.1", addr.port()).unwrap();
    let (payload, _) = exchange(&client, b"after restart");
    assert_eq!(payload, b"after restart");

    server.stop();
    second_handle.join().unwrap().unwrap();
}

#[test]
fn test_server_starts_again_after_full_stop() {
    let server = Arc::new(DatagramServer::echo());

    let first = Arc::clone(&server);
    let handle = thread::spawn(move || first.start(0));
    wait_for_addr(&*server);
    server.stop();
    handle.join().unwrap().unwrap();

    let second = Arc::clone(&server);
    let handle = thread::spawn(move || second.start(0));
    wait_for_addr(&*server);
    assert!(server.is_running());

    server.stop();
    handle.join().unwrap().unwrap();
}

#[test]
fn test_custom_handler_receives_sender_and_payload() {
    struct Recording {
        events: crossbeam_channel::Sender<(SocketAddr, Vec<u8>)>,
    }

    impl DatagramHandler for Recording {
        fn on_datagram(&mut self, sender: SocketAddr, payload: &[u8]) -> Option<Vec<u8>> {
            self.events.send((sender, payload.to_vec())).expect("receiver alive");
            None
        }
    }

    let (sender, receiver) = crossbeam_channel::unbounded();
    let server = Arc::new(DatagramServer::with_handler(Box::new(Recording { events: sender })));
    let runner = Arc::clone(&server);
    let handle = thread::spawn(move || runner.start(0));
    let addr = wait_for_addr(&*server);

    let client = DatagramClient::with_destination("127.0.0.1", addr.port()).unwrap();

    // No reply comes back from this handler, so only the channel tells us
    // the datagram arrived; retry until it does.
    let deadline = Instant::now() + STARTUP_DEADLINE;
    let (peer, payload) = loop {
        client.send(b"observed").unwrap();
        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => break event,
            Err(_) => assert!(Instant::now() < deadline, "datagram never dispatched"),
        }
    };
    assert_eq!(payload, b"observed");
    assert_eq!(peer.ip().to_string(), "127.0.0.1");

    server.stop();
    handle.join().unwrap().unwrap();
}
