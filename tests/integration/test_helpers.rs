// tests/integration/test_helpers.rs

//! Test helpers: a real relay on an ephemeral port and a line-oriented test client.

use chatrelay::config::{AuthMode, Config};
use chatrelay::core::protocol::{InboundFrame, LineFramed, framed_lines, messages};
use chatrelay::core::state::ServerState;
use chatrelay::server;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// How long a test waits for a line it expects.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(3);
/// How long a test waits to be confident a line is *not* coming.
pub const SILENCE_WINDOW: Duration = Duration::from_millis(200);

/// A relay running in the background for the duration of a test.
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: Arc<ServerState>,
    pub credentials_path: PathBuf,
    task: JoinHandle<()>,
    _data_dir: TempDir,
}

impl TestServer {
    /// Starts a server using the given handshake with default settings.
    pub async fn start(mode: AuthMode) -> Self {
        Self::start_with(mode, |_| {}).await
    }

    /// Starts a server after letting the test tweak the configuration.
    pub async fn start_with(mode: AuthMode, customize: impl FnOnce(&mut Config)) -> Self {
        let _ = tracing_subscriber::registry()
            .with(EnvFilter::new("warn"))
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();

        let data_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let credentials_path = data_dir.path().join("users.json");

        let mut config = Config::default();
        config.host = "127.0.0.1".to_string();
        config.port = 0;
        config.auth.mode = mode;
        config.auth.credentials_file = credentials_path.to_string_lossy().into_owned();
        customize(&mut config);

        let ctx = server::setup(config)
            .await
            .expect("Failed to set up test server");
        let addr = ctx.local_addr().expect("Listener has no address");
        let state = ctx.state.clone();
        let task = tokio::spawn(server::serve(ctx));

        Self {
            addr,
            state,
            credentials_path,
            task,
            _data_dir: data_dir,
        }
    }

    pub async fn connect(&self) -> TestClient {
        let stream = TcpStream::connect(self.addr)
            .await
            .expect("Failed to connect to test server");
        TestClient {
            framed: framed_lines(stream, 64 * 1024),
        }
    }

    /// Connects and completes the name-only handshake as `name`.
    pub async fn join_by_name(&self, name: &str) -> TestClient {
        let mut client = self.connect().await;
        client.send(name).await;
        client.expect(messages::WELCOME).await;
        client.recv().await;
        client
    }

    /// Connects and completes the password handshake, registering if needed.
    pub async fn join_with_password(&self, name: &str, password: &str) -> TestClient {
        let mut client = self.connect().await;
        client.send(name).await;
        client.send(password).await;
        let mut reply = client.recv().await;
        if reply == messages::PASSWORD_PROMPT {
            reply = client.recv().await;
        }
        assert_eq!(reply, messages::WELCOME);
        client.recv().await;
        client
    }

    /// Waits until the registry holds exactly `expected` sessions.
    pub async fn wait_for_sessions(&self, expected: usize) {
        let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
        while self.state.registry.len() != expected {
            assert!(
                tokio::time::Instant::now() < deadline,
                "registry has {} sessions, expected {}",
                self.state.registry.len(),
                expected
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A raw line client talking to the test server.
pub struct TestClient {
    framed: LineFramed<TcpStream>,
}

impl TestClient {
    pub async fn send(&mut self, line: &str) {
        self.framed.send(line).await.expect("Failed to send line");
    }

    /// The next line, or `None` if the server closed the connection.
    /// Panics if nothing arrives in time.
    pub async fn try_recv(&mut self) -> Option<String> {
        match tokio::time::timeout(RECV_TIMEOUT, self.framed.next()).await {
            Ok(Some(Ok(InboundFrame::Line(line)))) => Some(line),
            Ok(Some(Ok(InboundFrame::TooLong))) => panic!("server sent an over-long line"),
            Ok(Some(Err(_))) | Ok(None) => None,
            Err(_) => panic!("timed out waiting for a line from the server"),
        }
    }

    pub async fn recv(&mut self) -> String {
        self.try_recv()
            .await
            .expect("server closed the connection unexpectedly")
    }

    pub async fn expect(&mut self, expected: &str) {
        assert_eq!(self.recv().await, expected);
    }

    /// Asserts that no line arrives within the silence window.
    pub async fn expect_silence(&mut self) {
        if let Ok(Some(Ok(frame))) = tokio::time::timeout(SILENCE_WINDOW, self.framed.next()).await
        {
            panic!("expected silence, got {frame:?}");
        }
    }

    /// Asserts that the server closes this connection.
    pub async fn expect_closed(&mut self) {
        assert_eq!(self.try_recv().await, None, "expected the connection to be closed");
    }
}

/// Strips the `[hh:mm:ss] ` prefix, asserting it is well formed.
pub fn strip_timestamp(line: &str) -> &str {
    let bytes = line.as_bytes();
    assert!(bytes.len() >= 11, "line too short for a timestamp: {line:?}");
    assert_eq!(bytes[0], b'[', "missing timestamp in {line:?}");
    assert_eq!(bytes[9], b']', "missing timestamp in {line:?}");
    assert_eq!(bytes[10], b' ', "missing timestamp in {line:?}");
    for (i, b) in bytes[1..9].iter().enumerate() {
        if i == 2 || i == 5 {
            assert_eq!(*b, b':', "malformed timestamp in {line:?}");
        } else {
            assert!(b.is_ascii_digit(), "malformed timestamp in {line:?}");
        }
    }
    &line[11..]
}
