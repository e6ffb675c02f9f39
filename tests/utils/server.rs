#![allow(dead_code)] // Test utilities may not all be used in every test

use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::time::{timeout, Duration};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use canvas_relay::{server, AppState, Message, RelayConfig};

const RECEIVE_TIMEOUT: Duration = Duration::from_secs(2);

// ============================================================================
// Real relay on an ephemeral port
// ============================================================================

pub struct TestServer {
    pub addr: SocketAddr,
    pub state: AppState,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(RelayConfig::default()).await
    }

    pub async fn start_with(config: RelayConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        Self::start_on(listener, config).await
    }

    /// Serve on a listener the caller already bound
    pub async fn start_on(listener: TcpListener, config: RelayConfig) -> Self {
        let addr = listener.local_addr().unwrap();
        let state = AppState::new(config);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let serve_state = state.clone();
        tokio::spawn(async move {
            server::serve(listener, serve_state, async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
        });

        Self {
            addr,
            state,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn url(&self) -> String {
        format!("ws://{}{}", self.addr, self.state.config.ws_path)
    }

    pub async fn connect(&self) -> TestClient {
        TestClient::connect(&self.url()).await
    }

    /// Wait until the relay has registered `expected` connections
    pub async fn wait_for_participants(&self, expected: usize) {
        timeout(RECEIVE_TIMEOUT, async {
            while self.state.relay.participant_count().await != expected {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("relay never reached {} participants", expected));
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

// ============================================================================
// Raw WebSocket client
// ============================================================================

pub struct TestClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    pub async fn connect(url: &str) -> Self {
        let (stream, _) = connect_async(url).await.expect("relay should accept connection");
        Self { stream }
    }

    pub async fn send_raw(&mut self, frame: &str) {
        self.stream
            .send(WsMessage::Text(frame.to_string()))
            .await
            .unwrap();
    }

    pub async fn send(&mut self, message: &Message) {
        self.send_raw(&message.encode().unwrap()).await;
    }

    /// Next relay message, failing the test after a timeout
    pub async fn recv(&mut self) -> Message {
        let frame = timeout(RECEIVE_TIMEOUT, async {
            loop {
                match self.stream.next().await {
                    Some(Ok(WsMessage::Text(text))) => return text,
                    Some(Ok(WsMessage::Close(_))) | None => panic!("relay closed the connection"),
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => panic!("transport error: {}", e),
                }
            }
        })
        .await
        .expect("timed out waiting for relay message");

        Message::decode(&frame).unwrap()
    }

    /// Assert nothing arrives for a short while
    pub async fn expect_silence(&mut self) {
        let result = timeout(Duration::from_millis(150), self.stream.next()).await;
        assert!(result.is_err(), "expected no message, got {:?}", result);
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}
