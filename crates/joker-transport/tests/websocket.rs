//! Integration tests for the WebSocket transport.
//!
//! These spin up a real listener on an OS-assigned port and drive it with
//! a `tokio-tungstenite` client.

#[cfg(feature = "websocket")]
mod websocket {
    use futures_util::{SinkExt, StreamExt};
    use joker_transport::{
        Connection, Transport, TransportError, WebSocketTransport,
    };
    use std::time::Duration;
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn bind() -> (WebSocketTransport, String) {
        let transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("local addr").to_string();
        (transport, addr)
    }

    async fn connect_client(url: &str) -> ClientWs {
        let (ws, _) = tokio_tungstenite::connect_async(url)
            .await
            .expect("client should connect");
        ws
    }

    #[tokio::test]
    async fn test_accept_captures_request_target() {
        let (mut transport, addr) = bind().await;
        let server = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let _client =
            connect_client(&format!("ws://{addr}/ws/games/AB12CD?player_id=7"))
                .await;
        let accepted = server.await.expect("task should complete");

        assert_eq!(accepted.target, "/ws/games/AB12CD?player_id=7");
        assert!(accepted.connection.id().into_inner() > 0);
    }

    #[tokio::test]
    async fn test_send_text_and_receive() {
        let (mut transport, addr) = bind().await;
        let server = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let mut client = connect_client(&format!("ws://{addr}/")).await;
        let conn = server.await.unwrap().connection;

        conn.send_text(r#"{"type":"player_safe","data":{}}"#)
            .await
            .expect("send should succeed");
        let msg = client.next().await.unwrap().unwrap();
        assert!(msg.is_text());
        assert_eq!(msg.into_text().unwrap().as_str(), r#"{"type":"player_safe","data":{}}"#);

        client
            .send(Message::text("ping from client"))
            .await
            .unwrap();
        let received = conn
            .recv()
            .await
            .expect("recv should succeed")
            .expect("should have data");
        assert_eq!(received, b"ping from client");

        conn.close().await.expect("close should succeed");
    }

    #[tokio::test]
    async fn test_send_does_not_wait_for_pending_recv() {
        let (mut transport, addr) = bind().await;
        let server = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let mut client = connect_client(&format!("ws://{addr}/")).await;
        let conn = std::sync::Arc::new(server.await.unwrap().connection);

        // A reader parked in recv() must not starve the writer.
        let reader = {
            let conn = std::sync::Arc::clone(&conn);
            tokio::spawn(async move { conn.recv().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        tokio::time::timeout(Duration::from_secs(1), conn.send_text("hi"))
            .await
            .expect("send should not block behind recv")
            .expect("send should succeed");
        let msg = client.next().await.unwrap().unwrap();
        assert_eq!(msg.into_text().unwrap().as_str(), "hi");

        client.send(Message::Close(None)).await.unwrap();
        let result = reader.await.unwrap().expect("recv should not error");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_recv_returns_none_on_client_close() {
        let (mut transport, addr) = bind().await;
        let server = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let mut client = connect_client(&format!("ws://{addr}/")).await;
        let conn = server.await.unwrap().connection;

        client.send(Message::Close(None)).await.unwrap();

        let result = conn.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_handshake_timeout() {
        let (transport, addr) = bind().await;
        let mut transport =
            transport.with_handshake_timeout(Duration::from_millis(50));
        let server = tokio::spawn(async move { transport.accept().await });

        // A raw TCP client that never sends the upgrade request.
        let _raw = tokio::net::TcpStream::connect(&addr).await.unwrap();

        let result = server.await.unwrap();
        assert!(matches!(result, Err(TransportError::HandshakeTimeout)));
    }
}
