use q2_mapbot_core::contract::Downloader;
use q2_mapbot_core::download::HttpDownloader;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Serves one HTTP request with a fixed status line and body.
async fn serve_once(status: &'static str, body: &'static [u8]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 1024];
        let _ = stream.read(&mut request).await.unwrap();
        let head = format!(
            "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        stream.write_all(head.as_bytes()).await.unwrap();
        stream.write_all(body).await.unwrap();
        stream.shutdown().await.unwrap();
    });
    format!("http://{address}/attachments/1/2/q2dm1.bsp?ex=1")
}

#[tokio::test]
async fn downloads_body_bytes() {
    let url = serve_once("200 OK", b"IBSP\x26\x00\x00\x00").await;

    let bytes = HttpDownloader::new().download(&url).await.unwrap();

    assert_eq!(bytes, b"IBSP\x26\x00\x00\x00");
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let url = serve_once("404 Not Found", b"gone").await;

    let err = HttpDownloader::new().download(&url).await.unwrap_err();

    assert!(err.to_string().contains("404"), "{err}");
}

#[tokio::test]
async fn unreachable_host_is_an_error() {
    let address = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let result = HttpDownloader::new()
        .download(&format!("http://{address}/missing.zip"))
        .await;

    assert!(result.is_err());
}
