//! Fetching documents from the content-addressed store through an HTTP gateway.
use std::time::Duration;

use anyhow::bail;
use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use bytes::BytesMut;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Anything able to serve the content of an IPFS path (`<cid>` or `<cid>/<file>`).
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(
        &self,
        path: &str,
    ) -> anyhow::Result<Bytes>;
}

/// Fetches `path` and parses it as JSON.
pub async fn fetch_json<T: DeserializeOwned>(
    fetcher: &dyn ContentFetcher,
    path: &str,
) -> anyhow::Result<T> {
    let bytes = fetcher.fetch(path).await?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing `{path}` as JSON"))
}

/// Largest document [`HttpGateway`] reads unless told otherwise.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Reads through a public or local IPFS HTTP gateway, i.e. `GET <base>/ipfs/<path>`.
#[derive(Clone, Debug)]
pub struct HttpGateway {
    base_url: String,
    client: reqwest::Client,
    max_body_bytes: usize,
}

impl HttpGateway {
    pub fn new(
        base_url: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build reqwest client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        })
    }

    /// Bodies larger than `max_body_bytes` are rejected instead of being buffered.
    pub fn with_max_body_bytes(
        mut self,
        max_body_bytes: usize,
    ) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn url(
        &self,
        path: &str,
    ) -> String {
        format!("{}/ipfs/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl ContentFetcher for HttpGateway {
    async fn fetch(
        &self,
        path: &str,
    ) -> anyhow::Result<Bytes> {
        let url = self.url(path);
        debug!("Fetching {url}");

        let mut response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("fetching `{url}`"))?;

        if !response.status().is_success() {
            bail!("fetching `{url}`: gateway answered {}", response.status());
        }

        if let Some(length) = response.content_length() {
            if length > self.max_body_bytes as u64 {
                bail!(
                    "fetching `{url}`: body of {length} bytes is larger than {} bytes",
                    self.max_body_bytes
                );
            }
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .with_context(|| format!("reading body of `{url}`"))?
        {
            if body.len() + chunk.len() > self.max_body_bytes {
                bail!(
                    "fetching `{url}`: body is larger than {} bytes",
                    self.max_body_bytes
                );
            }
            body.extend_from_slice(&chunk);
        }
        let body = body.freeze();

        debug!("Fetched {url}, {} bytes", body.len());
        Ok(body)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::net::SocketAddr;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;
    use std::time::Instant;

    use anyhow::anyhow;
    use serde_json::json;
    use serde_json::Value;
    use tokio::io::AsyncReadExt;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    use super::*;

    /// Accepts connections and never answers them.
    pub(crate) async fn silent_listener() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });
        addr
    }

    /// Answers every connection with the same raw HTTP response.
    async fn canned_server(response: String) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut request = [0u8; 4096];
                let _ = socket.read(&mut request).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        addr
    }

    /// Serves canned documents by path and counts requests.
    #[derive(Default)]
    pub(crate) struct StaticFetcher {
        documents: HashMap<String, Bytes>,
        pub(crate) requests: AtomicUsize,
    }

    impl StaticFetcher {
        pub(crate) fn with_json(
            mut self,
            path: &str,
            document: Value,
        ) -> Self {
            self.documents
                .insert(path.to_string(), Bytes::from(document.to_string()));
            self
        }

        pub(crate) fn with_raw(
            mut self,
            path: &str,
            body: &'static str,
        ) -> Self {
            self.documents
                .insert(path.to_string(), Bytes::from_static(body.as_bytes()));
            self
        }
    }

    #[async_trait]
    impl ContentFetcher for StaticFetcher {
        async fn fetch(
            &self,
            path: &str,
        ) -> anyhow::Result<Bytes> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            self.documents
                .get(path)
                .cloned()
                .ok_or_else(|| anyhow!("fetching `{path}`: gateway answered 404 Not Found"))
        }
    }

    #[test]
    fn test_gateway_url() {
        let gateway = HttpGateway::new("https://ipfs.sc2.nl/", Duration::from_secs(1)).unwrap();
        assert_eq!(gateway.url("Qm1"), "https://ipfs.sc2.nl/ipfs/Qm1");
        assert_eq!(
            gateway.url("/bafy/eip155-1.json"),
            "https://ipfs.sc2.nl/ipfs/bafy/eip155-1.json"
        );
    }

    #[tokio::test]
    async fn test_fetch_json() {
        let fetcher = StaticFetcher::default()
            .with_json("good", json!({ "a": 1 }))
            .with_raw("bad", "{ not json");

        let value: Value = fetch_json(&fetcher, "good").await.unwrap();
        assert_eq!(value, json!({ "a": 1 }));

        let err = fetch_json::<Value>(&fetcher, "bad").await.unwrap_err();
        assert!(format!("{err:#}").contains("parsing `bad` as JSON"));

        assert!(fetch_json::<Value>(&fetcher, "missing").await.is_err());
    }

    #[tokio::test]
    async fn test_unreachable_gateway() {
        // Port 9 (discard) is closed on any sane test machine.
        let gateway =
            HttpGateway::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let err = gateway.fetch("Qm1").await.unwrap_err();
        assert!(format!("{err:#}").contains("fetching `http://127.0.0.1:9/ipfs/Qm1`"));
    }

    #[tokio::test]
    async fn test_gateway_timeout() {
        let addr = silent_listener().await;
        let gateway =
            HttpGateway::new(&format!("http://{addr}"), Duration::from_millis(300)).unwrap();

        let start = Instant::now();
        let err = gateway.fetch("Qm1").await.unwrap_err();

        assert!(start.elapsed() < Duration::from_secs(5), "{:?}", start.elapsed());
        assert!(format!("{err:#}").contains("fetching `http://"), "{err:#}");
    }

    #[tokio::test]
    async fn test_body_within_limit() {
        let body = r#"{"a":1}"#;
        let addr = canned_server(format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        ))
        .await;
        let gateway = HttpGateway::new(&format!("http://{addr}"), Duration::from_secs(5))
            .unwrap()
            .with_max_body_bytes(body.len());

        let value: Value = fetch_json(&gateway, "Qm1").await.unwrap();
        assert_eq!(value, json!({ "a": 1 }));
    }

    #[tokio::test]
    async fn test_declared_body_over_limit() {
        let addr = canned_server(format!(
            "HTTP/1.1 200 OK\r\nContent-Length: 64\r\nConnection: close\r\n\r\n{}",
            "a".repeat(64)
        ))
        .await;
        let gateway = HttpGateway::new(&format!("http://{addr}"), Duration::from_secs(5))
            .unwrap()
            .with_max_body_bytes(16);

        let err = gateway.fetch("Qm1").await.unwrap_err();
        assert!(format!("{err:#}").contains("larger than 16 bytes"), "{err:#}");
    }

    #[tokio::test]
    async fn test_chunked_body_over_limit() {
        let chunk = "a".repeat(32);
        let addr = canned_server(format!(
            "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n\
             {:x}\r\n{chunk}\r\n0\r\n\r\n",
            chunk.len()
        ))
        .await;
        let gateway = HttpGateway::new(&format!("http://{addr}"), Duration::from_secs(5))
            .unwrap()
            .with_max_body_bytes(16);

        let err = gateway.fetch("Qm1").await.unwrap_err();
        assert!(format!("{err:#}").contains("larger than 16 bytes"), "{err:#}");
    }
}
