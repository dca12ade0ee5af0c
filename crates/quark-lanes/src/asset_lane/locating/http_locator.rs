// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use anyhow::{Context, Result};
use quark_core::asset::{AssetLocator, ByteStream, LocateCallback, LocateError};
use reqwest::{Client, RequestBuilder};
use std::{io::Cursor, time::Duration};
use tokio::runtime::Handle;

/// Locates resources over HTTP(S) relative to a base URL.
///
/// Asynchronous only. Requests run on the given tokio runtime; the completion
/// callback is handed to the runtime's blocking pool so whatever it does
/// (typically decoding) never stalls an async worker.
#[derive(Debug, Clone)]
pub struct HttpLocator {
    base_url: String,
    client: Client,
    runtime: Handle,
}

impl HttpLocator {
    /// Creates a locator issuing requests below `base_url` with the given
    /// per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration, runtime: Handle) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.into(),
            client,
            runtime,
        })
    }

    /// The full URL `name` resolves to.
    pub fn url(&self, name: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            name.trim_start_matches('/')
        )
    }
}

async fn fetch(request: RequestBuilder) -> Result<ByteStream, LocateError> {
    let response = request
        .send()
        .await
        .map_err(|e| LocateError::Io(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(LocateError::Transport {
            status: status.as_u16(),
        });
    }
    let body = response
        .bytes()
        .await
        .map_err(|e| LocateError::Io(e.to_string()))?;
    Ok(Box::new(Cursor::new(body)))
}

impl AssetLocator for HttpLocator {
    fn supports_synchronous(&self) -> bool {
        false
    }

    fn supports_asynchronous(&self) -> bool {
        true
    }

    fn locate(&self, _name: &str) -> Result<Option<ByteStream>, LocateError> {
        Err(LocateError::NotSupported)
    }

    fn locate_async(&self, name: &str, on_done: LocateCallback) {
        let url = self.url(name);
        log::debug!("GET {url}");
        let request = self.client.get(url);
        let runtime = self.runtime.clone();
        self.runtime.spawn(async move {
            let result = fetch(request).await;
            runtime.spawn_blocking(move || on_done(result));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        runtime::{Builder, Runtime},
    };

    fn runtime() -> Runtime {
        Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap()
    }

    /// Serves a single canned HTTP response and returns the base URL.
    fn serve_once(runtime: &Runtime, response: &'static str) -> String {
        let listener = runtime
            .block_on(TcpListener::bind("127.0.0.1:0"))
            .unwrap();
        let addr = listener.local_addr().unwrap();
        runtime.spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{addr}/assets/")
    }

    fn locate(locator: &HttpLocator, name: &str) -> Result<Vec<u8>, LocateError> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        locator.locate_async(
            name,
            Box::new(move |result| {
                let bytes = result.map(|mut stream| {
                    let mut bytes = Vec::new();
                    stream.read_to_end(&mut bytes).unwrap();
                    bytes
                });
                tx.send(bytes).unwrap();
            }),
        );
        rx.recv_timeout(Duration::from_secs(10)).unwrap()
    }

    #[test]
    fn test_success_delivers_body() {
        let runtime = runtime();
        let base = serve_once(
            &runtime,
            "HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
        );
        let locator =
            HttpLocator::new(base, Duration::from_secs(5), runtime.handle().clone()).unwrap();
        assert_eq!(locate(&locator, "a.bin").unwrap(), b"hello");
    }

    #[test]
    fn test_error_status_maps_to_transport() {
        let runtime = runtime();
        let base = serve_once(
            &runtime,
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        let locator =
            HttpLocator::new(base, Duration::from_secs(5), runtime.handle().clone()).unwrap();
        assert_eq!(
            locate(&locator, "missing.png"),
            Err(LocateError::Transport { status: 404 })
        );
    }

    #[test]
    fn test_synchronous_mode_is_not_supported() {
        let runtime = runtime();
        let locator = HttpLocator::new(
            "http://localhost",
            Duration::from_secs(1),
            runtime.handle().clone(),
        )
        .unwrap();
        assert!(matches!(
            locator.locate("a.png"),
            Err(LocateError::NotSupported)
        ));
        assert_eq!(locator.url("/a.png"), "http://localhost/a.png");
    }
}
