use std::{io::Read, time::Duration};

use futures::{future::BoxFuture, FutureExt};
use log::{debug, warn};
use tokio::task;

use crate::error::SourceError;

use super::{report, AssetSource, ProgressSender, STATUS_NOT_FOUND};

const READ_CHUNK: usize = 64 * 1024;
/// Upper bound of the buffer reserved up front from `Content-Length`.
const MAX_PREALLOCATION: u64 = 16 << 20;

fn initial_capacity(total: Option<u64>) -> usize {
    total.map_or(0, |total| total.min(MAX_PREALLOCATION) as usize)
}

/// Serves asset paths from an HTTP origin, e.g. `https://example.com`.
///
/// `ureq` is blocking, so every request runs on the blocking pool of the
/// runtime driving the returned future.
#[derive(Debug, Clone)]
pub struct HttpSource {
    origin: String,
    agent: ureq::Agent,
}

impl HttpSource {
    pub fn new(origin: &str) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(Duration::from_secs(30))
            .build();
        Self {
            origin: origin.trim_end_matches('/').to_string(),
            agent,
        }
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.origin, path)
        } else {
            format!("{}/{}", self.origin, path)
        }
    }
}

fn convert_error(path: &str, error: ureq::Error) -> SourceError {
    match error {
        ureq::Error::Status(STATUS_NOT_FOUND, _) => SourceError::NotFound(path.to_string()),
        ureq::Error::Status(code, _) => SourceError::Status(path.to_string(), code),
        ureq::Error::Transport(transport) => SourceError::Transport(transport.to_string()),
    }
}

impl AssetSource for HttpSource {
    fn probe(&self, path: &str) -> BoxFuture<'static, Result<u16, SourceError>> {
        let agent = self.agent.clone();
        let url = self.url(path);
        async move {
            let status = task::spawn_blocking(move || match agent.head(&url).call() {
                Ok(response) => Ok(response.status()),
                // Status errors are an answer, not a failure, for a probe.
                Err(ureq::Error::Status(code, _)) => Ok(code),
                Err(ureq::Error::Transport(transport)) => {
                    Err(SourceError::Transport(transport.to_string()))
                }
            })
            .await
            .map_err(|_| SourceError::Aborted)??;
            Ok(status)
        }
        .boxed()
    }

    fn fetch(
        &self,
        path: &str,
        progress: Option<ProgressSender>,
    ) -> BoxFuture<'static, Result<Vec<u8>, SourceError>> {
        let agent = self.agent.clone();
        let url = self.url(path);
        let path = path.to_string();
        async move {
            task::spawn_blocking(move || -> Result<Vec<u8>, SourceError> {
                let response = agent
                    .get(&url)
                    .call()
                    .map_err(|error| convert_error(&path, error))?;
                let total = response
                    .header("Content-Length")
                    .and_then(|length| length.parse::<u64>().ok());
                if total.is_none() {
                    warn!("No content length for {}", url);
                }

                let mut reader = response.into_reader();
                let mut data = Vec::with_capacity(initial_capacity(total));
                let mut chunk = vec![0u8; READ_CHUNK];
                loop {
                    let read = reader.read(&mut chunk)?;
                    if read == 0 {
                        break;
                    }
                    data.extend_from_slice(&chunk[..read]);
                    report(&progress, data.len() as u64, total);
                }
                debug!("Fetched {} bytes from {}", data.len(), url);
                Ok(data)
            })
            .await
            .map_err(|_| SourceError::Aborted)?
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_origin_and_path() {
        let source = HttpSource::new("https://example.com/");
        assert_eq!(
            source.url("/area360/characters/gloria.glb"),
            "https://example.com/area360/characters/gloria.glb"
        );
        assert_eq!(source.url("hat.json"), "https://example.com/hat.json");
    }

    #[test]
    fn unreachable_origin_is_a_transport_failure() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        // Port 9 of the loopback address refuses connections.
        let source = HttpSource::new("http://127.0.0.1:9");
        let result = runtime.block_on(source.probe("/gloria.glb"));
        assert!(matches!(result, Err(SourceError::Transport(_))));
    }

    #[test]
    fn preallocation_is_bounded() {
        assert_eq!(initial_capacity(None), 0);
        assert_eq!(initial_capacity(Some(3)), 3);
        assert_eq!(
            initial_capacity(Some(100_000_000_000_000)),
            MAX_PREALLOCATION as usize
        );
    }

    #[test]
    fn oversized_content_length_does_not_abort() {
        use std::{io::Write, net::TcpListener, thread};

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = [0u8; 1024];
            let _ = stream.read(&mut request);
            stream
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100000000000000\r\n\r\nabc")
                .unwrap();
        });

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let source = HttpSource::new(&format!("http://127.0.0.1:{}", port));
        let result = runtime.block_on(source.fetch("/gloria.glb", None));
        server.join().unwrap();
        // The body ends early, so the read either fails or returns the short body.
        match result {
            Ok(data) => assert_eq!(data, b"abc"),
            Err(error) => assert!(matches!(error, SourceError::Io(_)), "{}", error),
        }
    }
}
