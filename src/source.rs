//! Loading baseline and candidate documents
//!
//! A document comes from an HTTP(S) URL, a local file, or stdin. Raw text is
//! fingerprinted and decoded into a [`serde_json::Value`] before any checking.

use serde_json::Value;
use std::fmt;
use std::io::Read;
use std::path::PathBuf;
use std::str::FromStr;
use std::thread;
use tracing::debug;
use url::Url;

use crate::checksum::Fingerprint;
use crate::config::FetchConfig;
use crate::error::{CompatError, Result};

/// Where a document is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    /// `http://` or `https://` URL
    Url(Url),
    /// Local file, given as a path or a `file://` URL
    File(PathBuf),
    /// Standard input, given as `-`
    Stdin,
}

impl FromStr for DocumentSource {
    type Err = CompatError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CompatError::InvalidSource("empty source".to_string()));
        }
        if s == "-" {
            return Ok(DocumentSource::Stdin);
        }
        if !s.contains("://") {
            return Ok(DocumentSource::File(PathBuf::from(s)));
        }

        let url = Url::parse(s).map_err(|e| CompatError::InvalidSource(format!("{}: {}", s, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(DocumentSource::Url(url)),
            "file" => url
                .to_file_path()
                .map(DocumentSource::File)
                .map_err(|_| CompatError::InvalidSource(format!("{}: not a local file path", s))),
            scheme => Err(CompatError::InvalidSource(format!(
                "{}: unsupported scheme '{}'",
                s, scheme
            ))),
        }
    }
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentSource::Url(url) => write!(f, "{}", url),
            DocumentSource::File(path) => write!(f, "{}", path.display()),
            DocumentSource::Stdin => write!(f, "<stdin>"),
        }
    }
}

/// A decoded document together with its origin
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub source: DocumentSource,
    pub value: Value,
    /// Fingerprint of the raw text, before decoding
    pub fingerprint: Fingerprint,
}

/// Retrieves the raw body behind a URL
pub trait Fetcher: Sync {
    fn fetch_text(&self, url: &Url) -> Result<String>;
}

/// Blocking HTTP fetcher
pub struct HttpFetcher {
    agent: ureq::Agent,
    accept: String,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout())
            .user_agent(&config.user_agent)
            .build();
        Self {
            agent,
            accept: config.accept.clone(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(&FetchConfig::default())
    }
}

impl Fetcher for HttpFetcher {
    fn fetch_text(&self, url: &Url) -> Result<String> {
        debug!(%url, "fetching");
        match self.agent.get(url.as_str()).set("Accept", &self.accept).call() {
            Ok(response) => {
                // into_string caps bodies at 10 MB; read the whole body instead
                let mut text = String::new();
                response
                    .into_reader()
                    .read_to_string(&mut text)
                    .map_err(|err| CompatError::Fetch {
                        location: url.to_string(),
                        message: err.to_string(),
                    })?;
                Ok(text)
            }
            Err(ureq::Error::Status(status, _)) => Err(CompatError::HttpStatus {
                url: url.to_string(),
                status,
            }),
            Err(ureq::Error::Transport(err)) => Err(CompatError::Fetch {
                location: url.to_string(),
                message: err.to_string(),
            }),
        }
    }
}

/// Reads and decodes documents from any [`DocumentSource`]
pub struct DocumentLoader<F = HttpFetcher> {
    fetcher: F,
}

impl DocumentLoader<HttpFetcher> {
    /// Loader backed by an HTTP fetcher built from `config`
    pub fn http(config: &FetchConfig) -> Self {
        Self::new(HttpFetcher::new(config))
    }
}

impl<F: Fetcher> DocumentLoader<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    /// Read and decode a single document
    pub fn load(&self, source: &DocumentSource) -> Result<LoadedDocument> {
        let text = self.read_text(source)?;
        debug!(%source, bytes = text.len(), "loaded document");
        decode(source.clone(), &text)
    }

    /// Load the baseline and candidate concurrently
    pub fn load_pair(
        &self,
        baseline: &DocumentSource,
        candidate: &DocumentSource,
    ) -> Result<(LoadedDocument, LoadedDocument)> {
        if *baseline == DocumentSource::Stdin && *candidate == DocumentSource::Stdin {
            return Err(CompatError::InvalidSource(
                "stdin can only supply one of the two documents".to_string(),
            ));
        }

        thread::scope(|scope| -> Result<(LoadedDocument, LoadedDocument)> {
            let baseline_task = scope.spawn(|| self.load(baseline));
            let candidate_doc = self.load(candidate);
            let baseline_doc = baseline_task.join().map_err(|_| CompatError::Fetch {
                location: baseline.to_string(),
                message: "loader thread panicked".to_string(),
            })?;
            Ok((baseline_doc?, candidate_doc?))
        })
    }

    fn read_text(&self, source: &DocumentSource) -> Result<String> {
        match source {
            DocumentSource::Url(url) => self.fetcher.fetch_text(url),
            DocumentSource::File(path) => {
                std::fs::read_to_string(path).map_err(|err| CompatError::Fetch {
                    location: path.display().to_string(),
                    message: err.to_string(),
                })
            }
            DocumentSource::Stdin => {
                let mut text = String::new();
                std::io::stdin().read_to_string(&mut text)?;
                Ok(text)
            }
        }
    }
}

/// Fingerprint and decode raw text read from `source`
pub fn decode(source: DocumentSource, text: &str) -> Result<LoadedDocument> {
    let value = serde_json::from_str(text).map_err(|err| CompatError::Decode {
        source_name: source.to_string(),
        source: err,
    })?;
    Ok(LoadedDocument {
        fingerprint: Fingerprint::of_text(text),
        source,
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::io::Write;
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    /// Serves canned bodies; unknown URLs answer 404
    struct StubFetcher {
        bodies: HashMap<String, String>,
    }

    impl StubFetcher {
        fn new(bodies: &[(&str, &str)]) -> Self {
            Self {
                bodies: bodies
                    .iter()
                    .map(|(url, body)| (url.to_string(), body.to_string()))
                    .collect(),
            }
        }
    }

    impl Fetcher for StubFetcher {
        fn fetch_text(&self, url: &Url) -> Result<String> {
            self.bodies
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| CompatError::HttpStatus {
                    url: url.to_string(),
                    status: 404,
                })
        }
    }

    fn source(s: &str) -> DocumentSource {
        s.parse().unwrap()
    }

    /// Answers a single request on a local port and hands back the raw request head
    fn serve_once(status_line: &'static str, body: String) -> (Url, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = Url::parse(&format!("http://{}/doc", listener.local_addr().unwrap())).unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let head = read_request_head(&mut stream);
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status_line,
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.write_all(body.as_bytes());
            let _ = stream.flush();
            head
        });
        (url, handle)
    }

    fn read_request_head(stream: &mut std::net::TcpStream) -> String {
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }
        String::from_utf8_lossy(&request).into_owned()
    }

    #[test]
    fn test_parse_sources() {
        assert!(matches!(source("https://api.example.com/v1/users"), DocumentSource::Url(_)));
        assert!(matches!(source("http://localhost:8080/"), DocumentSource::Url(_)));
        assert_eq!(source("-"), DocumentSource::Stdin);
        assert_eq!(source("responses/v1.json"), DocumentSource::File(PathBuf::from("responses/v1.json")));
        assert_eq!(source("file:///tmp/v1.json"), DocumentSource::File(PathBuf::from("/tmp/v1.json")));
    }

    #[test]
    fn test_parse_rejects_unsupported_sources() {
        assert!(matches!(
            "ftp://example.com/a.json".parse::<DocumentSource>(),
            Err(CompatError::InvalidSource(_))
        ));
        assert!(matches!("  ".parse::<DocumentSource>(), Err(CompatError::InvalidSource(_))));
    }

    #[test]
    fn test_load_from_fetcher() {
        let loader = DocumentLoader::new(StubFetcher::new(&[(
            "https://api.example.com/v1/users",
            r#"{"users": [{"id": 1}]}"#,
        )]));

        let doc = loader.load(&source("https://api.example.com/v1/users")).unwrap();
        assert_eq!(doc.value, json!({"users": [{"id": 1}]}));
        assert!(doc.fingerprint.verify(r#"{"users": [{"id": 1}]}"#));
    }

    #[test]
    fn test_http_status_is_an_error() {
        let loader = DocumentLoader::new(StubFetcher::new(&[]));
        let err = loader.load(&source("https://api.example.com/missing")).unwrap_err();
        assert!(matches!(err, CompatError::HttpStatus { status: 404, .. }));
    }

    #[test]
    fn test_decode_error_names_source() {
        let loader = DocumentLoader::new(StubFetcher::new(&[("https://api.example.com/", "<html>")]));
        let err = loader.load(&source("https://api.example.com/")).unwrap_err();
        match err {
            CompatError::Decode { source_name, .. } => assert_eq!(source_name, "https://api.example.com/"),
            other => panic!("Expected Decode, got {:?}", other),
        }
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("baseline.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let loader = DocumentLoader::new(StubFetcher::new(&[]));
        let doc = loader.load(&DocumentSource::File(path)).unwrap();
        assert_eq!(doc.value, json!([1, 2, 3]));

        let missing = loader.load(&DocumentSource::File(dir.path().join("nope.json")));
        assert!(matches!(missing, Err(CompatError::Fetch { .. })));
    }

    #[test]
    fn test_load_pair() {
        let loader = DocumentLoader::new(StubFetcher::new(&[
            ("https://a.example.com/", r#"{"a": 1}"#),
            ("https://b.example.com/", r#"{"a": 2, "b": 3}"#),
        ]));

        let (baseline, candidate) = loader
            .load_pair(&source("https://a.example.com/"), &source("https://b.example.com/"))
            .unwrap();
        assert_eq!(baseline.value, json!({"a": 1}));
        assert_eq!(candidate.value, json!({"a": 2, "b": 3}));
        assert_ne!(baseline.fingerprint, candidate.fingerprint);
    }

    #[test]
    fn test_load_pair_reports_failing_side() {
        let loader = DocumentLoader::new(StubFetcher::new(&[("https://a.example.com/", "{}")]));
        let err = loader
            .load_pair(&source("https://a.example.com/"), &source("https://b.example.com/"))
            .unwrap_err();
        assert!(matches!(err, CompatError::HttpStatus { ref url, .. } if url == "https://b.example.com/"));
    }

    #[test]
    fn test_load_pair_rejects_double_stdin() {
        let loader = DocumentLoader::new(StubFetcher::new(&[]));
        let err = loader.load_pair(&DocumentSource::Stdin, &DocumentSource::Stdin).unwrap_err();
        assert!(matches!(err, CompatError::InvalidSource(_)));
    }

    #[test]
    fn test_http_fetcher_reads_body_and_sends_accept() {
        let (url, server) = serve_once("200 OK", r#"{"ok": true}"#.to_string());
        let fetcher = HttpFetcher::default();

        let text = fetcher.fetch_text(&url).unwrap();
        assert_eq!(text, r#"{"ok": true}"#);

        let head = server.join().unwrap().to_lowercase();
        assert!(head.starts_with("get /doc http/1.1"));
        assert!(head.contains("accept: application/json"));
        assert!(head.contains("user-agent: response-compat/"));
    }

    #[test]
    fn test_http_fetcher_maps_error_status() {
        let (url, server) = serve_once("404 Not Found", r#"{"error": "missing"}"#.to_string());
        let err = HttpFetcher::default().fetch_text(&url).unwrap_err();
        assert!(matches!(err, CompatError::HttpStatus { status: 404, .. }));
        server.join().unwrap();
    }

    #[test]
    fn test_http_loader_accepts_bodies_over_ten_megabytes() {
        let count = 1_400_000;
        let body = format!("[{}1]", "1234567,".repeat(count));
        assert!(body.len() > 10 * 1024 * 1024);
        let (url, server) = serve_once("200 OK", body);

        let loader = DocumentLoader::http(&FetchConfig::default());
        let doc = loader.load(&DocumentSource::Url(url)).unwrap();
        assert_eq!(doc.value.as_array().map(|items| items.len()), Some(count + 1));
        server.join().unwrap();
    }

    #[test]
    fn test_http_fetcher_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = Url::parse(&format!("http://{}/slow", listener.local_addr().unwrap())).unwrap();
        // accept, then never answer; returns once the client gives up
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut sink = Vec::new();
            let _ = stream.read_to_end(&mut sink);
        });

        let config = FetchConfig {
            timeout_secs: 1,
            ..FetchConfig::default()
        };
        let err = HttpFetcher::new(&config).fetch_text(&url).unwrap_err();
        assert!(matches!(err, CompatError::Fetch { .. }));
        server.join().unwrap();
    }
}
