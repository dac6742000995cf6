use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};

/// A boxed stream type for HTTP response bodies.
///
/// The stream yields `Result<Bytes, E>` where E is the error type of the transport.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Stream of upload body chunks.
///
/// `Sync` is required so the stream can be handed to HTTP clients that
/// share request bodies across threads.
pub type UploadStream = Pin<Box<dyn Stream<Item = Bytes> + Send + Sync + 'static>>;

/// A request body of known, exact length.
pub struct UploadBody {
    len: u64,
    stream: UploadStream,
}

impl UploadBody {
    /// Create a body from a chunk stream that yields exactly `len` bytes.
    pub fn new(len: u64, stream: UploadStream) -> Self {
        Self { len, stream }
    }

    /// Create a body from pre-cut chunks.
    pub fn from_chunks(chunks: Vec<Bytes>) -> Self {
        let len = chunks.iter().map(|c| c.len() as u64).sum();
        Self::new(len, Box::pin(futures_util::stream::iter(chunks)))
    }

    /// Value for the `Content-Length` header.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn into_stream(self) -> UploadStream {
        self.stream
    }
}

impl std::fmt::Debug for UploadBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadBody")
            .field("len", &self.len)
            .field("stream", &"{ ... }")
            .finish()
    }
}

/// Status, headers and streaming body of an HTTP response.
pub struct Response<E> {
    status: u16,
    headers: Vec<(String, String)>,
    body: BoxStream<'static, std::result::Result<Bytes, E>>,
}

impl<E> Response<E> {
    pub fn new(
        status: u16,
        headers: Vec<(String, String)>,
        body: BoxStream<'static, std::result::Result<Bytes, E>>,
    ) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// First value of header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn into_body(self) -> BoxStream<'static, std::result::Result<Bytes, E>> {
        self.body
    }

    /// Read the whole body into memory.
    pub async fn collect(self) -> std::result::Result<Vec<u8>, E> {
        let mut body = self.body;
        let mut buf = Vec::new();
        while let Some(chunk) = body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf)
    }

    /// Read the body to the end, calling `on_chunk` with the size of every
    /// chunk as it arrives. Returns the total number of bytes read.
    pub async fn drain(self, mut on_chunk: impl FnMut(usize)) -> std::result::Result<u64, E> {
        let mut body = self.body;
        let mut total = 0u64;
        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            on_chunk(chunk.len());
            total += chunk.len() as u64;
        }
        Ok(total)
    }
}

impl<E> std::fmt::Debug for Response<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body", &"{ ... }")
            .finish()
    }
}

/// Asynchronous HTTP transport abstraction.
///
/// This trait provides the minimal interface the measurement engine needs.
/// A non-2xx status is returned as a normal [`Response`]; only failures to
/// complete the exchange are errors. Dropping a returned future aborts the
/// request.
///
/// # Implementations
///
/// - [`ReqwestTransport`]: Production implementation using `reqwest`
/// - Mock implementations for testing
pub trait Transport: Send + Sync {
    /// Error type for transport operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Issue a `GET` and return the response with its body unread.
    fn get(
        &self,
        url: &str,
    ) -> impl Future<Output = std::result::Result<Response<Self::Error>, Self::Error>> + Send;

    /// Issue a `POST` with a raw `application/octet-stream` body of exactly
    /// `body.len()` bytes.
    fn post(
        &self,
        url: &str,
        body: UploadBody,
    ) -> impl Future<Output = std::result::Result<Response<Self::Error>, Self::Error>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use super::*;
    use crate::data::TransportOptions;
    use crate::error::{Error, Result};
    use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};

    /// Production HTTP transport using reqwest with rustls.
    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        /// Create a transport with the given connection settings.
        pub fn new(options: &TransportOptions) -> Result<Self> {
            let client = reqwest::Client::builder()
                .use_rustls_tls()
                .connect_timeout(options.connect_timeout)
                .tcp_keepalive(options.tcp_keepalive)
                .pool_idle_timeout(options.pool_idle_timeout)
                .pool_max_idle_per_host(options.pool_max_idle_per_host)
                .timeout(options.request_timeout)
                .user_agent(options.user_agent.as_str())
                .no_gzip()
                .no_brotli()
                .no_deflate()
                .build()
                .map_err(|e| Error::TransportSetup(e.to_string()))?;
            Ok(Self { client })
        }

        /// Wrap an already configured client.
        pub fn from_client(client: reqwest::Client) -> Self {
            Self { client }
        }

        fn convert(response: reqwest::Response) -> Response<reqwest::Error> {
            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|value| (name.as_str().to_string(), value.to_string()))
                })
                .collect();
            Response::new(status, headers, Box::pin(response.bytes_stream()))
        }
    }

    impl Transport for ReqwestTransport {
        type Error = reqwest::Error;

        async fn get(&self, url: &str) -> std::result::Result<Response<Self::Error>, Self::Error> {
            let response = self.client.get(url).send().await?;
            Ok(Self::convert(response))
        }

        async fn post(
            &self,
            url: &str,
            body: UploadBody,
        ) -> std::result::Result<Response<Self::Error>, Self::Error> {
            let len = body.len();
            let stream = body.into_stream().map(Ok::<Bytes, std::io::Error>);
            let response = self
                .client
                .post(url)
                .header(CONTENT_TYPE, "application/octet-stream")
                .header(CONTENT_LENGTH, len)
                .body(reqwest::Body::wrap_stream(stream))
                .send()
                .await?;
            Ok(Self::convert(response))
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestTransport;
