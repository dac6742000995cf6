use std::time::Duration;

/// Connection settings for the production HTTP transport.
///
/// # Examples
///
/// ```
/// use brr_speedtest::TransportOptions;
/// use std::time::Duration;
///
/// let options = TransportOptions::default()
///     .connect_timeout(Duration::from_secs(5))
///     .user_agent("my-app/1.0");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    /// Time allowed to establish a connection, TLS handshake included.
    ///
    /// Default: 10s
    pub connect_timeout: Duration,

    /// TCP keep-alive interval for open connections.
    ///
    /// Default: 30s
    pub tcp_keepalive: Duration,

    /// How long an idle pooled connection is kept before it is closed.
    ///
    /// Default: 90s
    pub pool_idle_timeout: Duration,

    /// Idle connections kept per host.
    ///
    /// Should be at least the run's `max_connections` so transfers reuse
    /// warm connections.
    ///
    /// Default: 16
    pub pool_max_idle_per_host: usize,

    /// Upper bound for one whole request, body included.
    ///
    /// Default: 60s
    pub request_timeout: Duration,

    /// Value of the `User-Agent` header.
    ///
    /// Default: `brr/<crate version>`
    pub user_agent: String,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            tcp_keepalive: Duration::from_secs(30),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 16,
            request_timeout: Duration::from_secs(60),
            user_agent: concat!("brr/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl TransportOptions {
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn tcp_keepalive(mut self, interval: Duration) -> Self {
        self.tcp_keepalive = interval;
        self
    }

    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    #[must_use]
    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}
