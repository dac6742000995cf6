//! Server and client identity lookup.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::core::{TraceInfo, colo_city, is_success};
use crate::data::ServerInfo;
use crate::effects::transport::Transport;
use crate::error::{Error, Result};

/// Time allowed for the best-effort client city lookup.
pub const CLIENT_CITY_TIMEOUT: Duration = Duration::from_secs(2);

const IPINFO_URL: &str = "https://ipinfo.io";

#[derive(Debug, Deserialize)]
struct IpInfo {
    #[serde(default)]
    city: String,
    #[serde(default)]
    region: String,
}

/// Resolves [`ServerInfo`] from the endpoint's trace document.
pub struct MetadataResolver<T> {
    transport: Arc<T>,
    endpoint: String,
    resolve_client_city: bool,
}

impl<T: Transport> MetadataResolver<T> {
    pub fn new(transport: Arc<T>, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            resolve_client_city: true,
        }
    }

    #[must_use]
    pub fn resolve_client_city(mut self, resolve: bool) -> Self {
        self.resolve_client_city = resolve;
        self
    }

    /// Fetch `/cdn-cgi/trace` and build the server description.
    ///
    /// The client city lookup never fails this call; it is left empty on
    /// any error or after [`CLIENT_CITY_TIMEOUT`].
    pub async fn resolve(&self) -> Result<ServerInfo> {
        let url = format!("{}/cdn-cgi/trace", self.endpoint);
        let response = self
            .transport
            .get(&url)
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if !is_success(status) {
            return Err(Error::HttpStatus { status, url });
        }

        let body = response
            .collect()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        let trace = TraceInfo::parse(&String::from_utf8_lossy(&body));

        let client_city = if self.resolve_client_city && !trace.ip.is_empty() {
            self.client_city(&trace.ip).await
        } else {
            String::new()
        };

        Ok(ServerInfo {
            colo_city: colo_city(&trace.colo),
            ip: trace.ip,
            colo: trace.colo,
            location: trace.loc,
            client_city,
        })
    }

    async fn client_city(&self, ip: &str) -> String {
        match tokio::time::timeout(CLIENT_CITY_TIMEOUT, self.lookup_city(ip)).await {
            Ok(Ok(city)) => city,
            Ok(Err(e)) => {
                debug!("client city lookup failed: {}", e);
                String::new()
            }
            Err(_) => {
                debug!("client city lookup timed out");
                String::new()
            }
        }
    }

    async fn lookup_city(&self, ip: &str) -> Result<String> {
        let url = format!("{IPINFO_URL}/{ip}/json");
        let response = self
            .transport
            .get(&url)
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        if status != 200 {
            return Err(Error::HttpStatus { status, url });
        }

        let body = response
            .collect()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        let info: IpInfo =
            serde_json::from_slice(&body).map_err(|e| Error::Network(e.to_string()))?;

        Ok(match (info.city.is_empty(), info.region.is_empty()) {
            (true, _) => String::new(),
            (false, true) => info.city,
            (false, false) => format!("{}, {}", info.city, info.region),
        })
    }
}
