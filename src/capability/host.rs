//! Hostname allow-listing.

use async_trait::async_trait;

use crate::capability::{InboundRequest, RouteCapability, Verdict};
use crate::config::HostnameConfig;
use crate::http::response::ApiResponse;

/// Accepts requests only for configured hostnames. An empty allow-list
/// means unrestricted; a rejected host reads as "no such route".
#[derive(Debug)]
pub struct HostFilter {
    allowed_hosts: Vec<String>,
}

impl HostFilter {
    pub fn new(config: &HostnameConfig) -> Self {
        Self {
            allowed_hosts: config
                .allowed_hosts
                .iter()
                .map(|host| host.to_lowercase())
                .collect(),
        }
    }

    /// Exact membership test; hostnames are compared lowercased.
    pub fn accepts(&self, host: Option<&str>) -> bool {
        if self.allowed_hosts.is_empty() {
            return true;
        }
        match host {
            Some(host) => self.allowed_hosts.iter().any(|allowed| allowed == host),
            None => false,
        }
    }
}

#[async_trait]
impl RouteCapability for HostFilter {
    fn name(&self) -> &'static str {
        "hostname"
    }

    async fn authorize(&self, request: &InboundRequest) -> Verdict {
        if self.accepts(request.host.as_deref()) {
            Verdict::Pass
        } else {
            Verdict::Deny(ApiResponse::route_not_found())
        }
    }
}
