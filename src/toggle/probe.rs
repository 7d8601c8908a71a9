use crate::config::EndpointConfig;
use crate::core::{Result, RouterError};
use async_trait::async_trait;
use log::debug;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Resolves the effective connection target behind an endpoint.
///
/// Two endpoints can only be compared for sameness through their resolved
/// targets, and resolving may require touching the network. Probing happens
/// once per endpoint, at startup, never on the routing path.
#[async_trait]
pub trait ConnectionProbe: Send + Sync {
    fn name(&self) -> &'static str;

    /// The endpoint's normalized `host:port/database` target. `Err` means
    /// the endpoint is misconfigured or unreachable; the caller treats that
    /// as fatal because a silently ignored replica hides real failures.
    async fn connection_target(&self, endpoint: &EndpointConfig) -> Result<String>;
}

/// Probe that trusts the configuration as written: the target is derived
/// from the endpoint fields without any I/O. For hosts whose deployment
/// tooling already validated reachability.
pub struct StaticConnectionProbe;

#[async_trait]
impl ConnectionProbe for StaticConnectionProbe {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn connection_target(&self, endpoint: &EndpointConfig) -> Result<String> {
        endpoint.validate()?;
        Ok(endpoint.connection_target())
    }
}

/// Probe that proves the endpoint accepts TCP connections before reporting
/// its target, bounded by the endpoint's `connect_timeout`. An unreachable
/// replica then fails startup instead of silently degrading to primary-only.
pub struct TcpConnectionProbe;

#[async_trait]
impl ConnectionProbe for TcpConnectionProbe {
    fn name(&self) -> &'static str {
        "tcp"
    }

    async fn connection_target(&self, endpoint: &EndpointConfig) -> Result<String> {
        endpoint.validate()?;

        let address = format!("{}:{}", endpoint.host, endpoint.port);
        match timeout(endpoint.connect_timeout, TcpStream::connect(&address)).await {
            Ok(Ok(_stream)) => {
                debug!("Probe connected to {}", address);
                Ok(endpoint.connection_target())
            }
            Ok(Err(e)) => Err(RouterError::ProbeFailed {
                endpoint: address,
                cause: e.to_string(),
            }),
            Err(_) => Err(RouterError::ProbeFailed {
                endpoint: address,
                cause: format!(
                    "connect timed out after {:?}",
                    endpoint.connect_timeout
                ),
            }),
        }
    }
}
