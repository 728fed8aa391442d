//! Name resolution used by the preflight liveness check

use std::io;
use std::net::IpAddr;
use tracing::debug;

/// Resolves a hostname to its addresses
pub trait Resolver {
    async fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

/// System resolver (getaddrinfo via tokio)
#[derive(Debug, Default)]
pub struct SystemResolver;

impl Resolver for SystemResolver {
    async fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        let addrs: Vec<IpAddr> = tokio::net::lookup_host((host, 0))
            .await?
            .map(|addr| addr.ip())
            .collect();

        if addrs.is_empty() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no addresses found"));
        }

        debug!("Resolved {} -> {:?}", host, addrs);
        Ok(addrs)
    }
}
