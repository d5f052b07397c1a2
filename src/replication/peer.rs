use rand::seq::IndexedRandom;
use std::net::IpAddr;
use tracing::{debug, error};

/// Resolves the remote cluster hostname to member addresses.
#[async_trait::async_trait]
pub trait PeerResolver: Send + Sync {
    async fn resolve(&self, host: &str, port: u16) -> std::io::Result<Vec<IpAddr>>;
}

/// System resolver via `tokio::net::lookup_host`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DnsPeerResolver;

#[async_trait::async_trait]
impl PeerResolver for DnsPeerResolver {
    async fn resolve(&self, host: &str, port: u16) -> std::io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host, port)).await?;
        Ok(addrs.map(|addr| addr.ip()).collect())
    }
}

/// Picks one cluster member at random. `None` when resolution fails or yields
/// nothing; the caller carries on and lets the replication itself fail.
pub(super) async fn pick_peer(resolver: &dyn PeerResolver, host: &str, port: u16) -> Option<IpAddr> {
    match resolver.resolve(host, port).await {
        Ok(addrs) => {
            let peer = addrs.choose(&mut rand::rng()).copied();
            match peer {
                Some(ip) => debug!(host, %ip, candidates = addrs.len(), "Cluster peer selected"),
                None => error!(host, "Cluster lookup returned no addresses"),
            }
            peer
        }
        Err(e) => {
            error!(host, error = %e, "Unable to look up cluster addresses");
            None
        }
    }
}
