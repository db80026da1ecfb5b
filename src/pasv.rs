//! Per-session passive data channel: a single-shot listener created by
//! `PASV` and consumed by exactly one subsequent data-transferring command.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use tokio::net::{TcpListener, TcpStream};

/// A passive listener awaiting exactly one accept.
///
/// Modeled as an option-typed field on the session (`None` = no pending
/// listener); this type is the `Some` payload.
#[derive(Debug)]
pub struct PassiveListener {
    listener: TcpListener,
    advertised_ip: Ipv4Addr,
    port: u16,
}

impl PassiveListener {
    /// Binds an ephemeral port on `local_addr`'s interface and returns the
    /// listener along with the address to advertise to the client.
    ///
    /// Fails if the control channel is not over IPv4 (this server only
    /// supports IPv4 data-channel advertisements) or if no ephemeral port
    /// could be bound.
    #[tracing_attributes::instrument]
    pub async fn open(local_addr: SocketAddr) -> std::io::Result<Self> {
        let ip = match local_addr {
            SocketAddr::V4(addr) => *addr.ip(),
            SocketAddr::V6(_) => {
                return Err(std::io::Error::new(std::io::ErrorKind::Unsupported, "passive mode requires an IPv4 control connection"));
            }
        };
        let listener = TcpListener::bind(SocketAddrV4::new(ip, 0)).await?;
        let port = listener.local_addr()?.port();
        Ok(PassiveListener {
            listener,
            advertised_ip: ip,
            port,
        })
    }

    /// The `(h1,h2,h3,h4,p1,p2)` sextet to advertise in the `227` reply,
    /// where the port equals `p1*256 + p2`.
    pub fn advertised_octets(&self) -> (u8, u8, u8, u8, u8, u8) {
        let [h1, h2, h3, h4] = self.advertised_ip.octets();
        let p1 = (self.port >> 8) as u8;
        let p2 = (self.port & 0xff) as u8;
        (h1, h2, h3, h4, p1, p2)
    }

    /// Accepts the single incoming data connection. Consumes `self`: the
    /// listener is single-shot by construction - callers hold at most one
    /// `PassiveListener` per session and drop it after this call (successful
    /// or not).
    pub async fn accept(self) -> std::io::Result<TcpStream> {
        let (stream, _peer) = self.listener.accept().await?;
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_advertises_bound_port() {
        let local = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0));
        let pasv = PassiveListener::open(local).await.unwrap();
        let (h1, h2, h3, h4, p1, p2) = pasv.advertised_octets();
        assert_eq!((h1, h2, h3, h4), (127, 0, 0, 1));
        let port = (p1 as u16) * 256 + p2 as u16;
        assert_eq!(port, pasv.port);
    }

    #[tokio::test]
    async fn accept_receives_the_dialed_connection() {
        let local = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0));
        let pasv = PassiveListener::open(local).await.unwrap();
        let port = pasv.port;
        let client = tokio::spawn(async move { TcpStream::connect((Ipv4Addr::LOCALHOST, port)).await.unwrap() });
        let server_side = pasv.accept().await.unwrap();
        let _client_side = client.await.unwrap();
        drop(server_side);
    }

    #[tokio::test]
    async fn rejects_ipv6_control_connections() {
        let local: SocketAddr = "[::1]:21".parse().unwrap();
        let err = PassiveListener::open(local).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::Unsupported);
    }
}
