use std::{
    io,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket},
    os::fd::AsRawFd,
};

use log::{debug, warn};
use nix::sys::socket::{getsockopt, setsockopt, sockopt};

use crate::error::{Error, Result};

/// Where the pacer pushes datagrams.
pub trait Transport {
    fn send(&mut self, payload: &[u8]) -> io::Result<usize>;
}

/// Resolves `host:port` once; the first address returned wins.
pub fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    let mut addrs = (host, port).to_socket_addrs().map_err(|err| Error::Resolve {
        host: host.to_string(),
        port,
        reason: err.to_string(),
    })?;

    addrs.next().ok_or_else(|| Error::Resolve {
        host: host.to_string(),
        port,
        reason: "no address found".into(),
    })
}

pub struct UdpSender {
    socket: UdpSocket,
    remote: SocketAddr,
}

impl UdpSender {
    /// Binds an ephemeral local port matching the remote's address family.
    /// A `send_buffer` of 0 keeps the OS default `SO_SNDBUF`.
    pub fn new(remote: SocketAddr, send_buffer: usize) -> Result<UdpSender> {
        let local: SocketAddr = match remote {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(local)?;

        if send_buffer > 0 {
            let fd = socket.as_raw_fd();
            setsockopt(fd, sockopt::SndBuf, &send_buffer)?;
            let effective = getsockopt(fd, sockopt::SndBuf)?;
            // Linux doubles the requested value; anything smaller was capped by wmem_max
            if effective < send_buffer {
                warn!(
                    "Send buffer capped by the kernel: requested={}, got={}",
                    send_buffer, effective
                );
            } else {
                debug!("Send buffer set to {} bytes", effective);
            }
        }

        debug!(
            "Bound {:?} for traffic towards {}",
            socket.local_addr()?,
            remote
        );

        Ok(UdpSender { socket, remote })
    }

    pub fn remote(&self) -> SocketAddr {
        self.remote
    }
}

impl Transport for UdpSender {
    fn send(&mut self, payload: &[u8]) -> io::Result<usize> {
        self.socket.send_to(payload, self.remote)
    }
}
