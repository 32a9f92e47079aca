// ============================================
// File: crates/avian-transport/src/raw/linux.rs
// ============================================
//! # Raw IPv4 Send Socket
//!
//! ## Creation Reason
//! Re-injects decoded packets into the local IP stack, addressed to the
//! destination found in their own header.
//!
//! ## Main Functionality
//! - Socket creation through socket2 (non-blocking)
//! - Async sends via Tokio `AsyncFd`
//!
//! ## Last Modified
//! v0.1.0 - Initial raw socket implementation

#![cfg(target_os = "linux")]

use std::io;
use std::net::{Ipv4Addr, SocketAddrV4};

use async_trait::async_trait;
use nix::libc;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tokio::io::unix::AsyncFd;
use tokio::io::Interest;
use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::RawSender;

/// Raw `IPPROTO_RAW` socket; packets are sent with their own header.
///
/// # Example
/// ```ignore
/// use avian_transport::raw::RawIpSocket;
///
/// let socket = RawIpSocket::open()?;
/// socket.send_to(&packet, Ipv4Addr::new(192, 168, 56, 1)).await?;
/// ```
#[derive(Debug)]
pub struct RawIpSocket {
    async_fd: AsyncFd<Socket>,
}

impl RawIpSocket {
    /// Opens the send socket.
    ///
    /// # Errors
    /// - `PermissionDenied`: Missing `CAP_NET_RAW`
    /// - `SocketFailed`: Any other creation failure
    pub fn open() -> Result<Self> {
        info!("Opening raw IPv4 send socket");

        let socket = Socket::new(
            Domain::IPV4,
            Type::RAW,
            Some(Protocol::from(libc::IPPROTO_RAW)),
        )
        .map_err(|e| {
            if e.kind() == io::ErrorKind::PermissionDenied {
                TransportError::PermissionDenied {
                    operation: "open raw IPv4 socket".into(),
                }
            } else {
                TransportError::SocketFailed {
                    reason: e.to_string(),
                }
            }
        })?;

        socket
            .set_nonblocking(true)
            .map_err(|e| TransportError::io("setting non-blocking", e))?;

        let async_fd = AsyncFd::new(socket).map_err(|e| TransportError::SocketFailed {
            reason: format!("AsyncFd creation failed: {e}"),
        })?;

        debug!("Raw IPv4 send socket ready");

        Ok(Self { async_fd })
    }
}

#[async_trait]
impl RawSender for RawIpSocket {
    async fn send_to(&self, packet: &[u8], dest: Ipv4Addr) -> Result<usize> {
        // Port is meaningless for raw sockets and always zero.
        let addr = SockAddr::from(SocketAddrV4::new(dest, 0));

        loop {
            let mut guard = self
                .async_fd
                .ready(Interest::WRITABLE)
                .await
                .map_err(|e| TransportError::send_failed(dest, e.to_string()))?;

            match guard.try_io(|inner| inner.get_ref().send_to(packet, &addr)) {
                Ok(Ok(len)) => return Ok(len),
                Ok(Err(e)) => return Err(TransportError::send_failed(dest, e.to_string())),
                Err(_would_block) => continue,
            }
        }
    }
}
