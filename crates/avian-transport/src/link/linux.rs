// ============================================
// File: crates/avian-transport/src/link/linux.rs
// ============================================
//! # Linux Packet Socket Listener
//!
//! ## Creation Reason
//! Captures frames of a single ether-type from one interface using a
//! Linux packet socket.
//!
//! ## Setup Sequence
//! 1. Resolve the interface index with `if_nametoindex`
//! 2. `socket(AF_PACKET, SOCK_RAW | SOCK_NONBLOCK, htons(ether_type))`
//! 3. `bind` to a `sockaddr_ll` carrying the index and ether-type
//! 4. Register the descriptor with Tokio through `AsyncFd`
//!
//! ## Required Capabilities
//! - `CAP_NET_RAW`, or run as root
//!
//! ## ⚠️ Important Note for Next Developer
//! - `recvfrom` copies at most `buf.len()` bytes; longer frames are
//!   silently truncated, which is how the encoder bounds post size
//! - The sender address comes from `sockaddr_ll.sll_addr`, not from the
//!   frame header
//!
//! ## Last Modified
//! v0.1.0 - Initial packet socket listener

#![cfg(target_os = "linux")]

use std::ffi::CString;
use std::io;
use std::mem;
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};

use async_trait::async_trait;
use nix::libc;
use tokio::io::unix::AsyncFd;
use tokio::io::Interest;
use tracing::{debug, info};

use avian_common::types::MAC_ADDR_SIZE;
use avian_common::MacAddr;

use crate::error::{Result, TransportError};
use crate::traits::FrameListener;

/// Longest interface name the kernel accepts (excluding the NUL).
const MAX_IFNAME_LEN: usize = libc::IFNAMSIZ - 1;

// ============================================
// PacketListener
// ============================================

/// Frame listener over a Linux `AF_PACKET` socket.
///
/// # Example
/// ```ignore
/// use avian_transport::link::PacketListener;
///
/// let listener = PacketListener::open("enp0s8", 0x0800)?;
/// let mut buf = [0u8; 201];
/// let (len, source) = listener.read_frame(&mut buf).await?;
/// ```
pub struct PacketListener {
    async_fd: AsyncFd<OwnedFd>,
    interface: String,
    ifindex: u32,
    ether_type: u16,
}

impl PacketListener {
    /// Opens a listener on `interface` for frames of `ether_type`.
    ///
    /// # Errors
    /// - `InvalidConfig`: Name is empty, too long or contains NUL
    /// - `InterfaceNotFound`: No interface with that name
    /// - `PermissionDenied`: Missing `CAP_NET_RAW`
    /// - `ListenFailed`: Socket creation or bind failed
    pub fn open(interface: &str, ether_type: u16) -> Result<Self> {
        if interface.is_empty() || interface.len() > MAX_IFNAME_LEN {
            return Err(TransportError::invalid_config(
                "interface.name",
                format!("must be 1-{MAX_IFNAME_LEN} bytes"),
            ));
        }

        let c_name = CString::new(interface)
            .map_err(|_| TransportError::invalid_config("interface.name", "contains NUL byte"))?;

        // SAFETY: c_name is a valid NUL-terminated string.
        let ifindex = unsafe { libc::if_nametoindex(c_name.as_ptr()) };
        if ifindex == 0 {
            return Err(TransportError::InterfaceNotFound {
                name: interface.to_string(),
            });
        }

        info!(
            "Opening packet listener on {} (index {}, ether-type {:#06x})",
            interface, ifindex, ether_type
        );

        let protocol = ether_type.to_be();

        // SAFETY: plain socket(2) call; the result is checked below.
        let raw = unsafe {
            libc::socket(
                libc::AF_PACKET,
                libc::SOCK_RAW | libc::SOCK_NONBLOCK | libc::SOCK_CLOEXEC,
                libc::c_int::from(protocol),
            )
        };
        if raw < 0 {
            let err = io::Error::last_os_error();
            return Err(if err.kind() == io::ErrorKind::PermissionDenied {
                TransportError::PermissionDenied {
                    operation: "open AF_PACKET socket".into(),
                }
            } else {
                TransportError::listen_failed(interface, format!("socket failed: {err}"))
            });
        }

        // SAFETY: raw is a freshly created descriptor owned by nobody else.
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };

        // SAFETY: sockaddr_ll is plain old data; all-zero is a valid value.
        let mut addr: libc::sockaddr_ll = unsafe { mem::zeroed() };
        addr.sll_family = libc::AF_PACKET as libc::c_ushort;
        addr.sll_protocol = protocol;
        addr.sll_ifindex = libc::c_int::try_from(ifindex)
            .map_err(|_| TransportError::listen_failed(interface, "interface index out of range"))?;

        // SAFETY: addr lives for the duration of the call and the length
        // matches its type.
        let result = unsafe {
            libc::bind(
                fd.as_raw_fd(),
                (&addr as *const libc::sockaddr_ll).cast::<libc::sockaddr>(),
                sockaddr_ll_len(),
            )
        };
        if result < 0 {
            let err = io::Error::last_os_error();
            return Err(TransportError::listen_failed(
                interface,
                format!("bind failed: {err}"),
            ));
        }

        let async_fd = AsyncFd::new(fd).map_err(|e| {
            TransportError::listen_failed(interface, format!("AsyncFd creation failed: {e}"))
        })?;

        debug!("Packet listener ready on {}", interface);

        Ok(Self {
            async_fd,
            interface: interface.to_string(),
            ifindex,
            ether_type,
        })
    }

    /// Returns the kernel interface index.
    #[must_use]
    pub const fn ifindex(&self) -> u32 {
        self.ifindex
    }

    /// Returns the ether-type this listener is bound to.
    #[must_use]
    pub const fn ether_type(&self) -> u16 {
        self.ether_type
    }

    fn recv_from(fd: &OwnedFd, buf: &mut [u8]) -> io::Result<(usize, MacAddr)> {
        // SAFETY: zeroed sockaddr_ll is valid; the kernel fills it in.
        let mut addr: libc::sockaddr_ll = unsafe { mem::zeroed() };
        let mut addr_len = sockaddr_ll_len();

        // SAFETY: buf and addr are valid for writes of the given lengths.
        let result = unsafe {
            libc::recvfrom(
                fd.as_raw_fd(),
                buf.as_mut_ptr().cast::<libc::c_void>(),
                buf.len(),
                0,
                (&mut addr as *mut libc::sockaddr_ll).cast::<libc::sockaddr>(),
                &mut addr_len,
            )
        };

        let len = usize::try_from(result).map_err(|_| io::Error::last_os_error())?;

        let mut octets = [0u8; MAC_ADDR_SIZE];
        octets.copy_from_slice(&addr.sll_addr[..MAC_ADDR_SIZE]);

        Ok((len, MacAddr::new(octets)))
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn sockaddr_ll_len() -> libc::socklen_t {
    mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t
}

#[async_trait]
impl FrameListener for PacketListener {
    async fn read_frame(&self, buf: &mut [u8]) -> Result<(usize, MacAddr)> {
        loop {
            let mut guard = self
                .async_fd
                .ready(Interest::READABLE)
                .await
                .map_err(|e| TransportError::read_failed(e.to_string()))?;

            match guard.try_io(|inner| Self::recv_from(inner.get_ref(), buf)) {
                Ok(Ok(read)) => return Ok(read),
                Ok(Err(e)) => return Err(TransportError::read_failed(e.to_string())),
                Err(_would_block) => continue,
            }
        }
    }

    fn interface(&self) -> &str {
        &self.interface
    }
}

impl std::fmt::Debug for PacketListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacketListener")
            .field("interface", &self.interface)
            .field("ifindex", &self.ifindex)
            .field("ether_type", &format_args!("{:#06x}", self.ether_type))
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_names() {
        assert!(matches!(
            PacketListener::open("", 0x0800),
            Err(TransportError::InvalidConfig { .. })
        ));
        assert!(matches!(
            PacketListener::open("an-interface-name-too-long", 0x0800),
            Err(TransportError::InvalidConfig { .. })
        ));
        assert!(matches!(
            PacketListener::open("eth\0", 0x0800),
            Err(TransportError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_unknown_interface() {
        let err = PacketListener::open("avnoexist0", 0x0800).unwrap_err();
        assert!(matches!(err, TransportError::InterfaceNotFound { .. }));
        assert!(err.is_startup_error());
    }
}
