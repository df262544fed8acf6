//! Local port selection for the notebook / debugger listener.
//!
//! The check is advisory. A port reported free here can still be taken by
//! another process before the remote step binds it, and nothing is reserved.

use rand::Rng;
use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::ops::RangeInclusive;
use std::time::Duration;

pub const DEFAULT_PORT_RANGE: RangeInclusive<u16> = 8008..=8099;

const CONNECT_TIMEOUT: Duration = Duration::from_millis(250);

/// Answers whether something is already listening on a local port.
#[cfg_attr(test, mockall::automock)]
pub trait PortProbe {
    fn is_in_use(&self, port: u16) -> bool;
}

/// Probes by connecting to `localhost:<port>`; an accepted connection means occupied.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpPortProbe;

impl PortProbe for TcpPortProbe {
    fn is_in_use(&self, port: u16) -> bool {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT).is_ok()
    }
}

#[derive(Debug, Clone)]
pub struct PortAllocator<P> {
    probe: P,
    range: RangeInclusive<u16>,
}

impl PortAllocator<TcpPortProbe> {
    pub fn tcp(range: RangeInclusive<u16>) -> Self {
        Self::new(TcpPortProbe, range)
    }
}

impl<P: PortProbe> PortAllocator<P> {
    pub fn new(probe: P, range: RangeInclusive<u16>) -> Self {
        Self { probe, range }
    }

    /// Blocks for up to the connect timeout per sampled port.
    pub fn find_open_port(&self) -> u16 {
        self.find_open_port_with(&mut rand::rng())
    }

    /// Sample uniformly from the range until the probe reports a free port.
    ///
    /// There is no retry cap: if every port in the range is occupied this
    /// never returns.
    pub fn find_open_port_with<R: Rng>(&self, rng: &mut R) -> u16 {
        let mut attempts = 0u32;
        loop {
            let port = rng.random_range(self.range.clone());
            attempts += 1;
            if self.probe.is_in_use(port) {
                tracing::debug!(port, "Port already in use, retrying");
                continue;
            }
            tracing::debug!(port, attempts, "Found open port");
            return port;
        }
    }
}
