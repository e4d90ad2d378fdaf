//! Local port discovery.

use std::net::{IpAddr, SocketAddr, TcpListener};

use crate::error::{LaunchError, Result};

/// A port that was free, with the listener that proves it.
///
/// The listener is kept bound so nothing can take the port between selection
/// and serving.
#[derive(Debug)]
pub struct PortSelection {
    pub port: u16,
    pub listener: TcpListener,
}

/// Bind the first free port in `[start, start + attempts)` on `host`.
///
/// The range is cut short at 65535 rather than wrapping.
pub fn select_port(host: IpAddr, start: u16, attempts: u16) -> Result<PortSelection> {
    for port in (0..attempts).filter_map(|offset| start.checked_add(offset)) {
        match TcpListener::bind(SocketAddr::new(host, port)) {
            Ok(listener) => return Ok(PortSelection { port, listener }),
            Err(e) => tracing::debug!("Port {} unavailable: {}", port, e),
        }
    }
    Err(LaunchError::NoPortAvailable { start, attempts })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    /// Hold listeners on ten consecutive free ports and return the first one.
    fn occupy_block() -> (u16, Vec<TcpListener>) {
        for base in (42000..60000).step_by(10) {
            let held: Vec<_> = (base..base + 10)
                .filter_map(|p| TcpListener::bind(SocketAddr::new(LOCALHOST, p)).ok())
                .collect();
            if held.len() == 10 {
                return (base, held);
            }
        }
        panic!("no block of ten free ports");
    }

    #[test]
    fn picks_the_only_free_port_in_range() {
        let (base, mut held) = occupy_block();
        drop(held.remove(5));

        let selection = select_port(LOCALHOST, base, 10).unwrap();
        assert_eq!(selection.port, base + 5);
    }

    #[test]
    fn exhausted_range_reports_no_port() {
        let (base, _held) = occupy_block();

        let err = select_port(LOCALHOST, base, 10).unwrap_err();
        assert!(matches!(
            err,
            LaunchError::NoPortAvailable { start, attempts: 10 } if start == base
        ));
    }

    #[test]
    fn range_stops_at_the_last_port() {
        // Only 65535 itself is in range; the scan must not wrap to low ports.
        match select_port(LOCALHOST, u16::MAX, 10) {
            Ok(selection) => assert_eq!(selection.port, u16::MAX),
            Err(err) => assert!(matches!(err, LaunchError::NoPortAvailable { .. })),
        }
    }
}
