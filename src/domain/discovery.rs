//! Discovery events
//!
//! The single normalized event both ingestors emit. The lifecycle monitor
//! is the only consumer; producers feed a bounded mpsc channel so one slow
//! consumer cannot wedge a transport callback.

use std::fmt;

/// Which ingestor observed the token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoverySource {
    /// Live log stream (new liquidity pool)
    Stream,
    /// Signal channel recommendation
    Signal,
}

impl fmt::Display for DiscoverySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoverySource::Stream => write!(f, "stream"),
            DiscoverySource::Signal => write!(f, "signal"),
        }
    }
}

/// A token-discovery event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Discovery {
    /// A candidate token to gate and possibly enroll
    Candidate {
        address: String,
        source: DiscoverySource,
    },
    /// An external designation of the confirmed correct token: everything
    /// else gets sold, the designated address gets enrolled and bought
    CorrectToken { address: String },
}
