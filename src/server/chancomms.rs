//! Contains code pertaining to the communication between the data and control channels.

use std::net::SocketAddr;

/// ControlChanMsg represents a status message from the data channel handler to our main
/// (per connection) event handler.
#[derive(Debug)]
pub enum ControlChanMsg {
    /// The data connection was established with the given peer.
    DataConnected {
        /// The address the peer dialed in from or was dialed at.
        peer: SocketAddr,
    },
    /// A passive data connection attempt arrived from an address other than
    /// the control channel peer and was dropped.
    ForeignPeerRejected {
        /// The offending address.
        peer: SocketAddr,
    },
    /// The transfer ran to completion and the data channel was closed.
    TransferDone {
        /// The number of payload bytes that crossed the data channel.
        bytes: u64,
    },
    /// The transfer died on a filesystem or socket error.
    TransferFailed {
        /// The OS message, used verbatim in the 426 reply.
        reason: String,
    },
}
