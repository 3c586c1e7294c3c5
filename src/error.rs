//! Error types for KNX operations, grouped into categories mirroring §7 of
//! the design (conversion, protocol, transport, tunnel, config).
//!
//! Every category carries a captured backtrace; this crate is host-only so
//! it is always available.

use std::backtrace::Backtrace;
use thiserror::Error;

/// Result type alias for KNX operations.
pub type Result<T> = std::result::Result<T, KnxError>;

// =============================================================================
// Error Kind Enums (Internal)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum ProtocolErrorKind {
    #[error("invalid frame")]
    InvalidFrame,
    #[error("unsupported protocol version")]
    UnsupportedVersion,
    #[error("unsupported service type")]
    UnsupportedServiceType,
    #[error("payload too large")]
    PayloadTooLarge,
    #[error("unsupported cEMI message code")]
    UnsupportedCemiMessage,
    #[error("invalid control field")]
    InvalidControlField,
    #[error("malformed DIB")]
    InvalidDib,
    #[error("malformed SRP")]
    InvalidSrp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum ConnectionErrorKind {
    #[error("connection refused")]
    Refused,
    #[error("connection timed out")]
    Timeout,
    #[error("connection failed")]
    Failed,
    #[error("connection lost")]
    Lost,
    #[error("no such communication channel")]
    ChannelNotFound,
    #[error("gateway reports no free channels")]
    NoFreeChannels,
    #[error("not connected")]
    NotConnected,
    #[error("already connected")]
    AlreadyConnected,
    #[error("operation cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum TunnelingErrorKind {
    #[error("tunnelling sequence mismatch")]
    SequenceMismatch,
    #[error("tunnelling acknowledgement failed")]
    AckFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum TransportErrorKind {
    #[error("send failed")]
    SendFailed,
    #[error("receive failed")]
    ReceiveFailed,
    #[error("buffer too small")]
    BufferTooSmall,
    #[error("transport not bound")]
    NotBound,
    #[error("socket error")]
    SocketError,
    #[error("USB-HID frame reassembly failed")]
    UsbReassembly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum AddressingErrorKind {
    #[error("invalid individual address")]
    InvalidIndividualAddress,
    #[error("invalid group address")]
    InvalidGroupAddress,
    #[error("address out of range")]
    OutOfRange,
    #[error("invalid address filter pattern")]
    InvalidFilter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum DptErrorKind {
    #[error("invalid DPT payload")]
    InvalidData,
    #[error("value out of range for this DPT")]
    ValueOutOfRange,
    #[error("unsupported DPT")]
    UnsupportedType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub(crate) enum ConfigErrorKind {
    #[error("invalid configuration value")]
    Invalid,
    #[error("missing required field")]
    MissingField,
    #[error("no usable network interface")]
    NoInterface,
}

// =============================================================================
// Structured Error Types
// =============================================================================

macro_rules! category_error {
    ($name:ident, $kind:ty) => {
        #[derive(Debug, Error)]
        #[error("{kind}")]
        pub struct $name {
            kind: $kind,
            backtrace: Backtrace,
        }

        impl $name {
            pub(crate) fn new(kind: $kind) -> Self {
                Self {
                    kind,
                    backtrace: Backtrace::capture(),
                }
            }

            /// The captured backtrace at the point this error was raised.
            pub fn backtrace(&self) -> &Backtrace {
                &self.backtrace
            }
        }
    };
}

category_error!(ProtocolError, ProtocolErrorKind);
category_error!(ConnectionError, ConnectionErrorKind);
category_error!(TunnelingError, TunnelingErrorKind);
category_error!(TransportError, TransportErrorKind);
category_error!(AddressingError, AddressingErrorKind);
category_error!(DptError, DptErrorKind);
category_error!(ConfigError, ConfigErrorKind);

impl ProtocolError {
    pub fn is_invalid_frame(&self) -> bool {
        matches!(self.kind, ProtocolErrorKind::InvalidFrame)
    }

    pub fn is_unsupported_version(&self) -> bool {
        matches!(self.kind, ProtocolErrorKind::UnsupportedVersion)
    }
}

impl ConnectionError {
    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, ConnectionErrorKind::Timeout)
    }

    pub fn is_refused(&self) -> bool {
        matches!(self.kind, ConnectionErrorKind::Refused)
    }

    pub fn is_lost(&self) -> bool {
        matches!(self.kind, ConnectionErrorKind::Lost)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.kind, ConnectionErrorKind::Cancelled)
    }
}

impl TunnelingError {
    pub fn is_sequence_mismatch(&self) -> bool {
        matches!(self.kind, TunnelingErrorKind::SequenceMismatch)
    }
}

impl TransportError {
    pub fn is_buffer_too_small(&self) -> bool {
        matches!(self.kind, TransportErrorKind::BufferTooSmall)
    }

    pub fn is_socket_error(&self) -> bool {
        matches!(self.kind, TransportErrorKind::SocketError)
    }
}

impl AddressingError {
    pub fn is_out_of_range(&self) -> bool {
        matches!(self.kind, AddressingErrorKind::OutOfRange)
    }
}

impl DptError {
    pub fn is_out_of_range(&self) -> bool {
        matches!(self.kind, DptErrorKind::ValueOutOfRange)
    }
}

// =============================================================================
// Main Error Type
// =============================================================================

/// KNX protocol error, grouped by the category that raised it.
#[derive(Debug, Error)]
pub enum KnxError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Tunneling(#[from] TunnelingError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Addressing(#[from] AddressingError),
    #[error(transparent)]
    Dpt(#[from] DptError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid state for this operation")]
    InvalidState,
    #[error("unsupported operation")]
    UnsupportedOperation,
    #[error("operation timed out")]
    Timeout,
}

impl KnxError {
    // Protocol errors
    pub(crate) fn invalid_frame() -> Self {
        Self::Protocol(ProtocolError::new(ProtocolErrorKind::InvalidFrame))
    }

    pub(crate) fn unsupported_version() -> Self {
        Self::Protocol(ProtocolError::new(ProtocolErrorKind::UnsupportedVersion))
    }

    pub(crate) fn unsupported_service_type() -> Self {
        Self::Protocol(ProtocolError::new(ProtocolErrorKind::UnsupportedServiceType))
    }

    pub(crate) fn payload_too_large() -> Self {
        Self::Protocol(ProtocolError::new(ProtocolErrorKind::PayloadTooLarge))
    }

    pub(crate) fn unsupported_cemi_message() -> Self {
        Self::Protocol(ProtocolError::new(ProtocolErrorKind::UnsupportedCemiMessage))
    }

    pub(crate) fn invalid_control_field() -> Self {
        Self::Protocol(ProtocolError::new(ProtocolErrorKind::InvalidControlField))
    }

    pub(crate) fn invalid_dib() -> Self {
        Self::Protocol(ProtocolError::new(ProtocolErrorKind::InvalidDib))
    }

    pub(crate) fn invalid_srp() -> Self {
        Self::Protocol(ProtocolError::new(ProtocolErrorKind::InvalidSrp))
    }

    // Connection errors
    pub(crate) fn connection_refused() -> Self {
        Self::Connection(ConnectionError::new(ConnectionErrorKind::Refused))
    }

    pub(crate) fn connection_timeout() -> Self {
        Self::Connection(ConnectionError::new(ConnectionErrorKind::Timeout))
    }

    pub(crate) fn connection_failed() -> Self {
        Self::Connection(ConnectionError::new(ConnectionErrorKind::Failed))
    }

    pub(crate) fn connection_lost() -> Self {
        Self::Connection(ConnectionError::new(ConnectionErrorKind::Lost))
    }

    pub(crate) fn not_connected() -> Self {
        Self::Connection(ConnectionError::new(ConnectionErrorKind::NotConnected))
    }

    pub(crate) fn channel_not_found() -> Self {
        Self::Connection(ConnectionError::new(ConnectionErrorKind::ChannelNotFound))
    }

    pub(crate) fn no_free_channels() -> Self {
        Self::Connection(ConnectionError::new(ConnectionErrorKind::NoFreeChannels))
    }

    pub(crate) fn already_connected() -> Self {
        Self::Connection(ConnectionError::new(ConnectionErrorKind::AlreadyConnected))
    }

    pub(crate) fn cancelled() -> Self {
        Self::Connection(ConnectionError::new(ConnectionErrorKind::Cancelled))
    }

    // Tunneling errors
    pub(crate) fn sequence_mismatch() -> Self {
        Self::Tunneling(TunnelingError::new(TunnelingErrorKind::SequenceMismatch))
    }

    pub(crate) fn tunneling_ack_failed() -> Self {
        Self::Tunneling(TunnelingError::new(TunnelingErrorKind::AckFailed))
    }

    // Transport errors
    pub(crate) fn buffer_too_small() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::BufferTooSmall))
    }

    pub(crate) fn socket_error() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::SocketError))
    }

    pub(crate) fn send_failed() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::SendFailed))
    }

    pub(crate) fn receive_failed() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::ReceiveFailed))
    }

    pub(crate) fn not_bound() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::NotBound))
    }

    pub(crate) fn usb_reassembly() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::UsbReassembly))
    }

    // Addressing errors
    pub(crate) fn invalid_group_address() -> Self {
        Self::Addressing(AddressingError::new(AddressingErrorKind::InvalidGroupAddress))
    }

    pub(crate) fn invalid_address() -> Self {
        Self::Addressing(AddressingError::new(AddressingErrorKind::InvalidGroupAddress))
    }

    pub(crate) fn invalid_individual_address() -> Self {
        Self::Addressing(AddressingError::new(AddressingErrorKind::InvalidIndividualAddress))
    }

    pub(crate) fn address_out_of_range() -> Self {
        Self::Addressing(AddressingError::new(AddressingErrorKind::OutOfRange))
    }

    pub(crate) fn invalid_filter() -> Self {
        Self::Addressing(AddressingError::new(AddressingErrorKind::InvalidFilter))
    }

    // DPT errors
    pub(crate) fn invalid_dpt_data() -> Self {
        Self::Dpt(DptError::new(DptErrorKind::InvalidData))
    }

    pub(crate) fn dpt_value_out_of_range() -> Self {
        Self::Dpt(DptError::new(DptErrorKind::ValueOutOfRange))
    }

    pub(crate) fn unsupported_dpt() -> Self {
        Self::Dpt(DptError::new(DptErrorKind::UnsupportedType))
    }

    // Config errors
    pub(crate) fn invalid_config() -> Self {
        Self::Config(ConfigError::new(ConfigErrorKind::Invalid))
    }

    pub(crate) fn missing_config_field() -> Self {
        Self::Config(ConfigError::new(ConfigErrorKind::MissingField))
    }

    pub(crate) fn no_interface() -> Self {
        Self::Config(ConfigError::new(ConfigErrorKind::NoInterface))
    }
}
