//! The `Telegram`: the unit of exchange between transports, the queue, and
//! devices, shared by the router, tunnel, and telegram queue.
//!
//! A telegram is produced once (by a transport decoding a wire frame, or by
//! a device issuing a command), travels through exactly one queue, and is
//! consumed by a single consumer.

use crate::addressing::{GroupAddress, IndividualAddress};
use crate::error::{KnxError, Result};
use crate::protocol::cemi::CEMIFrame;
use crate::protocol::constants::CEMIMessageCode;

/// Which way a telegram was travelling: off the bus into this process, or
/// from this process out onto the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Received from a transport.
    Incoming,
    /// Produced locally for sending.
    Outgoing,
}

/// The destination of a telegram. Group telegrams are the common case;
/// individual-address destinations cover device-management services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// A group address (many-to-many datagram).
    Group(GroupAddress),
    /// An individual address (point-to-point, e.g. device management).
    Individual(IndividualAddress),
}

impl Destination {
    /// The group address, if this destination is a group address.
    pub const fn as_group(self) -> Option<GroupAddress> {
        match self {
            Self::Group(addr) => Some(addr),
            Self::Individual(_) => None,
        }
    }
}

/// The application-layer content of a telegram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// `A_GroupValue_Read`: no value, a request for the current state.
    GroupValueRead,
    /// `A_GroupValue_Write`: a DPT-encoded octet sequence to apply.
    GroupValueWrite(Vec<u8>),
    /// `A_GroupValue_Response`: a DPT-encoded octet sequence, replying to a read.
    GroupValueResponse(Vec<u8>),
}

impl Payload {
    /// The carried value, if this payload kind carries one (write/response).
    pub fn value(&self) -> Option<&[u8]> {
        match self {
            Self::GroupValueWrite(v) | Self::GroupValueResponse(v) => Some(v),
            Self::GroupValueRead => None,
        }
    }
}

/// Record of a single KNX application-layer exchange: {source, destination,
/// direction, payload}.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Telegram {
    /// The individual address of the sender.
    pub source: IndividualAddress,
    /// Where the telegram is headed (outgoing) or came from (incoming: the
    /// original destination on the wire, usually a group address).
    pub destination: Destination,
    /// Whether this telegram arrived from the bus or is bound for it.
    pub direction: Direction,
    /// The application-layer payload.
    pub payload: Payload,
}

impl Telegram {
    /// Build an outgoing `A_GroupValue_Write` telegram.
    pub fn group_write(source: IndividualAddress, destination: GroupAddress, value: Vec<u8>) -> Self {
        Self {
            source,
            destination: Destination::Group(destination),
            direction: Direction::Outgoing,
            payload: Payload::GroupValueWrite(value),
        }
    }

    /// Build an outgoing `A_GroupValue_Read` telegram.
    pub fn group_read(source: IndividualAddress, destination: GroupAddress) -> Self {
        Self {
            source,
            destination: Destination::Group(destination),
            direction: Direction::Outgoing,
            payload: Payload::GroupValueRead,
        }
    }

    /// Build an outgoing `A_GroupValue_Response` telegram.
    pub fn group_response(source: IndividualAddress, destination: GroupAddress, value: Vec<u8>) -> Self {
        Self {
            source,
            destination: Destination::Group(destination),
            direction: Direction::Outgoing,
            payload: Payload::GroupValueResponse(value),
        }
    }

    /// Encode this telegram as a complete cEMI frame (message code +
    /// additional-info + `L_Data` service information) suitable for
    /// `TunnelingRequest.cemi_data` or `RoutingIndication.cemi_data`.
    ///
    /// `message_code` is `L_Data.req` for tunnelling, `L_Data.ind` for
    /// routing; only group destinations can be encoded (individual-address
    /// services are out of this crate's scope).
    ///
    /// # Errors
    ///
    /// Returns an error if the destination is not a group address, or if
    /// `buf` is too small.
    pub fn to_cemi(&self, message_code: CEMIMessageCode, buf: &mut [u8]) -> Result<usize> {
        let destination = self.destination.as_group().ok_or(KnxError::UnsupportedOperation)?;

        match &self.payload {
            Payload::GroupValueRead => {
                CEMIFrame::build_group_read(message_code, self.source, destination, buf)
            }
            Payload::GroupValueWrite(value) => {
                CEMIFrame::build_group_write(message_code, self.source, destination, value, buf)
            }
            Payload::GroupValueResponse(value) => {
                CEMIFrame::build_group_response(message_code, self.source, destination, value, buf)
            }
        }
    }

    /// Decode a telegram from a complete cEMI frame (as delivered by a
    /// tunnel's `L_Data.ind`/`L_Data.req` or a routing indication).
    ///
    /// Only `A_GroupValue_*` services to a group destination are
    /// represented; anything else is rejected with `UnsupportedCEMIMessage`.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame is not a recognised `L_Data` group
    /// telegram.
    pub fn from_cemi(data: &[u8], direction: Direction) -> Result<Self> {
        let cemi = CEMIFrame::parse(data)?;
        let ldata = cemi.as_ldata()?;
        let destination = ldata
            .destination_group()
            .ok_or_else(KnxError::unsupported_cemi_message)?;

        let payload = if ldata.is_group_write() {
            Payload::GroupValueWrite(ldata.data.to_vec())
        } else if ldata.is_group_read() {
            Payload::GroupValueRead
        } else if ldata.is_group_response() {
            Payload::GroupValueResponse(ldata.data.to_vec())
        } else {
            return Err(KnxError::unsupported_cemi_message());
        };

        Ok(Self {
            source: ldata.source,
            destination: Destination::Group(destination),
            direction,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_write_round_trips_through_cemi() {
        let source = IndividualAddress::new(1, 1, 0).unwrap();
        let dest = GroupAddress::new(1, 1, 45).unwrap();
        let telegram = Telegram::group_write(source, dest, vec![0x01]);

        let mut buf = [0u8; 16];
        let len = telegram.to_cemi(CEMIMessageCode::LDataReq, &mut buf).unwrap();

        let decoded = Telegram::from_cemi(&buf[..len], Direction::Incoming).unwrap();
        assert_eq!(decoded.source, source);
        assert_eq!(decoded.destination, Destination::Group(dest));
        assert_eq!(decoded.payload, Payload::GroupValueWrite(vec![0x01]));
    }

    #[test]
    fn group_read_round_trips_through_cemi() {
        let source = IndividualAddress::new(1, 2, 5).unwrap();
        let dest = GroupAddress::new(5, 6, 7).unwrap();
        let telegram = Telegram::group_read(source, dest);

        let mut buf = [0u8; 16];
        let len = telegram.to_cemi(CEMIMessageCode::LDataInd, &mut buf).unwrap();

        let decoded = Telegram::from_cemi(&buf[..len], Direction::Incoming).unwrap();
        assert_eq!(decoded.payload, Payload::GroupValueRead);
    }

    #[test]
    fn group_response_round_trips_with_multi_byte_value() {
        let source = IndividualAddress::new(1, 1, 1).unwrap();
        let dest = GroupAddress::new(1, 2, 3).unwrap();
        let telegram = Telegram::group_response(source, dest, vec![0x0c, 0x3f]);

        let mut buf = [0u8; 16];
        let len = telegram.to_cemi(CEMIMessageCode::LDataInd, &mut buf).unwrap();

        let decoded = Telegram::from_cemi(&buf[..len], Direction::Incoming).unwrap();
        assert_eq!(decoded.payload, Payload::GroupValueResponse(vec![0x0c, 0x3f]));
    }

    #[test]
    fn individual_destination_rejected_for_encoding() {
        let source = IndividualAddress::new(1, 1, 1).unwrap();
        let telegram = Telegram {
            source,
            destination: Destination::Individual(IndividualAddress::new(1, 1, 5).unwrap()),
            direction: Direction::Outgoing,
            payload: Payload::GroupValueRead,
        };

        let mut buf = [0u8; 16];
        assert!(telegram.to_cemi(CEMIMessageCode::LDataReq, &mut buf).is_err());
    }

    #[test]
    fn value_accessor_returns_none_for_read() {
        assert_eq!(Payload::GroupValueRead.value(), None);
        assert_eq!(Payload::GroupValueWrite(vec![1]).value(), Some(&[1][..]));
    }
}
