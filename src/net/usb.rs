//! USB-HID transport for KNX USB interfaces.
//!
//! KNX USB devices exchange cEMI frames as 64-byte HID reports rather than
//! KNXnet/IP frames: `communication_channel_id` and ack frames don't exist
//! at this layer (see spec §4.7), only the reassembled cEMI payload. Reads
//! block on `hidapi`, so they run on a dedicated `spawn_blocking` worker
//! that forwards reassembled frames back to the async world over an
//! `mpsc` channel.
//!
//! ## HID report layout
//!
//! ```text
//! byte 0       report id (0x01)
//! byte 1       (sequence_number << 4) | packet_type
//! byte 2       body_length (of the *complete* KNX frame, first report only)
//! bytes 3..    KNX USB Transfer Protocol header (8 bytes, first report only)
//!              followed by cEMI payload, continued across subsequent reports
//! ```
//!
//! A frame spans at most 5 reports (sequence numbers 1..=5). `packet_type`
//! combines two flags: `FIRST` (0b01) and `LAST` (0b10), giving
//! `START_END`, `START_PARTIAL`, `PARTIAL`, `PARTIAL_END`.

use crate::error::{KnxError, Result};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Size of a USB HID report for KNX USB interfaces.
pub const HID_REPORT_SIZE: usize = 64;

/// Bytes of framing overhead (report id, sequence/type, body length) on
/// every HID report.
const REPORT_HEADER_SIZE: usize = 3;

/// Bytes of KNX USB Transfer Protocol header present only on the first
/// report of a frame.
const TRANSFER_PROTOCOL_HEADER_SIZE: usize = 8;

const FIRST: u8 = 0b01;
const LAST: u8 = 0b10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PacketType {
    Partial,
    StartPartial,
    PartialEnd,
    StartEnd,
}

impl PacketType {
    const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::Partial,
            0b01 => Self::StartPartial,
            0b10 => Self::PartialEnd,
            _ => Self::StartEnd,
        }
    }

    const fn is_first(self) -> bool {
        matches!(self, Self::StartPartial | Self::StartEnd)
    }

    const fn is_last(self) -> bool {
        matches!(self, Self::PartialEnd | Self::StartEnd)
    }

    const fn bits(self) -> u8 {
        match self {
            Self::Partial => 0,
            Self::StartPartial => FIRST,
            Self::PartialEnd => LAST,
            Self::StartEnd => FIRST | LAST,
        }
    }
}

/// Incremental reassembly of HID reports into a cEMI frame.
///
/// Tracks the expected sequence number and discards (and logs) partial
/// state on any out-of-order or skipped report, per spec §4.4.
#[derive(Debug, Default)]
struct Reassembler {
    buffer: Vec<u8>,
    expected_total: usize,
    next_sequence: u8,
    in_progress: bool,
}

impl Reassembler {
    /// Feed one HID report. Returns `Some(frame)` once a complete KNX
    /// frame (the 8-byte transfer-protocol header plus cEMI body) has been
    /// reassembled.
    fn feed(&mut self, report: &[u8]) -> Result<Option<Vec<u8>>> {
        if report.len() < REPORT_HEADER_SIZE {
            return Err(KnxError::usb_reassembly());
        }

        let sequence = report[1] >> 4;
        let packet_type = PacketType::from_bits(report[1]);
        let body_length = report[2] as usize;

        if packet_type.is_first() {
            self.buffer.clear();
            self.expected_total = body_length;
            self.next_sequence = 1;
            self.in_progress = true;
        }

        if !self.in_progress || sequence != self.next_sequence {
            self.in_progress = false;
            self.buffer.clear();
            return Err(KnxError::usb_reassembly());
        }

        let payload_start = REPORT_HEADER_SIZE;
        self.buffer.extend_from_slice(&report[payload_start..]);
        self.next_sequence += 1;

        if packet_type.is_last() {
            self.in_progress = false;
            self.buffer.truncate(self.expected_total.min(self.buffer.len()));
            if self.buffer.len() < TRANSFER_PROTOCOL_HEADER_SIZE {
                self.buffer.clear();
                return Err(KnxError::usb_reassembly());
            }
            let frame = self.buffer.split_off(TRANSFER_PROTOCOL_HEADER_SIZE);
            self.buffer.clear();
            return Ok(Some(frame));
        }

        Ok(None)
    }
}

/// Split a cEMI frame into up to 5 HID reports for transmission.
fn fragment(cemi_data: &[u8]) -> Result<Vec<[u8; HID_REPORT_SIZE]>> {
    let total = TRANSFER_PROTOCOL_HEADER_SIZE + cemi_data.len();
    let payload_capacity = HID_REPORT_SIZE - REPORT_HEADER_SIZE;
    let report_count = total.div_ceil(payload_capacity);

    if report_count == 0 || report_count > 5 {
        return Err(KnxError::usb_reassembly());
    }

    let mut transfer_header = [0u8; TRANSFER_PROTOCOL_HEADER_SIZE];
    transfer_header[0] = TRANSFER_PROTOCOL_HEADER_SIZE as u8;

    let mut payload = Vec::with_capacity(total);
    payload.extend_from_slice(&transfer_header);
    payload.extend_from_slice(cemi_data);

    let mut reports = Vec::with_capacity(report_count);
    for (i, chunk) in payload.chunks(payload_capacity).enumerate() {
        let sequence = (i + 1) as u8;
        let packet_type = match (i == 0, i == report_count - 1) {
            (true, true) => PacketType::StartEnd,
            (true, false) => PacketType::StartPartial,
            (false, true) => PacketType::PartialEnd,
            (false, false) => PacketType::Partial,
        };

        let mut report = [0u8; HID_REPORT_SIZE];
        report[0] = 0x01;
        report[1] = (sequence << 4) | packet_type.bits();
        report[2] = total as u8;
        report[REPORT_HEADER_SIZE..REPORT_HEADER_SIZE + chunk.len()].copy_from_slice(chunk);
        reports.push(report);
    }

    Ok(reports)
}

/// Async handle to a KNX USB-HID interface.
///
/// Reads happen on a `spawn_blocking` worker (hidapi is a blocking API);
/// reassembled cEMI frames arrive over [`recv_cemi`](Self::recv_cemi).
pub struct UsbHidTransport {
    device: Arc<hidapi::HidDevice>,
    frames: mpsc::Receiver<Vec<u8>>,
}

impl UsbHidTransport {
    /// Open the first matching KNX USB interface for `vendor_id`/`product_id`
    /// and spawn its read worker.
    pub fn open(vendor_id: u16, product_id: u16) -> Result<Self> {
        let api = hidapi::HidApi::new().map_err(|_| KnxError::socket_error())?;
        let device = api.open(vendor_id, product_id).map_err(|_| KnxError::socket_error())?;
        let device = Arc::new(device);

        let (tx, rx) = mpsc::channel(16);
        let worker_device = Arc::clone(&device);
        tokio::task::spawn_blocking(move || read_worker(&worker_device, &tx));

        Ok(Self { device, frames: rx })
    }

    /// Send a cEMI frame, fragmenting it into HID reports.
    pub async fn send_cemi(&self, cemi_data: &[u8]) -> Result<()> {
        let reports = fragment(cemi_data)?;
        let device = Arc::clone(&self.device);
        tokio::task::spawn_blocking(move || {
            for report in &reports {
                device.write(report).map_err(|_| KnxError::send_failed())?;
            }
            Ok::<(), KnxError>(())
        })
        .await
        .map_err(|_| KnxError::send_failed())??;
        Ok(())
    }

    /// Receive the next reassembled cEMI frame.
    pub async fn recv_cemi(&mut self) -> Result<Vec<u8>> {
        self.frames.recv().await.ok_or_else(KnxError::not_connected)
    }
}

fn read_worker(device: &hidapi::HidDevice, tx: &mpsc::Sender<Vec<u8>>) {
    let mut reassembler = Reassembler::default();
    let mut buf = [0u8; HID_REPORT_SIZE];

    loop {
        let Ok(n) = device.read(&mut buf) else { break };
        if n == 0 {
            continue;
        }

        match reassembler.feed(&buf[..n]) {
            Ok(Some(frame)) => {
                if tx.blocking_send(frame).is_err() {
                    break;
                }
            }
            Ok(None) => {}
            Err(_) => tracing::warn!("discarding out-of-sequence USB-HID fragment"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_and_reassemble_single_report() {
        let cemi = [0x29, 0x00, 0xBC, 0xE0, 0x11, 0xFF, 0x01, 0x00];
        let reports = fragment(&cemi).unwrap();
        assert_eq!(reports.len(), 1);

        let mut reassembler = Reassembler::default();
        let frame = reassembler.feed(&reports[0]).unwrap().unwrap();
        assert_eq!(frame, cemi);
    }

    #[test]
    fn fragment_and_reassemble_multi_report() {
        let cemi = vec![0xAB; 120];
        let reports = fragment(&cemi).unwrap();
        assert!(reports.len() > 1);

        let mut reassembler = Reassembler::default();
        let mut result = None;
        for report in &reports {
            if let Some(frame) = reassembler.feed(report).unwrap() {
                result = Some(frame);
            }
        }
        assert_eq!(result.unwrap(), cemi);
    }

    #[test]
    fn skipped_sequence_is_discarded() {
        let cemi = vec![0xAB; 120];
        let reports = fragment(&cemi).unwrap();
        assert!(reports.len() >= 2);

        let mut reassembler = Reassembler::default();
        reassembler.feed(&reports[0]).unwrap();
        // Skip report[1], feed the last report directly.
        let result = reassembler.feed(reports.last().unwrap());
        assert!(result.is_err());
    }

    #[test]
    fn fragment_rejects_oversized_frame() {
        let cemi = vec![0u8; 1000];
        assert!(fragment(&cemi).is_err());
    }
}
