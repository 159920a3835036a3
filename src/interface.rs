use embedded_hal::serial;
use log::debug;

use crate::protocol::{
    self, Brightness, CommandSlot, Frame, Keyword, LineReader, Millis, Mode, PropertyId,
    PurifierState, RecordShape, Records,
};

/// Fixed reply to the device's network-identity query.
const REPLY_NET: &str = "local";
/// Fixed reply to the device's time query.
const REPLY_TIME: &str = "0";
/// Acknowledgement for every frame that needs no other answer.
const REPLY_ACK: &str = "ok";

/// Driver failures.
///
/// Protocol noise — truncated lines, unknown keywords, malformed records —
/// is absorbed inside the driver; only transport faults and oversized
/// pass-through commands surface here.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error<E> {
    /// The serial peripheral failed a read.
    Read(E),
    /// The serial peripheral failed a write.
    Write(E),
    /// A pass-through command exceeds the protocol line bound.
    CommandTooLong,
}

/// Driver for a Mi air purifier on its half-duplex UART link.
///
/// The device initiates every exchange: it polls the host with `get_down`
/// frames and pushes `properties_changed`/`result` frames in between.
/// [`poll`](MiPurifier::poll) drains whatever bytes have arrived and
/// answers each completed frame; commands issued through the setters are
/// parked in the outbound slot until the device next asks for one.
pub struct MiPurifier<S>
where
    S: serial::Read<u8> + serial::Write<u8>,
{
    serial: S,
    reader: LineReader,
    slot: CommandSlot,
    state: PurifierState,
}

impl<S, E> MiPurifier<S>
where
    S: serial::Read<u8, Error = E> + serial::Write<u8, Error = E>,
{
    /// Take ownership of the serial peripheral.
    ///
    /// The outbound slot starts out holding the full snapshot query, so
    /// the first device poll fetches the initial settings and state.
    pub fn new(serial: S) -> Self {
        let mut slot = CommandSlot::new();
        slot.set(protocol::initial_query());
        MiPurifier {
            serial,
            reader: LineReader::new(),
            slot,
            state: PurifierState::new(),
        }
    }

    /// Override the heartbeat/re-query cadence (60 s by default).
    pub fn keepalive_interval(mut self, interval_ms: u32) -> Self {
        self.slot.set_interval(interval_ms);
        self
    }

    /// Last state reported by the device.
    pub fn state(&self) -> &PurifierState {
        &self.state
    }

    /// Release the serial peripheral.
    pub fn free(self) -> S {
        self.serial
    }

    /// Drain and answer everything the device has sent so far.
    ///
    /// Returns as soon as the peripheral reports no more bytes; partial
    /// lines stay buffered for the next call. `now` anchors the keep-alive
    /// scheduling for any `get_down` frame answered during this pass.
    pub fn poll(&mut self, now: Millis) -> Result<(), Error<E>> {
        loop {
            let byte = match self.serial.read() {
                Ok(byte) => byte,
                Err(nb::Error::WouldBlock) => return Ok(()),
                Err(nb::Error::Other(e)) => return Err(Error::Read(e)),
            };
            if let Some(line) = self.reader.feed(byte) {
                if !line.is_empty() {
                    Self::handle_line(&mut self.serial, &mut self.slot, &mut self.state, line, now)?;
                }
            }
        }
    }

    fn handle_line(
        serial: &mut S,
        slot: &mut CommandSlot,
        state: &mut PurifierState,
        line: &str,
        now: Millis,
    ) -> Result<(), Error<E>> {
        let frame = Frame::parse(line);
        match frame.keyword {
            Keyword::Net => write_reply(serial, REPLY_NET),
            Keyword::Time => write_reply(serial, REPLY_TIME),
            Keyword::GetDown => {
                let command = slot.take_for_poll(now);
                write_reply(serial, &command)
            }
            Keyword::PropertiesChanged => {
                debug!("parsing properties_changed message");
                if let Some((id, value)) = Records::new(frame.args, RecordShape::Changed).next() {
                    state.apply(id, value);
                }
                write_reply(serial, REPLY_ACK)
            }
            Keyword::Result => {
                debug!("parsing result message");
                for (id, value) in Records::new(frame.args, RecordShape::Snapshot) {
                    state.apply(id, value);
                }
                write_reply(serial, REPLY_ACK)
            }
            // the device will not proceed until every frame is answered
            Keyword::Unknown => write_reply(serial, REPLY_ACK),
        }
    }

    /// Power the purifier on or off.
    pub fn set_power(&mut self, on: bool) {
        self.slot.set(protocol::set_property(PropertyId::POWER, on));
    }

    /// Enable or disable the feedback beeper.
    pub fn set_beeper(&mut self, on: bool) {
        self.slot.set(protocol::set_property(PropertyId::BEEPER, on));
    }

    /// Engage or release the child lock.
    pub fn set_lock(&mut self, locked: bool) {
        self.slot.set(protocol::set_property(PropertyId::LOCK, locked));
    }

    /// Switch the operating mode.
    pub fn set_mode(&mut self, mode: Mode) {
        self.slot
            .set(protocol::set_property(PropertyId::MODE, mode.repr()));
    }

    /// Set the display brightness.
    pub fn set_brightness(&mut self, brightness: Brightness) {
        self.slot
            .set(protocol::set_property(PropertyId::BRIGHTNESS, brightness.repr()));
    }

    /// Set the fan speed used in manual mode. The code goes to the device
    /// as-is; the reported speed comes back one-based.
    pub fn set_manual_speed(&mut self, speed: u8) {
        self.slot
            .set(protocol::set_property(PropertyId::MANUAL_SPEED, speed));
    }

    /// Queue a raw protocol command verbatim.
    pub fn send_command(&mut self, raw: &str) -> Result<(), Error<E>> {
        let mut buf = protocol::CommandBuf::new();
        buf.push_str(raw).map_err(|_| Error::CommandTooLong)?;
        self.slot.set(buf);
        Ok(())
    }
}

fn write_reply<S, E>(serial: &mut S, reply: &str) -> Result<(), Error<E>>
where
    S: serial::Write<u8, Error = E>,
{
    for &byte in reply.as_bytes() {
        nb::block!(serial.write(byte)).map_err(Error::Write)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MAX_LINE_LEN;
    use core::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    #[derive(Default)]
    struct Wires {
        /// device -> host
        rx: VecDeque<u8>,
        /// host -> device
        tx: Vec<u8>,
    }

    #[derive(Clone, Default)]
    struct MockSerial(Rc<RefCell<Wires>>);

    impl MockSerial {
        fn device_sends(&self, bytes: &str) {
            self.0.borrow_mut().rx.extend(bytes.bytes());
        }

        /// Everything the host wrote since the last call.
        fn host_sent(&self) -> String {
            let mut wires = self.0.borrow_mut();
            let sent = String::from_utf8(wires.tx.clone()).unwrap();
            wires.tx.clear();
            sent
        }
    }

    impl serial::Read<u8> for MockSerial {
        type Error = ();

        fn read(&mut self) -> nb::Result<u8, ()> {
            self.0
                .borrow_mut()
                .rx
                .pop_front()
                .ok_or(nb::Error::WouldBlock)
        }
    }

    impl serial::Write<u8> for MockSerial {
        type Error = ();

        fn write(&mut self, byte: u8) -> nb::Result<(), ()> {
            self.0.borrow_mut().tx.push(byte);
            Ok(())
        }

        fn flush(&mut self) -> nb::Result<(), ()> {
            Ok(())
        }
    }

    fn driver() -> (MiPurifier<MockSerial>, MockSerial) {
        let wire = MockSerial::default();
        (MiPurifier::new(wire.clone()), wire)
    }

    #[test]
    fn answers_identity_and_time_queries() {
        let (mut purifier, wire) = driver();
        wire.device_sends("net\r");
        purifier.poll(Millis(0)).unwrap();
        assert_eq!(wire.host_sent(), "local");

        wire.device_sends("time\r");
        purifier.poll(Millis(0)).unwrap();
        assert_eq!(wire.host_sent(), "0");
    }

    #[test]
    fn first_poll_serves_the_initial_snapshot_query() {
        let (mut purifier, wire) = driver();
        wire.device_sends("get_down\r");
        purifier.poll(Millis(0)).unwrap();
        assert_eq!(
            wire.host_sent(),
            "down get_properties 2 2 2 4 6 1 7 2 8 1 9 1"
        );
    }

    #[test]
    fn idle_polls_get_none_until_keepalive_is_due() {
        let (mut purifier, wire) = driver();
        wire.device_sends("get_down\r");
        purifier.poll(Millis(10)).unwrap();
        wire.host_sent();

        wire.device_sends("get_down\r");
        purifier.poll(Millis(20)).unwrap();
        assert_eq!(wire.host_sent(), "down none");

        wire.device_sends("get_down\r");
        purifier.poll(Millis(70_000)).unwrap();
        assert_eq!(wire.host_sent(), "down set_properties 13 9 60");
    }

    #[test]
    fn change_notification_updates_state() {
        let (mut purifier, wire) = driver();
        wire.device_sends("properties_changed 2 4 1\r");
        purifier.poll(Millis(0)).unwrap();
        assert_eq!(wire.host_sent(), "ok");
        assert_eq!(purifier.state().mode, Some(Mode::Night));
    }

    #[test]
    fn snapshot_updates_all_reported_properties() {
        let (mut purifier, wire) = driver();
        wire.device_sends("result 3 4 0 4.2 4 1 0 85\r");
        purifier.poll(Millis(0)).unwrap();
        assert_eq!(wire.host_sent(), "ok");
        assert_eq!(purifier.state().air_quality, Some(4.2));
        assert_eq!(purifier.state().filter_life, Some(85.0));
    }

    #[test]
    fn unknown_keyword_is_acknowledged_without_state_change() {
        let (mut purifier, wire) = driver();
        wire.device_sends("foo bar\r");
        purifier.poll(Millis(0)).unwrap();
        assert_eq!(wire.host_sent(), "ok");
        assert_eq!(*purifier.state(), PurifierState::new());
    }

    #[test]
    fn empty_lines_are_ignored() {
        let (mut purifier, wire) = driver();
        wire.device_sends("\r\r");
        purifier.poll(Millis(0)).unwrap();
        assert_eq!(wire.host_sent(), "");
    }

    #[test]
    fn line_split_across_polls_stays_one_frame() {
        let (mut purifier, wire) = driver();
        wire.device_sends("ne");
        purifier.poll(Millis(0)).unwrap();
        assert_eq!(wire.host_sent(), "");

        wire.device_sends("t\r");
        purifier.poll(Millis(0)).unwrap();
        assert_eq!(wire.host_sent(), "local");
    }

    #[test]
    fn setters_format_wire_commands() {
        let (mut purifier, wire) = driver();
        wire.device_sends("get_down\r");
        purifier.poll(Millis(0)).unwrap();
        wire.host_sent(); // consume the preloaded snapshot query

        purifier.set_power(true);
        wire.device_sends("get_down\r");
        purifier.poll(Millis(0)).unwrap();
        assert_eq!(wire.host_sent(), "down set_properties 2 1 true");

        purifier.set_mode(Mode::Night);
        wire.device_sends("get_down\r");
        purifier.poll(Millis(1)).unwrap();
        assert_eq!(wire.host_sent(), "down set_properties 2 4 1");

        purifier.set_brightness(Brightness::Low);
        wire.device_sends("get_down\r");
        purifier.poll(Millis(2)).unwrap();
        assert_eq!(wire.host_sent(), "down set_properties 7 2 1");

        purifier.set_manual_speed(7);
        wire.device_sends("get_down\r");
        purifier.poll(Millis(3)).unwrap();
        assert_eq!(wire.host_sent(), "down set_properties 9 1 7");
    }

    #[test]
    fn pass_through_command_replaces_the_pending_one() {
        let (mut purifier, wire) = driver();
        purifier.send_command("down set_properties 13 9 60").unwrap();
        wire.device_sends("get_down\r");
        purifier.poll(Millis(0)).unwrap();
        assert_eq!(wire.host_sent(), "down set_properties 13 9 60");
    }

    #[test]
    fn oversized_pass_through_is_rejected() {
        let (mut purifier, _wire) = driver();
        let long = "x".repeat(MAX_LINE_LEN + 1);
        assert_eq!(purifier.send_command(&long), Err(Error::CommandTooLong));
    }
}
