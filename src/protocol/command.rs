use core::fmt::{self, Write};

use heapless::String;
use log::debug;

use super::line::MAX_LINE_LEN;
use super::property::PropertyId;

/// Keep-alive cadence for the heartbeat and the property refresh query.
pub const KEEPALIVE_INTERVAL_MS: u32 = 60_000;

/// Keep-alive the device expects while nothing else is going on.
const HEARTBEAT: &str = "down set_properties 13 9 60";
/// Unsolicited re-query of the sensor properties.
const REFRESH: &str = "down get_properties 3 4 4 1";
/// Poll reply when nothing is pending and nothing is due.
const IDLE: &str = "down none";
/// Full settings-and-state snapshot requested once after startup.
const INITIAL_QUERY: &str = "down get_properties 2 2 2 4 6 1 7 2 8 1 9 1";

/// Outbound command storage, bounded like every protocol line.
pub type CommandBuf = String<MAX_LINE_LEN>;

/// Milliseconds from a monotonic clock; wraps at `u32::MAX`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Millis(pub u32);

impl Millis {
    fn since(self, earlier: Millis) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }
}

/// Holds at most one pending outbound command.
///
/// The device drives all host transmissions by polling with `get_down`;
/// whatever sits in the slot when a poll arrives is what gets sent.
/// Setting a command while one is pending replaces it — there is no
/// queue.
pub struct CommandSlot {
    pending: Option<CommandBuf>,
    last_heartbeat: Millis,
    last_query: Millis,
    interval_ms: u32,
}

impl CommandSlot {
    pub fn new() -> Self {
        CommandSlot {
            pending: None,
            last_heartbeat: Millis(0),
            last_query: Millis(0),
            interval_ms: KEEPALIVE_INTERVAL_MS,
        }
    }

    pub(crate) fn set_interval(&mut self, interval_ms: u32) {
        self.interval_ms = interval_ms;
    }

    /// Store a command, replacing any still-pending one.
    pub fn set(&mut self, command: CommandBuf) {
        self.pending = Some(command);
    }

    /// Answer one device poll.
    ///
    /// Exactly one of the four outcomes fires, in priority order: the
    /// pending command (cleared), the heartbeat once the interval has
    /// elapsed, the refresh query once its interval has elapsed, or the
    /// idle reply.
    pub fn take_for_poll(&mut self, now: Millis) -> CommandBuf {
        if let Some(command) = self.pending.take() {
            debug!("sent pending command");
            return command;
        }
        if now.since(self.last_heartbeat) > self.interval_ms {
            self.last_heartbeat = now;
            debug!("sent heartbeat");
            return literal(HEARTBEAT);
        }
        if now.since(self.last_query) > self.interval_ms {
            self.last_query = now;
            debug!("sent query string");
            return literal(REFRESH);
        }
        literal(IDLE)
    }
}

impl Default for CommandSlot {
    fn default() -> Self {
        CommandSlot::new()
    }
}

/// Format a `set_properties` command for one property.
///
/// Commands are formatted at call time, not at poll time; a later value
/// for the same property simply overwrites the slot.
pub fn set_property<V: fmt::Display>(id: PropertyId, value: V) -> CommandBuf {
    let mut buf = CommandBuf::new();
    // the fixed command shapes all fit the line bound
    let _ = write!(buf, "down set_properties {} {} {}", id.group, id.member, value);
    buf
}

/// The snapshot query issued once at startup.
pub(crate) fn initial_query() -> CommandBuf {
    literal(INITIAL_QUERY)
}

fn literal(s: &str) -> CommandBuf {
    let mut buf = CommandBuf::new();
    // protocol literals are all shorter than the line bound
    let _ = buf.push_str(s);
    buf
}
