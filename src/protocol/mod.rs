mod command;
mod frame;
mod line;
mod property;

pub mod types;

pub(crate) use command::initial_query;
pub use command::{set_property, CommandBuf, CommandSlot, Millis, KEEPALIVE_INTERVAL_MS};
pub use frame::{Args, Frame, Keyword};
pub use line::{LineReader, MAX_LINE_LEN};
pub use property::{PropertyId, PurifierState, RecordShape, Records};
pub use types::{Brightness, Mode};
