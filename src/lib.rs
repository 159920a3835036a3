#![cfg_attr(not(test), no_std)]

//! mi_purifier
//!
//! Reverse-engineered implementation of the UART property protocol spoken
//! by some Mi air purifiers between the main board and the Wi-Fi module.
//! Replace the module, keep the wire format.
//!
//! It is intended for use on embedded hardware, and as such is `no_std`.
//!
//! The link is half-duplex and line-oriented: the device sends ASCII
//! frames terminated by a carriage return and expects an answer to every
//! one of them, polling the host with `get_down` whenever it is ready to
//! accept a command. Configure your serial peripheral for 115200 8N1 and
//! hand it to [`MiPurifier`](interface::MiPurifier), calling
//! [`poll`](interface::MiPurifier::poll) from your main loop.
//!
//! A typical exchange:
//!
//! ```text
//! device: get_down                      host: down none
//! device: properties_changed 2 4 0     host: ok
//! device: get_down                      host: down set_properties 2 1 true
//! ```
//!
//! ## General Usage
//!
//! Reassemble and classify a line from the serial stream:
//!
//! ```
//! use mi_purifier::protocol::{Frame, Keyword, LineReader};
//!
//! let mut reader = LineReader::new();
//! for &byte in b"properties_changed 2 4 0".iter() {
//!     assert!(reader.feed(byte).is_none());
//! }
//! let line = reader.feed(b'\r').unwrap();
//!
//! let frame = Frame::parse(line);
//! assert_eq!(frame.keyword, Keyword::PropertiesChanged);
//! ```
//!
//! Decode property records and fold them into the published state:
//!
//! ```
//! use mi_purifier::protocol::{PurifierState, RecordShape, Records};
//!
//! let mut state = PurifierState::new();
//! for (id, value) in Records::new("3 4 0 4.2 4 1 0 85".split(' '), RecordShape::Snapshot) {
//!     state.apply(id, value);
//! }
//!
//! assert_eq!(state.air_quality, Some(4.2));
//! assert_eq!(state.filter_life, Some(85.0));
//! ```

pub mod interface;
pub mod protocol;

#[doc(inline)]
pub use interface::{Error, MiPurifier};
#[doc(inline)]
pub use protocol::*;
