//! ionbuf: single-pass binary object writer with cached field keys
//!
//! This crate writes typed field/value pairs straight into a caller-supplied
//! buffer. Objects are framed with a fixed-width length placeholder that is
//! backpatched once the body is known, so no intermediate tree is built and
//! nothing is allocated on the write path.
//!
//! # Wire Format
//!
//! Every element starts with a lead byte: type code in the high nibble, a
//! small parameter in the low nibble. Multi-byte values are big-endian.
//!
//! ```text
//! bool      [0x11 | 0x12]
//! int64     [0x28] [8 bytes]
//! float32   [0x44] [4 bytes]
//! float64   [0x48] [8 bytes]
//! utf-8     [0x5W] [length, W bytes] [bytes]
//! object    [0xAW] [length, W bytes] [key value]*
//! key       [0xE0 | len] [name]            name <= 7 bytes
//!           [0xD1] [len] [name]            name <= 255 bytes
//! ```
//!
//! # Features
//!
//! - Allocation-free encoding into user-provided buffers
//! - Field keys encoded once per type and replayed verbatim
//! - Exact pre-sizing with [`ObjectWriter::encoded_len`]
//! - Race-safe, process-wide metadata registry (`std`)
//! - `no_std` support with `alloc`
//!
//! # Example
//!
//! ```rust
//! use ionbuf::{LengthClass, ObjectWriter, Record, Schema};
//!
//! struct Trade {
//!     price: f64,
//!     qty: i64,
//!     symbol: String,
//! }
//!
//! impl Record for Trade {
//!     fn describe(schema: &mut Schema<'_, Self>) {
//!         schema
//!             .field("price", |t| &t.price)
//!             .field("qty", |t| &t.qty)
//!             .field("symbol", |t| &t.symbol);
//!     }
//! }
//!
//! let trade = Trade { price: 50.25, qty: 100, symbol: "AAPL".into() };
//! let writer = ObjectWriter::<Trade>::new()?;
//!
//! let mut buf = [0u8; 128];
//! let size = writer.write_object(&trade, LengthClass::U8, &mut buf, 0)?;
//! assert_eq!(size, writer.encoded_len(&trade, LengthClass::U8));
//! assert_eq!(buf[0], 0xA1);
//! assert_eq!(buf[1] as usize, size - 2);
//! # Ok::<(), ionbuf::Error>(())
//! ```

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

pub mod encoder;
pub mod error;
pub mod frame;
pub mod key;
pub mod primitive;
#[cfg(feature = "std")]
pub mod registry;
pub mod schema;
pub mod tag;
pub mod writer;

// Re-export main types
pub use encoder::Encoder;
pub use error::{Error, Result};
pub use frame::{write_object_begin, write_object_end, ObjectFrame};
pub use key::{encode_key, write_key, KeyBytes};
pub use primitive::{
    write_boolean, write_direct, write_float32, write_float64, write_int64, write_utf8,
};
pub use schema::{FieldDescriptor, Record, Schema, TypeMetadata, TypeTag};
pub use tag::LengthClass;
#[cfg(feature = "std")]
pub use writer::write_object;
pub use writer::ObjectWriter;
