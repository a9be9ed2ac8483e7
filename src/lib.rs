//! rbencode - Streaming bencode encoding and decoding ([BEP-3]).
//!
//! Bencode is the serialization format used throughout BitTorrent for storing
//! and transmitting structured data, including `.torrent` files, tracker
//! responses and DHT messages.
//!
//! # Data Types
//!
//! | Type | Format | Example |
//! |------|--------|---------|
//! | Integer | `i<number>e` | `i42e` → 42 |
//! | Byte String | `<length>:<data>` | `4:spam` → "spam" |
//! | List | `l<items>e` | `l4:spami42ee` → ["spam", 42] |
//! | Dictionary | `d<key><value>...e` | `d3:foo3:bare` → {"foo": "bar"} |
//!
//! # Overview
//!
//! - [`Decoder`] reads one value at a time from any [`std::io::Read`],
//!   keeping a growable lookahead buffer so values of unknown length can be
//!   parsed without reading the whole stream first.
//! - [`Encoder`] writes values in canonical form to any [`std::io::Write`].
//! - [`Value`] holds a value of any kind; the [`Decode`] and [`Encode`] traits
//!   map bencode onto ordinary Rust types.
//!
//! # Examples
//!
//! ## Decoding bencode data
//!
//! ```
//! use rbencode::{decode, decode_as, Value};
//! use std::collections::BTreeMap;
//!
//! let value = decode(b"i42e").unwrap();
//! assert_eq!(value.as_integer(), Some(42));
//!
//! let value = decode(b"d3:foo3:bare").unwrap();
//! assert_eq!(value.get(b"foo").and_then(|v| v.as_str()), Some("bar"));
//!
//! // Straight into Rust types
//! let pairs: BTreeMap<String, String> = decode_as(b"d3:cow3:moo4:spam4:eggse").unwrap();
//! assert_eq!(pairs["spam"], "eggs");
//! ```
//!
//! ## Streaming
//!
//! ```
//! use rbencode::{Decoder, Value};
//!
//! let stream: &[u8] = b"d1:ai1eeli2ei3ee";
//! let mut decoder = Decoder::new(stream);
//! while let Some(value) = decoder.try_decode::<Value>().unwrap() {
//!     println!("{:?}", value);
//! }
//! assert_eq!(decoder.position(), 16);
//! ```
//!
//! ## Encoding bencode data
//!
//! ```
//! use rbencode::{encode, to_vec, Value};
//! use std::collections::HashMap;
//!
//! assert_eq!(encode(&Value::Integer(-3)).unwrap(), b"i-3e");
//!
//! // Dictionary keys are sorted by the encoder
//! let mut map = HashMap::new();
//! map.insert("spam", vec![1, 2]);
//! map.insert("cow", vec![3]);
//! assert_eq!(to_vec(&map).unwrap(), b"d3:cowli3ee4:spamli1ei2eee");
//! ```
//!
//! # Error Handling
//!
//! - [`BencodeError::Syntax`] - Malformed input, with the stream offset of the
//!   offending byte and a [`SyntaxError`] cause (leading zeros, negative zero,
//!   unsorted keys, premature end of input, ...)
//! - [`BencodeError::TypeMismatch`] - Valid bencode that does not fit the requested type
//! - [`BencodeError::LimitExceeded`] - A [`DecoderConfig`] bound was hit
//! - [`BencodeError::UnsupportedType`] - A value with no bencode representation
//! - [`BencodeError::MissingKey`] - A custom [`Decode`] impl read a dictionary value with no key
//! - [`BencodeError::Io`] - The underlying reader or writer failed
//!
//! [BEP-3]: http://bittorrent.org/beps/bep_0003.html

mod config;
mod decode;
mod encode;
mod error;
mod lexer;
mod value;

pub use config::{
    DecoderConfig, MAX_DEPTH, MAX_ELEMENTS, MAX_INTEGER_LEN, MAX_STRING_LEN, MIN_BUFFER_SIZE,
};
pub use decode::{decode, decode_as, Decode, Decoder, DictDecoder, ListDecoder};
pub use encode::{encode, to_vec, Encode, Encoder, Output};
pub use error::{BencodeError, Limit, SyntaxError};
pub use value::Value;
