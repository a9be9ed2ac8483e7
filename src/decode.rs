use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::io::Read;

use bytes::Bytes;
use tracing::debug;

use crate::config::DecoderConfig;
use crate::error::{BencodeError, Limit, SyntaxError};
use crate::lexer::Lexer;
use crate::value::Value;

/// A type that can be decoded from bencode.
///
/// Each method receives one kind of bencode value. The defaults reject the
/// kind with [`BencodeError::TypeMismatch`], so an implementation only
/// overrides the kinds it accepts. Implementing this trait for your own types
/// is how custom decoding hooks into [`Decoder`].
///
/// # Examples
///
/// ```
/// use rbencode::{decode_as, BencodeError, Decode, DictDecoder};
/// use std::io::Read;
///
/// struct Peer {
///     ip: String,
///     port: u16,
/// }
///
/// impl Decode for Peer {
///     fn decode_dict<R: Read>(dict: &mut DictDecoder<'_, R>) -> Result<Self, BencodeError> {
///         let (mut ip, mut port) = (String::new(), 0);
///         while let Some(key) = dict.next_key()? {
///             match &key[..] {
///                 b"ip" => ip = dict.next_value()?,
///                 b"port" => port = dict.next_value()?,
///                 _ => dict.skip_value()?,
///             }
///         }
///         Ok(Peer { ip, port })
///     }
/// }
///
/// let peer: Peer = decode_as(b"d2:ip9:127.0.0.14:porti6881ee").unwrap();
/// assert_eq!(peer.ip, "127.0.0.1");
/// assert_eq!(peer.port, 6881);
/// ```
pub trait Decode: Sized {
    /// Receives a byte string payload.
    fn decode_bytes(bytes: Bytes) -> Result<Self, BencodeError> {
        Err(BencodeError::mismatch::<Self>(format!(
            "string of {} bytes",
            bytes.len()
        )))
    }

    /// Receives the canonical decimal text of an integer, sign included.
    fn decode_integer(digits: &str) -> Result<Self, BencodeError> {
        Err(BencodeError::integer_mismatch::<Self>(digits))
    }

    fn decode_list<R: Read>(list: &mut ListDecoder<'_, R>) -> Result<Self, BencodeError> {
        let _ = list;
        Err(BencodeError::mismatch::<Self>("list"))
    }

    fn decode_dict<R: Read>(dict: &mut DictDecoder<'_, R>) -> Result<Self, BencodeError> {
        let _ = dict;
        Err(BencodeError::mismatch::<Self>("dictionary"))
    }
}

/// Streaming bencode decoder.
///
/// Each call to [`decode`](Decoder::decode) reads exactly one top-level value.
/// Bytes read from the source past the end of that value are kept for the next
/// call, so a concatenated sequence of values can be decoded from one stream.
///
/// # Examples
///
/// ```
/// use rbencode::Decoder;
///
/// let mut decoder = Decoder::new(&b"i1ei2e"[..]);
/// assert_eq!(decoder.decode::<i64>().unwrap(), 1);
/// assert_eq!(decoder.decode::<i64>().unwrap(), 2);
/// assert_eq!(decoder.try_decode::<i64>().unwrap(), None);
/// ```
pub struct Decoder<R> {
    lexer: Lexer<R>,
    config: DecoderConfig,
    elements: usize,
}

impl<R: Read> Decoder<R> {
    pub fn new(src: R) -> Self {
        Self::with_config(src, DecoderConfig::default())
    }

    pub fn with_config(src: R, config: DecoderConfig) -> Self {
        Self {
            lexer: Lexer::new(src, config.min_buffer_size.max(1)),
            config,
            elements: 0,
        }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Stream offset of the first byte not yet consumed by a decoded value.
    pub fn position(&self) -> u64 {
        self.lexer.position()
    }

    /// Bytes already read from the source but not yet decoded.
    pub fn buffered(&self) -> &[u8] {
        self.lexer.buffered()
    }

    pub fn get_ref(&self) -> &R {
        self.lexer.get_ref()
    }

    /// Returns the source. Any [`buffered`](Decoder::buffered) bytes are lost.
    pub fn into_inner(self) -> R {
        self.lexer.into_inner()
    }

    /// Returns `true` once the source holds no further input.
    pub fn is_exhausted(&mut self) -> Result<bool, BencodeError> {
        self.lexer.at_eof()
    }

    /// Decodes the next top-level value.
    ///
    /// Returns [`BencodeError::Eof`] if the source ends before the value starts.
    /// Any other error leaves the decoder positioned somewhere inside the
    /// failed value.
    pub fn decode<T: Decode>(&mut self) -> Result<T, BencodeError> {
        self.lexer.commit();
        let result = match self.lexer.next_or_eof() {
            Ok(Some(byte)) => self.dispatch(byte, 0),
            Ok(None) => Err(BencodeError::Eof),
            Err(e) => Err(e),
        };
        self.elements = 0;
        self.lexer.reset();
        result
    }

    /// Like [`decode`](Decoder::decode), but a clean end of input yields `None`.
    pub fn try_decode<T: Decode>(&mut self) -> Result<Option<T>, BencodeError> {
        match self.decode() {
            Ok(value) => Ok(Some(value)),
            Err(BencodeError::Eof) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn decode_value<T: Decode>(&mut self, depth: usize) -> Result<T, BencodeError> {
        self.lexer.commit();
        let byte = self.lexer.next()?;
        self.dispatch(byte, depth)
    }

    fn dispatch<T: Decode>(&mut self, byte: u8, depth: usize) -> Result<T, BencodeError> {
        match byte {
            b'i' => {
                let digits = self.scan_integer()?;
                T::decode_integer(ascii(&digits))
            }
            b'l' => {
                let mut list = self.list(depth)?;
                let value = T::decode_list(&mut list)?;
                list.finish()?;
                Ok(value)
            }
            b'd' => {
                let mut dict = self.dict(depth)?;
                let value = T::decode_dict(&mut dict)?;
                dict.finish()?;
                Ok(value)
            }
            b'0'..=b'9' => {
                self.lexer.backup();
                let bytes = self.scan_string()?;
                T::decode_bytes(bytes)
            }
            other => Err(BencodeError::syntax(
                self.lexer.last_offset(),
                SyntaxError::UnexpectedByte(other),
            )),
        }
    }

    /// Checks the syntax of one value, including key order and limits,
    /// without building it.
    fn skip_value(&mut self, depth: usize) -> Result<(), BencodeError> {
        self.lexer.commit();
        match self.lexer.next()? {
            b'i' => self.scan_integer().map(drop),
            b'l' => self.list(depth)?.finish(),
            b'd' => self.dict(depth)?.finish(),
            b'0'..=b'9' => {
                self.lexer.backup();
                self.scan_string().map(drop)
            }
            other => Err(BencodeError::syntax(
                self.lexer.last_offset(),
                SyntaxError::UnexpectedByte(other),
            )),
        }
    }

    fn list(&mut self, depth: usize) -> Result<ListDecoder<'_, R>, BencodeError> {
        Ok(ListDecoder {
            depth: self.enter(depth)?,
            decoder: self,
            done: false,
        })
    }

    fn dict(&mut self, depth: usize) -> Result<DictDecoder<'_, R>, BencodeError> {
        Ok(DictDecoder {
            depth: self.enter(depth)?,
            strict: self.config.strict,
            decoder: self,
            done: false,
            pending_value: false,
            last_key: None,
        })
    }

    fn enter(&self, depth: usize) -> Result<usize, BencodeError> {
        let depth = depth + 1;
        if depth > self.config.max_depth {
            debug!(depth, "nesting limit exceeded");
            return Err(BencodeError::LimitExceeded {
                offset: self.lexer.last_offset(),
                limit: Limit::Depth,
                max: self.config.max_depth,
            });
        }
        Ok(depth)
    }

    fn count_element(&mut self) -> Result<(), BencodeError> {
        self.elements += 1;
        if self.elements > self.config.max_elements {
            debug!(elements = self.elements, "element limit exceeded");
            return Err(BencodeError::LimitExceeded {
                offset: self.lexer.position(),
                limit: Limit::Elements,
                max: self.config.max_elements,
            });
        }
        Ok(())
    }

    /// Consumes a list or dictionary terminator if one is next.
    fn at_end(&mut self) -> Result<bool, BencodeError> {
        self.lexer.commit();
        if self.lexer.next()? == b'e' {
            self.lexer.commit();
            return Ok(true);
        }
        self.lexer.backup();
        Ok(false)
    }

    /// Scans `<digits>e` after the opening `i`, returning the digits with sign.
    fn scan_integer(&mut self) -> Result<Bytes, BencodeError> {
        self.lexer.commit();

        let mut scanned = 0;
        let mut negative = false;
        let mut leading_zero = false;
        loop {
            let byte = self.lexer.next()?;
            let offset = self.lexer.last_offset();
            match byte {
                b'e' => break,
                b'-' if scanned == 0 => negative = true,
                b'-' => return Err(BencodeError::syntax(offset, SyntaxError::MisplacedSign)),
                b'0'..=b'9' => {
                    if leading_zero {
                        return Err(BencodeError::syntax(offset, SyntaxError::LeadingZero));
                    }
                    if scanned - usize::from(negative) >= self.config.max_integer_len {
                        debug!(offset, "integer length limit exceeded");
                        return Err(BencodeError::LimitExceeded {
                            offset,
                            limit: Limit::IntegerLength,
                            max: self.config.max_integer_len,
                        });
                    }
                    let first_digit = scanned == usize::from(negative);
                    if first_digit && byte == b'0' {
                        if negative {
                            return Err(BencodeError::syntax(offset, SyntaxError::NegativeZero));
                        }
                        leading_zero = true;
                    }
                }
                other => {
                    return Err(BencodeError::syntax(
                        offset,
                        SyntaxError::InvalidIntegerByte(other),
                    ))
                }
            }
            scanned += 1;
        }

        if scanned == usize::from(negative) {
            return Err(BencodeError::syntax(
                self.lexer.last_offset(),
                SyntaxError::EmptyInteger,
            ));
        }

        self.lexer.backup();
        let digits = self.lexer.cut();
        self.lexer.next()?;
        self.lexer.commit();
        Ok(digits)
    }

    /// Scans `<length>:<payload>` with the cursor on the first length digit.
    ///
    /// Lengths with a leading zero are rejected; the encoder never writes them.
    fn scan_string(&mut self) -> Result<Bytes, BencodeError> {
        self.lexer.commit();

        let mut length: usize = 0;
        let mut digits = 0;
        loop {
            let byte = self.lexer.next()?;
            let offset = self.lexer.last_offset();
            match byte {
                b':' if digits > 0 => break,
                b'0'..=b'9' => {
                    if digits == 1 && length == 0 {
                        return Err(BencodeError::syntax(offset, SyntaxError::LeadingZero));
                    }
                    length = length
                        .checked_mul(10)
                        .and_then(|l| l.checked_add(usize::from(byte - b'0')))
                        .ok_or_else(|| BencodeError::syntax(offset, SyntaxError::LengthOverflow))?;
                    digits += 1;
                }
                other => {
                    return Err(BencodeError::syntax(
                        offset,
                        SyntaxError::InvalidLengthByte(other),
                    ))
                }
            }
        }

        if length > self.config.max_string_len {
            debug!(length, "string length limit exceeded");
            return Err(BencodeError::LimitExceeded {
                offset: self.lexer.last_offset(),
                limit: Limit::StringLength,
                max: self.config.max_string_len,
            });
        }

        self.lexer.commit();
        self.lexer.skip(length)?;
        Ok(self.lexer.cut())
    }

    /// Scans a dictionary key, returning its stream offset and payload.
    fn scan_key(&mut self) -> Result<(u64, Bytes), BencodeError> {
        self.lexer.commit();
        let byte = self.lexer.next()?;
        let offset = self.lexer.last_offset();
        if !byte.is_ascii_digit() {
            return Err(BencodeError::syntax(offset, SyntaxError::NonStringKey(byte)));
        }
        self.lexer.backup();
        Ok((offset, self.scan_string()?))
    }
}

/// Access to the elements of a list being decoded.
///
/// Elements left unread when [`Decode::decode_list`] returns are still
/// checked for syntax and then discarded, whatever their size.
pub struct ListDecoder<'a, R> {
    decoder: &'a mut Decoder<R>,
    depth: usize,
    done: bool,
}

impl<R: Read> ListDecoder<'_, R> {
    /// Decodes the next element, or returns `None` at the end of the list.
    pub fn next_element<T: Decode>(&mut self) -> Result<Option<T>, BencodeError> {
        if self.done {
            return Ok(None);
        }
        if self.decoder.at_end()? {
            self.done = true;
            return Ok(None);
        }
        self.decoder.count_element()?;
        self.decoder.decode_value(self.depth).map(Some)
    }

    fn finish(&mut self) -> Result<(), BencodeError> {
        while !self.done {
            if self.decoder.at_end()? {
                self.done = true;
                break;
            }
            self.decoder.count_element()?;
            self.decoder.skip_value(self.depth)?;
        }
        Ok(())
    }
}

/// Access to the entries of a dictionary being decoded.
///
/// In strict mode every key must sort after the one before it; in lenient mode
/// keys are returned in input order, repeats included.
pub struct DictDecoder<'a, R> {
    decoder: &'a mut Decoder<R>,
    depth: usize,
    strict: bool,
    done: bool,
    pending_value: bool,
    last_key: Option<Bytes>,
}

impl<R: Read> DictDecoder<'_, R> {
    /// Reads the next key, or returns `None` at the end of the dictionary.
    ///
    /// If the previous key's value was not read it is skipped first.
    pub fn next_key(&mut self) -> Result<Option<Bytes>, BencodeError> {
        if self.pending_value {
            self.skip_value()?;
        }
        if self.done {
            return Ok(None);
        }
        if self.decoder.at_end()? {
            self.done = true;
            return Ok(None);
        }

        let (offset, key) = self.decoder.scan_key()?;
        self.decoder.count_element()?;

        if self.strict {
            if let Some(last) = &self.last_key {
                let kind = match key.cmp(last) {
                    Ordering::Greater => None,
                    Ordering::Equal => Some(SyntaxError::DuplicateKey),
                    Ordering::Less => Some(SyntaxError::UnsortedKey),
                };
                if let Some(kind) = kind {
                    debug!(offset, "rejecting non-canonical dictionary key");
                    return Err(BencodeError::syntax(offset, kind));
                }
            }
            self.last_key = Some(key.clone());
        }

        self.pending_value = true;
        Ok(Some(key))
    }

    /// Decodes the value belonging to the key last returned by
    /// [`next_key`](DictDecoder::next_key).
    ///
    /// Fails with [`BencodeError::MissingKey`] if no key is waiting for its value.
    pub fn next_value<T: Decode>(&mut self) -> Result<T, BencodeError> {
        self.take_pending()?;
        self.decoder.decode_value(self.depth)
    }

    /// Checks the syntax of the value belonging to the last key and discards it.
    pub fn skip_value(&mut self) -> Result<(), BencodeError> {
        self.take_pending()?;
        self.decoder.skip_value(self.depth)
    }

    fn take_pending(&mut self) -> Result<(), BencodeError> {
        if !self.pending_value {
            return Err(BencodeError::MissingKey(self.decoder.lexer.position()));
        }
        self.pending_value = false;
        Ok(())
    }

    /// Reads the next key and its value together.
    pub fn next_entry<K: Decode, V: Decode>(&mut self) -> Result<Option<(K, V)>, BencodeError> {
        let Some(key) = self.next_key()? else {
            return Ok(None);
        };
        let key = K::decode_bytes(key)?;
        let value = self.next_value()?;
        Ok(Some((key, value)))
    }

    fn finish(&mut self) -> Result<(), BencodeError> {
        while self.next_key()?.is_some() {}
        Ok(())
    }
}

/// Decodes a single value that must span all of `data`.
///
/// # Examples
///
/// ```
/// use rbencode::{decode, Value};
///
/// let value = decode(b"l4:spami42ee").unwrap();
/// assert_eq!(value.as_list().map(|l| l.len()), Some(2));
///
/// assert!(decode(b"i42eextra").is_err());
/// ```
pub fn decode(data: &[u8]) -> Result<Value, BencodeError> {
    decode_as(data)
}

/// Decodes a single value of type `T` that must span all of `data`.
///
/// # Examples
///
/// ```
/// use rbencode::decode_as;
///
/// let numbers: Vec<i32> = decode_as(b"li1ei2ei3ee").unwrap();
/// assert_eq!(numbers, vec![1, 2, 3]);
///
/// let err = decode_as::<i32>(b"1:a").unwrap_err();
/// assert!(err.is_type_mismatch());
/// ```
pub fn decode_as<T: Decode>(data: &[u8]) -> Result<T, BencodeError> {
    let mut decoder = Decoder::new(data);
    let value = match decoder.decode() {
        Err(BencodeError::Eof) => {
            return Err(BencodeError::syntax(0, SyntaxError::UnexpectedEof));
        }
        result => result?,
    };
    if !decoder.is_exhausted()? {
        return Err(BencodeError::syntax(
            decoder.position(),
            SyntaxError::TrailingData,
        ));
    }
    Ok(value)
}

// Scanned integer tokens only ever hold '-' and ASCII digits.
fn ascii(token: &[u8]) -> &str {
    std::str::from_utf8(token).unwrap_or_default()
}

macro_rules! decode_integer {
    ($($ty:ty),*) => {$(
        impl Decode for $ty {
            fn decode_integer(digits: &str) -> Result<Self, BencodeError> {
                digits
                    .parse()
                    .map_err(|_| BencodeError::integer_mismatch::<$ty>(digits))
            }
        }
    )*};
}

decode_integer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl Decode for Bytes {
    fn decode_bytes(bytes: Bytes) -> Result<Self, BencodeError> {
        Ok(bytes)
    }
}

impl Decode for String {
    fn decode_bytes(bytes: Bytes) -> Result<Self, BencodeError> {
        String::from_utf8(bytes.to_vec()).map_err(|_| {
            BencodeError::mismatch::<String>(format!(
                "non-UTF-8 string of {} bytes",
                bytes.len()
            ))
        })
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode_list<R: Read>(list: &mut ListDecoder<'_, R>) -> Result<Self, BencodeError> {
        let mut items = Vec::new();
        while let Some(item) = list.next_element()? {
            items.push(item);
        }
        Ok(items)
    }
}

impl<K: Decode + Ord, V: Decode> Decode for BTreeMap<K, V> {
    fn decode_dict<R: Read>(dict: &mut DictDecoder<'_, R>) -> Result<Self, BencodeError> {
        let mut map = BTreeMap::new();
        while let Some((key, value)) = dict.next_entry()? {
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<K, V, S> Decode for HashMap<K, V, S>
where
    K: Decode + Eq + Hash,
    V: Decode,
    S: BuildHasher + Default,
{
    fn decode_dict<R: Read>(dict: &mut DictDecoder<'_, R>) -> Result<Self, BencodeError> {
        let mut map = HashMap::with_hasher(S::default());
        while let Some((key, value)) = dict.next_entry()? {
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl Decode for Value {
    fn decode_bytes(bytes: Bytes) -> Result<Self, BencodeError> {
        Ok(Value::Bytes(bytes))
    }

    fn decode_integer(digits: &str) -> Result<Self, BencodeError> {
        i64::decode_integer(digits).map(Value::Integer)
    }

    fn decode_list<R: Read>(list: &mut ListDecoder<'_, R>) -> Result<Self, BencodeError> {
        Vec::decode_list(list).map(Value::List)
    }

    fn decode_dict<R: Read>(dict: &mut DictDecoder<'_, R>) -> Result<Self, BencodeError> {
        BTreeMap::decode_dict(dict).map(Value::Dict)
    }
}
