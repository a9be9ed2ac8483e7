use std::collections::{BTreeMap, HashMap};
use std::io::Write;

use bytes::Bytes;

use crate::error::BencodeError;
use crate::value::Value;

/// A type that can be encoded as bencode.
///
/// Implement this for your own types to control their byte representation;
/// [`Output`] provides the four canonical building blocks.
///
/// # Examples
///
/// ```
/// use rbencode::{to_vec, BencodeError, Encode, Output};
///
/// struct Peer {
///     ip: String,
///     port: u16,
/// }
///
/// impl Encode for Peer {
///     fn encode_to(&self, out: &mut Output<'_>) -> Result<(), BencodeError> {
///         out.write_dict([
///             (&b"port"[..], &self.port as &dyn Encode),
///             (&b"ip"[..], &self.ip as &dyn Encode),
///         ])
///     }
/// }
///
/// let peer = Peer { ip: "127.0.0.1".into(), port: 6881 };
/// assert_eq!(to_vec(&peer).unwrap(), b"d2:ip9:127.0.0.14:porti6881ee");
/// ```
pub trait Encode {
    fn encode_to(&self, out: &mut Output<'_>) -> Result<(), BencodeError>;
}

/// Staging area that a single top-level value is encoded into.
pub struct Output<'a> {
    buf: &'a mut Vec<u8>,
}

impl Output<'_> {
    /// Writes `i<n>e` in canonical form.
    pub fn write_integer<I: sealed::Integer>(&mut self, n: I) -> Result<(), BencodeError> {
        write!(self.buf, "i{}e", n)?;
        Ok(())
    }

    /// Writes `<len>:<bytes>` with the payload copied verbatim.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), BencodeError> {
        write!(self.buf, "{}:", bytes.len())?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    pub fn write_list<T, I>(&mut self, items: I) -> Result<(), BencodeError>
    where
        T: Encode,
        I: IntoIterator<Item = T>,
    {
        self.buf.push(b'l');
        for item in items {
            item.encode_to(self)?;
        }
        self.buf.push(b'e');
        Ok(())
    }

    /// Writes a dictionary, sorting the entries by key first.
    ///
    /// Repeated keys have no canonical encoding and are rejected.
    pub fn write_dict<K, V, I>(&mut self, entries: I) -> Result<(), BencodeError>
    where
        K: AsRef<[u8]>,
        V: Encode,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut entries: Vec<(K, V)> = entries.into_iter().collect();
        entries.sort_by(|(a, _), (b, _)| a.as_ref().cmp(b.as_ref()));
        if entries
            .windows(2)
            .any(|pair| pair[0].0.as_ref() == pair[1].0.as_ref())
        {
            return Err(BencodeError::UnsupportedType("dictionary with duplicate keys"));
        }

        self.buf.push(b'd');
        for (key, value) in &entries {
            self.write_bytes(key.as_ref())?;
            value.encode_to(self)?;
        }
        self.buf.push(b'e');
        Ok(())
    }
}

mod sealed {
    use std::fmt::Display;

    /// Primitive integers, whose `Display` output is already canonical bencode.
    pub trait Integer: Display + Copy {}

    macro_rules! integer {
        ($($ty:ty),*) => {$( impl Integer for $ty {} )*};
    }

    integer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
}

/// Canonical bencode encoder over an output sink.
///
/// Each value is staged in full before it reaches the sink, so a value that
/// fails to encode leaves nothing behind. Values written by earlier calls stay
/// written.
///
/// # Examples
///
/// ```
/// use rbencode::Encoder;
///
/// let mut encoder = Encoder::new(Vec::new());
/// encoder.encode(&42).unwrap();
/// encoder.encode("spam").unwrap();
/// assert_eq!(encoder.into_inner(), b"i42e4:spam");
/// ```
pub struct Encoder<W> {
    sink: W,
    scratch: Vec<u8>,
}

impl<W: Write> Encoder<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            scratch: Vec::new(),
        }
    }

    pub fn encode<T: Encode + ?Sized>(&mut self, value: &T) -> Result<(), BencodeError> {
        self.scratch.clear();
        value.encode_to(&mut Output {
            buf: &mut self.scratch,
        })?;
        self.sink.write_all(&self.scratch)?;
        Ok(())
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

/// Encodes a bencode value to a byte vector.
///
/// # Examples
///
/// ```
/// use rbencode::{encode, Value};
/// use std::collections::BTreeMap;
/// use bytes::Bytes;
///
/// assert_eq!(encode(&Value::Integer(42)).unwrap(), b"i42e");
/// assert_eq!(encode(&Value::string("hello")).unwrap(), b"5:hello");
///
/// let list = Value::List(vec![Value::Integer(1), Value::string("two")]);
/// assert_eq!(encode(&list).unwrap(), b"li1e3:twoe");
///
/// let mut dict = BTreeMap::new();
/// dict.insert(Bytes::from_static(b"b"), Value::Integer(2));
/// dict.insert(Bytes::from_static(b"a"), Value::Integer(1));
/// assert_eq!(encode(&Value::Dict(dict)).unwrap(), b"d1:ai1e1:bi2ee");
/// ```
pub fn encode(value: &Value) -> Result<Vec<u8>, BencodeError> {
    to_vec(value)
}

/// Encodes any [`Encode`] type to a byte vector.
pub fn to_vec<T: Encode + ?Sized>(value: &T) -> Result<Vec<u8>, BencodeError> {
    let mut buf = Vec::new();
    value.encode_to(&mut Output { buf: &mut buf })?;
    Ok(buf)
}

macro_rules! encode_integer {
    ($($ty:ty),*) => {$(
        impl Encode for $ty {
            fn encode_to(&self, out: &mut Output<'_>) -> Result<(), BencodeError> {
                out.write_integer(*self)
            }
        }
    )*};
}

encode_integer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl Encode for str {
    fn encode_to(&self, out: &mut Output<'_>) -> Result<(), BencodeError> {
        out.write_bytes(self.as_bytes())
    }
}

impl Encode for String {
    fn encode_to(&self, out: &mut Output<'_>) -> Result<(), BencodeError> {
        out.write_bytes(self.as_bytes())
    }
}

impl Encode for Bytes {
    fn encode_to(&self, out: &mut Output<'_>) -> Result<(), BencodeError> {
        out.write_bytes(self)
    }
}

impl<T: Encode> Encode for [T] {
    fn encode_to(&self, out: &mut Output<'_>) -> Result<(), BencodeError> {
        out.write_list(self)
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode_to(&self, out: &mut Output<'_>) -> Result<(), BencodeError> {
        out.write_list(self)
    }
}

impl<K: AsRef<[u8]>, V: Encode> Encode for BTreeMap<K, V> {
    fn encode_to(&self, out: &mut Output<'_>) -> Result<(), BencodeError> {
        out.write_dict(self)
    }
}

impl<K: AsRef<[u8]>, V: Encode, S> Encode for HashMap<K, V, S> {
    fn encode_to(&self, out: &mut Output<'_>) -> Result<(), BencodeError> {
        out.write_dict(self)
    }
}

/// `None` has no bencode representation.
impl<T: Encode> Encode for Option<T> {
    fn encode_to(&self, out: &mut Output<'_>) -> Result<(), BencodeError> {
        match self {
            Some(value) => value.encode_to(out),
            None => Err(BencodeError::UnsupportedType("Option::None")),
        }
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode_to(&self, out: &mut Output<'_>) -> Result<(), BencodeError> {
        (**self).encode_to(out)
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    fn encode_to(&self, out: &mut Output<'_>) -> Result<(), BencodeError> {
        (**self).encode_to(out)
    }
}

impl Encode for Value {
    fn encode_to(&self, out: &mut Output<'_>) -> Result<(), BencodeError> {
        match self {
            Value::Integer(i) => out.write_integer(*i),
            Value::Bytes(b) => out.write_bytes(b),
            Value::List(l) => out.write_list(l),
            Value::Dict(d) => out.write_dict(d),
        }
    }
}
