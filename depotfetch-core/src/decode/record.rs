//! Structured app record, serialised with Go's `gob` encoding.
//!
//! A gob stream is a sequence of length-prefixed messages. A message whose
//! leading type id is negative defines a type (the body is a `wireType`
//! struct); a positive id introduces a value of that type. Structs are encoded
//! as `(field delta, value)` pairs ending in a zero delta, and zero-valued
//! fields are omitted. This module decodes any such stream into [`GobValue`]s
//! and then maps the first top-level value onto [`AppRecord`].
//!
//! Interface-typed values are not supported and fail as malformed.

use std::collections::HashMap;

use crate::contract::DepotRecord;
use crate::error::DecodeError;

/// Nesting limit for recursive type definitions.
const MAX_DEPTH: usize = 64;

const T_BOOL: i64 = 1;
const T_INT: i64 = 2;
const T_UINT: i64 = 3;
const T_FLOAT: i64 = 4;
const T_BYTES: i64 = 5;
const T_STRING: i64 = 6;
const T_COMPLEX: i64 = 7;
const T_INTERFACE: i64 = 8;
const T_WIRE_TYPE: i64 = 16;
const T_ARRAY_TYPE: i64 = 17;
const T_COMMON_TYPE: i64 = 18;
const T_SLICE_TYPE: i64 = 19;
const T_STRUCT_TYPE: i64 = 20;
const T_FIELD_TYPE: i64 = 21;
const T_FIELD_TYPE_SLICE: i64 = 22;
const T_MAP_TYPE: i64 = 23;
const T_GOB_ENCODER_TYPE: i64 = 24;

/// A decoded gob value. Struct fields keep their wire names, in wire order.
#[derive(Debug, Clone, PartialEq)]
pub enum GobValue {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Complex(f64, f64),
    Bytes(Vec<u8>),
    String(String),
    List(Vec<GobValue>),
    Map(Vec<(GobValue, GobValue)>),
    Struct(Vec<(String, GobValue)>),
}

impl GobValue {
    pub fn field(&self, name: &str) -> Option<&GobValue> {
        match self {
            GobValue::Struct(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Integers and strings rendered as decimal text.
    pub fn as_id(&self) -> Option<String> {
        match self {
            GobValue::Int(v) => Some(v.to_string()),
            GobValue::Uint(v) => Some(v.to_string()),
            GobValue::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            GobValue::Bytes(b) => Some(b),
            _ => None,
        }
    }

    fn as_int(&self) -> Option<i64> {
        match self {
            GobValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
enum WireType {
    Array { elem: i64, len: usize },
    Slice { elem: i64 },
    Struct { fields: Vec<(String, i64)> },
    Map { key: i64, elem: i64 },
    /// GobEncoder / BinaryMarshaler / TextMarshaler payloads: opaque bytes.
    Opaque,
}

fn malformed(detail: impl Into<String>) -> DecodeError {
    DecodeError::MalformedRecord(detail.into())
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining() {
            return Err(malformed(format!(
                "need {n} bytes at offset {}, {} left",
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Values below 128 are one byte; otherwise the negated byte count
    /// precedes a big-endian integer.
    fn uint(&mut self) -> Result<u64, DecodeError> {
        let first = self.take(1)?[0];
        if first < 0x80 {
            return Ok(u64::from(first));
        }
        let len = usize::from(first.wrapping_neg());
        if len > 8 {
            return Err(malformed(format!("uint byte count {len} exceeds 8")));
        }
        Ok(self
            .take(len)?
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b)))
    }

    /// Sign lives in bit 0; a set bit means the complement of the rest.
    fn int(&mut self) -> Result<i64, DecodeError> {
        let u = self.uint()?;
        if u & 1 == 1 {
            Ok(!((u >> 1) as i64))
        } else {
            Ok((u >> 1) as i64)
        }
    }

    /// Floats travel as byte-reversed IEEE-754 bits.
    fn float(&mut self) -> Result<f64, DecodeError> {
        Ok(f64::from_bits(self.uint()?.swap_bytes()))
    }

    fn count(&mut self) -> Result<usize, DecodeError> {
        let n = self.uint()?;
        // Every element costs at least one byte.
        if n > self.remaining() as u64 {
            return Err(malformed(format!("count {n} exceeds remaining input")));
        }
        Ok(n as usize)
    }

    fn bytes(&mut self) -> Result<Vec<u8>, DecodeError> {
        let n = self.count()?;
        Ok(self.take(n)?.to_vec())
    }
}

struct GobDecoder {
    types: HashMap<i64, WireType>,
}

impl GobDecoder {
    /// Seeds the table with the bootstrap types used to describe other types.
    fn new() -> Self {
        let fields = |list: &[(&str, i64)]| WireType::Struct {
            fields: list.iter().map(|(n, id)| (n.to_string(), *id)).collect(),
        };
        let mut types = HashMap::new();
        types.insert(
            T_WIRE_TYPE,
            fields(&[
                ("ArrayT", T_ARRAY_TYPE),
                ("SliceT", T_SLICE_TYPE),
                ("StructT", T_STRUCT_TYPE),
                ("MapT", T_MAP_TYPE),
                ("GobEncoderT", T_GOB_ENCODER_TYPE),
                ("BinaryMarshalerT", T_GOB_ENCODER_TYPE),
                ("TextMarshalerT", T_GOB_ENCODER_TYPE),
            ]),
        );
        types.insert(
            T_ARRAY_TYPE,
            fields(&[("CommonType", T_COMMON_TYPE), ("Elem", T_INT), ("Len", T_INT)]),
        );
        types.insert(T_COMMON_TYPE, fields(&[("Name", T_STRING), ("Id", T_INT)]));
        types.insert(
            T_SLICE_TYPE,
            fields(&[("CommonType", T_COMMON_TYPE), ("Elem", T_INT)]),
        );
        types.insert(
            T_STRUCT_TYPE,
            fields(&[("CommonType", T_COMMON_TYPE), ("Field", T_FIELD_TYPE_SLICE)]),
        );
        types.insert(T_FIELD_TYPE, fields(&[("Name", T_STRING), ("Id", T_INT)]));
        types.insert(T_FIELD_TYPE_SLICE, WireType::Slice { elem: T_FIELD_TYPE });
        types.insert(
            T_MAP_TYPE,
            fields(&[("CommonType", T_COMMON_TYPE), ("Key", T_INT), ("Elem", T_INT)]),
        );
        types.insert(T_GOB_ENCODER_TYPE, fields(&[("CommonType", T_COMMON_TYPE)]));
        Self { types }
    }

    fn is_struct(&self, id: i64) -> bool {
        matches!(self.types.get(&id), Some(WireType::Struct { .. }))
    }

    fn value(&self, r: &mut Reader<'_>, id: i64, depth: usize) -> Result<GobValue, DecodeError> {
        if depth > MAX_DEPTH {
            return Err(malformed("type nesting too deep"));
        }
        match id {
            T_BOOL => Ok(GobValue::Bool(r.uint()? != 0)),
            T_INT => Ok(GobValue::Int(r.int()?)),
            T_UINT => Ok(GobValue::Uint(r.uint()?)),
            T_FLOAT => Ok(GobValue::Float(r.float()?)),
            T_COMPLEX => Ok(GobValue::Complex(r.float()?, r.float()?)),
            T_BYTES => Ok(GobValue::Bytes(r.bytes()?)),
            T_STRING => String::from_utf8(r.bytes()?)
                .map(GobValue::String)
                .map_err(|e| malformed(format!("string is not UTF-8: {e}"))),
            T_INTERFACE => Err(malformed("interface values are not supported")),
            _ => match self.types.get(&id) {
                Some(WireType::Struct { fields }) => self.struct_value(r, fields, depth),
                Some(WireType::Slice { elem }) => {
                    let n = r.count()?;
                    let items = (0..n)
                        .map(|_| self.value(r, *elem, depth + 1))
                        .collect::<Result<_, _>>()?;
                    Ok(GobValue::List(items))
                }
                Some(WireType::Array { elem, len }) => {
                    let n = r.count()?;
                    if n != *len {
                        return Err(malformed(format!("array length {n}, type says {len}")));
                    }
                    let items = (0..n)
                        .map(|_| self.value(r, *elem, depth + 1))
                        .collect::<Result<_, _>>()?;
                    Ok(GobValue::List(items))
                }
                Some(WireType::Map { key, elem }) => {
                    let n = r.count()?;
                    let mut entries = Vec::with_capacity(n);
                    for _ in 0..n {
                        let k = self.value(r, *key, depth + 1)?;
                        let v = self.value(r, *elem, depth + 1)?;
                        entries.push((k, v));
                    }
                    Ok(GobValue::Map(entries))
                }
                Some(WireType::Opaque) => Ok(GobValue::Bytes(r.bytes()?)),
                None => Err(malformed(format!("reference to undefined type id {id}"))),
            },
        }
    }

    fn struct_value(
        &self,
        r: &mut Reader<'_>,
        fields: &[(String, i64)],
        depth: usize,
    ) -> Result<GobValue, DecodeError> {
        let mut out = Vec::new();
        let mut index: i64 = -1;
        loop {
            let delta = r.uint()?;
            if delta == 0 {
                break;
            }
            index = index
                .checked_add(i64::try_from(delta).map_err(|_| malformed("field delta overflow"))?)
                .ok_or_else(|| malformed("field delta overflow"))?;
            let (name, field_type) = usize::try_from(index)
                .ok()
                .and_then(|i| fields.get(i))
                .ok_or_else(|| malformed(format!("field number {index} out of range")))?;
            let value = self.value(r, *field_type, depth + 1)?;
            out.push((name.clone(), value));
        }
        Ok(GobValue::Struct(out))
    }

    fn register(&mut self, id: i64, wire: &GobValue) -> Result<(), DecodeError> {
        if id <= T_GOB_ENCODER_TYPE {
            return Err(malformed(format!("type id {id} collides with a builtin")));
        }
        let wire_type = if let Some(array) = wire.field("ArrayT") {
            WireType::Array {
                elem: required_int(array, "Elem")?,
                len: array
                    .field("Len")
                    .and_then(GobValue::as_int)
                    .map(|n| usize::try_from(n).map_err(|_| malformed("negative array length")))
                    .transpose()?
                    .unwrap_or(0),
            }
        } else if let Some(slice) = wire.field("SliceT") {
            WireType::Slice {
                elem: required_int(slice, "Elem")?,
            }
        } else if let Some(st) = wire.field("StructT") {
            let fields = match st.field("Field") {
                Some(GobValue::List(items)) => items
                    .iter()
                    .map(|f| {
                        let name = match f.field("Name") {
                            Some(GobValue::String(s)) => s.clone(),
                            _ => String::new(),
                        };
                        Ok((name, required_int(f, "Id")?))
                    })
                    .collect::<Result<Vec<_>, DecodeError>>()?,
                _ => Vec::new(),
            };
            WireType::Struct { fields }
        } else if let Some(map) = wire.field("MapT") {
            WireType::Map {
                key: required_int(map, "Key")?,
                elem: required_int(map, "Elem")?,
            }
        } else if wire.field("GobEncoderT").is_some()
            || wire.field("BinaryMarshalerT").is_some()
            || wire.field("TextMarshalerT").is_some()
        {
            WireType::Opaque
        } else {
            return Err(malformed(format!("empty type definition for id {id}")));
        };
        self.types.insert(id, wire_type);
        Ok(())
    }
}

fn required_int(value: &GobValue, name: &str) -> Result<i64, DecodeError> {
    value
        .field(name)
        .and_then(GobValue::as_int)
        .ok_or_else(|| malformed(format!("type definition missing {name}")))
}

/// Decode every top-level value in a gob stream.
pub fn decode_stream(bytes: &[u8]) -> Result<Vec<GobValue>, DecodeError> {
    let mut decoder = GobDecoder::new();
    let mut stream = Reader::new(bytes);
    let mut values = Vec::new();
    while stream.remaining() > 0 {
        let len = stream.count()?;
        let mut message = Reader::new(stream.take(len)?);
        let id = message.int()?;
        if id < 0 {
            let wire = decoder.value(&mut message, T_WIRE_TYPE, 0)?;
            decoder.register(-id, &wire)?;
            continue;
        }
        if !decoder.is_struct(id) && message.uint()? != 0 {
            return Err(malformed("non-zero delta before singleton value"));
        }
        values.push(decoder.value(&mut message, id, 0)?);
    }
    Ok(values)
}

/// One depot of an [`AppRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDepot {
    pub depot_id: String,
    pub manifest_id: String,
    pub manifest: Vec<u8>,
    pub key: Vec<u8>,
}

impl RecordDepot {
    pub fn key_hex(&self) -> String {
        hex::encode(&self.key)
    }

    pub fn into_depot_record(self) -> DepotRecord {
        DepotRecord {
            decryption_key: Some(self.key_hex()),
            depot_id: self.depot_id,
            manifest_id: self.manifest_id,
            manifest_bytes: Some(self.manifest),
        }
    }
}

/// The top-level record: `Appid, Licenses, App, Depots, EncryptedAppTicket,
/// AppOwnershipTicket`. Only the depot list is required.
#[derive(Debug, Clone, PartialEq)]
pub struct AppRecord {
    pub app_id: Option<String>,
    pub licenses: Option<GobValue>,
    pub app: Option<GobValue>,
    pub depots: Vec<RecordDepot>,
    pub encrypted_ticket: Option<GobValue>,
    pub ownership_ticket: Option<GobValue>,
}

/// Decode a gob stream whose first value is the app record.
pub fn decode(bytes: &[u8]) -> Result<AppRecord, DecodeError> {
    let values = decode_stream(bytes)?;
    let root = values
        .into_iter()
        .next()
        .ok_or_else(|| malformed("stream holds no value"))?;
    if !matches!(root, GobValue::Struct(_)) {
        return Err(malformed("top-level value is not a struct"));
    }

    let depots = match root.field("Depots") {
        Some(GobValue::List(items)) => items
            .iter()
            .enumerate()
            .map(|(i, depot)| record_depot(i, depot))
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err(malformed("Depots is not a list")),
        None => return Err(malformed("missing Depots")),
    };

    Ok(AppRecord {
        app_id: root.field("Appid").and_then(GobValue::as_id),
        licenses: root.field("Licenses").cloned(),
        app: root.field("App").cloned(),
        depots,
        encrypted_ticket: root.field("EncryptedAppTicket").cloned(),
        ownership_ticket: root.field("AppOwnershipTicket").cloned(),
    })
}

fn record_depot(index: usize, depot: &GobValue) -> Result<RecordDepot, DecodeError> {
    let missing = |what: &str| malformed(format!("depot #{index}: missing {what}"));
    let depot_id = depot
        .field("Id")
        .and_then(GobValue::as_id)
        .ok_or_else(|| missing("Id"))?;
    let manifest = depot.field("Manifests").ok_or_else(|| missing("Manifests"))?;
    let manifest_id = manifest
        .field("Id")
        .and_then(GobValue::as_id)
        .ok_or_else(|| missing("Manifests.Id"))?;
    let manifest_bytes = manifest
        .field("Data")
        .and_then(GobValue::as_bytes)
        .ok_or_else(|| missing("Manifests.Data"))?;
    let key = depot
        .field("Decryptkey")
        .and_then(GobValue::as_bytes)
        .ok_or_else(|| missing("Decryptkey"))?;
    Ok(RecordDepot {
        depot_id,
        manifest_id,
        manifest: manifest_bytes.to_vec(),
        key: key.to_vec(),
    })
}
