//! Minimal OSC 1.0 packet decoding for the remote-control listener
//!
//! Handles messages and (nested) bundles with the argument tags
//! `i f d h s T F N`. Bundle time tags are ignored; everything applies on
//! arrival.

use thiserror::Error;

const BUNDLE_TAG: &[u8; 8] = b"#bundle\0";
const MAX_BUNDLE_DEPTH: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OscError {
    #[error("Packet truncated")]
    Truncated,
    #[error("Invalid UTF-8 in OSC string")]
    InvalidString,
    #[error("OSC address must start with '/': {0}")]
    InvalidAddress(String),
    #[error("Type tag string must start with ','")]
    InvalidTypeTags,
    #[error("Unsupported OSC type tag '{0}'")]
    UnsupportedTag(char),
    #[error("Bundles nested too deeply")]
    BundleTooDeep,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OscArg {
    Int(i32),
    Float(f32),
    Double(f64),
    Long(i64),
    Str(String),
    Bool(bool),
    Nil,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OscMessage {
    pub address: String,
    pub args: Vec<OscArg>,
}

/// Decode one datagram into the messages it carries, in packet order
pub fn decode_packet(bytes: &[u8]) -> Result<Vec<OscMessage>, OscError> {
    let mut messages = Vec::new();
    decode_into(bytes, 0, &mut messages)?;
    Ok(messages)
}

fn decode_into(bytes: &[u8], depth: usize, out: &mut Vec<OscMessage>) -> Result<(), OscError> {
    if bytes.starts_with(BUNDLE_TAG) {
        if depth >= MAX_BUNDLE_DEPTH {
            return Err(OscError::BundleTooDeep);
        }
        let mut reader = Reader::new(bytes);
        reader.take(BUNDLE_TAG.len())?;
        reader.take(8)?; // time tag
        while reader.remaining() > 0 {
            let size = usize::try_from(reader.read_i32()?).map_err(|_| OscError::Truncated)?;
            let element = reader.take(size)?;
            decode_into(element, depth + 1, out)?;
        }
        return Ok(());
    }

    out.push(decode_message(bytes)?);
    Ok(())
}

fn decode_message(bytes: &[u8]) -> Result<OscMessage, OscError> {
    let mut reader = Reader::new(bytes);
    let address = reader.read_string()?;
    if !address.starts_with('/') {
        return Err(OscError::InvalidAddress(address.to_string()));
    }

    // Very old senders omit the type tag string entirely
    if reader.remaining() == 0 {
        return Ok(OscMessage { address: address.to_string(), args: Vec::new() });
    }

    let tags = reader.read_string()?;
    let tags = tags.strip_prefix(',').ok_or(OscError::InvalidTypeTags)?;

    let mut args = Vec::with_capacity(tags.len());
    for tag in tags.chars() {
        let arg = match tag {
            'i' => OscArg::Int(reader.read_i32()?),
            'f' => OscArg::Float(f32::from_bits(reader.read_i32()? as u32)),
            'd' => OscArg::Double(f64::from_bits(reader.read_i64()? as u64)),
            'h' => OscArg::Long(reader.read_i64()?),
            's' => OscArg::Str(reader.read_string()?.to_string()),
            'T' => OscArg::Bool(true),
            'F' => OscArg::Bool(false),
            'N' => OscArg::Nil,
            other => return Err(OscError::UnsupportedTag(other)),
        };
        args.push(arg);
    }

    Ok(OscMessage { address: address.to_string(), args })
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], OscError> {
        let end = self.pos.checked_add(n).ok_or(OscError::Truncated)?;
        let slice = self.bytes.get(self.pos..end).ok_or(OscError::Truncated)?;
        self.pos = end;
        Ok(slice)
    }

    fn read_i32(&mut self) -> Result<i32, OscError> {
        let raw: [u8; 4] = self.take(4)?.try_into().map_err(|_| OscError::Truncated)?;
        Ok(i32::from_be_bytes(raw))
    }

    fn read_i64(&mut self) -> Result<i64, OscError> {
        let raw: [u8; 8] = self.take(8)?.try_into().map_err(|_| OscError::Truncated)?;
        Ok(i64::from_be_bytes(raw))
    }

    /// NUL-terminated string padded to a four byte boundary
    fn read_string(&mut self) -> Result<&'a str, OscError> {
        let rest = &self.bytes[self.pos..];
        let nul = rest.iter().position(|&b| b == 0).ok_or(OscError::Truncated)?;
        let padded = (nul + 4) & !3;
        let raw = self.take(padded)?;
        std::str::from_utf8(&raw[..nul]).map_err(|_| OscError::InvalidString)
    }
}
