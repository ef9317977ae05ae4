//! Script chunk parsing and encoding.
//!
//! A script chunk is either an opcode or a data push with its associated
//! bytes. Everything after OP_RETURN is parsed like any other script so
//! that data-carrier payloads show up as push chunks.

use crate::opcodes::*;
use crate::ScriptError;

/// A single parsed element of a script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptChunk {
    /// The opcode byte. For direct pushes (1-75 bytes) this is the length.
    pub op: u8,
    /// The pushed bytes, if this chunk is a push operation.
    pub data: Option<Vec<u8>>,
}

impl ScriptChunk {
    /// Render the chunk as an ASM token: pushes as hex, opcodes by name.
    pub fn to_asm_string(&self) -> String {
        match &self.data {
            Some(data) if self.op > OP_0 && self.op <= OP_PUSHDATA4 => hex::encode(data),
            _ => opcode_to_string(self.op),
        }
    }

    /// True if this chunk pushes data (including OP_0 as the empty push).
    pub fn is_push(&self) -> bool {
        self.op <= OP_PUSHDATA4
    }
}

/// Read one chunk starting at `*pos`, advancing past it.
pub(crate) fn read_chunk(bytes: &[u8], pos: &mut usize) -> Result<ScriptChunk, ScriptError> {
    let op = *bytes.get(*pos).ok_or(ScriptError::IndexOutOfRange)?;
    let (header, length) = match op {
        OP_DATA_1..=OP_DATA_75 => (1, op as usize),
        OP_PUSHDATA1 => {
            let len = bytes.get(*pos + 1).ok_or(ScriptError::DataTooSmall)?;
            (2, *len as usize)
        }
        OP_PUSHDATA2 => {
            let len = bytes.get(*pos + 1..*pos + 3).ok_or(ScriptError::DataTooSmall)?;
            (3, u16::from_le_bytes([len[0], len[1]]) as usize)
        }
        OP_PUSHDATA4 => {
            let len = bytes.get(*pos + 1..*pos + 5).ok_or(ScriptError::DataTooSmall)?;
            (5, u32::from_le_bytes([len[0], len[1], len[2], len[3]]) as usize)
        }
        _ => {
            *pos += 1;
            return Ok(ScriptChunk { op, data: None });
        }
    };

    let start = *pos + header;
    let data = bytes
        .get(start..start + length)
        .ok_or(ScriptError::DataTooSmall)?
        .to_vec();
    *pos = start + length;
    Ok(ScriptChunk { op, data: Some(data) })
}

/// Decode raw script bytes into chunks.
///
/// # Returns
/// The parsed chunks, or `DataTooSmall` if a push runs past the end.
pub fn decode_script(bytes: &[u8]) -> Result<Vec<ScriptChunk>, ScriptError> {
    let mut chunks = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        chunks.push(read_chunk(bytes, &mut pos)?);
    }
    Ok(chunks)
}

/// Compute the minimal OP_PUSHDATA prefix for a payload of `data_len` bytes.
///
/// An empty payload is pushed with OP_0.
pub fn push_data_prefix(data_len: usize) -> Result<Vec<u8>, ScriptError> {
    if data_len <= OP_DATA_75 as usize {
        Ok(vec![data_len as u8])
    } else if data_len <= 0xFF {
        Ok(vec![OP_PUSHDATA1, data_len as u8])
    } else if data_len <= 0xFFFF {
        let mut buf = vec![OP_PUSHDATA2];
        buf.extend_from_slice(&(data_len as u16).to_le_bytes());
        Ok(buf)
    } else if data_len <= 0xFFFF_FFFF {
        let mut buf = vec![OP_PUSHDATA4];
        buf.extend_from_slice(&(data_len as u32).to_le_bytes());
        Ok(buf)
    } else {
        Err(ScriptError::DataTooBig)
    }
}

/// Encode several payloads as consecutive pushes.
///
/// # Returns
/// The concatenated pushes, or `PartTooBig(i)` naming the offending part.
pub fn encode_push_datas(parts: &[&[u8]]) -> Result<Vec<u8>, ScriptError> {
    let mut result = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        let prefix = push_data_prefix(part.len()).map_err(|_| ScriptError::PartTooBig(i))?;
        result.extend_from_slice(&prefix);
        result.extend_from_slice(part);
    }
    Ok(result)
}
