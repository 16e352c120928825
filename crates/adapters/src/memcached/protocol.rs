// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Memcached text protocol: request encoding and reply parsing
//!
//! Only the commands the locks need. Items are written with flags 0 and no
//! expiry.

use slock_core::store::StoreError;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

pub const MAX_KEY_LEN: usize = 250;

/// Largest data block accepted in a reply (memcached's default item size limit)
pub const MAX_VALUE_LEN: usize = 1024 * 1024;

/// Longest reply line accepted before the connection is considered broken
const MAX_LINE_LEN: usize = 2048;

/// Reject keys the server would refuse or misparse
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() || key.len() > MAX_KEY_LEN {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    if key.bytes().any(|b| b.is_ascii_whitespace() || b.is_ascii_control()) {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Add { key: &'a str, value: &'a [u8] },
    Get { key: &'a str },
    Gets { key: &'a str },
    Cas { key: &'a str, cas: u64, value: &'a [u8] },
    Append { key: &'a str, value: &'a [u8] },
    Delete { key: &'a str },
}

impl<'a> Command<'a> {
    pub fn key(&self) -> &'a str {
        match self {
            Command::Add { key, .. }
            | Command::Get { key }
            | Command::Gets { key }
            | Command::Cas { key, .. }
            | Command::Append { key, .. }
            | Command::Delete { key } => key,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        match self {
            Command::Add { key, value } => storage("add", key, value, None),
            Command::Append { key, value } => storage("append", key, value, None),
            Command::Cas { key, cas, value } => storage("cas", key, value, Some(*cas)),
            Command::Get { key } => format!("get {key}\r\n").into_bytes(),
            Command::Gets { key } => format!("gets {key}\r\n").into_bytes(),
            Command::Delete { key } => format!("delete {key}\r\n").into_bytes(),
        }
    }
}

fn storage(verb: &str, key: &str, value: &[u8], cas: Option<u64>) -> Vec<u8> {
    let header = match cas {
        Some(cas) => format!("{verb} {key} 0 0 {} {cas}\r\n", value.len()),
        None => format!("{verb} {key} 0 0 {}\r\n", value.len()),
    };
    let mut out = Vec::with_capacity(header.len() + value.len() + 2);
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(value);
    out.extend_from_slice(b"\r\n");
    out
}

/// One item of a `get`/`gets` reply
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    pub key: String,
    pub data: Vec<u8>,
    pub cas: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Stored,
    NotStored,
    Exists,
    NotFound,
    Deleted,
    Items(Vec<Item>),
}

fn protocol(msg: impl Into<String>) -> StoreError {
    StoreError::Protocol(msg.into())
}

/// Read one `\r\n` terminated line, without the terminator
async fn read_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<String, StoreError> {
    let mut line = Vec::new();
    let n = (&mut *reader)
        .take(MAX_LINE_LEN as u64)
        .read_until(b'\n', &mut line)
        .await?;
    if n == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed").into());
    }
    let Some(body) = line.strip_suffix(b"\r\n") else {
        return Err(protocol(format!(
            "unterminated reply line: {:?}",
            String::from_utf8_lossy(&line)
        )));
    };
    String::from_utf8(body.to_vec()).map_err(|_| protocol("reply line is not utf-8"))
}

/// Parse `VALUE <key> <flags> <bytes> [<cas>]` and read its data block
async fn read_item<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    header: &str,
) -> Result<Item, StoreError> {
    let parts: Vec<&str> = header.split(' ').collect();
    let (key, len, cas) = match parts.as_slice() {
        ["VALUE", key, _flags, len] => (*key, *len, None),
        ["VALUE", key, _flags, len, cas] => (*key, *len, Some(*cas)),
        _ => return Err(protocol(format!("malformed VALUE line: {header:?}"))),
    };
    let len: usize = len
        .parse()
        .map_err(|_| protocol(format!("bad length in {header:?}")))?;
    if len > MAX_VALUE_LEN {
        return Err(protocol(format!(
            "value for {key:?} is {len} bytes, over the {MAX_VALUE_LEN} byte limit"
        )));
    }
    let cas = cas
        .map(|c| c.parse::<u64>())
        .transpose()
        .map_err(|_| protocol(format!("bad cas in {header:?}")))?;

    let mut data = vec![0u8; len + 2];
    reader.read_exact(&mut data).await?;
    if !data.ends_with(b"\r\n") {
        return Err(protocol(format!("data block for {key:?} not terminated")));
    }
    data.truncate(len);

    Ok(Item {
        key: key.to_string(),
        data,
        cas,
    })
}

/// Read a complete reply. Server-reported errors come back as
/// [`StoreError::Server`]; anything unparseable as [`StoreError::Protocol`].
pub async fn read_reply<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<Reply, StoreError> {
    let line = read_line(reader).await?;
    match line.as_str() {
        "STORED" => return Ok(Reply::Stored),
        "NOT_STORED" => return Ok(Reply::NotStored),
        "EXISTS" => return Ok(Reply::Exists),
        "NOT_FOUND" => return Ok(Reply::NotFound),
        "DELETED" => return Ok(Reply::Deleted),
        "END" => return Ok(Reply::Items(Vec::new())),
        "ERROR" => return Err(StoreError::Server(line)),
        _ => {}
    }
    if line.starts_with("CLIENT_ERROR") || line.starts_with("SERVER_ERROR") {
        return Err(StoreError::Server(line));
    }
    if !line.starts_with("VALUE ") {
        return Err(protocol(format!("unexpected reply: {line:?}")));
    }

    let mut items = vec![read_item(reader, &line).await?];
    loop {
        let next = read_line(reader).await?;
        if next == "END" {
            return Ok(Reply::Items(items));
        }
        if !next.starts_with("VALUE ") {
            return Err(protocol(format!("unexpected line in VALUE list: {next:?}")));
        }
        items.push(read_item(reader, &next).await?);
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
