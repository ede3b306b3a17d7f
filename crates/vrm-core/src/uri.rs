//! `data:` URI decoding for images embedded as text.

use crate::error::ValidationError;

/// Returns true for `data:` URIs (as opposed to relative file references).
pub fn is_data_uri(uri: &str) -> bool {
    uri.starts_with("data:")
}

/// Decodes `data:[<mediatype>][;base64],<data>`.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, ValidationError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| ValidationError::InvalidDataUri("missing data: prefix".into()))?;
    let (header, data) = rest
        .split_once(',')
        .ok_or_else(|| ValidationError::InvalidDataUri("no comma".into()))?;

    if header.ends_with(";base64") {
        decode_base64(data)
    } else {
        Ok(percent_decode(data))
    }
}

fn decode_base64(input: &str) -> Result<Vec<u8>, ValidationError> {
    fn sextet(byte: u8) -> Option<u32> {
        match byte {
            b'A'..=b'Z' => Some((byte - b'A') as u32),
            b'a'..=b'z' => Some((byte - b'a' + 26) as u32),
            b'0'..=b'9' => Some((byte - b'0' + 52) as u32),
            b'+' | b'-' => Some(62),
            b'/' | b'_' => Some(63),
            _ => None,
        }
    }

    let input: Vec<u8> = input
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let mut output = Vec::with_capacity(input.len() * 3 / 4);
    let quartets = (input.len() + 3) / 4;

    for (q, chunk) in input.chunks(4).enumerate() {
        // `=` may only pad the end of a complete final quartet.
        let padding = chunk.iter().rev().take_while(|&&b| b == b'=').count();
        if padding > 0 && (q + 1 != quartets || chunk.len() != 4 || padding > 2) {
            return Err(ValidationError::InvalidDataUri("misplaced base64 padding".into()));
        }
        let data = &chunk[..chunk.len() - padding];
        if data.len() < 2 {
            return Err(ValidationError::InvalidDataUri("truncated base64 data".into()));
        }

        let mut n = 0u32;
        for (i, &byte) in data.iter().enumerate() {
            let value = sextet(byte).ok_or_else(|| {
                if byte == b'=' {
                    ValidationError::InvalidDataUri("misplaced base64 padding".into())
                } else {
                    ValidationError::InvalidDataUri(format!("invalid base64 character {:?}", byte as char))
                }
            })?;
            n |= value << (18 - 6 * i as u32);
        }

        output.push((n >> 16) as u8);
        if data.len() > 2 {
            output.push((n >> 8) as u8);
        }
        if data.len() > 3 {
            output.push(n as u8);
        }
    }

    Ok(output)
}

pub(crate) fn percent_decode(input: &str) -> Vec<u8> {
    let mut output = Vec::with_capacity(input.len());
    let bytes = input.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(h), Some(l)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                output.push((h << 4) | l);
                i += 3;
                continue;
            }
        }
        output.push(bytes[i]);
        i += 1;
    }

    output
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
