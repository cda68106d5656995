// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::error::CliError;

const MAGIC: &[u8; 6] = b"\x93NUMPY";
/// Header alignment of written files, including the preamble.
const HEADER_ALIGN: usize = 64;

struct ParsedNpyHeader {
    descr: String,
    fortran_order: bool,
    shape: Vec<usize>,
}

#[derive(Clone, Copy, Debug)]
enum ByteOrder {
    Little,
    Big,
}

/// Decodes a 1-D or 2-D `f4`/`f8` array into C-order values and `(rows, cols)`.
///
/// A 1-D array of length `n` is read as `n x 1`.
pub fn parse_npy_bytes(bytes: &[u8]) -> Result<(Vec<f64>, usize, usize), CliError> {
    if bytes.len() < 10 {
        return Err(CliError::invalid_input(
            "NPY input is too short to contain a valid header",
        ));
    }
    if &bytes[..6] != MAGIC {
        return Err(CliError::invalid_input(
            "invalid NPY magic; expected '\\x93NUMPY'",
        ));
    }

    let (header_offset, header_len) = match bytes[6] {
        1 => (10usize, usize::from(u16::from_le_bytes([bytes[8], bytes[9]]))),
        2 | 3 => {
            if bytes.len() < 12 {
                return Err(CliError::invalid_input(
                    "NPY header is truncated for version >= 2",
                ));
            }
            let header_len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
            let header_len = usize::try_from(header_len)
                .map_err(|_| CliError::invalid_input("NPY header length overflow"))?;
            (12usize, header_len)
        }
        other => {
            return Err(CliError::not_supported(format!(
                "unsupported NPY version {other}; expected major version 1, 2, or 3"
            )));
        }
    };

    let header_end = header_offset
        .checked_add(header_len)
        .ok_or_else(|| CliError::invalid_input("NPY header length overflow"))?;
    if header_end > bytes.len() {
        return Err(CliError::invalid_input(
            "NPY header exceeds file length; file is truncated",
        ));
    }

    let header_text = std::str::from_utf8(&bytes[header_offset..header_end])
        .map_err(|_| CliError::invalid_input("NPY header is not valid UTF-8"))?;
    let header = parse_npy_header_text(header_text)?;

    let (rows, cols) = match header.shape.as_slice() {
        [rows] => (*rows, 1usize),
        [rows, cols] => (*rows, *cols),
        _ => {
            return Err(CliError::not_supported(format!(
                "NPY shape {:?} is unsupported; expected a 1-D or 2-D array",
                header.shape
            )));
        }
    };
    if rows == 0 || cols == 0 {
        return Err(CliError::invalid_input(format!(
            "NPY shape {:?} has a zero-sized dimension",
            header.shape
        )));
    }

    let element_count = rows
        .checked_mul(cols)
        .ok_or_else(|| CliError::invalid_input("NPY shape overflow (rows*cols exceeds usize)"))?;
    let (byte_order, element_width) = parse_npy_descr(header.descr.as_str())?;

    let payload = &bytes[header_end..];
    let expected_payload_len = element_count
        .checked_mul(element_width)
        .ok_or_else(|| CliError::invalid_input("NPY payload length overflow"))?;
    if payload.len() != expected_payload_len {
        return Err(CliError::invalid_input(format!(
            "NPY payload length mismatch: got {}, expected {expected_payload_len} for shape {:?} and descr '{}'",
            payload.len(),
            header.shape,
            header.descr
        )));
    }

    let mut values = Vec::<f64>::with_capacity(element_count);
    if element_width == 4 {
        for chunk in payload.chunks_exact(4) {
            let mut raw = [0u8; 4];
            raw.copy_from_slice(chunk);
            let value = match byte_order {
                ByteOrder::Little => f32::from_le_bytes(raw),
                ByteOrder::Big => f32::from_be_bytes(raw),
            };
            values.push(f64::from(value));
        }
    } else {
        for chunk in payload.chunks_exact(8) {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            values.push(match byte_order {
                ByteOrder::Little => f64::from_le_bytes(raw),
                ByteOrder::Big => f64::from_be_bytes(raw),
            });
        }
    }

    if header.fortran_order && cols > 1 {
        let mut c_values = vec![0.0f64; element_count];
        for row in 0..rows {
            for col in 0..cols {
                c_values[row * cols + col] = values[col * rows + row];
            }
        }
        return Ok((c_values, rows, cols));
    }

    Ok((values, rows, cols))
}

/// Encodes C-order `<f8` values of shape `(rows, cols)` as NPY version 1.0.
pub fn encode_npy_f64(values: &[f64], rows: usize, cols: usize) -> Result<Vec<u8>, CliError> {
    if rows.checked_mul(cols) != Some(values.len()) {
        return Err(CliError::invalid_input(format!(
            "cannot encode {} values with shape ({rows}, {cols})",
            values.len()
        )));
    }

    let mut header =
        format!("{{'descr': '<f8', 'fortran_order': False, 'shape': ({rows}, {cols}), }}");
    let preamble = MAGIC.len() + 2 + 2;
    let unpadded = preamble + header.len() + 1;
    let padding = (HEADER_ALIGN - unpadded % HEADER_ALIGN) % HEADER_ALIGN;
    header.push_str(" ".repeat(padding).as_str());
    header.push('\n');
    let header_len = u16::try_from(header.len())
        .map_err(|_| CliError::not_supported("NPY v1.0 header exceeds 65535 bytes"))?;

    let mut bytes = Vec::with_capacity(preamble + header.len() + values.len() * 8);
    bytes.extend_from_slice(MAGIC);
    bytes.push(1u8);
    bytes.push(0u8);
    bytes.extend_from_slice(&header_len.to_le_bytes());
    bytes.extend_from_slice(header.as_bytes());
    for value in values {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    Ok(bytes)
}

fn parse_npy_header_text(header: &str) -> Result<ParsedNpyHeader, CliError> {
    Ok(ParsedNpyHeader {
        descr: extract_header_string(header, "descr")?,
        fortran_order: extract_header_bool(header, "fortran_order")?,
        shape: extract_header_shape(header, "shape")?,
    })
}

fn extract_header_field<'a>(header: &'a str, key: &str) -> Result<&'a str, CliError> {
    let marker = format!("'{key}':");
    let start = header.find(marker.as_str()).ok_or_else(|| {
        CliError::invalid_input(format!("NPY header missing required key '{key}'"))
    })?;
    Ok(header[start + marker.len()..].trim_start())
}

fn extract_header_string(header: &str, key: &str) -> Result<String, CliError> {
    let rest = extract_header_field(header, key)?;
    let Some(after_quote) = rest.strip_prefix('\'') else {
        return Err(CliError::invalid_input(format!(
            "NPY header field '{key}' must be a quoted string"
        )));
    };
    let end = after_quote.find('\'').ok_or_else(|| {
        CliError::invalid_input(format!("NPY header field '{key}' has unterminated string"))
    })?;
    Ok(after_quote[..end].to_string())
}

fn extract_header_bool(header: &str, key: &str) -> Result<bool, CliError> {
    let rest = extract_header_field(header, key)?;
    if rest.starts_with("True") {
        Ok(true)
    } else if rest.starts_with("False") {
        Ok(false)
    } else {
        Err(CliError::invalid_input(format!(
            "NPY header field '{key}' must be True or False"
        )))
    }
}

fn extract_header_shape(header: &str, key: &str) -> Result<Vec<usize>, CliError> {
    let rest = extract_header_field(header, key)?;
    let Some(after_paren) = rest.strip_prefix('(') else {
        return Err(CliError::invalid_input(format!(
            "NPY header field '{key}' must start with '('"
        )));
    };
    let end = after_paren.find(')').ok_or_else(|| {
        CliError::invalid_input(format!("NPY header field '{key}' has unterminated tuple"))
    })?;
    let dims = after_paren[..end]
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<usize>().map_err(|_| {
                CliError::invalid_input(format!(
                    "NPY shape entry '{part}' is not a valid non-negative integer"
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if dims.is_empty() {
        return Err(CliError::not_supported(
            "NPY scalar arrays are unsupported; expected shape with 1 or 2 dimensions",
        ));
    }
    Ok(dims)
}

fn native_order() -> ByteOrder {
    if cfg!(target_endian = "little") {
        ByteOrder::Little
    } else {
        ByteOrder::Big
    }
}

fn parse_npy_descr(descr: &str) -> Result<(ByteOrder, usize), CliError> {
    let trimmed = descr.trim();
    let (byte_order, dtype) = match trimmed.chars().next() {
        Some('<' | '|') => (ByteOrder::Little, &trimmed[1..]),
        Some('>') => (ByteOrder::Big, &trimmed[1..]),
        Some('=') => (native_order(), &trimmed[1..]),
        Some('f') => (native_order(), trimmed),
        Some(_) => {
            return Err(CliError::not_supported(format!(
                "unsupported NPY descr '{trimmed}'; expected floating-point dtype f4 or f8"
            )));
        }
        None => return Err(CliError::invalid_input("NPY descr is empty")),
    };

    match dtype {
        "f4" => Ok((byte_order, 4)),
        "f8" => Ok((byte_order, 8)),
        _ => Err(CliError::not_supported(format!(
            "unsupported NPY dtype '{dtype}'; expected f4 or f8"
        ))),
    }
}
