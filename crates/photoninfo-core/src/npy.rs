//! Minimal reader and writer for NumPy `.npy` files.
//!
//! The upstream pipeline saves every per-trial result as a little-endian
//! float array in `.npy` format. This module decodes versions 1.0 and 2.0
//! of that container and encodes 1-D `f64` arrays for fixtures and
//! round-trips. Nothing else from the format is supported on purpose.
//!
//! # Storage Format
//!
//! ```text
//! offset  size  field
//! ------  ----  -----------------------------------------------
//!      0     6  magic `\x93NUMPY`
//!      6     2  format version (major, minor)
//!      8   2|4  header length, u16 LE (v1.0) or u32 LE (v2.0)
//!      -     -  ASCII dict: {'descr', 'fortran_order', 'shape'}
//!      -     -  raw element bytes, little endian, C order
//! ```
//!
//! Accepted dtypes are `<f8` and `<f4`; `<f4` values are widened to `f64`
//! on read. Fortran-ordered arrays are rejected when they have more than
//! one axis, since reordering is ambiguous without the caller's intent.

use std::path::Path;

use thiserror::Error;

/// Decoding and encoding failures for the `.npy` container.
#[derive(Error, Debug)]
pub enum NpyError {
    /// The file does not begin with the `\x93NUMPY` magic bytes.
    #[error("not an npy file (bad magic)")]
    BadMagic,
    /// The format version is one this reader does not handle.
    #[error("unsupported npy version {major}.{minor}")]
    UnsupportedVersion {
        /// Major version byte from the file.
        major: u8,
        /// Minor version byte from the file.
        minor: u8,
    },
    /// The header dict could not be parsed.
    #[error("malformed npy header: {0}")]
    MalformedHeader(String),
    /// The element type is not `<f8` or `<f4`.
    #[error("unsupported npy dtype {0:?}")]
    UnsupportedDtype(String),
    /// Multi-axis arrays stored in Fortran order are not supported.
    #[error("fortran-ordered arrays are not supported")]
    FortranOrder,
    /// The file ends before the data the header promises.
    #[error("npy file truncated: expected at least {expected} bytes, found {found}")]
    Truncated {
        /// Minimum byte count the header implies.
        expected: usize,
        /// Byte count actually present.
        found: usize,
    },
    /// Underlying filesystem failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A decoded array: its declared shape and elements widened to `f64`.
#[derive(Debug, Clone, PartialEq)]
pub struct NpyArray {
    /// Dimensions as declared by the header, outermost first.
    pub shape: Vec<usize>,
    /// Elements in C order.
    pub data: Vec<f64>,
}

impl NpyArray {
    /// Total element count.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of axes.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

const MAGIC: &[u8; 6] = b"\x93NUMPY";

enum Dtype {
    F8,
    F4,
}

impl Dtype {
    fn itemsize(&self) -> usize {
        match self {
            Dtype::F8 => 8,
            Dtype::F4 => 4,
        }
    }
}

/// Read and decode a `.npy` file.
pub fn read_file(path: &Path) -> Result<NpyArray, NpyError> {
    let bytes = std::fs::read(path)?;
    decode(&bytes)
}

/// Decode a `.npy` byte buffer.
pub fn decode(bytes: &[u8]) -> Result<NpyArray, NpyError> {
    if bytes.len() < 8 || &bytes[..6] != MAGIC {
        return Err(NpyError::BadMagic);
    }
    let (header_len, header_start) = match (bytes[6], bytes[7]) {
        (1, 0) => {
            if bytes.len() < 10 {
                return Err(NpyError::Truncated {
                    expected: 10,
                    found: bytes.len(),
                });
            }
            (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10)
        }
        (2, 0) => {
            if bytes.len() < 12 {
                return Err(NpyError::Truncated {
                    expected: 12,
                    found: bytes.len(),
                });
            }
            let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
            (len as usize, 12)
        }
        (major, minor) => return Err(NpyError::UnsupportedVersion { major, minor }),
    };

    let data_start = header_start + header_len;
    if bytes.len() < data_start {
        return Err(NpyError::Truncated {
            expected: data_start,
            found: bytes.len(),
        });
    }
    let header = std::str::from_utf8(&bytes[header_start..data_start])
        .map_err(|_| NpyError::MalformedHeader("header is not valid ASCII".to_string()))?;

    let dtype = parse_descr(header)?;
    let fortran = parse_fortran_order(header)?;
    let shape = parse_shape(header)?;
    if fortran && shape.len() > 1 {
        return Err(NpyError::FortranOrder);
    }

    let expected = shape
        .iter()
        .try_fold(dtype.itemsize(), |total, &dim| total.checked_mul(dim))
        .and_then(|payload| payload.checked_add(data_start))
        .ok_or_else(|| {
            NpyError::MalformedHeader(format!("shape {shape:?} overflows the payload size"))
        })?;
    if bytes.len() < expected {
        return Err(NpyError::Truncated {
            expected,
            found: bytes.len(),
        });
    }
    let payload = &bytes[data_start..expected];
    let data = match dtype {
        Dtype::F8 => payload
            .chunks_exact(8)
            .map(|c| {
                f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]])
            })
            .collect(),
        Dtype::F4 => payload
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f64)
            .collect(),
    };
    Ok(NpyArray { shape, data })
}

/// Slice of the header following `'key':`, whitespace trimmed.
fn after_key<'a>(header: &'a str, key: &str) -> Result<&'a str, NpyError> {
    let pat = format!("'{key}'");
    let idx = header
        .find(&pat)
        .ok_or_else(|| NpyError::MalformedHeader(format!("missing {key} field")))?;
    let rest = header[idx + pat.len()..].trim_start();
    let rest = rest
        .strip_prefix(':')
        .ok_or_else(|| NpyError::MalformedHeader(format!("missing {key} value")))?;
    Ok(rest.trim_start())
}

fn parse_descr(header: &str) -> Result<Dtype, NpyError> {
    let rest = after_key(header, "descr")?;
    let rest = rest
        .strip_prefix('\'')
        .ok_or_else(|| NpyError::MalformedHeader("descr is not a string".to_string()))?;
    let end = rest
        .find('\'')
        .ok_or_else(|| NpyError::MalformedHeader("unterminated descr".to_string()))?;
    match &rest[..end] {
        "<f8" => Ok(Dtype::F8),
        "<f4" => Ok(Dtype::F4),
        other => Err(NpyError::UnsupportedDtype(other.to_string())),
    }
}

fn parse_fortran_order(header: &str) -> Result<bool, NpyError> {
    let rest = after_key(header, "fortran_order")?;
    if rest.starts_with("True") {
        Ok(true)
    } else if rest.starts_with("False") {
        Ok(false)
    } else {
        Err(NpyError::MalformedHeader(
            "fortran_order must be True or False".to_string(),
        ))
    }
}

fn parse_shape(header: &str) -> Result<Vec<usize>, NpyError> {
    let rest = after_key(header, "shape")?;
    let rest = rest
        .strip_prefix('(')
        .ok_or_else(|| NpyError::MalformedHeader("shape is not a tuple".to_string()))?;
    let end = rest
        .find(')')
        .ok_or_else(|| NpyError::MalformedHeader("unterminated shape tuple".to_string()))?;
    let mut shape = Vec::new();
    for part in rest[..end].split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let dim: usize = part
            .parse()
            .map_err(|_| NpyError::MalformedHeader(format!("bad shape dimension {part:?}")))?;
        shape.push(dim);
    }
    Ok(shape)
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode a 1-D `f64` array as a version 1.0 `.npy` buffer.
pub fn encode(values: &[f64]) -> Vec<u8> {
    let dict = format!(
        "{{'descr': '<f8', 'fortran_order': False, 'shape': ({},), }}",
        values.len()
    );
    // magic + version + u16 length + dict + padding + trailing newline,
    // padded so the data starts on a 64-byte boundary
    let unpadded = 10 + dict.len() + 1;
    let padding = (64 - unpadded % 64) % 64;
    let header_len = dict.len() + padding + 1;

    let mut out = Vec::with_capacity(10 + header_len + values.len() * 8);
    out.extend_from_slice(MAGIC);
    out.push(1);
    out.push(0);
    out.extend_from_slice(&(header_len as u16).to_le_bytes());
    out.extend_from_slice(dict.as_bytes());
    out.resize(out.len() + padding, b' ');
    out.push(b'\n');
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

/// Encode a 1-D `f64` array and write it to `path`.
pub fn write_file(path: &Path, values: &[f64]) -> Result<(), NpyError> {
    std::fs::write(path, encode(values))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a v1.0 file by hand with an arbitrary header dict.
    fn raw_npy(descr: &str, fortran: &str, shape: &str, payload: &[u8]) -> Vec<u8> {
        let dict =
            format!("{{'descr': '{descr}', 'fortran_order': {fortran}, 'shape': {shape}, }}\n");
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        out.push(1);
        out.push(0);
        out.extend_from_slice(&(dict.len() as u16).to_le_bytes());
        out.extend_from_slice(dict.as_bytes());
        out.extend_from_slice(payload);
        out
    }

    // -----------------------------------------------------------------------
    // Round-trip tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_encode_decode_roundtrip() {
        let values = [1.25, -3.5, 0.0, 1e-9, 2.0162];
        let arr = decode(&encode(&values)).unwrap();
        assert_eq!(arr.shape, vec![5]);
        assert_eq!(arr.data, values);
    }

    #[test]
    fn test_encode_empty_array() {
        let arr = decode(&encode(&[])).unwrap();
        assert_eq!(arr.shape, vec![0]);
        assert!(arr.is_empty());
    }

    #[test]
    fn test_encode_aligns_data_to_64_bytes() {
        for n in [0, 1, 9, 100] {
            let bytes = encode(&vec![0.5; n]);
            let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
            assert_eq!((10 + header_len) % 64, 0);
            assert_eq!(bytes[10 + header_len - 1], b'\n');
        }
    }

    #[test]
    fn test_write_and_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trials.npy");
        write_file(&path, &[0.91, 0.89, 0.93]).unwrap();
        let arr = read_file(&path).unwrap();
        assert_eq!(arr.data, vec![0.91, 0.89, 0.93]);
    }

    // -----------------------------------------------------------------------
    // Format tolerance tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_decode_f4_widens_to_f64() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&1.5f32.to_le_bytes());
        payload.extend_from_slice(&(-0.25f32).to_le_bytes());
        let arr = decode(&raw_npy("<f4", "False", "(2,)", &payload)).unwrap();
        assert_eq!(arr.data, vec![1.5, -0.25]);
    }

    #[test]
    fn test_decode_version_2_header() {
        let dict = "{'descr': '<f8', 'fortran_order': False, 'shape': (1,), }\n";
        let mut bytes = Vec::new();
        bytes.extend_from_slice(MAGIC);
        bytes.push(2);
        bytes.push(0);
        bytes.extend_from_slice(&(dict.len() as u32).to_le_bytes());
        bytes.extend_from_slice(dict.as_bytes());
        bytes.extend_from_slice(&7.5f64.to_le_bytes());
        let arr = decode(&bytes).unwrap();
        assert_eq!(arr.data, vec![7.5]);
    }

    #[test]
    fn test_decode_two_dimensional_shape() {
        let payload: Vec<u8> = (0..6).flat_map(|i| (i as f64).to_le_bytes()).collect();
        let arr = decode(&raw_npy("<f8", "False", "(2, 3)", &payload)).unwrap();
        assert_eq!(arr.shape, vec![2, 3]);
        assert_eq!(arr.ndim(), 2);
        assert_eq!(arr.len(), 6);
    }

    #[test]
    fn test_decode_zero_dimensional_scalar() {
        let arr = decode(&raw_npy("<f8", "False", "()", &3.25f64.to_le_bytes())).unwrap();
        assert_eq!(arr.shape, Vec::<usize>::new());
        assert_eq!(arr.data, vec![3.25]);
    }

    #[test]
    fn test_decode_tolerates_trailing_bytes() {
        let mut bytes = encode(&[1.0, 2.0]);
        bytes.extend_from_slice(b"garbage");
        assert_eq!(decode(&bytes).unwrap().data, vec![1.0, 2.0]);
    }

    // -----------------------------------------------------------------------
    // Rejection tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_decode_rejects_bad_magic() {
        let mut bytes = encode(&[1.0]);
        bytes[0] = b'X';
        assert!(matches!(decode(&bytes), Err(NpyError::BadMagic)));
    }

    #[test]
    fn test_decode_rejects_unknown_version() {
        let mut bytes = encode(&[1.0]);
        bytes[6] = 9;
        assert!(matches!(
            decode(&bytes),
            Err(NpyError::UnsupportedVersion { major: 9, minor: 0 })
        ));
    }

    #[test]
    fn test_decode_rejects_truncated_payload() {
        let bytes = encode(&[1.0, 2.0, 3.0]);
        let cut = &bytes[..bytes.len() - 5];
        assert!(matches!(decode(cut), Err(NpyError::Truncated { .. })));
    }

    #[test]
    fn test_decode_rejects_overflowing_shape() {
        for shape in [
            "(2305843009213693952,)",
            "(18446744073709551615,)",
            "(4294967296, 4294967296)",
        ] {
            let bytes = raw_npy("<f8", "False", shape, &1.0f64.to_le_bytes());
            assert!(matches!(decode(&bytes), Err(NpyError::MalformedHeader(_))));
        }
    }

    #[test]
    fn test_decode_rejects_giant_shape_before_reading() {
        // 8 GiB promised over 8 bytes present
        let bytes = raw_npy("<f8", "False", "(1073741824,)", &1.0f64.to_le_bytes());
        assert!(matches!(decode(&bytes), Err(NpyError::Truncated { .. })));
    }

    #[test]
    fn test_decode_rejects_integer_dtype() {
        let payload = 7i64.to_le_bytes();
        assert!(matches!(
            decode(&raw_npy("<i8", "False", "(1,)", &payload)),
            Err(NpyError::UnsupportedDtype(_))
        ));
    }

    #[test]
    fn test_decode_rejects_fortran_matrix() {
        let payload: Vec<u8> = (0..4).flat_map(|i| (i as f64).to_le_bytes()).collect();
        assert!(matches!(
            decode(&raw_npy("<f8", "True", "(2, 2)", &payload)),
            Err(NpyError::FortranOrder)
        ));
    }

    #[test]
    fn test_decode_fortran_vector_is_fine() {
        let payload = 1.0f64.to_le_bytes();
        assert!(decode(&raw_npy("<f8", "True", "(1,)", &payload)).is_ok());
    }

    #[test]
    fn test_decode_rejects_garbled_header() {
        let bytes = raw_npy("<f8", "Maybe", "(1,)", &1.0f64.to_le_bytes());
        assert!(matches!(decode(&bytes), Err(NpyError::MalformedHeader(_))));
    }
}
