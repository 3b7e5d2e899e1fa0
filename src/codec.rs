use core::cmp::Ordering;

use crate::data_type::DataType;
use crate::error::AbortCode;
use crate::prelude::*;
use crate::value::Value;

/// Validates that `bytes` is an acceptable encoding for `data_type` and
/// wraps it as a `Value`. Fixed-width types must match their wire length
/// exactly; variable-length types (strings, domain) accept anything.
pub fn decode(data_type: DataType, bytes: &[u8]) -> Result<Value, AbortCode> {
    if let Some(expected) = data_type.fixed_size() {
        match bytes.len().cmp(&expected) {
            Ordering::Greater => return Err(AbortCode::DataTypeMismatchLengthTooHigh),
            Ordering::Less => return Err(AbortCode::DataTypeMismatchLengthTooLow),
            Ordering::Equal => {}
        }
    }
    Ok(Value::new(bytes.to_vec()))
}

/// Returns the raw encoded bytes for a value already known to match
/// `data_type`'s wire width. The object dictionary is the only caller that
/// constructs a `Value` without going through `decode`, so this is mostly a
/// clarity wrapper around `Value::as_slice`.
pub fn encode(_data_type: DataType, value: &Value) -> Vec<u8> {
    value.as_slice().to_vec()
}

/// Sign-extends a little-endian byte slice of width `size` (<= 8) into an
/// i64, for ordering comparisons on the odd-width integer types.
fn signed_widen(bytes: &[u8]) -> i64 {
    let mut buf = [0u8; 8];
    buf[..bytes.len()].copy_from_slice(bytes);
    let sign_bit_set = bytes.last().map(|b| b & 0x80 != 0).unwrap_or(false);
    if sign_bit_set {
        for b in buf.iter_mut().skip(bytes.len()) {
            *b = 0xFF;
        }
    }
    i64::from_le_bytes(buf)
}

fn unsigned_widen(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf[..bytes.len()].copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

fn is_signed(data_type: DataType) -> bool {
    matches!(
        data_type,
        DataType::Integer8
            | DataType::Integer16
            | DataType::Integer24
            | DataType::Integer32
            | DataType::Integer40
            | DataType::Integer48
            | DataType::Integer56
            | DataType::Integer64
    )
}

fn is_float(data_type: DataType) -> bool {
    matches!(data_type, DataType::Real32 | DataType::Real64)
}

/// Orders two encoded values of the same `data_type` numerically. Used to
/// enforce min/max limits and block-size-style comparisons on the object
/// dictionary's numeric types. Strings and domain compare byte-lexically.
pub fn compare(data_type: DataType, a: &Value, b: &Value) -> Ordering {
    if is_float(data_type) {
        let (fa, fb) = match data_type {
            DataType::Real32 => (a.to::<f32>() as f64, b.to::<f32>() as f64),
            DataType::Real64 => (a.to::<f64>(), b.to::<f64>()),
            _ => unreachable!(),
        };
        return fa.partial_cmp(&fb).unwrap_or(Ordering::Equal);
    }
    if is_signed(data_type) {
        return signed_widen(a.as_slice()).cmp(&signed_widen(b.as_slice()));
    }
    if data_type.is_fixed_length() {
        return unsigned_widen(a.as_slice()).cmp(&unsigned_widen(b.as_slice()));
    }
    a.as_slice().cmp(b.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_rejects_wrong_length() {
        assert_eq!(decode(DataType::Unsigned32, &[1, 2, 3]), Err(AbortCode::DataTypeMismatchLengthTooLow));
        assert_eq!(decode(DataType::Unsigned32, &[1, 2, 3, 4, 5]), Err(AbortCode::DataTypeMismatchLengthTooHigh));
        assert!(decode(DataType::Unsigned32, &[1, 2, 3, 4]).is_ok());
    }

    #[test]
    fn decode_accepts_any_length_for_strings() {
        assert!(decode(DataType::VisibleString, &[]).is_ok());
        assert!(decode(DataType::VisibleString, &[1, 2, 3, 4, 5, 6, 7]).is_ok());
    }

    #[test]
    fn compare_orders_signed_integer24_correctly() {
        let neg_one = Value::new(vec![0xFF, 0xFF, 0xFF]);
        let one = Value::new(vec![0x01, 0x00, 0x00]);
        assert_eq!(compare(DataType::Integer24, &neg_one, &one), Ordering::Less);
    }

    #[test]
    fn compare_orders_unsigned24_unsigned() {
        let high = Value::new(vec![0xFF, 0xFF, 0xFF]);
        let low = Value::new(vec![0x01, 0x00, 0x00]);
        assert_eq!(compare(DataType::Unsigned24, &high, &low), Ordering::Greater);
    }

    #[test]
    fn compare_orders_real32() {
        let a = Value::from(1.5f32);
        let b = Value::from(2.5f32);
        assert_eq!(compare(DataType::Real32, &a, &b), Ordering::Less);
    }

    #[test]
    fn compare_strings_lexically() {
        let a = Value::new(b"abc".to_vec());
        let b = Value::new(b"abd".to_vec());
        assert_eq!(compare(DataType::VisibleString, &a, &b), Ordering::Less);
    }
}
