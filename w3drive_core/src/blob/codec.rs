use super::{
    BLOB_SIZE, BYTES_PER_FIELD_ELEMENT, Blob, CodecError, FIELD_ELEMENTS_PER_BLOB,
    PAYLOAD_BYTES_PER_FIELD_ELEMENT,
};

/// Encodes arbitrary bytes into zero-padded blobs.
///
/// The input is walked in 31-byte strides; each stride lands in a field
/// element after its leading zero byte. The last blob is padded with zeros
/// to full size.
pub fn encode_blobs(data: &[u8]) -> Result<Vec<Blob>, CodecError> {
    if data.is_empty() {
        return Err(CodecError::InvalidInput("cannot encode empty data"));
    }

    let mut blobs = vec![Blob::zeroed()];
    let mut field_index = 0;
    for stride in data.chunks(PAYLOAD_BYTES_PER_FIELD_ELEMENT) {
        if field_index == FIELD_ELEMENTS_PER_BLOB {
            blobs.push(Blob::zeroed());
            field_index = 0;
        }
        let offset = field_index * BYTES_PER_FIELD_ELEMENT + 1;
        let Some(blob) = blobs.last_mut() else {
            unreachable!("blobs always holds at least one element");
        };
        blob.as_bytes_mut()[offset..offset + stride.len()].copy_from_slice(stride);
        field_index += 1;
    }
    Ok(blobs)
}

/// Decodes blobs back into the original bytes.
///
/// Trailing zero bytes are trimmed from the end of the whole concatenation,
/// not per blob. Payloads that genuinely end in zero bytes lose them; that is
/// the known limit of this layout, and on-chain data already relies on it.
pub fn decode_blobs(blobs: &[Blob]) -> Result<Vec<u8>, CodecError> {
    if blobs.is_empty() {
        return Err(CodecError::InvalidInput("no blobs to decode"));
    }

    let mut out = Vec::with_capacity(blobs.len() * super::BLOB_CAPACITY);
    for blob in blobs {
        for payload in blob.payload_chunks() {
            out.extend_from_slice(payload);
        }
    }
    trim_trailing_zeros(&mut out);
    Ok(out)
}

/// Decodes a raw concatenation of blobs, e.g. as returned by a gateway.
///
/// A short final blob is zero-extended to [`BLOB_SIZE`] before decoding.
pub fn decode_blob_bytes(raw: &[u8]) -> Result<Vec<u8>, CodecError> {
    if raw.is_empty() {
        return Err(CodecError::InvalidInput("no blob bytes to decode"));
    }

    let blobs = raw
        .chunks(BLOB_SIZE)
        .map(|piece| {
            let mut blob = Blob::zeroed();
            blob.as_bytes_mut()[..piece.len()].copy_from_slice(piece);
            blob
        })
        .collect::<Vec<_>>();
    decode_blobs(&blobs)
}

fn trim_trailing_zeros(buf: &mut Vec<u8>) {
    let len = buf.iter().rposition(|&b| b != 0).map_or(0, |pos| pos + 1);
    buf.truncate(len);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::BLOB_CAPACITY;

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8 + 1).collect()
    }

    #[test]
    fn test_encode_empty_fails() {
        assert!(matches!(
            encode_blobs(&[]),
            Err(CodecError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_padding_byte_is_zero() {
        let data = vec![0xffu8; 1000];
        let blobs = encode_blobs(&data).unwrap();
        assert_eq!(blobs.len(), 1);
        for fe in blobs[0].as_bytes().chunks_exact(BYTES_PER_FIELD_ELEMENT) {
            assert_eq!(fe[0], 0);
        }
    }

    #[test]
    fn test_first_stride_layout() {
        let data = pattern(40);
        let blobs = encode_blobs(&data).unwrap();
        let raw = blobs[0].as_bytes();
        assert_eq!(&raw[1..32], &data[..31]);
        assert_eq!(raw[32], 0);
        assert_eq!(&raw[33..42], &data[31..]);
        assert!(raw[42..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_blob_count_boundaries() {
        assert_eq!(encode_blobs(&pattern(1)).unwrap().len(), 1);
        assert_eq!(encode_blobs(&pattern(BLOB_CAPACITY)).unwrap().len(), 1);
        assert_eq!(encode_blobs(&pattern(BLOB_CAPACITY + 1)).unwrap().len(), 2);
        assert_eq!(encode_blobs(&pattern(200_000)).unwrap().len(), 2);
        assert_eq!(encode_blobs(&pattern(3 * BLOB_CAPACITY + 5)).unwrap().len(), 4);
    }

    #[test]
    fn test_roundtrip_multi_blob() {
        let data = pattern(BLOB_CAPACITY * 2 + 777);
        let blobs = encode_blobs(&data).unwrap();
        assert_eq!(decode_blobs(&blobs).unwrap(), data);
    }

    #[test]
    fn test_trailing_zeros_are_trimmed() {
        let mut data = pattern(100);
        data.extend_from_slice(&[0, 0, 0]);
        let blobs = encode_blobs(&data).unwrap();
        assert_eq!(decode_blobs(&blobs).unwrap(), data[..100].to_vec());
    }

    #[test]
    fn test_interior_zero_blob_survives() {
        // A blob's worth of zeros between non-zero payload must not be trimmed;
        // trimming happens only at the end of the whole concatenation.
        let mut data = pattern(10);
        data.extend(std::iter::repeat_n(0u8, BLOB_CAPACITY));
        data.push(7);
        let blobs = encode_blobs(&data).unwrap();
        assert_eq!(blobs.len(), 2);
        assert_eq!(decode_blobs(&blobs).unwrap(), data);
    }

    #[test]
    fn test_decode_blob_bytes_short_tail() {
        let data = pattern(BLOB_CAPACITY + 50);
        let blobs = encode_blobs(&data).unwrap();
        let mut raw = blobs[0].as_bytes().to_vec();
        // keep only the part of the second blob that carries payload
        raw.extend_from_slice(&blobs[1].as_bytes()[..64]);
        assert_eq!(decode_blob_bytes(&raw).unwrap(), data);
    }

    #[test]
    fn test_decode_empty_fails() {
        assert!(decode_blobs(&[]).is_err());
        assert!(decode_blob_bytes(&[]).is_err());
    }
}
