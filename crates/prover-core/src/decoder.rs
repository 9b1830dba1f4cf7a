//! Exit-Request Decoder
//!
//! Decodes the packed byte payload an `ExitRequest` carries into individual
//! validator entries. The layout is fixed-width: 64 bytes per entry, no
//! length prefix, no padding between entries.
//!
//! ```text
//! byte 0..3   moduleId       (big-endian u24)
//! byte 3..8   nodeOpId       (big-endian u40)
//! byte 8..16  validatorIndex (big-endian u64)
//! byte 16..64 pubkey         (48 bytes)
//! ```

use crate::model::DecodedValidator;

/// Width in bytes of one packed exit-request record.
pub const RECORD_SIZE: usize = 64;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("exit request payload length {0} is not a multiple of {RECORD_SIZE}")]
    MalformedExitData(usize),
}

/// Decode a packed exit-request payload into its validator entries, in
/// payload order. `exitDataIndex` is assigned sequentially starting at 0.
pub fn decode_exit_requests(data: &[u8]) -> Result<Vec<DecodedValidator>, DecodeError> {
    let data = strip_0x_prefix(data);

    if data.len() % RECORD_SIZE != 0 {
        return Err(DecodeError::MalformedExitData(data.len()));
    }

    let mut out = Vec::with_capacity(data.len() / RECORD_SIZE);
    for (i, chunk) in data.chunks_exact(RECORD_SIZE).enumerate() {
        out.push(decode_record(i as u32, chunk));
    }
    Ok(out)
}

/// Re-encode decoded validators back into the packed payload format. Used by
/// round-trip tests and by tooling that constructs synthetic exit requests.
#[must_use]
pub fn encode_exit_requests(validators: &[DecodedValidator]) -> Vec<u8> {
    let mut out = Vec::with_capacity(validators.len() * RECORD_SIZE);
    for v in validators {
        out.extend_from_slice(&v.module_id.to_be_bytes()[1..4]);
        out.extend_from_slice(&v.node_op_id.to_be_bytes()[3..8]);
        out.extend_from_slice(&v.validator_index.to_be_bytes());
        out.extend_from_slice(&v.pubkey);
    }
    out
}

fn decode_record(exit_data_index: u32, chunk: &[u8]) -> DecodedValidator {
    debug_assert_eq!(chunk.len(), RECORD_SIZE);

    let module_id = u32::from_be_bytes([0, chunk[0], chunk[1], chunk[2]]);

    let mut node_op_id_bytes = [0u8; 8];
    node_op_id_bytes[3..8].copy_from_slice(&chunk[3..8]);
    let node_op_id = u64::from_be_bytes(node_op_id_bytes);

    let mut validator_index_bytes = [0u8; 8];
    validator_index_bytes.copy_from_slice(&chunk[8..16]);
    let validator_index = u64::from_be_bytes(validator_index_bytes);

    let mut pubkey = [0u8; 48];
    pubkey.copy_from_slice(&chunk[16..64]);

    DecodedValidator {
        exit_data_index,
        module_id,
        node_op_id,
        validator_index,
        pubkey,
    }
}

/// Oracle payloads are occasionally hex-string-encoded upstream; tolerate a
/// leading `0x` so callers don't need to special-case the source.
fn strip_0x_prefix(data: &[u8]) -> &[u8] {
    if data.len() >= 2 && &data[0..2] == b"0x" {
        &data[2..]
    } else {
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(exit_data_index: u32, module_id: u32, node_op_id: u64, validator_index: u64, fill: u8) -> DecodedValidator {
        DecodedValidator {
            exit_data_index,
            module_id,
            node_op_id,
            validator_index,
            pubkey: [fill; 48],
        }
    }

    #[test]
    fn single_record_round_trips() {
        let v = sample(0, 1, 42, 12345, 0xab);
        let encoded = encode_exit_requests(&[v]);
        assert_eq!(encoded.len(), RECORD_SIZE);
        let decoded = decode_exit_requests(&encoded).unwrap();
        assert_eq!(decoded, vec![v]);
    }

    #[test]
    fn multiple_records_assign_sequential_index() {
        let vs = vec![
            sample(0, 1, 1, 100, 0x01),
            sample(0, 2, 2, 200, 0x02),
            sample(0, 3, 3, 300, 0x03),
        ];
        let encoded = encode_exit_requests(&vs);
        let decoded = decode_exit_requests(&encoded).unwrap();
        assert_eq!(decoded.len(), 3);
        for (i, d) in decoded.iter().enumerate() {
            assert_eq!(d.exit_data_index, i as u32);
        }
        assert_eq!(decoded[1].module_id, 2);
        assert_eq!(decoded[2].validator_index, 300);
    }

    #[test]
    fn strips_0x_prefix() {
        let v = sample(0, 7, 7, 7, 0x07);
        let mut encoded = encode_exit_requests(&[v]);
        let mut with_prefix = b"0x".to_vec();
        with_prefix.append(&mut encoded);
        let decoded = decode_exit_requests(&with_prefix).unwrap();
        assert_eq!(decoded, vec![v]);
    }

    #[test]
    fn non_multiple_of_record_size_is_malformed() {
        let data = vec![0u8; 63];
        assert_eq!(decode_exit_requests(&data), Err(DecodeError::MalformedExitData(63)));
    }

    #[test]
    fn empty_payload_decodes_to_empty_vec() {
        assert_eq!(decode_exit_requests(&[]).unwrap(), vec![]);
    }

    #[test]
    fn module_id_is_24_bit_big_endian() {
        let mut chunk = vec![0u8; RECORD_SIZE];
        chunk[0] = 0x12;
        chunk[1] = 0x34;
        chunk[2] = 0x56;
        let decoded = decode_exit_requests(&chunk).unwrap();
        assert_eq!(decoded[0].module_id, 0x00123456);
    }
}
