mod common;

use depotfetch_core::decode::container::{self, ContainerHeader};
use depotfetch_core::decode::script::{self, ManifestPin, ScriptDepot};
use depotfetch_core::decode::{dual_aes, keyvalues, xor};
use depotfetch_core::error::DecodeError;

const KEY: &[u8; 16] = b"0123456789abcdef";

#[test]
fn dual_aes_round_trips_arbitrary_lengths() {
    for len in [0usize, 1, 15, 16, 17, 100, 4096] {
        let plaintext: Vec<u8> = (0..len).map(|i| (i * 7 % 251) as u8).collect();
        let iv = [len as u8; 16];
        let ciphertext = common::dual_aes_encrypt(KEY, iv, &plaintext);
        let decoded = dual_aes::decrypt(KEY, &ciphertext).expect("decrypt should succeed");
        assert_eq!(decoded, plaintext, "round trip failed for length {len}");
    }
}

#[test]
fn dual_aes_rejects_wrong_key_length() {
    let ciphertext = common::dual_aes_encrypt(KEY, [0; 16], b"payload");
    let err = dual_aes::decrypt(b"short", &ciphertext).unwrap_err();
    assert!(matches!(err, DecodeError::InvalidKey(_)), "got {err:?}");
}

#[test]
fn dual_aes_rejects_truncated_ciphertext() {
    let ciphertext = common::dual_aes_encrypt(KEY, [0; 16], b"payload");
    for cut in [0, 16, 20, ciphertext.len() - 1] {
        let err = dual_aes::decrypt(KEY, &ciphertext[..cut]).unwrap_err();
        assert!(matches!(err, DecodeError::DecryptionError(_)), "cut {cut}: {err:?}");
    }
}

#[test]
fn dual_aes_wrong_key_does_not_recover_plaintext() {
    let ciphertext = common::dual_aes_encrypt(KEY, [9; 16], b"some plaintext that spans blocks");
    let result = dual_aes::decrypt(b"fedcba9876543210", &ciphertext);
    assert!(
        !matches!(result, Ok(ref p) if p == b"some plaintext that spans blocks"),
        "wrong key must not recover the plaintext"
    );
}

#[test]
fn xor_is_self_inverse() {
    let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
    for key in [&b"k"[..], b"hail", b"Scalping dogs, I'll fuck you"] {
        let once = xor::apply(key, &data).unwrap();
        assert_ne!(once, data);
        assert_eq!(xor::apply(key, &once).unwrap(), data);
    }
}

#[test]
fn xor_rejects_empty_key() {
    assert!(matches!(xor::apply(b"", b"data"), Err(DecodeError::InvalidKey(_))));
}

#[test]
fn container_seed_mask_yields_zero_key() {
    let mut header = Vec::new();
    header.extend_from_slice(&0xFFFE_A4C8u32.to_le_bytes());
    header.extend_from_slice(&10u32.to_le_bytes());
    header.extend_from_slice(&0u32.to_le_bytes());
    let parsed = ContainerHeader::parse(&header).unwrap();
    assert_eq!(parsed.xor_key(), 0x00);
    assert_eq!(parsed.payload_size, 10);
}

#[test]
fn container_decodes_zlib_payload_after_pad() {
    let bytes = common::st_container(0xFFFE_A4C8, "text");
    assert_eq!(container::decode(&bytes).unwrap(), "text");
}

#[test]
fn container_decodes_with_nonzero_key() {
    let script = "addappid(228990)\nsetManifestid(228990,\"1829726630299308803\")";
    let bytes = common::st_container(0x1234_5678, script);
    let header = ContainerHeader::parse(&bytes).unwrap();
    assert_ne!(header.xor_key(), 0);
    assert_eq!(container::decode(&bytes).unwrap(), script);
}

#[test]
fn container_accepts_raw_deflate() {
    let mut inner = vec![0u8; 512];
    inner.extend_from_slice(b"raw text");
    let bytes = raw_container(&common::raw_deflate(&inner));
    assert_eq!(container::decode(&bytes).unwrap(), "raw text");
}

#[test]
fn container_rejects_short_header() {
    let err = container::decode(&[1, 2, 3, 4, 5]).unwrap_err();
    assert_eq!(err, DecodeError::TruncatedHeader { len: 5 });
}

fn raw_container(payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&0xFFFE_A4C8u32.to_le_bytes());
    bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(payload);
    bytes
}

#[test]
fn container_rejects_corrupt_payload() {
    // Valid zlib header, then a deflate block with the reserved type 0b11.
    let bytes = raw_container(&[0x78, 0x9C, 0xFF, 0xFF, 0xFF, 0xFF]);
    let err = container::decode(&bytes).unwrap_err();
    assert!(matches!(err, DecodeError::CorruptPayload(_)), "got {err:?}");
}

#[test]
fn container_rejects_output_shorter_than_pad() {
    let bytes = raw_container(&common::zlib(b"tiny"));
    assert!(matches!(container::decode(&bytes), Err(DecodeError::CorruptPayload(_))));
}

#[test]
fn script_extracts_depots_and_manifest_pins() {
    let records = script::extract("addappid(123,1,\"deadbeef\")\naddappid(456)\nsetManifestid(123,\"999\")");
    assert_eq!(
        records.depots,
        vec![
            ScriptDepot {
                depot_id: "123".to_string(),
                key: Some("deadbeef".to_string()),
            },
            ScriptDepot {
                depot_id: "456".to_string(),
                key: None,
            },
        ]
    );
    assert_eq!(
        records.manifests,
        vec![ManifestPin {
            depot_id: "123".to_string(),
            manifest_id: "999".to_string(),
        }]
    );
    assert_eq!(records.manifests[0].file_name(), "123_999.manifest");
}

#[test]
fn script_tolerates_whitespace_and_trailing_size() {
    let text = "-- comment\naddappid( 10 , 0 , \"AbCd01\" )\nsetManifestid( 10 , \"77\" , 12345 )\n";
    let records = script::extract(text);
    assert_eq!(records.depots[0].key.as_deref(), Some("AbCd01"));
    assert_eq!(records.manifests[0].manifest_id, "77");
}

#[test]
fn keyvalues_reads_depot_keys_in_order() {
    let vdf = r#"
"depots"
{
    // first depot
    "228990"
    {
        "DecryptionKey" "44d8c45ce229a2c31f2e7d0a9f30e4f9f1e1d4c5b6a7980a1b2c3d4e5f607182"
    }
    "228991" { "DecryptionKey" "aa" }
    "228992" { "Other" "x" }
}
"#;
    let keys = keyvalues::depot_keys(vdf).unwrap();
    assert_eq!(
        keys,
        vec![
            (
                "228990".to_string(),
                "44d8c45ce229a2c31f2e7d0a9f30e4f9f1e1d4c5b6a7980a1b2c3d4e5f607182".to_string()
            ),
            ("228991".to_string(), "aa".to_string()),
        ]
    );
}

#[test]
fn keyvalues_requires_depots_block() {
    let err = keyvalues::depot_keys("\"apps\" { }").unwrap_err();
    assert!(matches!(err, DecodeError::MalformedKeyValues(_)));
}

#[test]
fn keyvalues_rejects_unbalanced_braces() {
    let err = keyvalues::depot_keys("\"depots\" { \"1\" {").unwrap_err();
    assert!(matches!(err, DecodeError::MalformedKeyValues(_)));
}

#[test]
fn keyvalues_matches_key_names_case_insensitively() {
    let keys = keyvalues::depot_keys(r#""Depots" { "5" { "decryptionkey" "ff" } }"#).unwrap();
    assert_eq!(keys, vec![("5".to_string(), "ff".to_string())]);
}
