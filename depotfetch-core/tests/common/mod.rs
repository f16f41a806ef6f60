//! Shared fixtures: an in-memory transport and encoders for every format the
//! decoders read.
#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockEncrypt, BlockEncryptMut, KeyInit, KeyIvInit};
use aes::Aes128;
use async_trait::async_trait;
use depotfetch_core::contract::{HttpRequest, HttpResponse, Transport};
use depotfetch_core::error::FetchError;
use depotfetch_core::session::Session;
use depotfetch_core::store::ArtifactStore;
use flate2::write::{DeflateEncoder, ZlibEncoder};
use flate2::Compression;

/// Transport answering from a fixed route table; unknown URLs get a 404.
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<HashMap<String, Result<HttpResponse, FetchError>>>,
    calls: Mutex<Vec<HttpRequest>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, url: &str, status: u16, body: impl Into<Vec<u8>>) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(HttpResponse::new(status, body.into())));
    }

    pub fn respond_json(&self, url: &str, json: serde_json::Value) {
        self.respond(url, 200, json.to_string());
    }

    pub fn fail(&self, url: &str) {
        self.routes.lock().unwrap().insert(
            url.to_string(),
            Err(FetchError::Connection {
                url: url.to_string(),
                detail: "connection refused".to_string(),
            }),
        );
    }

    pub fn calls(&self) -> Vec<HttpRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls().iter().filter(|r| r.url == url).count()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        self.calls.lock().unwrap().push(request.clone());
        self.routes
            .lock()
            .unwrap()
            .get(&request.url)
            .cloned()
            .unwrap_or_else(|| Ok(HttpResponse::new(404, Vec::<u8>::new())))
    }
}

pub fn session(transport: Arc<FakeTransport>, root: &std::path::Path) -> Session {
    Session::new(transport, ArtifactStore::new(root))
}

/// Inverse of the dual-mode decoder: `ecb(iv) || cbc_pkcs7(plaintext)`.
pub fn dual_aes_encrypt(key: &[u8; 16], iv: [u8; 16], plaintext: &[u8]) -> Vec<u8> {
    let mut buffer = vec![0u8; plaintext.len() + 16];
    buffer[..plaintext.len()].copy_from_slice(plaintext);
    let body = cbc::Encryptor::<Aes128>::new_from_slices(key, &iv)
        .unwrap()
        .encrypt_padded_mut::<Pkcs7>(&mut buffer, plaintext.len())
        .unwrap()
        .to_vec();
    let mut iv_block = aes::Block::clone_from_slice(&iv);
    Aes128::new_from_slice(key).unwrap().encrypt_block(&mut iv_block);
    let mut out = iv_block.to_vec();
    out.extend_from_slice(&body);
    out
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn raw_deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Build a `.st` container around `script` with the given header seed.
pub fn st_container(xor_seed: u32, script: &str) -> Vec<u8> {
    let mut inner = vec![0u8; 512];
    inner.extend_from_slice(script.as_bytes());
    let key = ((xor_seed ^ 0xFFFE_A4C8) & 0xFF) as u8;
    let payload: Vec<u8> = zlib(&inner).iter().map(|b| b ^ key).collect();
    let mut out = Vec::new();
    out.extend_from_slice(&xor_seed.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&payload);
    out
}

pub fn zip_bundle(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer
            .start_file(*name, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Hand-assembled gob stream builder.
pub mod gob {
    pub fn put_uint(out: &mut Vec<u8>, v: u64) {
        if v < 0x80 {
            out.push(v as u8);
            return;
        }
        let bytes = v.to_be_bytes();
        let skip = bytes.iter().take_while(|b| **b == 0).count();
        out.push(((8 - skip) as u8).wrapping_neg());
        out.extend_from_slice(&bytes[skip..]);
    }

    pub fn put_int(out: &mut Vec<u8>, v: i64) {
        let u = if v < 0 {
            ((!v as u64) << 1) | 1
        } else {
            (v as u64) << 1
        };
        put_uint(out, u);
    }

    pub fn put_bytes(out: &mut Vec<u8>, b: &[u8]) {
        put_uint(out, b.len() as u64);
        out.extend_from_slice(b);
    }

    fn common_type(out: &mut Vec<u8>, name: &str, id: i64) {
        put_uint(out, 1);
        put_bytes(out, name.as_bytes());
        put_uint(out, 1);
        put_int(out, id);
        put_uint(out, 0);
    }

    /// Append one length-prefixed message.
    pub fn frame(stream: &mut Vec<u8>, message: &[u8]) {
        put_uint(stream, message.len() as u64);
        stream.extend_from_slice(message);
    }

    pub fn struct_type(id: i64, name: &str, fields: &[(&str, i64)]) -> Vec<u8> {
        let mut m = Vec::new();
        put_int(&mut m, -id);
        put_uint(&mut m, 3); // wireType.StructT
        put_uint(&mut m, 1); // structType.CommonType
        common_type(&mut m, name, id);
        put_uint(&mut m, 1); // structType.Field
        put_uint(&mut m, fields.len() as u64);
        for (field, field_id) in fields {
            put_uint(&mut m, 1);
            put_bytes(&mut m, field.as_bytes());
            put_uint(&mut m, 1);
            put_int(&mut m, *field_id);
            put_uint(&mut m, 0);
        }
        put_uint(&mut m, 0);
        put_uint(&mut m, 0);
        m
    }

    pub fn slice_type(id: i64, elem: i64) -> Vec<u8> {
        let mut m = Vec::new();
        put_int(&mut m, -id);
        put_uint(&mut m, 2); // wireType.SliceT
        put_uint(&mut m, 1); // sliceType.CommonType
        common_type(&mut m, "", id);
        put_uint(&mut m, 1); // sliceType.Elem
        put_int(&mut m, elem);
        put_uint(&mut m, 0);
        put_uint(&mut m, 0);
        m
    }

    pub struct Depot<'a> {
        pub id: u64,
        pub manifest_id: u64,
        pub manifest: &'a [u8],
        pub key: Option<&'a [u8]>,
    }

    const MANIFEST: i64 = 65;
    const DEPOT: i64 = 66;
    const DEPOTS: i64 = 67;
    const LICENSES: i64 = 68;
    const APP_INFO: i64 = 69;

    /// Encode an app record; `extra_field` appends an unknown trailing string field.
    pub fn app_record(app_id: u64, depots: &[Depot<'_>], extra_field: Option<&str>) -> Vec<u8> {
        let mut stream = Vec::new();
        frame(&mut stream, &struct_type(MANIFEST, "Manifest", &[("Id", 3), ("Data", 5)]));
        frame(
            &mut stream,
            &struct_type(DEPOT, "Depot", &[("Id", 3), ("Manifests", MANIFEST), ("Decryptkey", 5)]),
        );
        frame(&mut stream, &slice_type(DEPOTS, DEPOT));
        frame(&mut stream, &slice_type(LICENSES, 3));
        let mut fields = vec![
            ("Appid", 3),
            ("Licenses", LICENSES),
            ("App", 6),
            ("Depots", DEPOTS),
            ("EncryptedAppTicket", 5),
            ("AppOwnershipTicket", 5),
        ];
        if extra_field.is_some() {
            fields.push(("Extra", 6));
        }
        frame(&mut stream, &struct_type(APP_INFO, "AppInfo", &fields));

        let mut v = Vec::new();
        put_int(&mut v, APP_INFO);
        put_uint(&mut v, 1); // Appid
        put_uint(&mut v, app_id);
        put_uint(&mut v, 1); // Licenses
        put_uint(&mut v, 2);
        put_uint(&mut v, 0);
        put_uint(&mut v, 12345);
        put_uint(&mut v, 1); // App
        put_bytes(&mut v, b"demo app");
        put_uint(&mut v, 1); // Depots
        put_uint(&mut v, depots.len() as u64);
        for depot in depots {
            put_uint(&mut v, 1); // Id
            put_uint(&mut v, depot.id);
            put_uint(&mut v, 1); // Manifests
            put_uint(&mut v, 1); // Manifests.Id
            put_uint(&mut v, depot.manifest_id);
            put_uint(&mut v, 1); // Manifests.Data
            put_bytes(&mut v, depot.manifest);
            put_uint(&mut v, 0);
            if let Some(key) = depot.key {
                put_uint(&mut v, 1); // Decryptkey
                put_bytes(&mut v, key);
            }
            put_uint(&mut v, 0);
        }
        put_uint(&mut v, 1); // EncryptedAppTicket
        put_bytes(&mut v, &[0xEE; 4]);
        put_uint(&mut v, 1); // AppOwnershipTicket
        put_bytes(&mut v, &[0x0A; 3]);
        if let Some(extra) = extra_field {
            put_uint(&mut v, 1);
            put_bytes(&mut v, extra.as_bytes());
        }
        put_uint(&mut v, 0);
        frame(&mut stream, &v);
        stream
    }
}
