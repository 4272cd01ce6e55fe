//! Tiny JPEG fixtures for unit tests.

use assetsync_core::{IdentityCodec, IdentityToken};

/// A structurally valid JPEG whose pixel data depends on `seed`.
pub(crate) fn jpeg(seed: u8) -> Vec<u8> {
    vec![
        0xFF, 0xD8, // SOI
        0xFF, 0xE0, 0x00, 0x07, b'J', b'F', b'I', b'F', 0x00, // APP0
        0xFF, 0xDB, 0x00, 0x03, seed, // DQT
        0xFF, 0xDA, 0x00, 0x02, seed, 0x11, 0x22, // SOS + scan data
        0xFF, 0xD9, // EOI
    ]
}

/// [`jpeg`] carrying `token`.
pub(crate) fn tagged_jpeg(seed: u8, token: &str) -> Vec<u8> {
    let token = IdentityToken::new(token).unwrap();
    IdentityCodec::write(&jpeg(seed), &token).unwrap()
}
