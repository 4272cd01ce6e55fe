//! Identity codec.
//!
//! The catalog record identifier of an image is persisted inside the image
//! itself, in the XPComment field of the EXIF IFD0, as UCS-2 text prefixed by
//! [`TOKEN_MARKER`]. The file is the only durable link between disk and the
//! remote catalog; nothing else is stored.
//!
//! The codec also computes the content fingerprint used to tell a real pixel
//! change from a metadata-only change.

mod jpeg;
mod tiff;

use tracing::debug;

use crate::error::MetadataError;
use crate::types::IdentityToken;

/// ASCII prefix that marks the XPComment field as holding an identity token.
pub const TOKEN_MARKER: &str = "contentfulImageId-";

/// Reads and writes identity tokens, computes content fingerprints.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCodec;

impl IdentityCodec {
    /// Extract the identity token from an image.
    ///
    /// Absent, malformed or padding-only fields all yield `None`.
    pub fn read(bytes: &[u8]) -> Option<IdentityToken> {
        match Self::try_read(bytes) {
            Ok(token) => token,
            Err(e) => {
                debug!(error = %e, "Unreadable identity block, treating as unassigned");
                None
            }
        }
    }

    /// Like [`IdentityCodec::read`] but reports structural problems.
    pub fn try_read(bytes: &[u8]) -> Result<Option<IdentityToken>, MetadataError> {
        let layout = jpeg::parse(bytes)?;

        // The first EXIF segment wins; later ones are ignored by readers
        let Some(body) = layout.segments.iter().find_map(|s| s.exif_body()) else {
            return Ok(None);
        };
        let Some(raw) = tiff::read_xp_comment(body)? else {
            return Ok(None);
        };

        let text = decode_ucs2(&raw);
        Ok(text.strip_prefix(TOKEN_MARKER).and_then(IdentityToken::new))
    }

    /// Return a copy of `bytes` with `token` embedded.
    ///
    /// Every existing EXIF segment is dropped and a rebuilt one is inserted
    /// after SOI/APP0. Other IFD0 entries of the first EXIF segment and all
    /// non-EXIF segments are carried over unchanged.
    pub fn write(bytes: &[u8], token: &IdentityToken) -> Result<Vec<u8>, MetadataError> {
        let value = encode_ucs2(token)?;
        let layout = jpeg::parse(bytes)?;

        let existing = layout.segments.iter().find_map(|s| s.exif_body());
        let body = match existing {
            Some(body) => match tiff::with_xp_comment(body, &value) {
                Ok(body) => body,
                Err(e) => {
                    debug!(error = %e, "Replacing malformed EXIF block");
                    tiff::fresh_with_xp_comment(&value)?
                }
            },
            None => tiff::fresh_with_xp_comment(&value)?,
        };
        let segment = jpeg::exif_segment(&body)?;

        let mut out = Vec::with_capacity(bytes.len() + segment.len());
        out.extend_from_slice(&bytes[..2]);

        let mut inserted = false;
        for seg in &layout.segments {
            if seg.exif_body().is_some() {
                continue;
            }
            if !inserted && seg.marker != jpeg::MARKER_APP0 {
                out.extend_from_slice(&segment);
                inserted = true;
            }
            out.extend_from_slice(seg.raw);
        }
        if !inserted {
            out.extend_from_slice(&segment);
        }
        out.extend_from_slice(layout.tail);

        Ok(out)
    }

    /// BLAKE3 hex digest of the image-bearing bytes.
    ///
    /// Metadata segments (APPn, COM) are left out, so embedding a token does not
    /// change the fingerprint. Buffers that are not parseable JPEGs are hashed
    /// whole.
    pub fn fingerprint(bytes: &[u8]) -> String {
        let mut hasher = blake3::Hasher::new();
        match jpeg::parse(bytes) {
            Ok(layout) => {
                for seg in layout.segments.iter().filter(|s| !s.is_metadata()) {
                    hasher.update(seg.raw);
                }
                hasher.update(layout.tail);
            }
            Err(_) => {
                hasher.update(bytes);
            }
        }
        hex::encode(hasher.finalize().as_bytes())
    }
}

fn encode_ucs2(token: &IdentityToken) -> Result<Vec<u8>, MetadataError> {
    let text = token.as_str();
    if !text.is_ascii() {
        return Err(MetadataError::InvalidToken(format!("non-ASCII: {:?}", text)));
    }
    if text.contains('\0') {
        return Err(MetadataError::InvalidToken("contains NUL".to_string()));
    }

    let text = format!("{}{}", TOKEN_MARKER, token);
    let mut out: Vec<u8> = text.encode_utf16().flat_map(u16::to_le_bytes).collect();
    out.extend_from_slice(&[0, 0]);
    Ok(out)
}

fn decode_ucs2(raw: &[u8]) -> String {
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|unit| *unit != 0)
        .collect();
    String::from_utf16_lossy(&units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// SOI, JFIF APP0, a quantisation table, then a tiny scan and EOI.
    fn sample_jpeg() -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8];
        bytes.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x10]);
        bytes.extend_from_slice(b"JFIF\0\x01\x01\x00\x00\x01\x00\x01\x00\x00");
        bytes.extend_from_slice(&[0xFF, 0xDB, 0x00, 0x04, 0x01, 0x02]);
        bytes.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x02, 0x11, 0x22, 0x33, 0xFF, 0xD9]);
        bytes
    }

    /// Big-endian EXIF body with Make="Canon" (out of line) and Orientation=6.
    fn camera_exif() -> Vec<u8> {
        let mut tiff = b"MM\x00\x2a\x00\x00\x00\x08".to_vec();
        tiff.extend_from_slice(&[0x00, 0x02]);
        tiff.extend_from_slice(&[0x01, 0x0F, 0x00, 0x02, 0x00, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00, 38]);
        tiff.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01, 0x00, 0x06, 0x00, 0x00]);
        tiff.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        tiff.extend_from_slice(b"Canon\0");
        tiff
    }

    fn jpeg_with_exif(tiff: &[u8]) -> Vec<u8> {
        let plain = sample_jpeg();
        let mut bytes = plain[..2].to_vec();
        bytes.extend_from_slice(&jpeg::exif_segment(tiff).unwrap());
        bytes.extend_from_slice(&plain[2..]);
        bytes
    }

    fn token(id: &str) -> IdentityToken {
        IdentityToken::new(id).unwrap()
    }

    #[test]
    fn test_read_without_exif_is_none() {
        assert_eq!(IdentityCodec::read(&sample_jpeg()), None);
        assert_eq!(IdentityCodec::read(&jpeg_with_exif(&camera_exif())), None);
    }

    #[test]
    fn test_read_garbage_is_none() {
        assert_eq!(IdentityCodec::read(b"not an image"), None);
        assert!(IdentityCodec::try_read(b"not an image").is_err());
    }

    #[test]
    fn test_write_then_read() {
        let written = IdentityCodec::write(&sample_jpeg(), &token("abc123")).unwrap();
        assert_eq!(IdentityCodec::read(&written), Some(token("abc123")));
    }

    #[test]
    fn test_exif_inserted_after_app0() {
        let written = IdentityCodec::write(&sample_jpeg(), &token("abc123")).unwrap();
        let layout = jpeg::parse(&written).unwrap();

        assert_eq!(layout.segments[0].marker, jpeg::MARKER_APP0);
        assert!(layout.segments[1].exif_body().is_some());
        assert_eq!(layout.segments.len(), 3);
    }

    #[test]
    fn test_write_preserves_other_ifd0_entries() {
        let original = jpeg_with_exif(&camera_exif());
        let written = IdentityCodec::write(&original, &token("7Hx2")).unwrap();

        let layout = jpeg::parse(&written).unwrap();
        let body = layout.segments.iter().find_map(|s| s.exif_body()).unwrap();
        let ifd0 = tiff::read_ifd0(body).unwrap();

        let make = ifd0.find(0x010F).unwrap();
        assert_eq!(tiff::entry_bytes(body, ifd0.endian, make).unwrap(), b"Canon\0");
        let orientation = ifd0.find(0x0112).unwrap();
        assert_eq!(tiff::entry_bytes(body, ifd0.endian, orientation).unwrap(), &[0x00, 0x06]);

        let tags: Vec<u16> = ifd0.entries.iter().map(|e| e.tag).collect();
        assert_eq!(tags, vec![0x010F, 0x0112, tiff::TAG_XP_COMMENT]);
        assert_eq!(IdentityCodec::read(&written), Some(token("7Hx2")));
    }

    #[test]
    fn test_rewrite_replaces_token_without_growing() {
        let first = IdentityCodec::write(&jpeg_with_exif(&camera_exif()), &token("aaaa")).unwrap();
        let second = IdentityCodec::write(&first, &token("bbbb")).unwrap();
        let third = IdentityCodec::write(&second, &token("cccc")).unwrap();

        assert_eq!(IdentityCodec::read(&third), Some(token("cccc")));
        assert_eq!(second.len(), third.len());
        assert_eq!(first.len(), second.len());
    }

    #[test]
    fn test_duplicate_exif_segments_collapse() {
        let mut bytes = jpeg_with_exif(&camera_exif());
        let extra = jpeg::exif_segment(&camera_exif()).unwrap();
        bytes.splice(2..2, extra);

        let written = IdentityCodec::write(&bytes, &token("one")).unwrap();
        let layout = jpeg::parse(&written).unwrap();
        let exif_count = layout
            .segments
            .iter()
            .filter(|s| s.exif_body().is_some())
            .count();
        assert_eq!(exif_count, 1);
    }

    #[test]
    fn test_foreign_comment_is_not_a_token() {
        let value: Vec<u8> = "holiday snaps"
            .encode_utf16()
            .flat_map(u16::to_le_bytes)
            .collect();
        let body = tiff::fresh_with_xp_comment(&value).unwrap();

        assert_eq!(IdentityCodec::read(&jpeg_with_exif(&body)), None);
    }

    #[test]
    fn test_padding_only_field_is_none() {
        let body = tiff::fresh_with_xp_comment(&[0u8; 16]).unwrap();
        assert_eq!(IdentityCodec::read(&jpeg_with_exif(&body)), None);

        let marker_only: Vec<u8> = TOKEN_MARKER
            .encode_utf16()
            .flat_map(u16::to_le_bytes)
            .chain([0, 0, 0, 0])
            .collect();
        let body = tiff::fresh_with_xp_comment(&marker_only).unwrap();
        assert_eq!(IdentityCodec::read(&jpeg_with_exif(&body)), None);
    }

    #[test]
    fn test_malformed_exif_is_replaced_on_write() {
        let written =
            IdentityCodec::write(&jpeg_with_exif(b"XX\x00\x00junk"), &token("fresh")).unwrap();
        assert_eq!(IdentityCodec::read(&written), Some(token("fresh")));
    }

    #[test]
    fn test_write_rejects_non_jpeg() {
        assert_eq!(
            IdentityCodec::write(b"GIF89a", &token("x")),
            Err(MetadataError::NotJpeg)
        );
    }

    #[test]
    fn test_write_rejects_non_ascii_token() {
        let result = IdentityCodec::write(&sample_jpeg(), &token("é😀"));
        assert!(matches!(result, Err(MetadataError::InvalidToken(_))));
        assert_eq!(IdentityCodec::read(&sample_jpeg()), None);
    }

    #[test]
    fn test_fingerprint_ignores_metadata() {
        let plain = sample_jpeg();
        let tagged = IdentityCodec::write(&plain, &token("abc123")).unwrap();

        assert_ne!(plain, tagged);
        assert_eq!(IdentityCodec::fingerprint(&plain), IdentityCodec::fingerprint(&tagged));
    }

    #[test]
    fn test_fingerprint_tracks_pixels() {
        let plain = sample_jpeg();
        let mut edited = plain.clone();
        let scan_byte = edited.len() - 3;
        edited[scan_byte] ^= 0xFF;

        assert_ne!(IdentityCodec::fingerprint(&plain), IdentityCodec::fingerprint(&edited));
    }

    proptest! {
        #[test]
        fn prop_token_roundtrip(id in "[A-Za-z0-9_]{1,48}") {
            let t = token(&id);
            for image in [sample_jpeg(), jpeg_with_exif(&camera_exif())] {
                let written = IdentityCodec::write(&image, &t).unwrap();
                prop_assert_eq!(IdentityCodec::read(&written), Some(t.clone()));
            }
        }
    }
}
