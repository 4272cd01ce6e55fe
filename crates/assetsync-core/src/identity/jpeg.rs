//! JPEG marker segment walking.

use crate::error::MetadataError;

pub(crate) const MARKER_SOI: u8 = 0xD8;
pub(crate) const MARKER_EOI: u8 = 0xD9;
pub(crate) const MARKER_SOS: u8 = 0xDA;
pub(crate) const MARKER_APP0: u8 = 0xE0;
pub(crate) const MARKER_APP1: u8 = 0xE1;
pub(crate) const MARKER_APP15: u8 = 0xEF;
pub(crate) const MARKER_COM: u8 = 0xFE;

/// Identifier that opens the payload of an EXIF APP1 segment.
pub(crate) const EXIF_HEADER: &[u8; 6] = b"Exif\0\0";

/// Largest payload a segment may carry (the 16-bit length includes itself).
pub(crate) const MAX_SEGMENT_PAYLOAD: usize = u16::MAX as usize - 2;

/// One marker segment before the scan data.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Segment<'a> {
    pub marker: u8,
    /// Payload without the marker and length bytes.
    pub payload: &'a [u8],
    /// Marker, length and payload as found in the file.
    pub raw: &'a [u8],
}

impl<'a> Segment<'a> {
    /// TIFF body if this is an EXIF APP1 segment.
    pub fn exif_body(&self) -> Option<&'a [u8]> {
        if self.marker == MARKER_APP1 && self.payload.starts_with(EXIF_HEADER) {
            Some(&self.payload[EXIF_HEADER.len()..])
        } else {
            None
        }
    }

    /// APPn and COM segments hold metadata, everything else describes pixels.
    pub fn is_metadata(&self) -> bool {
        (MARKER_APP0..=MARKER_APP15).contains(&self.marker) || self.marker == MARKER_COM
    }
}

/// Header segments plus everything from SOS (or EOI) to the end of the file.
#[derive(Debug)]
pub(crate) struct JpegLayout<'a> {
    pub segments: Vec<Segment<'a>>,
    pub tail: &'a [u8],
}

fn is_standalone(marker: u8) -> bool {
    marker == 0x01 || (0xD0..=0xD7).contains(&marker)
}

/// Split a JPEG buffer into its header segments and the trailing scan data.
pub(crate) fn parse(bytes: &[u8]) -> Result<JpegLayout<'_>, MetadataError> {
    if bytes.len() < 2 || bytes[0] != 0xFF || bytes[1] != MARKER_SOI {
        return Err(MetadataError::NotJpeg);
    }

    let mut segments = Vec::new();
    let mut pos = 2;

    loop {
        if pos >= bytes.len() {
            return Ok(JpegLayout {
                segments,
                tail: &[],
            });
        }
        if bytes[pos] != 0xFF {
            return Err(MetadataError::Malformed(format!(
                "expected marker at offset {}",
                pos
            )));
        }

        let start = pos;
        // Fill bytes: any number of 0xFF may precede a marker
        while pos < bytes.len() && bytes[pos] == 0xFF {
            pos += 1;
        }
        let marker = *bytes.get(pos).ok_or(MetadataError::Truncated(start))?;
        pos += 1;

        if marker == MARKER_SOS || marker == MARKER_EOI {
            return Ok(JpegLayout {
                segments,
                tail: &bytes[start..],
            });
        }

        if is_standalone(marker) {
            segments.push(Segment {
                marker,
                payload: &[],
                raw: &bytes[start..pos],
            });
            continue;
        }

        let len_bytes = bytes
            .get(pos..pos + 2)
            .ok_or(MetadataError::Truncated(start))?;
        let length = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
        if length < 2 {
            return Err(MetadataError::Malformed(format!(
                "segment length {} at offset {}",
                length, start
            )));
        }
        let end = pos + length;
        if end > bytes.len() {
            return Err(MetadataError::Truncated(start));
        }

        segments.push(Segment {
            marker,
            payload: &bytes[pos + 2..end],
            raw: &bytes[start..end],
        });
        pos = end;
    }
}

/// Encode an APP1 segment wrapping `tiff`.
pub(crate) fn exif_segment(tiff: &[u8]) -> Result<Vec<u8>, MetadataError> {
    let payload_len = EXIF_HEADER.len() + tiff.len();
    if payload_len > MAX_SEGMENT_PAYLOAD {
        return Err(MetadataError::SegmentTooLarge(payload_len));
    }

    let mut out = Vec::with_capacity(payload_len + 4);
    out.extend_from_slice(&[0xFF, MARKER_APP1]);
    out.extend_from_slice(&((payload_len + 2) as u16).to_be_bytes());
    out.extend_from_slice(EXIF_HEADER);
    out.extend_from_slice(tiff);
    Ok(out)
}
