//! Minimal TIFF IFD0 reader/rewriter for the EXIF body.
//!
//! Only IFD0 is ever rewritten. Every other structure (sub-IFDs, thumbnails,
//! out-of-line values) stays at its original offset, so the offsets stored in
//! the copied entries remain valid.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::error::MetadataError;

/// IFD0 tag holding the identity token (XPComment).
pub(crate) const TAG_XP_COMMENT: u16 = 0x9C9C;

const TYPE_BYTE: u16 = 1;
const HEADER_LEN: usize = 8;
const ENTRY_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Endian {
    Little,
    Big,
}

impl Endian {
    fn u16(self, b: &[u8]) -> u16 {
        match self {
            Self::Little => LittleEndian::read_u16(b),
            Self::Big => BigEndian::read_u16(b),
        }
    }

    fn u32(self, b: &[u8]) -> u32 {
        match self {
            Self::Little => LittleEndian::read_u32(b),
            Self::Big => BigEndian::read_u32(b),
        }
    }

    fn push_u16(self, out: &mut Vec<u8>, value: u16) {
        let mut buf = [0u8; 2];
        match self {
            Self::Little => LittleEndian::write_u16(&mut buf, value),
            Self::Big => BigEndian::write_u16(&mut buf, value),
        }
        out.extend_from_slice(&buf);
    }

    fn push_u32(self, out: &mut Vec<u8>, value: u32) {
        let mut buf = [0u8; 4];
        self.put_u32(&mut buf, value);
        out.extend_from_slice(&buf);
    }

    fn put_u32(self, dst: &mut [u8], value: u32) {
        match self {
            Self::Little => LittleEndian::write_u32(dst, value),
            Self::Big => BigEndian::write_u32(dst, value),
        }
    }
}

/// Raw IFD entry. `value` keeps the file's byte order untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct IfdEntry {
    pub tag: u16,
    pub field_type: u16,
    pub count: u32,
    pub value: [u8; 4],
}

impl IfdEntry {
    fn byte_len(&self) -> Result<usize, MetadataError> {
        let unit = type_size(self.field_type).ok_or_else(|| {
            MetadataError::Malformed(format!(
                "unknown field type {} for tag {:#06x}",
                self.field_type, self.tag
            ))
        })?;
        (self.count as usize)
            .checked_mul(unit)
            .ok_or_else(|| MetadataError::Malformed("field size overflow".to_string()))
    }
}

fn type_size(field_type: u16) -> Option<usize> {
    match field_type {
        1 | 2 | 6 | 7 => Some(1),
        3 | 8 => Some(2),
        4 | 9 | 11 | 13 => Some(4),
        5 | 10 | 12 => Some(8),
        _ => None,
    }
}

/// Parsed IFD0 of a TIFF body.
#[derive(Debug)]
pub(crate) struct Ifd0 {
    pub endian: Endian,
    pub offset: usize,
    pub entries: Vec<IfdEntry>,
    pub next_ifd: u32,
}

impl Ifd0 {
    pub fn find(&self, tag: u16) -> Option<&IfdEntry> {
        self.entries.iter().find(|e| e.tag == tag)
    }

    fn end(&self) -> usize {
        self.offset + 2 + self.entries.len() * ENTRY_LEN + 4
    }
}

fn slice(data: &[u8], start: usize, len: usize) -> Result<&[u8], MetadataError> {
    start
        .checked_add(len)
        .and_then(|end| data.get(start..end))
        .ok_or_else(|| MetadataError::Malformed(format!("range {}+{} out of bounds", start, len)))
}

/// Parse the TIFF header and IFD0.
pub(crate) fn read_ifd0(tiff: &[u8]) -> Result<Ifd0, MetadataError> {
    let header = slice(tiff, 0, HEADER_LEN)?;
    let endian = match &header[0..2] {
        b"II" => Endian::Little,
        b"MM" => Endian::Big,
        _ => return Err(MetadataError::Malformed("bad byte order mark".to_string())),
    };
    if endian.u16(&header[2..4]) != 42 {
        return Err(MetadataError::Malformed("bad TIFF magic".to_string()));
    }

    let offset = endian.u32(&header[4..8]) as usize;
    let count = endian.u16(slice(tiff, offset, 2)?) as usize;
    let table = slice(tiff, offset + 2, count * ENTRY_LEN + 4)?;

    let entries = table[..count * ENTRY_LEN]
        .chunks_exact(ENTRY_LEN)
        .map(|raw| IfdEntry {
            tag: endian.u16(&raw[0..2]),
            field_type: endian.u16(&raw[2..4]),
            count: endian.u32(&raw[4..8]),
            value: [raw[8], raw[9], raw[10], raw[11]],
        })
        .collect();
    let next_ifd = endian.u32(&table[count * ENTRY_LEN..]);

    Ok(Ifd0 {
        endian,
        offset,
        entries,
        next_ifd,
    })
}

/// Bytes of an entry's value, whether stored inline or at an offset.
pub(crate) fn entry_bytes<'a>(
    tiff: &'a [u8],
    endian: Endian,
    entry: &'a IfdEntry,
) -> Result<&'a [u8], MetadataError> {
    let len = entry.byte_len()?;
    if len <= 4 {
        Ok(&entry.value[..len])
    } else {
        slice(tiff, endian.u32(&entry.value) as usize, len)
    }
}

/// Raw bytes of the XPComment field in IFD0, if present.
pub(crate) fn read_xp_comment(tiff: &[u8]) -> Result<Option<Vec<u8>>, MetadataError> {
    let ifd0 = read_ifd0(tiff)?;
    match ifd0.find(TAG_XP_COMMENT) {
        Some(entry) => Ok(Some(entry_bytes(tiff, ifd0.endian, entry)?.to_vec())),
        None => Ok(None),
    }
}

/// A little-endian TIFF body whose IFD0 holds only the XPComment field.
pub(crate) fn fresh_with_xp_comment(value: &[u8]) -> Result<Vec<u8>, MetadataError> {
    let mut out = Vec::with_capacity(HEADER_LEN + 64 + value.len());
    out.extend_from_slice(b"II");
    Endian::Little.push_u16(&mut out, 42);
    Endian::Little.push_u32(&mut out, HEADER_LEN as u32);
    append_ifd(&mut out, Endian::Little, Vec::new(), 0, value)?;
    Ok(out)
}

/// Copy `tiff` with IFD0 rebuilt so that XPComment holds `value`.
///
/// The new IFD0 is appended and the header re-pointed at it. When the old IFD0
/// (and its XPComment value) already sit at the tail of the body, as left by a
/// previous rewrite, the tail is reused instead of growing the block.
pub(crate) fn with_xp_comment(tiff: &[u8], value: &[u8]) -> Result<Vec<u8>, MetadataError> {
    let ifd0 = read_ifd0(tiff)?;
    let endian = ifd0.endian;

    let keep_len = reusable_tail(tiff, &ifd0)?.unwrap_or(tiff.len());
    let mut out = tiff[..keep_len].to_vec();
    if out.len() % 2 == 1 {
        out.push(0);
    }

    let new_offset = out.len();
    let entries: Vec<IfdEntry> = ifd0
        .entries
        .into_iter()
        .filter(|e| e.tag != TAG_XP_COMMENT)
        .collect();
    append_ifd(&mut out, endian, entries, ifd0.next_ifd, value)?;

    let new_offset = u32::try_from(new_offset)
        .map_err(|_| MetadataError::SegmentTooLarge(out.len()))?;
    endian.put_u32(&mut out[4..8], new_offset);
    Ok(out)
}

/// Start of the old IFD0 if nothing but it and its XPComment value follow it.
fn reusable_tail(tiff: &[u8], ifd0: &Ifd0) -> Result<Option<usize>, MetadataError> {
    if ifd0.offset < HEADER_LEN {
        return Ok(None);
    }

    let mut end = ifd0.end();
    if let Some(entry) = ifd0.find(TAG_XP_COMMENT) {
        let len = entry.byte_len()?;
        if len > 4 {
            if ifd0.endian.u32(&entry.value) as usize != end {
                return Ok(None);
            }
            end += len;
        }
    }

    let padded = end + end % 2;
    if end == tiff.len() || padded == tiff.len() {
        Ok(Some(ifd0.offset))
    } else {
        Ok(None)
    }
}

/// Append an IFD with `entries` plus XPComment, followed by the value bytes.
fn append_ifd(
    out: &mut Vec<u8>,
    endian: Endian,
    mut entries: Vec<IfdEntry>,
    next_ifd: u32,
    value: &[u8],
) -> Result<(), MetadataError> {
    let ifd_offset = out.len();
    let count = entries.len() + 1;
    let value_offset = ifd_offset + 2 + count * ENTRY_LEN + 4;

    let mut value_field = [0u8; 4];
    if value.len() <= 4 {
        value_field[..value.len()].copy_from_slice(value);
    } else {
        let offset = u32::try_from(value_offset)
            .map_err(|_| MetadataError::SegmentTooLarge(value_offset))?;
        endian.put_u32(&mut value_field, offset);
    }

    entries.push(IfdEntry {
        tag: TAG_XP_COMMENT,
        field_type: TYPE_BYTE,
        count: u32::try_from(value.len())
            .map_err(|_| MetadataError::SegmentTooLarge(value.len()))?,
        value: value_field,
    });
    entries.sort_by_key(|e| e.tag);

    let count = u16::try_from(count)
        .map_err(|_| MetadataError::Malformed("too many IFD0 entries".to_string()))?;
    endian.push_u16(out, count);
    for entry in &entries {
        endian.push_u16(out, entry.tag);
        endian.push_u16(out, entry.field_type);
        endian.push_u32(out, entry.count);
        out.extend_from_slice(&entry.value);
    }
    endian.push_u32(out, next_ifd);

    if value.len() > 4 {
        out.extend_from_slice(value);
        if out.len() % 2 == 1 {
            out.push(0);
        }
    }
    Ok(())
}
