//! JPEG container plumbing for SWF bitmap tags.
//!
//! DefineBits bodies share a single JPEGTables stream per file; the two are
//! spliced back into one standalone JPEG here. Early Flash exporters also
//! prefixed JPEG data with a bogus `FF D9 FF D8` marker pair that decoders
//! must drop.

/// Strip the erroneous `FF D9 FF D8` pair historically written before the
/// real SOI marker. Returns the slice starting at the last SOI found in the
/// prefix region.
pub fn strip_erroneous_header(data: &[u8]) -> &[u8] {
    // Walk leading SOI/EOI markers; the payload starts at the final SOI.
    let mut offset = 0;
    let mut start = 0;
    while offset + 1 < data.len() {
        match (data[offset], data[offset + 1]) {
            (0xFF, 0xD8) => {
                start = offset;
                offset += 2;
            },
            (0xFF, 0xD9) => {
                offset += 2;
            },
            _ => break,
        }
    }
    &data[start..]
}

/// Splice a JPEGTables stream and a DefineBits body into one JPEG.
///
/// The tables stream ends with an EOI marker and the body begins with an
/// SOI marker; both are dropped at the seam. A tables stream without
/// payload (some encoders emit a bare SOI+EOI) leaves the body untouched.
pub fn merge_jpeg_tables(tables: &[u8], data: &[u8]) -> Vec<u8> {
    let data = strip_erroneous_header(data);
    if tables.len() <= 4 {
        return data.to_vec();
    }

    let head = match tables {
        [.., 0xFF, 0xD9] => &tables[..tables.len() - 2],
        _ => tables,
    };
    let tail = match data {
        [0xFF, 0xD8, rest @ ..] => rest,
        _ => data,
    };

    let mut merged = Vec::with_capacity(head.len() + tail.len());
    merged.extend_from_slice(head);
    merged.extend_from_slice(tail);
    merged
}

/// Scan JPEG markers for a start-of-frame segment and return its declared
/// pixel dimensions.
pub fn dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let mut offset = 2; // past SOI
    while offset + 4 <= data.len() {
        if data[offset] != 0xFF {
            // Lost marker sync
            return None;
        }
        let marker = data[offset + 1];
        match marker {
            // Padding and standalone markers carry no length
            0xFF => {
                offset += 1;
                continue;
            },
            0xD0..=0xD7 | 0x01 => {
                offset += 2;
                continue;
            },
            _ => {},
        }

        let length = u16::from_be_bytes([data[offset + 2], data[offset + 3]]) as usize;
        if is_sof_marker(marker) {
            // Segment layout: length (2), precision (1), height (2), width (2)
            if offset + 9 > data.len() {
                return None;
            }
            let height = u16::from_be_bytes([data[offset + 5], data[offset + 6]]);
            let width = u16::from_be_bytes([data[offset + 7], data[offset + 8]]);
            return Some((width as u32, height as u32));
        }
        offset += 2 + length;
    }
    None
}

/// SOF0-SOF15, excluding DHT (C4), JPG (C8), and DAC (CC).
fn is_sof_marker(marker: u8) -> bool {
    matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A minimal JPEG: SOI, SOF0 declaring 17x13 pixels, EOI.
    fn tiny_jpeg() -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8];
        data.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x0B, 0x08]);
        data.extend_from_slice(&13u16.to_be_bytes());
        data.extend_from_slice(&17u16.to_be_bytes());
        data.extend_from_slice(&[0x01, 0x01, 0x11, 0x00]);
        data.extend_from_slice(&[0xFF, 0xD9]);
        data
    }

    #[test]
    fn test_dimensions_from_sof() {
        assert_eq!(dimensions(&tiny_jpeg()), Some((17, 13)));
    }

    #[test]
    fn test_dimensions_skips_non_sof_segments() {
        let mut data = vec![0xFF, 0xD8];
        // DHT segment must not be mistaken for a SOF
        data.extend_from_slice(&[0xFF, 0xC4, 0x00, 0x04, 0x00, 0x00]);
        data.extend_from_slice(&tiny_jpeg()[2..]);
        assert_eq!(dimensions(&data), Some((17, 13)));
    }

    #[test]
    fn test_strip_erroneous_header() {
        let clean = tiny_jpeg();
        let mut bogus = vec![0xFF, 0xD9, 0xFF, 0xD8];
        bogus.extend_from_slice(&clean);
        assert_eq!(strip_erroneous_header(&bogus), &clean[..]);
        assert_eq!(strip_erroneous_header(&clean), &clean[..]);
    }

    #[test]
    fn test_merge_tables_drops_seam_markers() {
        let tables = vec![0xFF, 0xD8, 0xFF, 0xDB, 0x00, 0x02, 0xFF, 0xD9];
        let body = tiny_jpeg();
        let merged = merge_jpeg_tables(&tables, &body);

        // One SOI at the front, the DQT from the tables, then the body frame
        assert_eq!(&merged[..2], &[0xFF, 0xD8]);
        assert_eq!(&merged[2..4], &[0xFF, 0xDB]);
        assert_eq!(&merged[6..8], &[0xFF, 0xC0]);
        assert_eq!(dimensions(&merged), Some((17, 13)));
    }

    #[test]
    fn test_merge_with_empty_tables_is_identity() {
        let body = tiny_jpeg();
        assert_eq!(merge_jpeg_tables(&[0xFF, 0xD8, 0xFF, 0xD9], &body), body);
        assert_eq!(merge_jpeg_tables(&[], &body), body);
    }
}
