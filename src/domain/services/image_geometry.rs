//! Header-only image geometry extraction for JPEG, PNG and GIF.
//!
//! Nothing here decodes pixels: each format stores its dimensions near the
//! start of the file, so only the leading bytes are inspected.

use std::fmt;

use crate::domain::entities::Dimensions;

/// Shortest payload worth inspecting.
pub const MIN_PAYLOAD_LEN: usize = 24;

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// JPEG Start-Of-Frame markers. C4 (DHT), C8 (JPG) and CC (DAC) are excluded.
const JPEG_SOF_MARKERS: [u8; 13] = [
    0xC0, 0xC1, 0xC2, 0xC3, 0xC5, 0xC6, 0xC7, 0xC9, 0xCA, 0xCB, 0xCD, 0xCE, 0xCF,
];

/// Image container recognised by its signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// JPEG / JFIF.
    Jpeg,
    /// PNG.
    Png,
    /// GIF87a or GIF89a.
    Gif,
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jpeg => write!(f, "jpeg"),
            Self::Png => write!(f, "png"),
            Self::Gif => write!(f, "gif"),
        }
    }
}

/// Identifies the container format from the leading bytes.
#[must_use]
pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
    if bytes.len() < MIN_PAYLOAD_LEN {
        return None;
    }

    if bytes.starts_with(&[0xFF, 0xD8]) {
        Some(ImageFormat::Jpeg)
    } else if bytes.starts_with(&PNG_SIGNATURE) {
        Some(ImageFormat::Png)
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some(ImageFormat::Gif)
    } else {
        None
    }
}

/// Reads `(width, height)` from the header of a JPEG, PNG or GIF payload.
///
/// Returns `None` for payloads shorter than [`MIN_PAYLOAD_LEN`], unknown
/// signatures and malformed or truncated headers.
#[must_use]
pub fn sniff(bytes: &[u8]) -> Option<Dimensions> {
    match detect_format(bytes)? {
        ImageFormat::Jpeg => jpeg_dimensions(bytes),
        ImageFormat::Png => png_dimensions(bytes),
        ImageFormat::Gif => gif_dimensions(bytes),
    }
}

fn be_u16(bytes: &[u8], at: usize) -> Option<u16> {
    let pair = bytes.get(at..at + 2)?;
    Some(u16::from_be_bytes([pair[0], pair[1]]))
}

fn be_u32(bytes: &[u8], at: usize) -> Option<u32> {
    let quad = bytes.get(at..at + 4)?;
    Some(u32::from_be_bytes([quad[0], quad[1], quad[2], quad[3]]))
}

fn le_u16(bytes: &[u8], at: usize) -> Option<u16> {
    let pair = bytes.get(at..at + 2)?;
    Some(u16::from_le_bytes([pair[0], pair[1]]))
}

fn jpeg_dimensions(bytes: &[u8]) -> Option<Dimensions> {
    // Past SOI.
    let mut pos = 2;

    loop {
        if *bytes.get(pos)? != 0xFF {
            return None;
        }

        let mut marker = *bytes.get(pos + 1)?;
        pos += 2;
        // Fill bytes: any number of FF may precede the marker code.
        while marker == 0xFF {
            marker = *bytes.get(pos)?;
            pos += 1;
        }

        // Standalone markers carry no length.
        if marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
            continue;
        }

        let length = usize::from(be_u16(bytes, pos)?);
        if length < 2 {
            return None;
        }

        if JPEG_SOF_MARKERS.contains(&marker) {
            // length(2) precision(1) height(2) width(2)
            let height = be_u16(bytes, pos + 3)?;
            let width = be_u16(bytes, pos + 5)?;
            return Some(Dimensions::new(u32::from(width), u32::from(height)));
        }

        pos += length;
    }
}

fn png_dimensions(bytes: &[u8]) -> Option<Dimensions> {
    if bytes.get(12..16)? != b"IHDR" {
        return None;
    }

    let width = be_u32(bytes, 16)?;
    let height = be_u32(bytes, 20)?;
    Some(Dimensions::new(width, height))
}

fn gif_dimensions(bytes: &[u8]) -> Option<Dimensions> {
    let width = le_u16(bytes, 6)?;
    let height = le_u16(bytes, 8)?;
    Some(Dimensions::new(u32::from(width), u32::from(height)))
}
