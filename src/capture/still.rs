//! Encoding captured frames into PNG stills.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use flate2::write::ZlibEncoder;
use flate2::{Compression, Crc};
use std::io::Write;

use super::frame::Frame;

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StillImage {
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl StillImage {
    pub fn png(bytes: Vec<u8>) -> Self {
        Self {
            mime_type: "image/png",
            bytes,
        }
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, BASE64.encode(&self.bytes))
    }
}

fn write_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);

    let mut crc = Crc::new();
    crc.update(kind);
    crc.update(data);
    out.extend_from_slice(&crc.sum().to_be_bytes());
}

/// 8-bit RGB, no interlace, filter type 0 on every scanline.
pub fn encode_png(frame: &Frame) -> Result<StillImage> {
    let mut header = Vec::with_capacity(13);
    header.extend_from_slice(&frame.width.to_be_bytes());
    header.extend_from_slice(&frame.height.to_be_bytes());
    header.extend_from_slice(&[8, 2, 0, 0, 0]);

    let row_len = frame.width as usize * 3;
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    for row in frame.pixels.chunks(row_len.max(1)) {
        encoder.write_all(&[0])?;
        encoder.write_all(row)?;
    }
    let compressed = encoder.finish().context("Failed to compress image data")?;

    let mut out = Vec::with_capacity(compressed.len() + 64);
    out.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut out, b"IHDR", &header);
    write_chunk(&mut out, b"IDAT", &compressed);
    write_chunk(&mut out, b"IEND", &[]);

    Ok(StillImage::png(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    fn chunk_at(bytes: &[u8], offset: usize) -> (&[u8], &[u8]) {
        let len = u32::from_be_bytes(bytes[offset..offset + 4].try_into().unwrap()) as usize;
        let kind = &bytes[offset + 4..offset + 8];
        let data = &bytes[offset + 8..offset + 8 + len];
        (kind, data)
    }

    #[test]
    fn test_png_layout() {
        let frame = Frame::new(2, 1, vec![255, 0, 0, 0, 255, 0]).unwrap();
        let still = encode_png(&frame).unwrap();

        assert_eq!(still.mime_type, "image/png");
        assert_eq!(&still.bytes[..8], &PNG_SIGNATURE);

        let (kind, ihdr) = chunk_at(&still.bytes, 8);
        assert_eq!(kind, b"IHDR");
        assert_eq!(&ihdr[..4], &2u32.to_be_bytes());
        assert_eq!(&ihdr[4..8], &1u32.to_be_bytes());
        assert_eq!(&ihdr[8..], &[8, 2, 0, 0, 0]);

        let idat_offset = 8 + 12 + ihdr.len();
        let (kind, idat) = chunk_at(&still.bytes, idat_offset);
        assert_eq!(kind, b"IDAT");

        let mut raw = Vec::new();
        ZlibDecoder::new(idat).read_to_end(&mut raw).unwrap();
        assert_eq!(raw, vec![0, 255, 0, 0, 0, 255, 0]);

        assert!(still.bytes.ends_with(&[0xAE, 0x42, 0x60, 0x82]));
    }

    #[test]
    fn test_data_url_prefix() {
        let still = StillImage::png(vec![1, 2, 3]);
        assert_eq!(still.to_data_url(), "data:image/png;base64,AQID");
    }
}
