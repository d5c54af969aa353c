use anyhow::{bail, Context, Result};

/// One RGB8 video frame, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = raster_len(width, height)?;
        if pixels.len() != expected {
            bail!(
                "Frame {}x{} needs {} bytes, got {}",
                width,
                height,
                expected,
                pixels.len()
            );
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Flipped left to right, matching the preview the user sees.
    pub fn mirrored(&self) -> Frame {
        let row_len = self.width as usize * 3;
        let mut pixels = Vec::with_capacity(self.pixels.len());
        for row in self.pixels.chunks_exact(row_len.max(1)) {
            for pixel in row.chunks_exact(3).rev() {
                pixels.extend_from_slice(pixel);
            }
        }
        Frame {
            width: self.width,
            height: self.height,
            pixels,
        }
    }

    /// Parse a binary PPM (`P6`, maxval up to 255).
    pub fn from_ppm(data: &[u8]) -> Result<Self> {
        let mut pos = 0;
        let magic = next_token(data, &mut pos).context("Missing PPM magic number")?;
        if magic != b"P6" {
            bail!("Unsupported frame format, expected binary PPM (P6)");
        }

        let width = parse_number(next_token(data, &mut pos), "width")?;
        let height = parse_number(next_token(data, &mut pos), "height")?;
        let maxval = parse_number(next_token(data, &mut pos), "maxval")?;
        if maxval == 0 || maxval > 255 {
            bail!("Unsupported PPM maxval {}", maxval);
        }

        // exactly one whitespace byte separates the header from the raster
        pos += 1;
        let expected = raster_len(width, height)?;
        let raster = pos
            .checked_add(expected)
            .and_then(|end| data.get(pos..end))
            .context("PPM raster is shorter than its header declares")?;

        Frame::new(width, height, raster.to_vec())
    }
}

/// Bytes needed for a `width` x `height` RGB raster.
fn raster_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(3))
        .with_context(|| format!("Frame size {}x{} is too large", width, height))
}

fn next_token<'a>(data: &'a [u8], pos: &mut usize) -> Option<&'a [u8]> {
    loop {
        while *pos < data.len() && data[*pos].is_ascii_whitespace() {
            *pos += 1;
        }
        if *pos < data.len() && data[*pos] == b'#' {
            while *pos < data.len() && data[*pos] != b'\n' {
                *pos += 1;
            }
            continue;
        }
        break;
    }

    let start = *pos;
    while *pos < data.len() && !data[*pos].is_ascii_whitespace() {
        *pos += 1;
    }
    (start < *pos).then(|| &data[start..*pos])
}

fn parse_number(token: Option<&[u8]>, field: &str) -> Result<u32> {
    let token = token.with_context(|| format!("Missing PPM {}", field))?;
    std::str::from_utf8(token)
        .ok()
        .and_then(|s| s.parse().ok())
        .with_context(|| format!("Invalid PPM {}", field))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_reverses_each_row() {
        let frame = Frame::new(
            2,
            2,
            vec![
                1, 1, 1, 2, 2, 2, //
                3, 3, 3, 4, 4, 4,
            ],
        )
        .unwrap();

        let mirrored = frame.mirrored();
        assert_eq!(
            mirrored.pixels,
            vec![
                2, 2, 2, 1, 1, 1, //
                4, 4, 4, 3, 3, 3,
            ]
        );
        assert_eq!(mirrored.mirrored(), frame);
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert!(Frame::new(2, 2, vec![0; 11]).is_err());
    }

    #[test]
    fn test_parse_ppm_with_comment() {
        let mut data = b"P6\n# kiosk camera\n2 1\n255\n".to_vec();
        data.extend_from_slice(&[255, 0, 0, 0, 0, 255]);

        let frame = Frame::from_ppm(&data).unwrap();
        assert_eq!(frame.width, 2);
        assert_eq!(frame.height, 1);
        assert_eq!(frame.pixels, vec![255, 0, 0, 0, 0, 255]);
    }

    #[test]
    fn test_parse_ppm_rejects_ascii_variant() {
        assert!(Frame::from_ppm(b"P3\n1 1\n255\n0 0 0\n").is_err());
    }

    #[test]
    fn test_parse_ppm_rejects_oversized_header() {
        let mut data = b"P6\n4294967295 4294967295\n255\n".to_vec();
        data.extend_from_slice(&[0; 12]);
        assert!(Frame::from_ppm(&data).is_err());

        let mut data = b"P6\n4294967295 1\n255\n".to_vec();
        data.extend_from_slice(&[0; 12]);
        assert!(Frame::from_ppm(&data).is_err());
    }

    #[test]
    fn test_huge_dimensions_are_rejected() {
        assert!(Frame::new(u32::MAX, u32::MAX, vec![]).is_err());
    }

    #[test]
    fn test_parse_ppm_rejects_truncated_raster() {
        let mut data = b"P6 2 2 255\n".to_vec();
        data.extend_from_slice(&[0; 6]);
        assert!(Frame::from_ppm(&data).is_err());
    }
}
