//! Styled QR code synthesis.
//!
//! Colouring is a pure function from pixel coordinate to colour
//! ([`pixel_color`]), so the gradient styles are testable without
//! building an image. Identical inputs produce byte-identical PNGs.

use campus_core::{error::CampusError, traits::QrRenderer, viewstate::QrStyle};
use image::{ImageBuffer, Rgb};
use qrcode::{Color, EcLevel, QrCode};

const MODULE_SIZE: u32 = 10;
const QUIET_ZONE: u32 = 4;
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Parse a colour argument: a small named palette or `#RRGGBB`.
pub fn parse_color(text: &str) -> Result<Rgb<u8>, CampusError> {
    let lower = text.trim().to_ascii_lowercase();
    let named = match lower.as_str() {
        "black" => Some([0, 0, 0]),
        "white" => Some([255, 255, 255]),
        "red" => Some([255, 0, 0]),
        "green" => Some([0, 128, 0]),
        "blue" => Some([0, 0, 255]),
        "yellow" => Some([255, 255, 0]),
        "orange" => Some([255, 165, 0]),
        "purple" => Some([128, 0, 128]),
        "pink" => Some([255, 192, 203]),
        "cyan" => Some([0, 255, 255]),
        "magenta" => Some([255, 0, 255]),
        "gray" | "grey" => Some([128, 128, 128]),
        _ => None,
    };
    if let Some(rgb) = named {
        return Ok(Rgb(rgb));
    }

    if let Some(hex) = lower.strip_prefix('#') {
        if hex.len() == 6 {
            if let Ok(value) = u32::from_str_radix(hex, 16) {
                return Ok(Rgb([
                    (value >> 16) as u8,
                    (value >> 8) as u8,
                    value as u8,
                ]));
            }
        }
    }

    Err(CampusError::Format(format!(
        "Unknown colour '{text}'. Use a colour name or #RRGGBB."
    )))
}

/// Colour of a dark module pixel at `(x, y)` in a `size`×`size` image.
///
/// Gradients sweep blue→red left-to-right, top-to-bottom, or
/// centre-outward; `Solid` paints the base colour flat. Any style not
/// matched explicitly paints flat as well.
pub fn pixel_color(x: u32, y: u32, size: u32, style: QrStyle, base: Rgb<u8>) -> Rgb<u8> {
    let gradient = |t: f64| {
        let r = (255.0 * t) as u8;
        let b = (255.0 * (1.0 - t)) as u8;
        Rgb([r, 0, b])
    };
    match style {
        QrStyle::HGradient => gradient(f64::from(x) / f64::from(size)),
        QrStyle::VGradient => gradient(f64::from(y) / f64::from(size)),
        QrStyle::Radial => {
            let c = f64::from(size) / 2.0;
            let dx = f64::from(x) - c;
            let dy = f64::from(y) - c;
            let dist = (dx * dx + dy * dy).sqrt();
            let max_dist = (2.0 * c * c).sqrt();
            gradient(dist / max_dist)
        }
        QrStyle::Solid => base,
    }
}

/// QR image synthesis backed by the `qrcode` and `image` crates.
pub struct StyledQr;

impl QrRenderer for StyledQr {
    fn render(
        &self,
        url: &str,
        style: QrStyle,
        color: Option<&str>,
    ) -> Result<Vec<u8>, CampusError> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(CampusError::Format(
                "Invalid URL. Must start with http:// or https://".to_string(),
            ));
        }

        let base = match color {
            Some(text) => parse_color(text)?,
            None => BLACK,
        };

        let code = QrCode::with_error_correction_level(url.as_bytes(), EcLevel::L)
            .map_err(|e| CampusError::Format(format!("QR generation failed: {e}")))?;

        let modules = code.width() as u32;
        let img_size = (modules + QUIET_ZONE * 2) * MODULE_SIZE;

        let img = ImageBuffer::from_fn(img_size, img_size, |x, y| {
            let gx = x / MODULE_SIZE;
            let gy = y / MODULE_SIZE;
            let in_quiet = gx < QUIET_ZONE
                || gy < QUIET_ZONE
                || gx >= QUIET_ZONE + modules
                || gy >= QUIET_ZONE + modules;
            if in_quiet {
                return WHITE;
            }
            let mx = (gx - QUIET_ZONE) as usize;
            let my = (gy - QUIET_ZONE) as usize;
            match code[(mx, my)] {
                Color::Dark => pixel_color(x, y, img_size, style, base),
                Color::Light => WHITE,
            }
        });

        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png)
            .map_err(|e| CampusError::Format(format!("PNG encoding failed: {e}")))?;

        Ok(buf.into_inner())
    }
}
