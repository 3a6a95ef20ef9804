//! QR rendering of provisioning URIs.
//!
//! `encode_png` produces an image an authenticator app can scan;
//! `encode_terminal` draws the same matrix with Unicode half blocks.

use image::{GrayImage, Luma};
use qrcode::render::unicode;
use qrcode::{Color, QrCode};

use crate::errors::{OtpVaultError, Result};

/// Pixels per QR module.
const MODULE_PX: u32 = 8;
/// Quiet-zone border in modules.
const QUIET_ZONE: u32 = 4;

/// Render `uri` as a PNG image.
pub fn encode_png(uri: &str) -> Result<Vec<u8>> {
    let code = QrCode::new(uri.as_bytes()).map_err(|e| OtpVaultError::QrEncode(e.to_string()))?;

    let matrix = code.to_colors();
    let width = code.width() as u32;
    let img_size = (width + QUIET_ZONE * 2) * MODULE_PX;

    let mut img = GrayImage::from_pixel(img_size, img_size, Luma([255u8]));
    for y in 0..width {
        for x in 0..width {
            if matrix[(y * width + x) as usize] != Color::Dark {
                continue;
            }
            let px_x = (x + QUIET_ZONE) * MODULE_PX;
            let px_y = (y + QUIET_ZONE) * MODULE_PX;
            for dy in 0..MODULE_PX {
                for dx in 0..MODULE_PX {
                    img.put_pixel(px_x + dx, px_y + dy, Luma([0u8]));
                }
            }
        }
    }

    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(
        encoder,
        img.as_raw(),
        img_size,
        img_size,
        image::ExtendedColorType::L8,
    )
    .map_err(|e| OtpVaultError::QrEncode(format!("PNG encode error: {e}")))?;

    Ok(buf)
}

/// Render `uri` for display in a terminal.
pub fn encode_terminal(uri: &str) -> Result<String> {
    let code = QrCode::new(uri.as_bytes()).map_err(|e| OtpVaultError::QrEncode(e.to_string()))?;
    Ok(code
        .render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    const URI: &str = "otpauth://totp/Test:a%40b.com?secret=JBSWY3DPEHPK3PXP&issuer=Test";

    #[test]
    fn png_has_signature() {
        let png = encode_png(URI).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn terminal_rendering_is_non_empty() {
        let art = encode_terminal(URI).unwrap();
        assert!(art.lines().count() > 10);
    }

    #[test]
    fn oversized_payload_fails() {
        let huge = "A".repeat(8_000);
        assert!(matches!(encode_png(&huge), Err(OtpVaultError::QrEncode(_))));
    }
}
