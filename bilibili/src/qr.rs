use crate::error::Result;
use qrcode::{EcLevel, QrCode, render::unicode};
use std::io::Write;

/// Renders `content` as a compact unicode qr block suitable for a dark
/// terminal. Low error correction keeps the block small enough to scan
/// from a phone without scrolling.
pub fn render<W: Write>(content: &str, out: &mut W) -> Result<()> {
    let code = QrCode::with_error_correction_level(content, EcLevel::L)?;
    let image = code
        .render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .quiet_zone(true)
        .build();

    writeln!(out, "{image}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_scannable_block() {
        let mut out = Vec::new();
        render("https://passport.bilibili.com/h5-app/passport/login/scan", &mut out).unwrap();

        let block = String::from_utf8(out).unwrap();
        assert!(!block.trim().is_empty());
        assert!(block.ends_with('\n'));
    }
}
