//! QR code rendering.
//!
//! Payloads are encoded at error correction level M and rendered as SVG,
//! which can be inlined into pages or served from the same origin.

use qrcode::render::svg;
use qrcode::types::QrError;
use qrcode::{EcLevel, QrCode};

/// Smallest rendered edge, in pixels.
const MIN_DIMENSION: u32 = 256;

/// Render `payload` as a standalone `<svg>` element.
///
/// # Errors
///
/// Returns `QrError::DataTooLong` if the payload does not fit in a level M
/// code.
pub fn render_svg(payload: &str) -> Result<String, QrError> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M)?;
    let image = code
        .render::<svg::Color>()
        .min_dimensions(MIN_DIMENSION, MIN_DIMENSION)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build();

    // Drop the XML prolog so the markup can be embedded in HTML.
    let markup = image
        .find("<svg")
        .and_then(|start| image.get(start..))
        .unwrap_or(image.as_str());
    Ok(markup.trim_end().to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_svg_element() {
        let svg = render_svg("BEGIN:VCARD\nVERSION:2.1\nN:Doe;John\nEND:VCARD").unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("http://www.w3.org/2000/svg"));
    }

    #[test]
    fn test_error_correction_level_is_m() {
        // Byte-mode capacity at version 40: L 2953, M 2331, Q 1663.
        assert!(render_svg(&"a".repeat(2000)).is_ok());
        assert!(matches!(
            render_svg(&"a".repeat(2500)),
            Err(QrError::DataTooLong)
        ));
    }
}
