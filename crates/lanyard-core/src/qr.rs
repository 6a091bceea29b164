use image::{DynamicImage, ImageFormat, Luma};
use qrcode::QrCode;
use thiserror::Error;

/// Pixel edge of the generated ticket image.
const QR_SIZE: u32 = 512;

#[derive(Debug, Error)]
pub enum QrError {
    #[error("qr encoding failed: {0}")]
    Encode(String),
    #[error("png encoding failed: {0}")]
    Png(String),
}

/// Render the attendee's check-in payload as a PNG QR image. The door
/// scanner reads back exactly what we encode here: the attendee id.
pub fn ticket_png(attendee_id: i64) -> Result<Vec<u8>, QrError> {
    let code = QrCode::new(attendee_id.to_string().as_bytes())
        .map_err(|e| QrError::Encode(e.to_string()))?;
    let qr_image = code
        .render::<Luma<u8>>()
        .min_dimensions(QR_SIZE, QR_SIZE)
        .build();

    let mut png = Vec::new();
    DynamicImage::ImageLuma8(qr_image)
        .write_to(&mut std::io::Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| QrError::Png(e.to_string()))?;
    Ok(png)
}
