#![cfg(feature = "render")]
use crate::codec::{self, DecodedFile};
use crate::error::ImageRenderError;
use crate::html::{RenderedHtml, download_anchor, img_tag};
use image::{DynamicImage, GenericImageView, ImageFormat, ImageOutputFormat};
use log::debug;
use std::io::Cursor;

/// A decoded image together with the format it was stored in.
#[derive(Clone, Debug)]
pub struct LoadedImage {
    pub image: DynamicImage,
    pub format: ImageFormat,
}

impl LoadedImage {
    pub fn new(image: DynamicImage, format: ImageFormat) -> Self {
        Self { image, format }
    }

    /// Preferred file extension of the stored format, e.g. `png` or `jpg`.
    pub fn extension(&self) -> &'static str {
        self.format.extensions_str().first().copied().unwrap_or("bin")
    }

    /// MIME type of the stored format.
    pub fn mime_type(&self) -> String {
        codec::mime_for_extension(self.extension())
    }

    /// Encode the image back into its own format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ImageRenderError> {
        encode_image(&self.image, self.format)
    }
}

/// Configuration options for image rendering
#[derive(Clone, Debug)]
pub struct ImageOptions {
    /// Maximum displayed width in pixels
    pub width: u32,

    /// Maximum displayed height in pixels
    pub height: u32,

    /// Display the image at its own size, ignoring `width` and `height`
    pub original_size: bool,

    /// Also produce a download link for the full-resolution image
    pub download: bool,

    /// Text of the download link
    pub download_text: String,

    /// File name of the download, without extension
    pub download_file_name: String,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            width: 200,
            height: 200,
            original_size: false,
            download: false,
            download_text: "Download Image".to_string(),
            download_file_name: "myimg".to_string(),
        }
    }
}

/// Decode an in-memory file into an image, sniffing the format from its contents.
///
/// # Errors
/// * `ImageRenderError::NotAnImage` if the bytes are not a recognised image format
/// * `ImageRenderError::Image` if the image data is corrupt
pub fn file_to_image(file: DecodedFile) -> Result<LoadedImage, ImageRenderError> {
    let reader = image::io::Reader::new(file)
        .with_guessed_format()
        .map_err(|_| ImageRenderError::NotAnImage)?;
    let format = reader.format().ok_or(ImageRenderError::NotAnImage)?;
    let image = reader.decode()?;

    debug!(
        "decoded {:?} image of {}x{}",
        format,
        image.width(),
        image.height()
    );
    Ok(LoadedImage::new(image, format))
}

/// Decode a data-URI payload straight into an image.
pub fn decode_image(payload: &str) -> Result<LoadedImage, ImageRenderError> {
    file_to_image(codec::decode(payload)?)
}

/// Decode a data-URI payload into an image and the extension its metadata declares.
pub fn decode_image_with_extension(
    payload: &str,
) -> Result<(LoadedImage, Option<String>), ImageRenderError> {
    let (file, extension) = codec::decode_with_extension(payload)?;
    Ok((file_to_image(file)?, extension))
}

/// Render an image as an HTML `<img>` tag, with an optional download link.
///
/// Unless `original_size` is set, the displayed copy is shrunk to fit inside
/// `width` x `height` keeping its aspect ratio; images that already fit are left
/// alone. The download link always carries the full-resolution image.
///
/// # Examples
/// ```
/// use image::{DynamicImage, ImageFormat};
/// use mecsimcalc::images::{ImageOptions, LoadedImage, render_image};
///
/// let image = LoadedImage::new(DynamicImage::new_rgb8(4, 4), ImageFormat::Png);
/// let rendered = render_image(&image, &ImageOptions::default()).unwrap();
/// assert!(rendered.html.starts_with("<img src='data:image/png;base64,"));
/// assert!(rendered.download_link.is_none());
/// ```
pub fn render_image(
    image: &LoadedImage,
    options: &ImageOptions,
) -> Result<RenderedHtml, ImageRenderError> {
    let mime = image.mime_type();

    let (width, height) = image.image.dimensions();
    let shrink = !options.original_size && (width > options.width || height > options.height);

    let (html, full) = if shrink {
        let thumbnail = image.image.thumbnail(options.width, options.height);
        let shown = codec::encode(&mime, &encode_image(&thumbnail, image.format)?);
        (img_tag(&shown, None), None)
    } else {
        let full = codec::encode(&mime, &image.to_bytes()?);
        (img_tag(&full, None), Some(full))
    };

    if !options.download {
        return Ok(RenderedHtml::new(html));
    }

    // Only a shrunk display copy leaves the full-size payload still to encode
    let full = match full {
        Some(full) => full,
        None => codec::encode(&mime, &image.to_bytes()?),
    };
    let file_name = format!("{}.{}", options.download_file_name, image.extension());
    let link = download_anchor(&full, &file_name, &options.download_text);
    Ok(RenderedHtml::with_download(html, link))
}

fn encode_image(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, ImageRenderError> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageOutputFormat::from(format))?;
    Ok(buffer.into_inner())
}
