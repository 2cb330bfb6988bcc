//! Embedded image listing and payload extraction.

use std::collections::HashSet;
use std::path::Path;

use image::{ExtendedColorType, ImageEncoder};
use lopdf::{Dictionary, Document as LopdfDocument, Object, Stream};

use crate::error::{Error, Result};

use super::lopdf_backend::{inherited_attribute, load_document, page_id, resolve};
use super::{ExtractedImage, ImageRef, ImageSession};

/// Image session over an independently loaded document.
pub struct LopdfImageSession {
    doc: LopdfDocument,
}

impl LopdfImageSession {
    /// Load the document at `path` for the image pass.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            doc: load_document(path)?,
        })
    }

    /// Wrap an already loaded document.
    pub fn from_document(doc: LopdfDocument) -> Self {
        Self { doc }
    }

    fn xobjects(&self, page: u32) -> Result<Option<&Dictionary>> {
        let page_id = page_id(&self.doc, page)?;

        let resources = match inherited_attribute(&self.doc, page_id, b"Resources") {
            Some(obj) => resolve(&self.doc, obj),
            None => return Ok(None),
        };
        let resources = resources
            .as_dict()
            .map_err(|e| Error::ImageExtract(format!("page {} resources: {}", page, e)))?;

        match resources.get(b"XObject") {
            Ok(obj) => resolve(&self.doc, obj)
                .as_dict()
                .map(Some)
                .map_err(|e| Error::ImageExtract(format!("page {} XObject: {}", page, e))),
            Err(_) => Ok(None),
        }
    }
}

impl ImageSession for LopdfImageSession {
    fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    fn list_images(&self, page: u32) -> Result<Vec<ImageRef>> {
        let Some(xobjects) = self.xobjects(page)? else {
            return Ok(Vec::new());
        };

        let mut seen = HashSet::new();
        let mut images = Vec::new();
        for (name, obj) in xobjects.iter() {
            let Ok(object_id) = obj.as_reference() else {
                continue;
            };
            let is_image = matches!(
                self.doc.get_object(object_id),
                Ok(Object::Stream(s)) if subtype(&s.dict) == Some("Image")
            );
            if is_image && seen.insert(object_id) {
                images.push(ImageRef {
                    object_id,
                    name: String::from_utf8_lossy(name).to_string(),
                });
            }
        }

        Ok(images)
    }

    fn extract_image(&self, image: &ImageRef) -> Result<ExtractedImage> {
        let stream = match self.doc.get_object(image.object_id)? {
            Object::Stream(s) => s,
            _ => {
                return Err(Error::ImageExtract(format!(
                    "{} is not a stream",
                    image.name
                )))
            }
        };

        let width = dimension(&stream.dict, b"Width")?;
        let height = dimension(&stream.dict, b"Height")?;
        let filters = filter_names(&stream.dict);

        let (format, data) = match filters.last().map(String::as_str) {
            Some("DCTDecode") => ("jpeg", passthrough(stream, &filters)?),
            Some("JPXDecode") => ("jpx", passthrough(stream, &filters)?),
            Some("JBIG2Decode") => ("jb2", passthrough(stream, &filters)?),
            Some("CCITTFaxDecode") | Some("RunLengthDecode") => {
                return Err(Error::ImageExtract(format!(
                    "{}: unsupported filter {}",
                    image.name,
                    filters.join(",")
                )))
            }
            _ => ("png", self.encode_png(stream, &filters, width, height)?),
        };

        Ok(ExtractedImage {
            data,
            width,
            height,
            format: format.to_string(),
        })
    }
}

impl LopdfImageSession {
    /// Decode a raw sample stream and re-encode it as PNG.
    fn encode_png(
        &self,
        stream: &Stream,
        filters: &[String],
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>> {
        let bits = stream
            .dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|b| b.as_i64().ok())
            .unwrap_or(8);
        if bits != 8 {
            return Err(Error::ImageExtract(format!(
                "{} bits per component not supported",
                bits
            )));
        }

        let samples = if filters.is_empty() {
            stream.content.clone()
        } else {
            stream
                .decompressed_content()
                .map_err(|e| Error::ImageExtract(e.to_string()))?
        };

        let color = self.color_model(&stream.dict)?;
        let needed = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(color.components()))
            .ok_or_else(|| Error::ImageExtract("image dimensions overflow".to_string()))?;
        if samples.len() < needed {
            return Err(Error::ImageExtract(format!(
                "sample data too short ({} < {})",
                samples.len(),
                needed
            )));
        }
        let samples = &samples[..needed];

        let (buf, color_type) = match color {
            ColorModel::Gray => (samples.to_vec(), ExtendedColorType::L8),
            ColorModel::Rgb => (samples.to_vec(), ExtendedColorType::Rgb8),
            ColorModel::Cmyk => (cmyk_to_rgb(samples), ExtendedColorType::Rgb8),
        };

        let mut png = Vec::new();
        image::codecs::png::PngEncoder::new(&mut png).write_image(&buf, width, height, color_type)?;
        Ok(png)
    }

    fn color_model(&self, dict: &Dictionary) -> Result<ColorModel> {
        let cs = dict
            .get(b"ColorSpace")
            .map(|obj| resolve(&self.doc, obj))
            .map_err(|_| Error::ImageExtract("missing ColorSpace".to_string()))?;

        let name = match cs {
            Object::Name(n) => String::from_utf8_lossy(n).to_string(),
            Object::Array(arr) => arr
                .first()
                .and_then(|o| o.as_name_str().ok())
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        };

        match name.as_str() {
            "DeviceGray" | "CalGray" => Ok(ColorModel::Gray),
            "DeviceRGB" | "CalRGB" => Ok(ColorModel::Rgb),
            "DeviceCMYK" => Ok(ColorModel::Cmyk),
            "ICCBased" => {
                let components = cs
                    .as_array()
                    .ok()
                    .and_then(|arr| arr.get(1))
                    .map(|profile| resolve(&self.doc, profile))
                    .and_then(|profile| match profile {
                        Object::Stream(s) => s.dict.get(b"N").ok().and_then(|n| n.as_i64().ok()),
                        _ => None,
                    });
                match components {
                    Some(1) => Ok(ColorModel::Gray),
                    Some(3) => Ok(ColorModel::Rgb),
                    Some(4) => Ok(ColorModel::Cmyk),
                    other => Err(Error::ImageExtract(format!(
                        "ICCBased with {:?} components not supported",
                        other
                    ))),
                }
            }
            other => Err(Error::ImageExtract(format!(
                "color space {} not supported",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorModel {
    Gray,
    Rgb,
    Cmyk,
}

impl ColorModel {
    fn components(self) -> usize {
        match self {
            ColorModel::Gray => 1,
            ColorModel::Rgb => 3,
            ColorModel::Cmyk => 4,
        }
    }
}

/// Encoded image bytes, returned as stored. Only a single filter is accepted.
fn passthrough(stream: &Stream, filters: &[String]) -> Result<Vec<u8>> {
    if filters.len() > 1 {
        return Err(Error::ImageExtract(format!(
            "unsupported filter chain {}",
            filters.join(",")
        )));
    }
    Ok(stream.content.clone())
}

fn subtype(dict: &Dictionary) -> Option<&str> {
    dict.get(b"Subtype").ok().and_then(|s| s.as_name_str().ok())
}

fn filter_names(dict: &Dictionary) -> Vec<String> {
    match dict.get(b"Filter") {
        Ok(Object::Name(n)) => vec![String::from_utf8_lossy(n).to_string()],
        Ok(Object::Array(arr)) => arr
            .iter()
            .filter_map(|o| o.as_name_str().ok())
            .map(String::from)
            .collect(),
        _ => Vec::new(),
    }
}

fn dimension(dict: &Dictionary, key: &[u8]) -> Result<u32> {
    dict.get(key)
        .ok()
        .and_then(|v| v.as_i64().ok())
        .and_then(|v| u32::try_from(v).ok())
        .filter(|v| *v > 0)
        .ok_or_else(|| {
            Error::ImageExtract(format!(
                "missing or invalid {}",
                String::from_utf8_lossy(key)
            ))
        })
}

fn cmyk_to_rgb(samples: &[u8]) -> Vec<u8> {
    samples
        .chunks_exact(4)
        .flat_map(|px| {
            let k = 255 - px[3] as u16;
            let channel = |c: u8| ((255 - c as u16) * k / 255) as u8;
            [channel(px[0]), channel(px[1]), channel(px[2])]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn session_with_image(image: Stream) -> (LopdfImageSession, ImageRef) {
        let mut doc = LopdfDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        let image_id = doc.add_object(image);
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => dictionary! {
                    "XObject" => dictionary! {
                        "Im1" => image_id,
                        "Im2" => image_id,
                    },
                },
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let session = LopdfImageSession::from_document(doc);
        let image_ref = ImageRef {
            object_id: image_id,
            name: "Im1".to_string(),
        };
        (session, image_ref)
    }

    #[test]
    fn test_list_images_inherits_resources_and_dedups() {
        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 1,
                "Height" => 1,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            vec![0x80],
        );
        let (session, expected) = session_with_image(image);

        let images = session.list_images(1).unwrap();
        assert_eq!(images, vec![expected]);
    }

    #[test]
    fn test_extract_dct_passthrough() {
        let jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 640,
                "Height" => 480,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg.clone(),
        );
        let (session, image_ref) = session_with_image(image);

        let extracted = session.extract_image(&image_ref).unwrap();
        assert_eq!(extracted.format, "jpeg");
        assert_eq!(extracted.data, jpeg);
        assert_eq!((extracted.width, extracted.height), (640, 480));
    }

    #[test]
    fn test_extract_raw_rgb_as_png() {
        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 2,
                "Height" => 1,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            vec![255, 0, 0, 0, 0, 255],
        );
        let (session, image_ref) = session_with_image(image);

        let extracted = session.extract_image(&image_ref).unwrap();
        assert_eq!(extracted.format, "png");
        assert!(extracted.data.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn test_extract_rejects_short_samples() {
        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 4,
                "Height" => 4,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            vec![0; 5],
        );
        let (session, image_ref) = session_with_image(image);

        assert!(matches!(
            session.extract_image(&image_ref),
            Err(Error::ImageExtract(_))
        ));
    }

    #[test]
    fn test_extract_rejects_overflowing_dimensions() {
        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => u32::MAX as i64,
                "Height" => u32::MAX as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            vec![0; 12],
        );
        let (session, image_ref) = session_with_image(image);

        assert!(matches!(
            session.extract_image(&image_ref),
            Err(Error::ImageExtract(msg)) if msg.contains("overflow")
        ));
    }

    #[test]
    fn test_cmyk_to_rgb() {
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 0]), vec![255, 255, 255]);
        assert_eq!(cmyk_to_rgb(&[0, 0, 0, 255]), vec![0, 0, 0]);
        assert_eq!(cmyk_to_rgb(&[255, 0, 0, 0]), vec![0, 255, 255]);
    }
}
