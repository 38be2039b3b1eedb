//! Image XObjects of a page.

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use crate::error::{Error, Result};
use crate::model::PageImage;

/// Collect the image XObjects referenced by a page's resources.
///
/// Images that fail to load are skipped with a warning; a page without
/// resources simply has no images.
pub fn page_images(doc: &LopdfDocument, page_id: ObjectId, page_number: u32) -> Vec<PageImage> {
    let Some(xobjects) = page_xobjects(doc, page_id) else {
        return Vec::new();
    };

    let mut images = Vec::new();
    for (name, obj) in xobjects.iter() {
        let name = String::from_utf8_lossy(name).to_string();
        let Ok(obj_ref) = obj.as_reference() else {
            continue;
        };

        match extract_image(doc, obj_ref) {
            Ok(Some((data, mime_type, width, height))) => images.push(PageImage {
                page_number,
                index: images.len(),
                name,
                data,
                mime_type,
                width,
                height,
            }),
            Ok(None) => {}
            Err(e) => log::warn!("Skipping image {} on page {}: {}", name, page_number, e),
        }
    }

    log::debug!("Page {}: {} images", page_number, images.len());
    images
}

fn page_xobjects(doc: &LopdfDocument, page_id: ObjectId) -> Option<&Dictionary> {
    let page = doc.get_dictionary(page_id).ok()?;
    let resources = resolve_dict(doc, page.get(b"Resources").ok()?)?;
    resolve_dict(doc, resources.get(b"XObject").ok()?)
}

fn resolve_dict<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Reference(r) => doc.get_dictionary(*r).ok(),
        Object::Dictionary(d) => Some(d),
        _ => None,
    }
}

type ImageParts = (Vec<u8>, String, Option<u32>, Option<u32>);

/// Load one XObject; `Ok(None)` for form XObjects and other non-images.
fn extract_image(doc: &LopdfDocument, obj_ref: ObjectId) -> Result<Option<ImageParts>> {
    let stream = match doc.get_object(obj_ref) {
        Ok(Object::Stream(stream)) => stream,
        Ok(_) => return Err(Error::ImageExtract("Invalid XObject".to_string())),
        Err(e) => return Err(Error::ImageExtract(e.to_string())),
    };

    let dict = &stream.dict;
    let is_image = dict
        .get(b"Subtype")
        .and_then(|s| s.as_name_str())
        .map(|s| s == "Image")
        .unwrap_or(false);
    if !is_image {
        return Ok(None);
    }

    let dimension = |key: &[u8]| {
        dict.get(key)
            .ok()
            .and_then(|v| v.as_i64().ok())
            .and_then(|v| u32::try_from(v).ok())
    };
    let width = dimension(b"Width");
    let height = dimension(b"Height");

    let (data, mime_type) = encode_stream(doc, stream, width, height);
    Ok(Some((data, mime_type.to_string(), width, height)))
}

/// Bytes and MIME type of an image stream, keyed on its last filter.
///
/// Raw 8-bit gray or RGB samples are re-encoded as PNG; anything else that
/// is not already JPEG or JPEG 2000 stays `application/octet-stream`.
fn encode_stream(
    doc: &LopdfDocument,
    stream: &Stream,
    width: Option<u32>,
    height: Option<u32>,
) -> (Vec<u8>, &'static str) {
    match last_filter(&stream.dict).as_deref() {
        Some("DCTDecode") => (stream.content.clone(), "image/jpeg"),
        Some("JPXDecode") => (stream.content.clone(), "image/jp2"),
        Some("FlateDecode") | Some("LZWDecode") | None => {
            let decoded = stream
                .decompressed_content()
                .unwrap_or_else(|_| stream.content.clone());

            let layout = match (width, height, sample_components(doc, &stream.dict)) {
                (Some(w), Some(h), Some(c)) => Some((w, h, c)),
                _ => None,
            };
            match layout.map(|(w, h, c)| encode_png(w, h, c, &decoded)) {
                Some(Ok(png)) => (png, "image/png"),
                Some(Err(e)) => {
                    log::warn!("Keeping raw samples: {}", e);
                    (decoded, "application/octet-stream")
                }
                None => (decoded, "application/octet-stream"),
            }
        }
        Some(_) => (stream.content.clone(), "application/octet-stream"),
    }
}

/// Components per pixel for 8-bit gray and RGB images; `None` for anything
/// else (indexed, CMYK, masks, other bit depths).
fn sample_components(doc: &LopdfDocument, dict: &Dictionary) -> Option<u8> {
    let bits = dict.get(b"BitsPerComponent").ok()?.as_i64().ok()?;
    let is_mask = dict
        .get(b"ImageMask")
        .and_then(|m| m.as_bool())
        .unwrap_or(false);
    if bits != 8 || is_mask {
        return None;
    }
    color_space_components(doc, dict.get(b"ColorSpace").ok()?)
}

fn color_space_components(doc: &LopdfDocument, space: &Object) -> Option<u8> {
    match space {
        Object::Reference(id) => color_space_components(doc, doc.get_object(*id).ok()?),
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" | b"G" => Some(1),
            b"DeviceRGB" | b"CalRGB" | b"RGB" => Some(3),
            _ => None,
        },
        Object::Array(items) => match items.first()?.as_name().ok()? {
            b"CalGray" => Some(1),
            b"CalRGB" => Some(3),
            b"ICCBased" => {
                let profile = match items.get(1)? {
                    Object::Reference(id) => doc.get_object(*id).ok()?,
                    other => other,
                };
                let Object::Stream(profile) = profile else {
                    return None;
                };
                match profile.dict.get(b"N").ok()?.as_i64().ok()? {
                    1 => Some(1),
                    3 => Some(3),
                    _ => None,
                }
            }
            _ => None,
        },
        _ => None,
    }
}

/// Encode raw 8-bit samples as PNG.
fn encode_png(width: u32, height: u32, components: u8, samples: &[u8]) -> Result<Vec<u8>> {
    use image::{GrayImage, ImageFormat, RgbImage};

    let needed = width as usize * height as usize * components as usize;
    if samples.len() < needed {
        return Err(Error::ImageExtract(format!(
            "{} sample bytes for a {}x{} image",
            samples.len(),
            width,
            height
        )));
    }
    let samples = samples[..needed].to_vec();

    let mut output = std::io::Cursor::new(Vec::new());
    let written = if components == 1 {
        GrayImage::from_raw(width, height, samples)
            .map(|img| img.write_to(&mut output, ImageFormat::Png))
    } else {
        RgbImage::from_raw(width, height, samples)
            .map(|img| img.write_to(&mut output, ImageFormat::Png))
    };

    match written {
        Some(Ok(())) => Ok(output.into_inner()),
        Some(Err(e)) => Err(Error::ImageExtract(format!("PNG encoding failed: {}", e))),
        None => Err(Error::ImageExtract("Failed to create image buffer".to_string())),
    }
}

// `/Filter` is a name or an array applied in order; the last one decides the format.
fn last_filter(dict: &Dictionary) -> Option<String> {
    match dict.get(b"Filter").ok()? {
        Object::Name(n) => Some(String::from_utf8_lossy(n).to_string()),
        Object::Array(filters) => filters
            .last()
            .and_then(|f| f.as_name_str().ok())
            .map(String::from),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn doc_with_xobjects() -> (LopdfDocument, ObjectId) {
        let mut doc = LopdfDocument::with_version("1.5");
        let jpeg = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 4,
                "Height" => 2,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            vec![0xFF, 0xD8, 0xFF, 0xE0],
        ));
        let form = doc.add_object(Stream::new(
            dictionary! { "Type" => "XObject", "Subtype" => "Form" },
            b"0 0 m".to_vec(),
        ));
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => jpeg, "Fm0" => form },
            },
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        (doc, page_id)
    }

    #[test]
    fn test_collects_only_images() {
        let (doc, page_id) = doc_with_xobjects();
        let images = page_images(&doc, page_id, 1);

        assert_eq!(images.len(), 1);
        let image = &images[0];
        assert_eq!(image.name, "Im0");
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.width, Some(4));
        assert_eq!(image.height, Some(2));
        assert_eq!(image.data, vec![0xFF, 0xD8, 0xFF, 0xE0]);
        assert_eq!(image.suggested_filename(), "page1_img0.jpg");
    }

    #[test]
    fn test_raw_rgb_becomes_png() {
        let mut doc = LopdfDocument::with_version("1.5");
        let stream = Stream::new(
            dictionary! {
                "Subtype" => "Image",
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            },
            vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255],
        );
        let (data, mime) = encode_stream(&doc, &stream, Some(2), Some(2));
        assert_eq!(mime, "image/png");
        assert!(data.starts_with(b"\x89PNG\r\n\x1a\n"));

        let decoded = image::load_from_memory(&data).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (2, 2));
        assert_eq!(decoded.get_pixel(1, 0).0, [0, 255, 0]);

        // ICC-based gray through an indirect profile.
        let profile = doc.add_object(Stream::new(dictionary! { "N" => 1 }, vec![]));
        let gray = Stream::new(
            dictionary! {
                "Subtype" => "Image",
                "ColorSpace" => vec![Object::Name(b"ICCBased".to_vec()), profile.into()],
                "BitsPerComponent" => 8,
            },
            vec![0, 128, 255],
        );
        let (_, mime) = encode_stream(&doc, &gray, Some(3), Some(1));
        assert_eq!(mime, "image/png");
    }

    #[test]
    fn test_unsupported_samples_stay_raw() {
        let doc = LopdfDocument::with_version("1.5");
        let cmyk = Stream::new(
            dictionary! {
                "Subtype" => "Image",
                "ColorSpace" => "DeviceCMYK",
                "BitsPerComponent" => 8,
            },
            vec![0; 4],
        );
        assert_eq!(encode_stream(&doc, &cmyk, Some(1), Some(1)).1, "application/octet-stream");

        let short = Stream::new(
            dictionary! {
                "Subtype" => "Image",
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            vec![0; 3],
        );
        let (data, mime) = encode_stream(&doc, &short, Some(2), Some(2));
        assert_eq!(mime, "application/octet-stream");
        assert_eq!(data, vec![0; 3]);

        let one_bit = Stream::new(
            dictionary! {
                "Subtype" => "Image",
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 1,
            },
            vec![0xAA],
        );
        assert_eq!(encode_stream(&doc, &one_bit, Some(8), Some(1)).1, "application/octet-stream");
    }

    #[test]
    fn test_filter_chain_uses_last_filter() {
        let dict = dictionary! {
            "Filter" => vec![Object::Name(b"FlateDecode".to_vec()), Object::Name(b"DCTDecode".to_vec())],
        };
        assert_eq!(last_filter(&dict).as_deref(), Some("DCTDecode"));
        assert_eq!(last_filter(&dictionary! {}), None);
    }
}
