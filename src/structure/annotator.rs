//! Image pass: appends a chart item per embedded image.

use crate::backend::ImageSession;
use crate::model::{ContentItem, Document, ImageInfo, SectionContext};

/// Appends chart items to already assembled pages.
///
/// Every chart is tagged with the same context, normally the cursor state
/// left by the end of the text pass.
pub struct ImageAnnotator<'a, S: ImageSession> {
    session: &'a S,
    context: SectionContext,
}

impl<'a, S: ImageSession> ImageAnnotator<'a, S> {
    pub fn new(session: &'a S, context: SectionContext) -> Self {
        Self { session, context }
    }

    /// Append charts to each page of `document`, after its existing items.
    ///
    /// Returns the number of charts added.
    pub fn annotate(&self, document: &mut Document) -> usize {
        let session_pages = self.session.page_count();
        if session_pages as usize > document.pages.len() {
            log::warn!(
                "Image pass sees {} pages but only {} were assembled; extra pages ignored",
                session_pages,
                document.pages.len()
            );
        }

        let mut added = 0;
        for page in document.pages.iter_mut().take(session_pages as usize) {
            let number = page.page_number;
            let images = match self.session.list_images(number) {
                Ok(images) => images,
                Err(e) => {
                    log::warn!("Could not list images on page {}: {}", number, e);
                    continue;
                }
            };

            for (i, image_ref) in images.iter().enumerate() {
                let image = match self.session.extract_image(image_ref) {
                    Ok(image) => image,
                    Err(e) => {
                        log::debug!(
                            "Skipping image {} on page {}: {}",
                            image_ref.name,
                            number,
                            e
                        );
                        continue;
                    }
                };

                let description = format!("Image/Chart {} from page {}", i + 1, number);
                log::debug!(
                    "{} ({}x{} {}, {} bytes)",
                    description,
                    image.width,
                    image.height,
                    image.format,
                    image.data.len()
                );
                page.push(ContentItem::chart(
                    self.context.clone(),
                    description,
                    ImageInfo {
                        width: image.width,
                        height: image.height,
                        byte_size: image.data.len(),
                        format: image.format,
                    },
                ));
                added += 1;
            }
        }

        added
    }
}
