use crate::error::{AssistError, Result};

/// Turns an uploaded document into plain text.
pub trait TextExtractor: Send + Sync {
    /// Text of every page, concatenated in page order.
    fn extract_text(&self, bytes: &[u8]) -> Result<String>;
}

/// PDF text extractor backed by the pdf-extract crate.
/// Only reads embedded text layers; scanned pages come back empty.
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<String>> {
        if bytes.is_empty() {
            return Err(AssistError::Document("empty upload".to_string()));
        }

        pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(|e| AssistError::Document(e.to_string()))
    }
}

impl TextExtractor for PdfTextExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        let pages = self.extract_pages(bytes)?;
        Ok(pages.concat())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a minimal PDF with one text line per page.
    fn make_test_pdf(pages: &[&str]) -> Vec<u8> {
        use lopdf::dictionary;
        use lopdf::{Document, Object, Stream};

        let mut doc = Document::with_version("1.4");

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut page_ids = Vec::new();
        for text in pages {
            let content = format!("BT /F1 12 Tf 100 700 Td ({text}) Tj ET");
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            page_ids.push(page_id);
        }

        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| Object::from(*id)).collect::<Vec<_>>(),
            "Count" => page_ids.len() as i64,
        });

        for page_id in &page_ids {
            if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(*page_id) {
                dict.set("Parent", pages_id);
            }
        }

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn extracts_text_from_digital_pdf() {
        let pdf = make_test_pdf(&["Pulse 72"]);
        let text = PdfTextExtractor.extract_text(&pdf).unwrap();
        assert!(text.contains("Pulse"), "unexpected text: {text}");
    }

    #[test]
    fn pages_are_concatenated_in_order() {
        let pdf = make_test_pdf(&["Alpha", "Omega"]);
        let pages = PdfTextExtractor.extract_pages(&pdf).unwrap();
        assert_eq!(pages.len(), 2);

        let text = PdfTextExtractor.extract_text(&pdf).unwrap();
        let alpha = text.find("Alpha").expect("first page text");
        let omega = text.find("Omega").expect("second page text");
        assert!(alpha < omega);
    }

    #[test]
    fn garbage_bytes_are_a_document_error() {
        let result = PdfTextExtractor.extract_text(b"this is not a pdf");
        assert!(matches!(result, Err(AssistError::Document(_))));
    }

    #[test]
    fn empty_upload_is_a_document_error() {
        let result = PdfTextExtractor.extract_text(&[]);
        assert!(matches!(result, Err(AssistError::Document(_))));
    }
}
