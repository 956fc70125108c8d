//! crates/docqa_core/src/extract.rs
//!
//! Format-specific text extraction from raw upload buffers. Every path ends in
//! [`PlainText`], so nothing downstream branches on the source format.

use docx_rs::{DocumentChild, ParagraphChild, RunChild};

use crate::error::{QaError, QaResult};
use crate::format::DocumentFormat;
use crate::normalize::PlainText;

/// Extracts and normalizes the text of `buffer` according to `format`.
///
/// Parse failures of PDF and Word files are reported as [`QaError::Extraction`];
/// plain text never fails.
pub fn extract(buffer: &[u8], format: DocumentFormat) -> QaResult<PlainText> {
    let raw = match format {
        DocumentFormat::PlainText => decode_text_lossy(buffer),
        DocumentFormat::Pdf => extract_pdf(buffer)?,
        DocumentFormat::Word => extract_docx(buffer)?,
    };
    Ok(PlainText::from_raw(&raw))
}

/// Decodes UTF-8, silently dropping invalid byte sequences and a leading BOM.
fn decode_text_lossy(buffer: &[u8]) -> String {
    let mut text = String::with_capacity(buffer.len());
    for chunk in buffer.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

/// Page texts in page order, joined by a single space.
fn extract_pdf(buffer: &[u8]) -> QaResult<String> {
    let doc = lopdf::Document::load_mem(buffer)
        .map_err(|e| QaError::Extraction(format!("PDF could not be opened: {e}")))?;

    let page_numbers = doc.get_pages();
    if page_numbers.is_empty() {
        return Err(QaError::Extraction("PDF has no pages".to_string()));
    }

    let pages = page_numbers
        .keys()
        .map(|page_num| {
            doc.extract_text(&[*page_num]).map_err(|e| {
                QaError::Extraction(format!("PDF page {page_num} could not be read: {e}"))
            })
        })
        .collect::<QaResult<Vec<_>>>()?;

    Ok(pages.join(" "))
}

/// Paragraph texts in document order, joined by a single space.
fn extract_docx(buffer: &[u8]) -> QaResult<String> {
    let docx = docx_rs::read_docx(buffer)
        .map_err(|e| QaError::Extraction(format!("Word document could not be opened: {e}")))?;

    let paragraphs: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(p) => Some(paragraph_text(&p.children)),
            _ => None,
        })
        .collect();

    Ok(paragraphs.join(" "))
}

fn paragraph_text(children: &[ParagraphChild]) -> String {
    let mut text = String::new();
    for child in children {
        if let ParagraphChild::Run(run) = child {
            for run_child in &run.children {
                match run_child {
                    RunChild::Text(t) => text.push_str(&t.text),
                    RunChild::Tab(_) => text.push('\t'),
                    RunChild::Break(_) => text.push('\n'),
                    _ => {}
                }
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_rs::{Docx, Paragraph, Run};
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};
    use std::io::Cursor;

    fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
        let mut docx = Docx::new();
        for p in paragraphs {
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*p)));
        }
        let mut buf = Cursor::new(Vec::new());
        docx.build().pack(&mut buf).expect("pack docx");
        buf.into_inner()
    }

    /// One page per entry, each drawing its text with a standard Type1 font.
    fn pdf_bytes(pages: &[&str]) -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().expect("encode content")));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let page_count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).expect("save pdf");
        buf
    }

    #[test]
    fn plain_text_is_decoded_and_normalized() {
        let text = extract(b"Hello   world.\n\n\n\nBye.", DocumentFormat::PlainText).unwrap();
        assert_eq!(text.as_str(), "Hello world.\n\nBye.");
    }

    #[test]
    fn plain_text_drops_invalid_bytes() {
        let bytes = b"caf\xC3\xA9 \xFF\xFEok\xF0\x28";
        let text = extract(bytes, DocumentFormat::PlainText).unwrap();
        assert_eq!(text.as_str(), "café ok(");
    }

    #[test]
    fn plain_text_strips_byte_order_mark() {
        let text = extract("\u{feff}title".as_bytes(), DocumentFormat::PlainText).unwrap();
        assert_eq!(text.as_str(), "title");
    }

    #[test]
    fn plain_text_drops_nul_bytes() {
        let text = extract(b"a\0b", DocumentFormat::PlainText).unwrap();
        assert_eq!(text.as_str(), "ab");
    }

    #[test]
    fn pdf_pages_are_joined_in_page_order() {
        let bytes = pdf_bytes(&["Page one", "Page two", "Three"]);
        let text = extract(&bytes, DocumentFormat::Pdf).unwrap();
        assert_eq!(text.as_str(), "Page one\n Page two\n Three");
    }

    #[test]
    fn pdf_extraction_is_deterministic() {
        let bytes = pdf_bytes(&["Alpha   beta", "Gamma"]);
        let a = extract(&bytes, DocumentFormat::Pdf).unwrap();
        let b = extract(&bytes, DocumentFormat::Pdf).unwrap();
        assert_eq!(a, b);
        assert!(a.as_str().starts_with("Alpha beta"));
    }

    #[test]
    fn word_paragraphs_are_joined_with_spaces() {
        let bytes = docx_bytes(&["First paragraph.", "Second   one.", "Third."]);
        let text = extract(&bytes, DocumentFormat::Word).unwrap();
        assert_eq!(text.as_str(), "First paragraph. Second one. Third.");
    }

    #[test]
    fn extraction_is_deterministic() {
        let bytes = docx_bytes(&["Same", "input"]);
        let a = extract(&bytes, DocumentFormat::Word).unwrap();
        let b = extract(&bytes, DocumentFormat::Word).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn corrupt_pdf_is_an_extraction_error() {
        let err = extract(b"%PDF-1.4 definitely not a pdf", DocumentFormat::Pdf).unwrap_err();
        assert!(matches!(err, QaError::Extraction(_)));
    }

    #[test]
    fn corrupt_word_file_is_an_extraction_error() {
        let err = extract(b"PK\x03\x04 truncated", DocumentFormat::Word).unwrap_err();
        assert!(matches!(err, QaError::Extraction(_)));
    }
}
