use async_trait::async_trait;

use common::error::AppError;

/// Seam for turning an uploaded binary into plain text. Production uses the
/// PDF text layer; tests substitute counting fakes.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, bytes: Vec<u8>) -> Result<String, AppError>;
}

/// Extracts the embedded text layer of a PDF. An apparently successful
/// extraction that yields no usable text is a hard failure, never a silent
/// empty document.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    async fn extract_text(&self, bytes: Vec<u8>) -> Result<String, AppError> {
        let extracted = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&bytes).map(|text| text.trim().to_string())
        })
        .await?
        .map_err(|err| AppError::Extraction(format!("Failed to extract text from PDF: {err}")))?;

        if extracted.is_empty() {
            return Err(AppError::Extraction(
                "PDF contained no extractable text".into(),
            ));
        }

        Ok(reflow_text(&extracted))
    }
}

/// Joins hard-wrapped paragraph text while keeping structural lines on their
/// own.
fn reflow_text(input: &str) -> String {
    let mut paragraphs = Vec::new();
    let mut buffer: Vec<String> = Vec::new();

    for line in input.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !buffer.is_empty() {
                paragraphs.push(buffer.join(" "));
                buffer.clear();
            }
            continue;
        }

        if is_structural_line(trimmed) {
            if !buffer.is_empty() {
                paragraphs.push(buffer.join(" "));
                buffer.clear();
            }
            paragraphs.push(trimmed.to_string());
            continue;
        }

        buffer.push(trimmed.to_string());
    }

    if !buffer.is_empty() {
        paragraphs.push(buffer.join(" "));
    }

    paragraphs.join("\n\n")
}

/// Detects a line that should stay on its own rather than be reflowed.
fn is_structural_line(line: &str) -> bool {
    line.starts_with('#')
        || line.starts_with('-')
        || line.starts_with('*')
        || line.starts_with('>')
        || line.starts_with("```")
        || line.starts_with("| ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[tokio::test]
    async fn test_extract_text_rejects_unparseable_bytes() {
        let extractor = PdfTextExtractor;
        let result = extractor.extract_text(b"this is not a pdf".to_vec()).await;
        assert!(matches!(result, Err(AppError::Extraction(_))));
    }

    #[tokio::test]
    async fn test_extract_text_rejects_pdf_without_text() {
        // A structurally valid PDF with zero pages has nothing to extract.
        let mut document = lopdf::Document::with_version("1.5");
        let pages_id = document.add_object(dictionary! {
            "Type" => "Pages",
            "Count" => 0,
            "Kids" => lopdf::Object::Array(vec![]),
        });
        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        document
            .save_to(&mut bytes)
            .expect("Failed to serialize test PDF");

        let extractor = PdfTextExtractor;
        let result = extractor.extract_text(bytes).await;
        assert!(matches!(result, Err(AppError::Extraction(_))));
    }

    #[test]
    fn test_reflow_joins_wrapped_paragraphs() {
        let input = "First part of\na sentence\n\nSecond paragraph";
        let output = reflow_text(input);
        assert!(output.contains("First part of a sentence"));
        assert!(output.contains("Second paragraph"));
    }

    #[test]
    fn test_reflow_preserves_structural_lines() {
        let input = "# Heading\nBody line one\nBody line two\n- bullet\n- another";
        let output = reflow_text(input);
        assert!(output.contains("# Heading"));
        assert!(output.contains("Body line one Body line two"));
        assert!(output.contains("- bullet"));
        assert!(output.contains("- another"));
    }
}
