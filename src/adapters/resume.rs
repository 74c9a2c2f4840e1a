use crate::domain::model::ResumeText;
use crate::domain::ports::ResumeSource;
use crate::utils::error::ResumeError;
use async_trait::async_trait;
use std::path::Path;

const PDF_EXTENSION: &str = "pdf";

/// Reads text-based PDF resumes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfResumeSource;

impl PdfResumeSource {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ResumeSource for PdfResumeSource {
    async fn parse(&self, path: &str) -> Result<ResumeText, ResumeError> {
        let path = path.trim();
        check_extension(path)?;

        let metadata = tokio::fs::metadata(path).await.map_err(|_| ResumeError::NotFound {
            path: path.to_string(),
        })?;
        if !metadata.is_file() {
            return Err(ResumeError::NotFound {
                path: path.to_string(),
            });
        }

        let data = tokio::fs::read(path).await.map_err(|e| ResumeError::ExtractionError {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        tracing::debug!("Read {} bytes from {}", data.len(), path);

        let pages = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem_by_pages(&data))
            .await
            .map_err(|e| ResumeError::ExtractionError {
                path: path.to_string(),
                message: format!("PDF decoder aborted: {}", e),
            })?
            .map_err(|e| ResumeError::ExtractionError {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        tracing::debug!("Extracted {} pages", pages.len());
        let text = join_pages(&pages);
        if text.trim().is_empty() {
            return Err(ResumeError::ExtractionError {
                path: path.to_string(),
                message: "document contains no extractable text".to_string(),
            });
        }

        tracing::info!("Resume parsed successfully.");
        Ok(ResumeText::new(text))
    }
}

fn check_extension(path: &str) -> Result<(), ResumeError> {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some(PDF_EXTENSION) => Ok(()),
        other => Err(ResumeError::UnsupportedFormat {
            path: path.to_string(),
            extension: other.unwrap_or("(none)").to_string(),
        }),
    }
}

/// One line break between pages, in document order.
fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .map(|page| page.trim())
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, TempDir};

    #[tokio::test]
    async fn test_docx_is_unsupported_without_touching_disk() {
        let result = PdfResumeSource::new().parse("/definitely/not/here/cv.docx").await;
        match result {
            Err(ResumeError::UnsupportedFormat { extension, .. }) => assert_eq!(extension, "docx"),
            other => panic!("expected unsupported format, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_extension_is_unsupported() {
        let result = PdfResumeSource::new().parse("resume").await;
        assert!(matches!(result, Err(ResumeError::UnsupportedFormat { .. })));
    }

    #[tokio::test]
    async fn test_missing_pdf_is_not_found() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.PDF");
        let result = PdfResumeSource::new().parse(path.to_str().unwrap()).await;
        assert!(matches!(result, Err(ResumeError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_directory_path_is_not_found() {
        let dir = Builder::new().suffix(".pdf").tempdir().unwrap();
        let result = PdfResumeSource::new().parse(dir.path().to_str().unwrap()).await;
        assert!(matches!(result, Err(ResumeError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_corrupt_pdf_is_extraction_error() {
        let mut file = Builder::new().suffix(".pdf").tempfile().unwrap();
        file.write_all(b"this is not a pdf document").unwrap();

        let result = PdfResumeSource::new().parse(file.path().to_str().unwrap()).await;
        assert!(matches!(result, Err(ResumeError::ExtractionError { .. })));
    }

    /// Minimal PDF with one Helvetica text line per page.
    fn pdf_with_pages(lines: &[&str]) -> Vec<u8> {
        let page_count = lines.len();
        let kids = (0..page_count)
            .map(|i| format!("{} 0 R", 4 + 2 * i))
            .collect::<Vec<_>>()
            .join(" ");

        let mut objects = vec![
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, page_count),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
                .to_string(),
        ];
        for (i, line) in lines.iter().enumerate() {
            objects.push(format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
                 /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                5 + 2 * i
            ));
            let content = format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", line);
            objects.push(format!(
                "<< /Length {} >>\nstream\n{}\nendstream",
                content.len(),
                content
            ));
        }

        let mut pdf = b"%PDF-1.4\n".to_vec();
        let mut offsets = Vec::new();
        for (i, body) in objects.iter().enumerate() {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
        }

        let xref_start = pdf.len();
        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
        for offset in offsets {
            xref.push_str(&format!("{:010} 00000 n \n", offset));
        }
        xref.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_start
        ));
        pdf.extend_from_slice(xref.as_bytes());
        pdf
    }

    #[tokio::test]
    async fn test_pages_are_separated_by_line_break() {
        let mut file = Builder::new().suffix(".pdf").tempfile().unwrap();
        file.write_all(&pdf_with_pages(&["PageOneEnd", "PageTwoStart"]))
            .unwrap();

        let text = PdfResumeSource::new()
            .parse(file.path().to_str().unwrap())
            .await
            .unwrap();

        assert!(text.contains("PageOneEnd\nPageTwoStart"), "got {:?}", &*text);
        assert!(!text.contains("PageOneEndPageTwoStart"));
    }

    #[test]
    fn test_join_pages() {
        let pages = vec![
            "\n\nPage one  ".to_string(),
            "   ".to_string(),
            "Page two\n".to_string(),
        ];
        assert_eq!(join_pages(&pages), "Page one\nPage two");
        assert_eq!(join_pages(&["Single page".to_string()]), "Single page");
        assert_eq!(join_pages(&[]), "");
    }
}
