//! PDF text extraction

use crate::error::{PdfChatError, Result};

/// Extract per-page text from PDF bytes.
///
/// Fails when the bytes are not a valid PDF or when no page yields
/// extractable text (image-only scans, empty documents). Rejecting the
/// zero-page case up front keeps ingestion from silently producing an
/// empty namespace.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<String>> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| PdfChatError::Parse(format!("Failed to extract text from PDF: {}", e)))?;

    if pages.is_empty() {
        return Err(PdfChatError::Parse(
            "PDF contains no pages".to_string(),
        ));
    }

    if pages.iter().all(|p| p.trim().is_empty()) {
        return Err(PdfChatError::Parse(
            "PDF contains no extractable text (may be image-based)".to_string(),
        ));
    }

    Ok(pages)
}

/// Build a well-formed one-page PDF containing `text`, for tests that
/// need to exercise real extraction. `text` must not contain
/// parentheses or backslashes.
#[cfg(test)]
pub(crate) fn minimal_pdf(text: &str) -> Vec<u8> {
    let content = format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", text);
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
            .to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ),
    ];

    let mut pdf = Vec::new();
    pdf.extend_from_slice(b"%PDF-1.4\n");

    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref_offset = pdf.len();
    pdf.extend_from_slice(b"xref\n0 6\n0000000000 65535 f \n");
    for offset in &offsets {
        pdf.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size 6 /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            xref_offset
        )
        .as_bytes(),
    );

    pdf
}
