//! Relevance scoring.
//!
//! Scores are BM25 per field, scaled by the field's boost and summed over fields and
//! query terms. Nothing here is persisted: the bundle stores raw counts and scores are
//! derived at query time, which keeps the bundle byte-for-byte reproducible.

/// Term-frequency saturation.
pub(crate) const K1: f64 = 1.2;

/// Field-length normalization strength.
pub(crate) const B: f64 = 0.75;

/// Inverse document frequency, never negative.
pub(crate) fn inverse_document_frequency(total_documents: usize, document_frequency: usize) -> f64 {
    let n = total_documents as f64;
    let df = document_frequency as f64;
    (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
}

/// BM25 contribution of one term in one field of one document.
pub(crate) fn bm25(term_frequency: u32, field_length: u32, average_length: f64, idf: f64) -> f64 {
    let tf = f64::from(term_frequency);
    let length_ratio = if average_length > 0.0 {
        f64::from(field_length) / average_length
    } else {
        1.0
    };
    idf * (tf * (K1 + 1.0)) / K1.mul_add(B.mul_add(length_ratio, 1.0 - B), tf)
}

/// Similarity threshold for "did you mean" suggestions.
pub(crate) const SUGGESTION_THRESHOLD: f64 = 0.8;
