//! Field-weighted inverted index over index entries.

use crate::entry::IndexEntry;
use crate::error::CorruptIndexError;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use super::scoring::{bm25, inverse_document_frequency};
use super::tokenize::Tokenizer;

/// Name of the identity field. It joins the index to the back-reference table and is
/// never tokenized or scored.
pub const REFERENCE_FIELD: &str = "reference";

/// Boost of the name field relative to the prefix.
pub const NAME_BOOST: u32 = 10;

/// A scored field and its weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub boost: u32,
}

impl FieldSpec {
    pub fn new(name: &str, boost: u32) -> Self {
        Self {
            name: name.to_string(),
            boost,
        }
    }
}

/// Fields indexed for every entry: the namespace prefix and the (boosted) name.
pub fn default_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new("namespace_prefix", 1),
        FieldSpec::new("name", NAME_BOOST),
    ]
}

/// One term occurrence record, serialized as `[reference, field, frequency]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(u32, u8, u32)", into = "(u32, u8, u32)")]
pub struct Posting {
    pub reference: u32,
    pub field: u8,
    pub frequency: u32,
}

impl From<(u32, u8, u32)> for Posting {
    fn from((reference, field, frequency): (u32, u8, u32)) -> Self {
        Self {
            reference,
            field,
            frequency,
        }
    }
}

impl From<Posting> for (u32, u8, u32) {
    fn from(posting: Posting) -> Self {
        (posting.reference, posting.field, posting.frequency)
    }
}

/// The persisted shape of a [`TextIndex`]. Counts only, no derived floats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TextIndexImage {
    reference_field: String,
    fields: Vec<FieldSpec>,
    /// reference → token count per field
    documents: BTreeMap<u32, Vec<u32>>,
    /// term → postings sorted by (reference, field)
    postings: BTreeMap<String, Vec<Posting>>,
}

/// A searchable inverted index with per-field BM25 scoring.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "TextIndexImage")]
pub struct TextIndex {
    image: TextIndexImage,
    /// Mean token count per field, derived on load.
    average_lengths: Vec<f64>,
}

impl Serialize for TextIndex {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.image.serialize(serializer)
    }
}

impl From<TextIndexImage> for TextIndex {
    fn from(image: TextIndexImage) -> Self {
        let count = image.documents.len().max(1) as f64;
        let average_lengths = (0..image.fields.len())
            .map(|field| {
                let total: u64 = image
                    .documents
                    .values()
                    .map(|lengths| u64::from(lengths.get(field).copied().unwrap_or(0)))
                    .sum();
                total as f64 / count
            })
            .collect();
        Self {
            image,
            average_lengths,
        }
    }
}

/// A term of a parsed query.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum QueryTerm {
    /// A stemmed term that must match exactly.
    Exact(String),
    /// A lowercased prefix matching every indexed term that starts with it (`que*`).
    Prefix(String),
}

/// A document hit with its combined score and the indexed terms that matched it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredReference {
    pub reference: u32,
    pub score: f64,
    pub matched_terms: Vec<String>,
}

impl TextIndex {
    pub fn fields(&self) -> &[FieldSpec] {
        &self.image.fields
    }

    /// Get the number of unique terms in the index
    pub fn term_count(&self) -> usize {
        self.image.postings.len()
    }

    /// Get the number of documents in the index
    pub fn document_count(&self) -> usize {
        self.image.documents.len()
    }

    /// Every reference the index mentions, documents first, then postings.
    pub fn cited_references(&self) -> impl Iterator<Item = u32> + '_ {
        self.image.documents.keys().copied().chain(
            self.image
                .postings
                .values()
                .flat_map(|postings| postings.iter().map(|p| p.reference)),
        )
    }

    /// Checks the index is internally consistent so searching cannot index out of bounds.
    pub fn validate(&self) -> Result<(), CorruptIndexError> {
        let fields = self.image.fields.len();
        if self.image.reference_field != REFERENCE_FIELD {
            return Err(CorruptIndexError::Parse(format!(
                "unexpected reference field '{}'",
                self.image.reference_field
            )));
        }
        if let Some((reference, _)) = self
            .image
            .documents
            .iter()
            .find(|(_, lengths)| lengths.len() != fields)
        {
            return Err(CorruptIndexError::Parse(format!(
                "document {} does not list {} field lengths",
                reference, fields
            )));
        }
        for (term, postings) in &self.image.postings {
            for posting in postings {
                if usize::from(posting.field) >= fields {
                    return Err(CorruptIndexError::Parse(format!(
                        "term '{}' cites unknown field {}",
                        term, posting.field
                    )));
                }
                if !self.image.documents.contains_key(&posting.reference) {
                    return Err(CorruptIndexError::DanglingReference {
                        reference: posting.reference,
                    });
                }
            }
        }
        Ok(())
    }

    /// Indexed terms starting with `prefix`, in lexical order.
    pub fn terms_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.image
            .postings
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .map(|(term, _)| term.as_str())
            .take_while(move |term| term.starts_with(prefix))
    }

    /// Scores every document matching any query term.
    ///
    /// Results are ordered by descending score, ties broken by ascending reference.
    pub fn search(&self, query: &[QueryTerm]) -> Vec<ScoredReference> {
        let mut terms: BTreeSet<&str> = BTreeSet::new();
        for term in query {
            match term {
                QueryTerm::Exact(term) => {
                    if self.image.postings.contains_key(term.as_str()) {
                        terms.insert(term.as_str());
                    }
                }
                QueryTerm::Prefix(prefix) if !prefix.is_empty() => {
                    terms.extend(self.terms_with_prefix(prefix));
                }
                QueryTerm::Prefix(_) => {}
            }
        }

        let total = self.image.documents.len();
        let mut combined: BTreeMap<u32, (f64, Vec<String>)> = BTreeMap::new();

        for term in terms {
            let Some(postings) = self.image.postings.get(term) else {
                continue;
            };
            let mut distinct: Vec<u32> = postings.iter().map(|p| p.reference).collect();
            distinct.dedup();
            let idf = inverse_document_frequency(total, distinct.len());

            for posting in postings {
                let field = usize::from(posting.field);
                let (Some(spec), Some(length)) = (
                    self.image.fields.get(field),
                    self.image
                        .documents
                        .get(&posting.reference)
                        .and_then(|lengths| lengths.get(field)),
                ) else {
                    continue;
                };
                let average = self.average_lengths.get(field).copied().unwrap_or(1.0);
                let score = bm25(posting.frequency, *length, average, idf) * f64::from(spec.boost);

                let slot = combined.entry(posting.reference).or_default();
                slot.0 += score;
                if slot.1.last().is_none_or(|last| last != term) {
                    slot.1.push(term.to_string());
                }
            }
        }

        let mut results: Vec<ScoredReference> = combined
            .into_iter()
            .map(|(reference, (score, matched_terms))| ScoredReference {
                reference,
                score,
                matched_terms,
            })
            .collect();
        results.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.reference.cmp(&b.reference))
        });
        results
    }
}

/// Accumulates documents before producing a [`TextIndex`].
#[derive(Debug)]
pub struct TextIndexBuilder {
    tokenizer: Tokenizer,
    fields: Vec<FieldSpec>,
    documents: BTreeMap<u32, Vec<u32>>,
    postings: AHashMap<String, Vec<Posting>>,
}

impl Default for TextIndexBuilder {
    fn default() -> Self {
        Self::new(default_fields())
    }
}

impl TextIndexBuilder {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self {
            tokenizer: Tokenizer::default(),
            fields,
            documents: BTreeMap::new(),
            postings: AHashMap::new(),
        }
    }

    /// Adds one document; `texts` lines up with the builder's fields.
    pub fn add_document(&mut self, reference: u32, texts: &[&str]) {
        let mut lengths = vec![0; self.fields.len()];

        for (field, text) in texts.iter().enumerate().take(self.fields.len()) {
            let terms = self.tokenizer.terms(text);
            lengths[field] = u32::try_from(terms.len()).unwrap_or(u32::MAX);

            let mut counts: AHashMap<String, u32> = AHashMap::with_capacity(terms.len());
            for term in terms {
                *counts.entry(term).or_insert(0) += 1;
            }
            for (term, frequency) in counts {
                self.postings.entry(term).or_default().push(Posting {
                    reference,
                    field: u8::try_from(field).unwrap_or(u8::MAX),
                    frequency,
                });
            }
        }

        self.documents.insert(reference, lengths);
    }

    /// Adds an entry over the default fields: namespace prefix and name.
    pub fn add_entry(&mut self, entry: &IndexEntry) {
        self.add_document(
            entry.reference,
            &[entry.namespace_prefix.as_str(), entry.name.as_str()],
        );
    }

    /// Sorts postings and freezes the index.
    pub fn finish(self) -> TextIndex {
        let start = std::time::Instant::now();
        let pairs: usize = self.postings.values().map(Vec::len).sum();

        let postings = self
            .postings
            .into_iter()
            .map(|(term, mut postings)| {
                postings.sort_unstable();
                (term, postings)
            })
            .collect();

        let index = TextIndex::from(TextIndexImage {
            reference_field: REFERENCE_FIELD.to_string(),
            fields: self.fields,
            documents: self.documents,
            postings,
        });

        tracing::info!(
            "Built search index: {} unique terms, {} documents, {} term-document pairs in {:?}",
            index.term_count(),
            index.document_count(),
            pairs,
            start.elapsed()
        );

        index
    }
}

/// Builds an index over `entries` with the default fields.
pub fn build_index<'a>(entries: impl IntoIterator<Item = &'a IndexEntry>) -> TextIndex {
    let mut builder = TextIndexBuilder::default();
    for entry in entries {
        builder.add_entry(entry);
    }
    builder.finish()
}
