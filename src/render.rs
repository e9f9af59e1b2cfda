//! Result presentation: links, highlighted labels and de-duplication.
//!
//! Nothing here affects ranking. The engine returns every hit; this layer decides how many
//! to show and which near-duplicates to fold away.

use crate::entry::IndexEntry;
use crate::search::{SearchHit, Tokenizer};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt::Write as _;
use std::ops::Range;

/// Characters left alone in the `?highlight=` value: `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const HIGHLIGHT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Which hits count as duplicates of an earlier, better-ranked one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DedupPolicy {
    /// Show every hit.
    None,
    /// One hit per source file.
    SourceFile,
    /// One hit per name; methods fold by their class prefix.
    #[default]
    Label,
}

/// Presentation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub highlight: bool,
    pub url_root: String,
    pub file_suffix: String,
    pub dedup: DedupPolicy,
    pub max_results: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            highlight: true,
            url_root: String::new(),
            file_suffix: ".html".to_string(),
            dedup: DedupPolicy::default(),
            max_results: 5,
        }
    }
}

/// A run of label text, highlighted or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub highlighted: bool,
}

/// A result ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedResult {
    pub reference: u32,
    pub href: String,
    pub label: Vec<Segment>,
}

impl RenderedResult {
    /// The label without markup.
    pub fn label_text(&self) -> String {
        self.label.iter().map(|s| s.text.as_str()).collect()
    }

    /// An HTML list item with highlighted runs wrapped in `<mark>`.
    pub fn to_html(&self) -> String {
        let mut label = String::new();
        for segment in &self.label {
            if segment.highlighted {
                let _ = write!(
                    label,
                    "<mark>{}</mark>",
                    html_escape::encode_text(&segment.text)
                );
            } else {
                label.push_str(&html_escape::encode_text(&segment.text));
            }
        }
        format!(
            "<li><a href=\"{}\">{}</a></li>",
            html_escape::encode_double_quoted_attribute(&self.href),
            label
        )
    }
}

/// Renders one entry: link target plus (optionally highlighted) display name.
pub fn render_result(
    entry: &IndexEntry,
    matched_terms: &[String],
    tokenizer: &Tokenizer,
    options: &RenderOptions,
) -> RenderedResult {
    let label = if options.highlight {
        highlight(&entry.display_name, matched_terms, tokenizer)
    } else {
        vec![Segment {
            text: entry.display_name.clone(),
            highlighted: false,
        }]
    };

    RenderedResult {
        reference: entry.reference,
        href: build_href(entry, options),
        label,
    }
}

/// Renders ranked hits, folding duplicates and capping the list at `max_results`.
pub fn render_hits(
    hits: &[SearchHit],
    tokenizer: &Tokenizer,
    options: &RenderOptions,
) -> Vec<RenderedResult> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut rendered = vec![];
    for hit in hits {
        if rendered.len() >= options.max_results {
            break;
        }
        if let Some(key) = dedup_key(&hit.entry, options.dedup)
            && !seen.insert(key)
        {
            continue;
        }
        rendered.push(render_result(&hit.entry, &hit.matched_terms, tokenizer, options));
    }
    rendered
}

fn dedup_key(entry: &IndexEntry, policy: DedupPolicy) -> Option<&str> {
    match policy {
        DedupPolicy::None => None,
        DedupPolicy::SourceFile => Some(entry.source_file.as_str()),
        DedupPolicy::Label if entry.object_type == "py:method" => {
            Some(entry.namespace_prefix.as_str())
        }
        DedupPolicy::Label => Some(entry.name.as_str()),
    }
}

/// `url_root + file + suffix [?highlight=name] [#anchor]`
pub fn build_href(entry: &IndexEntry, options: &RenderOptions) -> String {
    let mut href = format!(
        "{}{}{}",
        options.url_root, entry.source_file, options.file_suffix
    );
    if options.highlight && !entry.name.is_empty() {
        href.push_str("?highlight=");
        href.extend(utf8_percent_encode(&entry.name, HIGHLIGHT_ENCODE_SET));
    }
    if entry.has_anchor() {
        href.push('#');
        href.push_str(&entry.anchor_id);
    }
    href
}

/// Splits `text` into runs, marking words whose stem is one of `matched_terms`.
///
/// Words are found with the index tokenizer, so a match on "server" lights up the
/// "Server" half of "HttpServer" and a match on "pars" lights up "parsing".
pub fn highlight(text: &str, matched_terms: &[String], tokenizer: &Tokenizer) -> Vec<Segment> {
    let matched: BTreeSet<&str> = matched_terms.iter().map(String::as_str).collect();
    let mut ranges: Vec<Range<usize>> = tokenizer
        .tokens(text)
        .into_iter()
        .filter(|token| matched.contains(token.term.as_str()))
        .map(|token| token.span)
        .collect();
    ranges.sort_by_key(|r| (r.start, r.end));

    let mut merged: Vec<Range<usize>> = vec![];
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
            _ => merged.push(range),
        }
    }

    let mut segments = vec![];
    let mut cursor = 0;
    for range in merged {
        if range.start > cursor {
            segments.push(Segment {
                text: text[cursor..range.start].to_string(),
                highlighted: false,
            });
        }
        segments.push(Segment {
            text: text[range.clone()].to_string(),
            highlighted: true,
        });
        cursor = range.end;
    }
    if cursor < text.len() || segments.is_empty() {
        segments.push(Segment {
            text: text[cursor..].to_string(),
            highlighted: false,
        });
    }
    segments
}
