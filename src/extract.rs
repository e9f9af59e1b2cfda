//! Turns the generator's object, title and term tables into index entries.

use crate::entry::{EntryDraft, EntryKind};
use crate::error::{MalformedEntryWarning, MalformedReason};
use crate::source::{GeneratorIndex, TermTable};

/// Scope separator used by C++ symbol names.
const CPP_SCOPE: &str = "::";

/// Object type whose display name is qualified by its class only.
const PY_METHOD: &str = "py:method";

/// Knobs for extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Also emit one entry per (in-document term, document) pair.
    ///
    /// Off by default: it grows the index by an order of magnitude.
    pub include_terms: bool,
}

/// Entries in extraction order plus the rows that had to be skipped.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub drafts: Vec<EntryDraft>,
    pub warnings: Vec<MalformedEntryWarning>,
}

/// Walks a [`GeneratorIndex`] and produces normalized entries.
pub struct EntryExtractor<'a> {
    source: &'a GeneratorIndex,
    options: ExtractOptions,
    out: Extraction,
}

impl<'a> EntryExtractor<'a> {
    pub fn new(source: &'a GeneratorIndex, options: ExtractOptions) -> Self {
        Self {
            source,
            options,
            out: Extraction::default(),
        }
    }

    /// Runs every enabled phase: objects, then titles, then (optionally) terms.
    pub fn extract(mut self) -> Extraction {
        let source = self.source;
        self.extract_objects();
        self.extract_term_table(&source.titleterms, EntryKind::Title);
        if self.options.include_terms {
            self.extract_term_table(&source.terms, EntryKind::Term);
        }

        tracing::debug!(
            "Extracted {} entries ({} skipped)",
            self.out.drafts.len(),
            self.out.warnings.len()
        );
        self.out
    }

    fn extract_objects(&mut self) {
        let source = self.source;
        let documents = source.document_names();

        for (prefix, items) in &source.objects {
            for (name, record) in items {
                let Some(object_type) = source.objtypes.get(&record.object_type) else {
                    self.skip(
                        prefix,
                        name,
                        "",
                        MalformedReason::UnknownObjectType(record.object_type),
                    );
                    continue;
                };
                let Some(source_file) = documents.get(record.document) else {
                    self.skip(
                        prefix,
                        name,
                        object_type,
                        MalformedReason::UnknownDocument(record.document),
                    );
                    continue;
                };

                match classify_object(prefix, name, object_type) {
                    Ok(symbol) => self.out.drafts.push(EntryDraft {
                        source_file: source_file.clone(),
                        kind: if object_type.is_empty() {
                            EntryKind::None
                        } else {
                            EntryKind::ApiSymbol
                        },
                        object_type: object_type.clone(),
                        namespace_prefix: symbol.prefix,
                        short_prefix: symbol.short_prefix,
                        name: symbol.name,
                        display_name: symbol.display_name,
                        anchor_id: record.anchor.clone(),
                    }),
                    Err(reason) => self.skip(prefix, name, object_type, reason),
                }
            }
        }
    }

    /// Title and term tables share a shape: term → documents, rendered as the document title.
    fn extract_term_table(&mut self, table: &TermTable, kind: EntryKind) {
        let source = self.source;
        let documents = source.document_names();

        for (term, indices) in table {
            for index in indices.iter() {
                let Some(source_file) = documents.get(index) else {
                    self.skip(term, "", "", MalformedReason::UnknownDocument(index));
                    continue;
                };
                let Some(title) = source.titles.get(index).filter(|t| !t.is_empty()) else {
                    self.skip(term, "", "", MalformedReason::MissingTitle(index));
                    continue;
                };

                self.out.drafts.push(EntryDraft {
                    source_file: source_file.clone(),
                    kind,
                    object_type: String::new(),
                    namespace_prefix: term.clone(),
                    short_prefix: String::new(),
                    name: title.clone(),
                    display_name: title.clone(),
                    anchor_id: String::new(),
                });
            }
        }
    }

    fn skip(&mut self, prefix: &str, name: &str, object_type: &str, reason: MalformedReason) {
        let warning = MalformedEntryWarning {
            prefix: prefix.to_string(),
            name: name.to_string(),
            object_type: object_type.to_string(),
            reason,
        };
        tracing::warn!("{}", warning);
        self.out.warnings.push(warning);
    }
}

/// Naming of one API symbol after domain-specific rewriting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolName {
    pub prefix: String,
    pub short_prefix: String,
    pub name: String,
    pub display_name: String,
}

/// Splits and labels an object-table row according to its domain.
///
/// - `cpp:*` names carry their own scope (`A::B::method`); the table prefix is replaced.
/// - `py:*` names are shown qualified, methods by class only.
/// - everything else keeps its name as the label.
pub fn classify_object(
    prefix: &str,
    name: &str,
    object_type: &str,
) -> Result<SymbolName, MalformedReason> {
    if object_type.starts_with("cpp:") {
        let (scope, bare) = name
            .rsplit_once(CPP_SCOPE)
            .ok_or(MalformedReason::MissingScope)?;
        return Ok(SymbolName {
            prefix: scope.to_string(),
            short_prefix: last_segment(scope, CPP_SCOPE).to_string(),
            name: bare.to_string(),
            display_name: bare.to_string(),
        });
    }

    let short_prefix = last_segment(prefix, ".");
    let display_name = if object_type.starts_with("py:") {
        if object_type == PY_METHOD {
            qualify(short_prefix, name)
        } else {
            qualify(prefix, name)
        }
    } else {
        name.to_string()
    };

    Ok(SymbolName {
        prefix: prefix.to_string(),
        short_prefix: short_prefix.to_string(),
        name: name.to_string(),
        display_name,
    })
}

fn last_segment<'s>(path: &'s str, separator: &str) -> &'s str {
    path.rsplit(separator).next().unwrap_or(path)
}

/// `scope.name`, or just `name` for module-level objects without a scope.
fn qualify(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", scope, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};
    use rstest::rstest;

    #[test]
    fn cpp_names_are_split_on_last_scope() {
        let_assert!(Ok(symbol) = classify_object("ignored", "A::B::method", "cpp:function"));
        check!(symbol.prefix == "A::B");
        check!(symbol.name == "method");
        check!(symbol.short_prefix == "B");
        check!(symbol.display_name == "method");
    }

    #[test]
    fn cpp_name_without_scope_is_malformed() {
        check!(
            classify_object("", "lonelyname", "cpp:class") == Err(MalformedReason::MissingScope)
        );
    }

    #[rstest]
    #[case("pkg.Class", "foo", "py:method", "Class", "Class.foo")]
    #[case("pkg.Class", "bar", "py:attribute", "Class", "pkg.Class.bar")]
    #[case("pkg", "run", "py:function", "pkg", "pkg.run")]
    #[case("", "pkg", "py:module", "", "pkg")]
    #[case("std", "label", "std:label", "std", "label")]
    fn display_names_follow_domain(
        #[case] prefix: &str,
        #[case] name: &str,
        #[case] object_type: &str,
        #[case] short_prefix: &str,
        #[case] display_name: &str,
    ) {
        let_assert!(Ok(symbol) = classify_object(prefix, name, object_type));
        check!(symbol.short_prefix == short_prefix);
        check!(symbol.display_name == display_name);
        check!(symbol.prefix == prefix);
    }

    fn sample() -> GeneratorIndex {
        let mut index = GeneratorIndex::with_documents(
            vec!["index".into(), "api".into()],
            vec!["Welcome".into(), "API Reference".into()],
        );
        index.add_object("pkg.Class", "foo", 1, "py:method", "pkg.Class.foo");
        index.add_object("", "lonelyname", 1, "cpp:class", "");
        index.add_object("", "A::B::method", 1, "cpp:function", "_CPPv4N1A1B6methodEv");
        index.titleterms.insert("api".into(), vec![1].into());
        index.titleterms.insert("welcom".into(), vec![0, 1].into());
        index.terms.insert("install".into(), vec![0].into());
        index
    }

    #[test]
    fn objects_come_before_titles() {
        let extraction = EntryExtractor::new(&sample(), ExtractOptions::default()).extract();
        let kinds: Vec<_> = extraction.drafts.iter().map(|d| d.kind).collect();
        check!(
            kinds
                == vec![
                    EntryKind::ApiSymbol,
                    EntryKind::ApiSymbol,
                    EntryKind::Title,
                    EntryKind::Title,
                    EntryKind::Title
                ]
        );
    }

    #[test]
    fn malformed_cpp_entry_is_skipped_with_warning() {
        let extraction = EntryExtractor::new(&sample(), ExtractOptions::default()).extract();

        check!(extraction.warnings.len() == 1);
        let warning = &extraction.warnings[0];
        check!(warning.name == "lonelyname");
        check!(warning.object_type == "cpp:class");
        check!(warning.reason == MalformedReason::MissingScope);
        check!(!extraction.drafts.iter().any(|d| d.name == "lonelyname"));
    }

    #[test]
    fn title_entries_are_one_per_document() {
        let extraction = EntryExtractor::new(&sample(), ExtractOptions::default()).extract();
        let titles: Vec<_> = extraction
            .drafts
            .iter()
            .filter(|d| d.kind == EntryKind::Title)
            .map(|d| (d.namespace_prefix.as_str(), d.source_file.as_str(), d.name.as_str()))
            .collect();

        check!(
            titles
                == vec![
                    ("api", "api", "API Reference"),
                    ("welcom", "index", "Welcome"),
                    ("welcom", "api", "API Reference"),
                ]
        );
        for draft in extraction.drafts.iter().filter(|d| d.kind == EntryKind::Title) {
            check!(draft.short_prefix.is_empty());
            check!(draft.anchor_id.is_empty());
            check!(draft.display_name == draft.name);
        }
    }

    #[test]
    fn term_entries_are_opt_in() {
        let default = EntryExtractor::new(&sample(), ExtractOptions::default()).extract();
        check!(!default.drafts.iter().any(|d| d.kind == EntryKind::Term));

        let options = ExtractOptions {
            include_terms: true,
        };
        let with_terms = EntryExtractor::new(&sample(), options).extract();
        let_assert!(Some(last) = with_terms.drafts.last());
        check!(last.kind == EntryKind::Term);
        check!(last.namespace_prefix == "install");
        check!(last.name == "Welcome");
    }

    #[test]
    fn documents_without_titles_are_skipped() {
        let mut index = GeneratorIndex::with_documents(
            vec!["index".into(), "api".into(), "blank".into()],
            vec!["Welcome".into(), "API Reference".into(), String::new()],
        );
        index.titleterms.insert("api".into(), vec![1, 2, 3].into());

        let extraction = EntryExtractor::new(&index, ExtractOptions::default()).extract();
        let names: Vec<_> = extraction.drafts.iter().map(|d| d.name.as_str()).collect();
        check!(names == vec!["API Reference"]);

        let reasons: Vec<_> = extraction.warnings.iter().map(|w| w.reason).collect();
        check!(
            reasons
                == vec![
                    MalformedReason::MissingTitle(2),
                    MalformedReason::UnknownDocument(3)
                ]
        );
    }

    #[test]
    fn titles_list_shorter_than_documents() {
        let mut index = GeneratorIndex::with_documents(
            vec!["index".into(), "api".into()],
            vec!["Welcome".into()],
        );
        index.titleterms.insert("api".into(), vec![1].into());

        let extraction = EntryExtractor::new(&index, ExtractOptions::default()).extract();
        check!(extraction.drafts.is_empty());
        let_assert!([warning] = extraction.warnings.as_slice());
        check!(warning.reason == MalformedReason::MissingTitle(1));
        check!(warning.prefix == "api");
    }

    #[test]
    fn out_of_range_document_is_skipped() {
        let mut index = sample();
        index.titleterms.insert("ghost".into(), vec![9].into());
        index.add_object("pkg", "orphan", 7, "py:function", "");

        let extraction = EntryExtractor::new(&index, ExtractOptions::default()).extract();
        check!(
            extraction
                .warnings
                .iter()
                .filter(|w| w.reason == MalformedReason::UnknownDocument(9)
                    || w.reason == MalformedReason::UnknownDocument(7))
                .count()
                == 2
        );
    }
}
