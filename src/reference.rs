//! Dense reference assignment.

use crate::entry::{EntryDraft, EntrySet, IndexEntry};

/// Hands out references 0, 1, 2, … from a single counter.
///
/// Every extraction phase draws from the same assigner, so reference ranges never collide.
#[derive(Debug, Default)]
pub struct ReferenceAssigner {
    next: u32,
}

impl ReferenceAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gives `draft` the next reference.
    pub fn assign(&mut self, draft: EntryDraft) -> IndexEntry {
        let reference = self.next;
        self.next += 1;
        draft.into_entry(reference)
    }

    /// Number of references issued so far.
    pub const fn issued(&self) -> u32 {
        self.next
    }

    /// Assigns references to `drafts` in order and collects them into an entry set.
    pub fn assign_all(mut self, drafts: impl IntoIterator<Item = EntryDraft>) -> EntrySet {
        let entries = drafts.into_iter().map(|draft| self.assign(draft)).collect();
        EntrySet::from_dense(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryKind;
    use assert2::check;
    use rstest::rstest;

    fn draft(name: &str) -> EntryDraft {
        EntryDraft {
            source_file: "index".to_string(),
            kind: EntryKind::Title,
            object_type: String::new(),
            namespace_prefix: name.to_lowercase(),
            short_prefix: String::new(),
            name: name.to_string(),
            display_name: name.to_string(),
            anchor_id: String::new(),
        }
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(17)]
    fn references_are_contiguous_from_zero(#[case] count: usize) {
        let drafts = (0..count).map(|i| draft(&format!("Entry{}", i)));
        let set = ReferenceAssigner::new().assign_all(drafts);

        check!(set.len() == count);
        for (position, entry) in set.iter().enumerate() {
            check!(entry.reference as usize == position);
        }
    }

    #[test]
    fn counter_is_shared_across_phases() {
        let mut assigner = ReferenceAssigner::new();
        let symbols: Vec<_> = ["a", "b"].map(|n| assigner.assign(draft(n))).into();
        let titles: Vec<_> = ["c"].map(|n| assigner.assign(draft(n))).into();

        check!(symbols.iter().map(|e| e.reference).collect::<Vec<_>>() == vec![0, 1]);
        check!(titles[0].reference == 2);
        check!(assigner.issued() == 3);
    }
}
