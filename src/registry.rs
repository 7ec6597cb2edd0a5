//! Per-page partitioning of the highlight collection

use std::collections::BTreeMap;

use crate::geometry::PageNumber;
use crate::highlight::{GhostHighlight, Highlight, PageHighlight};

/// Highlights grouped by page, in collection order, ghost last
pub type PageGroups<'a> = BTreeMap<PageNumber, Vec<PageHighlight<'a>>>;

/// Group `highlights` plus the optional ghost by page number.
///
/// Grouping is stable: within a page, highlights keep their collection
/// order, and the ghost (if any) is appended to its own page's group.
#[must_use]
pub fn group_by_page<'a>(
    highlights: &'a [Highlight],
    ghost: Option<&'a GhostHighlight>,
) -> PageGroups<'a> {
    let mut groups: PageGroups<'a> = BTreeMap::new();
    let all = highlights
        .iter()
        .map(PageHighlight::Committed)
        .chain(ghost.map(PageHighlight::Ghost));

    for highlight in all {
        groups
            .entry(highlight.position().page_number)
            .or_default()
            .push(highlight);
    }

    groups
}
