use serde::Serialize;

use crate::heading::HeadingInfo;

/// Table of contents entry with its nested sub-headings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TocNode {
    pub heading: HeadingInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TocNode>,
}

/// Nest headings by level.
///
/// A heading becomes a child of the closest preceding heading with a lower
/// level. Skipped levels are not filled in.
#[must_use]
pub fn table_of_contents(headings: &[HeadingInfo]) -> Vec<TocNode> {
    let mut roots = Vec::new();
    for heading in headings {
        insert(
            &mut roots,
            TocNode {
                heading: heading.clone(),
                children: Vec::new(),
            },
        );
    }
    roots
}

fn insert(nodes: &mut Vec<TocNode>, node: TocNode) {
    match nodes.last_mut() {
        Some(last) if last.heading.level < node.heading.level => insert(&mut last.children, node),
        _ => nodes.push(node),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::heading::extract_headings;

    fn shape(nodes: &[TocNode]) -> String {
        nodes
            .iter()
            .map(|node| {
                if node.children.is_empty() {
                    node.heading.anchor.clone()
                } else {
                    format!("{}({})", node.heading.anchor, shape(&node.children))
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_nesting_by_level() {
        let headings = extract_headings("# A\n## B\n### C\n## D\n# E\n");
        assert_eq!(shape(&table_of_contents(&headings)), "a(b(c) d) e");
    }

    #[test]
    fn test_skipped_level_nests_under_nearest() {
        let headings = extract_headings("# A\n### B\n## C\n");
        assert_eq!(shape(&table_of_contents(&headings)), "a(b c)");
    }

    #[test]
    fn test_starts_below_top_level() {
        let headings = extract_headings("### A\n# B\n## C\n");
        assert_eq!(shape(&table_of_contents(&headings)), "a b(c)");
    }

    #[test]
    fn test_empty() {
        assert!(table_of_contents(&[]).is_empty());
    }
}
