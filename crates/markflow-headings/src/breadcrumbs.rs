use serde::{Deserialize, Serialize};

/// One step of a document's breadcrumb trail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    /// Display label.
    pub label: String,
    /// `/`-joined path up to and including this segment.
    pub path: String,
}

/// Build breadcrumbs from a document path.
///
/// Leading and trailing `/` are ignored, as are empty segments. The last
/// segment's label drops its extension.
///
/// ```
/// use markflow_headings::breadcrumbs;
///
/// let trail = breadcrumbs("/docs/guide/intro.md");
/// let labels: Vec<_> = trail.iter().map(|b| b.label.as_str()).collect();
/// assert_eq!(labels, ["docs", "guide", "intro"]);
/// assert_eq!(trail[2].path, "docs/guide/intro.md");
/// ```
#[must_use]
pub fn breadcrumbs(path: &str) -> Vec<Breadcrumb> {
    let segments: Vec<&str> = path
        .trim()
        .trim_matches('/')
        .split('/')
        .filter(|segment| !segment.trim().is_empty())
        .collect();

    let mut trail = Vec::with_capacity(segments.len());
    let mut cumulative = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if !cumulative.is_empty() {
            cumulative.push('/');
        }
        cumulative.push_str(segment);

        let label = if i + 1 == segments.len() {
            strip_extension(segment)
        } else {
            segment
        };
        trail.push(Breadcrumb {
            label: label.to_owned(),
            path: cumulative.clone(),
        });
    }
    trail
}

fn strip_extension(segment: &str) -> &str {
    match segment.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => segment,
    }
}
