//! Near-duplicate collapsing for titled items and free-text lists.
//!
//! All functions are pure and keep the first occurrence of each key, so
//! running them again on their own output changes nothing.

use std::collections::{HashMap, HashSet};

use crate::reference::ActionItem;

/// Case-folded title with runs of whitespace collapsed to one space.
pub fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Case-folded first `len` characters of `text`, after trimming.
pub fn fingerprint(text: &str, len: usize) -> String {
    text.trim().chars().take(len).collect::<String>().to_lowercase()
}

/// Drop items whose normalised title was already seen.
pub fn dedup_by_title<T, F>(items: Vec<T>, title: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(normalize_title(title(item))))
        .collect()
}

/// Drop items whose text fingerprint was already seen.
pub fn dedup_by_fingerprint<T, F>(items: Vec<T>, text: F, len: usize) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(fingerprint(text(item), len)))
        .collect()
}

/// Collapse action items with the same normalised title.
///
/// The first item is kept; each later duplicate contributes its source
/// attribution, joined with `separator`, so no attribution is lost.
pub fn merge_action_items(items: Vec<ActionItem>, separator: &str) -> Vec<ActionItem> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(items.len());
    let mut merged: Vec<ActionItem> = Vec::with_capacity(items.len());

    for item in items {
        let key = normalize_title(&item.title);
        match index.get(&key) {
            Some(&i) => {
                let kept = &mut merged[i];
                kept.source = join_attribution(&kept.source, &item.source, separator);
            }
            None => {
                index.insert(key, merged.len());
                merged.push(item);
            }
        }
    }
    merged
}

/// Union of two attribution lists, preserving first-seen order.
fn join_attribution(existing: &str, incoming: &str, separator: &str) -> String {
    let mut parts: Vec<&str> = split_attribution(existing, separator).collect();
    for part in split_attribution(incoming, separator) {
        if !parts.contains(&part) {
            parts.push(part);
        }
    }
    parts.join(separator)
}

fn split_attribution<'a>(s: &'a str, separator: &'a str) -> impl Iterator<Item = &'a str> {
    let separator = match separator.trim() {
        "" => separator,
        trimmed => trimmed,
    };
    s.split(separator)
        .map(str::trim)
        .filter(|p| !p.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, source: &str) -> ActionItem {
        ActionItem {
            title: title.into(),
            description: format!("{title} description"),
            source: source.into(),
            ..Default::default()
        }
    }

    #[test]
    fn normalize_title_folds_case_and_space() {
        assert_eq!(normalize_title("  Review   Award\tTerms "), "review award terms");
    }

    #[test]
    fn fingerprint_truncates_by_chars() {
        assert_eq!(fingerprint("  ABCDEF", 3), "abc");
        assert_eq!(fingerprint("Équipe", 2), "éq");
        assert_eq!(fingerprint("ab", 50), "ab");
    }

    #[test]
    fn title_dedup_keeps_first() {
        let items = vec![("Guide", 1), ("guide ", 2), ("Other", 3)];
        let out = dedup_by_title(items, |pair| pair.0);
        assert_eq!(out, vec![("Guide", 1), ("Other", 3)]);
    }

    #[test]
    fn fingerprint_dedup_matches_on_prefix() {
        let shared = "Agencies must review all active awards for compliance with the new terms";
        let a = format!("{shared} by March.");
        let b = format!("{} by April.", shared.to_uppercase());
        let items = vec![a.clone(), b, "Something else".to_string()];
        let out = dedup_by_fingerprint(items, |s| s.as_str(), 50);
        assert_eq!(out, vec![a, "Something else".to_string()]);
    }

    #[test]
    fn merge_unions_attribution() {
        let items = vec![
            item("Review award terms", "COGR"),
            item("review  award terms", "AAU"),
            item("Update policies", "ACE"),
        ];
        let out = merge_action_items(items, ", ");
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].source, "COGR, AAU");
        assert_eq!(out[0].title, "Review award terms");
        assert_eq!(out[0].description, "Review award terms description");
        assert_eq!(out[1].source, "ACE");
    }

    #[test]
    fn merge_does_not_repeat_sources() {
        let items = vec![
            item("Review award terms", "COGR"),
            item("Review award terms", "COGR"),
            item("Review award terms", "AAU, COGR"),
        ];
        let out = merge_action_items(items, ", ");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].source, "COGR, AAU");
    }

    #[test]
    fn merge_is_idempotent() {
        let items = vec![
            item("A", "FR"),
            item("a", "NIH"),
            item("B", "NSF"),
        ];
        let once = merge_action_items(items, ", ");
        let twice = merge_action_items(once.clone(), ", ");
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_input() {
        assert!(merge_action_items(Vec::new(), ", ").is_empty());
        assert!(dedup_by_title(Vec::<String>::new(), |s| s.as_str()).is_empty());
    }
}
