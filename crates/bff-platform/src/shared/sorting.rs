//! Sort parameter parsing and comparator chaining
//!
//! `sort=name,-id` sorts by name ascending, then id descending.

use std::cmp::Ordering;
use std::collections::HashMap;

const DESC_PREFIX: char = '-';
const SEPARATOR: char = ',';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortParam {
    pub name: String,
    pub descending: bool,
}

/// Parse a `sort` query value. Empty entries and a bare `-` are dropped.
pub fn parse_sort(sort: &str) -> Vec<SortParam> {
    sort.split(SEPARATOR)
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "-")
        .map(|name| match name.strip_prefix(DESC_PREFIX) {
            Some(stripped) => SortParam {
                name: stripped.to_string(),
                descending: true,
            },
            None => SortParam {
                name: name.to_string(),
                descending: false,
            },
        })
        .collect()
}

type Comparator<T> = Box<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Named comparators for one item type
pub struct SortResolver<T> {
    comparators: HashMap<&'static str, Comparator<T>>,
}

impl<T> SortResolver<T> {
    pub fn new() -> Self {
        Self {
            comparators: HashMap::new(),
        }
    }

    pub fn with<F>(mut self, name: &'static str, comparator: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.comparators.insert(name, Box::new(comparator));
        self
    }

    /// Chain the comparators named by `params`; unknown names are skipped.
    /// `None` when nothing resolves.
    pub fn resolve(&self, params: &[SortParam]) -> Option<SortChain<'_, T>> {
        let steps: Vec<_> = params
            .iter()
            .filter_map(|p| self.comparators.get(p.name.as_str()).map(|c| (c, p.descending)))
            .collect();

        (!steps.is_empty()).then_some(SortChain { steps })
    }

    /// Sort `items` in place by a raw `sort` value. Unresolvable values leave
    /// the order untouched.
    pub fn sort(&self, items: &mut [T], sort: &str) {
        if let Some(chain) = self.resolve(&parse_sort(sort)) {
            items.sort_by(|a, b| chain.compare(a, b));
        }
    }
}

impl<T> Default for SortResolver<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolved comparator chain; earlier keys win, later keys break ties
pub struct SortChain<'a, T> {
    steps: Vec<(&'a Comparator<T>, bool)>,
}

impl<T> SortChain<'_, T> {
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        self.steps
            .iter()
            .map(|(cmp, descending)| {
                let ordering = cmp(a, b);
                if *descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            })
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        name: &'static str,
        rank: u32,
    }

    fn resolver() -> SortResolver<Item> {
        SortResolver::new()
            .with("name", |a: &Item, b: &Item| a.name.cmp(b.name))
            .with("rank", |a: &Item, b: &Item| a.rank.cmp(&b.rank))
    }

    #[test]
    fn test_parse_sort() {
        let params = parse_sort("name,-rank,,-");
        assert_eq!(
            params,
            vec![
                SortParam { name: "name".into(), descending: false },
                SortParam { name: "rank".into(), descending: true },
            ]
        );
        assert!(parse_sort("").is_empty());
    }

    #[test]
    fn test_unknown_fields_resolve_to_none() {
        assert!(resolver().resolve(&parse_sort("color")).is_none());
        assert!(resolver().resolve(&parse_sort("color,name")).is_some());
    }

    #[test]
    fn test_chained_sort_breaks_ties() {
        let mut items = vec![
            Item { name: "b", rank: 1 },
            Item { name: "a", rank: 1 },
            Item { name: "a", rank: 2 },
        ];
        resolver().sort(&mut items, "name,-rank");
        assert_eq!(
            items,
            vec![
                Item { name: "a", rank: 2 },
                Item { name: "a", rank: 1 },
                Item { name: "b", rank: 1 },
            ]
        );
    }

    #[test]
    fn test_descending_single_key() {
        let mut items = vec![Item { name: "a", rank: 1 }, Item { name: "b", rank: 3 }];
        resolver().sort(&mut items, "-rank");
        assert_eq!(items[0].rank, 3);
    }
}
