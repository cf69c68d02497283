use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How often one category value occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub value: String,
    pub count: u64,
}

/// The most frequent values of one categorical event column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    /// Short name used in reports and figure file names, e.g. `weather`.
    pub name: String,
    /// Source column in the event export.
    pub column: String,
    pub top: Vec<CategoryCount>,
}

impl CategoryBreakdown {
    pub fn from_values<S: AsRef<str>>(name: &str, column: &str, values: &[S], limit: usize) -> Self {
        Self {
            name: name.to_string(),
            column: column.to_string(),
            top: top_categories(values.iter().map(|v| v.as_ref()), limit),
        }
    }

    pub fn total(&self) -> u64 {
        self.top.iter().map(|c| c.count).sum()
    }
}

/// Count distinct values and keep the `limit` most frequent.
///
/// Values are trimmed and blanks are ignored. Equal counts keep the order in
/// which the values were first seen.
pub fn top_categories<'a, I>(values: I, limit: usize) -> Vec<CategoryCount>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut counts: Vec<CategoryCount> = Vec::new();
    for value in values {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match index.get(value) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(value, counts.len());
                counts.push(CategoryCount {
                    value: value.to_string(),
                    count: 1,
                });
            }
        }
    }
    // `sort_by` is stable, so first-seen order survives among ties.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    counts
}
