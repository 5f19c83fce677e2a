use std::collections::HashMap;

use crate::entry::Entry;

/// Totals and the filtered view, derived from the current entries and filter token
#[derive(Debug, PartialEq)]
pub(crate) struct Summary<'a> {
    /// Entries whose flat matches the filter, in ledger order
    pub(crate) filtered: Vec<&'a Entry>,
    pub(crate) grand_total: f64,
    pub(crate) filtered_total: f64,
    /// Sum per distinct flat, ordered by first appearance in the ledger
    pub(crate) flat_totals: Vec<(&'a str, f64)>,
}

pub(crate) fn summarize<'a>(entries: &'a [Entry], filter: &str) -> Summary<'a> {
    let filtered = filter_entries(entries, filter);

    Summary {
        grand_total: total(entries.iter()),
        filtered_total: total(filtered.iter().copied()),
        flat_totals: flat_totals(entries),
        filtered,
    }
}

/// Case-insensitive substring match of the trimmed filter against each entry's flat.
/// An empty filter matches everything.
pub(crate) fn filter_entries<'a>(entries: &'a [Entry], filter: &str) -> Vec<&'a Entry> {
    let keyword = filter.trim().to_lowercase();
    entries.iter()
        .filter(|e| keyword.is_empty() || e.flat.to_lowercase().contains(&keyword))
        .collect()
}

fn total<'a>(entries: impl Iterator<Item = &'a Entry>) -> f64 {
    entries.map(|e| e.amount).fold(0.0, |total, amount| total + amount)
}

fn flat_totals(entries: &[Entry]) -> Vec<(&str, f64)> {
    let mut totals: Vec<(&str, f64)> = vec![];
    let mut flat_index: HashMap<&str, usize> = HashMap::new();

    for e in entries {
        let index = *flat_index.entry(e.flat.as_str()).or_insert_with(|| {
            totals.push((e.flat.as_str(), 0.0));
            totals.len() - 1
        });
        totals[index].1 += e.amount;
    }

    totals
}

/// Format an amount for display. Stored values keep their full precision.
pub(crate) fn format_amount(amount: f64) -> String {
    format!("{amount:.2}")
}
