use comfy_table::{Cell, CellAlignment, Table, TableComponent};

use crate::aggregate::{format_amount, summarize, Summary};
use crate::entry::Entry;

/// Everything the display shows, recomputed from scratch after each change
pub(crate) struct View<'a> {
    pub(crate) entries: &'a [Entry],
    pub(crate) filter: &'a str,
    pub(crate) summary: Summary<'a>,
}

impl<'a> View<'a> {
    pub(crate) fn new(entries: &'a [Entry], filter: &'a str) -> View<'a> {
        View {
            entries,
            filter,
            summary: summarize(entries, filter),
        }
    }
}

/// Receives every state change of the ledger, plus messages meant for the user
pub(crate) trait Renderer {
    fn render(&mut self, view: &View);

    fn notify(&mut self, message: &str);
}

/// Draws the ledger as terminal tables on stdout
pub(crate) struct TableRenderer;

impl Renderer for TableRenderer {
    fn render(&mut self, view: &View) {
        for (title, table) in tables(view) {
            println!("{title}");
            println!("{table}");
        }
    }

    fn notify(&mut self, message: &str) {
        println!("{message}");
    }
}

/// The full table, the filtered table and the totals, with a title for each
pub(crate) fn tables(view: &View) -> Vec<(String, Table)> {
    let filter = view.filter.trim();
    let filtered_title = if filter.is_empty() {
        "Filtered (no filter)".to_string()
    } else {
        format!("Filtered by flat '{filter}'")
    };

    vec![
        ("All entries".to_string(), entries_table(view.entries.iter())),
        (filtered_title, entries_table(view.summary.filtered.iter().copied())),
        ("Totals".to_string(), totals_table(&view.summary)),
    ]
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.remove_style(TableComponent::HorizontalLines);
    table.remove_style(TableComponent::MiddleIntersections);
    table.remove_style(TableComponent::LeftBorderIntersections);
    table.remove_style(TableComponent::RightBorderIntersections);
    table
}

pub(crate) fn entries_table<'a>(entries: impl Iterator<Item = &'a Entry>) -> Table {
    let mut table = new_table();
    table.set_header(vec!["ID", "Date", "Flat", "Item", "Amount"]);

    for e in entries {
        table.add_row(vec![
            Cell::new(e.id).set_alignment(CellAlignment::Right),
            Cell::new(e.date.as_str()),
            Cell::new(e.flat.as_str()),
            Cell::new(e.item.as_str()),
            Cell::new(e.amount).set_alignment(CellAlignment::Right),
        ]);
    }

    table
}

/// Grand total, filtered total, then one row per flat
pub(crate) fn totals_table(summary: &Summary) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Total", "Amount"]);

    table.add_row(vec![
        Cell::new("Grand total"),
        Cell::new(format_amount(summary.grand_total)).set_alignment(CellAlignment::Right),
    ]);
    table.add_row(vec![
        Cell::new("Filtered total"),
        Cell::new(format_amount(summary.filtered_total)).set_alignment(CellAlignment::Right),
    ]);
    for (flat, amount) in &summary.flat_totals {
        table.add_row(vec![
            Cell::new(format!("Flat {flat}")),
            Cell::new(format_amount(*amount)).set_alignment(CellAlignment::Right),
        ]);
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<Entry> {
        vec![
            Entry { date: "Jan".to_string(), flat: "A1".to_string(), item: "Rent".to_string(), amount: 10.0, id: 1 },
            Entry { date: "Feb".to_string(), flat: "B2".to_string(), item: "Water".to_string(), amount: 20.5, id: 2 },
        ]
    }

    #[test]
    fn test_entries_table() {
        let entries = entries();
        let output = entries_table(entries.iter()).to_string();
        assert!(output.contains("Water"));
        assert!(output.contains("20.5"));
        assert!(output.contains("Flat"));
    }

    #[test]
    fn test_totals_table() {
        let entries = entries();
        let view = View::new(&entries, "b2");
        let output = totals_table(&view.summary).to_string();
        assert!(output.contains("30.50"));
        assert!(output.contains("20.50"));
        assert!(output.contains("Flat A1"));
        assert!(output.contains("10.00"));
    }

    #[test]
    fn test_filtered_table_is_always_drawn() {
        let entries = entries();

        let drawn = tables(&View::new(&entries, " "));
        let titles: Vec<&str> = drawn.iter().map(|(title, _)| title.as_str()).collect();
        assert_eq!(titles, vec!["All entries", "Filtered (no filter)", "Totals"]);
        assert_eq!(drawn[0].1.to_string(), drawn[1].1.to_string());

        let drawn = tables(&View::new(&entries, "a1"));
        assert_eq!(drawn[1].0, "Filtered by flat 'a1'");
        assert!(!drawn[1].1.to_string().contains("Water"));
    }
}
