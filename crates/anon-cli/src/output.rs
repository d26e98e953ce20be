use std::collections::BTreeMap;

use anon_client::{JobInfo, JobStatus};
use anon_map::Mapping;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

/// Status column for ids the server did not return.
pub const NOT_FOUND: &str = "NOT_FOUND";

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

/// Jobs as a table. Extended adds the pseudonym column.
pub fn job_table(infos: &[JobInfo], extended: bool) -> Table {
    let mut header = vec![
        header_cell("id"),
        header_cell("date"),
        header_cell("status"),
        header_cell("down"),
        header_cell("proc"),
        header_cell("user"),
    ];
    if extended {
        header.push(header_cell("anon_name"));
    }
    let mut table = Table::new();
    table.set_header(header);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);

    for info in infos {
        let mut row = vec![
            Cell::new(info.job_id),
            Cell::new(&info.date),
            status_cell(info.status),
            count_cell(info.files_downloaded),
            count_cell(info.files_processed),
            Cell::new(&info.user_name),
        ];
        if extended {
            row.push(Cell::new(
                info.source_anonymizedpatientname.as_deref().unwrap_or("-"),
            ));
        }
        table.add_row(row);
    }
    table
}

/// Count per status for `queried` ids. Ids without info count as
/// [`NOT_FOUND`]. Rows are `(status, count, percentage)`.
pub fn status_counts(infos: &[JobInfo], queried: usize) -> Vec<(String, usize, f64)> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for info in infos {
        *counts.entry(info.status.to_string()).or_default() += 1;
    }
    let not_found = queried.saturating_sub(infos.len());
    if not_found > 0 {
        counts.insert(NOT_FOUND.to_string(), not_found);
    }
    counts
        .into_iter()
        .map(|(status, count)| {
            let percentage = if queried == 0 {
                0.0
            } else {
                count as f64 / queried as f64 * 100.0
            };
            (status, count, percentage)
        })
        .collect()
}

pub fn status_summary_table(infos: &[JobInfo], queried: usize) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Status"),
        header_cell("count"),
        header_cell("percentage"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for (status, count, percentage) in status_counts(infos, queried) {
        table.add_row(vec![
            Cell::new(status),
            Cell::new(count),
            Cell::new(format!("{percentage:.1} %")),
        ]);
    }
    table.add_row(vec![
        Cell::new("Total").add_attribute(Attribute::Bold),
        Cell::new(queried).add_attribute(Attribute::Bold),
        Cell::new("100%").add_attribute(Attribute::Bold),
    ]);
    table
}

/// Options and grid of a mapping.
pub fn mapping_table(mapping: &Mapping) -> Table {
    let kinds = mapping.grid.header_kinds();
    let mut table = Table::new();
    table.set_header(kinds.iter().map(|kind| header_cell(kind.field_name())));
    apply_table_style(&mut table);
    for row in mapping.grid.rows() {
        table.add_row(kinds.iter().map(|kind| {
            row.iter()
                .find(|param| param.kind() == *kind)
                .map_or_else(|| dim_cell("-"), |param| Cell::new(param.value()))
        }));
    }
    table
}

fn status_cell(status: JobStatus) -> Cell {
    match status {
        JobStatus::Error => Cell::new(status).fg(Color::Red).add_attribute(Attribute::Bold),
        JobStatus::Done => Cell::new(status).fg(Color::Green),
        JobStatus::Active => Cell::new(status).fg(Color::Yellow),
        _ => Cell::new(status),
    }
}

fn count_cell(count: Option<u64>) -> Cell {
    match count {
        Some(value) => Cell::new(value),
        None => dim_cell("-"),
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn info(job_id: u64, status: &str) -> JobInfo {
        JobInfo::from_value(json!({
            "job_id": job_id,
            "date": "2020-01-01T10:00:00",
            "user_name": "z123",
            "status": status,
            "files_downloaded": 3,
            "files_processed": 2,
        }))
        .unwrap()
    }

    #[test]
    fn test_status_counts_include_not_found() {
        let infos = vec![info(1, "DONE"), info(2, "DONE"), info(3, "ERROR")];
        let counts = status_counts(&infos, 4);
        assert_eq!(
            counts,
            vec![
                ("DONE".to_string(), 2, 50.0),
                ("ERROR".to_string(), 1, 25.0),
                (NOT_FOUND.to_string(), 1, 25.0),
            ]
        );
    }

    #[test]
    fn test_job_table_lists_every_job() {
        let infos = vec![info(11, "ACTIVE"), info(12, "DONE")];
        let rendered = job_table(&infos, false).to_string();
        assert!(rendered.contains("11"));
        assert!(rendered.contains("DONE"));
        assert!(!rendered.contains("anon_name"));
        assert!(job_table(&infos, true).to_string().contains("anon_name"));
    }
}
