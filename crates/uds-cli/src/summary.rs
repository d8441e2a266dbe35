use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use uds_model::RuleCategory;

use crate::types::{CompileResult, MigrationResult};

/// Gaps listed individually before the table is cut short.
const GAP_LIMIT: usize = 25;

pub fn print_migration_summary(result: &MigrationResult) {
    println!("Source: {}", result.source.display());
    println!(
        "Output: {} ({} rows, {} columns)",
        result.output.display(),
        result.rows,
        result.columns
    );

    let mut files = Table::new();
    files.set_header(vec![header_cell("Rule file"), header_cell("Entries")]);
    apply_table_style(&mut files);
    align_column(&mut files, 1, CellAlignment::Right);
    for file in &result.rule_files {
        files.add_row(vec![Cell::new(&file.name), Cell::new(file.entries)]);
    }
    if result.rule_files.is_empty() {
        files.add_row(vec![dim_cell("none"), dim_cell("-")]);
    }
    println!("{files}");

    let report = &result.report;
    let gaps = report.gaps_by_category();
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Category"),
        header_cell("Entries"),
        header_cell("Gaps"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for category in RuleCategory::ALL {
        table.add_row(vec![
            Cell::new(category.label()),
            Cell::new(report.entries_in(category)),
            count_cell(gaps.get(&category).copied().unwrap_or(0), Color::Yellow),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(report.total_entries()).add_attribute(Attribute::Bold),
        count_cell(report.gaps.len(), Color::Yellow),
    ]);
    println!("{table}");

    if report.repeating.inspected > 0 {
        println!(
            "Repeating groups: {} members inspected, {} written",
            report.repeating.inspected, report.repeating.written
        );
    }
    print_gap_table(result);
}

fn print_gap_table(result: &MigrationResult) {
    let gaps = &result.report.gaps;
    if gaps.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Category"),
        header_cell("Source"),
        header_cell("Target"),
        header_cell("Reason"),
    ]);
    apply_table_style(&mut table);
    for gap in gaps.iter().take(GAP_LIMIT) {
        table.add_row(vec![
            Cell::new(gap.category.label()),
            Cell::new(&gap.source_variable),
            Cell::new(&gap.target_variable).fg(Color::Blue),
            Cell::new(gap.reason.to_string()),
        ]);
    }
    if gaps.len() > GAP_LIMIT {
        table.add_row(vec![
            dim_cell("..."),
            dim_cell(format!("{} more", gaps.len() - GAP_LIMIT)),
            dim_cell("-"),
            dim_cell("-"),
        ]);
    }
    println!("{table}");
}

pub fn print_compile_summary(result: &CompileResult) {
    let mut table = Table::new();
    let mut header = vec![header_cell("Sheet")];
    header.extend(RuleCategory::ALL.map(|category| header_cell(category.label())));
    header.push(header_cell("Output"));
    table.set_header(header);
    apply_summary_table_style(&mut table);
    for index in 1..=RuleCategory::ALL.len() {
        align_column(&mut table, index, CellAlignment::Right);
    }

    let mut totals = [0usize; RuleCategory::ALL.len()];
    for sheet in &result.sheets {
        let name = sheet
            .input
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut row = vec![Cell::new(name).fg(Color::Blue).add_attribute(Attribute::Bold)];
        for (slot, category) in RuleCategory::ALL.into_iter().enumerate() {
            let count = sheet.entries.get(&category).copied().unwrap_or(0);
            totals[slot] += count;
            row.push(Cell::new(count));
        }
        row.push(Cell::new(sheet.output.display()));
        table.add_row(row);
    }
    let mut total_row = vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
    ];
    total_row.extend(
        totals
            .iter()
            .map(|count| Cell::new(count).add_attribute(Attribute::Bold)),
    );
    total_row.push(dim_cell("-"));
    table.add_row(total_row);
    println!("{table}");

    if !result.errors.is_empty() {
        eprintln!("Errors:");
        for error in &result.errors {
            eprintln!("- {error}");
        }
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
    if let Some(column) = table.column_mut(0) {
        column.set_constraint(ColumnConstraint::LowerBoundary(Width::Fixed(12)));
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
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
