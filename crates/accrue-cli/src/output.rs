//! Rendering of query results as tables or JSON.

use accrue::Plucked;
use accrue_db::{
    value::{display_value, to_json_value},
    LengthAwarePage, Record, Value,
};
use nu_ansi_term::Color::{Cyan, DarkGray, Green};
use serde_json::json;
use tabled::{
    builder::Builder,
    settings::{themes::BorderCorrection, Panel, Style},
};

use crate::{error::CliResult, utils::Colored};

fn cell(value: &Value) -> String {
    match value {
        Value::Null => format!("{}", Colored(DarkGray, "NULL")),
        other => display_value(other),
    }
}

/// Column names across `records`, in first-seen order.
fn header(records: &[Record]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for column in record.columns() {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }
    }
    columns
}

/// Builds the table for `records`, or `None` when there is nothing to show.
pub fn records_table(records: &[Record], title: Option<&str>) -> Option<String> {
    if records.is_empty() {
        return None;
    }

    let columns = header(records);
    let mut builder = Builder::new();
    builder.push_record(columns.iter().map(|c| format!("{}", Colored(Cyan, c))));
    for record in records {
        builder.push_record(
            columns
                .iter()
                .map(|c| record.value(c).map(cell).unwrap_or_default()),
        );
    }

    let mut table = builder.build();
    if let Some(title) = title {
        table.with(Panel::header(title));
    }
    Some(
        table
            .with(Style::rounded())
            .with(BorderCorrection {})
            .to_string(),
    )
}

pub fn print_records(records: &[Record], json: bool) -> CliResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    match records_table(records, None) {
        Some(table) => println!("{table}"),
        None => println!("{}", Colored(DarkGray, "No rows")),
    }
    Ok(())
}

pub fn print_record(record: &Record, json: bool) -> CliResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
        return Ok(());
    }
    print_records(std::slice::from_ref(record), false)
}

pub fn print_page(page: &LengthAwarePage<Record>, json: bool) -> CliResult<()> {
    if json {
        let document = json!({
            "data": page.items,
            "total": page.total,
            "per_page": page.per_page,
            "current_page": page.current_page,
            "last_page": page.last_page(),
            "from": page.from(),
            "to": page.to(),
            "page_name": page.page_name,
        });
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    let title = format!("Page {} of {}", page.current_page, page.last_page());
    match records_table(&page.items, Some(&title)) {
        Some(table) => println!("{table}"),
        None => println!("{}", Colored(DarkGray, "No rows on this page")),
    }
    if let (Some(from), Some(to)) = (page.from(), page.to()) {
        println!(
            "Showing {}-{} of {}",
            Colored(Green, from),
            Colored(Green, to),
            Colored(Cyan, page.total)
        );
    }
    Ok(())
}

pub fn print_plucked(plucked: &Plucked, json: bool) -> CliResult<()> {
    match plucked {
        Plucked::Values(values) if json => {
            let values: Vec<_> = values.iter().map(to_json_value).collect();
            println!("{}", serde_json::to_string_pretty(&values)?);
        }
        Plucked::Keyed(pairs) if json => {
            let map: serde_json::Map<String, serde_json::Value> = pairs
                .iter()
                .map(|(k, v)| (display_value(k), to_json_value(v)))
                .collect();
            println!("{}", serde_json::to_string_pretty(&map)?);
        }
        Plucked::Values(values) => {
            for value in values {
                println!("{}", cell(value));
            }
        }
        Plucked::Keyed(pairs) => {
            let mut builder = Builder::new();
            for (key, value) in pairs {
                builder.push_record([format!("{}", Colored(Cyan, cell(key))), cell(value)]);
            }
            println!("{}", builder.build().with(Style::rounded()));
        }
    }
    Ok(())
}

/// Prints a single number, e.g. a count, as plain text or `{"<label>": n}`.
pub fn print_number(label: &str, n: u64, json: bool) -> CliResult<()> {
    if json {
        let mut document = serde_json::Map::new();
        document.insert(label.to_string(), n.into());
        println!("{}", serde_json::to_string(&document)?);
    } else {
        println!("{n}");
    }
    Ok(())
}
