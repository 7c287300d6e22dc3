use crate::record::Division;
use crate::store::StoredRecord;
use std::error::Error;

/// Convert records to CSV format
///
/// Exports a record set (the full table or a filtered subset) as
/// comma-separated values with a header row. Fields containing commas,
/// quotes or newlines are quoted and embedded quotes are doubled.
///
/// # Arguments
/// * `records` - Records to export, in store order
///
/// # Returns
/// * `Result<String, Box<dyn Error>>` - CSV content as a string
///
/// # Examples
/// ```
/// use capsearch::export::to_csv;
///
/// let csv = to_csv(&[]).unwrap();
/// assert!(csv.starts_with("id,domain,"));
/// ```
pub fn to_csv(records: &[StoredRecord]) -> Result<String, Box<dyn Error>> {
    let mut csv_content = String::new();

    for (i, column) in header_row().iter().enumerate() {
        if i > 0 {
            csv_content.push(',');
        }
        csv_content.push_str(&escape_csv_field(column));
    }
    csv_content.push('\n');

    for stored in records {
        for (i, value) in field_row(stored).iter().enumerate() {
            if i > 0 {
                csv_content.push(',');
            }
            csv_content.push_str(&escape_csv_field(value));
        }
        csv_content.push('\n');
    }

    Ok(csv_content)
}

/// Convert records to XLSX format
///
/// Exports a record set to XLSX using the rust_xlsxwriter library, with the
/// same columns as the CSV export.
///
/// # Arguments
/// * `records` - Records to export, in store order
///
/// # Returns
/// * `Result<Vec<u8>, Box<dyn Error>>` - XLSX file content as bytes
pub fn to_xlsx(records: &[StoredRecord]) -> Result<Vec<u8>, Box<dyn Error>> {
    use rust_xlsxwriter::{Workbook, Worksheet};

    let mut workbook = Workbook::new();
    let mut worksheet = Worksheet::new();

    for (col, column) in header_row().iter().enumerate() {
        worksheet.write_string(0, col as u16, *column)?;
    }

    for (row, stored) in records.iter().enumerate() {
        for (col, value) in field_row(stored).iter().enumerate() {
            worksheet.write_string(row as u32 + 1, col as u16, value)?;
        }
    }

    workbook.push_worksheet(worksheet);

    let buffer = workbook.save_to_buffer()?;

    Ok(buffer)
}

/// Exported column labels, in output order
fn header_row() -> Vec<&'static str> {
    let mut columns = vec![
        "id",
        "domain",
        "competency",
        "skill",
        "description",
        "capability_group",
        "group_capability",
        "global_sme",
    ];
    for division in Division::ALL {
        columns.push(division.label());
    }
    columns.push("keywords");
    columns
}

/// One record's exported field values, aligned with [`header_row`]
fn field_row(stored: &StoredRecord) -> Vec<String> {
    let record = &stored.record;
    let mut values = vec![
        stored.id.to_string(),
        record.domain.clone(),
        record.competency.clone(),
        record.skill.clone(),
        record.description.clone(),
        record.capability_group.clone(),
        record.group_capability.clone(),
        record.global_sme.clone(),
    ];
    for division in Division::ALL {
        values.push(record.division_sme(division).to_string());
    }
    values.push(record.keywords.clone());
    values
}

/// Escape one CSV field if it needs quoting
fn escape_csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        let escaped = value.replace('"', "\"\"");
        format!("\"{}\"", escaped)
    } else {
        value.to_string()
    }
}
