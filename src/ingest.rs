use crate::columns::ColumnMap;
use crate::record::CapabilityRecord;
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use std::error::Error;
use std::io::Cursor;
use std::path::Path;

/// Sheets that never contain capability rows (legend / info sheets)
pub const EXCLUDED_SHEETS: [&str; 4] = ["Info", "Level Definitions", "Definitions", "Sheet2"];

/// Banner rows above the header row on every domain sheet
const BANNER_ROWS: usize = 2;

/// Required columns of the secondary contacts file
const CONTACT_COLUMNS: [&str; 4] = ["Capability Group", "Capability", "Contact", "Email"];

/// Ingest a capability workbook from a file on disk
///
/// Opens an XLSX workbook and normalizes every non-excluded sheet into a
/// flat, ordered sequence of capability records. Each record is tagged with
/// its source sheet name as `domain`.
///
/// Ingestion is fail-soft: a sheet that cannot be read or parsed is skipped
/// and the remaining sheets are still ingested. If every sheet fails the
/// result is an empty vector, which callers must treat as "no data", not as
/// an error.
///
/// # Arguments
/// * `filepath` - Path to the XLSX workbook
/// * `map` - Column mapping for the current workbook revision
///
/// # Returns
/// * `Result<Vec<CapabilityRecord>, Box<dyn Error>>` - Normalized records, or
///   an error if the workbook itself cannot be opened
///
/// # Examples
/// ```no_run
/// use capsearch::columns::ColumnMap;
/// use capsearch::ingest::ingest_file;
///
/// match ingest_file("capabilities.xlsx", &ColumnMap::current_revision()) {
///     Ok(records) => println!("Loaded {} records", records.len()),
///     Err(e) => eprintln!("Error loading workbook: {}", e),
/// }
/// ```
pub fn ingest_file(
    filepath: impl AsRef<Path>,
    map: &ColumnMap,
) -> Result<Vec<CapabilityRecord>, Box<dyn Error>> {
    let mut workbook: Xlsx<_> = open_workbook(filepath)?;
    Ok(ingest_workbook(&mut workbook, map))
}

/// Ingest a capability workbook from an in-memory byte buffer
///
/// Same contract as [`ingest_file`], for workbooks arriving as uploads
/// rather than files on disk.
///
/// # Arguments
/// * `bytes` - Raw XLSX file content
/// * `map` - Column mapping for the current workbook revision
///
/// # Returns
/// * `Result<Vec<CapabilityRecord>, Box<dyn Error>>` - Normalized records, or
///   an error if the buffer is not a readable workbook
pub fn ingest_bytes(bytes: &[u8], map: &ColumnMap) -> Result<Vec<CapabilityRecord>, Box<dyn Error>> {
    let mut workbook = Xlsx::new(Cursor::new(bytes.to_vec()))?;
    Ok(ingest_workbook(&mut workbook, map))
}

/// Walk every non-excluded sheet, skipping the ones that fail to parse
fn ingest_workbook<RS>(workbook: &mut Xlsx<RS>, map: &ColumnMap) -> Vec<CapabilityRecord>
where
    RS: std::io::Read + std::io::Seek,
{
    let mut records = Vec::new();

    let sheet_names = workbook.sheet_names();
    for sheet in sheet_names {
        if EXCLUDED_SHEETS.contains(&sheet.as_str()) {
            continue;
        }

        let range = match workbook.worksheet_range(&sheet) {
            Ok(range) => range,
            Err(_) => continue, // unreadable sheet, keep going
        };

        match parse_sheet(&sheet, &range, map) {
            Ok(mut sheet_records) => records.append(&mut sheet_records),
            Err(_) => continue, // malformed sheet, keep going
        }
    }

    records
}

/// Parse one domain sheet into records
///
/// Skips the banner rows, normalizes the header row, resolves the column
/// mapping once, then turns every non-blank data row into a record.
///
/// # Arguments
/// * `sheet_name` - Name of the sheet, used as the records' domain
/// * `range` - Cell range of the sheet
/// * `map` - Column mapping for the current workbook revision
///
/// # Returns
/// * `Result<Vec<CapabilityRecord>, Box<dyn Error>>` - Records of this sheet,
///   or an error if the sheet is too short to carry a header row
fn parse_sheet(
    sheet_name: &str,
    range: &Range<Data>,
    map: &ColumnMap,
) -> Result<Vec<CapabilityRecord>, Box<dyn Error>> {
    let mut rows = range.rows();

    // Two banner rows precede the header on every domain sheet
    for _ in 0..BANNER_ROWS {
        rows.next()
            .ok_or_else(|| format!("Sheet '{}' is shorter than its banner", sheet_name))?;
    }

    let header_row = rows
        .next()
        .ok_or_else(|| format!("Sheet '{}' has no header row", sheet_name))?;

    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| normalize_header(&cell_text(cell)))
        .collect();

    let resolved = map.resolve(&headers);

    let mut records = Vec::new();
    for row in rows {
        let cells: Vec<String> = row.iter().map(cell_text).collect();
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        records.push(resolved.record_from_row(sheet_name, &cells));
    }

    Ok(records)
}

/// Normalize a header label for matching
///
/// Non-breaking spaces become plain spaces and surrounding whitespace is
/// stripped; the workbook's merged banner cells leave both behind.
///
/// # Arguments
/// * `raw` - Header text as read from the sheet
///
/// # Returns
/// * `String` - Normalized header
pub fn normalize_header(raw: &str) -> String {
    raw.replace('\u{a0}', " ").trim().to_string()
}

/// Text content of one cell
///
/// Numbers render without a trailing `.0` when they are whole, empty and
/// error cells render as empty strings.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::Error(_) => String::new(),
        other => other.to_string(),
    }
}

/// One row of the secondary contacts file
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ContactRow {
    /// Capability group label the row belongs to
    pub capability_group: String,

    /// Capability name
    pub capability: String,

    /// Contact person
    pub contact: String,

    /// Contact email address
    pub email: String,
}

/// Contacts of one capability group, for the grouped read-only listing
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ContactGroup {
    /// Capability group label
    pub capability_group: String,

    /// Rows of the group, in sheet order
    pub contacts: Vec<ContactRow>,
}

/// Parse the secondary contacts file
///
/// A single-sheet workbook with a fixed, required column set. Unlike the
/// capability workbook this flow is all-or-nothing: a missing required
/// column aborts the load with a user-visible validation message and no rows
/// are returned.
///
/// # Arguments
/// * `bytes` - Raw XLSX file content
///
/// # Returns
/// * `Result<Vec<ContactGroup>, String>` - Rows grouped by capability group
///   (groups in first-encountered order), or a validation message
///
/// # Errors
/// * The buffer is not a readable workbook
/// * The workbook has no sheets
/// * Any required column (`Capability Group`, `Capability`, `Contact`,
///   `Email`) is missing from the header row
pub fn parse_contacts(bytes: &[u8]) -> Result<Vec<ContactGroup>, String> {
    let mut workbook = Xlsx::new(Cursor::new(bytes.to_vec()))
        .map_err(|e| format!("Could not read contacts file: {}", e))?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or("Contacts file has no sheets")?;

    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| format!("Could not read contacts sheet: {}", e))?;

    let mut rows = range.rows();
    let header_row = rows.next().ok_or("Contacts file is empty")?;
    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| normalize_header(&cell_text(cell)))
        .collect();

    // Validate the full required set before touching any data row
    let mut positions = Vec::with_capacity(CONTACT_COLUMNS.len());
    for column in CONTACT_COLUMNS {
        match headers.iter().position(|h| h == column) {
            Some(pos) => positions.push(pos),
            None => {
                return Err(format!(
                    "Contacts file is missing required column '{}'",
                    column
                ));
            }
        }
    }

    let mut groups: Vec<ContactGroup> = Vec::new();
    for row in rows {
        let cells: Vec<String> = row.iter().map(cell_text).collect();
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }

        let field = |slot: usize| -> String {
            cells
                .get(positions[slot])
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        };

        let contact = ContactRow {
            capability_group: field(0),
            capability: field(1),
            contact: field(2),
            email: field(3),
        };

        match groups
            .iter()
            .position(|g| g.capability_group == contact.capability_group)
        {
            Some(i) => groups[i].contacts.push(contact),
            None => groups.push(ContactGroup {
                capability_group: contact.capability_group.clone(),
                contacts: vec![contact],
            }),
        }
    }

    Ok(groups)
}
