//! First-sheet xlsx reader.
//!
//! Opens the zip container, resolves the first sheet through the workbook
//! and its relationships, and turns the sheet XML into a [`Table`]. The
//! first physical row is the header; each later physical row is a record.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::{Result, SourceReadError};
use crate::table::{CellValue, Table};

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const FALLBACK_SHEET_PART: &str = "xl/worksheets/sheet1.xml";

/// Load the first sheet of the workbook at `path`.
pub fn read_xlsx(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| SourceReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut archive = ZipArchive::new(file).map_err(|e| match e {
        ZipError::Io(source) => SourceReadError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => SourceReadError::NotZip {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    })?;

    let table = read_first_sheet(&mut archive)?;
    debug!(
        path = %path.display(),
        columns = table.width(),
        rows = table.len(),
        "loaded xlsx table"
    );
    Ok(table)
}

fn read_first_sheet<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Table> {
    let sheet_part = first_sheet_part(archive)?;
    let shared_strings = match read_part_optional(archive, SHARED_STRINGS_PART)? {
        Some(xml) => parse_shared_strings(&xml)?,
        None => Vec::new(),
    };
    let sheet_xml = read_part(archive, &sheet_part)?;
    let rows = parse_sheet_rows(&sheet_xml, &sheet_part, &shared_strings)?;
    build_table(rows)
}

fn first_sheet_part<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<String> {
    let Some(workbook) = read_part_optional(archive, WORKBOOK_PART)? else {
        return Ok(FALLBACK_SHEET_PART.to_string());
    };
    let sheets = parse_workbook_sheets(&workbook)?;
    let first = sheets.first().ok_or(SourceReadError::NoSheets)?;

    let relationships = match read_part_optional(archive, WORKBOOK_RELS_PART)? {
        Some(xml) => parse_relationships(&xml)?,
        None => HashMap::new(),
    };

    Ok(resolve_sheet_target(first, &relationships))
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, part: &str) -> Result<Vec<u8>> {
    read_part_optional(archive, part)?.ok_or_else(|| SourceReadError::MissingPart {
        part: part.to_string(),
    })
}

fn read_part_optional<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    part: &str,
) -> Result<Option<Vec<u8>>> {
    let mut file = match archive.by_name(part) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => {
            return Err(SourceReadError::PartRead {
                part: part.to_string(),
                reason: e.to_string(),
            })
        }
    };
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)
        .map_err(|e| SourceReadError::PartRead {
            part: part.to_string(),
            reason: e.to_string(),
        })?;
    Ok(Some(buf))
}

struct SheetRef {
    rel_id: Option<String>,
    sheet_id: Option<u32>,
}

fn parse_workbook_sheets(xml: &[u8]) -> Result<Vec<SheetRef>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut sheets = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == b"sheet" => {
                sheets.push(SheetRef {
                    rel_id: attr_value(&e, b"r:id", WORKBOOK_PART)?,
                    sheet_id: attr_value(&e, b"sheetId", WORKBOOK_PART)?
                        .and_then(|id| id.parse().ok()),
                });
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(WORKBOOK_PART, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(sheets)
}

fn parse_relationships(xml: &[u8]) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut map = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.name().as_ref() == b"Relationship" => {
                let id = attr_value(&e, b"Id", WORKBOOK_RELS_PART)?;
                let target = attr_value(&e, b"Target", WORKBOOK_RELS_PART)?;
                let rel_type = attr_value(&e, b"Type", WORKBOOK_RELS_PART)?;
                if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                    if rel_type.ends_with("/worksheet") {
                        map.insert(id, target);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(WORKBOOK_RELS_PART, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(map)
}

fn resolve_sheet_target(sheet: &SheetRef, relationships: &HashMap<String, String>) -> String {
    if let Some(target) = sheet.rel_id.as_ref().and_then(|id| relationships.get(id)) {
        return normalize_target(target);
    }
    match sheet.sheet_id {
        Some(id) => format!("xl/worksheets/sheet{id}.xml"),
        None => FALLBACK_SHEET_PART.to_string(),
    }
}

fn normalize_target(target: &str) -> String {
    let trimmed = target.trim_start_matches('/');
    if trimmed.starts_with("xl/") {
        trimmed.to_string()
    } else {
        format!("xl/{trimmed}")
    }
}

fn parse_shared_strings(xml: &[u8]) -> Result<Vec<String>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_si = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.name().as_ref() == b"si" => {
                current.clear();
                in_si = true;
            }
            Ok(Event::Empty(e)) if e.name().as_ref() == b"si" => strings.push(String::new()),
            Ok(Event::Start(e)) if e.name().as_ref() == b"t" && in_si => {
                let text = reader
                    .read_text(e.name())
                    .map_err(|e| xml_error(SHARED_STRINGS_PART, e))?;
                current.push_str(&unescape(&text, SHARED_STRINGS_PART)?);
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"si" => {
                strings.push(std::mem::take(&mut current));
                in_si = false;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(SHARED_STRINGS_PART, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(strings)
}

/// One physical `<row>` of a sheet: its 0-based row number and the cells
/// present in it, keyed by 0-based column.
#[derive(Debug, Default)]
struct SheetRow {
    row: u32,
    cells: BTreeMap<u32, CellValue>,
}

fn parse_sheet_rows(xml: &[u8], part: &str, shared_strings: &[String]) -> Result<Vec<SheetRow>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    let mut rows: Vec<SheetRow> = Vec::new();
    let mut current: Option<SheetRow> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.name().as_ref() == b"row" => {
                let row = row_number(&e, part, rows.last())?;
                current = Some(SheetRow {
                    row,
                    cells: BTreeMap::new(),
                });
            }
            Ok(Event::Empty(e)) if e.name().as_ref() == b"row" => {
                let row = row_number(&e, part, rows.last())?;
                rows.push(SheetRow {
                    row,
                    cells: BTreeMap::new(),
                });
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"row" => {
                if let Some(row) = current.take() {
                    rows.push(row);
                }
            }
            Ok(Event::Start(e)) if e.name().as_ref() == b"c" => {
                let col = cell_column(&e, part, current.as_ref())?;
                let value = parse_cell(&mut reader, &e, part, shared_strings)?;
                if let Some(row) = current.as_mut() {
                    row.cells.insert(col, value);
                }
            }
            Ok(Event::Empty(e)) if e.name().as_ref() == b"c" => {
                let col = cell_column(&e, part, current.as_ref())?;
                if let Some(row) = current.as_mut() {
                    row.cells.insert(col, CellValue::Unknown);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(part, e)),
            _ => {}
        }
        buf.clear();
    }

    rows.sort_by_key(|r| r.row);
    Ok(rows)
}

fn row_number(start: &BytesStart<'_>, part: &str, previous: Option<&SheetRow>) -> Result<u32> {
    match attr_value(start, b"r", part)? {
        Some(r) => r
            .parse::<u32>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .ok_or(SourceReadError::InvalidAddress(r)),
        None => Ok(previous.map_or(0, |p| p.row + 1)),
    }
}

fn cell_column(start: &BytesStart<'_>, part: &str, row: Option<&SheetRow>) -> Result<u32> {
    match attr_value(start, b"r", part)? {
        Some(address) => address_to_index(&address)
            .map(|(_, col)| col)
            .ok_or(SourceReadError::InvalidAddress(address)),
        None => Ok(row
            .and_then(|r| r.cells.keys().next_back())
            .map_or(0, |last| last + 1)),
    }
}

fn parse_cell(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
    part: &str,
    shared_strings: &[String],
) -> Result<CellValue> {
    let cell_type = attr_value(start, b"t", part)?;

    let mut value_text: Option<String> = None;
    let mut inline_text: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.name().as_ref() == b"v" => {
                let text = reader.read_text(e.name()).map_err(|e| xml_error(part, e))?;
                value_text = Some(unescape(&text, part)?);
            }
            Ok(Event::Start(e)) if e.name().as_ref() == b"is" => {
                inline_text = Some(read_inline_string(reader, part)?);
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"c" => break,
            Ok(Event::Eof) => {
                return Err(SourceReadError::Xml {
                    part: part.to_string(),
                    reason: "unexpected EOF inside cell".to_string(),
                })
            }
            Err(e) => return Err(xml_error(part, e)),
            _ => {}
        }
        buf.clear();
    }

    match inline_text {
        Some(text) => Ok(CellValue::Text(text)),
        None => convert_value(value_text.as_deref(), cell_type.as_deref(), shared_strings),
    }
}

fn read_inline_string(reader: &mut Reader<&[u8]>, part: &str) -> Result<String> {
    let mut buf = Vec::new();
    let mut value = String::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.name().as_ref() == b"t" => {
                let text = reader.read_text(e.name()).map_err(|e| xml_error(part, e))?;
                value.push_str(&unescape(&text, part)?);
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"is" => break,
            Ok(Event::Eof) => {
                return Err(SourceReadError::Xml {
                    part: part.to_string(),
                    reason: "unexpected EOF inside inline string".to_string(),
                })
            }
            Err(e) => return Err(xml_error(part, e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(value)
}

/// Map a cell's raw `<v>` text and `t` attribute to a value.
///
/// Strings (shared, inline and formula results) become `Text`, numbers
/// `Number`, `b` cells `Bool`. Errors, blanks and anything unparseable are
/// `Unknown`.
fn convert_value(
    value_text: Option<&str>,
    cell_type: Option<&str>,
    shared_strings: &[String],
) -> Result<CellValue> {
    let Some(raw) = value_text else {
        return Ok(CellValue::Unknown);
    };
    let trimmed = raw.trim();

    match cell_type {
        Some("s") => {
            let idx = trimmed
                .parse::<usize>()
                .map_err(|_| SourceReadError::Xml {
                    part: SHARED_STRINGS_PART.to_string(),
                    reason: format!("bad shared string index '{trimmed}'"),
                })?;
            shared_strings
                .get(idx)
                .cloned()
                .map(CellValue::Text)
                .ok_or(SourceReadError::SharedStringOutOfBounds(idx))
        }
        Some("str") | Some("inlineStr") => Ok(CellValue::Text(raw.to_string())),
        Some("b") => Ok(match trimmed {
            "1" => CellValue::Bool(true),
            "0" => CellValue::Bool(false),
            _ => CellValue::Unknown,
        }),
        Some("e") => Ok(CellValue::Unknown),
        Some("n") | None => Ok(trimmed
            .parse::<f64>()
            .map(CellValue::Number)
            .unwrap_or(CellValue::Unknown)),
        Some(_) => Ok(CellValue::Unknown),
    }
}

fn build_table(rows: Vec<SheetRow>) -> Result<Table> {
    let mut rows = rows.into_iter();
    let header = rows.next().ok_or(SourceReadError::MissingHeader)?;
    let width = header.cells.keys().next_back().map_or(0, |last| last + 1);
    if width == 0 {
        return Err(SourceReadError::MissingHeader);
    }

    let headers = (0..width)
        .map(|col| {
            header
                .cells
                .get(&col)
                .map_or_else(|| CellValue::Unknown.to_string(), ToString::to_string)
        })
        .collect();

    let records = rows
        .map(|mut row| {
            (0..width)
                .map(|col| row.cells.remove(&col).unwrap_or(CellValue::Unknown))
                .collect()
        })
        .collect();

    Ok(Table::new(headers, records))
}

/// Convert an A1-style address to 0-based `(row, col)`.
pub fn address_to_index(a1: &str) -> Option<(u32, u32)> {
    let split = a1.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = a1.split_at(split);
    if letters.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut col: u32 = 0;
    for ch in letters.chars() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let upper = ch.to_ascii_uppercase() as u8;
        col = col.checked_mul(26)?.checked_add((upper - b'A' + 1) as u32)?;
    }

    let row: u32 = digits.parse().ok()?;
    Some((row.checked_sub(1)?, col - 1))
}

fn attr_value(element: &BytesStart<'_>, key: &[u8], part: &str) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| SourceReadError::Xml {
            part: part.to_string(),
            reason: e.to_string(),
        })?;
        if attr.key.as_ref() == key {
            let value = attr.unescape_value().map_err(|e| xml_error(part, e))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn unescape(text: &str, part: &str) -> Result<String> {
    quick_xml::escape::unescape(text)
        .map(|s| s.into_owned())
        .map_err(|e| SourceReadError::Xml {
            part: part.to_string(),
            reason: e.to_string(),
        })
}

fn xml_error(part: &str, err: impl std::fmt::Display) -> SourceReadError {
    SourceReadError::Xml {
        part: part.to_string(),
        reason: err.to_string(),
    }
}
