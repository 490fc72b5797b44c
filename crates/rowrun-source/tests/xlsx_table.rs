//! Integration tests for loading xlsx workbooks from disk.

use std::io::Write;
use std::path::{Path, PathBuf};

use rowrun_core::RecordSource;
use rowrun_source::{read_xlsx, CellValue, SourceReadError, TableSlot};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
          xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets>
    <sheet name="Orders" sheetId="1" r:id="rId1"/>
    <sheet name="Other" sheetId="2" r:id="rId2"/>
  </sheets>
</workbook>"#;

const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/orders.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/other.xml"/>
</Relationships>"#;

const SHARED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="5" uniqueCount="5">
  <si><t>Item</t></si>
  <si><t>Qty</t></si>
  <si><t>Paid</t></si>
  <si><t>Bolts</t></si>
  <si><t>Nuts &amp; washers</t></si>
</sst>"#;

const ORDERS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <dimension ref="A1:C4"/>
  <sheetData>
    <row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c><c r="C1" t="s"><v>2</v></c></row>
    <row r="2"><c r="A2" t="s"><v>3</v></c><c r="B2"><v>40</v></c><c r="C2" t="b"><v>1</v></c></row>
    <row r="3"><c r="A3" t="s"><v>4</v></c><c r="B3"><v>12.5</v></c><c r="C3" t="e"><v>#N/A</v></c></row>
    <row r="4"><c r="A4" t="str"><f>UPPER("x")</f><v>X</v></c></row>
  </sheetData>
</worksheet>"#;

const OTHER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>wrong sheet</t></is></c></row></sheetData>
</worksheet>"#;

fn write_zip(path: &Path, parts: &[(&str, &str)]) {
    let file = std::fs::File::create(path).expect("create workbook");
    let mut zip = ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, body) in parts {
        zip.start_file(*name, options).expect("start part");
        zip.write_all(body.as_bytes()).expect("write part");
    }
    zip.finish().expect("finish workbook");
}

fn orders_workbook(dir: &Path) -> PathBuf {
    let path = dir.join("orders.xlsx");
    write_zip(
        &path,
        &[
            ("[Content_Types].xml", "<Types/>"),
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", RELS),
            ("xl/sharedStrings.xml", SHARED),
            ("xl/worksheets/orders.xml", ORDERS),
            ("xl/worksheets/other.xml", OTHER),
        ],
    );
    path
}

#[test]
fn loads_first_sheet_with_header_row() {
    let dir = tempfile::tempdir().expect("tempdir");
    let table = read_xlsx(orders_workbook(dir.path())).expect("load");

    assert_eq!(table.headers(), &["Item", "Qty", "Paid"]);
    assert_eq!(table.count(), 3);
    assert_eq!(
        table.rows()[0],
        vec![
            CellValue::Text("Bolts".into()),
            CellValue::Number(40.0),
            CellValue::Bool(true),
        ]
    );
    assert_eq!(
        table.rows()[1],
        vec![
            CellValue::Text("Nuts & washers".into()),
            CellValue::Number(12.5),
            CellValue::Unknown,
        ]
    );
    assert_eq!(
        table.rows()[2],
        vec![
            CellValue::Text("X".into()),
            CellValue::Unknown,
            CellValue::Unknown,
        ]
    );
}

#[test]
fn falls_back_to_sheet1_without_workbook_part() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bare.xlsx");
    write_zip(
        &path,
        &[(
            "xl/worksheets/sheet1.xml",
            r#"<worksheet><sheetData>
  <row r="1"><c r="A1" t="inlineStr"><is><t>Only</t></is></c></row>
  <row r="2"><c r="A2"><v>1</v></c></row>
</sheetData></worksheet>"#,
        )],
    );

    let table = read_xlsx(&path).expect("load");
    assert_eq!(table.headers(), &["Only"]);
    assert_eq!(table.rows()[0], vec![CellValue::Number(1.0)]);
}

#[test]
fn header_only_sheet_has_no_records() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("header.xlsx");
    write_zip(
        &path,
        &[(
            "xl/worksheets/sheet1.xml",
            r#"<worksheet><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>H</t></is></c></row></sheetData></worksheet>"#,
        )],
    );

    let table = read_xlsx(&path).expect("load");
    assert_eq!(table.width(), 1);
    assert!(table.is_empty());
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = read_xlsx(dir.path().join("nope.xlsx")).unwrap_err();
    assert!(matches!(err, SourceReadError::Io { .. }));
}

#[test]
fn non_zip_file_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("plain.xlsx");
    std::fs::write(&path, "not a workbook").expect("write");
    let err = read_xlsx(&path).unwrap_err();
    assert!(matches!(err, SourceReadError::NotZip { .. }));
}

#[test]
fn missing_sheet_part_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("broken.xlsx");
    write_zip(&path, &[("xl/workbook.xml", WORKBOOK), ("xl/_rels/workbook.xml.rels", RELS)]);
    let err = read_xlsx(&path).unwrap_err();
    assert!(matches!(err, SourceReadError::MissingPart { ref part } if part == "xl/worksheets/orders.xml"));
}

#[test]
fn failed_reload_keeps_previous_table() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut slot = TableSlot::new();
    slot.replace_with(read_xlsx(orders_workbook(dir.path())))
        .expect("first load");
    assert_eq!(slot.count(), 3);

    assert!(slot
        .replace_with(read_xlsx(dir.path().join("missing.xlsx")))
        .is_err());
    assert_eq!(slot.count(), 3);
    assert_eq!(
        slot.current().map(|t| t.headers().to_vec()),
        Some(vec!["Item".to_string(), "Qty".to_string(), "Paid".to_string()])
    );
}
