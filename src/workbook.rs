//! XLSX export of the batch rows
//!
//! The workbook is written as a plain SpreadsheetML package: a ZIP holding
//! the content-type map, relationships, workbook, shared-string table and one
//! worksheet per non-empty row collection. No styling beyond the default.

use crate::report::{CellValue, Row};
use crate::AuditError;
use quick_xml::escape::escape;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const SHEET_PRESENT: &str = "Fotos Presentes";
pub const SHEET_ABSENT: &str = "Fotos Ausentes";
pub const SHEET_EXECUTION: &str = "Comunicação Execução";

/// Default file name for the exported workbook
pub const DEFAULT_OUTPUT: &str = "resultados_poda.xlsx";

const MAIN_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// A flat table: header columns plus rows aligned to them
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<Option<CellValue>>>,
}

impl Sheet {
    /// Build a table whose columns are the row keys in first-appearance order
    pub fn from_rows(name: &str, rows: &[Row]) -> Self {
        let mut columns: Vec<&'static str> = Vec::new();
        for row in rows {
            for (key, _) in row {
                if !columns.contains(key) {
                    columns.push(*key);
                }
            }
        }

        let rows = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|col| row.iter().find(|(k, _)| k == col).map(|(_, v)| v.clone()))
                    .collect()
            })
            .collect();

        Sheet {
            name: name.to_string(),
            columns,
            rows,
        }
    }
}

/// Ordered collection of sheets
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sheet unless `rows` is empty
    pub fn add_rows(&mut self, name: &str, rows: &[Row]) {
        if !rows.is_empty() {
            self.sheets.push(Sheet::from_rows(name, rows));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Write the XLSX package and hand the writer back
    pub fn write<W: Write + Seek>(&self, writer: W) -> Result<W, AuditError> {
        if self.sheets.is_empty() {
            return Err(AuditError::EmptyWorkbook);
        }

        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(writer);
        let mut strings = SharedStrings::default();

        // Worksheets first, so the shared-string table is complete afterwards
        let worksheets: Vec<String> = self
            .sheets
            .iter()
            .map(|sheet| worksheet_xml(sheet, &mut strings))
            .collect();

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(content_types_xml(self.sheets.len()).as_bytes())?;

        zip.start_file("_rels/.rels", options)?;
        zip.write_all(
            format!(
                r#"{XML_DECL}<Relationships xmlns="{PKG_REL_NS}"><Relationship Id="rId1" Type="{REL_NS}/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
            )
            .as_bytes(),
        )?;

        zip.start_file("xl/workbook.xml", options)?;
        zip.write_all(self.workbook_xml().as_bytes())?;

        zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        zip.write_all(workbook_rels_xml(self.sheets.len()).as_bytes())?;

        zip.start_file("xl/styles.xml", options)?;
        zip.write_all(styles_xml().as_bytes())?;

        zip.start_file("xl/sharedStrings.xml", options)?;
        zip.write_all(strings.to_xml().as_bytes())?;

        for (i, xml) in worksheets.iter().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)?;
            zip.write_all(xml.as_bytes())?;
        }

        Ok(zip.finish()?)
    }

    pub fn to_xlsx_bytes(&self) -> Result<Vec<u8>, AuditError> {
        Ok(self.write(Cursor::new(Vec::new()))?.into_inner())
    }

    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), AuditError> {
        let file = File::create(path)?;
        let mut writer = self.write(BufWriter::new(file))?;
        writer.flush()?;
        Ok(())
    }

    fn workbook_xml(&self) -> String {
        let sheets: String = self
            .sheets
            .iter()
            .enumerate()
            .map(|(i, sheet)| {
                format!(
                    r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
                    escape(&sheet_name(&sheet.name)),
                    i + 1,
                    i + 1
                )
            })
            .collect();
        format!(r#"{XML_DECL}<workbook xmlns="{MAIN_NS}" xmlns:r="{REL_NS}"><sheets>{sheets}</sheets></workbook>"#)
    }
}

/// Deduplicated cell strings, indexed in insertion order
#[derive(Default)]
struct SharedStrings {
    index: HashMap<String, usize>,
    values: Vec<String>,
}

impl SharedStrings {
    fn intern(&mut self, s: &str) -> usize {
        if let Some(&i) = self.index.get(s) {
            return i;
        }
        let i = self.values.len();
        self.values.push(s.to_string());
        self.index.insert(s.to_string(), i);
        i
    }

    fn to_xml(&self) -> String {
        let items: String = self
            .values
            .iter()
            .map(|v| format!(r#"<si><t xml:space="preserve">{}</t></si>"#, escape(&xml_safe(v))))
            .collect();
        format!(
            r#"{XML_DECL}<sst xmlns="{MAIN_NS}" count="{n}" uniqueCount="{n}">{items}</sst>"#,
            n = self.values.len()
        )
    }
}

fn worksheet_xml(sheet: &Sheet, strings: &mut SharedStrings) -> String {
    let mut data = String::new();

    let header: Vec<Option<CellValue>> = sheet
        .columns
        .iter()
        .map(|c| Some(CellValue::Text(c.to_string())))
        .collect();

    for (r, row) in std::iter::once(&header).chain(sheet.rows.iter()).enumerate() {
        data.push_str(&format!(r#"<row r="{}">"#, r + 1));
        for (c, cell) in row.iter().enumerate() {
            let reference = format!("{}{}", column_name(c), r + 1);
            match cell {
                Some(CellValue::Text(s)) => {
                    data.push_str(&format!(r#"<c r="{}" t="s"><v>{}</v></c>"#, reference, strings.intern(s)));
                }
                Some(CellValue::Number(n)) => {
                    data.push_str(&format!(r#"<c r="{}"><v>{}</v></c>"#, reference, format_number(*n)));
                }
                None => {}
            }
        }
        data.push_str("</row>");
    }

    let last = format!("{}{}", column_name(sheet.columns.len().saturating_sub(1)), sheet.rows.len() + 1);
    format!(r#"{XML_DECL}<worksheet xmlns="{MAIN_NS}"><dimension ref="A1:{last}"/><sheetData>{data}</sheetData></worksheet>"#)
}

fn content_types_xml(sheet_count: usize) -> String {
    let sheets: String = (1..=sheet_count)
        .map(|i| {
            format!(
                r#"<Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
            )
        })
        .collect();
    format!(
        concat!(
            r#"{}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
            r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
            r#"<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#,
            "{}</Types>"
        ),
        XML_DECL, sheets
    )
}

fn workbook_rels_xml(sheet_count: usize) -> String {
    let mut rels: String = (1..=sheet_count)
        .map(|i| {
            format!(r#"<Relationship Id="rId{i}" Type="{REL_NS}/worksheet" Target="worksheets/sheet{i}.xml"/>"#)
        })
        .collect();
    rels.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="{REL_NS}/styles" Target="styles.xml"/>"#,
        sheet_count + 1
    ));
    rels.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="{REL_NS}/sharedStrings" Target="sharedStrings.xml"/>"#,
        sheet_count + 2
    ));
    format!(r#"{XML_DECL}<Relationships xmlns="{PKG_REL_NS}">{rels}</Relationships>"#)
}

fn styles_xml() -> String {
    format!(
        concat!(
            r#"{}<styleSheet xmlns="{}">"#,
            r#"<fonts count="1"><font><sz val="11"/><name val="Calibri"/></font></fonts>"#,
            r#"<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>"#,
            r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#,
            r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
            r#"<cellXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/></cellXfs>"#,
            r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
            "</styleSheet>"
        ),
        XML_DECL, MAIN_NS
    )
}

/// Spreadsheet column letters: 0 -> A, 25 -> Z, 26 -> AA
fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

/// Drop characters XML 1.0 cannot carry
fn xml_safe(s: &str) -> String {
    s.chars()
        .filter(|&c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .collect()
}

/// Sheet names are limited to 31 characters and exclude `[]:*?/\`
fn sheet_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(31)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&'static str, &str)]) -> Row {
        pairs.iter().map(|(k, v)| (*k, CellValue::from(*v))).collect()
    }

    #[test]
    fn test_column_name() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn test_columns_in_first_appearance_order() {
        let rows = vec![
            row(&[("Projeto", "1"), ("Nota", "a")]),
            row(&[("Projeto", "2"), ("Nota", "b"), ("Faltantes", "x")]),
        ];
        let sheet = Sheet::from_rows(SHEET_ABSENT, &rows);
        assert_eq!(sheet.columns, ["Projeto", "Nota", "Faltantes"]);
        assert_eq!(sheet.rows[0][2], None);
        assert_eq!(sheet.rows[1][2], Some(CellValue::from("x")));
    }

    #[test]
    fn test_empty_collections_are_skipped() {
        let mut wb = Workbook::new();
        wb.add_rows(SHEET_PRESENT, &[]);
        wb.add_rows(SHEET_EXECUTION, &[row(&[("TOTAL_GERAL", "3")])]);
        assert_eq!(wb.sheets.len(), 1);
        assert!(wb.sheet(SHEET_EXECUTION).is_some());
    }

    #[test]
    fn test_empty_workbook_is_an_error() {
        assert!(matches!(Workbook::new().to_xlsx_bytes(), Err(AuditError::EmptyWorkbook)));
    }

    #[test]
    fn test_shared_strings_are_escaped_and_deduplicated() {
        let mut strings = SharedStrings::default();
        assert_eq!(strings.intern("a < b & c"), 0);
        assert_eq!(strings.intern("x"), 1);
        assert_eq!(strings.intern("a < b & c"), 0);
        let xml = strings.to_xml();
        assert!(xml.contains("a &lt; b &amp; c"));
        assert!(xml.contains(r#"uniqueCount="2""#));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(12.0), "12");
        assert_eq!(format_number(1.5), "1.5");
    }
}
