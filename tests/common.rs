//! Shared fixtures: minimal in-memory `.xlsx` and `.docx` builders plus a
//! mock PDF engine, so the pipeline is testable without LibreOffice.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use report_card_server::generator::template::document_text;
use report_card_server::generator::{PdfEngine, RenderError};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// One spreadsheet cell in a fixture workbook.
#[allow(dead_code)]
pub enum Cell {
    Str(&'static str),
    Num(f64),
    Empty,
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn column_ref(mut column: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (column % 26) as u8);
        if column < 26 {
            break;
        }
        column = column / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).expect("column letters are ascii")
}

/// Write a minimal single-sheet workbook readable by calamine.
#[allow(dead_code)]
pub fn build_xlsx(path: &Path, rows: &[Vec<Cell>]) {
    let mut sheet = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (row_index, row) in rows.iter().enumerate() {
        sheet.push_str(&format!(r#"<row r="{}">"#, row_index + 1));
        for (col_index, cell) in row.iter().enumerate() {
            let cell_ref = format!("{}{}", column_ref(col_index), row_index + 1);
            match cell {
                Cell::Str(value) => sheet.push_str(&format!(
                    r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                    cell_ref,
                    xml_escape(value)
                )),
                Cell::Num(value) => {
                    sheet.push_str(&format!(r#"<c r="{cell_ref}"><v>{value}</v></c>"#))
                }
                Cell::Empty => {}
            }
        }
        sheet.push_str("</row>");
    }
    sheet.push_str("</sheetData></worksheet>");

    let parts: &[(&str, String)] = &[
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#
                .to_string(),
        ),
        (
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
                .to_string(),
        ),
        (
            "xl/workbook.xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#
                .to_string(),
        ),
        (
            "xl/_rels/workbook.xml.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#
                .to_string(),
        ),
        ("xl/worksheets/sheet1.xml", sheet),
    ];

    write_archive(path, parts);
}

/// Write a minimal docx. Each paragraph is a list of runs, so a placeholder
/// can be split across formatting boundaries on purpose.
#[allow(dead_code)]
pub fn build_docx(path: &Path, paragraphs: &[&[&str]]) {
    let mut body = String::new();
    for runs in paragraphs {
        body.push_str("<w:p>");
        for run in *runs {
            body.push_str(&format!(
                r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#,
                xml_escape(run)
            ));
        }
        body.push_str("</w:p>");
    }

    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );

    let parts: &[(&str, String)] = &[
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#
                .to_string(),
        ),
        (
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#
                .to_string(),
        ),
        ("word/document.xml", document),
    ];

    write_archive(path, parts);
}

fn write_archive(path: &Path, parts: &[(&str, String)]) {
    let file = File::create(path).expect("create fixture archive");
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    for (name, content) in parts {
        writer.start_file(*name, options).expect("start zip entry");
        writer
            .write_all(content.as_bytes())
            .expect("write zip entry");
    }
    writer.finish().expect("finish zip");
}

/// Engine stand-in: "exports" by dumping the docx's visible text into the
/// .pdf file, so tests can assert on rendered content.
#[derive(Default)]
pub struct MockEngine {
    pub calls: Mutex<Vec<PathBuf>>,
    pub fail_for_stem: Option<String>,
}

#[allow(dead_code)]
impl MockEngine {
    pub fn failing_for(stem: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_for_stem: Some(stem.to_string()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl PdfEngine for MockEngine {
    fn export_pdf(&self, document: &Path, output_dir: &Path) -> Result<PathBuf, RenderError> {
        self.calls.lock().unwrap().push(document.to_path_buf());

        let stem = document
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document")
            .to_string();
        if self.fail_for_stem.as_deref() == Some(&stem) {
            return Err(RenderError::EngineExit {
                status: 1,
                stderr: "mock engine failure".to_string(),
            });
        }

        let text = document_text(document)?.join("\n");
        let pdf_path = output_dir.join(format!("{stem}.pdf"));
        std::fs::write(&pdf_path, text).map_err(RenderError::WriteFilled)?;
        Ok(pdf_path)
    }
}
