use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

/// Read the first worksheet of an `.xlsx` workbook as rows of cell strings.
///
/// Cells are placed by their reference (`C7` lands in column 2), so gaps in sparse
/// rows come back as empty strings. Numbers are returned as written in the sheet.
pub fn read_xlsx_rows(p: &Path) -> Result<Vec<Vec<String>>, String> {
    let file = File::open(p).map_err(|e| format!("Open .xlsx failed: {e}"))?;
    let mut zip = ZipArchive::new(file).map_err(|e| format!("Open .xlsx zip failed: {e}"))?;

    let shared = match read_entry(&mut zip, "xl/sharedStrings.xml")? {
        Some(xml) => parse_shared_strings(&xml)?,
        None => Vec::new(),
    };

    let sheet = first_worksheet(&mut zip).ok_or_else(|| "Missing worksheet".to_string())?;
    let xml = read_entry(&mut zip, &sheet)?.ok_or_else(|| format!("Open {sheet} failed"))?;
    parse_sheet_xml(&xml, &shared)
}

// ---- Internal helpers ----

/// Largest column Excel allows (`XFD`), 1-based.
const MAX_COLUMNS: usize = 16_384;

fn read_entry(zip: &mut ZipArchive<File>, name: &str) -> Result<Option<String>, String> {
    let Ok(mut entry) = zip.by_name(name) else {
        return Ok(None);
    };
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| format!("Read {name} failed: {e}"))?;
    Ok(Some(xml))
}

/// The first sheet in workbook order, falling back to the lowest-numbered
/// worksheet part when the workbook or its relationships are unreadable.
fn first_worksheet(zip: &mut ZipArchive<File>) -> Option<String> {
    let workbook = read_entry(zip, "xl/workbook.xml").ok().flatten();
    let rels = read_entry(zip, "xl/_rels/workbook.xml.rels").ok().flatten();
    if let (Some(workbook), Some(rels)) = (workbook, rels) {
        if let Some(target) = first_sheet_target(&workbook, &rels) {
            if zip.file_names().any(|n| n == target) {
                return Some(target);
            }
        }
    }
    let names: Vec<&str> = zip.file_names().collect();
    fallback_worksheet(&names)
}

/// Resolve the first `<sheet>` of `workbook.xml` to its part name via the
/// workbook relationships.
fn first_sheet_target(workbook: &str, rels: &str) -> Option<String> {
    let rel_id = first_attr(workbook, b"sheet", b"id")?;

    let mut reader = Reader::from_str(rels);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let mut id = None;
                let mut target = None;
                for attr in e.attributes().flatten() {
                    let value = attr.unescape_value().ok()?.into_owned();
                    match attr.key.as_ref() {
                        b"Id" => id = Some(value),
                        b"Target" => target = Some(value),
                        _ => {}
                    }
                }
                if id.as_deref() == Some(rel_id.as_str()) {
                    let target = target?;
                    return Some(match target.strip_prefix('/') {
                        Some(absolute) => absolute.to_string(),
                        None => format!("xl/{target}"),
                    });
                }
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
        buf.clear();
    }
}

/// Value of the first `attr` (by local name) on the first `element`.
fn first_attr(xml: &str, element: &[u8], attr: &[u8]) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if local_name(e.name().as_ref()) == element => {
                return e
                    .attributes()
                    .flatten()
                    .find(|a| local_name(a.key.as_ref()) == attr)
                    .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()));
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
        buf.clear();
    }
}

/// `sheet1.xml` if present, otherwise the worksheet part with the lowest number
/// (`sheet2.xml` before `sheet10.xml`).
fn fallback_worksheet(names: &[&str]) -> Option<String> {
    let mut sheets: Vec<&str> = names
        .iter()
        .copied()
        .filter(|n| n.starts_with("xl/worksheets/") && n.ends_with(".xml"))
        .filter(|n| !n["xl/worksheets/".len()..].contains('/'))
        .collect();
    if sheets.contains(&"xl/worksheets/sheet1.xml") {
        return Some("xl/worksheets/sheet1.xml".to_string());
    }
    let number = |name: &str| -> Option<u64> {
        name.trim_start_matches("xl/worksheets/sheet")
            .trim_end_matches(".xml")
            .parse()
            .ok()
    };
    sheets.sort_by_key(|n| (number(n).is_none(), number(n), *n));
    sheets.first().map(|s| s.to_string())
}

fn parse_shared_strings(xml: &str) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut out = Vec::new();
    let mut current = String::new();
    let mut in_t = false;
    // Phonetic runs repeat the reading of the string; skip them.
    let mut in_phonetic = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"si" => current.clear(),
                b"rPh" => in_phonetic = true,
                b"t" if !in_phonetic => in_t = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if local_name(e.name().as_ref()) == b"si" {
                    out.push(String::new());
                }
            }
            Ok(Event::End(e)) => match local_name(e.name().as_ref()) {
                b"si" => out.push(std::mem::take(&mut current)),
                b"rPh" => in_phonetic = false,
                b"t" => in_t = false,
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if in_t {
                    current.push_str(&t.unescape().map_err(|e| e.to_string())?);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("Parse sharedStrings.xml failed: {e}")),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

#[derive(Default)]
struct CellState {
    column: usize,
    kind: String,
    value: String,
    in_value: bool,
}

fn parse_sheet_xml(xml: &str, shared: &[String]) -> Result<Vec<Vec<String>>, String> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut row: Option<Vec<String>> = None;
    let mut cell: Option<CellState> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match local_name(e.name().as_ref()) {
                b"row" => row = Some(Vec::new()),
                b"c" => {
                    let next = row.as_ref().map(Vec::len).unwrap_or(0);
                    cell = Some(open_cell(&e, next)?);
                }
                b"v" | b"t" => {
                    if let Some(c) = cell.as_mut() {
                        c.in_value = true;
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => match local_name(e.name().as_ref()) {
                b"row" => rows.push(Vec::new()),
                b"c" => {
                    let next = row.as_ref().map(Vec::len).unwrap_or(0);
                    let empty = open_cell(&e, next)?;
                    if let Some(r) = row.as_mut() {
                        place(r, empty.column, String::new());
                    }
                }
                _ => {}
            },
            Ok(Event::End(e)) => match local_name(e.name().as_ref()) {
                b"row" => {
                    if let Some(r) = row.take() {
                        rows.push(r);
                    }
                }
                b"c" => {
                    if let (Some(c), Some(r)) = (cell.take(), row.as_mut()) {
                        let text = resolve_cell(&c, shared)?;
                        place(r, c.column, text);
                    }
                }
                b"v" | b"t" => {
                    if let Some(c) = cell.as_mut() {
                        c.in_value = false;
                    }
                }
                _ => {}
            },
            Ok(Event::Text(t)) => {
                if let Some(c) = cell.as_mut().filter(|c| c.in_value) {
                    c.value.push_str(&t.unescape().map_err(|e| e.to_string())?);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("Parse worksheet XML failed: {e}")),
            _ => {}
        }
        buf.clear();
    }
    Ok(rows)
}

fn open_cell(e: &BytesStart<'_>, next_column: usize) -> Result<CellState, String> {
    let mut state = CellState {
        column: next_column,
        kind: "n".to_string(),
        ..CellState::default()
    };
    for attr in e.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let value = attr.unescape_value().map_err(|e| e.to_string())?;
        match attr.key.as_ref() {
            b"r" => {
                if let Some(col) = column_index(&value)? {
                    state.column = col;
                }
            }
            b"t" => state.kind = value.into_owned(),
            _ => {}
        }
    }
    Ok(state)
}

fn resolve_cell(cell: &CellState, shared: &[String]) -> Result<String, String> {
    if cell.kind != "s" {
        return Ok(cell.value.clone());
    }
    let idx: usize = cell
        .value
        .trim()
        .parse()
        .map_err(|_| format!("Bad shared string index {:?}", cell.value))?;
    shared
        .get(idx)
        .cloned()
        .ok_or_else(|| format!("Shared string index {idx} out of range"))
}

fn place(row: &mut Vec<String>, column: usize, text: String) {
    if row.len() <= column {
        row.resize(column + 1, String::new());
    }
    row[column] = text;
}

/// `"AB12"` -> `Ok(Some(27))`, `"12"` -> `Ok(None)`. Columns past `XFD` are an error.
fn column_index(reference: &str) -> Result<Option<usize>, String> {
    let letters = reference.bytes().take_while(u8::is_ascii_alphabetic);
    let mut n = 0usize;
    let mut seen = false;
    for b in letters {
        seen = true;
        let digit = (b.to_ascii_uppercase() - b'A' + 1) as usize;
        n = n
            .checked_mul(26)
            .and_then(|n| n.checked_add(digit))
            .filter(|&n| n <= MAX_COLUMNS)
            .ok_or_else(|| format!("Bad cell reference {reference:?}"))?;
    }
    Ok(seen.then(|| n - 1))
}

fn local_name(name: &[u8]) -> &[u8] {
    match name.iter().rposition(|&b| b == b':') {
        Some(i) => &name[i + 1..],
        None => name,
    }
}
