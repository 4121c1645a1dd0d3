use std::io::{Cursor, Read, Seek};

use calamine::{Data, Reader, Xls, Xlsx};

use crate::error::ExtractError;

/// Rows read per sheet. Spreadsheets front-load their identifying content,
/// so a short prefix is enough for classification.
const ROW_CAP: usize = 20;

/// Extract cell text from XLSX bytes.
pub fn extract_xlsx(bytes: &[u8]) -> Result<String, ExtractError> {
    let workbook =
        Xlsx::new(Cursor::new(bytes)).map_err(|e| ExtractError::Malformed(e.to_string()))?;
    render_workbook(workbook)
}

/// Extract cell text from legacy XLS bytes.
pub fn extract_xls(bytes: &[u8]) -> Result<String, ExtractError> {
    let workbook =
        Xls::new(Cursor::new(bytes)).map_err(|e| ExtractError::Malformed(e.to_string()))?;
    render_workbook(workbook)
}

/// Render the first rows of every sheet, one line per row with cells joined
/// by ` | `. Sheets that fail to parse are skipped rather than failing the
/// whole workbook.
fn render_workbook<RS, R>(mut workbook: R) -> Result<String, ExtractError>
where
    RS: Read + Seek,
    R: Reader<RS>,
{
    let sheet_names = workbook.sheet_names();
    let mut lines = Vec::new();

    for name in sheet_names {
        let Ok(range) = workbook.worksheet_range(&name) else {
            continue;
        };
        for row in range.rows().take(ROW_CAP) {
            let cells: Vec<String> = row
                .iter()
                .filter(|cell| !matches!(cell, Data::Empty))
                .map(ToString::to_string)
                .filter(|text| !text.trim().is_empty())
                .collect();
            if !cells.is_empty() {
                lines.push(cells.join(" | "));
            }
        }
    }

    if lines.is_empty() {
        return Err(ExtractError::Empty);
    }
    Ok(lines.join("\n"))
}

// -- Tests ------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_xlsx_is_malformed() {
        assert!(matches!(
            extract_xlsx(b"not a workbook"),
            Err(ExtractError::Malformed(_))
        ));
    }

    #[test]
    fn garbage_xls_is_malformed() {
        assert!(matches!(
            extract_xls(b"not a workbook"),
            Err(ExtractError::Malformed(_))
        ));
    }
}
