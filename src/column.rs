//! Column letter names and A1 range expressions
//!
//! Spreadsheet columns are named with a bijective base-26 numbering: there is
//! no zero digit, so column 26 is `Z` and column 27 is `AA`.

use crate::error::{Result, SheetError};

const LETTERS: u32 = 26;

/// Convert a 1-based column index to its letter name (1 -> A, 27 -> AA)
///
/// # Examples
///
/// ```
/// use sheetlog::column::column_name;
///
/// assert_eq!(column_name(1).unwrap(), "A");
/// assert_eq!(column_name(702).unwrap(), "ZZ");
/// assert!(column_name(0).is_err());
/// ```
pub fn column_name(index: u32) -> Result<String> {
    if index == 0 {
        return Err(SheetError::InvalidColumnIndex(index));
    }

    let mut name = Vec::new();
    let mut n = index;
    while n > 0 {
        n -= 1;
        name.push(b'A' + (n % LETTERS) as u8);
        n /= LETTERS;
    }
    name.reverse();

    // Only ASCII letters were pushed
    Ok(name.into_iter().map(char::from).collect())
}

/// Convert a column letter name back to its 1-based index (AA -> 27)
///
/// Lowercase letters are accepted.
pub fn column_index(name: &str) -> Result<u32> {
    if name.is_empty() {
        return Err(SheetError::InvalidColumnName(name.to_string()));
    }

    name.bytes().try_fold(0u32, |acc, b| {
        let b = b.to_ascii_uppercase();
        if !b.is_ascii_uppercase() {
            return Err(SheetError::InvalidColumnName(name.to_string()));
        }
        acc.checked_mul(LETTERS)
            .and_then(|acc| acc.checked_add(u32::from(b - b'A') + 1))
            .ok_or_else(|| SheetError::InvalidColumnName(name.to_string()))
    })
}

/// Prefix an A1 cell expression with a tab name.
///
/// The tab name is always quoted (embedded quotes doubled) so titles with
/// spaces or punctuation resolve. An empty tab name leaves the expression
/// bare, which the service resolves against the first tab.
pub fn sheet_range(sheet: &str, cells: &str) -> String {
    if sheet.is_empty() {
        cells.to_string()
    } else {
        format!("'{}'!{}", sheet.replace('\'', "''"), cells)
    }
}

/// Range covering a single column from `first_row` to `last_row` (1-based).
pub fn column_span(sheet: &str, column: u32, first_row: u32, last_row: u32) -> Result<String> {
    let col = column_name(column)?;
    Ok(sheet_range(
        sheet,
        &format!("{}{}:{}{}", col, first_row, col, last_row),
    ))
}

/// Range covering the first `columns` cells of a row.
pub fn row_span(sheet: &str, row: u32, columns: u32) -> Result<String> {
    let last = column_name(columns)?;
    Ok(sheet_range(sheet, &format!("A{}:{}{}", row, last, row)))
}
