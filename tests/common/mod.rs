//! In-memory spreadsheet used by the integration tests

#![allow(dead_code)]

use sheetlog::column::column_index;
use sheetlog::gateway::{
    AddSheetReply, BatchUpdateResponse, Reply, Request, Sheet, SheetProperties, SheetsGateway,
    Spreadsheet, ValueRange,
};
use sheetlog::{CellValue, Result, SheetError, SpreadsheetOptions};
use std::sync::Mutex;

/// A recorded gateway call
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetSpreadsheet,
    GetValues(String),
    Append(String, Vec<Vec<CellValue>>),
    Update(String, Vec<Vec<CellValue>>),
    Batch(Vec<Request>),
}

struct Tab {
    id: i64,
    title: String,
    /// rows[0] is sheet row 1
    rows: Vec<Vec<CellValue>>,
}

struct State {
    tabs: Vec<Tab>,
    calls: Vec<Call>,
    next_id: i64,
    fail_on: Option<&'static str>,
}

pub struct FakeSheets {
    state: Mutex<State>,
}

pub fn options() -> SpreadsheetOptions {
    SpreadsheetOptions::new("logger@example.com", "private-key", "spreadsheet-1")
}

pub fn text(s: &str) -> CellValue {
    CellValue::String(s.to_string())
}

pub fn text_row(cells: &[&str]) -> Vec<CellValue> {
    cells.iter().map(|c| text(c)).collect()
}

impl FakeSheets {
    /// Spreadsheet with a single empty tab "Sheet1" (id 0)
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                tabs: vec![Tab {
                    id: 0,
                    title: "Sheet1".to_string(),
                    rows: Vec::new(),
                }],
                calls: Vec::new(),
                next_id: 100,
                fail_on: None,
            }),
        }
    }

    pub fn with_tab(self, id: i64, title: &str, rows: Vec<Vec<CellValue>>) -> Self {
        self.state.lock().unwrap().tabs.push(Tab {
            id,
            title: title.to_string(),
            rows,
        });
        self
    }

    /// Replace the content of an existing tab
    pub fn set_rows(&self, title: &str, rows: Vec<Vec<CellValue>>) {
        let mut state = self.state.lock().unwrap();
        let tab = state
            .tabs
            .iter_mut()
            .find(|t| t.title == title)
            .expect("unknown tab");
        tab.rows = rows;
    }

    /// Make the named operation fail ("get", "values", "append", "update", "batch")
    pub fn fail_on(&self, op: Option<&'static str>) {
        self.state.lock().unwrap().fail_on = op;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn rows(&self, title: &str) -> Vec<Vec<CellValue>> {
        let state = self.state.lock().unwrap();
        state
            .tabs
            .iter()
            .find(|t| t.title == title)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    pub fn tab_titles(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.tabs.iter().map(|t| t.title.clone()).collect()
    }

    fn check(state: &State, op: &str) -> Result<()> {
        if state.fail_on == Some(op) {
            return Err(SheetError::Api {
                status: 503,
                message: format!("{} unavailable", op),
            });
        }
        Ok(())
    }
}

/// Split `'Tab'!A1:B2` into the tab title and the cell part
fn split_range(range: &str) -> (String, &str) {
    match range.rsplit_once('!') {
        Some((tab, cells)) => {
            let tab = tab
                .strip_prefix('\'')
                .and_then(|t| t.strip_suffix('\''))
                .unwrap_or(tab)
                .replace("''", "'");
            (tab, cells)
        }
        None => (String::new(), range),
    }
}

/// `C12` -> (column index 0-based, row index 0-based)
fn parse_cell(cell: &str) -> (usize, usize) {
    let split = cell.find(|c: char| c.is_ascii_digit()).unwrap();
    let col = column_index(&cell[..split]).unwrap() as usize - 1;
    let row: usize = cell[split..].parse().unwrap();
    (col, row - 1)
}

fn tab_mut<'a>(state: &'a mut State, title: &str) -> Result<&'a mut Tab> {
    if title.is_empty() {
        return Ok(&mut state.tabs[0]);
    }
    state
        .tabs
        .iter_mut()
        .find(|t| t.title == title)
        .ok_or_else(|| SheetError::Api {
            status: 400,
            message: format!("Unable to parse range: {}", title),
        })
}

/// `null` cells leave the existing value in place, as the service does
fn write_cells(tab: &mut Tab, col: usize, row: usize, rows: &[Vec<CellValue>]) {
    for (r, cells) in rows.iter().enumerate() {
        let target = row + r;
        while tab.rows.len() <= target {
            tab.rows.push(Vec::new());
        }
        let line = &mut tab.rows[target];
        for (c, value) in cells.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            while line.len() <= col + c {
                line.push(CellValue::Empty);
            }
            line[col + c] = value.clone();
        }
    }
}

impl SheetsGateway for FakeSheets {
    async fn get_spreadsheet(&self, _spreadsheet_id: &str) -> Result<Spreadsheet> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::GetSpreadsheet);
        Self::check(&state, "get")?;

        Ok(Spreadsheet {
            sheets: state
                .tabs
                .iter()
                .map(|t| Sheet {
                    properties: SheetProperties {
                        sheet_id: t.id,
                        title: t.title.clone(),
                    },
                })
                .collect(),
        })
    }

    async fn get_values(&self, _spreadsheet_id: &str, range: &str) -> Result<ValueRange> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::GetValues(range.to_string()));
        Self::check(&state, "values")?;

        let (title, cells) = split_range(range);
        let (start, end) = cells.split_once(':').unwrap_or((cells, cells));
        let (c0, r0) = parse_cell(start);
        let (c1, r1) = parse_cell(end);

        let tab = tab_mut(&mut state, &title)?;
        let mut out: Vec<Vec<CellValue>> = (r0..=r1)
            .map(|r| {
                let line = tab.rows.get(r).cloned().unwrap_or_default();
                let mut cells: Vec<CellValue> = (c0..=c1)
                    .map(|c| line.get(c).cloned().unwrap_or_default())
                    .collect();
                while cells.last().is_some_and(|c| c.is_blank()) {
                    cells.pop();
                }
                // The service reports formatted text
                cells
                    .into_iter()
                    .map(|c| CellValue::String(c.as_string()))
                    .collect()
            })
            .collect();
        while out.last().is_some_and(|r| r.is_empty()) {
            out.pop();
        }

        Ok(ValueRange {
            range: Some(range.to_string()),
            major_dimension: Some("ROWS".to_string()),
            values: if out.is_empty() { None } else { Some(out) },
        })
    }

    async fn append_values(
        &self,
        _spreadsheet_id: &str,
        range: &str,
        rows: Vec<Vec<CellValue>>,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(Call::Append(range.to_string(), rows.clone()));
        Self::check(&state, "append")?;

        let (title, cells) = split_range(range);
        let (col, _) = parse_cell(cells.split(':').next().unwrap_or(cells));
        let tab = tab_mut(&mut state, &title)?;
        let after = tab
            .rows
            .iter()
            .rposition(|r| r.iter().any(|c| !c.is_blank()))
            .map_or(0, |i| i + 1);
        write_cells(tab, col, after, &rows);
        Ok(())
    }

    async fn update_values(
        &self,
        _spreadsheet_id: &str,
        range: &str,
        rows: Vec<Vec<CellValue>>,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push(Call::Update(range.to_string(), rows.clone()));
        Self::check(&state, "update")?;

        let (title, cells) = split_range(range);
        let (col, row) = parse_cell(cells.split(':').next().unwrap_or(cells));
        let tab = tab_mut(&mut state, &title)?;
        write_cells(tab, col, row, &rows);
        Ok(())
    }

    async fn batch_update(
        &self,
        _spreadsheet_id: &str,
        requests: Vec<Request>,
    ) -> Result<BatchUpdateResponse> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Batch(requests.clone()));
        Self::check(&state, "batch")?;

        let mut replies = Vec::new();
        for request in requests {
            match request {
                Request::AddSheet(add) => {
                    let id = state.next_id;
                    state.next_id += 1;
                    state.tabs.push(Tab {
                        id,
                        title: add.properties.title.clone(),
                        rows: Vec::new(),
                    });
                    replies.push(Reply {
                        add_sheet: Some(AddSheetReply {
                            properties: SheetProperties {
                                sheet_id: id,
                                title: add.properties.title,
                            },
                        }),
                    });
                }
                Request::DeleteDimension(delete) => {
                    let range = delete.range;
                    let tab = state
                        .tabs
                        .iter_mut()
                        .find(|t| t.id == range.sheet_id)
                        .ok_or_else(|| SheetError::Api {
                            status: 400,
                            message: format!("No grid with id: {}", range.sheet_id),
                        })?;
                    let start = range.start_index as usize;
                    let end = (range.end_index as usize).min(tab.rows.len());
                    if start < end {
                        tab.rows.drain(start..end);
                    }
                    replies.push(Reply::default());
                }
            }
        }

        Ok(BatchUpdateResponse { replies })
    }
}
