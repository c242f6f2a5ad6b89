use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveDate;
use ratatui::crossterm::event::KeyEvent;
use tracing::{debug, trace, warn};

use crate::domain::{ColumnKey, LrvError, Message, SortConfig, SortDirection};
use crate::inputter::Inputter;
use crate::warehouse::LoadRecord;

pub const NO_DATA_MESSAGE: &str = "No initial data found";
pub const NO_MATCH_MESSAGE: &str = "No records match the current filters";

const DATE_WIDTH: u16 = 12;
const COUNT_WIDTH: u16 = 14;
const STATUS_WIDTH: u16 = 8;
const MIN_SOURCE_WIDTH: u16 = 6;

#[derive(Debug, PartialEq)]
pub enum Status {
    Ready,
    Quitting,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewState {
    NoData,
    NoMatches,
    Rows,
}

/// Screen geometry of the rendered table. The controller feeds raw click
/// coordinates into the model, which resolves them against these rows and
/// column spans; the filter row and the header row are disjoint, so a click
/// in a filter box can never double as a sort toggle.
#[derive(Debug, Clone, Default)]
pub struct TableLayout {
    pub width: u16,
    pub height: u16,
    pub header_row: u16,
    pub filter_row: u16,
    pub body_top: u16,
    pub body_height: u16,
    pub status_row: u16,
    /// (x, width) per column, display order.
    pub columns: [(u16, u16); 4],
}

impl TableLayout {
    pub fn from_size(width: u16, height: u16) -> Self {
        let status_row = height.saturating_sub(1);
        let layout = TableLayout {
            width,
            height,
            header_row: 1,
            filter_row: 2,
            body_top: 3,
            body_height: status_row.saturating_sub(3),
            status_row,
            columns: Self::column_spans(width),
        };
        trace!("Built TableLayout: {:?}", layout);
        layout
    }

    fn column_spans(width: u16) -> [(u16, u16); 4] {
        let fixed = DATE_WIDTH + COUNT_WIDTH + STATUS_WIDTH + 3;
        let source_width = std::cmp::max(width.saturating_sub(fixed), MIN_SOURCE_WIDTH);

        let mut spans = [(0u16, 0u16); 4];
        let mut x = 0;
        let widths = [DATE_WIDTH, source_width, COUNT_WIDTH, STATUS_WIDTH];
        for (span, w) in spans.iter_mut().zip(widths) {
            *span = (x, w);
            x += w + 1;
        }
        spans
    }

    pub fn column_at(&self, x: u16) -> Option<ColumnKey> {
        for (key, (cx, cw)) in ColumnKey::ALL.iter().zip(self.columns.iter()) {
            if x >= *cx && x < cx + cw {
                return Some(*key);
            }
        }
        None
    }
}

/// Snapshot of everything the UI needs for one frame.
pub struct UIData {
    pub title: String,
    pub headers: Vec<String>,
    pub filters: Vec<String>,
    pub focused_column: Option<usize>,
    pub cursor_pos: usize,
    pub rows: Vec<[String; 4]>,
    pub view_state: ViewState,
    pub layout: TableLayout,
    pub status_message: String,
}

impl UIData {
    fn empty() -> Self {
        UIData {
            title: String::new(),
            headers: Vec::new(),
            filters: Vec::new(),
            focused_column: None,
            cursor_pos: 0,
            rows: Vec::new(),
            view_state: ViewState::NoData,
            layout: TableLayout::default(),
            status_message: String::new(),
        }
    }
}

/// Stringify one cell for filtering. A null date yields None and therefore
/// never matches an active filter.
pub fn cell_text(record: &LoadRecord, key: ColumnKey) -> Option<String> {
    match key {
        ColumnKey::LoadDate => record.load_date.clone(),
        ColumnKey::Source => Some(record.source.clone()),
        ColumnKey::RecordCount => Some(record.record_count.to_string()),
        ColumnKey::LoadStatus => Some(record.load_status.to_string()),
    }
}

fn matches_filters(record: &LoadRecord, filters: &HashMap<ColumnKey, String>) -> bool {
    filters
        .iter()
        .filter(|(_, needle)| !needle.is_empty())
        .all(|(key, needle)| match cell_text(record, *key) {
            Some(value) => value.to_lowercase().contains(&needle.to_lowercase()),
            None => false,
        })
}

fn text_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b))
}

/// Base ascending comparator, dispatched on the column's declared type.
/// A null date sorts below every present date.
fn compare_records(a: &LoadRecord, b: &LoadRecord, key: ColumnKey) -> Ordering {
    match key {
        ColumnKey::LoadDate => match (a.load_date.as_deref(), b.load_date.as_deref()) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => text_cmp(x, y),
        },
        ColumnKey::Source => text_cmp(&a.source, &b.source),
        ColumnKey::RecordCount => a.record_count.cmp(&b.record_count),
        ColumnKey::LoadStatus => a.load_status.cmp(&b.load_status),
    }
}

/// Pure derivation: filter, then sort, producing an index mapping into
/// `records`. Descending negates the whole base comparison, which is what
/// pushes null dates to the bottom of the default view.
pub fn derive_view(
    records: &[LoadRecord],
    filters: &HashMap<ColumnKey, String>,
    sort: &SortConfig,
) -> Vec<usize> {
    let mut view: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, record)| matches_filters(record, filters))
        .map(|(idx, _)| idx)
        .collect();

    if let Some(key) = sort.key {
        view.sort_by(|&ia, &ib| {
            let base = compare_records(&records[ia], &records[ib], key);
            match sort.direction {
                SortDirection::Ascending => base,
                SortDirection::Descending => base.reverse(),
            }
        });
    }
    view
}

/// Format a normalized date string for display. Never panics: an
/// unparseable value is logged and shown raw.
pub fn display_load_date(value: Option<&str>) -> String {
    let raw = match value {
        None | Some("") => return "N/A".to_string(),
        Some(s) => s,
    };
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => date.format("%Y-%m-%d").to_string(),
        Err(e) => {
            warn!("Could not parse load_date {raw:?}: {e}");
            if raw.is_empty() {
                "Invalid Date".to_string()
            } else {
                raw.to_string()
            }
        }
    }
}

pub struct Model {
    title: String,
    records: Vec<LoadRecord>,
    filters: HashMap<ColumnKey, String>,
    sort: SortConfig,
    view: Vec<usize>,
    focused_filter: Option<ColumnKey>,
    input: Inputter,
    offset_row: usize,
    layout: TableLayout,
    uidata: UIData,
    pub status: Status,
}

impl Model {
    /// Takes the normalized record array exactly once. There is no re-fetch
    /// and no way to swap the records afterwards; filters and sort start
    /// from their defaults on every construction.
    pub fn new(records: Vec<LoadRecord>, title: String, ui_width: u16, ui_height: u16) -> Self {
        let mut model = Self {
            title,
            records,
            filters: HashMap::new(),
            sort: SortConfig::default(),
            view: Vec::new(),
            focused_filter: None,
            input: Inputter::default(),
            offset_row: 0,
            layout: TableLayout::from_size(ui_width, ui_height),
            uidata: UIData::empty(),
            status: Status::Ready,
        };
        model.update_view();
        model
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    pub fn filter_active(&self) -> bool {
        self.focused_filter.is_some()
    }

    pub fn update(&mut self, message: Message) -> Result<(), LrvError> {
        trace!("Update: {message:?}");
        match message {
            Message::Quit => self.status = Status::Quitting,
            Message::Resize(width, height) => self.ui_resize(width, height),
            Message::Click(x, y) => self.handle_click(x, y),
            Message::SortByColumn(key) => self.toggle_sort(key),
            Message::FocusNextFilter => self.focus_next_filter(),
            Message::UnfocusFilter => self.unfocus_filter(),
            Message::RawKey(key) => self.raw_input(key),
            Message::MoveUp => self.scroll_up(1),
            Message::MoveDown => self.scroll_down(1),
            Message::MovePageUp => self.scroll_up(self.layout.body_height as usize),
            Message::MovePageDown => self.scroll_down(self.layout.body_height as usize),
            Message::MoveBeginning => {
                self.offset_row = 0;
                self.update_uidata();
            }
            Message::MoveEnd => {
                self.offset_row = self.view.len();
                self.clamp_offset();
                self.update_uidata();
            }
        }
        Ok(())
    }

    fn handle_click(&mut self, x: u16, y: u16) {
        // Filter boxes swallow their clicks; only a direct header hit sorts.
        if y == self.layout.filter_row {
            if let Some(key) = self.layout.column_at(x) {
                self.focus_filter(key);
            }
        } else if y == self.layout.header_row {
            if let Some(key) = self.layout.column_at(x) {
                self.toggle_sort(key);
            }
        }
    }

    fn toggle_sort(&mut self, key: ColumnKey) {
        if self.sort.key == Some(key) {
            self.sort.direction = self.sort.direction.flip();
        } else {
            self.sort = SortConfig {
                key: Some(key),
                direction: SortDirection::Ascending,
            };
        }
        debug!("Sorting by {:?} {:?}", key, self.sort.direction);
        self.update_view();
    }

    fn focus_filter(&mut self, key: ColumnKey) {
        self.focused_filter = Some(key);
        self.input
            .set(self.filters.get(&key).map(String::as_str).unwrap_or(""));
        self.update_uidata();
    }

    fn focus_next_filter(&mut self) {
        let next = match self.focused_filter {
            None => ColumnKey::ALL[0],
            Some(key) => ColumnKey::ALL[(key.index() + 1) % ColumnKey::ALL.len()],
        };
        self.focus_filter(next);
    }

    fn unfocus_filter(&mut self) {
        self.focused_filter = None;
        self.input.clear();
        self.update_uidata();
    }

    /// Every keystroke lands in the focused filter and re-derives the view
    /// immediately. There is no debounce and no apply step.
    fn raw_input(&mut self, key: KeyEvent) {
        if let Some(column) = self.focused_filter {
            let result = self.input.read(key);
            self.filters.insert(column, result.input);
            self.update_view();
        }
    }

    fn ui_resize(&mut self, width: u16, height: u16) {
        trace!(
            "UI was resized! w:{}->{}, h:{}->{}",
            self.layout.width, width, self.layout.height, height
        );
        self.layout = TableLayout::from_size(width, height);
        self.update_view();
    }

    fn scroll_up(&mut self, size: usize) {
        self.offset_row = self.offset_row.saturating_sub(size);
        self.update_uidata();
    }

    fn scroll_down(&mut self, size: usize) {
        self.offset_row += size;
        self.clamp_offset();
        self.update_uidata();
    }

    fn clamp_offset(&mut self) {
        let body = std::cmp::max(self.layout.body_height as usize, 1);
        let max_offset = self.view.len().saturating_sub(body);
        if self.offset_row > max_offset {
            self.offset_row = max_offset;
        }
    }

    fn update_view(&mut self) {
        self.view = derive_view(&self.records, &self.filters, &self.sort);
        self.clamp_offset();
        self.update_uidata();
    }

    fn update_uidata(&mut self) {
        let view_state = if self.records.is_empty() {
            ViewState::NoData
        } else if self.view.is_empty() {
            ViewState::NoMatches
        } else {
            ViewState::Rows
        };

        let headers = ColumnKey::ALL
            .iter()
            .map(|key| {
                let mut header = key.title().to_string();
                if self.sort.key == Some(*key) {
                    header.push(' ');
                    header.push(match self.sort.direction {
                        SortDirection::Ascending => '▲',
                        SortDirection::Descending => '▼',
                    });
                }
                header
            })
            .collect();

        let filters = ColumnKey::ALL
            .iter()
            .map(|key| self.filters.get(key).cloned().unwrap_or_default())
            .collect();

        let rbegin = self.offset_row;
        let rend = std::cmp::min(
            rbegin + self.layout.body_height as usize,
            self.view.len(),
        );
        let rows = self.view[rbegin..rend]
            .iter()
            .map(|&idx| {
                let record = &self.records[idx];
                [
                    display_load_date(record.load_date.as_deref()),
                    record.source.clone(),
                    record.record_count.to_string(),
                    record.load_status.to_string(),
                ]
            })
            .collect();

        let sort_label = match self.sort.key {
            Some(key) => format!(
                "{} {}",
                key.title(),
                match self.sort.direction {
                    SortDirection::Ascending => "asc",
                    SortDirection::Descending => "desc",
                }
            ),
            None => "none".to_string(),
        };
        let status_message = format!(
            "{}/{} rows | sort: {} | q quit, Tab filter, click a header to sort",
            self.view.len(),
            self.records.len(),
            sort_label
        );

        self.uidata = UIData {
            title: self.title.clone(),
            headers,
            filters,
            focused_column: self.focused_filter.map(|key| key.index()),
            cursor_pos: self.input.get().curser_pos,
            rows,
            view_state,
            layout: self.layout.clone(),
            status_message,
        };
    }
}
