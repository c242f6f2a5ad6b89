use ratatui::{
    Frame,
    layout::{Position, Rect},
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::model::{NO_DATA_MESSAGE, NO_MATCH_MESSAGE, TableLayout, UIData, ViewState};

pub struct TableUI;

impl TableUI {
    pub fn new() -> Self {
        TableUI
    }

    pub fn draw(&self, uidata: &UIData, frame: &mut Frame) {
        let area = frame.area();
        let layout = &uidata.layout;

        let title = Line::from(format!(" {} ", uidata.title).bold().yellow());
        render_line(frame, area, 0, Paragraph::new(title));

        render_line(
            frame,
            area,
            layout.header_row,
            Paragraph::new(header_line(uidata)),
        );
        render_line(
            frame,
            area,
            layout.filter_row,
            Paragraph::new(filter_line(uidata)),
        );

        let body = Rect {
            x: area.x,
            y: area.y.saturating_add(layout.body_top),
            width: area.width,
            height: layout.body_height,
        }
        .intersection(area);
        if !body.is_empty() {
            match uidata.view_state {
                ViewState::Rows => {
                    let lines: Vec<Line> = uidata
                        .rows
                        .iter()
                        .map(|row| row_line(row, layout))
                        .collect();
                    frame.render_widget(Paragraph::new(lines), body);
                }
                ViewState::NoData => {
                    frame.render_widget(
                        Paragraph::new(NO_DATA_MESSAGE.italic().dim()).centered(),
                        body,
                    );
                }
                ViewState::NoMatches => {
                    frame.render_widget(
                        Paragraph::new(NO_MATCH_MESSAGE.italic().dim()).centered(),
                        body,
                    );
                }
            }
        }

        render_line(
            frame,
            area,
            layout.status_row,
            Paragraph::new(uidata.status_message.clone().dim()),
        );

        // Put the terminal cursor into the focused filter box.
        if let Some(column) = uidata.focused_column {
            let (x, width) = layout.columns[column];
            let cx = x + (uidata.cursor_pos as u16).min(width.saturating_sub(1));
            let position = Position::new(area.x + cx, area.y + layout.filter_row);
            if area.contains(position) {
                frame.set_cursor_position(position);
            }
        }
    }
}

fn render_line(frame: &mut Frame, area: Rect, y: u16, paragraph: Paragraph) {
    let rect = Rect {
        x: area.x,
        y: area.y.saturating_add(y),
        width: area.width,
        height: 1,
    }
    .intersection(area);
    if !rect.is_empty() {
        frame.render_widget(paragraph, rect);
    }
}

fn header_line(uidata: &UIData) -> Line<'static> {
    let mut spans = Vec::new();
    for (header, (_, width)) in uidata.headers.iter().zip(uidata.layout.columns.iter()) {
        spans.push(Span::styled(
            pad_cell(header, *width, false),
            Style::new().bold(),
        ));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

fn filter_line(uidata: &UIData) -> Line<'static> {
    let mut spans = Vec::new();
    for (idx, (text, (_, width))) in uidata
        .filters
        .iter()
        .zip(uidata.layout.columns.iter())
        .enumerate()
    {
        let style = if uidata.focused_column == Some(idx) {
            Style::new().reversed()
        } else {
            Style::new().underlined().dim()
        };
        spans.push(Span::styled(pad_cell(text, *width, false), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

fn row_line(row: &[String; 4], layout: &TableLayout) -> Line<'static> {
    let [date, source, count, status] = row;
    let columns = &layout.columns;
    let status_style = if status == "true" {
        Style::new().green()
    } else {
        Style::new().red()
    };
    Line::from(vec![
        Span::raw(pad_cell(date, columns[0].1, false)),
        Span::raw(" "),
        Span::raw(pad_cell(source, columns[1].1, false)),
        Span::raw(" "),
        Span::raw(pad_cell(count, columns[2].1, true)),
        Span::raw(" "),
        Span::styled(pad_cell(status, columns[3].1, false), status_style),
    ])
}

fn pad_cell(text: &str, width: u16, right_align: bool) -> String {
    let width = width as usize;
    let clipped: String = text.chars().take(width).collect();
    let padding = " ".repeat(width.saturating_sub(clipped.chars().count()));
    if right_align {
        format!("{padding}{clipped}")
    } else {
        format!("{clipped}{padding}")
    }
}
