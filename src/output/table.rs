#![forbid(unsafe_code)]

use std::io;

use crate::task::model::Task;

const HEADERS: [&str; 4] = ["ID", "TITLE", "DESCRIPTION", "COMPLETED"];

/// Plain-text rendering of a task list for non-interactive output.
#[derive(Debug)]
pub struct TaskTable {
    rows: Vec<[String; 4]>,
}

impl TaskTable {
    #[must_use]
    pub fn new(tasks: &[Task]) -> Self {
        let rows = tasks
            .iter()
            .map(|t| {
                [
                    t.id.map(|id| id.to_string()).unwrap_or_default(),
                    t.title.clone(),
                    t.description.clone(),
                    t.completed_label().to_owned(),
                ]
            })
            .collect();
        Self { rows }
    }

    pub fn print(&self) -> io::Result<()> {
        self.write_to(io::stdout().lock())
    }

    pub fn write_csv(&self, out: impl io::Write) -> io::Result<()> {
        let mut wtr = csv::Writer::from_writer(out);
        wtr.write_record(HEADERS)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_to(&self, mut out: impl io::Write) -> io::Result<()> {
        let mut widths = HEADERS.map(visible_width);
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(visible_width(cell));
            }
        }

        writeln!(out, "{}", format_row(&HEADERS, &widths))?;
        for row in &self.rows {
            writeln!(out, "{}", format_row(row, &widths))?;
        }
        Ok(())
    }
}

fn visible_width(s: impl AsRef<str>) -> usize {
    // Counts chars; wide glyphs are not accounted for.
    s.as_ref().chars().count()
}

fn format_row(row: &[impl AsRef<str>], widths: &[usize]) -> String {
    let cells: Vec<String> = row
        .iter()
        .zip(widths)
        .map(|(cell, &w)| format!("{:<w$}", cell.as_ref()))
        .collect();
    cells.join("  ").trim_end().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tasks() -> Vec<Task> {
        vec![
            Task {
                id: Some(1),
                ..Task::new("A", "d")
            },
            Task {
                id: Some(12),
                completed: true,
                ..Task::new("Buy milk", "2%, organic")
            },
        ]
    }

    #[test]
    fn aligns_columns() {
        let mut out = Vec::new();
        TaskTable::new(&tasks()).write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "ID  TITLE     DESCRIPTION  COMPLETED");
        assert_eq!(lines[1], "1   A         d            False");
        assert_eq!(lines[2], "12  Buy milk  2%, organic  True");
    }

    #[test]
    fn csv_quotes_commas() {
        let mut out = Vec::new();
        TaskTable::new(&tasks()).write_csv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("ID,TITLE,DESCRIPTION,COMPLETED\n"));
        assert!(text.contains("12,Buy milk,\"2%, organic\",True"));
    }

    #[test]
    fn empty_list_prints_only_headers() {
        let mut out = Vec::new();
        TaskTable::new(&[]).write_to(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "ID  TITLE  DESCRIPTION  COMPLETED\n");
    }
}
