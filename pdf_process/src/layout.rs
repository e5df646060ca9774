//! Reading-order reconstruction from positioned text runs.

use crate::model::{LayoutOptions, TextRun};

/// Assemble one page's runs into lines of text.
///
/// Runs are grouped into rows by baseline (within `row_tolerance`), rows are ordered
/// top-to-bottom (descending `y`), and runs inside a row left-to-right. The gap between
/// neighbours decides the separator: a tab above `tab_gap`, a space above `space_gap`,
/// nothing otherwise. Rows are joined with `\n`; no trailing newline is added. Runs with a
/// non-finite position or width cannot be placed and are skipped.
#[must_use]
pub fn assemble_page(runs: &[TextRun], options: &LayoutOptions) -> String {
    let mut ordered: Vec<&TextRun> = runs
        .iter()
        .filter(|run| !run.text.is_empty() && is_placeable(run))
        .collect();
    if ordered.len() < runs.iter().filter(|run| !run.text.is_empty()).count() {
        tracing::debug!("skipped text runs without a finite position");
    }
    ordered.sort_by(|a, b| b.y.total_cmp(&a.y));

    let mut rows: Vec<Vec<&TextRun>> = Vec::new();
    let mut row_baseline = f32::NAN;
    for run in ordered {
        match rows.last_mut() {
            Some(row) if (row_baseline - run.y).abs() <= options.row_tolerance => row.push(run),
            _ => {
                row_baseline = run.y;
                rows.push(vec![run]);
            }
        }
    }

    rows.into_iter()
        .map(|mut row| {
            row.sort_by(|a, b| a.x.total_cmp(&b.x));
            join_row(&row, options)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_placeable(run: &TextRun) -> bool {
    run.x.is_finite() && run.y.is_finite() && run.width.is_finite()
}

fn join_row(row: &[&TextRun], options: &LayoutOptions) -> String {
    let mut line = String::new();
    let mut previous: Option<&TextRun> = None;
    for run in row {
        if let Some(prev) = previous {
            line.push_str(separator(prev, run, options));
        }
        line.push_str(&run.text);
        previous = Some(run);
    }
    line
}

fn separator(prev: &TextRun, next: &TextRun, options: &LayoutOptions) -> &'static str {
    let gap = next.x - prev.right();
    if gap > options.tab_gap {
        "\t"
    } else if gap > options.space_gap {
        if prev.text.ends_with(char::is_whitespace) || next.text.starts_with(char::is_whitespace)
        {
            ""
        } else {
            " "
        }
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(second_x: f32) -> String {
        let runs = [
            TextRun::new("Left", 0.0, 700.0, 40.0),
            TextRun::new("Right", second_x, 700.0, 40.0),
        ];
        assemble_page(&runs, &LayoutOptions::default())
    }

    #[test]
    fn wide_gap_becomes_tab() {
        assert_eq!(row(200.0), "Left\tRight");
    }

    #[test]
    fn small_gap_becomes_space() {
        assert_eq!(row(42.0), "Left Right");
    }

    #[test]
    fn touching_runs_are_joined() {
        assert_eq!(row(40.5), "LeftRight");
    }

    #[test]
    fn rows_are_ordered_top_to_bottom() {
        let runs = [
            TextRun::new("bottom", 10.0, 100.0, 30.0),
            TextRun::new("top", 10.0, 700.0, 20.0),
            TextRun::new("middle", 10.0, 400.0, 30.0),
        ];
        assert_eq!(
            assemble_page(&runs, &LayoutOptions::default()),
            "top\nmiddle\nbottom"
        );
    }

    #[test]
    fn baseline_jitter_stays_on_one_row() {
        let runs = [
            TextRun::new("world", 50.0, 499.2, 30.0),
            TextRun::new("hello", 10.0, 500.0, 30.0),
        ];
        assert_eq!(
            assemble_page(&runs, &LayoutOptions::default()),
            "hello world"
        );
    }

    #[test]
    fn explicit_space_is_not_doubled() {
        let runs = [
            TextRun::new("hello ", 10.0, 500.0, 30.0),
            TextRun::new("world", 45.0, 500.0, 30.0),
        ];
        assert_eq!(
            assemble_page(&runs, &LayoutOptions::default()),
            "hello world"
        );
    }

    #[test]
    fn runs_without_finite_position_are_skipped() {
        let runs = [
            TextRun::new("kept", 10.0, 700.0, 30.0),
            TextRun::new("lost", 10.0, f32::NAN, 30.0),
            TextRun::new("also", 50.0, 700.0, 30.0),
            TextRun::new("gone", f32::INFINITY, 700.0, 30.0),
            TextRun::new("wide", 90.0, 700.0, f32::NAN),
        ];
        assert_eq!(
            assemble_page(&runs, &LayoutOptions::default()),
            "kept also"
        );
    }

    #[test]
    fn empty_runs_are_skipped() {
        let runs = [TextRun::new("", 0.0, 10.0, 0.0)];
        assert_eq!(assemble_page(&runs, &LayoutOptions::default()), "");
    }
}
