/// Text trend chart of history scores.
///
/// Plots two series against evaluation index: gibberish score (`*`) and
/// hallucination score (`o`). Points that land on the same cell are drawn as
/// `#`. One column per history item, oldest on the left.
use colored::Colorize;

use crate::api::HistoryItem;
use crate::theme::Palette;

const GIBBERISH_MARK: char = '*';
const HALLUCINATION_MARK: char = 'o';
const OVERLAP_MARK: char = '#';

/// Width of one plotted column, in characters.
const COLUMN_WIDTH: usize = 3;

/// Narrowest y-axis label column; widened when a bound label is longer.
const MIN_LABEL_WIDTH: usize = 4;

/// One named series of scores; point `i` belongs to evaluation index `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: &'static str,
    pub points: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendChart {
    pub gibberish: Series,
    pub hallucination: Series,
}

impl TrendChart {
    pub fn from_history(items: &[HistoryItem]) -> Self {
        Self {
            gibberish: Series {
                name: "gibberish score",
                points: items.iter().map(|i| i.gibberish_model_score).collect(),
            },
            hallucination: Series {
                name: "hallucination score",
                points: items.iter().map(|i| i.hallucination_model_score).collect(),
            },
        }
    }

    pub fn len(&self) -> usize {
        self.gibberish.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vertical range of the plot. Always covers `[0, 1]` and widens to fit
    /// out-of-range scores.
    fn bounds(&self) -> (f64, f64) {
        let all = self
            .gibberish
            .points
            .iter()
            .chain(&self.hallucination.points)
            .copied()
            .filter(|v| v.is_finite());
        all.fold((0.0_f64, 1.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)))
    }

    /// Render the chart as `height` plot rows plus axis, labels and legend.
    pub fn render(&self, height: usize, palette: &Palette) -> Vec<String> {
        if self.is_empty() {
            return Vec::new();
        }

        let height = height.max(2);
        let (lo, hi) = self.bounds();
        let row_of = |value: f64| -> Option<usize> {
            if !value.is_finite() {
                return None;
            }
            let ratio = (value - lo) / (hi - lo);
            Some(((1.0 - ratio) * (height - 1) as f64).round() as usize)
        };

        // grid[row][column]: which series occupy the cell
        let mut grid = vec![vec![(false, false); self.len()]; height];
        for (col, &v) in self.gibberish.points.iter().enumerate() {
            if let Some(row) = row_of(v) {
                grid[row][col].0 = true;
            }
        }
        for (col, &v) in self.hallucination.points.iter().enumerate() {
            if let Some(row) = row_of(v) {
                grid[row][col].1 = true;
            }
        }

        let hi_label = format!("{hi:.2}");
        let lo_label = format!("{lo:.2}");
        let label_width = hi_label.len().max(lo_label.len()).max(MIN_LABEL_WIDTH);

        let mut lines = Vec::with_capacity(height + 3);
        for (row, cells) in grid.iter().enumerate() {
            let label = if row == 0 {
                hi_label.as_str()
            } else if row == height - 1 {
                lo_label.as_str()
            } else {
                ""
            };

            let mut line = format!("{label:>label_width$} |");
            for &(gib, hal) in cells {
                let cell = match (gib, hal) {
                    (true, true) => OVERLAP_MARK.to_string().color(palette.accent).to_string(),
                    (true, false) => GIBBERISH_MARK
                        .to_string()
                        .color(palette.gibberish)
                        .to_string(),
                    (false, true) => HALLUCINATION_MARK
                        .to_string()
                        .color(palette.hallucination)
                        .to_string(),
                    (false, false) => " ".to_string(),
                };
                line.push(' ');
                line.push_str(&cell);
                line.push(' ');
            }
            lines.push(line.trim_end().to_string());
        }

        lines.push(format!(
            "{} +{}",
            " ".repeat(label_width),
            "-".repeat(self.len() * COLUMN_WIDTH)
        ));

        let mut labels = " ".repeat(label_width + 2);
        for index in 1..=self.len() {
            labels.push_str(&format!("{index:^COLUMN_WIDTH$}"));
        }
        lines.push(labels.trim_end().to_string());

        lines.push(format!(
            "{} {}   {} {}   {} both",
            GIBBERISH_MARK.to_string().color(palette.gibberish),
            self.gibberish.name,
            HALLUCINATION_MARK.to_string().color(palette.hallucination),
            self.hallucination.name,
            OVERLAP_MARK.to_string().color(palette.accent),
        ));

        lines
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::Theme;

    fn item(gibberish: f64, hallucination: f64) -> HistoryItem {
        HistoryItem {
            sentence: "s".to_string(),
            gibberish_model_class: "Clean".to_string(),
            gibberish_model_score: gibberish,
            hallucination_model_score: hallucination,
        }
    }

    fn count(lines: &[String], mark: char) -> usize {
        // Skip the legend line, which shows each mark once.
        lines[..lines.len() - 1]
            .iter()
            .map(|l| l.chars().filter(|&c| c == mark).count())
            .sum()
    }

    #[test]
    fn one_point_per_item_per_series() {
        colored::control::set_override(false);
        let chart = TrendChart::from_history(&[item(0.1, 0.9), item(0.5, 0.2), item(0.8, 0.7)]);
        assert_eq!(chart.gibberish.points.len(), 3);
        assert_eq!(chart.hallucination.points.len(), 3);

        let lines = chart.render(8, &Theme::Light.palette());
        assert_eq!(count(&lines, GIBBERISH_MARK), 3);
        assert_eq!(count(&lines, HALLUCINATION_MARK), 3);
    }

    #[test]
    fn equal_scores_overlap() {
        colored::control::set_override(false);
        let chart = TrendChart::from_history(&[item(0.4, 0.4)]);
        let lines = chart.render(5, &Theme::Dark.palette());
        assert_eq!(count(&lines, OVERLAP_MARK), 1);
        assert_eq!(count(&lines, GIBBERISH_MARK), 0);
    }

    #[test]
    fn extremes_land_on_top_and_bottom_rows() {
        colored::control::set_override(false);
        let chart = TrendChart::from_history(&[item(1.0, 0.0)]);
        let lines = chart.render(4, &Theme::Light.palette());
        assert!(lines[0].starts_with("1.00 |"));
        assert!(lines[0].contains('*'));
        assert!(lines[3].starts_with("0.00 |"));
        assert!(lines[3].contains('o'));
    }

    #[test]
    fn bounds_widen_for_out_of_range_scores() {
        let chart = TrendChart::from_history(&[item(1.5, -0.5)]);
        assert_eq!(chart.bounds(), (-0.5, 1.5));
    }

    #[test]
    fn wide_bound_labels_keep_rows_aligned() {
        colored::control::set_override(false);
        let chart = TrendChart::from_history(&[item(0.5, -0.5)]);
        let lines = chart.render(4, &Theme::Light.palette());

        assert!(lines[3].starts_with("-0.50 |"));
        let plot_rows = &lines[..4];
        for line in plot_rows {
            assert_eq!(line.find('|'), Some(6), "misaligned row: {line:?}");
        }
        assert_eq!(lines[4].find('+'), Some(6));
        // Index label sits under the plotted column.
        assert_eq!(lines[5].find('1'), Some(8));
    }

    #[test]
    fn labels_follow_evaluation_index() {
        colored::control::set_override(false);
        let chart = TrendChart::from_history(&[item(0.1, 0.2), item(0.3, 0.4)]);
        let lines = chart.render(4, &Theme::Light.palette());
        let labels = &lines[lines.len() - 2];
        assert_eq!(labels.trim(), "1  2");
    }

    #[test]
    fn empty_history_renders_nothing() {
        let chart = TrendChart::from_history(&[]);
        assert!(chart.is_empty());
        assert!(chart.render(8, &Theme::Light.palette()).is_empty());
    }
}
