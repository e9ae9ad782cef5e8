//! Terminal rendering of the activity catalog.

use slotgrab_core::{Activity, Catalog};
use unicode_width::UnicodeWidthStr;

const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

const HEADERS: [&str; 3] = ["ID", "Name", "Opens at"];

fn cells(activity: &Activity) -> [&str; 3] {
    [&activity.id, &activity.name, &activity.opens_at_raw]
}

/// Terminal column width: wide CJK glyphs take two cells, accents and
/// punctuation one.
fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

fn pad(s: &str, width: usize) -> String {
    let fill = width.saturating_sub(display_width(s));
    format!("{}{}", s, " ".repeat(fill))
}

/// Render the catalog as a table. Online activities are highlighted when
/// `color` is set.
pub fn render(catalog: &Catalog, color: bool) -> String {
    let widths: Vec<usize> = HEADERS
        .iter()
        .enumerate()
        .map(|(i, header)| {
            catalog
                .iter()
                .map(|a| display_width(cells(a)[i]))
                .fold(display_width(header), usize::max)
        })
        .collect();

    let border = format!(
        "+{}+",
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+")
    );
    let row = |values: [&str; 3]| {
        let inner: Vec<String> = values
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!(" {} ", pad(cell, *width)))
            .collect();
        format!("|{}|", inner.join("|"))
    };

    let mut out = vec![border.clone(), row(HEADERS), border.clone()];
    for activity in catalog.iter() {
        let line = row(cells(activity));
        if color && activity.is_online() {
            out.push(format!("{}{}{}", RED, line, RESET));
        } else {
            out.push(line);
        }
    }
    out.push(border);
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotgrab_core::testing::fixtures;

    fn catalog() -> Catalog {
        vec![
            fixtures::activity("w1", "Seminar", "2030-01-01 00:00:00"),
            fixtures::activity("w22", "线上讲座", "2030-01-02 19:00:00"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_display_width() {
        assert_eq!(display_width("abc"), 3);
        assert_eq!(display_width("线上"), 4);
        assert_eq!(display_width("Café"), 4);
        assert_eq!(display_width("Tea – Talk"), 10);
    }

    #[test]
    fn test_render_plain() {
        let table = render(&catalog(), false);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 6);
        assert_eq!(lines[1], "| ID  | Name     | Opens at            |");
        assert_eq!(lines[3], "| w1  | Seminar  | 2030-01-01 00:00:00 |");
        assert_eq!(lines[4], "| w22 | 线上讲座 | 2030-01-02 19:00:00 |");
        assert!(!table.contains(RED));
    }

    #[test]
    fn test_render_aligns_accents_next_to_cjk() {
        let catalog: Catalog = vec![
            fixtures::activity("w1", "Café", "2030-01-01 00:00:00"),
            fixtures::activity("w2", "Tea – Talk", "2030-01-01 00:00:00"),
            fixtures::activity("w3", "线上讲座", "2030-01-01 00:00:00"),
        ]
        .into_iter()
        .collect();
        let table = render(&catalog, false);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[3], "| w1 | Café       | 2030-01-01 00:00:00 |");
        assert_eq!(lines[4], "| w2 | Tea – Talk | 2030-01-01 00:00:00 |");
        assert_eq!(lines[5], "| w3 | 线上讲座   | 2030-01-01 00:00:00 |");
        let border = display_width(lines[0]);
        assert!(lines.iter().all(|line| display_width(line) == border));
    }

    #[test]
    fn test_render_highlights_online() {
        let table = render(&catalog(), true);
        let lines: Vec<&str> = table.lines().collect();

        assert!(!lines[3].starts_with(RED));
        assert!(lines[4].starts_with(RED));
        assert!(lines[4].ends_with(RESET));
    }

    #[test]
    fn test_render_empty() {
        let table = render(&Catalog::new(), true);
        assert_eq!(table.lines().count(), 4);
    }
}
