use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

pub fn create_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            header
                .iter()
                .map(|label| Cell::new(*label).fg(TableColor::Cyan)),
        );
    table
}

pub fn archived_cell(archived: bool) -> Cell {
    if archived {
        Cell::new("archived").fg(TableColor::DarkGrey)
    } else {
        Cell::new("active").fg(TableColor::Green)
    }
}

pub fn pipeline_status_cell(status: &str) -> Cell {
    let color = match status {
        "success" => TableColor::Green,
        "failed" => TableColor::Red,
        "canceled" | "skipped" => TableColor::DarkGrey,
        _ => TableColor::Yellow,
    };
    Cell::new(status).fg(color)
}

/// Age in years; unknown ages (negative sentinel) render as `?`.
pub fn age_cell(age_years: f64) -> Cell {
    if age_years < 0.0 {
        return Cell::new("?").fg(TableColor::DarkGrey);
    }

    let text = format!("{age_years:.2}y");
    if age_years >= 3.0 {
        Cell::new(text).fg(TableColor::Red)
    } else if age_years >= 1.0 {
        Cell::new(text).fg(TableColor::Yellow)
    } else {
        Cell::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_cell_sentinel() {
        let table = {
            let mut table = create_table(&["Age"]);
            table.add_row(vec![age_cell(-1.0)]);
            table.add_row(vec![age_cell(2.5)]);
            table
        };

        let rendered = table.to_string();
        assert!(rendered.contains('?'));
        assert!(rendered.contains("2.50y"));
    }
}
