use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use shipyard::application::{RebuildReport, RunReport};

fn base_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.iter().map(|h| Cell::new(h).fg(Color::Cyan)));
    table
}

/// One row per project, in input order.
pub fn build_summary(report: &RunReport) -> Table {
    let mut table = base_table(&["Project", "Status", "Service", "Port", "Image"]);

    for result in &report.results {
        let allocation = report.allocation_for(result);
        let (status, image) = match (result.built(), result.error()) {
            (Some(built), _) => (
                Cell::new("built").fg(Color::Green),
                built.image.reference(),
            ),
            (_, Some(error)) => (
                Cell::new(error.to_string().lines().next().unwrap_or_default()).fg(Color::Red),
                String::new(),
            ),
            _ => (Cell::new("-"), String::new()),
        };

        table.add_row(vec![
            Cell::new(&result.name),
            status,
            Cell::new(allocation.map(|a| a.service_name.as_str()).unwrap_or("-")),
            Cell::new(allocation.map(|a| a.port.to_string()).unwrap_or_else(|| "-".to_string())),
            Cell::new(image),
        ]);
    }
    table
}

pub fn rebuild_summary(report: &RebuildReport) -> Table {
    let mut table = base_table(&["Project", "Service", "Port", "Replicas"]);
    for allocation in &report.allocations {
        let service = if report.missing_services.contains(&allocation.service_name) {
            Cell::new(format!("{} (missing)", allocation.service_name)).fg(Color::Yellow)
        } else {
            Cell::new(&allocation.service_name)
        };
        table.add_row(vec![
            Cell::new(&allocation.name),
            service,
            Cell::new(allocation.port),
            Cell::new(allocation.replicas),
        ]);
    }
    table
}
