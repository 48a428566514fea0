use super::GlobalArgs;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use console::style;
use fixity_lib::util::format_timestamp;
use fixity_lib::{BaselineFormat, BaselineStore, Overrides, Result};
use std::collections::BTreeMap;

pub fn handle_status_command(globals: &GlobalArgs) -> Result<()> {
    let config = globals.load_config(Overrides::default())?;
    let store = BaselineStore::new(&config.baseline_path);
    let baseline = store.load()?;

    if !baseline.exists() {
        println!(
            "{} No baseline at {}. Run 'fixity check <DIR>' to create one.",
            style("!").yellow(),
            store.path().display()
        );
        return Ok(());
    }

    let format = match baseline.format {
        BaselineFormat::Versioned => "versioned",
        BaselineFormat::Legacy => "legacy (flat map)",
        BaselineFormat::Missing => "missing",
    };

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Property").fg(Color::Cyan),
        Cell::new("Value").fg(Color::Cyan),
    ]);
    table.add_row(vec![Cell::new("Baseline"), Cell::new(store.path().display())]);
    table.add_row(vec![Cell::new("Format"), Cell::new(format)]);
    table.add_row(vec![
        Cell::new("Algorithm"),
        Cell::new(
            baseline
                .algorithm
                .map(|a| a.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ),
    ]);
    table.add_row(vec![
        Cell::new("Root"),
        Cell::new(baseline.root.as_deref().unwrap_or("-")),
    ]);
    table.add_row(vec![
        Cell::new("Created"),
        Cell::new(
            baseline
                .created_at
                .map(|dt| format_timestamp(&dt))
                .unwrap_or_else(|| "unknown".to_string()),
        ),
    ]);
    table.add_row(vec![
        Cell::new("Files"),
        Cell::new(baseline.snapshot.len()).fg(Color::Green),
    ]);

    println!("{}", table);

    if globals.verbose && !baseline.snapshot.is_empty() {
        let mut by_dir: BTreeMap<&str, usize> = BTreeMap::new();
        for key in baseline.snapshot.keys() {
            let top = key.split_once('/').map(|(dir, _)| dir).unwrap_or(".");
            *by_dir.entry(top).or_default() += 1;
        }

        let mut dirs = Table::new();
        dirs.load_preset(UTF8_FULL);
        dirs.set_header(vec![
            Cell::new("Top-level entry").fg(Color::Cyan),
            Cell::new("Files").fg(Color::Cyan),
        ]);
        for (dir, n) in by_dir {
            dirs.add_row(vec![Cell::new(dir), Cell::new(n)]);
        }
        println!("{}", dirs);
    }

    Ok(())
}
