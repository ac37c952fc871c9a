//! Interactive selection menu.
//!
//! Generic over the input and output streams so the whole loop runs
//! against in-memory buffers in tests.

use std::io::{BufRead, Write};

use crate::catalog::{Catalog, parse_selection};

/// How the menu session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The user confirmed the selection; render and save.
    Generate,
    /// The user quit without generating.
    Quit,
}

/// Run the menu loop until the user generates or quits.
///
/// End of input counts as quitting.
pub fn run<R: BufRead, W: Write>(
    catalog: &mut Catalog,
    mut input: R,
    mut output: W,
) -> anyhow::Result<Outcome> {
    loop {
        display(catalog, &mut output)?;
        if update_selection(catalog, &mut input, &mut output)? == Outcome::Quit {
            return Ok(Outcome::Quit);
        }
        preview(catalog, &mut output)?;

        writeln!(output, "\n1. Generate configuration")?;
        writeln!(output, "2. Modify selections")?;
        writeln!(output, "3. Exit")?;
        write!(output, "\nYour choice (1-3): ")?;
        output.flush()?;

        let Some(choice) = read_line(&mut input)? else {
            return Ok(Outcome::Quit);
        };
        match choice.trim() {
            "1" => return Ok(Outcome::Generate),
            "2" => {}
            "3" => return Ok(Outcome::Quit),
            other => writeln!(output, "Invalid choice: {other}")?,
        }
    }
}

/// Print the numbered item listing with enable checkmarks.
fn display<W: Write>(catalog: &Catalog, output: &mut W) -> anyhow::Result<()> {
    writeln!(
        output,
        "\n{} device setup ({})",
        catalog.device_info.friendly_name, catalog.device_info.name
    )?;

    writeln!(output, "\nSensors:")?;
    for (index, sensor) in catalog.sensors.iter().enumerate() {
        let mark = if sensor.enabled { "x" } else { " " };
        writeln!(output, "{}. [{mark}] {}", index + 1, sensor.name)?;
        if !sensor.description.is_empty() {
            writeln!(output, "   {}", sensor.description)?;
        }
    }

    writeln!(output, "\nSwitches:")?;
    let offset = catalog.sensors.len();
    for (index, switch) in catalog.switches.iter().enumerate() {
        let mark = if switch.enabled { "x" } else { " " };
        writeln!(output, "{}. [{mark}] {}", offset + index + 1, switch.name)?;
        if !switch.description.is_empty() {
            writeln!(output, "   {}", switch.description)?;
        }
    }
    Ok(())
}

/// Prompt for a selection until one is accepted or the user quits.
///
/// An empty line keeps the current selection.
fn update_selection<R: BufRead, W: Write>(
    catalog: &mut Catalog,
    input: &mut R,
    output: &mut W,
) -> anyhow::Result<Outcome> {
    loop {
        writeln!(
            output,
            "\nEnter the numbers to enable (comma-separated, e.g. 1,3)."
        )?;
        writeln!(output, "Press Enter to keep the current selection, 'q' to quit.")?;
        write!(output, "\nYour selection: ")?;
        output.flush()?;

        let Some(line) = read_line(input)? else {
            return Ok(Outcome::Quit);
        };
        let line = line.trim();
        if line.eq_ignore_ascii_case("q") {
            return Ok(Outcome::Quit);
        }
        if line.is_empty() {
            return Ok(Outcome::Generate);
        }
        match parse_selection(line) {
            Ok(selections) => {
                for selection in catalog.apply_selection(&selections) {
                    writeln!(output, "Invalid selection: {selection}")?;
                }
                return Ok(Outcome::Generate);
            }
            Err(err) => writeln!(output, "{err}")?,
        }
    }
}

/// Show what the generated file will contain.
fn preview<W: Write>(catalog: &Catalog, output: &mut W) -> anyhow::Result<()> {
    let sensors = catalog.enabled_sensor_names();
    let switches = catalog.enabled_switch_names();

    writeln!(output, "\nEnabled sensors:")?;
    for name in &sensors {
        writeln!(output, "   - {name}")?;
    }
    writeln!(output, "Enabled switches:")?;
    for name in &switches {
        writeln!(output, "   - {name}")?;
    }
    if sensors.is_empty() && switches.is_empty() {
        writeln!(output, "Warning: nothing is enabled!")?;
    }
    Ok(())
}

/// Read one line, returning `None` at end of input.
fn read_line<R: BufRead>(input: &mut R) -> anyhow::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}
