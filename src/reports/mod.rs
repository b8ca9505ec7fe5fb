use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use logosim::automaton::rule::{decode_label, transition_table};
use logosim::geometry::GenePool;
use logosim::optimizer::runner::Population;
use logosim::optimizer::PathGenerator;
use strum::IntoEnumIterator;

fn row_glyphs(line: &[u8]) -> String {
    line.iter().map(|&c| if c == 1 { '#' } else { '.' }).collect()
}

pub fn print_rule_table(rule: u8) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let entries = transition_table(rule);
    let mut header = vec![Cell::new(format!("Rule {} {}", rule, decode_label(rule)))
        .add_attribute(Attribute::Bold)];
    header.extend(
        entries
            .iter()
            .map(|(pattern, _)| Cell::new(*pattern).set_alignment(CellAlignment::Center)),
    );
    table.add_row(header);

    let mut outputs = vec![Cell::new("next")];
    outputs.extend(entries.iter().map(|&(_, on)| {
        let cell = Cell::new(if on { "1" } else { "0" }).set_alignment(CellAlignment::Center);
        if on {
            cell.fg(Color::Green)
        } else {
            cell
        }
    }));
    table.add_row(outputs);

    println!("\n{}", table);
}

/// The newest `count` rows of the history.
pub fn print_ca_tail(lines: &[Vec<u8>], count: usize) {
    if lines.is_empty() || count == 0 {
        println!("\nNo CA rows generated.");
        return;
    }
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);
    table.add_row(vec![
        Cell::new("Step").add_attribute(Attribute::Bold),
        Cell::new(format!("Row ({} of {})", count.min(lines.len()), lines.len()))
            .add_attribute(Attribute::Bold),
    ]);
    if let Some(col) = table.column_mut(0) {
        col.set_cell_alignment(CellAlignment::Right);
    }

    let start = lines.len().saturating_sub(count);
    for (step, line) in lines.iter().enumerate().skip(start) {
        table.add_row(vec![Cell::new(step), Cell::new(row_glyphs(line))]);
    }
    println!("\n{}", table);
}

pub fn print_tsp_summary(pool: &GenePool, population: &Population) {
    let Some(best) = population.best() else {
        println!("\nNo population was generated.");
        return;
    };

    let fitnesses: Vec<f64> = population.members.iter().map(|m| m.fitness).collect();
    let mean = fitnesses.iter().sum::<f64>() / fitnesses.len() as f64;
    let worst = fitnesses.iter().copied().fold(f64::MIN, f64::max);

    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.add_row(vec![
        Cell::new("Generations").add_attribute(Attribute::Bold),
        Cell::new("Points"),
        Cell::new("Best").fg(Color::Green),
        Cell::new("Mean"),
        Cell::new("Worst").fg(Color::Red),
        Cell::new("Origin"),
    ]);
    for i in 0..=4 {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }
    table.add_row(vec![
        Cell::new(population.generations),
        Cell::new(pool.len()),
        Cell::new(format!("{:.2}", best.fitness)).fg(Color::Green),
        Cell::new(format!("{:.2}", mean)),
        Cell::new(format!("{:.2}", worst)).fg(Color::Red),
        Cell::new(best.generator),
    ]);
    println!("\n{}", table);

    let mut origins = Table::new();
    origins.load_preset(ASCII_FULL);
    origins.add_row(vec![
        Cell::new("Generator").add_attribute(Attribute::Bold),
        Cell::new("Members"),
    ]);
    for generator in PathGenerator::iter() {
        let count = population
            .members
            .iter()
            .filter(|m| m.generator == generator)
            .count();
        origins.add_row(vec![Cell::new(generator), Cell::new(count)]);
    }
    println!("\n{}", origins);

    println!("\nBest tour: {}", best.chromosome);
}
