//! CSV export of run results.

use crate::automaton::world::line_to_string;
use crate::error::SimResult;
use crate::geometry::GenePool;
use crate::optimizer::Individual;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

#[derive(Debug, Serialize)]
struct CaRecord<'a> {
    step: usize,
    rule: u8,
    live: usize,
    cells: &'a str,
}

#[derive(Debug, Serialize)]
struct TourRecord {
    order: usize,
    gene: usize,
    x: f64,
    y: f64,
    leg: f64,
}

/// One record per history line; `cells` is the line as `0`/`1` text.
pub fn write_ca_history<W: Write>(writer: W, rule: u8, lines: &[Vec<u8>]) -> SimResult<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(true).from_writer(writer);
    for (step, line) in lines.iter().enumerate() {
        let cells = line_to_string(line);
        wtr.serialize(CaRecord {
            step,
            rule,
            live: line.iter().filter(|&&c| c == 1).count(),
            cells: &cells,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// One record per stop of the tour; `leg` is the distance to the next stop.
pub fn write_tour<W: Write>(writer: W, pool: &GenePool, tour: &Individual) -> SimResult<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(true).from_writer(writer);
    let genes = tour.chromosome.genes();
    for (order, &gene) in genes.iter().enumerate() {
        let Some(node) = pool.get(gene) else {
            continue;
        };
        let next = genes[(order + 1) % genes.len()];
        wtr.serialize(TourRecord {
            order,
            gene,
            x: node.pos.x,
            y: node.pos.y,
            leg: if genes.len() > 1 { pool.distance(gene, next) } else { 0.0 },
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_ca_history<P: AsRef<Path>>(path: P, rule: u8, lines: &[Vec<u8>]) -> SimResult<()> {
    let file = std::fs::File::create(path.as_ref())?;
    write_ca_history(file, rule, lines)?;
    info!("Wrote {} CA rows to {}", lines.len(), path.as_ref().display());
    Ok(())
}

pub fn export_tour<P: AsRef<Path>>(path: P, pool: &GenePool, tour: &Individual) -> SimResult<()> {
    let file = std::fs::File::create(path.as_ref())?;
    write_tour(file, pool, tour)?;
    info!("Wrote {}-stop tour to {}", tour.chromosome.len(), path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::optimizer::chromosome::Chromosome;
    use crate::optimizer::PathGenerator;

    #[test]
    fn test_ca_history_csv() {
        let mut out = Vec::new();
        write_ca_history(&mut out, 110, &[vec![0, 1, 0], vec![1, 1, 0]]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "step,rule,live,cells\n0,110,1,010\n1,110,2,110\n");
    }

    #[test]
    fn test_tour_csv_legs_sum_to_fitness() {
        let pool = GenePool::from_points(&[
            Point::new(0.0, 0.0),
            Point::new(3.0, 0.0),
            Point::new(3.0, 4.0),
        ]);
        let tour = Individual::new(Chromosome::new(vec![0, 1, 2]), PathGenerator::RandomPath, &pool);
        let mut out = Vec::new();
        write_tour(&mut out, &pool, &tour).unwrap();

        let mut rdr = csv::Reader::from_reader(out.as_slice());
        let legs: Vec<f64> = rdr
            .records()
            .map(|r| r.unwrap()[4].parse::<f64>().unwrap())
            .collect();
        assert_eq!(legs.len(), 3);
        assert!((legs.iter().sum::<f64>() - tour.fitness).abs() < 1e-9);
    }
}
