use crate::config::RunConfig;
use crate::population::{AreaRecord, Population};
use crate::rank::Ranked;
use crate::report_helpers::{self, OutputError, UNDEFINED, fmt_cell};

/// Column layout shared by `areas.csv` and every selection file.
#[derive(Debug, Clone)]
pub struct Columns {
    pub name: bool,
    pub raw: Vec<String>,
    pub scores: Vec<String>,
    pub composites: Vec<String>,
    pub schemes: Vec<String>,
}

impl Columns {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            name: config.input.name_column.is_some(),
            raw: config.raw_fields(),
            scores: config.score_fields(),
            composites: config.composite_fields(),
            schemes: config.schemes.iter().map(|s| s.name.clone()).collect(),
        }
    }

    fn header(&self, ranked: bool) -> Vec<String> {
        let mut h = Vec::new();
        if ranked {
            h.push("rank".to_string());
        }
        h.push("area_id".to_string());
        if self.name {
            h.push("area_name".to_string());
        }
        h.extend(self.raw.iter().cloned());
        h.extend(self.scores.iter().cloned());
        h.extend(self.composites.iter().cloned());
        h.extend(self.schemes.iter().cloned());
        h.push("flags".to_string());
        h
    }

    fn row(&self, area: &AreaRecord, rank: Option<usize>) -> Vec<String> {
        let mut r = Vec::new();
        if let Some(rank) = rank {
            r.push(rank.to_string());
        }
        r.push(area.area_id.clone());
        if self.name {
            r.push(area.area_name.clone().unwrap_or_default());
        }
        for f in &self.raw {
            r.push(fmt_cell(area.raw.get(f).copied().flatten()));
        }
        for f in &self.scores {
            r.push(fmt_cell(area.derived.get(f).copied().flatten()));
        }
        for f in &self.composites {
            r.push(fmt_cell(area.composite.get(f).copied().flatten()));
        }
        for s in &self.schemes {
            r.push(area.tier(s).unwrap_or(UNDEFINED).to_string());
        }
        r.push(area.flags.join("; "));
        r
    }
}

/// Every analysed area, in input order.
pub fn areas_csv(columns: &Columns, population: &Population) -> Result<Vec<u8>, OutputError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(columns.header(false))?;
    for area in &population.areas {
        wtr.write_record(columns.row(area, None))?;
    }
    report_helpers::finish_csv(wtr)
}

/// A ranked selection with a leading 1-based `rank` column.
pub fn selection_csv(
    columns: &Columns,
    population: &Population,
    ranked: &Ranked,
) -> Result<Vec<u8>, OutputError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(columns.header(true))?;
    for (pos, &i) in ranked.rows.iter().enumerate() {
        wtr.write_record(columns.row(&population.areas[i], Some(pos + 1)))?;
    }
    report_helpers::finish_csv(wtr)
}
