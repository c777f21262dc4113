//! Regional indicator tables used by the data-exploration view.
//!
//! Each table is a semicolon-delimited export with comma decimals, one row
//! per region and one column per year:
//!
//! ```text
//! Kabupaten/Kota;2022;2023;2024
//! Bogor;5.427,07;5.556,11;5.682,30
//! ```
//!
//! Tables are unpivoted to `(region, year) -> value` and inner-joined on that
//! key.
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::schema::{FeatureSchema, FeatureVector, MINIMUM_WAGE, POOR_POPULATION, POPULATION, SCHOOLING};

/// The five regional indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    ParticipationRate,
    Population,
    PoorPopulation,
    Schooling,
    MinimumWage,
}

impl Indicator {
    pub const ALL: [Indicator; 5] = [
        Indicator::ParticipationRate,
        Indicator::Population,
        Indicator::PoorPopulation,
        Indicator::Schooling,
        Indicator::MinimumWage,
    ];

    /// Column name; for features this is the schema field name.
    pub fn column(&self) -> &'static str {
        match self {
            Indicator::ParticipationRate => "participation_rate",
            Indicator::Population => POPULATION,
            Indicator::PoorPopulation => POOR_POPULATION,
            Indicator::Schooling => SCHOOLING,
            Indicator::MinimumWage => MINIMUM_WAGE,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Indicator::ParticipationRate => "Participation rate (%)",
            Indicator::Population => "Population (thousands)",
            Indicator::PoorPopulation => "Poor population (thousands)",
            Indicator::Schooling => "Average schooling (years)",
            Indicator::MinimumWage => "Minimum wage (rupiah)",
        }
    }

    pub fn from_column(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|i| i.column() == name)
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Paths of the indicator tables. Any of them may be left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetPaths {
    pub participation_rate: Option<PathBuf>,
    pub population: Option<PathBuf>,
    pub poor_population: Option<PathBuf>,
    pub schooling: Option<PathBuf>,
    pub minimum_wage: Option<PathBuf>,
}

impl DatasetPaths {
    pub fn entries(&self) -> Vec<(Indicator, &Path)> {
        [
            (Indicator::ParticipationRate, &self.participation_rate),
            (Indicator::Population, &self.population),
            (Indicator::PoorPopulation, &self.poor_population),
            (Indicator::Schooling, &self.schooling),
            (Indicator::MinimumWage, &self.minimum_wage),
        ]
        .into_iter()
        .filter_map(|(indicator, path)| path.as_deref().map(|p| (indicator, p)))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// One indicator, unpivoted.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorTable {
    pub indicator: Indicator,
    pub values: BTreeMap<(String, i32), f64>,
}

/// Parse a comma-decimal number such as `5.427,07` or `73,5`.
///
/// `.` is always a thousands separator. Blank cells and `-` are missing.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() || s == "-" || s == "…" {
        return None;
    }
    s.replace(['.', ' '], "")
        .replace(',', ".")
        .parse::<f64>()
        .ok()
}

/// Read a wide region/year table.
pub fn read_indicator_table<P: AsRef<Path>>(path: P, indicator: Indicator) -> Result<IndicatorTable> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open {} table: {}", indicator, path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header row of {}", path.display()))?
        .clone();

    let year_columns: Vec<(usize, i32)> = headers
        .iter()
        .enumerate()
        .skip(1)
        .filter_map(|(idx, h)| match h.trim().parse::<i32>() {
            Ok(year) => Some((idx, year)),
            Err(_) => {
                log::debug!("Skipping non-year column '{}' in {}", h, path.display());
                None
            }
        })
        .collect();
    if year_columns.is_empty() {
        return Err(anyhow!("No year columns found in header of {}", path.display()));
    }

    let mut values = BTreeMap::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| {
            format!("Failed to read row {} of {}", row_idx + 1, path.display())
        })?;
        let region = record.get(0).unwrap_or_default().trim();
        if region.is_empty() {
            continue;
        }
        for &(idx, year) in &year_columns {
            let Some(value) = record.get(idx).and_then(parse_decimal) else {
                continue;
            };
            if values.insert((region.to_string(), year), value).is_some() {
                log::warn!(
                    "Duplicate {} entry for ({}, {}) in {}; keeping the last one",
                    indicator,
                    region,
                    year,
                    path.display()
                );
            }
        }
    }

    log::debug!("Read {} {} values from {}", values.len(), indicator, path.display());
    Ok(IndicatorTable { indicator, values })
}

/// One joined `(region, year)` observation.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub region: String,
    pub year: i32,
    pub values: BTreeMap<Indicator, f64>,
}

impl MergedRow {
    pub fn get(&self, indicator: Indicator) -> Option<f64> {
        self.values.get(&indicator).copied()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedDataset {
    pub indicators: Vec<Indicator>,
    pub rows: Vec<MergedRow>,
}

impl MergedDataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.rows.iter().map(|r| r.year).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    /// Mean of an indicator per year, for trend charts.
    pub fn yearly_mean(&self, indicator: Indicator) -> Vec<(i32, f64)> {
        let mut acc: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
        for row in &self.rows {
            if let Some(v) = row.get(indicator) {
                let entry = acc.entry(row.year).or_insert((0.0, 0));
                entry.0 += v;
                entry.1 += 1;
            }
        }
        acc.into_iter()
            .map(|(year, (sum, n))| (year, sum / n as f64))
            .collect()
    }

    /// Rows carrying every schema field plus the participation rate, as
    /// (features, target) pairs.
    pub fn feature_rows(&self, schema: &FeatureSchema) -> Vec<(FeatureVector, f64)> {
        let needed: Option<Vec<Indicator>> = schema
            .fields()
            .iter()
            .map(|f| Indicator::from_column(&f.name))
            .collect();
        let Some(needed) = needed else {
            return Vec::new();
        };

        self.rows
            .iter()
            .filter_map(|row| {
                let target = row.get(Indicator::ParticipationRate)?;
                let features = needed
                    .iter()
                    .map(|i| row.get(*i).map(|v| (i.column(), v)))
                    .collect::<Option<FeatureVector>>()?;
                Some((features, target))
            })
            .collect()
    }
}

/// Inner join on `(region, year)` across every table.
pub fn merge_tables(tables: &[IndicatorTable]) -> MergedDataset {
    let Some((first, rest)) = tables.split_first() else {
        return MergedDataset::default();
    };

    let rows = first
        .values
        .iter()
        .filter_map(|(key, &value)| {
            let mut values = BTreeMap::new();
            values.insert(first.indicator, value);
            for table in rest {
                values.insert(table.indicator, *table.values.get(key)?);
            }
            Some(MergedRow {
                region: key.0.clone(),
                year: key.1,
                values,
            })
        })
        .collect();

    MergedDataset {
        indicators: tables.iter().map(|t| t.indicator).collect(),
        rows,
    }
}

/// Read and join every configured table. `None` when nothing is configured.
pub fn load_datasets(paths: &DatasetPaths) -> Result<Option<MergedDataset>> {
    let entries = paths.entries();
    if entries.is_empty() {
        return Ok(None);
    }
    let tables = entries
        .into_iter()
        .map(|(indicator, path)| read_indicator_table(path, indicator))
        .collect::<Result<Vec<_>>>()?;
    let merged = merge_tables(&tables);
    log::info!(
        "Merged {} tables into {} (region, year) rows",
        tables.len(),
        merged.len()
    );
    Ok(Some(merged))
}
