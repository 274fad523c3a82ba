//! Synthetic table generation.
//!
//! Shape is fully determined by the [`GenerateConfig`]; cell contents are
//! uniform random integers over `[min_value, max_value)`. A configured seed
//! makes contents reproducible, otherwise the generator is seeded from entropy.

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use crate::contract::{validate_generate_config, GenerateConfig, PipelineError};

/// In-memory rows x columns integer table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularArtifact {
    columns: Vec<String>,
    rows: Vec<Vec<i64>>,
}

impl TabularArtifact {
    /// Builds a table from explicit parts, checking that every row matches the header width.
    pub fn from_parts(columns: Vec<String>, rows: Vec<Vec<i64>>) -> Result<Self, PipelineError> {
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(PipelineError::configuration(format!(
                "row {index} has {} values but the table has {} columns",
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<i64>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn values(&self) -> impl Iterator<Item = i64> + '_ {
        self.rows.iter().flatten().copied()
    }
}

/// Column labels for a config: the explicit names, or positional indices.
pub fn column_labels(config: &GenerateConfig) -> Vec<String> {
    match &config.column_names {
        Some(names) => names.clone(),
        None => (0..config.n_cols).map(|index| index.to_string()).collect(),
    }
}

/// Validates the config and generates a fresh table.
///
/// Validation runs before any value is drawn, so an invalid config never
/// yields a partial table.
pub fn generate_artifact(config: &GenerateConfig) -> Result<TabularArtifact, PipelineError> {
    validate_generate_config(config)?;

    tracing::info!(
        component = "generate_artifact",
        event = "generation_started",
        random_min_size = config.min_value,
        random_max_size = config.max_value,
        n_rows = config.n_rows,
        n_cols = config.n_cols,
        seeded = config.seed.is_some(),
        "creating random table"
    );

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let rows = (0..config.n_rows)
        .map(|_| {
            (0..config.n_cols)
                .map(|_| rng.gen_range(config.min_value..config.max_value))
                .collect()
        })
        .collect();

    Ok(TabularArtifact {
        columns: column_labels(config),
        rows,
    })
}
