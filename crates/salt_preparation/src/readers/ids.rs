use anyhow::{bail, Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Training, depth and test id lists, built once and handed to the
/// fetchers.
///
/// `test` is the sorted, deduplicated set difference `depth \ train`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IdUniverse {
    pub train: Vec<String>,
    pub depth: Vec<String>,
    pub test: Vec<String>,
}

impl IdUniverse {
    pub fn new(train: Vec<String>, depth: Vec<String>) -> Self {
        let train_set: BTreeSet<&str> = train.iter().map(String::as_str).collect();
        let test = depth
            .iter()
            .map(String::as_str)
            .filter(|id| !train_set.contains(id))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();
        Self { train, depth, test }
    }

    /// Reads the `id` column of both CSV files.
    ///
    /// # Example
    /// ```ignore
    /// let ids = IdUniverse::from_csv("data/train.csv", "data/depths.csv")?;
    /// let test_images = fetch_test_data("data/test/images", &ids.test)?;
    /// ```
    pub fn from_csv(train_csv: impl AsRef<Path>, depths_csv: impl AsRef<Path>) -> Result<Self> {
        let train = read_id_column(train_csv.as_ref(), "id")?;
        let depth = read_id_column(depths_csv.as_ref(), "id")?;
        let universe = Self::new(train, depth);
        tracing::info!(
            train = universe.train.len(),
            depth = universe.depth.len(),
            test = universe.test.len(),
            "loaded id universe"
        );
        Ok(universe)
    }
}

/// Returns the values of `column` from a comma-separated file with a
/// header row. Blank lines are skipped.
pub fn read_id_column(path: &Path, column: &str) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read CSV: {}", path.display()))?;
    parse_column(&content, column).with_context(|| format!("In CSV {}", path.display()))
}

fn parse_column(content: &str, column: &str) -> Result<Vec<String>> {
    let mut lines = content.lines().filter(|l| !l.trim().is_empty());
    let Some(header) = lines.next() else {
        bail!("empty CSV");
    };
    let Some(position) = header.split(',').position(|h| h.trim() == column) else {
        bail!("no '{}' column in header '{}'", column, header);
    };

    lines
        .enumerate()
        .map(|(line_no, line)| {
            line.split(',')
                .nth(position)
                .map(|v| v.trim().to_string())
                .with_context(|| format!("line {} has no column {}", line_no + 2, position))
        })
        .collect()
}
