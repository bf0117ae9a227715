//! CLI subcommands

pub mod health;
pub mod predict;
pub mod publish;
pub mod tasks;

use anyhow::{bail, Result};
use agrisage_lib::FeatureSet;

/// Parse `name=value` pairs into a feature set.
///
/// Values must be numeric; the server treats anything else as a
/// malformed request.
pub fn parse_features(pairs: &[String]) -> Result<FeatureSet> {
    let mut features = FeatureSet::new();
    for pair in pairs {
        let Some((name, value)) = pair.split_once('=') else {
            bail!("feature '{}' must be written as name=value", pair);
        };
        let name = name.trim();
        if name.is_empty() {
            bail!("feature '{}' has an empty name", pair);
        }
        let value: f64 = match value.trim().parse() {
            Ok(v) => v,
            Err(_) => bail!("feature '{}' has non-numeric value '{}'", name, value.trim()),
        };
        if !value.is_finite() {
            bail!("feature '{}' must be finite", name);
        }
        features.insert(name.to_string(), value);
    }
    Ok(features)
}
