//! Ratio-based undersampling of the minority class.
//!
//! A multiplication factor `f` divides the minority (class `1`) count, so the
//! imbalance ratio of the derived dataset is roughly `f` times the original
//! one. The majority class is never touched.

use crate::error::DatasetError;
use crate::frame::{class_counts, ClassCounts, NamedFrame, TARGET};
use crate::rng::RngHierarchy;
use polars::prelude::*;
use rand::Rng;
use tracing::{debug, info};

/// Target class counts after dividing the minority count by `factor`.
///
/// The minority count is truncated, never rounded up.
pub fn calculate_ratio(factor: f64, counts: ClassCounts) -> ClassCounts {
    ClassCounts {
        negative: counts.negative,
        positive: (counts.positive as f64 / factor) as usize,
    }
}

/// Undersample the minority class of a canonical frame.
///
/// Features are cast to `Float64`; string features are rejected. With
/// `factor <= 1` no rows are removed. The kept rows stay in their original
/// order.
pub fn make_imbalance<R: Rng + ?Sized>(
    df: &DataFrame,
    factor: f64,
    rng: &mut R,
) -> Result<DataFrame, DatasetError> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(DatasetError::InvalidFactor(factor));
    }

    let numeric = to_numeric(df)?;
    if factor <= 1.0 {
        return Ok(numeric);
    }

    let target = numeric.column(TARGET)?.i32()?;
    let positives: Vec<usize> = target
        .into_iter()
        .enumerate()
        .filter_map(|(i, v)| (v == Some(1)).then_some(i))
        .collect();

    let counts = class_counts(&numeric)?;
    let keep = calculate_ratio(factor, counts).positive;

    let mut chosen = rand::seq::index::sample(rng, positives.len(), keep).into_vec();
    chosen.sort_unstable();

    let mut selected = chosen.into_iter().map(|i| positives[i]).peekable();
    let indices: Vec<IdxSize> = target
        .into_iter()
        .enumerate()
        .filter_map(|(i, v)| {
            let take = match v {
                Some(1) => selected.next_if_eq(&i).is_some(),
                _ => true,
            };
            take.then_some(i as IdxSize)
        })
        .collect();

    debug!(
        rows = numeric.height(),
        kept = indices.len(),
        positives = counts.positive,
        kept_positives = keep,
        "undersampled"
    );

    Ok(numeric.take(&IdxCa::from_vec("idx".into(), indices))?)
}

fn to_numeric(df: &DataFrame) -> Result<DataFrame, DatasetError> {
    let columns = df
        .get_columns()
        .iter()
        .map(|c| {
            if c.name().as_str() == TARGET {
                return Ok(c.cast(&DataType::Int32)?);
            }
            if c.dtype() == &DataType::String {
                return Err(DatasetError::invalid(
                    c.name().as_str(),
                    "non-numeric feature cannot be undersampled",
                ));
            }
            Ok(c.cast(&DataType::Float64)?)
        })
        .collect::<Result<Vec<Column>, DatasetError>>()?;
    Ok(DataFrame::new(columns)?)
}

/// Name of a derived dataset, e.g. `"GLASS (2)"` or `"GLASS (2.5)"`.
pub fn variant_name(name: &str, factor: f64) -> String {
    format!("{name} ({})", format_factor(factor))
}

fn format_factor(factor: f64) -> String {
    if factor.fract() == 0.0 && factor.abs() < 1e15 {
        format!("{}", factor as i64)
    } else {
        format!("{factor}")
    }
}

/// Derive undersampled variants for every `(dataset, factor)` pair whose
/// reduced minority count is at least `min_minority`.
///
/// Variants are produced dataset by dataset, factors in the given order. Each
/// draws from its own RNG stream keyed by dataset name and factor.
pub fn derive_variants(
    datasets: &[NamedFrame],
    factors: &[f64],
    min_minority: usize,
    seeds: &RngHierarchy,
) -> Result<Vec<NamedFrame>, DatasetError> {
    let mut derived = Vec::new();

    for dataset in datasets {
        let counts = class_counts(&dataset.frame)?;
        for &factor in factors {
            let target = calculate_ratio(factor, counts);
            if target.positive < min_minority {
                debug!(
                    dataset = %dataset.name,
                    factor,
                    minority = target.positive,
                    "skipping variant below minority floor"
                );
                continue;
            }

            let mut rng = seeds.rng_for(&dataset.name, &format_factor(factor));
            let frame = make_imbalance(&dataset.frame, factor, &mut rng)?;
            let name = variant_name(&dataset.name, factor);
            info!(dataset = %name, rows = frame.height(), "derived variant");
            derived.push(NamedFrame::new(name, frame));
        }
    }

    Ok(derived)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn frame(negatives: usize, positives: usize) -> DataFrame {
        let n = negatives + positives;
        let features: Vec<i64> = (0..n as i64).collect();
        let target: Vec<i32> = (0..n).map(|i| (i >= negatives) as i32).collect();
        df!("0" => features, "target" => target).unwrap()
    }

    #[test]
    fn ratio_truncates_minority() {
        let counts = ClassCounts { negative: 100, positive: 35 };
        assert_eq!(calculate_ratio(2.0, counts), ClassCounts { negative: 100, positive: 17 });
        assert_eq!(calculate_ratio(3.0, counts).positive, 11);
        assert_eq!(calculate_ratio(1.0, counts).positive, 35);
    }

    #[test]
    fn undersampling_hits_target_counts() {
        let df = frame(100, 40);
        let mut rng = StdRng::seed_from_u64(0);
        let out = make_imbalance(&df, 3.0, &mut rng).unwrap();
        assert_eq!(
            class_counts(&out).unwrap(),
            ClassCounts { negative: 100, positive: 13 }
        );
        assert_eq!(out.column("0").unwrap().dtype(), &DataType::Float64);
        assert_eq!(out.column(TARGET).unwrap().dtype(), &DataType::Int32);
    }

    #[test]
    fn undersampling_preserves_row_order() {
        let df = frame(10, 30);
        let mut rng = StdRng::seed_from_u64(5);
        let out = make_imbalance(&df, 2.0, &mut rng).unwrap();
        let ids: Vec<f64> = out.column("0").unwrap().f64().unwrap().into_no_null_iter().collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(&ids[..10], &(0..10).map(|i| i as f64).collect::<Vec<_>>()[..]);
    }

    #[test]
    fn undersampling_is_deterministic_per_seed() {
        let df = frame(50, 50);
        let a = make_imbalance(&df, 2.0, &mut StdRng::seed_from_u64(1)).unwrap();
        let b = make_imbalance(&df, 2.0, &mut StdRng::seed_from_u64(1)).unwrap();
        assert!(a.equals(&b));
    }

    #[test]
    fn factor_at_most_one_keeps_all_rows() {
        let df = frame(20, 5);
        let out = make_imbalance(&df, 1.0, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(out.height(), 25);
    }

    #[test]
    fn invalid_factors_are_rejected() {
        let df = frame(2, 2);
        let mut rng = StdRng::seed_from_u64(0);
        for factor in [0.0, -2.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                make_imbalance(&df, factor, &mut rng),
                Err(DatasetError::InvalidFactor(_))
            ));
        }
    }

    #[test]
    fn string_features_are_rejected() {
        let df = df!("0" => &["a", "b"], "target" => &[0i32, 1]).unwrap();
        let err = make_imbalance(&df, 2.0, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert!(matches!(err, DatasetError::InvalidDataset { .. }));
    }

    #[test]
    fn variants_respect_minority_floor_and_naming() {
        let datasets = vec![
            NamedFrame::new("BIG", frame(100, 45)),
            NamedFrame::new("SMALL", frame(100, 40)),
        ];
        let seeds = RngHierarchy::new(0);
        let derived = derive_variants(&datasets, &[2.0, 3.0], 15, &seeds).unwrap();

        let names: Vec<&str> = derived.iter().map(|d| d.name.as_str()).collect();
        // SMALL / 3 leaves 13 positives, below the floor.
        assert_eq!(names, vec!["BIG (2)", "BIG (3)", "SMALL (2)"]);
        assert_eq!(class_counts(&derived[1].frame).unwrap().positive, 15);
    }

    #[test]
    fn fractional_factor_names() {
        assert_eq!(variant_name("GLASS", 2.0), "GLASS (2)");
        assert_eq!(variant_name("GLASS", 2.5), "GLASS (2.5)");
    }
}
