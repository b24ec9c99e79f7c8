//! Collection orchestrator: fetch every dataset of a catalogue, derive the
//! undersampled variants and persist the result.

use crate::catalog::{self, DatasetSpec, Origin};
use crate::config::{ImbalanceConfig, PipelineConfig};
use crate::data::{FetchProgress, Fetcher};
use crate::error::DatasetError;
use crate::frame::{canonicalize, normalize, validate_canonical, NamedFrame};
use crate::imbalance::derive_variants;
use crate::rng::RngHierarchy;
use crate::store;
use crate::synthetic::make_classification;
use polars::prelude::DataFrame;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Which catalogue a collection is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    /// Imbalanced datasets plus their undersampled variants.
    Imbalanced,
    /// Binary class datasets, stored as fetched.
    Binary,
}

impl CollectionKind {
    pub fn default_db_name(self) -> &'static str {
        match self {
            CollectionKind::Imbalanced => "imbalanced_binary_class",
            CollectionKind::Binary => "binary_class",
        }
    }

    fn catalogue(self, config: &PipelineConfig) -> Result<Vec<DatasetSpec>, DatasetError> {
        match self {
            CollectionKind::Imbalanced => catalog::imbalanced(&config.sources),
            CollectionKind::Binary => catalog::binary(&config.sources),
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionKind::Imbalanced => write!(f, "imbalanced"),
            CollectionKind::Binary => write!(f, "binary"),
        }
    }
}

/// A catalogue of dataset fetchers and, once downloaded, their frames.
#[derive(Debug)]
pub struct DatasetCollection {
    kind: CollectionKind,
    specs: Vec<DatasetSpec>,
    imbalance: ImbalanceConfig,
    content: Vec<NamedFrame>,
}

impl DatasetCollection {
    /// The stock catalogue of `kind`, with base URLs taken from `config`.
    pub fn new(kind: CollectionKind, config: &PipelineConfig) -> Result<Self, DatasetError> {
        let specs = kind.catalogue(config)?;
        Ok(Self::with_specs(kind, specs, config.imbalance.clone()))
    }

    /// A collection over a custom catalogue.
    pub fn with_specs(
        kind: CollectionKind,
        specs: Vec<DatasetSpec>,
        imbalance: ImbalanceConfig,
    ) -> Self {
        Self {
            kind,
            specs,
            imbalance,
            content: Vec::new(),
        }
    }

    pub fn kind(&self) -> CollectionKind {
        self.kind
    }

    pub fn specs(&self) -> &[DatasetSpec] {
        &self.specs
    }

    /// Keep only the named datasets, matched by key or display name.
    ///
    /// Catalogue order is preserved. An empty selection keeps everything.
    pub fn select(mut self, names: &[String]) -> Result<Self, DatasetError> {
        if names.is_empty() {
            return Ok(self);
        }
        if let Some(unknown) = names
            .iter()
            .find(|n| !self.specs.iter().any(|s| s.matches(n)))
        {
            return Err(DatasetError::UnknownDataset(unknown.clone()));
        }
        self.specs.retain(|s| names.iter().any(|n| s.matches(n)));
        Ok(self)
    }

    /// Fetch every dataset in catalogue order, then derive variants for an
    /// imbalanced collection. Stops at the first failure.
    pub fn download(
        &mut self,
        fetcher: &dyn Fetcher,
        progress: &dyn FetchProgress,
    ) -> Result<(), DatasetError> {
        let seeds = RngHierarchy::new(self.imbalance.seed);
        let total = self.specs.len();
        let mut originals = Vec::with_capacity(total);
        info!(
            collection = %self.kind,
            fetcher = fetcher.name(),
            seed = seeds.master_seed(),
            datasets = total,
            "download started"
        );

        for (i, spec) in self.specs.iter().enumerate() {
            let name = spec.name();
            progress.on_start(&name, i, total);

            let frame = fetch_one(spec, &name, fetcher, &seeds)?;
            progress.on_complete(&name, i, total, frame.shape());
            info!(dataset = %name, rows = frame.height(), columns = frame.width(), "fetched");

            originals.push(NamedFrame::new(name, frame));
        }

        let derived = match self.kind {
            CollectionKind::Imbalanced => derive_variants(
                &originals,
                &self.imbalance.multiplication_factors,
                self.imbalance.min_minority_samples,
                &seeds,
            )?,
            CollectionKind::Binary => Vec::new(),
        };
        progress.on_batch_complete(originals.len(), derived.len());

        originals.extend(derived);
        self.content = originals;
        Ok(())
    }

    /// Originals in catalogue order, followed by derived variants.
    pub fn datasets(&self) -> &[NamedFrame] {
        &self.content
    }

    /// Persist every dataset to `{dir}/{db_name}.db`.
    pub fn save(&self, dir: &Path, db_name: &str) -> Result<PathBuf, DatasetError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{db_name}.db"));
        store::save_datasets(&path, &self.content)?;
        Ok(path)
    }
}

fn fetch_one(
    spec: &DatasetSpec,
    name: &str,
    fetcher: &dyn Fetcher,
    seeds: &RngHierarchy,
) -> Result<DataFrame, DatasetError> {
    let frame = match &spec.origin {
        Origin::Remote(recipe) => {
            let raw = recipe.source.load(fetcher)?;
            debug!(dataset = %name, rows = raw.height(), columns = raw.width(), "parsed");
            canonicalize(normalize(&raw, recipe)?)?
        }
        Origin::Synthetic(params) => {
            let mut rng = seeds.rng_for(spec.key, "synthetic");
            make_classification(params, &mut rng)?
        }
    };
    validate_canonical(name, &frame)?;
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(kind: CollectionKind) -> DatasetCollection {
        DatasetCollection::new(kind, &PipelineConfig::default()).unwrap()
    }

    #[test]
    fn default_db_names() {
        assert_eq!(
            CollectionKind::Imbalanced.default_db_name(),
            "imbalanced_binary_class"
        );
        assert_eq!(CollectionKind::Binary.default_db_name(), "binary_class");
    }

    #[test]
    fn select_keeps_catalogue_order() {
        let selected = collection(CollectionKind::Imbalanced)
            .select(&["YEAST 1".into(), "glass".into()])
            .unwrap();
        let keys: Vec<&str> = selected.specs().iter().map(|s| s.key).collect();
        assert_eq!(keys, vec!["glass", "yeast_1"]);
    }

    #[test]
    fn select_rejects_unknown_names() {
        let err = collection(CollectionKind::Binary)
            .select(&["nope".into()])
            .unwrap_err();
        assert!(matches!(err, DatasetError::UnknownDataset(n) if n == "nope"));
    }

    #[test]
    fn empty_selection_keeps_everything() {
        let all = collection(CollectionKind::Binary).select(&[]).unwrap();
        assert_eq!(all.specs().len(), 4);
    }

    #[test]
    fn collections_remember_their_kind() {
        assert_eq!(collection(CollectionKind::Binary).kind(), CollectionKind::Binary);
        assert_eq!(collection(CollectionKind::Imbalanced).kind(), CollectionKind::Imbalanced);
    }

    #[test]
    fn nothing_downloaded_yet() {
        assert!(collection(CollectionKind::Imbalanced).datasets().is_empty());
    }
}
