//! The named dataset fetchers of each collection.
//!
//! Each entry pairs a key (`new_thyroid_1`) with the recipe that turns its
//! remote files into a normalized frame. Display names are derived from the
//! key: upper-cased, underscores replaced by spaces (`NEW THYROID 1`).
//! Catalogues are ordered alphabetically by key.

use crate::config::SourceUrls;
use crate::data::{ColumnRef, Delimiter, Source, TextFormat};
use crate::error::DatasetError;
use crate::frame::{Features, Labels, Recipe};
use crate::synthetic::ClassificationParams;
use reqwest::Url;

/// Where a dataset comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum Origin {
    Remote(Recipe),
    Synthetic(ClassificationParams),
}

/// One named fetcher.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSpec {
    pub key: &'static str,
    pub description: &'static str,
    pub origin: Origin,
}

impl DatasetSpec {
    pub fn remote(key: &'static str, description: &'static str, recipe: Recipe) -> Self {
        Self {
            key,
            description,
            origin: Origin::Remote(recipe),
        }
    }

    pub fn synthetic(
        key: &'static str,
        description: &'static str,
        params: ClassificationParams,
    ) -> Self {
        Self {
            key,
            description,
            origin: Origin::Synthetic(params),
        }
    }

    /// Table name used in the store.
    pub fn name(&self) -> String {
        display_name(self.key)
    }

    /// True when `query` names this dataset by key or display name.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        self.key.eq_ignore_ascii_case(query) || self.name().eq_ignore_ascii_case(query)
    }
}

/// `new_thyroid_1` → `NEW THYROID 1`.
pub fn display_name(key: &str) -> String {
    key.to_uppercase().replace('_', " ")
}

/// Resolve `path` against `base` with URL reference semantics: a base without
/// a trailing slash has its last segment replaced.
pub fn join_url(base: &str, path: &str) -> Result<String, DatasetError> {
    let invalid = |reason: String| DatasetError::InvalidUrl {
        url: base.to_string(),
        reason,
    };
    Url::parse(base)
        .map_err(|e| invalid(e.to_string()))?
        .join(path)
        .map(String::from)
        .map_err(|e| invalid(e.to_string()))
}

/// KEEL groups imbalanced datasets by imbalance ratio.
#[derive(Debug, Clone, Copy)]
enum KeelGroup {
    LowerThan9,
    HigherThan9Part1,
    HigherThan9Part2,
    HigherThan9Part3,
}

impl KeelGroup {
    fn dir(self) -> &'static str {
        match self {
            KeelGroup::LowerThan9 => "imb_IRlowerThan9/",
            KeelGroup::HigherThan9Part1 => "imb_IRhigherThan9p1/",
            KeelGroup::HigherThan9Part2 => "imb_IRhigherThan9p2/",
            KeelGroup::HigherThan9Part3 => "imb_IRhigherThan9p3/",
        }
    }
}

struct Urls<'a>(&'a SourceUrls);

impl Urls<'_> {
    fn uci(&self, path: &str) -> Result<String, DatasetError> {
        join_url(&self.0.uci, path)
    }

    fn keel(&self, group: KeelGroup, file: &str) -> Result<String, DatasetError> {
        join_url(&join_url(&self.0.keel, group.dir())?, file)
    }
}

const POSITIVE: &[&str] = &["positive"];

/// A KEEL zip whose `.dat` entry has its label in column `target`.
fn keel_recipe(
    urls: &Urls<'_>,
    group: KeelGroup,
    archive: &str,
    entry: &str,
    format: TextFormat,
    target: usize,
) -> Result<Recipe, DatasetError> {
    let source = Source::ZipEntry {
        url: urls.keel(group, archive)?,
        entry: entry.to_string(),
        format,
    };
    Ok(Recipe::new(source, ColumnRef::Index(target), Labels::Positive(POSITIVE)))
}

fn uci_text(urls: &Urls<'_>, path: &str, format: TextFormat) -> Result<Source, DatasetError> {
    Ok(Source::Text {
        url: urls.uci(path)?,
        format,
    })
}

fn sorted(mut specs: Vec<DatasetSpec>) -> Vec<DatasetSpec> {
    specs.sort_by_key(|s| s.key);
    specs
}

/// Binary class imbalanced datasets. The minority class is mapped to `1`.
pub fn imbalanced(sources: &SourceUrls) -> Result<Vec<DatasetSpec>, DatasetError> {
    use KeelGroup::*;

    let urls = Urls(sources);
    let csv = TextFormat::csv();
    let ws = TextFormat::whitespace();
    let keel = TextFormat::keel();
    let keel_spaced = TextFormat::keel().with_delimiter(Delimiter::Literal(", "));

    let mut specs = vec![
        DatasetSpec::remote(
            "breast_tissue",
            "UCI Breast Tissue; minority: car, fad",
            Recipe::new(
                Source::Excel {
                    url: urls.uci("00192/BreastTissue.xls")?,
                    sheet: "Data".into(),
                },
                ColumnRef::Name("Class"),
                Labels::Positive(&["car", "fad"]),
            )
            .dropping([ColumnRef::Name("Case #")]),
        ),
        DatasetSpec::remote(
            "ecoli",
            "UCI Ecoli; minority: pp",
            Recipe::new(
                uci_text(&urls, "ecoli/ecoli.data", ws)?,
                ColumnRef::Index(8),
                Labels::Positive(&["pp"]),
            )
            .dropping([ColumnRef::Index(0)]),
        ),
        DatasetSpec::remote(
            "eucalyptus",
            "OpenML Eucalyptus (last 9 attributes); minority: best",
            Recipe::new(
                Source::Text {
                    url: sources.openml_eucalyptus.clone(),
                    format: csv.with_header(),
                },
                ColumnRef::Name("Utility"),
                Labels::Positive(&["best"]),
            )
            .with_features(Features::Trailing(9))
            .drop_incomplete(),
        ),
        DatasetSpec::remote(
            "glass",
            "UCI Glass Identification; minority: 1",
            Recipe::new(
                uci_text(&urls, "glass/glass.data", csv)?,
                ColumnRef::Index(10),
                Labels::Positive(&["1"]),
            )
            .dropping([ColumnRef::Index(0)]),
        ),
        DatasetSpec::remote(
            "haberman",
            "UCI Haberman's Survival; minority: 2",
            Recipe::new(
                uci_text(&urls, "haberman/haberman.data", csv)?,
                ColumnRef::Index(3),
                Labels::Positive(&["2"]),
            ),
        ),
        DatasetSpec::remote(
            "heart",
            "UCI Statlog Heart; minority: 2",
            Recipe::new(
                uci_text(&urls, "statlog/heart/heart.dat", ws)?,
                ColumnRef::Index(13),
                Labels::Positive(&["2"]),
            ),
        ),
        DatasetSpec::remote(
            "iris",
            "UCI Iris; minority: Iris-setosa",
            Recipe::new(
                uci_text(&urls, "iris/bezdekIris.data", csv)?,
                ColumnRef::Index(4),
                Labels::Positive(&["Iris-setosa"]),
            ),
        ),
        DatasetSpec::remote(
            "libras",
            "UCI Libras Movement; minority: 1",
            Recipe::new(
                uci_text(&urls, "libras/movement_libras.data", csv)?,
                ColumnRef::Index(90),
                Labels::Positive(&["1"]),
            ),
        ),
        DatasetSpec::remote(
            "liver",
            "UCI Liver Disorders; minority: 1",
            Recipe::new(
                uci_text(&urls, "liver-disorders/bupa.data", csv)?,
                ColumnRef::Index(6),
                Labels::Positive(&["1"]),
            ),
        ),
        DatasetSpec::remote(
            "pima",
            "Pima Indians Diabetes (SQLite dump); already binary",
            Recipe::new(
                Source::Sqlite {
                    url: sources.pima_db.clone(),
                    query: "select * from pima".into(),
                },
                ColumnRef::Name("8"),
                Labels::Binary,
            ),
        ),
        DatasetSpec::remote(
            "segmentation",
            "UCI Statlog Image Segmentation; minority: 1",
            Recipe::new(
                uci_text(&urls, "statlog/segment/segment.dat", ws)?,
                ColumnRef::Index(19),
                Labels::Positive(&["1"]),
            )
            .dropping([ColumnRef::Index(2), ColumnRef::Index(3), ColumnRef::Index(4)]),
        ),
        DatasetSpec::remote(
            "vehicle",
            "UCI Statlog Vehicle Silhouettes (9 parts); minority: van",
            Recipe::new(
                Source::Stack(
                    ('a'..='i')
                        .map(|letter| uci_text(&urls, &format!("statlog/vehicle/xa{letter}.dat"), ws))
                        .collect::<Result<Vec<_>, _>>()?,
                ),
                ColumnRef::Index(18),
                Labels::Positive(&["van"]),
            ),
        ),
        DatasetSpec::remote(
            "wine",
            "UCI Wine; minority: 2",
            Recipe::new(
                uci_text(&urls, "wine/wine.data", csv)?,
                ColumnRef::Index(0),
                Labels::Positive(&["2"]),
            ),
        ),
        DatasetSpec::remote(
            "new_thyroid_1",
            "KEEL new-thyroid1",
            keel_recipe(&urls, LowerThan9, "new-thyroid1.zip", "new-thyroid1.dat", keel_spaced, 5)?,
        ),
        DatasetSpec::remote(
            "new_thyroid_2",
            "KEEL new-thyroid2",
            keel_recipe(&urls, LowerThan9, "new-thyroid2.zip", "newthyroid2.dat", keel_spaced, 5)?,
        ),
        DatasetSpec::remote(
            "cleveland",
            "KEEL cleveland-0_vs_4",
            keel_recipe(
                &urls,
                HigherThan9Part2,
                "cleveland-0_vs_4.zip",
                "cleveland-0_vs_4.dat",
                keel,
                13,
            )?,
        ),
        DatasetSpec::remote(
            "dermatology",
            "KEEL dermatology-6",
            keel_recipe(&urls, HigherThan9Part3, "dermatology-6.zip", "dermatology-6.dat", keel, 34)?,
        ),
        DatasetSpec::remote(
            "led",
            "KEEL led7digit-0-2-4-5-6-7-8-9_vs_1",
            keel_recipe(
                &urls,
                HigherThan9Part2,
                "led7digit-0-2-4-5-6-7-8-9_vs_1.zip",
                "led7digit-0-2-4-5-6-7-8-9_vs_1.dat",
                keel,
                7,
            )?,
        ),
        DatasetSpec::remote(
            "page_blocks_0",
            "KEEL page-blocks0",
            keel_recipe(&urls, LowerThan9, "page-blocks0.zip", "page-blocks0.dat", keel, 10)?,
        ),
        DatasetSpec::remote(
            "page_blocks_1_3",
            "KEEL page-blocks-1-3_vs_4",
            keel_recipe(
                &urls,
                HigherThan9Part1,
                "page-blocks-1-3_vs_4.zip",
                "page-blocks-1-3_vs_4.dat",
                keel,
                10,
            )?,
        ),
        DatasetSpec::remote(
            "vowel",
            "KEEL vowel0",
            keel_recipe(&urls, HigherThan9Part1, "vowel0.zip", "vowel0.dat", keel, 13)?,
        ),
        DatasetSpec::synthetic(
            "mandelon_1",
            "Simulated MADELON-like problem, 4000 x 20, 3% minority",
            ClassificationParams::new(4000, 20).with_weights([0.97, 0.03]),
        ),
        DatasetSpec::synthetic(
            "mandelon_2",
            "Simulated MADELON-like problem, 3000 x 200, 3% minority",
            ClassificationParams::new(3000, 200).with_weights([0.97, 0.03]),
        ),
    ];

    for (key, description, group, n) in [
        ("yeast_1", "KEEL yeast1", LowerThan9, 1),
        ("yeast_3", "KEEL yeast3", LowerThan9, 3),
        ("yeast_4", "KEEL yeast4", HigherThan9Part1, 4),
        ("yeast_5", "KEEL yeast5", HigherThan9Part1, 5),
        ("yeast_6", "KEEL yeast6", HigherThan9Part1, 6),
    ] {
        let recipe = keel_recipe(
            &urls,
            group,
            &format!("yeast{n}.zip"),
            &format!("yeast{n}.dat"),
            keel,
            8,
        )?;
        specs.push(DatasetSpec::remote(key, description, recipe));
    }

    Ok(sorted(specs))
}

/// Binary class datasets, used as-is without derived variants.
pub fn binary(sources: &SourceUrls) -> Result<Vec<DatasetSpec>, DatasetError> {
    let urls = Urls(sources);
    let csv = TextFormat::csv();
    let spaced = TextFormat::csv().with_delimiter(Delimiter::Literal(" "));

    // ARCENE: train and validation splits stacked, labels placed beside them.
    // Only the first 1999 of the 10000 features are kept.
    let arcene = |path: &str, format| uci_text(&urls, &format!("arcene/{path}"), format);
    let arcene_source = Source::Beside(vec![
        Source::Stack(vec![
            arcene("ARCENE/arcene_train.data", spaced)?,
            arcene("ARCENE/arcene_valid.data", spaced)?,
        ]),
        Source::Stack(vec![
            arcene("ARCENE/arcene_train.labels", csv)?,
            arcene("arcene_valid.labels", csv)?,
        ]),
    ]);

    let specs = vec![
        DatasetSpec::remote(
            "arcene",
            "UCI Arcene (first 1999 features); positive: 1",
            Recipe::new(arcene_source, ColumnRef::Last, Labels::Positive(&["1"]))
                .with_features(Features::Leading(1999)),
        ),
        DatasetSpec::remote(
            "audit",
            "UCI Audit Data (audit_risk.csv); target: Risk",
            Recipe::new(
                Source::ZipEntry {
                    url: urls.uci("00475/audit_data.zip")?,
                    entry: "audit_data/audit_risk.csv".into(),
                    format: TextFormat::keel().with_header(),
                },
                ColumnRef::Name("Risk"),
                Labels::Binary,
            )
            .drop_incomplete(),
        ),
        DatasetSpec::remote(
            "banknote_authentication",
            "UCI Banknote Authentication; target: class",
            Recipe::new(
                uci_text(&urls, "00267/data_banknote_authentication.txt", csv)?,
                ColumnRef::Index(4),
                Labels::Binary,
            ),
        ),
        DatasetSpec::remote(
            "spambase",
            "UCI Spambase; target: spam",
            Recipe::new(
                uci_text(&urls, "spambase/spambase.data", csv)?,
                ColumnRef::Index(57),
                Labels::Binary,
            ),
        ),
    ];

    Ok(sorted(specs))
}
