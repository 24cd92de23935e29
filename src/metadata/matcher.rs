use crate::model::SourceMetadataRecord;

#[derive(Debug, Clone, Copy)]
pub struct UnitKey<'a> {
    pub unit_id: &'a str,
    pub candidate_filename: Option<&'a str>,
}

pub trait MatchStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn matches(&self, unit: &UnitKey<'_>, record: &SourceMetadataRecord) -> bool;
}

#[derive(Debug, Default)]
pub struct ExactPosterId;

impl MatchStrategy for ExactPosterId {
    fn name(&self) -> &'static str {
        "exact_poster_id"
    }

    fn matches(&self, unit: &UnitKey<'_>, record: &SourceMetadataRecord) -> bool {
        record.poster_id.as_deref() == Some(unit.unit_id.trim())
    }
}

#[derive(Debug, Default)]
pub struct ImagePathHasUnitPng;

impl MatchStrategy for ImagePathHasUnitPng {
    fn name(&self) -> &'static str {
        "image_path_unit_png"
    }

    fn matches(&self, unit: &UnitKey<'_>, record: &SourceMetadataRecord) -> bool {
        let needle = format!("{}.png", unit.unit_id);
        record
            .local_image_path
            .as_deref()
            .is_some_and(|path| path.contains(&needle))
    }
}

#[derive(Debug, Default)]
pub struct FilenameInImagePath;

impl MatchStrategy for FilenameInImagePath {
    fn name(&self) -> &'static str {
        "image_path_filename"
    }

    fn matches(&self, unit: &UnitKey<'_>, record: &SourceMetadataRecord) -> bool {
        let Some(filename) = unit.candidate_filename.filter(|name| !name.is_empty()) else {
            return false;
        };
        let needle = filename.to_lowercase();
        record
            .local_image_path
            .as_deref()
            .is_some_and(|path| path.to_lowercase().contains(&needle))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MatchedRecord<'m> {
    pub strategy: &'static str,
    pub index: usize,
    pub record: &'m SourceMetadataRecord,
}

/// Ordered strategy chain. Each strategy is tried against every record
/// before the next strategy runs, so an earlier rule always wins.
pub struct MetadataMatcher {
    strategies: Vec<Box<dyn MatchStrategy>>,
}

impl MetadataMatcher {
    pub fn with_strategies(strategies: Vec<Box<dyn MatchStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|strategy| strategy.name()).collect()
    }

    pub fn find<'m>(
        &self,
        unit: &UnitKey<'_>,
        records: &'m [SourceMetadataRecord],
    ) -> Option<MatchedRecord<'m>> {
        self.strategies.iter().find_map(|strategy| {
            records
                .iter()
                .position(|record| strategy.matches(unit, record))
                .map(|index| MatchedRecord {
                    strategy: strategy.name(),
                    index,
                    record: &records[index],
                })
        })
    }
}

impl Default for MetadataMatcher {
    fn default() -> Self {
        Self::with_strategies(vec![
            Box::new(ExactPosterId),
            Box::new(ImagePathHasUnitPng),
            Box::new(FilenameInImagePath),
        ])
    }
}

impl std::fmt::Debug for MetadataMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataMatcher")
            .field("strategies", &self.strategy_names())
            .finish()
    }
}
