use crate::metrics_consts::SAMPLES_UNIFIED;
use crate::parser::ParsedSample;
use crate::schema::FieldType;

/// How many samples went into a schema, and how many of those were left out.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SampleTally {
    pub total: usize,
    pub empty: usize,
    pub opaque: usize,
}

impl SampleTally {
    pub fn excluded(&self) -> usize {
        self.empty + self.opaque
    }

    pub fn contributing(&self) -> usize {
        self.total - self.excluded()
    }
}

/// The single type describing every contributing sample.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnifiedSchema {
    pub root: FieldType,
    pub tally: SampleTally,
}

impl UnifiedSchema {
    /// Fold samples left to right, starting from `FieldType::Unknown`.
    /// Empty and opaque samples are counted but contribute no structure; zero samples give an
    /// `Unknown` root.
    pub fn unify<'a>(samples: impl IntoIterator<Item = &'a ParsedSample>) -> Self {
        let mut tally = SampleTally::default();
        let mut root = FieldType::Unknown;

        for sample in samples {
            tally.total += 1;
            if sample.is_opaque() {
                tally.opaque += 1;
            } else if sample.is_empty() {
                tally.empty += 1;
            }

            if let Some(value) = sample.structure() {
                root = root.merge(FieldType::from(value));
            }
        }

        metrics::counter!(SAMPLES_UNIFIED, &[("kind", "structured")])
            .increment(tally.contributing() as u64);
        metrics::counter!(SAMPLES_UNIFIED, &[("kind", "empty")]).increment(tally.empty as u64);
        metrics::counter!(SAMPLES_UNIFIED, &[("kind", "opaque")]).increment(tally.opaque as u64);

        Self { root, tally }
    }
}
