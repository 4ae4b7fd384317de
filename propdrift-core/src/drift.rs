//! Drift scoring between a reference and a comparison property distribution

use crate::stats::{self, round2};
use crate::{Property, PropertyDistribution};

/// Drift measurement of one property, every field rounded to two decimals
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DriftRecord {
    /// Kolmogorov-Smirnov statistic
    pub statistic: f64,
    /// Asymptotic p-value of the statistic
    pub p_value: f64,
    /// Mean over the reference frames
    pub mean_reference: f64,
    /// Mean over the comparison frames
    pub mean_comparison: f64,
}

/// Outcome for one property
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyDrift {
    /// Both sides had samples
    Measured(DriftRecord),
    /// At least one side had no samples, so no statistic exists
    Degenerate {
        reference_samples: usize,
        comparison_samples: usize,
    },
}

impl PropertyDrift {
    /// Returns the record when the property was measured
    pub fn record(&self) -> Option<&DriftRecord> {
        match self {
            PropertyDrift::Measured(record) => Some(record),
            PropertyDrift::Degenerate { .. } => None,
        }
    }

    /// Returns true for the degenerate sentinel
    pub fn is_degenerate(&self) -> bool {
        matches!(self, PropertyDrift::Degenerate { .. })
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for PropertyDrift {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        match self {
            PropertyDrift::Measured(record) => serde::Serialize::serialize(record, serializer),
            PropertyDrift::Degenerate {
                reference_samples,
                comparison_samples,
            } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("degenerate", &true)?;
                map.serialize_entry("reference_samples", reference_samples)?;
                map.serialize_entry("comparison_samples", comparison_samples)?;
                map.end()
            }
        }
    }
}

/// Per-property drift, exactly one entry per [`Property`]
#[derive(Debug, Clone, PartialEq)]
pub struct DriftReport {
    entries: [PropertyDrift; Property::COUNT],
}

impl DriftReport {
    /// Gets the outcome for one property
    pub fn get(&self, property: Property) -> &PropertyDrift {
        &self.entries[property as usize]
    }

    /// Iterates over `(property, outcome)` pairs in report order
    pub fn iter(&self) -> impl Iterator<Item = (Property, &PropertyDrift)> + '_ {
        Property::ALL.into_iter().map(|p| (p, self.get(p)))
    }

    /// Properties that could not be measured
    pub fn degenerate_properties(&self) -> Vec<Property> {
        self.iter()
            .filter(|(_, drift)| drift.is_degenerate())
            .map(|(property, _)| property)
            .collect()
    }

    /// Mean of the rounded KS statistics; `None` unless every property was measured
    pub fn overall_drift(&self) -> Option<f64> {
        let statistics = self
            .entries
            .iter()
            .map(|drift| drift.record().map(|r| r.statistic))
            .collect::<Option<Vec<f64>>>()?;
        stats::mean(&statistics)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for DriftReport {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(Property::COUNT))?;
        for (property, drift) in self.iter() {
            map.serialize_entry(property.name(), drift)?;
        }
        map.end()
    }
}

/// Compares two property distributions with the two-sample KS test
#[derive(Debug, Clone, Copy, Default)]
pub struct DriftDetector;

impl DriftDetector {
    /// Creates a new drift detector
    pub fn new() -> Self {
        Self
    }

    /// Scores every property independently
    pub fn compare(
        &self,
        reference: &PropertyDistribution,
        comparison: &PropertyDistribution,
    ) -> DriftReport {
        let entries = Property::ALL.map(|property| {
            let drift = measure(&reference.values(property), &comparison.values(property));
            match drift {
                PropertyDrift::Measured(record) => log::debug!(
                    "{}: D={:.2} p={:.2} mean {:.2} -> {:.2}",
                    property,
                    record.statistic,
                    record.p_value,
                    record.mean_reference,
                    record.mean_comparison
                ),
                PropertyDrift::Degenerate {
                    reference_samples,
                    comparison_samples,
                } => log::warn!(
                    "{}: cannot compare {} reference against {} comparison samples",
                    property,
                    reference_samples,
                    comparison_samples
                ),
            }
            drift
        });

        DriftReport { entries }
    }
}

fn measure(reference: &[f64], comparison: &[f64]) -> PropertyDrift {
    match (
        stats::ks_2samp(reference, comparison),
        stats::mean(reference),
        stats::mean(comparison),
    ) {
        (Ok(test), Some(mean_reference), Some(mean_comparison)) => {
            PropertyDrift::Measured(DriftRecord {
                statistic: round2(test.statistic),
                p_value: round2(test.p_value),
                mean_reference: round2(mean_reference),
                mean_comparison: round2(mean_comparison),
            })
        }
        _ => PropertyDrift::Degenerate {
            reference_samples: reference.len(),
            comparison_samples: comparison.len(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PropertyVector;

    fn distribution(values: &[f64]) -> PropertyDistribution {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| (format!("image_{}", i), PropertyVector::from_fn(|_| v)))
            .collect()
    }

    #[test]
    fn test_identical_distributions_show_no_drift() {
        let reference = distribution(&[1.0, 2.5, 2.5, 7.0, 3.25, 9.0]);
        let report = DriftDetector::new().compare(&reference, &reference.clone());

        for (property, drift) in report.iter() {
            let record = drift.record().unwrap();
            assert_eq!(record.statistic, 0.0, "{property}");
            assert_eq!(record.p_value, 1.0, "{property}");
            assert_eq!(record.mean_reference, record.mean_comparison);
        }
        assert_eq!(report.overall_drift(), Some(0.0));
    }

    #[test]
    fn test_separated_distributions_show_full_drift() {
        let reference = distribution(&[10.0; 25]);
        let comparison = distribution(&[250.0; 25]);
        let report = DriftDetector::new().compare(&reference, &comparison);

        let record = report.get(Property::AverageBrightness).record().unwrap();
        assert_eq!(record.statistic, 1.0);
        assert_eq!(record.p_value, 0.0);
        assert_eq!(record.mean_reference, 10.0);
        assert_eq!(record.mean_comparison, 250.0);
        assert_eq!(report.overall_drift(), Some(1.0));
    }

    #[test]
    fn test_values_are_rounded() {
        let reference = distribution(&[1.0, 1.0, 2.0]);
        let comparison = distribution(&[0.333, 0.334]);
        let report = DriftDetector::new().compare(&reference, &comparison);

        let record = report.get(Property::RmsContrast).record().unwrap();
        assert_eq!(record.mean_reference, 1.33);
        assert_eq!(record.mean_comparison, 0.33);
        assert_eq!(record.statistic, 1.0);
    }

    #[test]
    fn test_empty_side_is_marked_degenerate() {
        let reference = distribution(&[1.0, 2.0, 3.0]);
        let comparison = PropertyDistribution::new();
        let report = DriftDetector::new().compare(&reference, &comparison);

        assert_eq!(report.iter().count(), Property::COUNT);
        for (_, drift) in report.iter() {
            assert_eq!(
                *drift,
                PropertyDrift::Degenerate {
                    reference_samples: 3,
                    comparison_samples: 0
                }
            );
        }
        assert_eq!(report.degenerate_properties(), Property::ALL.to_vec());
        assert_eq!(report.overall_drift(), None);
    }
}
