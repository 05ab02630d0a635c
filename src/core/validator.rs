use crate::bio::identifier::IdentifierPattern;
use crate::bio::record::InputRecord;
use crate::bio::sample_input::ParseReport;
use crate::error::{EmptySampleCause, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// What to do with an identifier that fails the format check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Drop it, record it in the report and keep going.
    #[default]
    Skip,
    /// Fail the whole input.
    Reject,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationPolicy {
    pub pattern: IdentifierPattern,
    pub malformed: MalformedPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedIdentifier {
    pub sample: String,
    pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleSummary {
    pub name: String,
    pub identifiers: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub accepted: usize,
    pub skipped: Vec<SkippedIdentifier>,
    pub duplicates_removed: usize,
    /// Surviving identifier count per sample, in input order.
    pub samples: Vec<SampleSummary>,
}

impl ValidationReport {
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

pub struct RecordValidator {
    policy: ValidationPolicy,
}

impl RecordValidator {
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    /// Filter malformed identifiers, remove per-sample duplicates and check
    /// that every sample keeps at least one identifier.
    pub fn validate(
        &self,
        records: Vec<InputRecord>,
        report: &ParseReport,
    ) -> Result<(Vec<InputRecord>, ValidationReport), ValidationError> {
        if records.is_empty() && report.samples.is_empty() {
            return Err(ValidationError::EmptyInput);
        }

        if let Some(section) = report.samples.iter().find(|s| s.identifier_lines == 0) {
            return Err(ValidationError::EmptySample {
                sample: section.name.clone(),
                cause: EmptySampleCause::NoIdentifiers,
            });
        }

        if records.is_empty() {
            return Err(ValidationError::EmptyInput);
        }

        let total = records.len();
        let mut validation = ValidationReport::default();
        let mut seen: HashSet<(String, String)> = HashSet::with_capacity(total);
        let mut accepted = Vec::with_capacity(total);

        for record in records {
            if !self.policy.pattern.is_match(&record.gene_id) {
                // Under Reject this wins over any sample it would have emptied
                if self.policy.malformed == MalformedPolicy::Reject {
                    return Err(ValidationError::MalformedIdentifier {
                        sample: record.sample_id,
                        identifier: record.gene_id,
                    });
                }
                warn!(
                    sample = %record.sample_id,
                    identifier = %record.gene_id,
                    "skipping identifier that does not match {}",
                    self.policy.pattern.as_str()
                );
                validation.skipped.push(SkippedIdentifier {
                    sample: record.sample_id,
                    identifier: record.gene_id,
                });
                continue;
            }

            if !seen.insert((record.sample_id.clone(), record.gene_id.clone())) {
                validation.duplicates_removed += 1;
                continue;
            }

            accepted.push(record);
        }

        let mut surviving: HashMap<&str, usize> = HashMap::new();
        for record in &accepted {
            *surviving.entry(record.sample_id.as_str()).or_insert(0) += 1;
        }

        for section in &report.samples {
            let identifiers = surviving.get(section.name.as_str()).copied().unwrap_or(0);
            if identifiers == 0 {
                return Err(ValidationError::EmptySample {
                    sample: section.name.clone(),
                    cause: EmptySampleCause::AllMalformed,
                });
            }
            validation.samples.push(SampleSummary {
                name: section.name.clone(),
                identifiers,
            });
        }

        // Only reachable when the records carry samples the report never saw
        if accepted.is_empty() {
            return Err(ValidationError::NoValidIdentifiers { total });
        }

        validation.accepted = accepted.len();
        Ok((accepted, validation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bio::sample_input::parse;
    use crate::error::ValidationErrorKind;

    fn validate(input: &str) -> Result<(Vec<InputRecord>, ValidationReport), ValidationError> {
        let (records, report) = parse(input).unwrap();
        RecordValidator::new(ValidationPolicy::default()).validate(records, &report)
    }

    #[test]
    fn test_valid_input_passes_through() {
        let (records, report) = validate(">S1\nK00031\nK00032\n>S2\nK00031\n").unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(report.accepted, 3);
        assert!(report.skipped.is_empty());
        assert_eq!(report.samples[1].identifiers, 1);
    }

    #[test]
    fn test_malformed_identifier_is_skipped() {
        let (records, report) = validate(">S1\nK00031\nnot_a_ko\nK123\n").unwrap();
        assert_eq!(records, vec![InputRecord::new("S1", "K00031")]);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0].identifier, "NOT_A_KO");
    }

    #[test]
    fn test_reject_policy_fails_on_first_malformed() {
        let (records, report) = parse(">S1\nK00031\nK123\n").unwrap();
        let policy = ValidationPolicy {
            malformed: MalformedPolicy::Reject,
            ..ValidationPolicy::default()
        };
        let err = RecordValidator::new(policy).validate(records, &report).unwrap_err();
        assert_eq!(err.kind(), ValidationErrorKind::MalformedIdentifier);
    }

    #[test]
    fn test_duplicates_within_sample_are_removed() {
        let (records, report) = validate(">S1\nK00031\nk00031\n>S2\nK00031\n").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(report.duplicates_removed, 1);
        assert_eq!(records[1], InputRecord::new("S2", "K00031"));
    }

    #[test]
    fn test_header_without_identifiers_is_empty_sample() {
        let err = validate(">S1\nK00031\n>S2\n>S3\nK00032\n").unwrap_err();
        assert_eq!(
            err,
            ValidationError::EmptySample {
                sample: "S2".to_string(),
                cause: EmptySampleCause::NoIdentifiers
            }
        );
    }

    #[test]
    fn test_sample_emptied_by_filtering() {
        let err = validate(">S1\nK00031\n>S2\nbogus\n").unwrap_err();
        assert_eq!(
            err,
            ValidationError::EmptySample {
                sample: "S2".to_string(),
                cause: EmptySampleCause::AllMalformed
            }
        );
    }

    #[test]
    fn test_every_sample_emptied_reports_first_sample() {
        let expected = ValidationError::EmptySample {
            sample: "S1".to_string(),
            cause: EmptySampleCause::AllMalformed,
        };
        assert_eq!(validate(">S1\nfoo\nbar\n").unwrap_err(), expected);
        assert_eq!(validate(">S1\nfoo\n>S2\nbar\n").unwrap_err(), expected);
    }

    #[test]
    fn test_reject_policy_wins_over_emptied_sample() {
        let (records, report) = parse(">S1\nK00031\n>S2\nbogus\n").unwrap();
        let policy = ValidationPolicy {
            malformed: MalformedPolicy::Reject,
            ..ValidationPolicy::default()
        };
        let err = RecordValidator::new(policy).validate(records, &report).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MalformedIdentifier {
                sample: "S2".to_string(),
                identifier: "BOGUS".to_string(),
            }
        );
    }

    #[test]
    fn test_no_valid_identifiers_without_report_samples() {
        let records = vec![InputRecord::new("S1", "foo"), InputRecord::new("S1", "bar")];
        let err = RecordValidator::new(ValidationPolicy::default())
            .validate(records, &ParseReport::default())
            .unwrap_err();
        assert_eq!(err, ValidationError::NoValidIdentifiers { total: 2 });
    }

    #[test]
    fn test_empty_input() {
        let err = RecordValidator::new(ValidationPolicy::default())
            .validate(Vec::new(), &ParseReport::default())
            .unwrap_err();
        assert_eq!(err, ValidationError::EmptyInput);
    }
}
