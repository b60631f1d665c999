use std::fmt;

use pes_gateway_shared::types::EntityKind;

use crate::errors::{ClientError, RecordError};

/// What reconciliation did with one remote record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordOutcome {
    Created,
    Updated,
    Unchanged,
    /// A natively-owned local record shares the identifier and was left alone.
    Skipped,
    /// A lookup or role already existed locally and was reused as is.
    Found,
    Deleted,
}

impl RecordOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordOutcome::Created => "created",
            RecordOutcome::Updated => "updated",
            RecordOutcome::Unchanged => "unchanged",
            RecordOutcome::Skipped => "skipped",
            RecordOutcome::Found => "found",
            RecordOutcome::Deleted => "deleted",
        }
    }
}

impl fmt::Display for RecordOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a report entry is about: a synchronized entity kind or a lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    Entity(EntityKind),
    LegalStatus,
    TransverseTheme,
}

impl Subject {
    /// Name of the remote collection this subject is read from.
    pub fn resource(&self) -> &'static str {
        match self {
            Subject::Entity(kind) => kind.resource(),
            Subject::LegalStatus => "legal_statuses",
            Subject::TransverseTheme => "transverse_themes",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Entity(kind) => write!(f, "{kind}"),
            Subject::LegalStatus => f.write_str("legal_status"),
            Subject::TransverseTheme => f.write_str("transverse_theme"),
        }
    }
}

#[derive(Debug)]
pub struct RecordReport {
    pub subject: Subject,
    pub key: String,
    pub result: Result<RecordOutcome, RecordError>,
}

/// Collected outcomes of one import run.
#[derive(Debug, Default)]
pub struct RunReport {
    records: Vec<RecordReport>,
    aborted: Vec<(Subject, ClientError)>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        subject: Subject,
        key: impl Into<String>,
        result: Result<RecordOutcome, RecordError>,
    ) {
        self.records.push(RecordReport {
            subject,
            key: key.into(),
            result,
        });
    }

    /// Records that `subject` could not be fetched and was not reconciled.
    pub fn abort(&mut self, subject: Subject, error: ClientError) {
        self.aborted.push((subject, error));
    }

    pub fn records(&self) -> &[RecordReport] {
        &self.records
    }

    pub fn aborted(&self) -> &[(Subject, ClientError)] {
        &self.aborted
    }

    pub fn is_aborted(&self, subject: Subject) -> bool {
        self.aborted.iter().any(|(aborted, _)| *aborted == subject)
    }

    /// The last result recorded for one record.
    pub fn outcome_of(
        &self,
        subject: Subject,
        key: &str,
    ) -> Option<&Result<RecordOutcome, RecordError>> {
        self.records
            .iter()
            .rev()
            .find(|record| record.subject == subject && record.key == key)
            .map(|record| &record.result)
    }

    pub fn count(&self, subject: Subject, outcome: RecordOutcome) -> usize {
        self.records
            .iter()
            .filter(|record| {
                record.subject == subject && matches!(record.result, Ok(found) if found == outcome)
            })
            .count()
    }

    pub fn errors(&self) -> impl Iterator<Item = &RecordReport> {
        self.records.iter().filter(|record| record.result.is_err())
    }

    /// Whether every record succeeded and every collection was fetched.
    pub fn is_clean(&self) -> bool {
        self.aborted.is_empty() && self.errors().next().is_none()
    }

    /// Number of records whose local copy was written or deleted.
    pub fn changes(&self) -> usize {
        self.records
            .iter()
            .filter(|record| {
                matches!(
                    record.result,
                    Ok(RecordOutcome::Created | RecordOutcome::Updated | RecordOutcome::Deleted)
                )
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_follow_subject_and_outcome() {
        let organizations = Subject::Entity(EntityKind::Organization);
        let mut report = RunReport::new();
        report.push(organizations, "o-1", Ok(RecordOutcome::Created));
        report.push(organizations, "o-2", Ok(RecordOutcome::Unchanged));
        report.push(
            organizations,
            "o-3",
            Err(RecordError::InvalidDocument("broken".into())),
        );
        report.push(Subject::LegalStatus, "asso", Ok(RecordOutcome::Created));

        assert_eq!(report.count(organizations, RecordOutcome::Created), 1);
        assert_eq!(report.changes(), 2);
        assert_eq!(report.errors().count(), 1);
        assert!(!report.is_clean());
        assert!(matches!(
            report.outcome_of(organizations, "o-2"),
            Some(Ok(RecordOutcome::Unchanged))
        ));
        assert!(report.outcome_of(organizations, "o-9").is_none());
    }

    #[test]
    fn test_aborted_subjects_are_tracked() {
        let mut report = RunReport::new();
        report.abort(
            Subject::Entity(EntityKind::Event),
            ClientError::MissingApiKey,
        );

        assert!(report.is_aborted(Subject::Entity(EntityKind::Event)));
        assert!(!report.is_aborted(Subject::Entity(EntityKind::Calendar)));
        assert!(!report.is_clean());
    }
}
