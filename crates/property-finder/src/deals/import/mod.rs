mod parser;

use std::io::Read;
use std::path::Path;

use super::domain::{MetricObservation, ObservationError};

/// Failure while loading observations from a CSV export.
#[derive(Debug, thiserror::Error)]
pub enum ObservationImportError {
    #[error("failed to read observation export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid observation CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: {source}")]
    Row {
        line: u64,
        #[source]
        source: ObservationError,
    },
}

/// Loads metric observations from `zip_code,metric_type,metric_date,value` CSV files.
pub struct ObservationImporter;

impl ObservationImporter {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<Vec<MetricObservation>, ObservationImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<MetricObservation>, ObservationImportError> {
        parser::parse_observations(reader)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deals::domain::MetricKind;
    use std::io::Cursor;

    #[test]
    fn importer_reads_rows_with_aliases() {
        let csv = "zip_code,metric_type,metric_date,value\n\
07030,zillow_zori,2025-01-01,3100\n\
07030,flood,2024-06-01,true\n\
07030,permit,2025-02-11T09:30:00Z,1\n";

        let observations =
            ObservationImporter::from_reader(Cursor::new(csv)).expect("import succeeds");

        assert_eq!(observations.len(), 3);
        assert_eq!(observations[0].metric_type, MetricKind::RentIndex);
        assert_eq!(observations[0].value, 3100.0);
        assert_eq!(observations[1].metric_type, MetricKind::FloodFlag);
        assert_eq!(observations[1].value, 1.0);
        assert_eq!(observations[2].metric_type, MetricKind::PermitCount);
    }

    #[test]
    fn importer_reports_offending_line() {
        let csv = "zip_code,metric_type,metric_date,value\n\
07030,rent_index,2025-01-01,3100\n\
7030,rent_index,2025-02-01,3120\n";

        let err = ObservationImporter::from_reader(Cursor::new(csv)).expect_err("bad zip");

        match err {
            ObservationImportError::Row { line, source } => {
                assert_eq!(line, 3);
                assert!(matches!(source, ObservationError::InvalidZip { .. }));
            }
            other => panic!("expected row error, got {other:?}"),
        }
    }

    #[test]
    fn importer_rejects_unknown_metrics() {
        let csv = "zip_code,metric_type,metric_date,value\n07030,walk_score,2025-01-01,88\n";

        let err = ObservationImporter::from_reader(Cursor::new(csv)).expect_err("unknown metric");

        assert!(err.to_string().contains("walk_score"));
    }
}
