//! The record schema and its summary projection.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// Caller-assigned unique record identifier.
pub type RecordId = i64;

/// One stored entity.
///
/// Stored as a single JSON object per line. The score is written under the
/// `gpa` key, which is the name the on-disk format has always used:
///
/// ```text
/// {"id":1,"name":"Ada","gpa":3.9,"active":true}
/// ```
///
/// Only `id` is required when decoding. A line without `name`, `gpa` or
/// `active` decodes with an empty name, a score of `0.0` or an inactive
/// flag respectively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique id.
    pub id: RecordId,
    /// Display name, indexed.
    #[serde(default)]
    pub name: String,
    /// Score, indexed by exact value.
    #[serde(rename = "gpa", default)]
    pub score: f64,
    /// Active flag, indexed.
    #[serde(default)]
    pub active: bool,
}

impl Record {
    /// Creates a record.
    pub fn new(id: RecordId, name: impl Into<String>, score: f64, active: bool) -> Self {
        Self {
            id,
            name: name.into(),
            score,
            active,
        }
    }

    /// Rebuilds a record from its id and cached summary.
    pub fn from_summary(id: RecordId, summary: &Summary) -> Self {
        Self::new(id, summary.name.clone(), summary.score, summary.active)
    }

    /// Returns the indexed projection of this record.
    #[must_use]
    pub fn summary(&self) -> Summary {
        Summary {
            name: self.name.clone(),
            score: self.score,
            active: self.active,
        }
    }

    /// Checks that the record can round-trip through the line format.
    ///
    /// Scores must be finite to survive a JSON round trip.
    pub fn validate(&self) -> CoreResult<()> {
        if !self.score.is_finite() {
            return Err(CoreError::invalid_record(format!(
                "record {} has non-finite score {}",
                self.id, self.score
            )));
        }
        Ok(())
    }

    /// Encodes the record as one line, without terminator.
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        self.validate()?;
        serde_json::to_vec(self).map_err(|e| CoreError::invalid_record(e.to_string()))
    }

    /// Decodes a record from one stored line.
    ///
    /// A trailing line terminator is tolerated.
    pub fn decode(line: &[u8]) -> CoreResult<Self> {
        let trimmed = line
            .strip_suffix(b"\n")
            .unwrap_or(line);
        let trimmed = trimmed.strip_suffix(b"\r").unwrap_or(trimmed);
        serde_json::from_slice(trimmed).map_err(|e| CoreError::parse(e.to_string()))
    }
}

/// The non-id fields of a record, cached per id.
///
/// Lets the index engine find the buckets an id lives in without reading
/// the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Name bucket key.
    pub name: String,
    /// Score bucket key.
    pub score: f64,
    /// Active bucket key.
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_uses_gpa_key() {
        let record = Record::new(1, "Ada", 3.5, true);
        let line = record.encode().unwrap();
        assert_eq!(
            std::str::from_utf8(&line).unwrap(),
            r#"{"id":1,"name":"Ada","gpa":3.5,"active":true}"#
        );
    }

    #[test]
    fn decode_tolerates_terminator() {
        let record = Record::decode(b"{\"id\":2,\"name\":\"B\",\"gpa\":1.0,\"active\":false}\r\n").unwrap();
        assert_eq!(record, Record::new(2, "B", 1.0, false));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            Record::decode(b"not json"),
            Err(CoreError::Parse { .. })
        ));
        assert!(Record::decode(br#"{"name":"x","gpa":1,"active":true}"#).is_err());
        assert!(Record::decode(br#"{"id":1.5,"name":"x","gpa":1,"active":true}"#).is_err());
    }

    #[test]
    fn decode_defaults_absent_fields() {
        assert_eq!(
            Record::decode(br#"{"id":3,"name":"C"}"#).unwrap(),
            Record::new(3, "C", 0.0, false)
        );
        assert_eq!(Record::decode(br#"{"id":4}"#).unwrap(), Record::new(4, "", 0.0, false));
    }

    #[test]
    fn names_with_newlines_stay_on_one_line() {
        let record = Record::new(3, "two\nlines", 2.0, true);
        let line = record.encode().unwrap();
        assert!(!line.contains(&b'\n'));
        assert_eq!(Record::decode(&line).unwrap(), record);
    }

    #[test]
    fn non_finite_score_rejected() {
        for score in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let record = Record::new(4, "x", score, true);
            assert!(matches!(
                record.encode(),
                Err(CoreError::InvalidRecord { .. })
            ));
        }
    }

    #[test]
    fn summary_projection() {
        let summary = Record::new(5, "A", 3.0, true).summary();
        assert_eq!(
            summary,
            Summary {
                name: "A".into(),
                score: 3.0,
                active: true
            }
        );
    }
}
