//! Canned marker datasets.
//!
//! Two static datasets the demo app alternates between on idle. They are
//! embedded at compile time; a real deployment would feed the app from a
//! live source instead.

use crate::error::FixtureError;
use crate::types::MarkerData;

const TESTDATA1: &str = include_str!("../fixtures/testdata1.json");
const TESTDATA2: &str = include_str!("../fixtures/testdata2.json");

/// The pair of datasets the idle handler swaps between.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fixtures {
    /// Chosen when the idle parity check is even.
    pub primary: Vec<MarkerData>,
    /// Chosen when the idle parity check is odd.
    pub secondary: Vec<MarkerData>,
}

impl Fixtures {
    pub fn new(primary: Vec<MarkerData>, secondary: Vec<MarkerData>) -> Self {
        Self { primary, secondary }
    }

    /// The embedded datasets.
    pub fn embedded() -> Result<Self, FixtureError> {
        Ok(Self {
            primary: parse("testdata1", TESTDATA1)?,
            secondary: parse("testdata2", TESTDATA2)?,
        })
    }

    /// Dataset for a timestamp: even milliseconds pick `primary`.
    pub fn for_parity(&self, now_millis: i64) -> &[MarkerData] {
        if now_millis % 2 == 0 {
            &self.primary
        } else {
            &self.secondary
        }
    }
}

/// Decode a JSON array of marker descriptors.
pub fn parse(name: &'static str, json: &str) -> Result<Vec<MarkerData>, FixtureError> {
    serde_json::from_str(json).map_err(|source| FixtureError::Decode { name, source })
}
