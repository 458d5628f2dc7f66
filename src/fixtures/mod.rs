//! Regression fixtures for the prediction pipeline.
//!
//! A fixture is a WAV clip plus an optional `<name>.expect.json` naming the
//! emotion the pipeline must report and the minimum confidence it must reach.
//! The CLI `check-fixtures` command and the integration suites run every
//! fixture through an [`EmotionPipeline`] and report a JSON diff on mismatch.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::pipeline::{EmotionPipeline, PredictionResult};

/// Default location for fixture WAV/JSON assets.
pub const DEFAULT_FIXTURE_ROOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures");

/// Metadata describing an available fixture.
#[derive(Clone, Debug)]
pub struct FixtureMetadata {
    pub name: String,
    pub wav_path: PathBuf,
    pub expect_path: Option<PathBuf>,
}

/// A fixture ready to run: location plus parsed expectation.
#[derive(Clone, Debug)]
pub struct FixtureCase {
    pub metadata: FixtureMetadata,
    pub expectation: Option<FixtureExpectation>,
}

/// JSON expectation schema for fixture verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureExpectation {
    pub label: String,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_min_confidence() -> f32 {
    50.0
}

impl FixtureExpectation {
    pub fn verify(&self, actual: &PredictionResult) -> std::result::Result<(), ExpectationDiff> {
        let mut failures = Vec::new();

        match actual {
            PredictionResult::Success {
                emotion,
                confidence,
                ..
            } => {
                if *emotion != self.label {
                    failures.push(format!(
                        "expected label '{}', got '{}'",
                        self.label, emotion
                    ));
                }
                if *confidence <= self.min_confidence {
                    failures.push(format!(
                        "expected confidence > {:.1}, got {:.1}",
                        self.min_confidence, confidence
                    ));
                }
            }
            PredictionResult::Failure { message, .. } => {
                failures.push(format!("prediction failed: {}", message));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ExpectationDiff {
                expected: self.clone(),
                actual: actual.clone(),
                failures,
            })
        }
    }
}

/// Outcome of comparing an actual result with an expectation.
#[derive(Debug, Clone)]
pub struct ExpectationDiff {
    pub expected: FixtureExpectation,
    pub actual: PredictionResult,
    pub failures: Vec<String>,
}

impl ExpectationDiff {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "expected": self.expected,
            "actual": self.actual,
            "failures": self.failures,
        })
    }
}

/// Result of running one fixture.
#[derive(Debug, Clone)]
pub struct FixtureOutcome {
    pub name: String,
    pub result: PredictionResult,
    /// `None` when the fixture has no expectation or it was met
    pub diff: Option<ExpectationDiff>,
}

impl FixtureOutcome {
    pub fn passed(&self) -> bool {
        self.diff.is_none()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "fixture": self.name,
            "passed": self.passed(),
            "result": self.result,
            "diff": self.diff.as_ref().map(ExpectationDiff::to_json),
        })
    }
}

/// Catalog responsible for discovering fixtures on disk.
pub struct FixtureCatalog {
    root: PathBuf,
}

impl FixtureCatalog {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List all fixtures by their metadata.
    pub fn discover(&self) -> Result<Vec<FixtureMetadata>> {
        let mut fixtures = Vec::new();
        if !self.root.exists() {
            return Ok(fixtures);
        }

        for entry in fs::read_dir(&self.root)
            .with_context(|| format!("listing {}", self.root.display()))?
        {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                let path = entry.path();
                if path.extension().and_then(|ext| ext.to_str()) == Some("wav") {
                    fixtures.push(metadata_for_path(&path)?);
                }
            }
        }

        fixtures.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(fixtures)
    }

    /// Load a fixture by name or path, optionally overriding its expectation file.
    pub fn load(&self, fixture: &str, override_expect: Option<PathBuf>) -> Result<FixtureCase> {
        let wav_path = self.resolve_fixture_path(fixture)?;
        let metadata = metadata_for_path(&wav_path)?;
        let expectation_path = override_expect.or_else(|| metadata.expect_path.clone());
        let expectation = expectation_path
            .map(|path| read_expectation(&path))
            .transpose()?;

        Ok(FixtureCase {
            metadata,
            expectation,
        })
    }

    /// Run every discovered fixture through `pipeline`.
    pub fn run_all(&self, pipeline: &EmotionPipeline) -> Result<Vec<FixtureOutcome>> {
        self.discover()?
            .into_iter()
            .map(|metadata| {
                let expectation = metadata
                    .expect_path
                    .as_deref()
                    .map(read_expectation)
                    .transpose()?;
                Ok(run_fixture(
                    pipeline,
                    &FixtureCase {
                        metadata,
                        expectation,
                    },
                ))
            })
            .collect()
    }

    fn resolve_fixture_path(&self, fixture: &str) -> Result<PathBuf> {
        let as_path = Path::new(fixture);
        if as_path.exists() {
            return Ok(as_path.to_path_buf());
        }

        let candidate = self.root.join(format!("{fixture}.wav"));
        if candidate.exists() {
            Ok(candidate)
        } else {
            Err(anyhow!(
                "Fixture '{fixture}' not found in {}",
                self.root.display()
            ))
        }
    }
}

impl Default for FixtureCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_FIXTURE_ROOT)
    }
}

/// Predict one fixture and compare against its expectation.
pub fn run_fixture(pipeline: &EmotionPipeline, case: &FixtureCase) -> FixtureOutcome {
    let result = pipeline.predict(&case.metadata.wav_path);
    let diff = case
        .expectation
        .as_ref()
        .and_then(|expectation| expectation.verify(&result).err());

    if let Some(diff) = &diff {
        log::warn!(
            "[Fixtures] {} failed: {}",
            case.metadata.name,
            diff.failures.join("; ")
        );
    }

    FixtureOutcome {
        name: case.metadata.name.clone(),
        result,
        diff,
    }
}

fn metadata_for_path(wav_path: &Path) -> Result<FixtureMetadata> {
    let name = wav_path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("Invalid fixture name for {}", wav_path.display()))?
        .to_string();
    let expect_path = wav_path.with_extension("expect.json");
    Ok(FixtureMetadata {
        name,
        wav_path: wav_path.to_path_buf(),
        expect_path: expect_path.exists().then_some(expect_path),
    })
}

fn read_expectation(path: &Path) -> Result<FixtureExpectation> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading expectation {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))
}
