// Types module - Data structures for extracted features
//
// The feature vector is a flat concatenation of five per-clip descriptors.
// Its order is fixed and must match the order the normalizer and classifier
// were fit with.

use std::ops::Range;

use serde::Serialize;

use crate::config::FeatureConfig;

/// Sizes of the five descriptor blocks, in concatenation order:
/// `[zcr(1), chroma(n_chroma), mfcc(n_mfcc), rms(1), mel(n_mels)]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeatureLayout {
    pub n_chroma: usize,
    pub n_mfcc: usize,
    pub n_mels: usize,
}

impl FeatureLayout {
    pub fn from_config(config: &FeatureConfig) -> Self {
        Self {
            n_chroma: config.n_chroma,
            n_mfcc: config.n_mfcc,
            n_mels: config.n_mels,
        }
    }

    /// Total vector length: `1 + n_chroma + n_mfcc + 1 + n_mels`
    pub fn len(&self) -> usize {
        1 + self.n_chroma + self.n_mfcc + 1 + self.n_mels
    }

    pub fn zcr(&self) -> Range<usize> {
        0..1
    }

    pub fn chroma(&self) -> Range<usize> {
        let start = self.zcr().end;
        start..start + self.n_chroma
    }

    pub fn mfcc(&self) -> Range<usize> {
        let start = self.chroma().end;
        start..start + self.n_mfcc
    }

    pub fn rms(&self) -> Range<usize> {
        let start = self.mfcc().end;
        start..start + 1
    }

    pub fn mel(&self) -> Range<usize> {
        let start = self.rms().end;
        start..start + self.n_mels
    }
}

impl Default for FeatureLayout {
    fn default() -> Self {
        Self::from_config(&FeatureConfig::default())
    }
}

/// Per-clip feature vector in [`FeatureLayout`] order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    layout: FeatureLayout,
    values: Vec<f32>,
}

impl FeatureVector {
    /// Concatenate the five descriptor blocks in layout order.
    pub(crate) fn from_parts(
        layout: FeatureLayout,
        zcr: f32,
        chroma: &[f32],
        mfcc: &[f32],
        rms: f32,
        mel: &[f32],
    ) -> Self {
        debug_assert_eq!(chroma.len(), layout.n_chroma);
        debug_assert_eq!(mfcc.len(), layout.n_mfcc);
        debug_assert_eq!(mel.len(), layout.n_mels);

        let mut values = Vec::with_capacity(layout.len());
        values.push(zcr);
        values.extend_from_slice(chroma);
        values.extend_from_slice(mfcc);
        values.push(rms);
        values.extend_from_slice(mel);

        Self { layout, values }
    }

    pub fn layout(&self) -> FeatureLayout {
        self.layout
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn zcr(&self) -> f32 {
        self.values[self.layout.zcr().start]
    }

    pub fn chroma(&self) -> &[f32] {
        &self.values[self.layout.chroma()]
    }

    pub fn mfcc(&self) -> &[f32] {
        &self.values[self.layout.mfcc()]
    }

    pub fn rms(&self) -> f32 {
        self.values[self.layout.rms().start]
    }

    pub fn mel(&self) -> &[f32] {
        &self.values[self.layout.mel()]
    }

    /// Index of the first NaN or infinite value, if any
    pub fn first_non_finite(&self) -> Option<usize> {
        self.values.iter().position(|v| !v.is_finite())
    }

    pub fn into_values(self) -> Vec<f32> {
        self.values
    }
}
