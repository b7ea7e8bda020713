//! Fixed-dimension dense vectors and their int8-quantized counterpart.
//!
//! The hot tier keeps full-precision `f32` embeddings; the warm tier keeps
//! [`QuantizedVector`] instead to cut memory by roughly 4x. Quantization is
//! per-vector min/max scaling (not a learned codebook), which keeps encode and
//! decode branch-free and allocation-free.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VectorError {
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, VectorError>;

/// A dense, full-precision embedding of a fixed dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vector(pub Vec<f32>);

impl Vector {
    pub fn zero(dim: usize) -> Self {
        Vector(vec![0.0; dim])
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|x| *x == 0.0)
    }

    pub fn check_dim(&self, expected: usize) -> Result<()> {
        if self.0.len() != expected {
            return Err(VectorError::DimensionMismatch {
                expected,
                actual: self.0.len(),
            });
        }
        Ok(())
    }

    pub fn add(&self, other: &Vector) -> Vector {
        Vector(self.0.iter().zip(&other.0).map(|(a, b)| a + b).collect())
    }

    pub fn scale(&self, factor: f32) -> Vector {
        Vector(self.0.iter().map(|x| x * factor).collect())
    }

    pub fn dot(&self, other: &Vector) -> f32 {
        self.0.iter().zip(&other.0).map(|(a, b)| a * b).sum()
    }

    pub fn l2_norm(&self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn l2_distance(&self, other: &Vector) -> f32 {
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }

    pub fn normalize(&self) -> Vector {
        let norm = self.l2_norm();
        if norm <= f32::EPSILON {
            return self.clone();
        }
        self.scale(1.0 / norm)
    }

    /// Cosine similarity in `[-1, 1]`. Zero vectors compare as `0.0`.
    pub fn cosine(&self, other: &Vector) -> f32 {
        let denom = self.l2_norm() * other.l2_norm();
        if denom <= f32::EPSILON {
            return 0.0;
        }
        (self.dot(other) / denom).clamp(-1.0, 1.0)
    }

    /// Per-vector min/max int8 quantization. `scale = range/254`,
    /// `offset = min + range/2`, so `q[i] = round((v[i] - offset) / scale)`
    /// lands in `[-127, 127]`.
    pub fn quantize(&self) -> QuantizedVector {
        if self.0.is_empty() {
            return QuantizedVector {
                data: Vec::new(),
                scale: 1.0,
                offset: 0.0,
            };
        }
        let min = self.0.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = self.0.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let range = (max - min).max(f32::EPSILON);
        let scale = range / 254.0;
        let offset = min + range / 2.0;
        let data = self
            .0
            .iter()
            .map(|v| (((v - offset) / scale).round().clamp(-127.0, 127.0)) as i8)
            .collect();
        QuantizedVector {
            data,
            scale,
            offset,
        }
    }
}

/// `D` `i8` values plus `(scale, offset)` as `f32`, i.e. `D + 8` bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantizedVector {
    pub data: Vec<i8>,
    pub scale: f32,
    pub offset: f32,
}

impl QuantizedVector {
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    /// Exact inverse of [`Vector::quantize`] up to rounding error.
    pub fn to_float(&self) -> Vector {
        Vector(
            self.data
                .iter()
                .map(|q| (*q as f32) * self.scale + self.offset)
                .collect(),
        )
    }

    /// Cosine similarity computed directly on the int8 codes, without
    /// dequantizing to `f32`. Used on the warm tier's hot path where ANN
    /// candidates are re-scored in bulk.
    pub fn approx_cosine(&self, other: &QuantizedVector) -> f32 {
        if self.data.len() != other.data.len() || self.data.is_empty() {
            return 0.0;
        }
        let mut dot = 0i64;
        let mut norm_a = 0i64;
        let mut norm_b = 0i64;
        for (a, b) in self.data.iter().zip(&other.data) {
            let (a, b) = (*a as i64, *b as i64);
            dot += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }
        let denom = (norm_a as f64).sqrt() * (norm_b as f64).sqrt();
        if denom <= f64::EPSILON {
            return 0.0;
        }
        (dot as f64 / denom) as f32
    }
}
