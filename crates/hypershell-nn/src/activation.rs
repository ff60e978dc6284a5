//! Closed sets of elementwise nonlinearities and pooling rules.
//!
//! Both enums parse from the snake_case names used in configuration files,
//! so a misspelled name fails at load time instead of at dispatch time.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use candle_core::{DType, Tensor};
use serde::{Deserialize, Serialize};

// ============================================================================
// Activation
// ============================================================================

/// Elementwise nonlinearity applied after a linear transform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Tanh,
    Sigmoid,
    Relu,
    Identity,
}

impl Activation {
    pub fn forward(&self, xs: &Tensor) -> Result<Tensor> {
        let ys = match self {
            Self::Tanh => xs.tanh()?,
            Self::Sigmoid => candle_nn::ops::sigmoid(xs)?,
            Self::Relu => xs.relu()?,
            Self::Identity => xs.clone(),
        };
        Ok(ys)
    }

    /// Gradient with respect to the pre-activation, computed from the
    /// cached output `ys` and the incoming gradient.
    pub fn backward(&self, ys: &Tensor, grad: &Tensor) -> Result<Tensor> {
        let local = match self {
            // d tanh = 1 - y²
            Self::Tanh => ys.sqr()?.affine(-1.0, 1.0)?,
            // d sigmoid = y (1 - y)
            Self::Sigmoid => ys.mul(&ys.affine(-1.0, 1.0)?)?,
            Self::Relu => ys.gt(&ys.zeros_like()?)?.to_dtype(DType::F32)?,
            Self::Identity => return Ok(grad.clone()),
        };
        Ok(grad.mul(&local)?)
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tanh => write!(f, "tanh"),
            Self::Sigmoid => write!(f, "sigmoid"),
            Self::Relu => write!(f, "relu"),
            Self::Identity => write!(f, "identity"),
        }
    }
}

impl FromStr for Activation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tanh" => Ok(Self::Tanh),
            "sigmoid" => Ok(Self::Sigmoid),
            "relu" => Ok(Self::Relu),
            "identity" | "linear" => Ok(Self::Identity),
            _ => Err(format!("Unknown activation: {}", s)),
        }
    }
}

// ============================================================================
// Aggregation
// ============================================================================

/// How a shell pools the activations of its nodes into one vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    #[default]
    Mean,
    Max,
    Min,
    Sum,
}

impl Aggregation {
    /// Pool equally-sized 1-D rows into a single 1-D tensor.
    pub fn reduce(&self, rows: &[Tensor]) -> Result<Tensor> {
        if rows.is_empty() {
            bail!("Cannot aggregate an empty shell");
        }
        let stacked = Tensor::stack(rows, 0)?;
        let pooled = match self {
            Self::Mean => stacked.mean(0)?,
            Self::Max => stacked.max(0)?,
            Self::Min => stacked.min(0)?,
            Self::Sum => stacked.sum(0)?,
        };
        Ok(pooled)
    }

    /// Distribute the gradient of the pooled vector back onto each row.
    ///
    /// For `Max`/`Min` every row that attains the extremum receives the
    /// full gradient in that slot.
    pub fn backward(&self, rows: &[Tensor], pooled: &Tensor, grad: &Tensor) -> Result<Vec<Tensor>> {
        let mut grads = Vec::with_capacity(rows.len());
        match self {
            Self::Mean => {
                let scaled = grad.affine(1.0 / rows.len().max(1) as f64, 0.0)?;
                grads.resize(rows.len(), scaled);
            }
            Self::Sum => grads.resize(rows.len(), grad.clone()),
            Self::Max | Self::Min => {
                for row in rows {
                    let mask = row.eq(pooled)?.to_dtype(DType::F32)?;
                    grads.push(grad.mul(&mask)?);
                }
            }
        }
        Ok(grads)
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mean => write!(f, "mean"),
            Self::Max => write!(f, "max"),
            Self::Min => write!(f, "min"),
            Self::Sum => write!(f, "sum"),
        }
    }
}

impl FromStr for Aggregation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mean" | "average" => Ok(Self::Mean),
            "max" | "logical_or" => Ok(Self::Max),
            "min" | "logical_and" => Ok(Self::Min),
            "sum" => Ok(Self::Sum),
            _ => Err(format!("Unknown aggregation: {}", s)),
        }
    }
}
