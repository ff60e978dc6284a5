//! Shell processing units for rooted hypershells.
//!
//! The numeric side of the hypershell lives here, behind a narrow surface:
//! - [`Dense`]: linear transform followed by a selectable [`Activation`]
//! - [`ShellUnit`]: one processing unit, one attention unit and one
//!   aggregation unit, instantiated per shell depth
//! - [`Aggregation`]: how a shell pools its node activations
//!
//! Every forward op has an explicit backward counterpart that accumulates
//! gradients into the layer; [`ShellUnit::update`] applies a plain
//! gradient-descent step. All tensors are `f32` on the CPU device.

pub mod activation;
pub mod dense;
pub mod init;
pub mod units;

pub use activation::{Activation, Aggregation};
pub use dense::Dense;
pub use init::hashed_uniform;
pub use units::{NodeTrace, ShellTrace, ShellUnit, ShellUnitConfig};

use anyhow::Result;
use candle_core::{Device, Tensor};

/// Build a 1-D CPU tensor from a slice.
pub fn to_tensor(values: &[f32]) -> Result<Tensor> {
    Ok(Tensor::from_vec(values.to_vec(), values.len(), &Device::Cpu)?)
}

/// Copy a 1-D tensor back into a `Vec<f32>`.
pub fn to_vec(tensor: &Tensor) -> Result<Vec<f32>> {
    Ok(tensor.to_vec1::<f32>()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tensor_roundtrip() {
        let values = vec![0.5, -1.0, 2.25];
        let t = to_tensor(&values).unwrap();
        assert_eq!(t.dims(), &[3]);
        assert_eq!(to_vec(&t).unwrap(), values);
    }
}
