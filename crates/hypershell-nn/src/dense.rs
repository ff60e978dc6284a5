//! Dense layer with gradient accumulation.

use anyhow::{bail, Result};
use candle_core::{DType, Device, Tensor};
use candle_nn::{Linear, Module};

use crate::activation::Activation;
use crate::init::hashed_uniform;

/// `y = activation(W x + b)` over 1-D inputs.
///
/// Gradients from every [`backward`](Self::backward) call are summed into
/// `grad_weight` / `grad_bias` until [`zero_grad`](Self::zero_grad).
#[derive(Debug, Clone)]
pub struct Dense {
    linear: Linear,
    weight: Tensor,
    bias: Tensor,
    grad_weight: Tensor,
    grad_bias: Tensor,
    activation: Activation,
    in_dim: usize,
    out_dim: usize,
}

impl Dense {
    /// Create a layer whose parameters are derived from `(seed, label)`,
    /// uniform in `±1/sqrt(in_dim)`.
    pub fn new(
        in_dim: usize,
        out_dim: usize,
        activation: Activation,
        seed: u64,
        label: &str,
    ) -> Result<Self> {
        let bound = 1.0 / (in_dim.max(1) as f32).sqrt();
        let weight = Tensor::from_vec(
            hashed_uniform(seed, &format!("{label}.weight"), out_dim * in_dim, bound),
            (out_dim, in_dim),
            &Device::Cpu,
        )?;
        let bias = Tensor::from_vec(
            hashed_uniform(seed, &format!("{label}.bias"), out_dim, bound),
            out_dim,
            &Device::Cpu,
        )?;
        Self::from_parts(weight, bias, activation)
    }

    /// Create a layer from explicit parameters. `weight` is `(out, in)`.
    pub fn from_parts(weight: Tensor, bias: Tensor, activation: Activation) -> Result<Self> {
        let (out_dim, in_dim) = weight.dims2()?;
        if bias.dims() != [out_dim] {
            bail!(
                "Bias shape {:?} does not match weight rows {}",
                bias.dims(),
                out_dim
            );
        }
        Ok(Self {
            linear: Linear::new(weight.clone(), Some(bias.clone())),
            grad_weight: Tensor::zeros((out_dim, in_dim), DType::F32, &Device::Cpu)?,
            grad_bias: Tensor::zeros(out_dim, DType::F32, &Device::Cpu)?,
            weight,
            bias,
            activation,
            in_dim,
            out_dim,
        })
    }

    pub fn in_dim(&self) -> usize {
        self.in_dim
    }

    pub fn out_dim(&self) -> usize {
        self.out_dim
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn weight(&self) -> &Tensor {
        &self.weight
    }

    pub fn grad_weight(&self) -> &Tensor {
        &self.grad_weight
    }

    pub fn grad_bias(&self) -> &Tensor {
        &self.grad_bias
    }

    pub fn forward(&self, input: &Tensor) -> Result<Tensor> {
        if input.dims() != [self.in_dim] {
            bail!(
                "Dense input shape {:?}, expected [{}]",
                input.dims(),
                self.in_dim
            );
        }
        let pre = self.linear.forward(&input.unsqueeze(0)?)?.squeeze(0)?;
        self.activation.forward(&pre)
    }

    /// Backpropagate `grad_output` through the layer, given the `input`
    /// and `output` of the matching forward call. Returns the gradient with
    /// respect to `input`.
    pub fn backward(&mut self, input: &Tensor, output: &Tensor, grad_output: &Tensor) -> Result<Tensor> {
        let grad_pre = self.activation.backward(output, grad_output)?;

        let outer = grad_pre.unsqueeze(1)?.matmul(&input.unsqueeze(0)?)?;
        self.grad_weight = self.grad_weight.add(&outer)?;
        self.grad_bias = self.grad_bias.add(&grad_pre)?;

        let grad_input = grad_pre.unsqueeze(0)?.matmul(&self.weight)?.squeeze(0)?;
        Ok(grad_input)
    }

    pub fn zero_grad(&mut self) -> Result<()> {
        self.grad_weight = self.grad_weight.zeros_like()?;
        self.grad_bias = self.grad_bias.zeros_like()?;
        Ok(())
    }

    /// Plain gradient descent: `θ ← θ - lr · ∇θ`.
    pub fn update(&mut self, learning_rate: f64) -> Result<()> {
        self.weight = self.weight.sub(&self.grad_weight.affine(learning_rate, 0.0)?)?;
        self.bias = self.bias.sub(&self.grad_bias.affine(learning_rate, 0.0)?)?;
        self.linear = Linear::new(self.weight.clone(), Some(self.bias.clone()));
        Ok(())
    }

    /// L2 norm of the accumulated gradients (weight and bias together).
    pub fn grad_norm(&self) -> Result<f32> {
        let w = self.grad_weight.sqr()?.sum_all()?.to_scalar::<f32>()?;
        let b = self.grad_bias.sqr()?.sum_all()?.to_scalar::<f32>()?;
        Ok((w + b).sqrt())
    }
}
