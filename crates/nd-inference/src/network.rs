//! Output transform: stacked affine layers with tanh between them.
//!
//! `X_i = X_{i-1} · W_i + b_i`, tanh after every layer except the last. With no
//! weight matrices (null model) the output is the sole intercept broadcast over
//! the rows of Y.

use nalgebra::{DMatrix, DVector};
use nd_core::{Error, Result};

/// Weights, biases and optional scale of one model.
///
/// The last intercept is always the output bias; earlier intercepts are hidden
/// biases, one per hidden layer.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkParams {
    /// Weight matrices in application order (`in × out`)
    pub coeffs: Vec<DMatrix<f64>>,
    /// Bias vectors in application order
    pub intercepts: Vec<DVector<f64>>,
    /// Pre-softplus scale, only used by the normal likelihood
    pub scale: Option<f64>,
}

impl NetworkParams {
    /// Check the layer structure: one intercept per layer, or exactly one for the null model.
    pub fn validate(&self) -> Result<()> {
        let expected = self.coeffs.len().max(1);
        if self.intercepts.len() != expected {
            return Err(Error::shape(
                "network intercepts",
                format!("{expected} intercept vectors"),
                self.intercepts.len(),
            ));
        }
        for (i, (w, b)) in self.coeffs.iter().zip(&self.intercepts).enumerate() {
            if w.ncols() != b.len() {
                return Err(Error::shape(format!("layer {i} bias"), w.ncols(), b.len()));
            }
            if i > 0 && self.coeffs[i - 1].ncols() != w.nrows() {
                return Err(Error::shape(
                    format!("layer {i} weights"),
                    format!("{} rows", self.coeffs[i - 1].ncols()),
                    format!("{} rows", w.nrows()),
                ));
            }
        }
        Ok(())
    }

    /// Whether this is an intercept-only model.
    pub fn is_null(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Total number of scalar parameters.
    pub fn n_parameters(&self) -> usize {
        self.coeffs.iter().map(|w| w.len()).sum::<usize>()
            + self.intercepts.iter().map(|b| b.len()).sum::<usize>()
            + usize::from(self.scale.is_some())
    }

    /// Flatten as coeffs, intercepts, scale (matrices in column-major order).
    pub fn to_flat(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.n_parameters());
        for w in &self.coeffs {
            out.extend_from_slice(w.as_slice());
        }
        for b in &self.intercepts {
            out.extend_from_slice(b.as_slice());
        }
        if let Some(s) = self.scale {
            out.push(s);
        }
        out
    }

    /// Rebuild parameters with this layout from a flat vector.
    pub fn with_flat(&self, flat: &[f64]) -> Result<Self> {
        if flat.len() != self.n_parameters() {
            return Err(Error::shape("flat parameter vector", self.n_parameters(), flat.len()));
        }
        let mut offset = 0;
        let mut take = |len: usize| {
            let chunk = &flat[offset..offset + len];
            offset += len;
            chunk
        };
        let coeffs =
            self.coeffs.iter().map(|w| DMatrix::from_column_slice(w.nrows(), w.ncols(), take(w.len()))).collect();
        let intercepts =
            self.intercepts.iter().map(|b| DVector::from_column_slice(take(b.len()))).collect();
        let scale = self.scale.map(|_| take(1)[0]);
        Ok(Self { coeffs, intercepts, scale })
    }
}

/// Gradient with the same layout as [`NetworkParams`] (scale excluded).
#[derive(Debug, Clone)]
pub struct NetworkGradient {
    /// ∂loss/∂W_i
    pub coeffs: Vec<DMatrix<f64>>,
    /// ∂loss/∂b_i
    pub intercepts: Vec<DVector<f64>>,
}

impl NetworkGradient {
    /// Flatten in [`NetworkParams::to_flat`] order, appending `scale` when given.
    pub fn to_flat(&self, scale: Option<f64>) -> Vec<f64> {
        let mut out = Vec::new();
        for w in &self.coeffs {
            out.extend_from_slice(w.as_slice());
        }
        for b in &self.intercepts {
            out.extend_from_slice(b.as_slice());
        }
        out.extend(scale);
        out
    }
}

/// Intermediate values kept for the backward sweep.
#[derive(Debug, Clone)]
pub struct ForwardPass {
    /// Input of every layer: `X`, then each hidden activation
    inputs: Vec<DMatrix<f64>>,
    /// Final layer output (no nonlinearity)
    pub output: DMatrix<f64>,
}

fn affine(a: &DMatrix<f64>, w: &DMatrix<f64>, b: &DVector<f64>, layer: usize) -> Result<DMatrix<f64>> {
    if a.ncols() != w.nrows() {
        return Err(Error::shape(
            format!("layer {layer} input"),
            format!("{} columns", w.nrows()),
            format!("{} columns", a.ncols()),
        ));
    }
    if b.len() != w.ncols() {
        return Err(Error::shape(format!("layer {layer} bias"), w.ncols(), b.len()));
    }
    let mut z = a * w;
    for (j, mut col) in z.column_iter_mut().enumerate() {
        col.add_scalar_mut(b[j]);
    }
    Ok(z)
}

/// Run the transform and keep every layer input for [`backward`].
pub fn forward_pass(x: &DMatrix<f64>, y: &DMatrix<f64>, params: &NetworkParams) -> Result<ForwardPass> {
    params.validate()?;

    if params.is_null() {
        let b = &params.intercepts[0];
        if b.len() != y.ncols() {
            return Err(Error::shape(
                "null model intercept",
                format!("{} outputs (columns of Y)", y.ncols()),
                b.len(),
            ));
        }
        // fresh N×K allocation: every row owns its own copy of the intercept
        let output = DMatrix::from_fn(y.nrows(), b.len(), |_, j| b[j]);
        return Ok(ForwardPass { inputs: Vec::new(), output });
    }

    let n_layers = params.coeffs.len();
    let mut inputs = Vec::with_capacity(n_layers);
    let mut a = x.clone();
    for (i, (w, b)) in params.coeffs.iter().zip(&params.intercepts).enumerate() {
        let mut z = affine(&a, w, b, i)?;
        if i + 1 < n_layers {
            z.apply(|v| *v = v.tanh());
        }
        inputs.push(std::mem::replace(&mut a, z));
    }
    Ok(ForwardPass { inputs, output: a })
}

/// Model output for inputs `x`, shaped to match the rows of `y`.
pub fn forward(x: &DMatrix<f64>, y: &DMatrix<f64>, params: &NetworkParams) -> Result<DMatrix<f64>> {
    forward_pass(x, y, params).map(|pass| pass.output)
}

/// Backpropagate `grad_output = ∂loss/∂output` through the layers.
pub fn backward(
    pass: &ForwardPass,
    params: &NetworkParams,
    grad_output: &DMatrix<f64>,
) -> Result<NetworkGradient> {
    if grad_output.shape() != pass.output.shape() {
        return Err(Error::shape(
            "output gradient",
            format!("{:?}", pass.output.shape()),
            format!("{:?}", grad_output.shape()),
        ));
    }

    if params.is_null() {
        return Ok(NetworkGradient {
            coeffs: Vec::new(),
            intercepts: vec![grad_output.row_sum().transpose()],
        });
    }

    let n_layers = params.coeffs.len();
    let mut d_coeffs = vec![DMatrix::zeros(0, 0); n_layers];
    let mut d_intercepts = vec![DVector::zeros(0); n_layers];

    let mut g = grad_output.clone();
    for i in (0..n_layers).rev() {
        let a = &pass.inputs[i];
        d_coeffs[i] = a.transpose() * &g;
        d_intercepts[i] = g.row_sum().transpose();
        if i > 0 {
            // a = tanh(z)  =>  ∂a/∂z = 1 - a²
            let da = &g * params.coeffs[i].transpose();
            g = da.zip_map(a, |d, t| d * (1.0 - t * t));
        }
    }

    Ok(NetworkGradient { coeffs: d_coeffs, intercepts: d_intercepts })
}
