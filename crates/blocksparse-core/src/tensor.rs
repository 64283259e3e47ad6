//! Minimal dense tensor
//!
//! Row-major `f32` storage with an explicit shape. This is just enough of a
//! host tensor to carry operands in and results out: element-count checked
//! construction, reshaping, and batch-level concatenation.

use crate::error::{Error, Result};

/// Row-major `f32` tensor
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl Tensor {
    /// Wrap `data` with `shape`; the element counts must agree
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(Error::shape_mismatch(
                "tensor construction",
                format!(
                    "shape {:?} holds {expected} values, got {}",
                    shape,
                    data.len()
                ),
            ));
        }
        Ok(Self { shape, data })
    }

    /// All-zero tensor
    pub fn zeros(shape: Vec<usize>) -> Self {
        let len = shape.iter().product();
        Self {
            shape,
            data: vec![0.0; len],
        }
    }

    /// Tensor whose value at flat position `i` is `f(i)`
    pub fn from_fn(shape: Vec<usize>, f: impl FnMut(usize) -> f32) -> Self {
        let len = shape.iter().product();
        Self {
            shape,
            data: (0..len).map(f).collect(),
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Same values under a new shape with the same element count
    pub fn reshape(self, shape: Vec<usize>) -> Result<Self> {
        Self::new(shape, self.data)
    }

    /// Product of all dimensions before the last `trailing`
    pub fn leading_size(&self, trailing: usize) -> usize {
        let keep = self.shape.len().saturating_sub(trailing);
        self.shape[..keep].iter().product()
    }

    /// Apply `f` element-wise
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        Self {
            shape: self.shape.clone(),
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Element-wise sum of two tensors with identical shapes
    pub fn add(&self, other: &Tensor) -> Result<Self> {
        if self.shape != other.shape {
            return Err(Error::shape_mismatch(
                "tensor add",
                format!("{:?} vs {:?}", self.shape, other.shape),
            ));
        }
        Ok(Self {
            shape: self.shape.clone(),
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(a, b)| a + b)
                .collect(),
        })
    }

    /// Swap the last two dimensions, materializing the result
    pub fn transpose_last_two(&self) -> Result<Self> {
        let rank = self.shape.len();
        if rank < 2 {
            return Err(Error::shape_mismatch(
                "transpose",
                format!("need at least 2 dimensions, got {rank}"),
            ));
        }
        let (rows, cols) = (self.shape[rank - 2], self.shape[rank - 1]);
        let mut shape = self.shape.clone();
        shape.swap(rank - 2, rank - 1);

        let mut data = vec![0.0; self.data.len()];
        let plane = rows * cols;
        if plane > 0 {
            for (src, dst) in self.data.chunks(plane).zip(data.chunks_mut(plane)) {
                for r in 0..rows {
                    for c in 0..cols {
                        dst[c * rows + r] = src[r * cols + c];
                    }
                }
            }
        }
        Ok(Self { shape, data })
    }

    /// Keep the leading `rows × cols` corner of every matrix in the batch
    pub fn crop_last_two(&self, rows: usize, cols: usize) -> Result<Self> {
        let rank = self.shape.len();
        if rank < 2 || self.shape[rank - 2] < rows || self.shape[rank - 1] < cols {
            return Err(Error::shape_mismatch(
                "crop",
                format!("cannot take {rows}x{cols} from {:?}", self.shape),
            ));
        }
        let (src_rows, src_cols) = (self.shape[rank - 2], self.shape[rank - 1]);
        let mut shape = self.shape.clone();
        shape[rank - 2] = rows;
        shape[rank - 1] = cols;
        if (rows, cols) == (src_rows, src_cols) {
            return Ok(self.clone());
        }

        let batches = self.leading_size(2);
        let mut data = Vec::with_capacity(batches * rows * cols);
        for b in 0..batches {
            let plane = &self.data[b * src_rows * src_cols..(b + 1) * src_rows * src_cols];
            for r in 0..rows {
                data.extend_from_slice(&plane[r * src_cols..r * src_cols + cols]);
            }
        }
        Ok(Self { shape, data })
    }

    /// Stack tensors along a new flattened batch dimension
    ///
    /// Every part must share the same trailing `trailing` dimensions; the
    /// result has shape `[total_batches, ...trailing]`.
    pub fn concat_batches(parts: &[Tensor], trailing: usize) -> Result<Self> {
        let first = parts.first().ok_or_else(|| {
            Error::InvalidParameter("cannot concatenate zero tensors".to_string())
        })?;
        let tail = Self::tail(first, trailing)?;

        let mut batches = 0;
        let mut data = Vec::new();
        for part in parts {
            if Self::tail(part, trailing)? != tail {
                return Err(Error::shape_mismatch(
                    "batch concatenation",
                    format!("{:?} vs {:?}", part.shape, first.shape),
                ));
            }
            batches += part.leading_size(trailing);
            data.extend_from_slice(&part.data);
        }

        let mut shape = vec![batches];
        shape.extend_from_slice(tail);
        Self::new(shape, data)
    }

    /// Split the flattened batch dimension into chunks of `sizes` batches
    pub fn split_batches(&self, sizes: &[usize], trailing: usize) -> Result<Vec<Tensor>> {
        let tail = Self::tail(self, trailing)?;
        let total: usize = sizes.iter().sum();
        if total != self.leading_size(trailing) {
            return Err(Error::size_mismatch(
                self.leading_size(trailing),
                total,
                "batch split",
            ));
        }
        let per_batch: usize = tail.iter().product();
        let mut offset = 0;
        sizes
            .iter()
            .map(|&n| {
                let mut shape = vec![n];
                shape.extend_from_slice(tail);
                let part = self.data[offset..offset + n * per_batch].to_vec();
                offset += n * per_batch;
                Self::new(shape, part)
            })
            .collect()
    }

    fn tail(tensor: &Tensor, trailing: usize) -> Result<&[usize]> {
        let rank = tensor.shape.len();
        if rank < trailing {
            return Err(Error::shape_mismatch(
                "batch dimensions",
                format!("need at least {trailing} dimensions, got {rank}"),
            ));
        }
        Ok(&tensor.shape[rank - trailing..])
    }
}
