//! Flat buffers addressed through an explicit shape and stride.

use super::grid::{AddressableGrid, Layout, Scalar, StridedView};

/// A flat buffer viewed as a multi-dimensional array.
///
/// The element at multi-index `i` lives at `offset + Σ stride[k] * i[k]`.
/// Strides may be negative, which gives reversed views without copying.
///
/// # Example
///
/// ```
/// use nurbs::{AddressableGrid, StridedGrid};
///
/// // Three 2D control points, packed row-major.
/// let grid = StridedGrid::packed(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0], vec![3, 2]);
/// assert_eq!(grid.get(&[2, 1]), 5.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StridedGrid<F> {
    data: Vec<F>,
    shape: Vec<usize>,
    stride: Vec<isize>,
    offset: usize,
}

impl<F: Scalar> StridedGrid<F> {
    /// Creates a view with explicit strides and offset.
    ///
    /// Consistency between the shape, strides and buffer length is checked
    /// when the grid is handed to a spline definition.
    pub fn new(data: Vec<F>, shape: Vec<usize>, stride: Vec<isize>, offset: usize) -> Self {
        Self {
            data,
            shape,
            stride,
            offset,
        }
    }

    /// Creates a contiguous row-major view, last axis fastest.
    pub fn packed(data: Vec<F>, shape: Vec<usize>) -> Self {
        let mut stride = vec![0isize; shape.len()];
        let mut step = 1isize;
        for (s, &extent) in stride.iter_mut().zip(&shape).rev() {
            *s = step;
            step *= extent as isize;
        }
        Self::new(data, shape, stride, 0)
    }

    /// Packs nested control points of a curve (`[point][coordinate]`).
    pub fn from_rows(rows: &[Vec<F>]) -> Self {
        let width = rows.first().map_or(0, Vec::len);
        let data = rows.iter().flatten().copied().collect();
        Self::packed(data, vec![rows.len(), width])
    }

    /// Backing buffer.
    pub fn data(&self) -> &[F] {
        &self.data
    }

    /// Per-axis strides.
    pub fn strides(&self) -> &[isize] {
        &self.stride
    }

    /// Offset of the zero multi-index.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Consumes the view and returns its buffer.
    pub fn into_data(self) -> Vec<F> {
        self.data
    }

    fn position(&self, index: &[usize]) -> usize {
        let mut pos = self.offset as isize;
        for (&i, &s) in index.iter().zip(&self.stride) {
            pos += i as isize * s;
        }
        pos as usize
    }
}

impl<F: Scalar> AddressableGrid<F> for StridedGrid<F> {
    fn layout(&self) -> Layout {
        Layout::Strided
    }

    fn shape(&self) -> Vec<usize> {
        self.shape.clone()
    }

    /// Every reachable offset must fall inside the buffer.
    fn is_regular(&self) -> bool {
        if self.stride.len() != self.shape.len() {
            return false;
        }
        if self.shape.iter().any(|&extent| extent == 0) {
            return true;
        }
        let (mut lo, mut hi) = (self.offset as isize, self.offset as isize);
        for (&extent, &s) in self.shape.iter().zip(&self.stride) {
            let reach = s * (extent as isize - 1);
            if reach < 0 {
                lo += reach;
            } else {
                hi += reach;
            }
        }
        lo >= 0 && (hi as usize) < self.data.len()
    }

    fn get(&self, index: &[usize]) -> F {
        self.data[self.position(index)]
    }

    fn set(&mut self, index: &[usize], value: F) {
        let pos = self.position(index);
        self.data[pos] = value;
    }

    fn as_strided(&self) -> Option<StridedView<'_, F>> {
        Some(StridedView {
            data: &self.data,
            stride: &self.stride,
            offset: self.offset,
        })
    }
}
