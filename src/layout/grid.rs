//! The addressable-grid capability and its nested-`Vec` implementations.

use num_traits::Float;
use std::fmt;

/// Floating-point scalar usable as spline data: `f32` or `f64`.
///
/// Implemented explicitly rather than for every `Float` so the nested `Vec`
/// grid implementations below stay coherent.
pub trait Scalar: Float + fmt::Debug + Send + Sync + 'static {}

impl Scalar for f32 {}
impl Scalar for f64 {}

/// Storage kind of a data source, as recorded in a specialization key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// Nested sequences (`Vec<Vec<...>>`).
    Nested,
    /// A flat buffer addressed through per-axis strides.
    Strided,
    /// A user-provided get/set-indexable source.
    Custom,
}

impl Layout {
    /// Short tag used when rendering specialization keys.
    pub fn tag(self) -> &'static str {
        match self {
            Layout::Nested => "Nested",
            Layout::Strided => "Strided",
            Layout::Custom => "Custom",
        }
    }
}

/// Borrowed raw parts of a strided buffer, used for direct offset addressing.
#[derive(Debug, Clone, Copy)]
pub struct StridedView<'a, F> {
    /// Backing storage.
    pub data: &'a [F],
    /// Per-axis element strides.
    pub stride: &'a [isize],
    /// Offset of the element at the zero multi-index.
    pub offset: usize,
}

/// A multi-dimensional, element-addressable data source.
///
/// Control points are addressed as `[i_0, .., i_{M-1}, coordinate]`, weights as
/// `[i_0, .., i_{M-1}]` and knots as `[axis, knot]`.
///
/// Implement this trait to evaluate splines directly over custom storage; the
/// default [`layout`](AddressableGrid::layout) reports [`Layout::Custom`].
///
/// # Example
///
/// ```
/// use nurbs::{AddressableGrid, Nurbs, SplineDefinition};
///
/// // A curve whose control points are computed on the fly.
/// #[derive(Debug)]
/// struct Parabola(usize);
///
/// impl AddressableGrid<f64> for Parabola {
///     fn shape(&self) -> Vec<usize> {
///         vec![self.0, 1]
///     }
///     fn get(&self, index: &[usize]) -> f64 {
///         (index[0] * index[0]) as f64
///     }
///     fn set(&mut self, _index: &[usize], _value: f64) {}
/// }
///
/// let spline = Nurbs::configure(SplineDefinition::new().points(Parabola(4)).degree(1)).unwrap();
/// assert_eq!(spline.size(), vec![4]);
/// ```
pub trait AddressableGrid<F>: fmt::Debug + Send + Sync {
    /// Storage kind of this source.
    fn layout(&self) -> Layout {
        Layout::Custom
    }

    /// Extents found by following the zeroth entry of every level.
    fn shape(&self) -> Vec<usize>;

    /// Whether every multi-index inside [`shape`](AddressableGrid::shape)
    /// addresses a stored value.
    fn is_regular(&self) -> bool {
        true
    }

    /// Length of the sequence stored at `row` of the outermost level.
    fn row_len(&self, row: usize) -> usize {
        let shape = self.shape();
        match shape.as_slice() {
            [rows, len, ..] if row < *rows => *len,
            _ => 0,
        }
    }

    /// Reads the element at `index`.
    fn get(&self, index: &[usize]) -> F;

    /// Writes the element at `index`.
    fn set(&mut self, index: &[usize], value: F);

    /// Raw strided parts, when the source is a strided buffer.
    fn as_strided(&self) -> Option<StridedView<'_, F>> {
        None
    }
}

fn first_len<T>(rows: &[Vec<T>]) -> usize {
    rows.first().map_or(0, Vec::len)
}

impl<F: Scalar> AddressableGrid<F> for Vec<F> {
    fn layout(&self) -> Layout {
        Layout::Nested
    }

    fn shape(&self) -> Vec<usize> {
        vec![self.len()]
    }

    fn row_len(&self, _row: usize) -> usize {
        0
    }

    fn get(&self, index: &[usize]) -> F {
        self[index[0]]
    }

    fn set(&mut self, index: &[usize], value: F) {
        self[index[0]] = value;
    }
}

impl<F: Scalar> AddressableGrid<F> for Vec<Vec<F>> {
    fn layout(&self) -> Layout {
        Layout::Nested
    }

    fn shape(&self) -> Vec<usize> {
        vec![self.len(), first_len(self)]
    }

    fn is_regular(&self) -> bool {
        let n = first_len(self);
        self.iter().all(|row| row.len() == n)
    }

    fn row_len(&self, row: usize) -> usize {
        self.as_slice().get(row).map_or(0, Vec::len)
    }

    fn get(&self, index: &[usize]) -> F {
        self[index[0]][index[1]]
    }

    fn set(&mut self, index: &[usize], value: F) {
        self[index[0]][index[1]] = value;
    }
}

impl<F: Scalar> AddressableGrid<F> for Vec<Vec<Vec<F>>> {
    fn layout(&self) -> Layout {
        Layout::Nested
    }

    fn shape(&self) -> Vec<usize> {
        let inner = self.first().map_or(0, |rows| first_len(rows));
        vec![self.len(), first_len(self), inner]
    }

    fn is_regular(&self) -> bool {
        let shape = AddressableGrid::<F>::shape(self);
        self.iter().all(|rows| {
            rows.len() == shape[1] && rows.iter().all(|row| row.len() == shape[2])
        })
    }

    fn get(&self, index: &[usize]) -> F {
        self[index[0]][index[1]][index[2]]
    }

    fn set(&mut self, index: &[usize], value: F) {
        self[index[0]][index[1]][index[2]] = value;
    }
}

impl<F: Scalar> AddressableGrid<F> for Vec<Vec<Vec<Vec<F>>>> {
    fn layout(&self) -> Layout {
        Layout::Nested
    }

    fn shape(&self) -> Vec<usize> {
        let planes = self.first();
        let rows = planes.and_then(|p| p.first());
        vec![
            self.len(),
            planes.map_or(0, Vec::len),
            rows.map_or(0, Vec::len),
            rows.and_then(|r| r.first()).map_or(0, Vec::len),
        ]
    }

    fn is_regular(&self) -> bool {
        let shape = AddressableGrid::<F>::shape(self);
        self.iter().all(|planes| {
            planes.len() == shape[1]
                && planes.iter().all(|rows| {
                    rows.len() == shape[2] && rows.iter().all(|row| row.len() == shape[3])
                })
        })
    }

    fn get(&self, index: &[usize]) -> F {
        self[index[0]][index[1]][index[2]][index[3]]
    }

    fn set(&mut self, index: &[usize], value: F) {
        self[index[0]][index[1]][index[2]][index[3]] = value;
    }
}

/// Per-axis knot vectors where `None` leaves an axis uniform.
impl<F: Scalar> AddressableGrid<F> for Vec<Option<Vec<F>>> {
    fn layout(&self) -> Layout {
        Layout::Nested
    }

    fn shape(&self) -> Vec<usize> {
        let len = self.iter().flatten().next().map_or(0, Vec::len);
        vec![self.len(), len]
    }

    fn row_len(&self, row: usize) -> usize {
        self.as_slice()
            .get(row)
            .and_then(Option::as_ref)
            .map_or(0, Vec::len)
    }

    fn get(&self, index: &[usize]) -> F {
        match &self[index[0]] {
            Some(row) => row[index[1]],
            None => F::nan(),
        }
    }

    fn set(&mut self, index: &[usize], value: F) {
        if let Some(row) = &mut self[index[0]] {
            row[index[1]] = value;
        }
    }
}
