//! Addressing schemes built from a classified data source.
//!
//! Strided buffers are read by direct offset arithmetic; every other layout
//! goes through the grid's own indexing. The choice is made once per call
//! rather than once per element.

use super::grid::{AddressableGrid, Scalar};

/// Folds a possibly negative window index into `[0, modulus)`.
#[inline]
pub(crate) fn wrap_index(index: isize, modulus: Option<usize>) -> usize {
    match modulus {
        Some(m) if m > 0 => index.rem_euclid(m as isize) as usize,
        _ => index as usize,
    }
}

/// Advances a row-major multi-index; false once every index was visited.
pub(crate) fn next_index(index: &mut [usize], size: &[usize]) -> bool {
    for d in (0..size.len()).rev() {
        index[d] += 1;
        if index[d] < size[d] {
            return true;
        }
        index[d] = 0;
    }
    false
}

/// Read access to one role's storage.
#[derive(Clone, Copy)]
pub(crate) enum Accessor<'a, F> {
    Strided {
        data: &'a [F],
        stride: &'a [isize],
        offset: usize,
    },
    Indexed(&'a dyn AddressableGrid<F>),
}

impl<'a, F: Scalar> Accessor<'a, F> {
    pub(crate) fn new(grid: &'a dyn AddressableGrid<F>) -> Self {
        match grid.as_strided() {
            Some(view) => Accessor::Strided {
                data: view.data,
                stride: view.stride,
                offset: view.offset,
            },
            None => Accessor::Indexed(grid),
        }
    }

    #[inline]
    pub(crate) fn get(&self, index: &[usize]) -> F {
        match *self {
            Accessor::Strided {
                data,
                stride,
                offset,
            } => {
                let mut pos = offset as isize;
                for (&i, &s) in index.iter().zip(stride) {
                    pos += i as isize * s;
                }
                data[pos as usize]
            }
            Accessor::Indexed(grid) => grid.get(index),
        }
    }
}

/// Knot access by `(axis, index)`, hiding whether knots arrived flat.
#[derive(Clone, Copy)]
pub(crate) struct KnotAccessor<'a, F> {
    grid: &'a dyn AddressableGrid<F>,
    inner: Accessor<'a, F>,
    flat: bool,
}

impl<'a, F: Scalar> KnotAccessor<'a, F> {
    pub(crate) fn new(grid: &'a dyn AddressableGrid<F>, flat: bool) -> Self {
        Self {
            grid,
            inner: Accessor::new(grid),
            flat,
        }
    }

    /// Number of knots stored for `axis` (zero for a uniform axis).
    pub(crate) fn row_len(&self, axis: usize) -> usize {
        if self.flat {
            if axis == 0 {
                self.grid.shape().first().copied().unwrap_or(0)
            } else {
                0
            }
        } else {
            self.grid.row_len(axis)
        }
    }

    #[inline]
    pub(crate) fn knot(&self, axis: usize, index: usize) -> F {
        if self.flat {
            self.inner.get(&[index])
        } else {
            self.inner.get(&[axis, index])
        }
    }
}
