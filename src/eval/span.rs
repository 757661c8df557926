//! Knot span location along one parametric axis.

use crate::layout::accessor::{wrap_index, KnotAccessor};
use crate::layout::Scalar;
use crate::spline::Boundary;

/// The knot geometry of one axis, as seen by a single evaluation.
#[derive(Clone, Copy)]
pub(crate) struct Axis<'a, F> {
    pub index: usize,
    pub degree: usize,
    pub size: usize,
    pub boundary: Boundary,
    /// `None` for uniform axes, whose knot `i` has value `i`.
    pub knots: Option<KnotAccessor<'a, F>>,
}

impl<'a, F: Scalar> Axis<'a, F> {
    #[inline]
    fn knot(&self, i: usize) -> F {
        match &self.knots {
            Some(k) => k.knot(self.index, i),
            None => from_index(i),
        }
    }

    /// Valid parameter interval.
    pub fn domain(&self) -> [F; 2] {
        let start = if self.boundary.is_closed() { 0 } else { self.degree };
        [self.knot(start), self.knot(self.size)]
    }

    /// Length of one period of a closed axis.
    pub fn period(&self) -> F {
        self.knot(self.size) - self.knot(0)
    }

    /// Folds `t` into `[knots[0], knots[s])` on closed axes.
    pub fn fold(&self, t: F) -> F {
        if !self.boundary.is_closed() {
            return t;
        }
        let start = self.knot(0);
        let period = self.period();
        let mut u = (t - start) % period;
        if u < F::zero() {
            u = u + period;
        }
        start + u
    }

    /// Returns the span index for `t` together with the folded parameter.
    ///
    /// The span is the rightmost `i < s` with `knots[i] <= t`, clamped to
    /// `[p, s - 1]` on open and clamped axes so the right end of the domain
    /// stays evaluable.
    pub fn locate(&self, t: F) -> (usize, F) {
        let t = self.fold(t);
        let last = self.size - 1;
        let span = match &self.knots {
            None => {
                let floor = t.floor().to_isize().unwrap_or(if t > F::zero() { isize::MAX } else { 0 });
                floor.clamp(0, last as isize) as usize
            }
            Some(_) => {
                let (mut lo, mut hi) = (0, self.size);
                while hi > lo + 1 {
                    let mid = (lo + hi) / 2;
                    if self.knot(mid) > t {
                        hi = mid;
                    } else {
                        lo = mid;
                    }
                }
                lo
            }
        };
        let span = if self.boundary.is_closed() {
            span
        } else {
            span.clamp(self.degree, last)
        };
        (span, t)
    }

    /// Writes the `2p` knots surrounding `span` into `out`.
    ///
    /// Local knot `m` is global knot `span + m - p + 1`. Closed axes borrow
    /// knots across the seam shifted by one period so the window keeps
    /// increasing.
    pub fn window(&self, span: usize, out: &mut [F]) {
        let p = self.degree as isize;
        let s = self.size as isize;
        for (m, slot) in out.iter_mut().enumerate() {
            let i = span as isize + m as isize - p + 1;
            *slot = match (&self.knots, self.boundary) {
                (None, Boundary::Clamped) => from_index(i.clamp(p, s) as usize),
                (None, _) => F::from(i).unwrap_or_else(F::nan),
                (Some(_), Boundary::Closed) if i < 0 => self.knot((i + s) as usize) - self.period(),
                (Some(_), Boundary::Closed) if i > s => self.knot((i - s) as usize) + self.period(),
                (Some(_), _) => self.knot(i as usize),
            };
        }
    }

    /// Control point index of window slot `slot` (`0..=p`), wrapped on closed axes.
    #[inline]
    pub fn control_index(&self, span: usize, slot: usize) -> usize {
        let i = span as isize + slot as isize - self.degree as isize;
        wrap_index(i, self.boundary.is_closed().then_some(self.size))
    }
}

#[inline]
fn from_index<F: Scalar>(i: usize) -> F {
    F::from(i).unwrap_or_else(F::nan)
}
