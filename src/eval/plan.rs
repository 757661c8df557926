//! Recursion plans: the de Boor triangle of one spline shape, unrolled.
//!
//! A plan lists, in order, every blend or difference the recursion performs
//! over the window of `∏(p_d + 1)` cells. It depends only on the shape, so it
//! is compiled once per key and replayed for every evaluation.

use crate::cache;
use crate::spline::SpecializationKey;
use log::debug;
use std::fmt;
use std::sync::Arc;

/// Identifies one evaluation procedure: a shape plus the requested mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct PlanKey {
    pub spline: SpecializationKey,
    /// Derivative order per axis; empty for plain evaluation.
    pub derivative: Vec<usize>,
    pub basis: bool,
    /// Differences act on the weighted coordinates and the weight alike, with
    /// no quotient rule; the caller projects.
    pub homogeneous: bool,
}

impl PlanKey {
    pub fn point(spline: SpecializationKey) -> Self {
        Self {
            spline,
            derivative: Vec::new(),
            basis: false,
            homogeneous: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reduction {
    /// Convex combination of neighbouring cells.
    Blend,
    /// Scaled forward difference, the derivative of a blend.
    Difference { coefficient: usize },
}

/// One pass slot of the recursion along one axis.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Step {
    pub axis: usize,
    /// Positions of the interval ends in the flat knot window.
    pub left: usize,
    pub right: usize,
    pub reduction: Reduction,
    /// `(target, source)` cell pairs; the source sits one slot lower on `axis`.
    pub pairs: Vec<(usize, usize)>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EvaluationPlan {
    pub degrees: Vec<usize>,
    /// Start of each axis' `2p` knots in the flat knot window.
    pub knot_offsets: Vec<usize>,
    pub knot_len: usize,
    /// Window slot of every cell along every axis, `cells × axes`, row-major.
    pub slots: Vec<usize>,
    pub cells: usize,
    pub rational: bool,
    pub basis: bool,
    pub homogeneous: bool,
    pub derivative: Vec<usize>,
    /// A derivative order exceeds its degree: the result is zero.
    pub vanishes: bool,
    pub steps: Vec<Step>,
}

impl EvaluationPlan {
    /// Fetches the plan for `key` from the process-wide cache.
    ///
    /// Splines configured with `debug` log the plan on every lookup.
    pub fn cached(key: &PlanKey) -> Arc<Self> {
        let plan = cache::evaluation_plans().get_or_compile(key, Self::compile);
        if key.spline.debug {
            debug!("{}\n{}", key.spline, plan);
        }
        plan
    }

    pub fn compile(key: &PlanKey) -> Self {
        let degrees = key.spline.degrees();
        let axes = degrees.len();
        let derivative = |d: usize| key.derivative.get(d).copied().unwrap_or(0);

        let window: Vec<usize> = degrees.iter().map(|p| p + 1).collect();
        let cells: usize = window.iter().product();
        let mut strides = vec![1usize; axes];
        for d in (0..axes.saturating_sub(1)).rev() {
            strides[d] = strides[d + 1] * window[d + 1];
        }

        let mut slots = Vec::with_capacity(cells * axes);
        for c in 0..cells {
            slots.extend((0..axes).map(|d| (c / strides[d]) % window[d]));
        }

        let mut knot_offsets = Vec::with_capacity(axes);
        let mut knot_len = 0;
        for &p in &degrees {
            knot_offsets.push(knot_len);
            knot_len += 2 * p;
        }

        // Differentiated axes go last so the quotient rule of a single
        // first derivative is applied to fully reduced homogeneous values.
        let order: Vec<usize> = (0..axes)
            .filter(|&d| derivative(d) == 0)
            .chain((0..axes).filter(|&d| derivative(d) > 0))
            .collect();

        let mut steps = Vec::new();
        let mut reduced = vec![false; axes];
        for &d in &order {
            let p = degrees[d];
            let k = derivative(d);
            for i in 0..p {
                let reduction = if k > 0 && i + k >= p {
                    Reduction::Difference { coefficient: i + 1 }
                } else {
                    Reduction::Blend
                };
                for j in (i + 1..=p).rev() {
                    let pairs = (0..cells)
                        .filter(|&c| {
                            let slot = &slots[c * axes..(c + 1) * axes];
                            slot[d] == j
                                && (0..axes).all(|e| !reduced[e] || slot[e] == degrees[e])
                        })
                        .map(|c| (c, c - strides[d]))
                        .collect();
                    steps.push(Step {
                        axis: d,
                        left: knot_offsets[d] + j - 1,
                        right: knot_offsets[d] + j - i + p - 1,
                        reduction,
                        pairs,
                    });
                }
            }
            reduced[d] = true;
        }

        Self {
            vanishes: (0..axes).any(|d| derivative(d) > degrees[d]),
            degrees,
            knot_offsets,
            knot_len,
            slots,
            cells,
            rational: key.spline.rational,
            basis: key.basis,
            homogeneous: key.homogeneous,
            derivative: key.derivative.clone(),
            steps,
        }
    }

    /// Number of values carried per cell.
    pub fn channels(&self, dimension: usize) -> usize {
        let base = if self.basis { 1 } else { dimension };
        base + usize::from(self.rational)
    }
}

impl fmt::Display for EvaluationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "plan: degrees {:?}, {} cells, {} steps",
            self.degrees,
            self.cells,
            self.steps.len()
        )?;
        if self.rational {
            f.write_str(if self.homogeneous { ", homogeneous" } else { ", rational" })?;
        }
        if self.basis {
            f.write_str(", basis")?;
        }
        if !self.derivative.is_empty() {
            write!(f, ", derivative {:?}", self.derivative)?;
        }
        if self.vanishes {
            return f.write_str(" (identically zero)");
        }
        for step in &self.steps {
            let op = match step.reduction {
                Reduction::Blend => "blend".to_string(),
                Reduction::Difference { coefficient } => format!("diff*{}", coefficient),
            };
            write!(
                f,
                "\n  axis {} {:<7} k[{}]..k[{}]:",
                step.axis, op, step.left, step.right
            )?;
            for (target, source) in &step.pairs {
                write!(f, " {}<-{}", target, source)?;
            }
        }
        Ok(())
    }
}
