//! Point, derivative and basis evaluation by the generalized de Boor recursion.
//!
//! The window of control points around the located spans is gathered into a
//! flat cell buffer and reduced axis by axis according to a cached
//! [`EvaluationPlan`]. Rational splines carry the weight as an extra channel
//! and are projected back at the end. Rational derivatives of total order two
//! or more are assembled from homogeneous partials by the generalized
//! quotient rule.

pub(crate) mod plan;
pub(crate) mod span;

use crate::error::NurbsError;
use crate::layout::accessor::{next_index, Accessor};
use crate::layout::Scalar;
use crate::spline::{Nurbs, SpecializationKey};
use plan::{EvaluationPlan, PlanKey, Reduction};
use std::sync::Arc;

/// Scratch buffers reused across evaluations.
#[derive(Debug, Clone)]
struct Workspace<F> {
    cells: Vec<F>,
    knots: Vec<F>,
    spans: Vec<usize>,
    params: Vec<F>,
    index: Vec<usize>,
}

impl<F: Scalar> Workspace<F> {
    fn new(plan: &EvaluationPlan, channels: usize) -> Self {
        let axes = plan.degrees.len();
        Self {
            cells: vec![F::zero(); plan.cells * channels],
            knots: vec![F::zero(); plan.knot_len],
            spans: vec![0; axes],
            params: vec![F::zero(); axes],
            index: vec![0; axes + 1],
        }
    }
}

/// What the window is seeded with.
enum Seed<'h> {
    Points,
    Indicator(&'h [usize]),
}

/// Runs the recursion and returns the last cell: `width` values, followed by
/// the weight on rational plans.
fn reduce_window<'w, F: Scalar>(
    spline: &Nurbs<F>,
    plan: &EvaluationPlan,
    ws: &'w mut Workspace<F>,
    params: &[F],
    seed: &Seed<'_>,
    width: usize,
) -> &'w [F] {
    let channels = width + usize::from(plan.rational);
    let last = (plan.cells - 1) * channels..plan.cells * channels;
    if plan.vanishes {
        ws.cells[last.clone()].fill(F::zero());
        return &ws.cells[last];
    }

    let axes = plan.degrees.len();
    for d in 0..axes {
        let axis = spline.axis(d);
        let (span, t) = axis.locate(params[d]);
        ws.spans[d] = span;
        ws.params[d] = t;
        let start = plan.knot_offsets[d];
        axis.window(span, &mut ws.knots[start..start + 2 * plan.degrees[d]]);
    }

    gather(spline, plan, ws, seed, width);
    reduce(plan, ws, width);
    &ws.cells[last]
}

/// Runs one evaluation; `out` receives the projected result.
fn run<F: Scalar>(
    spline: &Nurbs<F>,
    plan: &EvaluationPlan,
    ws: &mut Workspace<F>,
    params: &[F],
    seed: &Seed<'_>,
    out: &mut [F],
) {
    if plan.vanishes {
        out.fill(F::zero());
        return;
    }
    let width = out.len();
    let last = reduce_window(spline, plan, ws, params, seed, width);
    if plan.rational {
        let w = last[width];
        for (o, &x) in out.iter_mut().zip(last) {
            *o = x / w;
        }
    } else {
        out.copy_from_slice(&last[..width]);
    }
}

/// Fills the cell buffer from the control hull, lifting rational points to
/// homogeneous coordinates.
fn gather<F: Scalar>(
    spline: &Nurbs<F>,
    plan: &EvaluationPlan,
    ws: &mut Workspace<F>,
    seed: &Seed<'_>,
    width: usize,
) {
    let axes = plan.degrees.len();
    let channels = width + usize::from(plan.rational);
    let points = spline.points().map(Accessor::new);
    let weights = spline.weights().map(Accessor::new);

    for c in 0..plan.cells {
        let slots = &plan.slots[c * axes..(c + 1) * axes];
        for d in 0..axes {
            ws.index[d] = spline.axis(d).control_index(ws.spans[d], slots[d]);
        }
        let w = match &weights {
            Some(acc) if plan.rational => acc.get(&ws.index[..axes]),
            _ => F::one(),
        };
        let cell = &mut ws.cells[c * channels..(c + 1) * channels];
        match seed {
            Seed::Points => {
                if let Some(acc) = &points {
                    for k in 0..width {
                        ws.index[axes] = k;
                        cell[k] = acc.get(&ws.index) * w;
                    }
                }
            }
            Seed::Indicator(home) => {
                let hit = ws.index[..axes] == home[..];
                cell[0] = if hit { w } else { F::zero() };
            }
        }
        if plan.rational {
            cell[width] = w;
        }
    }
}

/// Replays the plan's steps over the cell buffer.
fn reduce<F: Scalar>(plan: &EvaluationPlan, ws: &mut Workspace<F>, width: usize) {
    let channels = width + usize::from(plan.rational);
    let quotient = plan.rational && !plan.homogeneous;
    for step in &plan.steps {
        let t = ws.params[step.axis];
        let left = ws.knots[step.left];
        let right = ws.knots[step.right];
        let span = right - left;
        let a = (t - left) / span;
        let b = F::one() - a;

        for &(target, source) in &step.pairs {
            let (lo, hi) = ws.cells.split_at_mut(target * channels);
            let src = &lo[source * channels..(source + 1) * channels];
            let dst = &mut hi[..channels];

            match step.reduction {
                Reduction::Blend => {
                    for (x, &s) in dst.iter_mut().zip(src) {
                        *x = b * s + a * *x;
                    }
                }
                Reduction::Difference { coefficient } => {
                    let coefficient = F::from(coefficient).unwrap_or_else(F::one);
                    if quotient {
                        // Quotient rule on the homogeneous pair.
                        let (w_target, w_source) = (dst[width], src[width]);
                        let w = b * w_source + a * w_target;
                        let scale = coefficient / (span * w);
                        for k in 0..width {
                            dst[k] = scale * (w_source * dst[k] - w_target * src[k]);
                        }
                        dst[width] = w;
                    } else {
                        let scale = coefficient / span;
                        for (x, &s) in dst.iter_mut().zip(src) {
                            *x = scale * (*x - s);
                        }
                    }
                }
            }
        }
    }
}

/// Pads or trims a derivative order vector; all-zero orders mean none.
fn normalize_derivative(derivative: &[usize], axes: usize) -> Result<Vec<usize>, NurbsError> {
    if derivative.len() > axes && derivative[axes..].iter().any(|&k| k > 0) {
        return Err(NurbsError::unsupported(format!(
            "derivative orders given for {} axes but the spline has {}",
            derivative.len(),
            axes
        )));
    }
    if derivative.iter().all(|&k| k == 0) {
        return Ok(Vec::new());
    }
    let mut orders = derivative[..derivative.len().min(axes)].to_vec();
    orders.resize(axes, 0);
    Ok(orders)
}

fn binomial(n: usize, k: usize) -> usize {
    (0..k).fold(1, |acc, i| acc * (n - i) / (i + 1))
}

/// One product `C(β, γ) · w^(γ) · C^(β-γ)` of the Leibniz expansion.
#[derive(Debug, Clone, Copy)]
struct Term<F> {
    /// Position of `β` in the expansion's orders.
    order: usize,
    /// Position of `γ`.
    weight: usize,
    /// Position of `β - γ`.
    rest: usize,
    coefficient: F,
}

/// A rational derivative of order `α` solved from homogeneous partials.
///
/// The weighted coordinates `A = w·C` satisfy
/// `A^(β) = Σ_{γ ≤ β} C(β, γ) · w^(γ) · C^(β-γ)`, so every `C^(β)` follows
/// from the partials `A^(γ)` and `w^(γ)` of lower orders.
#[derive(Debug)]
struct Expansion<F> {
    /// Every `β ≤ α` in row-major order; the first is zero, the last `α`.
    plans: Vec<Arc<EvaluationPlan>>,
    /// Sorted by `order`, and every `rest` precedes its `order`.
    terms: Vec<Term<F>>,
    /// Homogeneous result per order: coordinates, then weight.
    homogeneous: Vec<F>,
    /// Projected derivative per order.
    projected: Vec<F>,
}

impl<F: Scalar> Expansion<F> {
    fn new(key: &SpecializationKey, derivative: &[usize], basis: bool, width: usize) -> Self {
        let bounds: Vec<usize> = derivative.iter().map(|k| k + 1).collect();
        let mut orders = vec![vec![0; derivative.len()]];
        let mut order = orders[0].clone();
        while next_index(&mut order, &bounds) {
            orders.push(order.clone());
        }

        let position = |beta: &[usize]| beta.iter().zip(&bounds).fold(0, |i, (b, n)| i * n + b);
        let mut terms = Vec::new();
        for (b, beta) in orders.iter().enumerate() {
            for (g, gamma) in orders.iter().enumerate().take(b + 1).skip(1) {
                if gamma.iter().zip(beta).any(|(lower, upper)| lower > upper) {
                    continue;
                }
                let rest: Vec<usize> = beta.iter().zip(gamma).map(|(n, k)| n - k).collect();
                let coefficient = beta
                    .iter()
                    .zip(gamma)
                    .map(|(&n, &k)| binomial(n, k))
                    .product::<usize>();
                terms.push(Term {
                    order: b,
                    weight: g,
                    rest: position(&rest),
                    coefficient: F::from(coefficient).unwrap_or_else(F::one),
                });
            }
        }

        let plans = orders
            .iter()
            .map(|beta| {
                let derivative = if beta.iter().all(|&k| k == 0) {
                    Vec::new()
                } else {
                    beta.clone()
                };
                EvaluationPlan::cached(&PlanKey {
                    spline: key.clone(),
                    derivative,
                    basis,
                    homogeneous: true,
                })
            })
            .collect();

        Self {
            plans,
            terms,
            homogeneous: vec![F::zero(); orders.len() * (width + 1)],
            projected: vec![F::zero(); orders.len() * width],
        }
    }

    fn run(
        &mut self,
        spline: &Nurbs<F>,
        ws: &mut Workspace<F>,
        params: &[F],
        seed: &Seed<'_>,
        out: &mut [F],
    ) {
        let width = out.len();
        let channels = width + 1;
        for (b, plan) in self.plans.iter().enumerate() {
            let last = reduce_window(spline, plan, ws, params, seed, width);
            self.homogeneous[b * channels..(b + 1) * channels].copy_from_slice(last);
        }

        let w = self.homogeneous[width];
        let mut terms = self.terms.iter().peekable();
        for b in 0..self.plans.len() {
            for k in 0..width {
                self.projected[b * width + k] = self.homogeneous[b * channels + k];
            }
            while let Some(term) = terms.next_if(|t| t.order == b) {
                let scale = term.coefficient * self.homogeneous[term.weight * channels + width];
                for k in 0..width {
                    let lower = self.projected[term.rest * width + k];
                    self.projected[b * width + k] = self.projected[b * width + k] - scale * lower;
                }
            }
            for k in 0..width {
                self.projected[b * width + k] = self.projected[b * width + k] / w;
            }
        }
        let last = self.plans.len() - 1;
        out.copy_from_slice(&self.projected[last * width..(last + 1) * width]);
    }
}

#[derive(Debug)]
enum Route<F> {
    Direct(Arc<EvaluationPlan>),
    Expanded(Expansion<F>),
}

/// A resolved evaluation procedure with its scratch space.
#[derive(Debug)]
struct Procedure<F> {
    route: Route<F>,
    workspace: Workspace<F>,
}

impl<F: Scalar> Procedure<F> {
    fn new(spline: &Nurbs<F>, derivative: &[usize], basis: bool) -> Result<Self, NurbsError> {
        let derivative = normalize_derivative(derivative, spline.spline_dimension())?;
        let key = spline.key();
        let width = if basis { 1 } else { spline.dimension() };

        // A single first derivative is handled inside the recursion.
        let expand = key.rational
            && (derivative.iter().sum::<usize>() > 1
                || derivative.iter().zip(key.degrees()).any(|(&k, p)| k > p));
        if expand {
            let expansion = Expansion::new(key, &derivative, basis, width);
            let workspace = Workspace::new(&expansion.plans[0], width + 1);
            return Ok(Self {
                route: Route::Expanded(expansion),
                workspace,
            });
        }

        let plan = if derivative.is_empty() && !basis {
            Arc::clone(&spline.procedures.evaluate)
        } else {
            EvaluationPlan::cached(&PlanKey {
                spline: key.clone(),
                derivative,
                basis,
                homogeneous: false,
            })
        };
        let workspace = Workspace::new(&plan, plan.channels(spline.dimension()));
        Ok(Self {
            route: Route::Direct(plan),
            workspace,
        })
    }

    fn run(&mut self, spline: &Nurbs<F>, params: &[F], seed: &Seed<'_>, out: &mut [F]) {
        match &mut self.route {
            Route::Direct(plan) => run(spline, plan, &mut self.workspace, params, seed, out),
            Route::Expanded(expansion) => {
                expansion.run(spline, &mut self.workspace, params, seed, out)
            }
        }
    }
}

/// A reusable point or derivative evaluator bound to one spline.
///
/// Obtained from [`Nurbs::evaluator`]; the compiled plan and scratch buffers
/// are resolved once and reused on every call.
#[derive(Debug)]
pub struct Evaluator<'s, F: Scalar> {
    spline: &'s Nurbs<F>,
    procedure: Procedure<F>,
}

impl<'s, F: Scalar> Evaluator<'s, F> {
    /// Writes the point (or derivative) at `params` into `out`.
    pub fn evaluate(&mut self, out: &mut Vec<F>, params: &[F]) -> Result<(), NurbsError> {
        self.spline.check_parameters(params)?;
        out.clear();
        out.resize(self.spline.dimension(), F::zero());
        self.procedure.run(self.spline, params, &Seed::Points, out);
        Ok(())
    }

    pub fn point(&mut self, params: &[F]) -> Result<Vec<F>, NurbsError> {
        let mut out = Vec::with_capacity(self.spline.dimension());
        self.evaluate(&mut out, params)?;
        Ok(out)
    }
}

/// Evaluates single basis functions (optionally differentiated).
#[derive(Debug)]
pub struct BasisEvaluator<'s, F: Scalar> {
    spline: &'s Nurbs<F>,
    procedure: Procedure<F>,
}

impl<'s, F: Scalar> BasisEvaluator<'s, F> {
    /// Value at `params` of the basis function of control point `home`.
    pub fn evaluate(&mut self, params: &[F], home: &[usize]) -> Result<F, NurbsError> {
        self.spline.check_parameters(params)?;
        if home.len() != self.spline.spline_dimension() {
            return Err(NurbsError::ParameterCount {
                expected: self.spline.spline_dimension(),
                actual: home.len(),
            });
        }
        let mut out = [F::zero()];
        self.procedure
            .run(self.spline, params, &Seed::Indicator(home), &mut out);
        Ok(out[0])
    }
}

impl<F: Scalar> Nurbs<F> {
    fn require_points(&self) -> Result<(), NurbsError> {
        if self.points.is_none() {
            return Err(NurbsError::unsupported(
                "spline was configured by size and has no control points to evaluate",
            ));
        }
        Ok(())
    }

    /// Writes the point at `params` into `out`, resizing it to
    /// [`dimension`](Nurbs::dimension) coordinates.
    ///
    /// Each call sets up a fresh evaluator; loops should hold one from
    /// [`evaluator`](Nurbs::evaluator) instead.
    pub fn evaluate(&self, out: &mut Vec<F>, params: &[F]) -> Result<(), NurbsError> {
        self.evaluator(&[])?.evaluate(out, params)
    }

    /// The point at `params`.
    pub fn point(&self, params: &[F]) -> Result<Vec<F>, NurbsError> {
        let mut out = Vec::new();
        self.evaluate(&mut out, params)?;
        Ok(out)
    }

    /// An evaluator for the partial derivative with the given order per axis.
    ///
    /// Missing trailing orders are zero; `&[]` evaluates the point itself.
    /// On rational splines a single first derivative comes straight out of
    /// the recursion, while higher and mixed orders evaluate every lower
    /// homogeneous partial and combine them by the quotient rule.
    pub fn evaluator(&self, derivative: &[usize]) -> Result<Evaluator<'_, F>, NurbsError> {
        self.require_points()?;
        Ok(Evaluator {
            spline: self,
            procedure: Procedure::new(self, derivative, false)?,
        })
    }

    /// An evaluator for the analytic derivative of `order` along `axis`.
    pub fn derivative_evaluator(
        &self,
        order: usize,
        axis: usize,
    ) -> Result<Evaluator<'_, F>, NurbsError> {
        if order != 1 {
            return Err(NurbsError::unsupported(format!(
                "derivative evaluator supports order 1 only, got {}",
                order
            )));
        }
        if axis >= self.spline_dimension() {
            return Err(NurbsError::unsupported(format!(
                "no parametric axis {} in a {}-dimensional spline",
                axis,
                self.spline_dimension()
            )));
        }
        let mut derivative = vec![0; self.spline_dimension()];
        derivative[axis] = order;
        self.evaluator(&derivative)
    }

    /// An evaluator for single basis functions; works without points.
    pub fn basis_evaluator(&self, derivative: &[usize]) -> Result<BasisEvaluator<'_, F>, NurbsError> {
        Ok(BasisEvaluator {
            spline: self,
            procedure: Procedure::new(self, derivative, true)?,
        })
    }
}
