//! Shape signatures that decide when compiled procedures can be shared.

use super::boundary::Boundary;
use crate::layout::Layout;
use std::fmt;

/// What one parametric axis contributes to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AxisKey {
    pub degree: usize,
    pub boundary: Boundary,
    /// No explicit knots on this axis.
    pub uniform: bool,
}

/// Everything about a spline's shape that affects how it is evaluated.
///
/// Two splines with equal keys share compiled procedures even though their
/// point, weight and knot values differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpecializationKey {
    /// Coordinates per control point.
    pub dimension: usize,
    pub rational: bool,
    pub axes: Vec<AxisKey>,
    pub points: Option<Layout>,
    pub weights: Option<Layout>,
    pub knots: Option<Layout>,
    pub check_bounds: bool,
    pub debug: bool,
}

impl SpecializationKey {
    pub fn spline_dimension(&self) -> usize {
        self.axes.len()
    }

    pub fn degrees(&self) -> Vec<usize> {
        self.axes.iter().map(|a| a.degree).collect()
    }
}

fn capitalized(boundary: Boundary) -> &'static str {
    match boundary {
        Boundary::Open => "Open",
        Boundary::Clamped => "Clamped",
        Boundary::Closed => "Closed",
    }
}

/// Renders e.g. `Nurbs2D_Deg2Clamped_Deg3UniformClosed_Dim3_Rational_PtsNested_WgtNested`.
impl fmt::Display for SpecializationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Nurbs{}D", self.axes.len())?;
        for axis in &self.axes {
            write!(
                f,
                "_Deg{}{}{}",
                axis.degree,
                if axis.uniform { "Uniform" } else { "" },
                capitalized(axis.boundary)
            )?;
        }
        write!(f, "_Dim{}", self.dimension)?;
        if self.rational {
            f.write_str("_Rational")?;
        }
        for (tag, layout) in [("Pts", self.points), ("Wgt", self.weights), ("Knt", self.knots)] {
            if let Some(layout) = layout {
                write!(f, "_{}{}", tag, layout.tag())?;
            }
        }
        if self.check_bounds {
            f.write_str("_Chk")?;
        }
        if self.debug {
            f.write_str("_Dbg")?;
        }
        Ok(())
    }
}
