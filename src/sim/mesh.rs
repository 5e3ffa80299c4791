//! 1D finite-volume mesh generation for layered material stacks.
//!
//! Turns an ordered list of material layers into an ordered list of
//! [`Element`]s under one of three density policies selected by the global
//! stretch factor:
//!
//! - `stretch == 0`: no sub-discretization; internal layers become one
//!   element each, the two boundary layers are split into two equal halves
//!   (so boundary fluxes reference a half-width cell).
//! - `stretch == 1` (more precisely, `0 < stretch <= 1`): near-uniform
//!   discretization with target width `min_dx` and a reduced-count fallback
//!   when the leftover element would be too thin.
//! - `stretch > 1`: double-sided hyperbolic-tangent grading with the
//!   smallest elements at both layer boundaries.
//!
//! Mesh generation never fails for numerical reasons; every branch degrades
//! to the least-subdivided valid grid. Only an empty layer list is an error.

use serde::{Deserialize, Serialize};

use crate::error::MeshError;
use crate::model::ObjectId;
use crate::sim::construction::MaterialLayer;

/// Layers thinner than this raise a diagnostic: they contribute negligibly
/// to storage and transfer.
const THIN_LAYER_WARNING_THRESHOLD: f64 = 1e-3; // 1 mm

/// Upper bound for the per-layer stretch escalation when the element cap is
/// hit.
const MAX_LAYER_STRETCH: f64 = 50.0;

/// Grid density parameters, global to a simulation.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DiscretizationOptions {
    /// Stretch factor selecting the density policy (0, 1, or > 1).
    pub stretch: f64,
    /// Minimum element width in meters.
    pub min_dx: f64,
    /// Cap on generated elements per material layer.
    pub max_elements_per_layer: usize,
}

impl Default for DiscretizationOptions {
    fn default() -> Self {
        Self {
            stretch: 4.0,
            min_dx: 2e-3,
            max_elements_per_layer: 30,
        }
    }
}

/// One finite-volume cell of a discretized construction.
///
/// Created once during mesh generation and immutable afterward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Element {
    /// Element index.
    pub i: usize,
    /// Center coordinate in meters, measured from side A.
    pub x: f64,
    /// Element width in meters.
    pub dx: f64,
    /// Left linear-extrapolation weight: 1.0 at the domain boundary, else
    /// `dx_i / (dx_{i-1} + dx_i)`.
    pub w_l: f64,
    /// Right linear-extrapolation weight, symmetric to `w_l`.
    pub w_r: f64,
    /// Index of the material layer this element belongs to.
    pub layer: usize,
}

/// The generated discretization of one construction.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// All elements, ordered from side A to side B.
    pub elements: Vec<Element>,
    /// First element index of each material layer; the trailing sentinel
    /// equals the total element count. Monotonically non-decreasing.
    pub layer_offsets: Vec<usize>,
    /// Total construction width in meters.
    pub total_width: f64,
}

impl Mesh {
    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// True if the mesh has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Element index range of one material layer.
    pub fn layer_range(&self, layer: usize) -> std::ops::Range<usize> {
        self.layer_offsets[layer]..self.layer_offsets[layer + 1]
    }

    /// Width sum over one material layer in meters.
    pub fn layer_thickness(&self, layer: usize) -> f64 {
        self.layer_range(layer)
            .map(|i| self.elements[i].dx)
            .sum()
    }
}

/// Generates the finite-volume mesh for one construction.
///
/// `construction_id` only feeds diagnostics. Fails only on an empty layer
/// list.
pub fn generate(
    construction_id: ObjectId,
    layers: &[MaterialLayer],
    opts: &DiscretizationOptions,
) -> Result<Mesh, MeshError> {
    if layers.is_empty() {
        return Err(MeshError::EmptyLayerList { construction_id });
    }

    let mut widths: Vec<f64> = Vec::new();
    let mut layer_of: Vec<usize> = Vec::new();
    let mut layer_offsets: Vec<usize> = Vec::with_capacity(layers.len() + 1);

    for (li, layer) in layers.iter().enumerate() {
        if layer.thickness < THIN_LAYER_WARNING_THRESHOLD {
            log::warn!(
                "construction #{}: material layer {} is only {:.2} mm thick and contributes negligibly to storage/transfer",
                construction_id,
                li,
                layer.thickness * 1e3
            );
        }

        layer_offsets.push(widths.len());
        let is_boundary = li == 0 || li + 1 == layers.len();
        let layer_widths = discretize_layer(
            construction_id,
            li,
            layer.thickness,
            is_boundary,
            opts,
        );
        layer_of.extend(std::iter::repeat(li).take(layer_widths.len()));
        widths.extend(layer_widths);
    }
    layer_offsets.push(widths.len());

    // assemble elements: centers, widths, extrapolation weights
    let n = widths.len();
    let mut elements = Vec::with_capacity(n);
    let mut x_left = 0.0;
    for (i, &dx) in widths.iter().enumerate() {
        let w_l = if i == 0 {
            1.0
        } else {
            dx / (widths[i - 1] + dx)
        };
        let w_r = if i + 1 == n {
            1.0
        } else {
            dx / (dx + widths[i + 1])
        };
        elements.push(Element {
            i,
            x: x_left + 0.5 * dx,
            dx,
            w_l,
            w_r,
            layer: layer_of[i],
        });
        x_left += dx;
    }

    Ok(Mesh {
        elements,
        layer_offsets,
        total_width: layers.iter().map(|l| l.thickness).sum(),
    })
}

/// Discretizes one layer into element widths according to the density
/// policy.
fn discretize_layer(
    construction_id: ObjectId,
    layer_index: usize,
    thickness: f64,
    is_boundary_layer: bool,
    opts: &DiscretizationOptions,
) -> Vec<f64> {
    if opts.stretch == 0.0 {
        // no sub-discretization: boundary layers split into two halves so
        // that boundary fluxes act on a half-width cell
        if is_boundary_layer {
            return vec![0.5 * thickness, 0.5 * thickness];
        }
        return vec![thickness];
    }

    if opts.stretch <= 1.0 {
        return equidistant_widths(thickness, opts.min_dx);
    }

    graded_layer_widths(construction_id, layer_index, thickness, opts)
}

/// Near-uniform policy: `ceil(L/min_dx)` equal elements, with the count
/// reduced by one when the would-be leftover element is thinner than
/// `min_dx`.
fn equidistant_widths(thickness: f64, min_dx: f64) -> Vec<f64> {
    let mut n = (thickness / min_dx).ceil().max(1.0) as usize;
    if n > 1 {
        let leftover = thickness - (n - 1) as f64 * min_dx;
        if leftover < min_dx * (1.0 - 1e-9) {
            n -= 1;
        }
    }
    vec![thickness / n as f64; n]
}

/// Stretch policy: grow the element count until the boundary element is
/// fine enough, escalating the layer-local stretch factor once if the cap
/// is hit.
fn graded_layer_widths(
    construction_id: ObjectId,
    layer_index: usize,
    thickness: f64,
    opts: &DiscretizationOptions,
) -> Vec<f64> {
    let cap = opts.max_elements_per_layer.max(2);
    let target = 1.1 * opts.min_dx;

    let mut n = 2;
    let mut widths = scaled_widths(n, opts.stretch, thickness);
    while widths[0] > target && n < cap {
        n += 1;
        widths = scaled_widths(n, opts.stretch, thickness);
    }

    if widths[0] > target {
        // cap hit: escalate the stretch factor for this layer alone and try
        // one more grid
        let escalated = (2.0 * opts.stretch).min(MAX_LAYER_STRETCH);
        log::warn!(
            "construction #{}: layer {} hit the per-layer element cap ({}); increasing its stretch factor to {:.1} for one more attempt",
            construction_id,
            layer_index,
            cap,
            escalated
        );
        widths = scaled_widths(cap, escalated, thickness);
    }
    widths
}

fn scaled_widths(n: usize, stretch: f64, thickness: f64) -> Vec<f64> {
    graded_widths(n, stretch, 1.0, false)
        .into_iter()
        .map(|w| w * thickness)
        .collect()
}

/// Normalized double-sided tanh grading of the unit interval.
///
/// For `n` subdivisions, vertex `i` at `x = i/n` maps through
/// `u = 0.5 * (1 + tanh(d (x - 0.5)) / tanh(d / 2))`, rescaled by the
/// asymmetry ratio `r` so the two boundary cells can differ in width
/// (`r == 1` keeps the grading symmetric). Widths are the consecutive
/// differences; the last width is forced so all widths sum to exactly 1.
/// With `reversed` the width order is flipped for layers traversed
/// right-to-left.
pub fn graded_widths(n: usize, d: f64, r: f64, reversed: bool) -> Vec<f64> {
    assert!(n >= 1, "Grading requires at least one subdivision");
    assert!(d > 0.0, "Grading requires a positive stretch factor");
    assert!(r > 0.0, "Asymmetry ratio must be positive");

    let denom = (0.5 * d).tanh();
    let mut vertices = Vec::with_capacity(n + 1);
    for i in 0..=n {
        let x = i as f64 / n as f64;
        let u = 0.5 * (1.0 + (d * (x - 0.5)).tanh() / denom);
        // asymmetry rescale: unit interval onto itself, slope r at the left
        // end and 1/r at the right end
        let u = r * u / (1.0 + (r - 1.0) * u);
        vertices.push(u);
    }

    let mut widths: Vec<f64> = vertices.windows(2).map(|v| v[1] - v[0]).collect();
    let partial: f64 = widths[..n - 1].iter().sum();
    widths[n - 1] = 1.0 - partial;

    if reversed {
        widths.reverse();
    }
    widths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::construction::{Assemblies, Materials};

    const EPSILON: f64 = 1e-12;

    fn opts(stretch: f64, min_dx: f64) -> DiscretizationOptions {
        DiscretizationOptions {
            stretch,
            min_dx,
            max_elements_per_layer: 30,
        }
    }

    #[test]
    fn test_stretch_zero_element_count() {
        // 2 x boundary-layer halves + one element per internal layer
        let layers = Assemblies::low_mass_wall();
        let mesh = generate(1, &layers, &opts(0.0, 2e-3)).unwrap();
        assert_eq!(mesh.len(), 2 * 2 + (layers.len() - 2));
        assert_eq!(mesh.layer_offsets, vec![0, 2, 3, 5]);

        let total: f64 = mesh.elements.iter().map(|e| e.dx).sum();
        assert!((total - mesh.total_width).abs() < EPSILON);
    }

    #[test]
    fn test_stretch_zero_single_layer_splits_in_half() {
        let layers = vec![MaterialLayer::new(Materials::concrete(), 0.2)];
        let mesh = generate(1, &layers, &opts(0.0, 2e-3)).unwrap();
        assert_eq!(mesh.len(), 2);
        assert!((mesh.elements[0].dx - 0.1).abs() < EPSILON);
        assert!((mesh.elements[1].dx - 0.1).abs() < EPSILON);
    }

    #[test]
    fn test_equidistant_policy_bounds() {
        let min_dx = 5e-3;
        let layers = Assemblies::high_mass_wall();
        let mesh = generate(1, &layers, &opts(1.0, min_dx)).unwrap();

        let total: f64 = mesh.elements.iter().map(|e| e.dx).sum();
        assert!((total - mesh.total_width).abs() < 1e-9);

        // reduced-count fallback: equal widths, never below min_dx, and
        // within one min_dx of it for layers at least min_dx thick
        for e in &mesh.elements {
            assert!(e.dx >= min_dx - 1e-9, "dx {} below min_dx", e.dx);
            assert!(e.dx < 2.0 * min_dx, "dx {} too coarse", e.dx);
        }
    }

    #[test]
    fn test_equidistant_exact_multiple() {
        // 66 mm / 6 mm = exactly 11 elements
        let w = equidistant_widths(0.066, 6e-3);
        assert_eq!(w.len(), 11);
        assert!((w[0] - 6e-3).abs() < EPSILON);
    }

    #[test]
    fn test_equidistant_thin_layer_single_element() {
        let w = equidistant_widths(1e-3, 5e-3);
        assert_eq!(w.len(), 1);
        assert!((w[0] - 1e-3).abs() < EPSILON);
    }

    #[test]
    fn test_graded_widths_sum_to_one_and_symmetric() {
        let w = graded_widths(9, 4.0, 1.0, false);
        let sum: f64 = w.iter().sum();
        assert!((sum - 1.0).abs() < EPSILON);

        // double-sided grading: smallest at both ends, symmetric for r == 1
        for i in 0..w.len() / 2 {
            assert!((w[i] - w[w.len() - 1 - i]).abs() < 1e-9);
        }
        assert!(w[0] < w[w.len() / 2]);
    }

    #[test]
    fn test_graded_widths_asymmetry_and_reversal() {
        let w = graded_widths(8, 4.0, 2.0, false);
        let sum: f64 = w.iter().sum();
        assert!((sum - 1.0).abs() < EPSILON);
        // slope r at the left end widens the left boundary cell
        assert!(w[0] > w[w.len() - 1]);

        let rev = graded_widths(8, 4.0, 2.0, true);
        for i in 0..w.len() {
            assert!((rev[i] - w[w.len() - 1 - i]).abs() < EPSILON);
        }
    }

    #[test]
    fn test_stretch_policy_boundary_resolution() {
        let min_dx = 2e-3;
        let layers = Assemblies::high_mass_wall();
        let mesh = generate(1, &layers, &opts(4.0, min_dx)).unwrap();

        // the first element of every layer is the graded boundary cell
        for li in 0..layers.len() {
            let range = mesh.layer_range(li);
            let first = mesh.elements[range.start].dx;
            let hit_cap = range.len() >= 30;
            if !hit_cap {
                assert!(
                    first <= 1.1 * min_dx + 1e-12,
                    "layer {} boundary element {} too wide",
                    li,
                    first
                );
            }
            assert!((mesh.layer_thickness(li) - layers[li].thickness).abs() < 1e-9);
        }

        let total: f64 = mesh.elements.iter().map(|e| e.dx).sum();
        assert!((total - mesh.total_width).abs() < 1e-9);
    }

    #[test]
    fn test_element_cap_degrades_gracefully() {
        // thick layer + tiny min_dx forces the cap; generation must still
        // succeed with the layer filled exactly
        let layers = vec![MaterialLayer::new(Materials::concrete(), 0.4)];
        let o = DiscretizationOptions {
            stretch: 2.0,
            min_dx: 1e-5,
            max_elements_per_layer: 10,
        };
        let mesh = generate(1, &layers, &o).unwrap();
        assert_eq!(mesh.len(), 10);
        assert!((mesh.layer_thickness(0) - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_weight_factors() {
        let layers = Assemblies::low_mass_wall();
        let mesh = generate(1, &layers, &opts(0.0, 2e-3)).unwrap();
        let n = mesh.len();

        assert_eq!(mesh.elements[0].w_l, 1.0);
        assert_eq!(mesh.elements[n - 1].w_r, 1.0);
        for i in 1..n {
            let expected = mesh.elements[i].dx / (mesh.elements[i - 1].dx + mesh.elements[i].dx);
            assert!((mesh.elements[i].w_l - expected).abs() < EPSILON);
        }
        for i in 0..n - 1 {
            let expected = mesh.elements[i].dx / (mesh.elements[i].dx + mesh.elements[i + 1].dx);
            assert!((mesh.elements[i].w_r - expected).abs() < EPSILON);
        }
    }

    #[test]
    fn test_centers_monotonically_increasing() {
        let layers = Assemblies::radiant_floor();
        let mesh = generate(1, &layers, &opts(4.0, 2e-3)).unwrap();
        for pair in mesh.elements.windows(2) {
            assert!(pair[1].x > pair[0].x);
        }
    }

    #[test]
    fn test_empty_layer_list_is_an_error() {
        let err = generate(9, &[], &opts(1.0, 2e-3)).unwrap_err();
        assert!(matches!(err, MeshError::EmptyLayerList { construction_id: 9 }));
    }
}
