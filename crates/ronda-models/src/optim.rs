//! Derivative-free minimization for the likelihood fits.
//!
//! A standard Nelder-Mead downhill simplex. The likelihood surfaces here
//! are low-dimensional (three or four parameters) and smooth, which is the
//! regime the simplex handles well; no gradient code is needed.

use serde::{Deserialize, Serialize};

/// Result of a simplex minimization.
#[derive(Debug, Clone)]
pub struct Minimum {
    /// Location of the best vertex found.
    pub x: Vec<f64>,
    /// Objective value at the best vertex.
    pub fx: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the simplex collapsed below the function tolerance before
    /// the iteration budget ran out.
    pub converged: bool,
}

/// Nelder-Mead downhill simplex minimizer.
///
/// Non-finite objective values are treated as `+inf`, which steers the
/// simplex away from invalid parameter regions instead of poisoning the
/// vertex ordering with NaN comparisons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NelderMead {
    /// Maximum number of iterations (default: 2000)
    pub max_iters: usize,

    /// Convergence tolerance on the objective spread across the simplex
    /// (default: 1e-9)
    pub ftol: f64,

    /// Initial simplex step added to each coordinate (default: 0.1)
    pub step: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            max_iters: 2000,
            ftol: 1e-9,
            step: 0.1,
        }
    }
}

// Standard Nelder-Mead coefficients.
const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

impl NelderMead {
    /// Minimize `f` starting from `x0`.
    ///
    /// # Example
    ///
    /// ```
    /// use ronda_models::NelderMead;
    ///
    /// let rosenbrock = |x: &[f64]| {
    ///     (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2)
    /// };
    /// let min = NelderMead::default().minimize(rosenbrock, &[-1.0, 1.0]);
    /// assert!(min.converged);
    /// assert!((min.x[0] - 1.0).abs() < 1e-3);
    /// ```
    pub fn minimize<F>(&self, f: F, x0: &[f64]) -> Minimum
    where
        F: Fn(&[f64]) -> f64,
    {
        let eval = |x: &[f64]| {
            let v = f(x);
            if v.is_finite() { v } else { f64::INFINITY }
        };

        let n = x0.len();
        let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
        simplex.push(x0.to_vec());
        for i in 0..n {
            let mut vertex = x0.to_vec();
            vertex[i] += self.step;
            simplex.push(vertex);
        }
        let mut values: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();

        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iters {
            iterations += 1;

            // Order vertices best-to-worst.
            let mut order: Vec<usize> = (0..=n).collect();
            order.sort_by(|&i, &j| values[i].total_cmp(&values[j]));
            let best = order[0];
            let worst = order[n];
            let second_worst = order[n - 1];

            if (values[worst] - values[best]).abs() < self.ftol {
                converged = true;
                break;
            }

            // Centroid of all vertices except the worst.
            let mut centroid = vec![0.0; n];
            for (idx, vertex) in simplex.iter().enumerate() {
                if idx == worst {
                    continue;
                }
                for (c, v) in centroid.iter_mut().zip(vertex.iter()) {
                    *c += v;
                }
            }
            for c in centroid.iter_mut() {
                *c /= n as f64;
            }

            let reflected: Vec<f64> = centroid
                .iter()
                .zip(simplex[worst].iter())
                .map(|(c, w)| c + REFLECT * (c - w))
                .collect();
            let f_reflected = eval(&reflected);

            if f_reflected < values[best] {
                // Try to expand further along the same direction.
                let expanded: Vec<f64> = centroid
                    .iter()
                    .zip(simplex[worst].iter())
                    .map(|(c, w)| c + EXPAND * (c - w))
                    .collect();
                let f_expanded = eval(&expanded);
                if f_expanded < f_reflected {
                    simplex[worst] = expanded;
                    values[worst] = f_expanded;
                } else {
                    simplex[worst] = reflected;
                    values[worst] = f_reflected;
                }
            } else if f_reflected < values[second_worst] {
                simplex[worst] = reflected;
                values[worst] = f_reflected;
            } else {
                // Contract toward the centroid.
                let contracted: Vec<f64> = centroid
                    .iter()
                    .zip(simplex[worst].iter())
                    .map(|(c, w)| c + CONTRACT * (w - c))
                    .collect();
                let f_contracted = eval(&contracted);
                if f_contracted < values[worst] {
                    simplex[worst] = contracted;
                    values[worst] = f_contracted;
                } else {
                    // Shrink the whole simplex toward the best vertex.
                    let best_vertex = simplex[best].clone();
                    for (idx, vertex) in simplex.iter_mut().enumerate() {
                        if idx == best {
                            continue;
                        }
                        for (v, b) in vertex.iter_mut().zip(best_vertex.iter()) {
                            *v = b + SHRINK * (*v - b);
                        }
                        values[idx] = eval(vertex);
                    }
                }
            }
        }

        let best = values
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)
            .unwrap_or(0);

        Minimum {
            x: simplex[best].clone(),
            fx: values[best],
            iterations,
            converged,
        }
    }
}
