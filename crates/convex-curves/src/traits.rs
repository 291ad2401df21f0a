//! Core traits for deterministic curves.
//!
//! The simulator adds an optional deterministic component `z0(T) - z0(t)` on
//! top of its stochastic zero rates. Anything implementing
//! [`DeterministicCurve`] can supply `z0`, including plain closures.

/// A deterministic zero-yield curve `z0(T)`.
///
/// # Example
///
/// ```rust
/// use convex_curves::traits::DeterministicCurve;
///
/// let upward = |t: f64| 0.02 + 0.001 * t;
/// assert!((upward.zero_rate(10.0) - 0.03).abs() < 1e-12);
/// ```
pub trait DeterministicCurve: Send + Sync {
    /// Returns the continuously compounded zero rate at time `t` (years).
    fn zero_rate(&self, t: f64) -> f64;

    /// Short description used in logs and debug output.
    fn description(&self) -> String {
        "custom".to_string()
    }
}

impl<F> DeterministicCurve for F
where
    F: Fn(f64) -> f64 + Send + Sync,
{
    fn zero_rate(&self, t: f64) -> f64 {
        self(t)
    }
}
