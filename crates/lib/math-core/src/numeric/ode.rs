use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MathError, MathResult};
use crate::symbolic::{CompiledExpr, parse};

const FIXED_STEP: f64 = 0.01;
const MAX_STEPS: usize = 1_000_000;

const RTOL: f64 = 1e-3;
const ATOL: f64 = 1e-6;
const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;
const ERROR_EXPONENT: f64 = -1.0 / 5.0;

const SUCCESS_MESSAGE: &str = "The solver successfully reached the end of the integration interval.";

/// Integration scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OdeMethod {
    /// Adaptive Dormand–Prince 5(4).
    Rk45,
    /// Classical fourth-order Runge–Kutta with a fixed step of `0.01`.
    Rk4,
    /// Forward Euler with a fixed step of `0.01`.
    Euler,
}

impl OdeMethod {
    /// Case-insensitive lookup.
    ///
    /// # Errors
    /// Returns [`MathError::InvalidInput`] for any other name.
    pub fn parse(name: &str) -> MathResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "rk45" => Ok(Self::Rk45),
            "rk4" => Ok(Self::Rk4),
            "euler" => Ok(Self::Euler),
            _ => Err(MathError::invalid(format!(
                "Unknown method '{name}'. Supported methods: rk45, rk4, euler"
            ))),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rk45 => "rk45",
            Self::Rk4 => "rk4",
            Self::Euler => "euler",
        }
    }
}

impl fmt::Display for OdeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trajectory of an integrated system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OdeSolution {
    pub time: Vec<f64>,
    pub state: BTreeMap<String, Vec<f64>>,
    pub method: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Time,
    State(usize),
}

#[derive(Debug, Clone)]
struct Rhs {
    source: String,
    compiled: CompiledExpr,
    slots: Vec<Slot>,
}

/// A first-order system `dX/dt = f(X, t)` with state variables sorted by
/// name.
#[derive(Debug, Clone)]
pub struct OdeSystem {
    variables: Vec<String>,
    rhs: Vec<Rhs>,
}

fn derivative_variable(lhs: &str) -> MathResult<String> {
    if !lhs.contains("/dt") && !lhs.contains("/d t") {
        return Err(MathError::invalid(format!(
            "Left side '{lhs}' must be in form 'dx/dt' or 'dy/dt'"
        )));
    }
    let head = lhs.split('/').next().unwrap_or_default().trim();
    let name = head.strip_prefix('d').unwrap_or(head).trim();
    if name.is_empty() {
        return Err(MathError::invalid(format!(
            "Could not extract variable name from '{lhs}'"
        )));
    }
    Ok(name.to_string())
}

impl OdeSystem {
    /// Parses equations of the form `dx/dt = expression`.
    ///
    /// # Errors
    /// Returns [`MathError::InvalidInput`] for malformed equations, duplicate
    /// derivatives, or right-hand sides that reference unknown symbols, and
    /// [`MathError::Parse`] when a right-hand side does not parse.
    pub fn parse(equations: &[String]) -> MathResult<Self> {
        let mut by_name: BTreeMap<String, String> = BTreeMap::new();
        for equation in equations {
            let Some((lhs, rhs)) = equation.split_once('=') else {
                return Err(MathError::invalid(format!(
                    "Equation '{equation}' must contain '=' sign"
                )));
            };
            let name = derivative_variable(lhs.trim())?;
            if by_name.insert(name.clone(), rhs.trim().to_string()).is_some() {
                return Err(MathError::invalid(format!(
                    "Variable '{name}' has more than one equation"
                )));
            }
        }
        if by_name.is_empty() {
            return Err(MathError::invalid("At least one equation is required"));
        }

        let variables: Vec<String> = by_name.keys().cloned().collect();
        let mut rhs = Vec::with_capacity(variables.len());
        for source in by_name.into_values() {
            let compiled = CompiledExpr::compile(&parse(&source)?)?;
            let mut slots = Vec::with_capacity(compiled.variables().len());
            let mut unknown = Vec::new();
            for name in compiled.variables() {
                if name == "t" {
                    slots.push(Slot::Time);
                } else if let Some(idx) = variables.iter().position(|v| v == name) {
                    slots.push(Slot::State(idx));
                } else {
                    unknown.push(name.clone());
                }
            }
            if !unknown.is_empty() {
                return Err(MathError::invalid(format!(
                    "Expression '{source}' uses symbols without an equation: {}",
                    unknown.join(", ")
                )));
            }
            rhs.push(Rhs {
                source,
                compiled,
                slots,
            });
        }
        Ok(Self { variables, rhs })
    }

    /// State variable names in integration order.
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    fn derivatives(&self, t: f64, y: &[f64]) -> MathResult<Vec<f64>> {
        let mut args = Vec::new();
        self.rhs
            .iter()
            .map(|rhs| {
                args.clear();
                args.extend(rhs.slots.iter().map(|slot| match slot {
                    Slot::Time => t,
                    Slot::State(idx) => y[*idx],
                }));
                rhs.compiled.eval(&args).map_err(|err| {
                    MathError::evaluation(format!(
                        "Error evaluating expression '{}': {err}",
                        rhs.source
                    ))
                })
            })
            .collect()
    }
}

fn axpy(y: &[f64], h: f64, k: &[f64]) -> Vec<f64> {
    y.iter().zip(k).map(|(yi, ki)| yi + h * ki).collect()
}

fn fixed_grid(t0: f64, t1: f64) -> MathResult<Vec<f64>> {
    let count = ((t1 + FIXED_STEP - t0) / FIXED_STEP).ceil();
    if !count.is_finite() || count > MAX_STEPS as f64 {
        return Err(MathError::invalid(format!(
            "time_span [{t0}, {t1}] needs more than {MAX_STEPS} fixed steps of {FIXED_STEP}"
        )));
    }
    let count = count.max(1.0) as usize;
    Ok((0..count).map(|i| (i as f64).mul_add(FIXED_STEP, t0)).collect())
}

fn integrate_fixed(system: &OdeSystem, y0: Vec<f64>, grid: &[f64], method: OdeMethod) -> MathResult<Vec<Vec<f64>>> {
    let dt = FIXED_STEP;
    let mut states = Vec::with_capacity(grid.len());
    states.push(y0);
    for window in grid.windows(2) {
        let t = window[0];
        let y = states.last().map_or_else(Vec::new, Clone::clone);
        let next = match method {
            OdeMethod::Euler => axpy(&y, dt, &system.derivatives(t, &y)?),
            _ => {
                let k1 = system.derivatives(t, &y)?;
                let k2 = system.derivatives(t + dt / 2.0, &axpy(&y, dt / 2.0, &k1))?;
                let k3 = system.derivatives(t + dt / 2.0, &axpy(&y, dt / 2.0, &k2))?;
                let k4 = system.derivatives(t + dt, &axpy(&y, dt, &k3))?;
                y.iter()
                    .enumerate()
                    .map(|(i, yi)| yi + dt * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]) / 6.0)
                    .collect()
            }
        };
        states.push(next);
    }
    Ok(states)
}

const C: [f64; 6] = [0.0, 1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0];
const A: [[f64; 5]; 6] = [
    [0.0, 0.0, 0.0, 0.0, 0.0],
    [1.0 / 5.0, 0.0, 0.0, 0.0, 0.0],
    [3.0 / 40.0, 9.0 / 40.0, 0.0, 0.0, 0.0],
    [44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0, 0.0, 0.0],
    [19372.0 / 6561.0, -25360.0 / 2187.0, 64448.0 / 6561.0, -212.0 / 729.0, 0.0],
    [9017.0 / 3168.0, -355.0 / 33.0, 46732.0 / 5247.0, 49.0 / 176.0, -5103.0 / 18656.0],
];
const B: [f64; 6] = [35.0 / 384.0, 0.0, 500.0 / 1113.0, 125.0 / 192.0, -2187.0 / 6784.0, 11.0 / 84.0];
const E: [f64; 7] = [
    -71.0 / 57600.0,
    0.0,
    71.0 / 16695.0,
    -71.0 / 1920.0,
    17253.0 / 339_200.0,
    -22.0 / 525.0,
    1.0 / 40.0,
];

fn rms(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut n = 0usize;
    for v in values {
        sum += v * v;
        n += 1;
    }
    if n == 0 { 0.0 } else { (sum / n as f64).sqrt() }
}

fn initial_step(system: &OdeSystem, t0: f64, y0: &[f64], f0: &[f64], span: f64) -> MathResult<f64> {
    let scale: Vec<f64> = y0.iter().map(|y| ATOL + y.abs() * RTOL).collect();
    let d0 = rms(y0.iter().zip(&scale).map(|(y, s)| y / s));
    let d1 = rms(f0.iter().zip(&scale).map(|(f, s)| f / s));
    let h0 = if d0 < 1e-5 || d1 < 1e-5 { 1e-6 } else { 0.01 * d0 / d1 };
    let y1 = axpy(y0, h0, f0);
    let f1 = system.derivatives(t0 + h0, &y1)?;
    let d2 = rms(f1.iter().zip(f0).zip(&scale).map(|((a, b), s)| (a - b) / s)) / h0;
    let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
        (h0 * 1e-3).max(1e-6)
    } else {
        (0.01 / d1.max(d2)).powf(1.0 / 5.0)
    };
    Ok((100.0 * h0).min(h1).min(span))
}

fn dormand_prince_step(system: &OdeSystem, t: f64, y: &[f64], f: &[f64], h: f64) -> MathResult<(Vec<f64>, Vec<f64>, f64)> {
    let n = y.len();
    let mut k: Vec<Vec<f64>> = Vec::with_capacity(7);
    k.push(f.to_vec());
    for s in 1..6 {
        let stage: Vec<f64> = (0..n)
            .map(|i| {
                let dy: f64 = (0..s).map(|j| k[j][i] * A[s][j]).sum();
                y[i] + dy * h
            })
            .collect();
        k.push(system.derivatives(C[s].mul_add(h, t), &stage)?);
    }
    let y_new: Vec<f64> = (0..n)
        .map(|i| y[i] + h * (0..6).map(|j| k[j][i] * B[j]).sum::<f64>())
        .collect();
    let f_new = system.derivatives(t + h, &y_new)?;
    k.push(f_new.clone());
    let error_norm = rms((0..n).map(|i| {
        let err: f64 = (0..7).map(|j| k[j][i] * E[j]).sum::<f64>() * h;
        let scale = ATOL + y[i].abs().max(y_new[i].abs()) * RTOL;
        err / scale
    }));
    Ok((y_new, f_new, error_norm))
}

fn integrate_adaptive(system: &OdeSystem, y0: Vec<f64>, t0: f64, t1: f64) -> MathResult<(Vec<f64>, Vec<Vec<f64>>)> {
    let mut t = t0;
    let mut y = y0;
    let mut f = system.derivatives(t, &y)?;
    let mut h_abs = initial_step(system, t, &y, &f, t1 - t0)?;
    let mut times = vec![t];
    let mut states = vec![y.clone()];

    while t < t1 {
        if times.len() > MAX_STEPS {
            return Err(MathError::Convergence(format!(
                "Integration failed: exceeded {MAX_STEPS} steps"
            )));
        }
        let min_step = 10.0 * (next_up(t) - t);
        h_abs = h_abs.max(min_step);
        let mut rejected = false;
        loop {
            if h_abs < min_step {
                return Err(MathError::Convergence(
                    "Integration failed: Required step size is less than spacing between numbers.".to_string(),
                ));
            }
            let mut t_new = t + h_abs;
            if t_new > t1 {
                t_new = t1;
            }
            let h = t_new - t;
            h_abs = h;
            let (y_new, f_new, error_norm) = dormand_prince_step(system, t, &y, &f, h)?;
            if error_norm < 1.0 {
                let mut factor = if error_norm == 0.0 {
                    MAX_FACTOR
                } else {
                    MAX_FACTOR.min(SAFETY * error_norm.powf(ERROR_EXPONENT))
                };
                if rejected {
                    factor = factor.min(1.0);
                }
                h_abs *= factor;
                t = t_new;
                y = y_new;
                f = f_new;
                break;
            }
            h_abs *= MIN_FACTOR.max(SAFETY * error_norm.powf(ERROR_EXPONENT));
            rejected = true;
        }
        times.push(t);
        states.push(y.clone());
    }
    Ok((times, states))
}

fn next_up(value: f64) -> f64 {
    if value.is_nan() || value == f64::INFINITY {
        return value;
    }
    if value == 0.0 {
        return f64::from_bits(1);
    }
    let bits = value.to_bits();
    if value > 0.0 {
        f64::from_bits(bits + 1)
    } else {
        f64::from_bits(bits - 1)
    }
}

fn missing_set(missing: &[&String]) -> String {
    let names: Vec<String> = missing.iter().map(|name| format!("'{name}'")).collect();
    format!("{{{}}}", names.join(", "))
}

/// Integrates `equations` over `time_span` from `initial_conditions`.
///
/// # Errors
/// Returns [`MathError::InvalidInput`] for a malformed span, equation, or
/// method, or missing initial conditions; [`MathError::Evaluation`] when a
/// right-hand side cannot be evaluated; [`MathError::Convergence`] when the
/// adaptive solver gives up.
pub fn solve_ode(
    equations: &[String],
    initial_conditions: &BTreeMap<String, f64>,
    time_span: &[f64],
    method: &str,
) -> MathResult<OdeSolution> {
    let &[t0, t1] = time_span else {
        return Err(MathError::invalid(
            "time_span must be a list of two numbers [t_start, t_end]",
        ));
    };
    let system = OdeSystem::parse(equations)?;
    let missing: Vec<&String> = system
        .variables()
        .iter()
        .filter(|name| !initial_conditions.contains_key(*name))
        .collect();
    if !missing.is_empty() {
        return Err(MathError::invalid(format!(
            "Missing initial conditions for variables: {}",
            missing_set(&missing)
        )));
    }
    let method = OdeMethod::parse(method)?;
    if !(t0.is_finite() && t1.is_finite()) || t1 <= t0 {
        return Err(MathError::invalid("time_span must satisfy t_start < t_end"));
    }

    let y0: Vec<f64> = system
        .variables()
        .iter()
        .map(|name| initial_conditions.get(name).copied().unwrap_or_default())
        .collect();
    debug!(variables = ?system.variables(), %method, t0, t1, "integrating system");

    let (time, states, message) = match method {
        OdeMethod::Rk45 => {
            let (time, states) = integrate_adaptive(&system, y0, t0, t1)?;
            (time, states, Some(SUCCESS_MESSAGE.to_string()))
        }
        OdeMethod::Rk4 | OdeMethod::Euler => {
            let grid = fixed_grid(t0, t1)?;
            let states = integrate_fixed(&system, y0, &grid, method)?;
            (grid, states, None)
        }
    };

    let state = system
        .variables()
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.clone(), states.iter().map(|row| row[idx]).collect()))
        .collect();
    Ok(OdeSolution {
        time,
        state,
        method: method.to_string(),
        success: true,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eqs(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    fn ic(items: &[(&str, f64)]) -> BTreeMap<String, f64> {
        items.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    #[test]
    fn rk45_tracks_exponential_decay() {
        let sol = solve_ode(&eqs(&["dx/dt = -x"]), &ic(&[("x", 1.0)]), &[0.0, 5.0], "rk45").expect("solve");
        assert!(sol.success);
        assert_eq!(sol.method, "rk45");
        assert_eq!(sol.message.as_deref(), Some(SUCCESS_MESSAGE));
        assert_eq!(sol.time.first().copied(), Some(0.0));
        assert_eq!(sol.time.last().copied(), Some(5.0));
        let x = &sol.state["x"];
        let last = x.last().copied().unwrap_or_default();
        assert!((last - (-5.0f64).exp()).abs() < 1e-3);
        assert!(sol.time.len() < 100);
    }

    #[test]
    fn equations_map_to_their_own_variables() {
        let sol = solve_ode(
            &eqs(&["dy/dt = 0", "dx/dt = 1"]),
            &ic(&[("x", 0.0), ("y", 3.0)]),
            &[0.0, 2.0],
            "RK4",
        )
        .expect("solve");
        let x = sol.state["x"].last().copied().unwrap_or_default();
        let y = sol.state["y"].last().copied().unwrap_or_default();
        assert!((x - sol.time.last().copied().unwrap_or_default()).abs() < 1e-9);
        assert!((y - 3.0).abs() < 1e-12);
    }

    #[test]
    fn fixed_step_grid_covers_the_end_point() {
        let sol = solve_ode(&eqs(&["dx/dt = -0.5*x"]), &ic(&[("x", 2.0)]), &[0.0, 5.0], "euler").expect("solve");
        assert_eq!(sol.method, "euler");
        assert!(sol.message.is_none());
        assert!((501..=502).contains(&sol.time.len()));
        assert!((sol.time[500] - 5.0).abs() < 1e-9);
        let last = sol.state["x"][500];
        assert!((last - 2.0 * (-2.5f64).exp()).abs() < 0.01);
    }

    #[test]
    fn rk4_is_accurate_on_oscillators() {
        let sol = solve_ode(
            &eqs(&["dx/dt = v", "dv/dt = -x"]),
            &ic(&[("x", 1.0), ("v", 0.0)]),
            &[0.0, 3.14],
            "rk4",
        )
        .expect("solve");
        let t = sol.time.last().copied().unwrap_or_default();
        let x = sol.state["x"].last().copied().unwrap_or_default();
        assert!((x - t.cos()).abs() < 1e-8);
    }

    #[test]
    fn time_dependent_forcing() {
        let sol = solve_ode(&eqs(&["dx/dt = 2*t"]), &ic(&[("x", 0.0)]), &[0.0, 3.0], "rk45").expect("solve");
        let x = sol.state["x"].last().copied().unwrap_or_default();
        assert!((x - 9.0).abs() < 1e-6);
    }

    #[test]
    fn reports_malformed_input() {
        let err = |e: &[&str], c: &[(&str, f64)], span: &[f64], m: &str| {
            solve_ode(&eqs(e), &ic(c), span, m).expect_err("should fail").to_string()
        };
        assert_eq!(
            err(&["dx/dt = -x"], &[("x", 1.0)], &[0.0], "rk45"),
            "time_span must be a list of two numbers [t_start, t_end]"
        );
        assert_eq!(
            err(&["dx/dt -x"], &[("x", 1.0)], &[0.0, 1.0], "rk45"),
            "Equation 'dx/dt -x' must contain '=' sign"
        );
        assert_eq!(
            err(&["x' = -x"], &[("x", 1.0)], &[0.0, 1.0], "rk45"),
            "Left side 'x'' must be in form 'dx/dt' or 'dy/dt'"
        );
        assert_eq!(
            err(&["d/dt = 1"], &[], &[0.0, 1.0], "rk45"),
            "Could not extract variable name from 'd/dt'"
        );
        assert_eq!(
            err(&["dx/dt = -x", "dy/dt = -y"], &[("x", 1.0)], &[0.0, 5.0], "rk45"),
            "Missing initial conditions for variables: {'y'}"
        );
        assert!(err(&["dx/dt = -x"], &[("x", 1.0)], &[0.0, 1.0], "lsoda").starts_with("Unknown method 'lsoda'"));
        assert!(err(&["dx/dt = -k*x"], &[("x", 1.0)], &[0.0, 1.0], "rk45").contains("k"));
    }

    #[test]
    fn solution_serializes_with_stable_keys() {
        let sol = solve_ode(&eqs(&["dx/dt = 1"]), &ic(&[("x", 0.0)]), &[0.0, 0.02], "euler").expect("solve");
        let json = serde_json::to_value(&sol).expect("json");
        assert!(json.get("time").is_some());
        assert!(json["state"].get("x").is_some());
        assert_eq!(json["success"], serde_json::Value::Bool(true));
        assert!(json.get("message").is_none());
    }
}
