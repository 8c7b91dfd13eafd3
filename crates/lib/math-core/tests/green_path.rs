use std::collections::BTreeMap;

use math_core::numeric::{OdeSolution, find_root, solve_ode};
use math_core::symbolic::{
    cancel_fraction, differentiate, differentiate_n, expand, factor, integrate, integrate_definite,
    parse, simplify, solve, to_latex,
};
use math_core::{stats, units};

fn expr(text: &str) -> math_core::symbolic::Expr {
    parse(text).unwrap_or_else(|err| panic!("failed to parse {text}: {err}"))
}

#[test]
fn symbolic_round_trip_through_text() {
    assert_eq!(simplify(&expr("x^2 + 2*x + 1 - (x + 1)^2")).to_string(), "0");
    assert_eq!(
        expand(&expr("(x + 1)^3")).expect("expand").to_string(),
        "x**3 + 3*x**2 + 3*x + 1"
    );
    assert_eq!(factor(&expr("x^2 - 5*x + 6")).expect("factor").to_string(), "(x - 3)*(x - 2)");
    assert_eq!(cancel_fraction(&expr("(x**2 - 4)/(x - 2)")).to_string(), "x + 2");
    assert_eq!(to_latex(&expr("x**2")), "x^{2}");
}

#[test]
fn calculus_agrees_with_itself() {
    let f = expr("x**3 + sin(x)");
    let derivative = differentiate(&f, "x");
    assert_eq!(derivative.to_string(), "3*x**2 + cos(x)");
    assert_eq!(differentiate_n(&f, "x", 2).expect("second derivative").to_string(), "6*x - sin(x)");
    let antiderivative = integrate(&derivative, "x").expect("integrate");
    assert_eq!(simplify(&differentiate(&antiderivative, "x")).to_string(), derivative.to_string());
    let area = integrate_definite(&expr("x**2"), "x", &expr("0"), &expr("3")).expect("definite");
    assert_eq!(area.to_string(), "9");
}

#[test]
fn solve_and_find_root_agree() {
    assert_eq!(solve("x**2 - 4 = 0", "x").expect("solve"), vec!["-2", "2"]);
    let root = find_root("x^2 - 4", 1.0, Some(&[0.0, 3.0]), "brentq").expect("root");
    assert!((root.root - 2.0).abs() < 1e-9);
}

#[test]
fn ode_solution_json_round_trips() {
    let initial = BTreeMap::from([("x".to_string(), 1.0), ("y".to_string(), 0.0)]);
    let equations = vec!["dx/dt = -x + y".to_string(), "dy/dt = x - y".to_string()];
    let solution = solve_ode(&equations, &initial, &[0.0, 10.0], "rk45").expect("solve");
    let text = serde_json::to_string(&solution).expect("serialize");
    let back: OdeSolution = serde_json::from_str(&text).expect("deserialize");
    assert_eq!(back.state["x"].len(), back.state["y"].len());
    assert_eq!(back.time.len(), back.state["x"].len());
    let x = back.state["x"].last().copied().unwrap_or_default();
    let y = back.state["y"].last().copied().unwrap_or_default();
    assert!((x + y - 1.0).abs() < 1e-3);
    assert!((x - 0.5).abs() < 5e-3);
}

#[test]
fn statistics_and_units_serialize_as_objects() {
    let description = stats::describe_data(&[1.0, 2.0, 3.0, 4.0]).expect("describe");
    let json = serde_json::to_value(&description).expect("json");
    assert_eq!(json["count"], 4);
    assert!(json["percentiles"].get("p95").is_some());
    assert_eq!(units::convert_unit(1.0, "hour", "minute").expect("convert"), "60");
}
