use indexmap::IndexMap;
use math_charts::{
    AxisValues, BarChart, ChartError, ChartKind, ChartSpec, GridSetting, HeatmapChart,
    HistogramChart, OdeSolutionChart, OutputFormat, PieChart, ScatterChart, StackedBarChart,
    StackplotChart, TimeseriesChart,
};

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

fn svg_text<C: ChartSpec>(chart: &C) -> String {
    let rendered = chart
        .render()
        .unwrap_or_else(|err| panic!("failed to render {}: {err}", C::KIND));
    assert_eq!(rendered.format(), OutputFormat::Svg);
    assert_eq!(rendered.mime_type(), "image/svg+xml");
    String::from_utf8(rendered.bytes().to_vec()).expect("svg is utf8")
}

fn series(entries: &[(&str, &[f64])]) -> IndexMap<String, Vec<f64>> {
    entries
        .iter()
        .map(|(name, values)| ((*name).to_string(), values.to_vec()))
        .collect()
}

fn timeseries() -> TimeseriesChart {
    TimeseriesChart {
        timestamps: vec!["2024-01".into(), "2024-02".into(), "2024-03".into()],
        series: series(&[("Revenue", &[100.0, 120.0, 130.0]), ("Cost", &[80.0, 85.0, 90.0])]),
        title: Some("Quarterly".into()),
        output_format: "svg".into(),
        ..TimeseriesChart::default()
    }
}

#[test]
fn every_kind_renders_svg() {
    let svg = svg_text(&timeseries());
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains("Quarterly"));
    assert!(svg.contains("Revenue"));

    let svg = svg_text(&BarChart {
        categories: vec!["Apples".into(), "Pears".into()],
        values: vec![3.0, 5.5],
        output_format: "svg".into(),
        ..BarChart::default()
    });
    assert!(svg.contains("Pears"));
    assert!(svg.contains("5.5"));

    let svg = svg_text(&HistogramChart {
        data: vec![1.0, 2.0, 2.0, 3.0, 3.0, 3.0],
        bins: 3,
        output_format: "svg".into(),
        ..HistogramChart::default()
    });
    assert!(svg.contains("Mean: 2.33"));

    let svg = svg_text(&ScatterChart {
        x_data: vec![1.0, 2.0, 3.0],
        y_data: vec![2.0, 4.0, 6.0],
        output_format: "svg".into(),
        ..ScatterChart::default()
    });
    assert!(svg.contains("Correlation: 1.000"));

    let svg = svg_text(&HeatmapChart {
        data: vec![vec![1.0, 2.0], vec![3.0, 4.0]],
        output_format: "svg".into(),
        ..HeatmapChart::default()
    });
    assert!(svg.contains("4.0"));

    let svg = svg_text(&StackedBarChart {
        categories: vec!["Q1".into(), "Q2".into()],
        series: series(&[("North", &[1.0, 2.0]), ("South", &[3.0, 4.0])]),
        output_format: "svg".into(),
        ..StackedBarChart::default()
    });
    assert!(svg.contains("South"));
    assert!(svg.contains("6.00"));

    let svg = svg_text(&StackplotChart {
        x_data: AxisValues::Numbers(vec![1.0, 2.0, 3.0]),
        series: series(&[("Solar", &[1.0, 2.0, 3.0]), ("Wind", &[2.0, 2.0, 2.0])]),
        output_format: "svg".into(),
        ..StackplotChart::default()
    });
    assert!(svg.contains("Wind"));

    let svg = svg_text(&OdeSolutionChart {
        ode_result: r#"{"time": [0.0, 0.5, 1.0], "state": {"x": [1.0, 0.6, 0.37]}, "method": "rk45", "success": true}"#
            .into(),
        output_format: "svg".into(),
        ..OdeSolutionChart::default()
    });
    assert!(svg.contains("ODE Solution"));
    assert!(svg.contains("Method: rk45"));

    let svg = svg_text(&PieChart {
        labels: vec!["Yes".into(), "No".into()],
        values: vec![3.0, 1.0],
        output_format: "svg".into(),
        ..PieChart::default()
    });
    assert!(svg.contains("75.0%"));
}

#[test]
fn png_output_is_a_real_png() {
    let chart = TimeseriesChart { output_format: "png".into(), ..timeseries() };
    let rendered = chart.render().expect("render png");
    assert_eq!(rendered.format(), OutputFormat::Png);
    assert_eq!(rendered.mime_type(), "image/png");
    assert!(rendered.bytes().starts_with(PNG_SIGNATURE));
    // IHDR carries the canvas size right after the signature and chunk header.
    let width = u32::from_be_bytes(rendered.bytes()[16..20].try_into().expect("width"));
    let height = u32::from_be_bytes(rendered.bytes()[20..24].try_into().expect("height"));
    assert_eq!((width, height), (1000, 600));
    assert!(!rendered.to_base64().is_empty());
}

#[test]
fn figsize_controls_canvas() {
    let chart = PieChart {
        labels: vec!["A".into()],
        values: vec![1.0],
        figsize: Some(vec![400, 300]),
        ..PieChart::default()
    };
    let rendered = chart.render().expect("render");
    let width = u32::from_be_bytes(rendered.bytes()[16..20].try_into().expect("width"));
    assert_eq!(width, 400);
}

#[test]
fn invalid_requests_are_reported_as_invalid() {
    let chart = TimeseriesChart { grid: GridSetting::Axis("z".into()), ..timeseries() };
    assert!(matches!(chart.render(), Err(ChartError::Invalid(_))));

    let chart = TimeseriesChart { output_format: "gif".into(), ..timeseries() };
    let error = chart.render().expect_err("gif is rejected");
    assert_eq!(error.to_string(), "output_format must be 'png' or 'svg'");
}

#[test]
fn kinds_have_readable_names() {
    assert_eq!(TimeseriesChart::KIND, ChartKind::Timeseries);
    assert_eq!(ChartKind::StackedBar.to_string(), "stacked bar chart");
    assert_eq!(OdeSolutionChart::KIND.label(), "ODE solution plot");
}
