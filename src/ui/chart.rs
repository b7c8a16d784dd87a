// ============================================================================
// Chart - Rendu d'un pane
// ============================================================================
// Dessine le contenu d'un canvas headless avec le widget Chart de ratatui :
// - x = index logique de la barre (position dans l'échelle de temps)
// - seules les barres de la fenêtre visible sont dessinées
// - lignes : coupées aux points transparents, ancres (NaN) ignorées
// - histogrammes : une barre verticale depuis 0 par point
// - chandelles : mèche high/low colorée + ligne des clôtures
//
// CONCEPTS RATATUI :
// 1. Chart widget : graphique ligne
// 2. Dataset : série de données à afficher
// 3. Axis : configuration des axes X et Y
// ============================================================================

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::chart::headless::{Canvas, SeriesData, SeriesKind};
use crate::models::{Candle, LogicalRange, RenderPoint};

/// Un tracé prêt à dessiner : points (x, y) + couleur
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub points: Vec<(f64, f64)>,
    pub color: Color,
}

/// Convertit "#rrggbb" en couleur terminal
pub fn parse_color(hex: &str) -> Color {
    let digits = hex.trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return Color::Gray;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    match (channel(0), channel(2), channel(4)) {
        (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
        _ => Color::Gray,
    }
}

/// Index logique d'un timestamp dans l'échelle de temps
fn logical_index(scale: &[i64], time: i64) -> Option<f64> {
    scale.binary_search(&time).ok().map(|i| i as f64)
}

fn in_window(x: f64, window: LogicalRange) -> bool {
    x >= window.from && x <= window.to
}

/// Découpe une série de ligne en segments continus
///
/// Un point transparent termine son segment ; une ancre n'est jamais
/// dessinée.
pub fn line_segments(points: &[RenderPoint], scale: &[i64], window: LogicalRange) -> Vec<Vec<(f64, f64)>> {
    let mut segments = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();

    for point in points {
        if point.is_anchor() {
            if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
            continue;
        }

        if let Some(x) = logical_index(scale, point.time).filter(|x| in_window(*x, window)) {
            current.push((x, point.value));
        }

        if point.is_transparent() && !current.is_empty() {
            segments.push(std::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        segments.push(current);
    }
    segments
}

/// Une barre verticale (x, 0) -> (x, v) par point valide
pub fn histogram_bars(points: &[RenderPoint], scale: &[i64], window: LogicalRange) -> Vec<Vec<(f64, f64)>> {
    points
        .iter()
        .filter(|p| p.value.is_finite())
        .filter_map(|p| {
            let x = logical_index(scale, p.time).filter(|x| in_window(*x, window))?;
            Some(vec![(x, 0.0), (x, p.value)])
        })
        .collect()
}

/// Mèches des chandelles + ligne des clôtures
fn candle_traces(candles: &[Candle], scale: &[i64], window: LogicalRange, up: Color, down: Color) -> Vec<Trace> {
    let mut traces = Vec::new();
    let mut closes = Vec::new();

    for candle in candles {
        let Some(x) = logical_index(scale, candle.time).filter(|x| in_window(*x, window)) else {
            continue;
        };
        let color = if candle.is_bullish() { up } else { down };
        traces.push(Trace {
            points: vec![(x, candle.low), (x, candle.high)],
            color,
        });
        closes.push((x, candle.close));
    }

    traces.push(Trace {
        points: closes,
        color: Color::White,
    });
    traces
}

/// Tous les tracés d'un canvas, dans sa fenêtre visible
pub fn canvas_traces(canvas: &Canvas) -> (Vec<Trace>, LogicalRange) {
    let scale = canvas.time_scale();
    let full = LogicalRange::new(0.0, scale.len().saturating_sub(1) as f64);
    let window = canvas.visible_range().unwrap_or(full);

    let mut traces = Vec::new();
    for (_, entry) in canvas.series() {
        match (&entry.kind, &entry.data) {
            (SeriesKind::Line(options), SeriesData::Points(points)) => {
                let color = parse_color(&options.color);
                traces.extend(
                    line_segments(points, &scale, window)
                        .into_iter()
                        .map(|points| Trace { points, color }),
                );
            }
            (SeriesKind::Histogram(options), SeriesData::Points(points)) => {
                let color = parse_color(&options.color);
                traces.extend(
                    histogram_bars(points, &scale, window)
                        .into_iter()
                        .map(|points| Trace { points, color }),
                );
            }
            (SeriesKind::Candlestick(style), SeriesData::Candles(candles)) => {
                traces.extend(candle_traces(
                    candles,
                    &scale,
                    window,
                    parse_color(&style.up_color),
                    parse_color(&style.down_color),
                ));
            }
            _ => {}
        }
    }

    (traces, window)
}

/// Bornes Y de tous les tracés, avec une marge de 5%
fn y_bounds(traces: &[Trace]) -> Option<[f64; 2]> {
    let (min, max) = traces
        .iter()
        .flat_map(|t| t.points.iter().map(|(_, y)| *y))
        .filter(|y| y.is_finite())
        .fold((f64::MAX, f64::MIN), |(min, max), y| (min.min(y), max.max(y)));

    if min > max {
        return None;
    }
    let margin = ((max - min) * 0.05).max(f64::EPSILON);
    Some([min - margin, max + margin])
}

/// Dessine un pane
pub fn render_pane(frame: &mut Frame, canvas: &Canvas, title: &str, focused: bool, area: Rect) {
    let border = if focused { Color::Yellow } else { Color::Cyan };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(format!(" {} ", title));

    let (traces, window) = canvas_traces(canvas);
    let Some([y_min, y_max]) = y_bounds(&traces) else {
        render_no_data(frame, block, area);
        return;
    };

    // CONCEPT RATATUI : Dataset emprunte ses points
    // - les traces doivent vivre plus longtemps que le widget Chart
    let datasets: Vec<Dataset> = traces
        .iter()
        .map(|trace| {
            Dataset::default()
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(trace.color))
                .data(&trace.points)
        })
        .collect();

    let x_axis = Axis::default()
        .style(Style::default().fg(Color::Gray))
        .bounds([window.from, window.to]);

    let y_axis = Axis::default()
        .style(Style::default().fg(Color::Gray))
        .bounds([y_min, y_max])
        .labels(vec![
            Span::raw(format!("{:.2}", y_min)),
            Span::raw(format!("{:.2}", (y_min + y_max) / 2.0)),
            Span::raw(format!("{:.2}", y_max)),
        ]);

    let chart = Chart::new(datasets).block(block).x_axis(x_axis).y_axis(y_axis);
    frame.render_widget(chart, area);
}

/// Pane sans aucun point à afficher
fn render_no_data(frame: &mut Frame, block: Block, area: Rect) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Pas de données à afficher",
            Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC),
        )),
    ];

    let paragraph = Paragraph::new(text).block(block).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: LogicalRange = LogicalRange { from: 0.0, to: 100.0 };

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#2196F3"), Color::Rgb(0x21, 0x96, 0xF3));
        assert_eq!(parse_color("transparent"), Color::Gray);
        assert_eq!(parse_color("#zzzzzz"), Color::Gray);
    }

    #[test]
    fn test_line_segments_split_at_gaps() {
        let scale = [1, 2, 3, 4];
        let points = [
            RenderPoint::new(1, 10.0),
            RenderPoint::new(2, 20.0).transparent(),
            RenderPoint::anchor(3),
            RenderPoint::new(4, 40.0),
        ];

        let segments = line_segments(&points, &scale, ALL);
        assert_eq!(segments, vec![vec![(0.0, 10.0), (1.0, 20.0)], vec![(3.0, 40.0)]]);
    }

    #[test]
    fn test_segments_respect_window() {
        let scale = [1, 2, 3, 4];
        let points: Vec<RenderPoint> = scale.iter().map(|t| RenderPoint::new(*t, *t as f64)).collect();

        let segments = line_segments(&points, &scale, LogicalRange::new(1.0, 2.0));
        assert_eq!(segments, vec![vec![(1.0, 2.0), (2.0, 3.0)]]);
    }

    #[test]
    fn test_histogram_bars() {
        let scale = [5, 6];
        let points = [RenderPoint::new(5, -1.0), RenderPoint::anchor(6)];
        assert_eq!(histogram_bars(&points, &scale, ALL), vec![vec![(0.0, 0.0), (0.0, -1.0)]]);
    }

    #[test]
    fn test_y_bounds() {
        assert_eq!(y_bounds(&[]), None);
        let traces = [Trace { points: vec![(0.0, 10.0), (1.0, 20.0)], color: Color::White }];
        let [min, max] = y_bounds(&traces).unwrap();
        assert!(min < 10.0 && max > 20.0);
    }
}
