// ============================================================================
// Dashboard - Rendu de l'interface principale
// ============================================================================
// Dessine l'écran complet :
//
//   ┌ header : titre, symbole, timeframe, stratégie, dernière mise à jour ┐
//   │ panes : un bloc par vue, hauteur proportionnelle à sa config        │
//   │ trades : tableau + résumé P/L                                       │
//   └ footer : raccourcis clavier / confirmation de sortie                ┘
//
// CONCEPTS RATATUI :
// 1. Layout : découpage de l'espace en zones
// 2. Table : tableau des trades
// 3. Style : couleurs et attributs de texte
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table},
    Frame,
};

use crate::api::ChartDataSource;
use crate::app::App;
use crate::chart::HeadlessRenderer;
use crate::models::Metadata;
use crate::trades::TradeTable;
use crate::ui::chart::render_pane;

/// Nombre maximum de lignes de trades affichées
const MAX_TRADE_ROWS: usize = 6;

/// Dessine l'interface complète
pub fn render<S: ChartDataSource>(frame: &mut Frame, app: &App<S>, renderer: &HeadlessRenderer) {
    let trades = app.chart.chart().map(|c| &c.trades);
    let trade_rows = trades.map(|t| t.rows.len().min(MAX_TRADE_ROWS)).unwrap_or(0);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),                          // Header
            Constraint::Min(0),                             // Panes
            Constraint::Length(trade_rows as u16 + 4),      // Trades
            Constraint::Length(3),                          // Footer
        ])
        .split(frame.size())
        .to_vec();

    render_header(frame, app.chart.chart().map(|c| &c.metadata), chunks[0]);
    render_panes(frame, app, renderer, chunks[1]);
    render_trades(frame, trades, chunks[2]);
    render_footer(frame, app, chunks[3]);
}

// ============================================================================
// Header : métadonnées
// ============================================================================

/// Lignes du header : titre puis détails
pub fn header_lines(metadata: Option<&Metadata>) -> (String, String) {
    let Some(metadata) = metadata else {
        return ("Financial Chart".to_string(), "Chargement...".to_string());
    };

    let title = metadata.title.clone().unwrap_or_else(|| "Financial Chart".to_string());
    let unknown = |v: &Option<String>| v.clone().unwrap_or_else(|| "Unknown".to_string());

    let mut details = format!(
        "{}  |  {}  |  Strategy: {}",
        unknown(&metadata.symbol),
        unknown(&metadata.timeframe),
        unknown(&metadata.strategy),
    );
    if let Some(updated) = metadata.last_updated() {
        details.push_str(&format!("  |  Last updated: {}", updated.format("%Y-%m-%d %H:%M:%S")));
    }

    (title, details)
}

fn render_header(frame: &mut Frame, metadata: Option<&Metadata>, area: Rect) {
    let (title, details) = header_lines(metadata);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" LazyChart ")
        .title_alignment(Alignment::Center);

    let text = vec![
        Line::from(Span::styled(
            title,
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(details, Style::default().fg(Color::Gray))),
    ];

    let paragraph = Paragraph::new(text).block(block).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Panes
// ============================================================================

fn render_panes<S: ChartDataSource>(frame: &mut Frame, app: &App<S>, renderer: &HeadlessRenderer, area: Rect) {
    let panes = app.chart.panes();
    let names = panes.list_views();

    let canvases: Vec<_> = panes
        .all_containers()
        .iter()
        .filter_map(|container| renderer.canvas(&container.id))
        .collect();

    if canvases.is_empty() {
        let paragraph = Paragraph::new("Aucun pane")
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
        return;
    }

    // Hauteurs proportionnelles aux hauteurs configurées
    let total: u32 = canvases.iter().map(|c| c.borrow().height() as u32).sum::<u32>().max(1);
    let constraints: Vec<Constraint> = canvases
        .iter()
        .map(|c| Constraint::Ratio(c.borrow().height() as u32, total))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (index, (canvas, chunk)) in canvases.iter().zip(chunks.iter()).enumerate() {
        let name = names.get(index).copied().unwrap_or("?");
        render_pane(frame, &canvas.borrow(), name, index == app.focused, *chunk);
    }
}

// ============================================================================
// Trades
// ============================================================================

fn render_trades(frame: &mut Frame, trades: Option<&TradeTable>, area: Rect) {
    let empty = TradeTable::empty();
    let trades = trades.unwrap_or(&empty);

    let summary_color = if trades.total_profit >= 0.0 { Color::Green } else { Color::Red };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Line::from(vec![
            Span::raw(" Trades | "),
            Span::styled(trades.summary.clone(), Style::default().fg(summary_color)),
            Span::raw(" "),
        ]));

    let header = Row::new(vec!["#", "Date", "Direction", "Entry", "Exit", "Size", "P/L"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    // Les derniers trades sont les plus intéressants
    let skip = trades.rows.len().saturating_sub(MAX_TRADE_ROWS);
    let rows: Vec<Row> = trades
        .rows
        .iter()
        .skip(skip)
        .map(|row| {
            let profit_color = if row.profit_raw >= 0.0 { Color::Green } else { Color::Red };
            let mut style = Style::default();
            if row.is_open {
                style = style.add_modifier(Modifier::ITALIC);
            }
            Row::new(vec![
                Span::raw(row.number.to_string()),
                Span::raw(row.date.clone()),
                Span::raw(row.direction.label()),
                Span::raw(row.entry_price.clone()),
                Span::raw(row.exit_price.clone()),
                Span::raw(row.size.clone()),
                Span::styled(row.profit.clone(), Style::default().fg(profit_color)),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Length(22),
        Constraint::Length(10),
        Constraint::Length(12),
        Constraint::Length(12),
        Constraint::Length(10),
        Constraint::Length(12),
    ];

    let table = Table::new(rows, widths).header(header).block(block);
    frame.render_widget(table, area);
}

// ============================================================================
// Footer : Instructions
// ============================================================================

fn render_footer<S: ChartDataSource>(frame: &mut Frame, app: &App<S>, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let line = if app.confirm_quit {
        Line::from(vec![
            Span::styled("⚠  Appuyez sur ", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::styled(
                "[q]",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::styled(
                " à nouveau pour quitter, ou n'importe quelle autre touche pour annuler ⚠",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ])
    } else if let Some(status) = &app.status {
        Line::from(Span::styled(status.clone(), Style::default().fg(Color::Red)))
    } else {
        Line::from(vec![
            key("[q]"),
            Span::raw(" Quit  "),
            key("[← → / h l]"),
            Span::raw(" Pan  "),
            key("[+ -]"),
            Span::raw(" Zoom  "),
            key("[Tab]"),
            Span::raw(" Pane  "),
            key("[f]"),
            Span::raw(" Fit  "),
            key("[r]"),
            Span::raw(" Refresh"),
        ])
    };

    let paragraph = Paragraph::new(vec![line]).block(block).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_header_defaults() {
        let (title, details) = header_lines(Some(&Metadata::default()));
        assert_eq!(title, "Financial Chart");
        assert_eq!(details, "Unknown  |  Unknown  |  Strategy: Unknown");

        let (_, loading) = header_lines(None);
        assert_eq!(loading, "Chargement...");
    }

    #[test]
    fn test_header_with_timestamp() {
        let metadata = Metadata {
            title: Some("BTC".to_string()),
            symbol: Some("BTCUSDT".to_string()),
            timeframe: Some("1h".to_string()),
            strategy: Some("ema-cross".to_string()),
            timestamp: Some(json!(1_705_312_800_000_i64)),
        };
        let (title, details) = header_lines(Some(&metadata));
        assert_eq!(title, "BTC");
        assert!(details.starts_with("BTCUSDT  |  1h  |  Strategy: ema-cross"));
        assert!(details.ends_with("Last updated: 2024-01-15 10:00:00"));
    }
}
