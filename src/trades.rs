// ============================================================================
// Tableau des trades
// ============================================================================
// Met en forme les trades de la stratégie pour l'affichage : une ligne par
// trade (clos puis ouverts) et un résumé du P/L.
//
// Les trades ouverts sont valorisés au dernier cours de clôture :
//   P/L latent = (cours - prix d'entrée) * taille * (+1 long / -1 short)
// ============================================================================

use chrono::DateTime;

use crate::models::{Candle, Direction, StrategyReport, Trade};

/// Une ligne du tableau, prête à afficher
#[derive(Debug, Clone, PartialEq)]
pub struct TradeRow {
    pub number: usize,
    pub date: String,
    pub direction: Direction,
    pub entry_price: String,
    pub exit_price: String,
    pub size: String,
    pub profit: String,
    /// P/L numérique (réalisé ou latent), pour la couleur
    pub profit_raw: f64,
    pub is_open: bool,
}

/// Tableau complet : lignes + résumé
#[derive(Debug, Clone, PartialEq)]
pub struct TradeTable {
    pub rows: Vec<TradeRow>,
    pub summary: String,
    pub total_profit: f64,
}

impl TradeTable {
    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            summary: "No trades".to_string(),
            total_profit: 0.0,
        }
    }

    /// Construit le tableau à partir du rapport de stratégie
    pub fn build(report: Option<&StrategyReport>, candles: &[Candle]) -> Self {
        let Some(report) = report else {
            return Self::empty();
        };

        let formatter = TradeFormatter::new(candles);
        let trades: Vec<(&Trade, bool)> = report
            .trades
            .iter()
            .map(|t| (t, t.is_open()))
            .chain(report.open_trades.iter().map(|t| (t, true)))
            .collect();

        if trades.is_empty() {
            return Self::empty();
        }

        let rows: Vec<TradeRow> = trades
            .iter()
            .enumerate()
            .map(|(i, (trade, is_open))| formatter.format_trade(trade, i, *is_open))
            .collect();

        let unrealized: f64 = report
            .open_trades
            .iter()
            .map(|t| formatter.unrealized_profit(t))
            .sum();
        let total_profit = report.net_profit.unwrap_or(0.0) + unrealized;

        Self {
            summary: format!("{} trades | Net P/L: ${:.2}", rows.len(), total_profit),
            rows,
            total_profit,
        }
    }
}

/// Formateur de trades
pub struct TradeFormatter<'a> {
    candles: &'a [Candle],
}

impl<'a> TradeFormatter<'a> {
    pub fn new(candles: &'a [Candle]) -> Self {
        Self { candles }
    }

    /// Dernier cours de clôture
    pub fn current_price(&self) -> Option<f64> {
        self.candles.last().map(|c| c.close)
    }

    /// Date d'entrée : `entryTime` (ms), sinon le temps de la barre d'entrée
    pub fn trade_date(&self, trade: &Trade) -> String {
        let timestamp_ms = trade.entry_time.filter(|t| *t != 0).or_else(|| {
            trade
                .entry_bar
                .and_then(|bar| self.candles.get(bar))
                .map(|c| c.time * 1000)
        });

        timestamp_ms
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.format("%b %-d, %Y, %H:%M").to_string())
            .unwrap_or_else(|| "N/A".to_string())
    }

    /// P/L latent d'un trade ouvert au dernier cours
    pub fn unrealized_profit(&self, trade: &Trade) -> f64 {
        match self.current_price() {
            Some(price) => (price - trade.entry_price) * trade.size * trade.direction.multiplier(),
            None => 0.0,
        }
    }

    pub fn format_trade(&self, trade: &Trade, index: usize, is_open: bool) -> TradeRow {
        let (exit, profit) = if is_open {
            (self.current_price(), self.unrealized_profit(trade))
        } else {
            (trade.exit_price, trade.profit.unwrap_or(0.0))
        };

        TradeRow {
            number: index + 1,
            date: self.trade_date(trade),
            direction: trade.direction,
            entry_price: format_price(Some(trade.entry_price)),
            exit_price: format_price(exit),
            size: format!("{:.2}", trade.size),
            profit: format_profit(profit),
            profit_raw: profit,
            is_open,
        }
    }
}

fn format_price(price: Option<f64>) -> String {
    match price {
        Some(p) => format!("${:.2}", p),
        None => "N/A".to_string(),
    }
}

/// "+$12.50" ou "-$3.20"
fn format_profit(profit: f64) -> String {
    let sign = if profit >= 0.0 { '+' } else { '-' };
    format!("{}${:.2}", sign, profit.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(time: i64, close: f64) -> Candle {
        Candle { time, open: close, high: close, low: close, close, volume: 1000.0 }
    }

    fn trade(direction: Direction, entry: f64, size: f64) -> Trade {
        Trade {
            entry_time: None,
            entry_bar: None,
            direction,
            entry_price: entry,
            exit_price: None,
            size,
            profit: None,
            status: None,
        }
    }

    #[test]
    fn test_no_report_or_no_trades() {
        assert_eq!(TradeTable::build(None, &[]).summary, "No trades");
        let report = StrategyReport::default();
        let table = TradeTable::build(Some(&report), &[]);
        assert!(table.rows.is_empty());
        assert_eq!(table.summary, "No trades");
    }

    #[test]
    fn test_closed_and_open_trades() {
        let candles = [candle(1_700_000_000, 100.0), candle(1_700_000_060, 110.0)];
        let closed = Trade {
            exit_price: Some(105.0),
            profit: Some(5.0),
            entry_bar: Some(0),
            ..trade(Direction::Long, 100.0, 1.0)
        };
        let open_short = trade(Direction::Short, 120.0, 2.0);
        let report = StrategyReport {
            trades: vec![closed],
            open_trades: vec![open_short],
            net_profit: Some(5.0),
        };

        let table = TradeTable::build(Some(&report), &candles);

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].exit_price, "$105.00");
        assert_eq!(table.rows[0].profit, "+$5.00");
        assert!(!table.rows[0].is_open);

        // Short ouvert à 120, cours 110 : +20 latent
        assert!(table.rows[1].is_open);
        assert_eq!(table.rows[1].number, 2);
        assert_eq!(table.rows[1].exit_price, "$110.00");
        assert_eq!(table.rows[1].profit, "+$20.00");

        assert_eq!(table.total_profit, 25.0);
        assert_eq!(table.summary, "2 trades | Net P/L: $25.00");
    }

    #[test]
    fn test_trade_date_sources() {
        let candles = [candle(1_705_312_800, 1.0)];
        let formatter = TradeFormatter::new(&candles);

        let by_time = Trade { entry_time: Some(1_705_312_800_000), ..trade(Direction::Long, 1.0, 1.0) };
        let by_bar = Trade { entry_bar: Some(0), ..trade(Direction::Long, 1.0, 1.0) };
        let out_of_range = Trade { entry_bar: Some(5), ..trade(Direction::Long, 1.0, 1.0) };

        assert_eq!(formatter.trade_date(&by_time), "Jan 15, 2024, 10:00");
        assert_eq!(formatter.trade_date(&by_bar), "Jan 15, 2024, 10:00");
        assert_eq!(formatter.trade_date(&out_of_range), "N/A");
    }

    #[test]
    fn test_unrealized_without_candles() {
        let formatter = TradeFormatter::new(&[]);
        assert_eq!(formatter.unrealized_profit(&trade(Direction::Long, 10.0, 1.0)), 0.0);
        assert_eq!(format_profit(-3.2), "-$3.20");
    }
}
