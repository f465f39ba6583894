//! Grid table rendering

use tabled::builder::Builder;
use tabled::settings::Style;

use super::format_other_rewards;
use crate::metrics::SecondaryMetrics;
use crate::pipeline::AggregatedRecord;

const NAME_WIDTH: usize = 25;
const SHOWN_COINS: usize = 3;
const SHOWN_RATIOS: usize = 2;
const COIN_SEPARATOR: &str = " / ";
const RATIO_SEPARATOR: &str = ", ";

/// $1.23B / $4.56M / $7.89K / $12.34
pub fn format_currency(amount: f64) -> String {
    if amount >= 1_000_000_000.0 {
        format!("${:.2}B", amount / 1_000_000_000.0)
    } else if amount >= 1_000_000.0 {
        format!("${:.2}M", amount / 1_000_000.0)
    } else if amount >= 1_000.0 {
        format!("${:.2}K", amount / 1_000.0)
    } else {
        format!("${:.2}", amount)
    }
}

/// Cut to 25 chars, "..." included
pub fn truncate_name(name: &str) -> String {
    if name.chars().count() > NAME_WIDTH {
        let head: String = name.chars().take(NAME_WIDTH - 3).collect();
        format!("{}...", head)
    } else {
        name.to_string()
    }
}

fn head_list(items: &[String], shown: usize, separator: &str) -> String {
    let mut text = items.iter().take(shown).cloned().collect::<Vec<_>>().join(separator);
    if items.len() > shown {
        text.push_str("...");
    }
    text
}

/// "apy% | tvl | boost", "-" when the aggregator has no vault
pub fn secondary_cell(metrics: Option<&SecondaryMetrics>) -> String {
    match metrics {
        Some(m) if m.is_matched() => {
            let apy = m.apy.map_or("-".to_string(), |v| format!("{:.2}%", v));
            let tvl = m.tvl.map_or("-".to_string(), format_currency);
            let boost = m.boost.map_or("-".to_string(), |v| format!("{:.2}x", v));
            format!("{} | {} | {}", apy, tvl, boost)
        }
        _ => "-".to_string(),
    }
}

/// One row per record; aggregator columns only when some record carries them
pub fn render_table(records: &[AggregatedRecord]) -> String {
    if records.is_empty() {
        return "No pool data found.".to_string();
    }

    let with_yearn = records.iter().any(|r| r.yearn.is_some());
    let with_stakedao = records.iter().any(|r| r.stakedao.is_some());

    let mut header = vec![
        "Pool Name".to_string(),
        "Chain".to_string(),
        "Coins".to_string(),
        "Coin Ratios".to_string(),
        "TVL".to_string(),
        "Base APY (%)".to_string(),
        "CRV Rewards (%)".to_string(),
        "Other Rewards (%)".to_string(),
    ];
    if with_yearn {
        header.push("Yearn".to_string());
    }
    if with_stakedao {
        header.push("StakeDAO".to_string());
    }

    let mut builder = Builder::default();
    builder.push_record(header);

    for record in records {
        let mut row = vec![
            truncate_name(&record.name),
            record.chain.title(),
            head_list(&record.coins, SHOWN_COINS, COIN_SEPARATOR),
            head_list(&record.coin_ratios, SHOWN_RATIOS, RATIO_SEPARATOR),
            format_currency(record.tvl),
            format!("{:.2}", record.base_apy),
            record.crv_apy.to_string(),
            format_other_rewards(record),
        ];
        if with_yearn {
            row.push(secondary_cell(record.yearn.as_ref()));
        }
        if with_stakedao {
            row.push(secondary_cell(record.stakedao.as_ref()));
        }
        builder.push_record(row);
    }

    let mut table = builder.build();
    table.with(Style::modern());
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{OtherReward, RewardQuote};
    use crate::providers::Chain;

    fn record(name: &str) -> AggregatedRecord {
        AggregatedRecord {
            name: name.to_string(),
            chain: Chain::new("ethereum"),
            address: "0xabc".to_string(),
            asset_type: "usd".to_string(),
            tvl: 1_234_567.0,
            base_apy: 1.5,
            crv_apy: RewardQuote::Range { min: 0.5, max: 1.25 },
            other_rewards: vec![],
            coins: vec!["DAI".into(), "USDC".into(), "USDT".into(), "FRAX".into()],
            coin_ratios: vec!["DAI: 25.0%".into(), "USDC: 25.0%".into(), "USDT: 50.0%".into()],
            yearn: None,
            stakedao: None,
        }
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(2_500_000_000.0), "$2.50B");
        assert_eq!(format_currency(1_234_567.0), "$1.23M");
        assert_eq!(format_currency(9_999.0), "$10.00K");
        assert_eq!(format_currency(12.345), "$12.35");
        assert_eq!(format_currency(0.0), "$0.00");
    }

    #[test]
    fn test_truncate_name() {
        assert_eq!(truncate_name("3pool"), "3pool");
        let long = truncate_name("Curve.fi Factory USD Metapool: Long Name");
        assert_eq!(long.chars().count(), 25);
        assert!(long.ends_with("..."));
    }

    #[test]
    fn test_table_cells() {
        let mut rec = record("3pool");
        rec.other_rewards = vec![OtherReward { token: "Side Chain Rewards".into(), apy: 2.0 }];
        let out = render_table(&[rec]);

        assert!(out.contains("DAI / USDC / USDT..."));
        assert!(out.contains("DAI: 25.0%, USDC: 25.0%..."));
        assert!(out.contains("$1.23M"));
        assert!(out.contains("0.50 - 1.25"));
        assert!(out.contains("Side Chain Rewards: 2.00%"));
        assert!(out.contains("Ethereum"));
        assert!(!out.contains("Yearn"));
    }

    #[test]
    fn test_aggregator_columns() {
        let mut matched = record("a");
        matched.yearn = Some(SecondaryMetrics {
            vault: Some("0xv".into()),
            apy: Some(8.0),
            tvl: Some(2_000.0),
            boost: Some(2.5),
            fees: None,
        });
        let mut unmatched = record("b");
        unmatched.yearn = Some(SecondaryMetrics::default());

        let out = render_table(&[matched, unmatched]);
        assert!(out.contains("Yearn"));
        assert!(out.contains("8.00% | $2.00K | 2.50x"));
        assert!(!out.contains("StakeDAO"));
        assert!(out.contains("None"));
    }

    #[test]
    fn test_empty() {
        assert_eq!(render_table(&[]), "No pool data found.");
    }
}
