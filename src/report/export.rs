//! CSV export
//!
//! One sheet per (chain, asset class): `{chain}_{asset_class}.csv`.
//! Append mode adds rows and writes the header only into new/empty
//! files; Replace truncates every touched sheet once per export.

use chrono::{DateTime, SecondsFormat, Utc};
use csv::WriterBuilder;
use eyre::{Result, WrapErr};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::format_other_rewards;
use crate::config::ExportMode;
use crate::metrics::SecondaryMetrics;
use crate::pipeline::AggregatedRecord;

const HEADERS: &[&str] = &[
    "timestamp",
    "name",
    "chain",
    "address",
    "asset_type",
    "tvl_usd",
    "base_apy",
    "crv_apy_min",
    "crv_apy_max",
    "other_rewards",
    "coins",
    "coin_ratios",
    "yearn_vault",
    "yearn_apy",
    "yearn_tvl",
    "yearn_boost",
    "yearn_fees",
    "stakedao_vault",
    "stakedao_apy",
    "stakedao_tvl",
    "stakedao_boost",
    "stakedao_fees",
];

/// One CSV line; column order matches `HEADERS`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub timestamp: String,
    pub name: String,
    pub chain: String,
    pub address: String,
    pub asset_type: String,
    pub tvl_usd: f64,
    pub base_apy: f64,
    pub crv_apy_min: f64,
    pub crv_apy_max: f64,
    pub other_rewards: String,
    pub coins: String,
    pub coin_ratios: String,
    pub yearn_vault: Option<String>,
    pub yearn_apy: Option<f64>,
    pub yearn_tvl: Option<f64>,
    pub yearn_boost: Option<f64>,
    pub yearn_fees: Option<String>,
    pub stakedao_vault: Option<String>,
    pub stakedao_apy: Option<f64>,
    pub stakedao_tvl: Option<f64>,
    pub stakedao_boost: Option<f64>,
    pub stakedao_fees: Option<String>,
}

impl ExportRow {
    pub fn from_record(record: &AggregatedRecord, at: DateTime<Utc>) -> Self {
        let (crv_min, crv_max) = record.crv_apy.bounds();
        let yearn = record.yearn.clone().unwrap_or_default();
        let stakedao = record.stakedao.clone().unwrap_or_default();
        let SecondaryMetrics {
            vault: yearn_vault,
            apy: yearn_apy,
            tvl: yearn_tvl,
            boost: yearn_boost,
            fees: yearn_fees,
        } = yearn;
        let SecondaryMetrics {
            vault: stakedao_vault,
            apy: stakedao_apy,
            tvl: stakedao_tvl,
            boost: stakedao_boost,
            fees: stakedao_fees,
        } = stakedao;

        Self {
            timestamp: at.to_rfc3339_opts(SecondsFormat::Secs, true),
            name: record.name.clone(),
            chain: record.chain.to_string(),
            address: record.address.clone(),
            asset_type: record.asset_type.clone(),
            tvl_usd: record.tvl,
            base_apy: record.base_apy,
            crv_apy_min: crv_min,
            crv_apy_max: crv_max,
            other_rewards: format_other_rewards(record),
            coins: record.coins.join(", "),
            coin_ratios: record.coin_ratios.join(", "),
            yearn_vault,
            yearn_apy,
            yearn_tvl,
            yearn_boost,
            yearn_fees,
            stakedao_vault,
            stakedao_apy,
            stakedao_tvl,
            stakedao_boost,
            stakedao_fees,
        }
    }
}

/// `{chain}_{asset_class}.csv`, path-safe
pub fn partition_file_name(record: &AggregatedRecord) -> String {
    let clean = |s: &str| -> String {
        s.chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c.to_ascii_lowercase() } else { '_' })
            .collect()
    };
    format!("{}_{}.csv", clean(record.chain.as_str()), clean(&record.asset_type))
}

pub struct CsvExporter {
    dir: PathBuf,
    mode: ExportMode,
}

impl CsvExporter {
    pub fn new(dir: impl Into<PathBuf>, mode: ExportMode) -> Self {
        Self {
            dir: dir.into(),
            mode,
        }
    }

    /// Write `records` stamped now; returns the sheets touched
    pub fn export(&self, records: &[AggregatedRecord]) -> Result<Vec<PathBuf>> {
        self.export_at(records, Utc::now())
    }

    pub fn export_at(&self, records: &[AggregatedRecord], at: DateTime<Utc>) -> Result<Vec<PathBuf>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        fs::create_dir_all(&self.dir)
            .wrap_err_with(|| format!("Failed to create export dir {}", self.dir.display()))?;

        let mut partitions: BTreeMap<String, Vec<&AggregatedRecord>> = BTreeMap::new();
        for record in records {
            partitions.entry(partition_file_name(record)).or_default().push(record);
        }

        let mut written = Vec::with_capacity(partitions.len());
        for (file_name, rows) in partitions {
            let path = self.dir.join(file_name);
            self.write_sheet(&path, &rows, at)?;
            debug!("Exported {} rows to {}", rows.len(), path.display());
            written.push(path);
        }

        info!("Exported {} records to {} sheet(s) ({} mode)", records.len(), written.len(), self.mode);
        Ok(written)
    }

    fn write_sheet(&self, path: &Path, rows: &[&AggregatedRecord], at: DateTime<Utc>) -> Result<()> {
        let append = self.mode == ExportMode::Append;
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)
            .wrap_err_with(|| format!("Failed to open {}", path.display()))?;

        let need_header = !append || file.metadata().map(|m| m.len() == 0).unwrap_or(true);

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        if need_header {
            writer.write_record(HEADERS)?;
        }
        for record in rows {
            writer
                .serialize(ExportRow::from_record(record, at))
                .wrap_err_with(|| format!("Failed to write row for {}", record.name))?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::RewardQuote;
    use crate::providers::Chain;

    fn record(name: &str, chain: &str, asset_type: &str) -> AggregatedRecord {
        AggregatedRecord {
            name: name.to_string(),
            chain: Chain::new(chain),
            address: format!("0x{}", name),
            asset_type: asset_type.to_string(),
            tvl: 1000.0,
            base_apy: 1.0,
            crv_apy: RewardQuote::Range { min: 0.5, max: 1.5 },
            other_rewards: vec![],
            coins: vec!["DAI".into(), "USDC".into()],
            coin_ratios: vec!["DAI: 50.0%".into(), "USDC: 50.0%".into()],
            yearn: None,
            stakedao: None,
        }
    }

    fn lines(path: &Path) -> Vec<String> {
        fs::read_to_string(path).unwrap().lines().map(str::to_string).collect()
    }

    #[test]
    fn test_partitions_by_chain_and_asset_class() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path(), ExportMode::Append);
        let records = vec![
            record("a", "ethereum", "usd"),
            record("b", "arbitrum", "usd"),
            record("c", "ethereum", "usd"),
            record("d", "ethereum", "eth"),
        ];

        let written = exporter.export(&records).unwrap();
        let names: Vec<_> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["arbitrum_usd.csv", "ethereum_eth.csv", "ethereum_usd.csv"]);

        let eth_usd = lines(&dir.path().join("ethereum_usd.csv"));
        assert_eq!(eth_usd.len(), 3);
        assert!(eth_usd[0].starts_with("timestamp,name,chain"));
    }

    #[test]
    fn test_append_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path(), ExportMode::Append);
        let records = vec![record("a", "ethereum", "usd")];

        exporter.export(&records).unwrap();
        exporter.export(&records).unwrap();

        let rows = lines(&dir.path().join("ethereum_usd.csv"));
        assert_eq!(rows.len(), 3);
        assert_eq!(rows.iter().filter(|l| l.starts_with("timestamp")).count(), 1);
    }

    #[test]
    fn test_replace_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![record("a", "ethereum", "usd"), record("b", "ethereum", "usd")];

        CsvExporter::new(dir.path(), ExportMode::Append).export(&records).unwrap();
        CsvExporter::new(dir.path(), ExportMode::Replace)
            .export(&records[..1])
            .unwrap();

        let rows = lines(&dir.path().join("ethereum_usd.csv"));
        assert_eq!(rows.len(), 2);
        assert!(rows[1].contains(",a,"));
    }

    #[test]
    fn test_row_fields() {
        let at = DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z").unwrap().with_timezone(&Utc);
        let mut rec = record("a", "ethereum", "usd");
        rec.yearn = Some(SecondaryMetrics {
            vault: Some("0xv".into()),
            apy: Some(8.0),
            ..SecondaryMetrics::default()
        });

        let row = ExportRow::from_record(&rec, at);
        assert_eq!(row.timestamp, "2026-01-02T03:04:05Z");
        assert_eq!(row.crv_apy_min, 0.5);
        assert_eq!(row.crv_apy_max, 1.5);
        assert_eq!(row.other_rewards, "None");
        assert_eq!(row.yearn_apy, Some(8.0));
        assert_eq!(row.stakedao_vault, None);
    }

    #[test]
    fn test_nothing_to_export() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out");
        assert!(CsvExporter::new(&target, ExportMode::Replace).export(&[]).unwrap().is_empty());
        assert!(!target.exists());
    }

    #[test]
    fn test_file_name_is_path_safe() {
        let rec = record("a", "ethereum", "usd/eth lp");
        assert_eq!(partition_file_name(&rec), "ethereum_usd_eth_lp.csv");
    }
}
