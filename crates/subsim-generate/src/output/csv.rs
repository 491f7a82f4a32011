use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use chrono::NaiveDateTime;
use serde_json::Value;

use subsim_core::{Plan, Provider, SubscriptionEvent, SubscriptionSummary, User};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A record that can be written as one CSV row.
pub trait CsvRecord {
    const HEADER: &'static [&'static str];

    fn to_record(&self) -> Vec<String>;
}

/// Write rows as CSV with a header and deterministic column ordering.
///
/// Returns the number of bytes written.
pub fn write_table_csv<R: CsvRecord>(path: &Path, rows: &[R]) -> Result<u64, csv::Error> {
    let file = File::create(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(TallyWriter::new(file));

    writer.write_record(R::HEADER)?;
    for row in rows {
        writer.write_record(row.to_record())?;
    }

    let tally = writer.into_inner().map_err(|err| err.into_error())?;
    Ok(tally.finish()?)
}

impl CsvRecord for Provider {
    const HEADER: &'static [&'static str] = &["provider_id", "name", "api_key", "created_at"];

    fn to_record(&self) -> Vec<String> {
        vec![
            self.provider_id.to_string(),
            self.name.clone(),
            self.api_key.clone(),
            timestamp(&self.created_at),
        ]
    }
}

impl CsvRecord for Plan {
    const HEADER: &'static [&'static str] = &[
        "plan_id",
        "provider_id",
        "name",
        "price",
        "currency",
        "billing_frequency",
        "features",
        "created_at",
    ];

    fn to_record(&self) -> Vec<String> {
        vec![
            self.plan_id.to_string(),
            self.provider_id.to_string(),
            self.name.clone(),
            money(self.price),
            self.currency.to_string(),
            self.billing_frequency.to_string(),
            Value::Object(self.features.clone()).to_string(),
            timestamp(&self.created_at),
        ]
    }
}

impl CsvRecord for User {
    const HEADER: &'static [&'static str] = &[
        "user_id",
        "name",
        "email",
        "phone",
        "city",
        "country",
        "created_at",
    ];

    fn to_record(&self) -> Vec<String> {
        vec![
            self.user_id.to_string(),
            self.name.clone(),
            self.email.clone(),
            self.phone.clone(),
            self.city.clone(),
            self.country.clone(),
            timestamp(&self.created_at),
        ]
    }
}

impl CsvRecord for SubscriptionEvent {
    const HEADER: &'static [&'static str] = &[
        "event_id",
        "subscription_id",
        "plan_id",
        "user_id",
        "event_type",
        "event_timestamp",
        "amount",
        "currency",
    ];

    fn to_record(&self) -> Vec<String> {
        vec![
            self.event_id.to_string(),
            self.subscription_id.to_string(),
            self.plan_id.to_string(),
            self.user_id.to_string(),
            self.event_type.to_string(),
            timestamp(&self.event_timestamp),
            money(self.amount),
            self.currency.to_string(),
        ]
    }
}

impl CsvRecord for SubscriptionSummary {
    const HEADER: &'static [&'static str] = &[
        "subscription_id",
        "plan_id",
        "user_id",
        "provider_id",
        "start_date",
        "end_date",
        "status",
        "renewals_successful",
        "renewals_failed",
        "total_billed",
        "currency",
    ];

    fn to_record(&self) -> Vec<String> {
        vec![
            self.subscription_id.to_string(),
            self.plan_id.to_string(),
            self.user_id.to_string(),
            self.provider_id.to_string(),
            timestamp(&self.start_date),
            self.end_date.as_ref().map(timestamp).unwrap_or_default(),
            self.status.to_string(),
            self.renewals_successful.to_string(),
            self.renewals_failed.to_string(),
            money(self.total_billed),
            self.currency.to_string(),
        ]
    }
}

fn timestamp(value: &NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

fn money(value: f64) -> String {
    format!("{value:.2}")
}

/// Buffered file sink that keeps a running total of bytes accepted.
struct TallyWriter {
    sink: BufWriter<File>,
    total: u64,
}

impl TallyWriter {
    fn new(file: File) -> Self {
        Self {
            sink: BufWriter::new(file),
            total: 0,
        }
    }

    /// Flush to disk and return the total.
    fn finish(mut self) -> io::Result<u64> {
        self.sink.flush()?;
        Ok(self.total)
    }
}

impl Write for TallyWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let accepted = self.sink.write(buf)?;
        self.total += accepted as u64;
        Ok(accepted)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.sink.flush()
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn reported_bytes_match_file_size() {
        let created_at = NaiveDate::from_ymd_opt(2024, 2, 1)
            .and_then(|date| date.and_hms_opt(8, 30, 0))
            .expect("valid date");
        let providers: Vec<Provider> = (1..=3)
            .map(|provider_id| Provider {
                provider_id,
                name: format!("Provider, {provider_id}"),
                api_key: "ab".repeat(32),
                created_at,
            })
            .collect();

        let mut path = std::env::temp_dir();
        path.push(format!("subsim_providers_{}.csv", uuid::Uuid::new_v4()));
        let bytes = write_table_csv(&path, &providers).expect("write csv");
        let content = std::fs::read_to_string(&path).expect("read csv");
        std::fs::remove_file(&path).ok();

        assert_eq!(bytes, content.len() as u64);
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("provider_id,name,api_key,created_at"));
        assert!(lines.next().is_some_and(|line| line.starts_with("1,\"Provider, 1\",")));
        assert!(content.contains("2024-02-01T08:30:00"));
    }
}
