/// Development mode utilities for working with historical data
///
/// When the live telemetry feed is unavailable, use this module to replay
/// archived readings for testing and development.

use postgres::Client;
use chrono::{DateTime, Utc, Duration};
use crate::model::ParameterSnapshot;

/// Configuration for development mode data replay
pub struct DevMode {
    /// Simulate data as if it's this many days in the past
    pub days_offset: i64,
    /// Update interval in seconds (default: 60)
    pub update_interval_secs: i64,
}

impl DevMode {
    /// Create a new dev mode configuration
    ///
    /// # Arguments
    /// * `days_offset` - Replay data from this many days ago
    pub fn new(days_offset: i64) -> Self {
        Self {
            days_offset,
            update_interval_secs: 60,
        }
    }

    /// Fetch historical snapshots as if they were current
    ///
    /// Returns the latest archived snapshot per device from `days_offset`
    /// days ago, with timestamps shifted forward so downstream staleness
    /// checks treat them as live data.
    pub fn fetch_simulated_current_snapshots(
        &self,
        client: &mut Client,
        device_ids: &[String],
    ) -> Result<Vec<ParameterSnapshot>, postgres::Error> {

        let offset = Duration::days(self.days_offset);
        let simulated_now = Utc::now() - offset;
        let window_start = simulated_now - Duration::seconds(self.update_interval_secs * 2);

        let query = "
            SELECT DISTINCT ON (device_id)
                device_id,
                measured_at,
                ph, temperature, tss, cod, bod, hardness,
                flow, dissolved_oxygen, conductivity, turbidity
            FROM telemetry.readings
            WHERE device_id = ANY($1)
              AND measured_at >= $2
              AND measured_at <= $3
            ORDER BY device_id, measured_at DESC
        ";

        let rows = client.query(
            query,
            &[&device_ids, &window_start, &simulated_now],
        )?;

        let mut snapshots = Vec::new();
        for row in rows {
            let device_id: String = row.get(0);
            let measured_at: DateTime<Utc> = row.get(1);
            let mut snapshot = ParameterSnapshot::empty(&device_id, measured_at + offset);
            snapshot.ph = row.get(2);
            snapshot.temperature = row.get(3);
            snapshot.tss = row.get(4);
            snapshot.cod = row.get(5);
            snapshot.bod = row.get(6);
            snapshot.hardness = row.get(7);
            snapshot.flow = row.get(8);
            snapshot.dissolved_oxygen = row.get(9);
            snapshot.conductivity = row.get(10);
            snapshot.turbidity = row.get(11);
            snapshots.push(snapshot);
        }

        Ok(snapshots)
    }

    /// Get available archived data date range for a device
    pub fn get_data_range(
        client: &mut Client,
        device_id: &str,
    ) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, postgres::Error> {

        let row = client.query_one(
            "SELECT MIN(measured_at), MAX(measured_at)
             FROM telemetry.readings
             WHERE device_id = $1",
            &[&device_id],
        )?;

        let min: Option<DateTime<Utc>> = row.get(0);
        let max: Option<DateTime<Utc>> = row.get(1);

        match (min, max) {
            (Some(start), Some(end)) => Ok(Some((start, end))),
            _ => Ok(None),
        }
    }
}
