//! Historical flow quantiles by day of year.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row from the historical-quantiles endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantileRecord {
    /// 1-based day of year.
    pub doy: u32,
    #[serde(default)]
    pub q0: Option<f64>,
    #[serde(default)]
    pub q10: Option<f64>,
    #[serde(default)]
    pub q25: Option<f64>,
    #[serde(default)]
    pub q75: Option<f64>,
    #[serde(default)]
    pub q90: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantile {
    Q0,
    Q10,
    Q25,
    Q75,
    Q90,
}

impl Quantile {
    pub const ALL: [Quantile; 5] = [
        Quantile::Q0,
        Quantile::Q10,
        Quantile::Q25,
        Quantile::Q75,
        Quantile::Q90,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Quantile::Q0 => "q0",
            Quantile::Q10 => "q10",
            Quantile::Q25 => "q25",
            Quantile::Q75 => "q75",
            Quantile::Q90 => "q90",
        }
    }

    fn pick(self, record: &QuantileRecord) -> Option<f64> {
        match self {
            Quantile::Q0 => record.q0,
            Quantile::Q10 => record.q10,
            Quantile::Q25 => record.q25,
            Quantile::Q75 => record.q75,
            Quantile::Q90 => record.q90,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantilePoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Date-indexed quantile series anchored to a calendar year.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QuantileSeries {
    pub year: i32,
    pub q0: Vec<QuantilePoint>,
    pub q10: Vec<QuantilePoint>,
    pub q25: Vec<QuantilePoint>,
    pub q75: Vec<QuantilePoint>,
    pub q90: Vec<QuantilePoint>,
}

impl QuantileSeries {
    /// Place day-of-year records on the calendar of `year`.
    ///
    /// Days that do not exist in `year` (366 outside leap years, 0) are
    /// dropped, as are null quantile values. Output is sorted by date.
    pub fn from_records(records: &[QuantileRecord], year: i32) -> Self {
        let mut dated: Vec<(NaiveDate, &QuantileRecord)> = records
            .iter()
            .filter_map(|r| NaiveDate::from_yo_opt(year, r.doy).map(|d| (d, r)))
            .collect();
        dated.sort_by_key(|(date, _)| *date);

        let mut series = QuantileSeries {
            year,
            ..Default::default()
        };
        for quantile in Quantile::ALL {
            let points = dated
                .iter()
                .filter_map(|(date, record)| {
                    quantile.pick(record).map(|value| QuantilePoint { date: *date, value })
                })
                .collect();
            *series.series_mut(quantile) = points;
        }
        series
    }

    pub fn series(&self, quantile: Quantile) -> &[QuantilePoint] {
        match quantile {
            Quantile::Q0 => &self.q0,
            Quantile::Q10 => &self.q10,
            Quantile::Q25 => &self.q25,
            Quantile::Q75 => &self.q75,
            Quantile::Q90 => &self.q90,
        }
    }

    fn series_mut(&mut self, quantile: Quantile) -> &mut Vec<QuantilePoint> {
        match quantile {
            Quantile::Q0 => &mut self.q0,
            Quantile::Q10 => &mut self.q10,
            Quantile::Q25 => &mut self.q25,
            Quantile::Q75 => &mut self.q75,
            Quantile::Q90 => &mut self.q90,
        }
    }

    /// True when no quantile has any point.
    pub fn is_empty(&self) -> bool {
        Quantile::ALL.iter().all(|q| self.series(*q).is_empty())
    }
}
