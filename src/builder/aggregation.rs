/*
Copyright 2026 the clmforc developers

This file is part of the CLM Single-Point Forcing Builder (clmforc).

clmforc is a free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation; either version 3 of the License, or
(at your option) any later version.

clmforc is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with clmforc. If not, see https://www.gnu.org/licenses/.
*/

//! Module responsible for calendar partitioning of the requested
//! coverage window and mean resampling onto the output cadence.
//!
//! A partition's window is defined by calendar month boundaries, not
//! by the span of the source data, so a month without a single source
//! row still yields a full-length (all missing) series.

use crate::builder::configuration::TimeRange;
use crate::Float;
use chrono::{DateTime, TimeZone, Utc};
use std::fmt;

/// One (year, month) output window. Each partition becomes exactly
/// one forcing file.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct TimePartition {
    pub year: i32,
    pub month: u32,
}

impl TimePartition {
    /// First instant of the month, inclusive.
    pub fn start(&self) -> DateTime<Utc> {
        month_start(self.year, self.month)
    }

    /// First instant of the following month, exclusive.
    pub fn end(&self) -> DateTime<Utc> {
        if self.month == 12 {
            month_start(self.year + 1, 1)
        } else {
            month_start(self.year, self.month + 1)
        }
    }

    /// Number of output intervals the month holds at the given
    /// cadence. Independent of how many source samples exist.
    pub fn interval_count(&self, cadence: u32) -> usize {
        let window = (self.end() - self.start()).num_seconds();

        // the cadence divides a whole day (checked at config time),
        // so it always divides a whole month
        (window / i64::from(cadence)) as usize
    }
}

impl fmt::Display for TimePartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

fn month_start(year: i32, month: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .expect("first instant of a calendar month is a valid timestamp")
}

/// Derives the chronological partition list from the coverage window.
///
/// The first year starts at the configured start month and the last
/// year ends at the configured end month; all interior years span the
/// full twelve months. Partitions never overlap and have no gaps.
pub fn partitions(range: &TimeRange) -> Vec<TimePartition> {
    let mut list = Vec::new();

    for year in range.start_year..=range.end_year {
        let first = if year == range.start_year {
            range.start_month
        } else {
            1
        };
        let last = if year == range.end_year {
            range.end_month
        } else {
            12
        };

        for month in first..=last {
            list.push(TimePartition { year, month });
        }
    }

    list
}

/// Resamples a converted series onto the partition's regular time
/// axis by arithmetic mean.
///
/// A sample timestamped exactly on an interval boundary belongs to
/// the interval that starts at that boundary. NaN samples do not
/// contribute; an interval without any contributing sample yields NaN
/// (mapped to the file's fill value at write time), never zero and
/// never an interpolated value.
pub fn resample_mean(
    timestamps: &[DateTime<Utc>],
    values: &[Float],
    partition: TimePartition,
    cadence: u32,
) -> Vec<Float> {
    let start = partition.start();
    let end = partition.end();
    let intervals = partition.interval_count(cadence);

    let mut sums = vec![0.0; intervals];
    let mut counts = vec![0_usize; intervals];

    for (timestamp, value) in timestamps.iter().zip(values) {
        if *timestamp < start || *timestamp >= end || value.is_nan() {
            continue;
        }

        let index = ((*timestamp - start).num_seconds() / i64::from(cadence)) as usize;
        sums[index] += *value;
        counts[index] += 1;
    }

    sums.iter()
        .zip(&counts)
        .map(|(sum, count)| {
            if *count == 0 {
                Float::NAN
            } else {
                sum / (*count as Float)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    fn range(
        start_year: i32,
        start_month: u32,
        end_year: i32,
        end_month: u32,
    ) -> TimeRange {
        TimeRange {
            start_year,
            end_year,
            start_month,
            end_month,
            output_cadence: 3600,
        }
    }

    #[test]
    fn partition_list_covers_every_month_once() {
        let list = partitions(&range(2014, 11, 2016, 2));

        assert_eq!(list.len(), 2 + 12 + 2);
        assert_eq!(list.first().unwrap(), &TimePartition { year: 2014, month: 11 });
        assert_eq!(list.last().unwrap(), &TimePartition { year: 2016, month: 2 });

        // chronological, no gaps, no duplicates
        for window in list.windows(2) {
            let next_start = window[0].end();
            assert_eq!(window[1].start(), next_start);
        }
    }

    #[test]
    fn single_year_range_respects_both_month_bounds() {
        let list = partitions(&range(2019, 3, 2019, 5));

        assert_eq!(
            list,
            vec![
                TimePartition { year: 2019, month: 3 },
                TimePartition { year: 2019, month: 4 },
                TimePartition { year: 2019, month: 5 },
            ]
        );
    }

    #[test]
    fn interval_count_matches_the_calendar() {
        let january = TimePartition { year: 2015, month: 1 };
        let february = TimePartition { year: 2016, month: 2 };

        assert_eq!(january.interval_count(3600), 31 * 24);
        assert_eq!(january.interval_count(21_600), 31 * 4);
        // 2016 is a leap year
        assert_eq!(february.interval_count(86_400), 29);
    }

    #[test]
    fn cardinality_is_independent_of_sample_count() {
        let partition = TimePartition { year: 2015, month: 6 };
        let timestamps = vec![Utc.with_ymd_and_hms(2015, 6, 10, 12, 30, 0).unwrap()];
        let values = vec![5.0];

        let series = resample_mean(&timestamps, &values, partition, 3600);

        assert_eq!(series.len(), 30 * 24);
    }

    #[test]
    fn means_all_samples_inside_each_interval() {
        let partition = TimePartition { year: 2015, month: 6 };
        let timestamps = vec![
            Utc.with_ymd_and_hms(2015, 6, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2015, 6, 1, 0, 20, 0).unwrap(),
            Utc.with_ymd_and_hms(2015, 6, 1, 0, 40, 0).unwrap(),
            Utc.with_ymd_and_hms(2015, 6, 1, 1, 0, 0).unwrap(),
        ];
        let values = vec![1.0, 2.0, 6.0, 10.0];

        let series = resample_mean(&timestamps, &values, partition, 3600);

        assert!(approx_eq!(Float, series[0], 3.0));
        assert!(approx_eq!(Float, series[1], 10.0));
    }

    #[test]
    fn boundary_sample_belongs_to_the_starting_interval() {
        // a sample exactly at 2015-06-01T00:00:00Z belongs to June,
        // and the last instant before it belongs to May
        let may = TimePartition { year: 2015, month: 5 };
        let june = TimePartition { year: 2015, month: 6 };
        let timestamps = vec![
            Utc.with_ymd_and_hms(2015, 5, 31, 23, 59, 59).unwrap(),
            Utc.with_ymd_and_hms(2015, 6, 1, 0, 0, 0).unwrap(),
        ];
        let values = vec![100.0, 7.0];

        let june_series = resample_mean(&timestamps, &values, june, 3600);
        assert!(approx_eq!(Float, june_series[0], 7.0));

        let may_series = resample_mean(&timestamps, &values, may, 3600);
        let last = may_series.last().unwrap();
        assert!(approx_eq!(Float, *last, 100.0));
    }

    #[test]
    fn empty_intervals_yield_nan() {
        let partition = TimePartition { year: 2015, month: 6 };

        let series = resample_mean(&[], &[], partition, 21_600);

        assert_eq!(series.len(), 30 * 4);
        assert!(series.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn nan_samples_do_not_contribute_to_the_mean() {
        let partition = TimePartition { year: 2015, month: 6 };
        let timestamps = vec![
            Utc.with_ymd_and_hms(2015, 6, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2015, 6, 1, 0, 30, 0).unwrap(),
            Utc.with_ymd_and_hms(2015, 6, 1, 1, 0, 0).unwrap(),
        ];
        let values = vec![4.0, Float::NAN, Float::NAN];

        let series = resample_mean(&timestamps, &values, partition, 3600);

        assert!(approx_eq!(Float, series[0], 4.0));
        assert!(series[1].is_nan());
    }
}
