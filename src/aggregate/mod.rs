//! Aggregation over query results
//!
//! Counts, sums, averages and extrema over a record sequence, optionally
//! partitioned by a grouping field. Also percentage rates and elapsed time
//! between timestamp fields.
//!
//! # Invariants
//!
//! - Group counts sum to the size of the input
//! - Averages only consider records that carry the value
//! - A rate over zero records is "n/a", never a division by zero
//! - Groups are reported in first-seen order unless ranked

mod duration;
mod group;
mod rate;
mod rounding;
mod stats;

pub use duration::{
    minutes_between, newest, parse_timestamp, timestamp, DurationSummary, TimeWindow,
};
pub use group::{group_by, group_pairs, Breakdown, GroupMetric, GroupStats};
pub use rate::Rate;
pub use rounding::{round0, round1, round_int};
pub use stats::{count_by, count_in, count_map, count_where, group_key, NumericSummary, UNKNOWN_GROUP};
