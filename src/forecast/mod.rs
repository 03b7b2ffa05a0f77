pub mod cache;
pub mod openweather;
pub mod types;

/// Installation crews work 7am to 6pm local time; forecast slots outside
/// this window are never cached or returned.
pub const WORK_DAY_START_HOUR: u32 = 7;
pub const WORK_DAY_END_HOUR: u32 = 18;

pub fn within_work_hours(hour: u32) -> bool {
    (WORK_DAY_START_HOUR..=WORK_DAY_END_HOUR).contains(&hour)
}
