use chrono::{
  DateTime,
  Datelike,
  Duration,
  NaiveDate,
  Utc
};

const MILLIS_PER_DAY: i64 =
  86_400_000;

/// Short month labels, index 0 is
/// January.
pub const MONTH_NAMES: [&str; 12] = [
  "Jan", "Feb", "Mar", "Apr", "May",
  "Jun", "Jul", "Aug", "Sep", "Oct",
  "Nov", "Dec"
];

#[must_use]
pub fn month_name(
  month_index: u32
) -> Option<&'static str> {
  MONTH_NAMES
    .get(month_index as usize)
    .copied()
}

/// Day count of a zero-based month,
/// taken as "day 0 of the following
/// month". Indexes past 11 roll into
/// the following years.
#[must_use]
pub fn days_in_month(
  year: i32,
  month_index: u32
) -> u32 {
  let (next_year, next_month) =
    normalize_month(
      year,
      i64::from(month_index) + 1
    );
  add_days(
    first_day_of_month(
      next_year, next_month
    ),
    -1
  )
  .day()
}

/// Inclusive range test: ranges that
/// share a boundary instant overlap.
#[must_use]
pub fn ranges_overlap<T: PartialOrd>(
  start_a: T,
  end_a: T,
  start_b: T,
  end_b: T
) -> bool {
  !(end_a < start_b || start_a > end_b)
}

/// `ceil((end - start) / 1 day)`.
#[must_use]
pub fn duration_in_days(
  start: DateTime<Utc>,
  end: DateTime<Utc>
) -> i64 {
  let millis =
    (end - start).num_milliseconds();
  let whole =
    millis.div_euclid(MILLIS_PER_DAY);
  if millis.rem_euclid(MILLIS_PER_DAY)
    > 0
  {
    whole + 1
  } else {
    whole
  }
}

#[must_use]
pub fn first_day_of_month(
  year: i32,
  month: u32
) -> NaiveDate {
  NaiveDate::from_ymd_opt(
    year, month, 1
  )
  .unwrap_or(NaiveDate::MIN)
}

#[must_use]
pub fn first_day_of_month_index(
  year: i32,
  month_index: u32
) -> NaiveDate {
  let (year, month) = normalize_month(
    year,
    i64::from(month_index)
  );
  first_day_of_month(year, month)
}

fn add_days(
  date: NaiveDate,
  days: i64
) -> NaiveDate {
  date
    .checked_add_signed(Duration::days(
      days
    ))
    .unwrap_or(date)
}

/// Folds a zero-based month offset into
/// `(year, 1-based month)`.
fn normalize_month(
  year: i32,
  month_index: i64
) -> (i32, u32) {
  let carried = i64::from(year)
    + month_index.div_euclid(12);
  let year = i32::try_from(carried)
    .unwrap_or(year);
  let month =
    month_index.rem_euclid(12) as u32
      + 1;
  (year, month)
}
