//! Reservation time-slot availability for one facility and day.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use super::types::{Facility, Reservation};

/// One bookable slot of a facility's day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSlot {
  pub starts_at: NaiveTime,
  pub ends_at: NaiveTime,
  /// Bookings still possible in this slot
  pub remaining: u32,
  /// False when the slot is full or has already started
  pub available: bool,
}

/// Split the facility's opening window into slots and subtract the day's
/// reservations.
///
/// Slots are half-open `[start, end)`; a reservation consumes capacity in
/// every slot it overlaps. A trailing remainder shorter than a slot is not
/// offered. `now` is local club time.
pub fn compute_slots(
  facility: &Facility,
  date: NaiveDate,
  reservations: &[Reservation],
  now: NaiveDateTime,
) -> Vec<TimeSlot> {
  if facility.slot_minutes == 0 || facility.closes_at <= facility.opens_at {
    return Vec::new();
  }
  let step = Duration::minutes(i64::from(facility.slot_minutes));

  let booked: Vec<(NaiveTime, NaiveTime)> = reservations
    .iter()
    .filter(|r| r.is_active() && r.date == date && r.facility_id == facility.id)
    .map(|r| (r.starts_at, r.ends_at))
    .collect();

  let mut slots = Vec::new();
  let mut start = facility.opens_at;
  loop {
    // NaiveTime arithmetic wraps at midnight; check the window before adding.
    if facility.closes_at.signed_duration_since(start) < step {
      break;
    }
    let end = start + step;

    let taken = booked
      .iter()
      .filter(|(b_start, b_end)| *b_start < end && start < *b_end)
      .count() as u32;
    let remaining = facility.capacity.saturating_sub(taken);
    let in_past = date.and_time(start) < now;

    slots.push(TimeSlot {
      starts_at: start,
      ends_at: end,
      remaining,
      available: remaining > 0 && !in_past,
    });
    start = end;
  }
  slots
}

#[cfg(test)]
mod tests {
  use super::*;

  fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
  }

  fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
  }

  fn facility(capacity: u32) -> Facility {
    Facility {
      id: "court-1".to_string(),
      name: "Cancha 1".to_string(),
      opens_at: t(8, 0),
      closes_at: t(12, 0),
      slot_minutes: 60,
      capacity,
    }
  }

  fn booking(id: &str, from: NaiveTime, to: NaiveTime) -> Reservation {
    Reservation {
      id: id.to_string(),
      facility_id: "court-1".to_string(),
      date: day(),
      starts_at: from,
      ends_at: to,
      status: None,
    }
  }

  fn early_morning() -> NaiveDateTime {
    day().and_time(t(6, 0))
  }

  #[test]
  fn test_empty_day_all_available() {
    let slots = compute_slots(&facility(1), day(), &[], early_morning());
    assert_eq!(slots.len(), 4);
    assert_eq!(slots[0].starts_at, t(8, 0));
    assert_eq!(slots[3].ends_at, t(12, 0));
    assert!(slots.iter().all(|s| s.available && s.remaining == 1));
  }

  #[test]
  fn test_reservation_fills_overlapping_slots() {
    let reservations = vec![booking("r1", t(9, 30), t(10, 30))];
    let slots = compute_slots(&facility(1), day(), &reservations, early_morning());

    let available: Vec<bool> = slots.iter().map(|s| s.available).collect();
    assert_eq!(available, vec![true, false, false, true]);
  }

  #[test]
  fn test_adjacent_reservation_does_not_overlap() {
    let reservations = vec![booking("r1", t(8, 0), t(9, 0))];
    let slots = compute_slots(&facility(1), day(), &reservations, early_morning());
    assert!(!slots[0].available);
    assert!(slots[1].available);
  }

  #[test]
  fn test_capacity_and_cancellations() {
    let mut cancelled = booking("r3", t(8, 0), t(9, 0));
    cancelled.status = Some("CANCELLED".to_string());
    let reservations = vec![
      booking("r1", t(8, 0), t(9, 0)),
      booking("r2", t(8, 0), t(9, 0)),
      cancelled,
    ];

    let slots = compute_slots(&facility(3), day(), &reservations, early_morning());
    assert_eq!(slots[0].remaining, 1);
    assert!(slots[0].available);

    let slots = compute_slots(&facility(2), day(), &reservations, early_morning());
    assert_eq!(slots[0].remaining, 0);
    assert!(!slots[0].available);
  }

  #[test]
  fn test_past_slots_unavailable() {
    let now = day().and_time(t(9, 15));
    let slots = compute_slots(&facility(1), day(), &[], now);
    let available: Vec<bool> = slots.iter().map(|s| s.available).collect();
    assert_eq!(available, vec![false, false, true, true]);
  }

  #[test]
  fn test_degenerate_configuration() {
    let mut f = facility(1);
    f.slot_minutes = 0;
    assert!(compute_slots(&f, day(), &[], early_morning()).is_empty());

    let mut f = facility(1);
    f.slot_minutes = 300;
    assert!(compute_slots(&f, day(), &[], early_morning()).is_empty());

    let mut f = facility(1);
    f.slot_minutes = 90;
    // 08:00-09:30, 09:30-11:00; the 60 minute remainder is not offered
    assert_eq!(compute_slots(&f, day(), &[], early_morning()).len(), 2);
  }

  #[test]
  fn test_other_days_and_facilities_ignored() {
    let mut other_day = booking("r1", t(8, 0), t(9, 0));
    other_day.date = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
    let mut other_court = booking("r2", t(8, 0), t(9, 0));
    other_court.facility_id = "court-2".to_string();

    let slots = compute_slots(&facility(1), day(), &[other_day, other_court], early_morning());
    assert!(slots[0].available);
  }
}
