use crate::sim::SimTime;

#[test]
fn sim_time_unit_conversions() {
    assert_eq!(SimTime::from_millis(1), SimTime(1_000_000));
    assert_eq!(SimTime::from_secs(1), SimTime(1_000_000_000));
    assert_eq!(SimTime::from_secs(3).as_millis(), 3_000);
    assert_eq!(SimTime(1_999_999).as_millis(), 1);
}

#[test]
fn sim_time_saturates_on_overflow() {
    assert_eq!(SimTime::from_millis(u64::MAX), SimTime(u64::MAX));
    assert_eq!(SimTime::from_secs(u64::MAX), SimTime(u64::MAX));
    assert_eq!(SimTime(u64::MAX).saturating_add(SimTime(1)), SimTime(u64::MAX));
    assert_eq!(SimTime(1).saturating_sub(SimTime(5)), SimTime::ZERO);
}
