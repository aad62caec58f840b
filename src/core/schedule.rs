/// Derives the years (1-based) at which a market shock fires.
///
/// Shocks are spread evenly through the horizon: with `count` requested
/// shocks the spacing is `horizon / (count + 2)` so the first shock lands
/// after an initial calm stretch and the last leaves room for a rebound.
/// When the horizon is too short for the requested count the spacing rounds
/// down to zero; such entries fall outside the simulated range and are
/// dropped, so the schedule only ever contains years in `[1, horizon]`.
pub fn crash_years(horizon_years: u32, count: u32) -> Vec<u32> {
    if count == 0 {
        return Vec::new();
    }

    let interval = horizon_years / (count + 2);
    (1..=count)
        .map(|i| interval * i)
        .filter(|year| (1..=horizon_years).contains(year))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    #[test]
    fn zero_count_yields_empty_schedule() {
        assert!(crash_years(10, 0).is_empty());
    }

    #[test]
    fn single_crash_lands_a_third_of_the_way_in() {
        assert_eq!(crash_years(10, 1), vec![3]);
        assert_eq!(crash_years(25, 1), vec![8]);
    }

    #[test]
    fn multiple_crashes_are_evenly_spaced() {
        assert_eq!(crash_years(20, 3), vec![4, 8, 12]);
        assert_eq!(crash_years(25, 2), vec![6, 12]);
    }

    #[test]
    fn short_horizon_drops_degenerate_year_zero_entries() {
        // horizon 3 with 2 shocks: interval = 3 / 4 = 0, every entry invalid.
        assert!(crash_years(3, 2).is_empty());
        assert!(crash_years(1, 1).is_empty());
    }

    proptest! {
        #[test]
        fn schedule_shape_holds_for_all_inputs(horizon in 1u32..=25, count in 0u32..=12) {
            let schedule = crash_years(horizon, count);

            for window in schedule.windows(2) {
                prop_assert!(window[0] < window[1]);
            }
            for year in &schedule {
                prop_assert!((1..=horizon).contains(year));
            }

            let interval = horizon / (count + 2);
            if count == 0 || interval == 0 {
                prop_assert!(schedule.is_empty());
            } else {
                prop_assert_eq!(schedule.len(), count as usize);
            }
        }
    }
}
