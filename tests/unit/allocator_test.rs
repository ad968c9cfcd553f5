#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use crate::calendar::{weekday_of, MonthKey};
    use crate::planner::allocator::{goal_hours, shuffle, Candidate, RandomSource, SlotAllocator};
    use crate::planner::{generate_draft, plan_capacity, CapacityPlan, DistributionConfig, Draft};
    use crate::subjects::{weight_of, ImportanceTier, Subject};

    /// Always returns the same sample.
    struct Fixed(f64);

    impl RandomSource for Fixed {
        fn next_f64(&mut self) -> f64 {
            self.0
        }
    }

    fn september() -> MonthKey {
        MonthKey::new(2025, 9).unwrap()
    }

    fn weekdays(budget: u32) -> DistributionConfig {
        DistributionConfig::new(budget, 1..=5)
    }

    fn allocate(config: &DistributionConfig, candidates: &[Candidate], seed: u64) -> Draft {
        let plan = plan_capacity(september(), config);
        let mut rng = StdRng::seed_from_u64(seed);
        SlotAllocator::new(&plan, config).allocate(candidates, &mut rng)
    }

    /// Occurrences of each subject per date.
    fn occurrences(draft: &Draft) -> Vec<(NaiveDate, BTreeMap<String, usize>)> {
        draft
            .per_day
            .iter()
            .map(|(date, ids)| {
                let mut counts = BTreeMap::new();
                for id in ids {
                    *counts.entry(id.clone()).or_insert(0) += 1;
                }
                (*date, counts)
            })
            .collect()
    }

    #[test]
    fn test_importance_weights() {
        assert_eq!(weight_of(ImportanceTier::Low), 1);
        assert_eq!(weight_of(ImportanceTier::Medium), 2);
        assert_eq!(weight_of(ImportanceTier::High), 3);
        assert_eq!(ImportanceTier::default(), ImportanceTier::Medium);
    }

    #[test]
    fn test_capacity_counts_active_weekdays() {
        let plan = plan_capacity(september(), &weekdays(4));
        assert_eq!(plan.available_days.len(), 22);
        assert_eq!(plan.total_capacity, 88);
        assert!(plan.available_days.iter().all(|d| (1..=5).contains(&weekday_of(*d))));
    }

    #[test]
    fn test_capacity_with_no_weekdays_is_empty() {
        let plan = plan_capacity(september(), &DistributionConfig::new(4, []));
        assert!(plan.is_empty());
        assert_eq!(plan.total_capacity, 0);
    }

    #[test]
    fn test_capacity_clamps_zero_budget() {
        let plan = plan_capacity(september(), &weekdays(0));
        assert_eq!(plan.daily_hours_budget, 1);
        assert_eq!(plan.total_capacity, 22);
    }

    #[test]
    fn test_capacity_ignores_out_of_range_weekdays() {
        let plan = plan_capacity(september(), &DistributionConfig::new(2, [0, 7, 9]));
        // Only Sundays: 7, 14, 21, 28
        assert_eq!(plan.available_days.len(), 4);
        assert_eq!(plan.total_capacity, 8);
    }

    #[test]
    fn test_goal_hours_round_half_up() {
        let candidates = vec![
            Candidate::new("a", 3),
            Candidate::new("b", 2),
            Candidate::new("c", 2),
            Candidate::new("d", 1),
        ];
        // 26 hours over weight 8: 9.75, 6.5, 6.5, 3.25
        let goals = goal_hours(26, &candidates);
        assert_eq!(goals["a"], 10);
        assert_eq!(goals["b"], 7);
        assert_eq!(goals["c"], 7);
        assert_eq!(goals["d"], 3);
    }

    #[test]
    fn test_goal_hours_zero_weight() {
        let goals = goal_hours(40, &[Candidate::new("a", 0), Candidate::new("b", 0)]);
        assert_eq!(goals["a"], 0);
        assert_eq!(goals["b"], 0);
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let mut items: Vec<u32> = (0..50).collect();
        shuffle(&mut items, &mut StdRng::seed_from_u64(7));
        let mut sorted = items.clone();
        sorted.sort();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());

        // Extreme samples must stay in bounds
        let mut items: Vec<u32> = (0..10).collect();
        shuffle(&mut items, &mut Fixed(0.999_999));
        shuffle(&mut items, &mut Fixed(0.0));
        assert_eq!(items.len(), 10);
    }

    #[test]
    fn test_same_seed_same_draft() {
        let config = weekdays(3);
        let candidates = vec![Candidate::new("anatomy", 3), Candidate::new("physio", 2), Candidate::new("ethics", 1)];
        assert_eq!(allocate(&config, &candidates, 42), allocate(&config, &candidates, 42));
    }

    #[test]
    fn test_worked_scenario_high_vs_low() {
        let config = weekdays(4);
        let candidates = vec![
            Candidate::new("A", weight_of(ImportanceTier::High)),
            Candidate::new("B", weight_of(ImportanceTier::Low)),
        ];
        for seed in 0..5 {
            let draft = allocate(&config, &candidates, seed);
            assert_eq!(draft.goal_hours["A"], 66);
            assert_eq!(draft.goal_hours["B"], 22);
            assert!(draft.forced_overflow);
            assert_eq!(draft.overflow_tokens, 44);
            assert_eq!(draft.per_day.len(), 22);
            for (date, ids) in &draft.per_day {
                assert_eq!(ids.len(), 4, "load on {}", date);
                assert_eq!(ids.iter().filter(|id| *id == "A").count(), 3);
                assert_eq!(ids.iter().filter(|id| *id == "B").count(), 1);
            }
            assert_eq!(draft.planned_days["A"].len(), 22);
            assert_eq!(draft.planned_days["B"].len(), 22);
        }
    }

    #[test]
    fn test_exact_fit_fills_every_day_without_repeats() {
        // Two equal subjects, 22 days x 2 hours: 22 slots each
        let config = weekdays(2);
        let candidates = vec![Candidate::new("a", 2), Candidate::new("b", 2)];
        for seed in 0..10 {
            let draft = allocate(&config, &candidates, seed);
            assert!(!draft.forced_overflow);
            for ids in draft.per_day.values() {
                assert_eq!(ids, &vec!["a".to_string(), "b".to_string()]);
            }
        }
    }

    #[test]
    fn test_conservation_and_proportionality() {
        let configs = [weekdays(4), weekdays(2), DistributionConfig::new(3, [1, 3, 5]), DistributionConfig::new(1, 0..=6)];
        let candidates = vec![
            Candidate::new("a", 3),
            Candidate::new("b", 2),
            Candidate::new("c", 2),
            Candidate::new("d", 1),
        ];
        for config in &configs {
            let plan = plan_capacity(september(), config);
            let draft = allocate(config, &candidates, 3);

            let total: i64 = draft.goal_hours.values().map(|h| *h as i64).sum();
            let diff = (total - plan.total_capacity as i64).abs();
            assert!(diff <= candidates.len() as i64, "total {} vs capacity {}", total, plan.total_capacity);

            for x in &candidates {
                for y in &candidates {
                    let gx = draft.goal_hours[&x.id] as f64;
                    let gy = draft.goal_hours[&y.id] as f64;
                    let ideal = gy * x.weight as f64 / y.weight as f64;
                    // One rounding unit on each side, scaled by the weight ratio
                    let slack = 1.0 + x.weight as f64 / y.weight as f64;
                    assert!((gx - ideal).abs() <= slack, "{}={} {}={}", x.id, gx, y.id, gy);
                }
            }
        }
    }

    #[test]
    fn test_repeats_only_for_subjects_with_more_slots_than_days() {
        let configs = [weekdays(4), weekdays(2), DistributionConfig::new(2, [1, 3, 5])];
        let candidates = vec![
            Candidate::new("a", 3),
            Candidate::new("b", 2),
            Candidate::new("c", 2),
            Candidate::new("d", 1),
        ];
        for config in &configs {
            let days = plan_capacity(september(), config).available_days.len() as u32;
            for seed in 0..20 {
                let draft = allocate(config, &candidates, seed);
                for (date, counts) in occurrences(&draft) {
                    for (id, count) in counts {
                        if count > 1 {
                            assert!(
                                draft.goal_hours[&id] > days,
                                "{} repeated on {} with only {} slots",
                                id, date, draft.goal_hours[&id]
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_days_stay_within_budget_plus_one() {
        let config = DistributionConfig::new(2, [1, 3, 5]);
        let candidates = vec![
            Candidate::new("a", 3),
            Candidate::new("b", 2),
            Candidate::new("c", 2),
            Candidate::new("d", 1),
        ];
        for seed in 0..20 {
            let draft = allocate(&config, &candidates, seed);
            // 26 hours of capacity, 27 slots after rounding
            assert_eq!(draft.total_goal_hours(), 27);
            assert!(draft.forced_overflow);
            for ids in draft.per_day.values() {
                assert!(ids.len() <= 3);
            }
        }
    }

    /// Plan over the first `days` days of September with the given budget.
    fn short_plan(days: u32, budget: u32) -> (CapacityPlan, DistributionConfig) {
        let available_days: Vec<NaiveDate> = (1..=days)
            .map(|d| NaiveDate::from_ymd_opt(2025, 9, d).unwrap())
            .collect();
        let plan = CapacityPlan {
            month_key: september(),
            available_days,
            daily_hours_budget: budget,
            total_capacity: days * budget,
        };
        (plan, DistributionConfig::new(budget, 0..=6))
    }

    fn weighted(weights: &[u32]) -> Vec<Candidate> {
        weights
            .iter()
            .enumerate()
            .map(|(i, w)| Candidate::new(format!("s{}", i), *w))
            .collect()
    }

    #[test]
    fn test_overflow_avoids_repeats_in_short_month() {
        // 6 slots over 2 days of budget 2: s0 owns 2 slots, so one per day
        let (plan, config) = short_plan(2, 2);
        let candidates = weighted(&[3, 1, 1, 1, 1]);
        for seed in 0..200 {
            let draft = SlotAllocator::new(&plan, &config)
                .allocate(&candidates, &mut StdRng::seed_from_u64(seed));
            assert_eq!(draft.goal_hours["s0"], 2);
            assert_eq!(draft.total_goal_hours(), 6);
            assert!(draft.forced_overflow);
            for (date, counts) in occurrences(&draft) {
                assert!(counts.values().all(|c| *c == 1), "seed {} repeat on {}: {:?}", seed, date, counts);
                assert!(counts.values().sum::<usize>() <= 3);
            }
            assert_eq!(draft.planned_days["s0"].len(), 2);
        }
    }

    #[test]
    fn test_overflow_never_repeats_when_a_repeat_free_layout_fits() {
        let weight_sets: [&[u32]; 6] = [
            &[3, 1, 1, 1, 1],
            &[3, 3, 1, 1],
            &[2, 2, 2, 1, 1, 1],
            &[3, 2, 1],
            &[1, 1, 1, 1, 1, 1],
            &[3, 3, 3, 2, 2, 1],
        ];
        for days in 1..=6 {
            for budget in 1..=4 {
                let (plan, config) = short_plan(days, budget);
                for weights in weight_sets {
                    let candidates = weighted(weights);
                    let goals = goal_hours(plan.total_capacity, &candidates);
                    let fits = goals.values().all(|g| *g <= days)
                        && goals.values().sum::<u32>() <= days * (budget + 1);
                    if !fits {
                        continue;
                    }
                    for seed in 0..10 {
                        let draft = SlotAllocator::new(&plan, &config)
                            .allocate(&candidates, &mut StdRng::seed_from_u64(seed));
                        for (date, counts) in occurrences(&draft) {
                            assert!(
                                counts.values().all(|c| *c == 1),
                                "days={} budget={} weights={:?} seed={} date={} {:?}",
                                days, budget, weights, seed, date, counts
                            );
                            assert!(counts.values().sum::<usize>() as u32 <= budget + 1);
                        }
                        for (id, goal) in &draft.goal_hours {
                            assert_eq!(draft.planned_days[id].len() as u32, *goal);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_dates_stay_on_active_weekdays_in_month() {
        let config = DistributionConfig::new(3, [2, 4]);
        let candidates = vec![Candidate::new("a", 1), Candidate::new("b", 3)];
        let draft = allocate(&config, &candidates, 11);
        for date in draft.per_day.keys().chain(draft.planned_days.values().flatten()) {
            assert!(september().contains(*date));
            assert!([2, 4].contains(&weekday_of(*date)));
        }
    }

    #[test]
    fn test_no_weekdays_yields_empty_draft() {
        let config = DistributionConfig::new(4, []);
        let candidates = vec![Candidate::new("a", 3), Candidate::new("b", 1)];
        let draft = allocate(&config, &candidates, 0);
        assert!(draft.per_day.is_empty());
        assert_eq!(draft.goal_hours["a"], 0);
        assert_eq!(draft.goal_hours["b"], 0);
        assert!(draft.planned_days.values().all(|d| d.is_empty()));
        assert!(!draft.forced_overflow);
    }

    #[test]
    fn test_no_candidates_yields_empty_days() {
        let draft = allocate(&weekdays(4), &[], 0);
        assert_eq!(draft.per_day.len(), 22);
        assert!(draft.per_day.values().all(|ids| ids.is_empty()));
        assert!(draft.goal_hours.is_empty());
    }

    #[test]
    fn test_duplicate_candidates_are_ignored() {
        let candidates = vec![Candidate::new("a", 1), Candidate::new("a", 3), Candidate::new("b", 1)];
        let draft = allocate(&weekdays(2), &candidates, 5);
        assert_eq!(draft.goal_hours.len(), 2);
        assert_eq!(draft.goal_hours["a"], 22);
        assert_eq!(draft.goal_hours["b"], 22);
    }

    #[test]
    fn test_generate_draft_uses_subject_importance() {
        let subjects = vec![
            Subject::new("pharma", "Pharmacology", ImportanceTier::High),
            Subject::new("stats", "Biostatistics", ImportanceTier::Low),
        ];
        let draft = generate_draft(september(), &weekdays(4), &subjects, &mut StdRng::seed_from_u64(1));
        assert_eq!(draft.goal_hours["pharma"], 66);
        assert_eq!(draft.goal_hours["stats"], 22);
        assert_eq!(draft.month_key, september());
        assert_eq!(draft.config, weekdays(4));
    }
}
