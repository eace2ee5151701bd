//! Replay-phase behavior of the arena.
//!
//! Test coverage areas:
//! - Argument matchers and specificity
//! - Result queues (values, throws, repeats)
//! - Delegates, re-entry and nesting depth
//! - Strict expectations
//! - Instance-bound expectations

mod common;

use common::*;
use mock_arena::prelude::*;
use mock_arena::{ExpectationId, Phase, UnexpectedKind};

// =============================================================================
// Argument matching
// =============================================================================

mod matcher_tests {
    use super::*;

    #[test]
    fn test_specific_pattern_beats_wildcard() {
        let arena = Arena::new();
        arena
            .expectations(|rec| {
                rec.record(CallPattern::new(store(), stock()).any())?
                    .min_times(0)?
                    .result(1)?;
                rec.record(CallPattern::new(store(), stock()).arg("apple"))?
                    .result(99)?;
                Ok(())
            })
            .unwrap();

        let apple = arena
            .on_intercepted_call(&store(), &stock(), None, [Value::from("apple")])
            .unwrap();
        let pear = arena
            .on_intercepted_call(&store(), &stock(), None, [Value::from("pear")])
            .unwrap();
        assert_eq!(apple.value(), Some(&Value::Int(99)));
        assert_eq!(pear.value(), Some(&Value::Int(1)));
        assert_ok(arena.finish(), "both expectations met");
    }

    #[test]
    fn test_predicate_matchers_select_calls() {
        let arena = Arena::new();
        arena
            .expectations(|rec| {
                rec.record(
                    CallPattern::new(store(), reserve())
                        .with(ArgumentMatcher::prefix("sku-"))
                        .with(ArgumentMatcher::predicate("a positive quantity", |v| {
                            matches!(v, Value::Int(n) if *n > 0)
                        })),
                )?
                .min_times(0)?
                .result(true)?;
                Ok(())
            })
            .unwrap();

        let ok = arena
            .on_intercepted_call(&store(), &reserve(), None, [Value::from("sku-1"), Value::from(2)])
            .unwrap();
        let zero = arena
            .on_intercepted_call(&store(), &reserve(), None, [Value::from("sku-1"), Value::from(0)])
            .unwrap();
        let other = arena
            .on_intercepted_call(&store(), &reserve(), None, [Value::from("apple"), Value::from(2)])
            .unwrap();
        assert_eq!(ok.value(), Some(&Value::Bool(true)));
        // Unmatched calls fall back to the boolean default.
        assert_eq!(zero.value(), Some(&Value::Bool(false)));
        assert_eq!(other.value(), Some(&Value::Bool(false)));

        let log = arena.invocations();
        assert!(log[0].matched().is_some());
        assert!(log[1].matched().is_none());
        assert!(log[2].matched().is_none());
    }

    #[test]
    fn test_near_and_regex_matchers() {
        let arena = Arena::new();
        let pattern = ArgumentMatcher::regex("[a-z]+-[0-9]{2}").unwrap();
        arena
            .expectations(|rec| {
                rec.record(CallPattern::new(store(), price()).with(pattern))?
                    .min_times(0)?
                    .result(4.5)?;
                Ok(())
            })
            .unwrap();

        let hit = arena
            .on_intercepted_call(&store(), &price(), None, [Value::from("kiwi-12")])
            .unwrap();
        let miss = arena
            .on_intercepted_call(&store(), &price(), None, [Value::from("kiwi-123")])
            .unwrap();
        assert_eq!(hit.value(), Some(&Value::Float(4.5)));
        assert_eq!(miss.value(), Some(&Value::Float(0.0)));

        let near = ArgumentMatcher::near(4.5, 0.01);
        assert!(near.matches(&Value::Float(4.505)));
        assert!(!near.matches(&Value::Float(4.6)));
    }

    #[test]
    fn test_bad_regex_is_illegal_state() {
        let err = ArgumentMatcher::regex("(unclosed").unwrap_err();
        assert!(err.is_illegal_state());
    }

    #[test]
    fn test_matcher_arity_is_checked_when_recording() {
        let arena = Arena::new();
        let err = arena
            .expectations(|rec| {
                rec.record(CallPattern::new(store(), reserve()).arg("sku-1"))?;
                Ok(())
            })
            .unwrap_err();
        assert_error_contains(&err, "takes 2 argument(s) but 1 matcher(s)", "arity");
        assert_eq!(arena.phase(), Phase::Recording);
    }
}

// =============================================================================
// Result queues
// =============================================================================

mod result_tests {
    use super::*;

    #[test]
    fn test_consecutive_results_then_last_repeats() {
        let arena = Arena::new();
        arena
            .expectations(|rec| {
                rec.record(CallPattern::new(svc(), h()))?
                    .min_times(1)?
                    .returns([1, 2, 3])?;
                Ok(())
            })
            .unwrap();

        let values: Vec<Value> = (0..5)
            .map(|_| call_svc(&arena, &h(), []).unwrap().value().cloned().unwrap())
            .collect();
        assert_eq!(
            values,
            vec![Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(3), Value::Int(3)]
        );
    }

    #[test]
    fn test_throws_are_returned_as_outcomes() {
        let arena = Arena::new();
        arena
            .expectations(|rec| {
                rec.record(CallPattern::new(store(), stock()).arg("ghost"))?
                    .throws(Thrown::new("NoSuchItem", "ghost is not stocked"))?;
                Ok(())
            })
            .unwrap();

        let out = arena
            .on_intercepted_call(&store(), &stock(), None, [Value::from("ghost")])
            .unwrap();
        let thrown = out.thrown().expect("recorded throw");
        assert_eq!(thrown.type_name, "NoSuchItem");
        assert_eq!(thrown.to_string(), "NoSuchItem: ghost is not stocked");
    }

    #[test]
    fn test_mixed_queue_of_values_and_throws() {
        let arena = Arena::new();
        arena
            .expectations(|rec| {
                rec.record(CallPattern::new(svc(), h()))?
                    .times(3)?
                    .result(1)?
                    .throws(Thrown::new("Timeout", "slow"))?
                    .result(2)?;
                Ok(())
            })
            .unwrap();

        assert_eq!(call_svc(&arena, &h(), []).unwrap(), Outcome::ReturnValue(Value::Int(1)));
        assert!(call_svc(&arena, &h(), []).unwrap().thrown().is_some());
        assert_eq!(call_svc(&arena, &h(), []).unwrap(), Outcome::ReturnValue(Value::Int(2)));
        assert_ok(arena.finish(), "three calls expected");
    }

    #[test]
    fn test_invocation_count_tracks_matches() {
        let arena = Arena::new();
        let ids = arena
            .expectations(|rec| {
                rec.record(CallPattern::new(svc(), g()))?.min_times(0)?;
                Ok(())
            })
            .unwrap();
        for _ in 0..4 {
            call_svc(&arena, &g(), []).unwrap();
        }
        assert_eq!(arena.invocation_count(ids[0]), Some(4));
        assert_eq!(arena.invocation_count(ExpectationId(42)), None);
    }
}

// =============================================================================
// Delegates
// =============================================================================

mod delegate_tests {
    use super::*;

    #[test]
    fn test_delegate_computes_from_arguments() {
        let arena = Arena::new();
        arena
            .expectations(|rec| {
                rec.record(CallPattern::new(store(), stock()).any())?
                    .min_times(0)?
                    .delegate(|call| {
                        let name = call.arg(0).and_then(Value::as_str).unwrap_or_default();
                        Ok(Value::Int(name.len() as i64))
                    })?;
                Ok(())
            })
            .unwrap();

        let out = arena
            .on_intercepted_call(&store(), &stock(), None, [Value::from("banana")])
            .unwrap();
        assert_eq!(out, Outcome::ReturnValue(Value::Int(6)));
        assert_eq!(arena.metrics().snapshot().delegates_run, 1);
    }

    #[test]
    fn test_delegate_reentry_records_parent() {
        let arena = Arena::new();
        arena
            .expectations(|rec| {
                rec.record(CallPattern::new(store(), price()).any())?
                    .min_times(0)?
                    .delegate(|call| {
                        let item = call.arg(0).cloned().unwrap_or(Value::Null);
                        let stock = call
                            .arena
                            .on_intercepted_call(&store(), &stock(), None, [item])
                            .map_err(Thrown::from)?;
                        Ok(match stock.value() {
                            Some(Value::Int(0)) => Value::Float(0.0),
                            _ => Value::Float(9.5),
                        })
                    })?;
                rec.record(CallPattern::new(store(), stock()).any())?
                    .min_times(0)?
                    .result(3)?;
                Ok(())
            })
            .unwrap();

        let out = arena
            .on_intercepted_call(&store(), &price(), None, [Value::from("pear")])
            .unwrap();
        assert_eq!(out.value(), Some(&Value::Float(9.5)));

        let log = arena.invocations();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].parent(), None);
        assert_eq!(log[1].parent(), Some(log[0].seq()));

        // The delegate frame is gone once the outer call returns.
        arena
            .on_intercepted_call(&store(), &stock(), None, [Value::from("fig")])
            .unwrap();
        assert_eq!(arena.invocations()[2].parent(), None);
    }

    #[test]
    fn test_runaway_delegate_recursion_is_cut_off() {
        let arena = Arena::with_config(ArenaConfig::default().with_max_delegate_depth(3));
        arena
            .expectations(|rec| {
                rec.record(CallPattern::new(svc(), h()))?
                    .min_times(0)?
                    .delegate(|call| {
                        match call
                            .arena
                            .on_intercepted_call(&svc(), &h(), None, [])
                            .map_err(Thrown::from)?
                        {
                            Outcome::Throw(thrown) => Err(thrown),
                            other => Ok(other.value().cloned().unwrap_or(Value::Null)),
                        }
                    })?;
                Ok(())
            })
            .unwrap();

        let out = call_svc(&arena, &h(), []).unwrap();
        let thrown = out.thrown().expect("depth error surfaces as a throw");
        assert_eq!(thrown.type_name, "IllegalState");
        assert!(thrown.message.contains("depth of 3"));

        let log = arena.invocations();
        assert_eq!(log.len(), 4);
        assert_eq!(log[3].parent(), Some(log[2].seq()));
    }

    #[test]
    fn test_delegate_error_becomes_throw() {
        let arena = Arena::new();
        arena
            .expectations(|rec| {
                rec.record(CallPattern::new(svc(), g()))?
                    .delegate(|_| Err(Thrown::new("Boom", "delegate failed")))?;
                Ok(())
            })
            .unwrap();
        let out = call_svc(&arena, &g(), []).unwrap();
        assert_eq!(out, Outcome::Throw(Thrown::new("Boom", "delegate failed")));
    }
}

// =============================================================================
// Strict expectations
// =============================================================================

mod strict_tests {
    use super::*;

    fn strict_x_then_y(arena: &Arena) {
        arena
            .strict_expectations(|rec| {
                rec.record(CallPattern::new(svc(), x()))?;
                rec.record(CallPattern::new(svc(), y()))?;
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_strict_order_is_enforced_at_the_call() {
        let arena = Arena::new();
        strict_x_then_y(&arena);
        let err = assert_unexpected(call_svc(&arena, &y(), []), UnexpectedKind::OutOfOrder, "y first");
        assert_eq!(err.expected.as_deref(), Some("Svc#x()"));
        assert_error_contains(&err, "when was expecting an invocation of", "out of order message");
        assert_eq!(arena.metrics().snapshot().ordering_failures, 1);
    }

    #[test]
    fn test_strict_order_in_sequence_passes() {
        let arena = Arena::new();
        strict_x_then_y(&arena);
        call_svc(&arena, &x(), []).unwrap();
        call_svc(&arena, &y(), []).unwrap();
        assert_ok(arena.finish(), "x then y");
    }

    #[test]
    fn test_non_strict_expectations_are_unaffected_by_strict_order() {
        let arena = Arena::new();
        strict_x_then_y(&arena);
        arena
            .expectations(|rec| {
                rec.record(CallPattern::new(svc(), g()))?.min_times(0)?;
                Ok(())
            })
            .unwrap();
        call_svc(&arena, &g(), []).unwrap();
        call_svc(&arena, &x(), []).unwrap();
        call_svc(&arena, &g(), []).unwrap();
        call_svc(&arena, &y(), []).unwrap();
        assert_ok(arena.finish(), "interleaved g() calls");
    }

    #[test]
    fn test_strict_overflow_is_reported() {
        let arena = Arena::new();
        strict_x_then_y(&arena);
        call_svc(&arena, &x(), []).unwrap();
        assert_unexpected(call_svc(&arena, &x(), []), UnexpectedKind::Overflow, "second x()");
    }
}

// =============================================================================
// Instance-bound expectations
// =============================================================================

mod instance_tests {
    use super::*;

    #[test]
    fn test_instance_bound_expectation_only_sees_its_instance() {
        let arena = Arena::new();
        let north = arena.new_instance(store());
        let south = arena.new_instance(store());
        arena
            .expectations(|rec| {
                rec.record(CallPattern::new(store(), stock()).on(north).any())?
                    .result(10)?;
                rec.record(CallPattern::new(store(), stock()).any())?
                    .min_times(0)?
                    .result(1)?;
                Ok(())
            })
            .unwrap();

        let at_north = arena
            .on_intercepted_call(&store(), &stock(), Some(north), [Value::from("a")])
            .unwrap();
        let at_south = arena
            .on_intercepted_call(&store(), &stock(), Some(south), [Value::from("a")])
            .unwrap();
        assert_eq!(at_north.value(), Some(&Value::Int(10)));
        assert_eq!(at_south.value(), Some(&Value::Int(1)));
        assert_ok(arena.finish(), "north stock checked once");
    }

    #[test]
    fn test_missing_call_cites_the_instance() {
        let arena = Arena::new();
        let north = arena.new_instance(store());
        arena
            .expectations(|rec| {
                rec.record(CallPattern::new(store(), stock()).on(north).any())?;
                Ok(())
            })
            .unwrap();
        let err = assert_missing(arena.finish(), "north never called");
        assert!(err.expected.contains("on mock instance: instance#"));
    }
}
