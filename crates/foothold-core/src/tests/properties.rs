//! Invariants under random dispatch sequences.

use proptest::prelude::*;

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::level::LevelDef;
use crate::node::{Camp, NodeId};

use super::helpers::{level_from, quiet_config, value_of};

/// One scripted step: wait, then dispatch.
#[derive(Debug, Clone)]
struct Step {
    wait_ms: u64,
    from: u32,
    to: u32,
    amount: f64,
}

fn step() -> impl Strategy<Value = Step> {
    (0u64..1_500, 0u32..4, 0u32..4, -2.0f64..40.0).prop_map(|(wait_ms, from, to, amount)| Step {
        wait_ms,
        from,
        to,
        amount,
    })
}

fn owner_of_node(engine: &Engine, id: u32) -> Camp {
    engine.registry().get(NodeId::new(id)).map_or(Camp::Neutral, |node| node.owner())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Node values stay finite and non-negative whatever is dispatched.
    #[test]
    fn values_stay_non_negative(steps in prop::collection::vec(step(), 1..24), seed in any::<u64>()) {
        let mut engine = Engine::new(LevelDef::test_panel().unwrap(), EngineConfig::default(), seed).unwrap();
        for step in &steps {
            engine.advance(step.wait_ms);
            let owner = owner_of_node(&engine, step.from);
            engine.dispatch(NodeId::new(step.from), NodeId::new(step.to), owner, step.amount);
            for node in engine.registry().iter() {
                prop_assert!(node.value().is_finite());
                prop_assert!(node.value() >= 0.0);
            }
        }
        engine.advance(30_000);
        for node in engine.registry().iter() {
            prop_assert!(node.value() >= 0.0);
        }
    }

    /// A terminal result never reverts and freezes the board.
    #[test]
    fn terminal_result_is_sticky(steps in prop::collection::vec(step(), 1..24), seed in any::<u64>()) {
        let mut engine = Engine::new(LevelDef::test_panel().unwrap(), EngineConfig::default(), seed).unwrap();
        let mut frozen = None;
        for step in &steps {
            engine.advance(step.wait_ms);
            let owner = owner_of_node(&engine, step.from);
            engine.dispatch(NodeId::new(step.from), NodeId::new(step.to), owner, step.amount);
            match &frozen {
                Some((result, snapshot)) => {
                    prop_assert_eq!(engine.result(), *result);
                    prop_assert_eq!(&engine.node_snapshot(), snapshot);
                }
                None if engine.result().is_terminal() => {
                    prop_assert_eq!(engine.pending_flights(), 0);
                    frozen = Some((engine.result(), engine.node_snapshot()));
                }
                None => {}
            }
        }
    }

    /// Without growth, a source loses exactly the units it sends.
    #[test]
    fn debits_match_amount(value in 1u32..60, amount in 1u32..60) {
        let sent = amount.min(value);
        let level = level_from(&[
            (0, 0.0, 0.0, Camp::Blue, f64::from(value)),
            (1, 500.0, 0.0, Camp::Red, 60.0),
        ]);
        let mut engine = Engine::new(level, quiet_config(), 0).unwrap();
        let ids = engine.dispatch(NodeId::new(0), NodeId::new(1), Camp::Blue, f64::from(sent));
        prop_assert_eq!(ids.len(), sent as usize);

        // the last column leaves at 11 * 220 ms, well before any unit lands
        engine.advance(5_000);
        prop_assert_eq!(value_of(&engine, 0), f64::from(value - sent));
    }
}
