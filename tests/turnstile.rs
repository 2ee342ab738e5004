//! Classic two-state turnstile driven through the blocking engine.

use statemaps::definition::TransitionType;
use statemaps::{
    event_enum, state_enum, FsmError, Instance, StateMachineBuilder, StateMachineDefinition,
    TransitionBuilder, DEFAULT_STATE_MAP,
};
use std::collections::HashSet;

state_enum! {
    enum Turnstile {
        Locked,
        Unlocked,
    }
}

event_enum! {
    enum Input {
        Coin,
        Pass,
    }
}

#[derive(Default)]
struct Gate {
    calls: Vec<&'static str>,
    changes: Vec<(Turnstile, Turnstile)>,
}

type Rule = TransitionBuilder<Turnstile, Input, Gate>;

fn turnstile() -> StateMachineDefinition<Turnstile, Input, Gate> {
    StateMachineBuilder::new(Turnstile::ALL.iter().copied())
        .initial(Turnstile::Locked)
        .transition(
            Rule::on(Turnstile::Locked, Input::Coin)
                .to(Turnstile::Unlocked)
                .action(|gate: &mut Gate, _| {
                    gate.calls.push("unlock");
                    Ok(None)
                }),
        )
        .transition(Rule::on(Turnstile::Unlocked, Input::Coin).action(|gate: &mut Gate, _| {
            gate.calls.push("returnCoin");
            Ok(None)
        }))
        .transition(
            Rule::on(Turnstile::Unlocked, Input::Pass)
                .to(Turnstile::Locked)
                .action(|gate: &mut Gate, _| {
                    gate.calls.push("lock");
                    Ok(None)
                }),
        )
        .default_action(|gate: &mut Gate, _, _, _| {
            gate.calls.push("alarm");
            Ok(None)
        })
        .on_state_change(|gate: &mut Gate, from, to| gate.changes.push((*from, *to)))
        .build()
        .unwrap()
}

#[test]
fn coin_coin_pass_pass_coin() {
    let definition = turnstile();
    let mut gate = Gate::default();
    let mut instance = Instance::create(&definition, &mut gate).unwrap();

    for input in [Input::Coin, Input::Coin, Input::Pass, Input::Pass, Input::Coin] {
        instance.send_event(input).unwrap();
    }

    assert_eq!(instance.current_state(), &Turnstile::Unlocked);
    assert_eq!(
        gate.calls,
        vec!["unlock", "returnCoin", "lock", "alarm", "unlock"]
    );
    assert_eq!(
        gate.changes,
        vec![
            (Turnstile::Locked, Turnstile::Unlocked),
            (Turnstile::Unlocked, Turnstile::Locked),
            (Turnstile::Locked, Turnstile::Unlocked),
        ]
    );
}

#[test]
fn without_default_action_unknown_event_is_illegal() {
    let definition = StateMachineBuilder::<Turnstile, Input, Gate>::new(Turnstile::ALL.iter().copied())
        .initial(Turnstile::Locked)
        .transition(Rule::on(Turnstile::Locked, Input::Coin).to(Turnstile::Unlocked))
        .build()
        .unwrap();
    let mut gate = Gate::default();
    let mut instance = Instance::create(&definition, &mut gate).unwrap();

    match instance.send_event(Input::Pass) {
        Err(FsmError::IllegalEvent { state, event, map }) => {
            assert_eq!(state, "Locked");
            assert_eq!(event, "Pass");
            assert_eq!(map, DEFAULT_STATE_MAP);
        }
        other => panic!("expected illegal event, got {:?}", other),
    }
    assert_eq!(instance.current_state(), &Turnstile::Locked);
}

#[test]
fn allowed_events_reflect_declarations() {
    let definition = turnstile();
    let mut gate = Gate::default();
    let mut instance = Instance::create(&definition, &mut gate).unwrap();

    assert_eq!(instance.allowed(true), HashSet::from([Input::Coin]));
    assert!(!instance.event_allowed(&Input::Pass, true));

    instance.send_event(Input::Coin).unwrap();
    assert_eq!(instance.allowed(false), HashSet::from([Input::Coin, Input::Pass]));
}

#[test]
fn instances_do_not_share_position() {
    let definition = turnstile();

    let mut first = Gate::default();
    let mut a = Instance::create(&definition, &mut first).unwrap();
    a.send_event(Input::Coin).unwrap();

    let mut second = Gate::default();
    let b = Instance::create(&definition, &mut second).unwrap();

    assert_eq!(a.current_state(), &Turnstile::Unlocked);
    assert_eq!(b.current_state(), &Turnstile::Locked);
}

#[test]
fn initial_state_can_be_resolved_from_context() {
    let definition = StateMachineBuilder::<Turnstile, Input, bool>::new(Turnstile::ALL.iter().copied())
        .initial_with(|paid: &bool| {
            if *paid {
                Turnstile::Unlocked
            } else {
                Turnstile::Locked
            }
        })
        .build()
        .unwrap();

    let mut paid = true;
    let instance = Instance::create(&definition, &mut paid).unwrap();
    assert_eq!(instance.current_state(), &Turnstile::Unlocked);
}

#[test]
fn view_lists_every_edge() {
    let definition = turnstile();
    let maps = definition.state_maps();
    assert_eq!(maps.len(), 1);

    let default = &maps[0];
    assert_eq!(default.name(), DEFAULT_STATE_MAP);
    assert_eq!(
        default.states(),
        vec![&Turnstile::Locked, &Turnstile::Unlocked]
    );

    let edges = default.transitions();
    assert_eq!(edges.len(), 4);
    assert_eq!(edges[0].transition_type, TransitionType::Start);
    assert_eq!(edges[0].target, Some(Turnstile::Locked));

    let labels: Vec<String> = edges[1..].iter().map(|edge| edge.label()).collect();
    assert_eq!(labels, vec!["Coin", "Coin", "Pass"]);
}
