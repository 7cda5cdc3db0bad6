use std::env;

use tapegraph::{Graph, MachineConfig, TapeMachine};

// Single test in this binary: it mutates process environment.
#[test]
fn environment_flags_configure_new_machines() {
    env::set_var("TAPEGRAPH_NAN_GUARD", "yes");
    env::set_var("TAPEGRAPH_INF_GUARD", "0");
    env::remove_var("TAPEGRAPH_LOG_VALUES");

    let config = MachineConfig::from_env();
    assert!(config.nan_guard);
    assert!(!config.inf_guard);
    assert!(!config.log_values);

    let mut graph = Graph::new();
    let machine = TapeMachine::new(&mut graph);
    assert_eq!(machine.config(), &config);
}
