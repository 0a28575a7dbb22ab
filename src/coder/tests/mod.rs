mod fixtures;
mod scenario_tests;
