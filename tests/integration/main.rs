//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against simulated pins and a manual clock.  All tests run on the host
//! with no real hardware required.

mod app_service_tests;
mod gate_scenarios;
mod mock_hw;
mod mqtt_link_tests;
