//! Cross-module scenarios: condition codes through the renderer to a finished frame.

mod scenario_tests;
