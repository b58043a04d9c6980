// Synthesis and inspection
pub mod graph;
pub mod list;
pub mod synth;

// Engine runs
pub mod deploy;

// State outputs
pub mod outputs;

// Housekeeping
pub mod config;
pub mod doctor;
