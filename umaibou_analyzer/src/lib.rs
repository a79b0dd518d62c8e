// THEORY:
// This file is the main entry point for the `umaibou_analyzer` library crate.
// It exposes the `AnalysisPipeline` and its associated data structures
// (`MonsterStats`, `Upload`, `AnalyzeError`, etc.) as the high-level interface
// for turning a sculpted-snack USDZ model into a monster stat sheet.
//
// The stage implementations live in `core_modules`. Callers (the HTTP server,
// the command-line tester) only need the pipeline, the concrete HTTP-backed
// collaborators and the configuration loader.

pub mod config;
pub mod core_modules;
pub mod pipeline;
