pub mod asset;
pub mod inference;
pub mod monster_stats;
pub mod render_orchestrator;
pub mod renderer;
pub mod validator;
pub mod viewpoint;
