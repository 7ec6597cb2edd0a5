pub mod debounce;
pub mod machine;

pub use debounce::Debounce;
pub use machine::{Command, DEFAULT_SETTLE_DELAY, Effect, Phase, SelectionMachine, TipState};
