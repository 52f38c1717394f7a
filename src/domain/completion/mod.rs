//! Completion provider domain traits

mod provider;

pub use provider::CompletionProvider;

#[cfg(test)]
pub use provider::mock::MockCompletionProvider;
