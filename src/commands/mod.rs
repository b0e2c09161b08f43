pub mod completions;
pub mod rotate;

pub use completions::CompletionsCommand;
pub use rotate::RotateCommand;
