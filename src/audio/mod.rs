pub mod engine;
pub mod error;
pub mod queue;
pub mod registry;
pub mod remote;
pub mod session;
pub mod state;
pub mod traits;

pub use error::PlayerError;
pub use session::{PlaybackSession, SessionOptions};
pub use state::{EngineReadiness, SessionState};
