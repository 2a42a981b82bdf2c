pub mod events;
pub mod ids;
pub mod options;
pub mod poll;

pub use events::JobEvent;
pub use ids::ProcessKey;
pub use options::SubmitOptions;
pub use poll::{PollRate, PollState};
