pub mod job_event;
pub mod job_tracker;

pub use job_event::{job_event_channel, JobEvent, JobEventReceiver, JobEventSender};
pub use job_tracker::{JobHandle, JobTracker};
