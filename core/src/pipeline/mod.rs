//! Concurrent capture, ingest, compute and publish stages of a session.

mod capture;
mod coordinator;
mod events;
mod stages;

pub use capture::{CaptureError, CaptureSource, Delivery, DeliveryStatus, SampleSink};
pub use coordinator::{PipelineCoordinator, PipelineError, ReadingHandle};
pub use events::{PipelineEvent, PipelineState, EVENT_CAPACITY};
