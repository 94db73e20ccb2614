pub mod job;
pub mod response;

pub use job::{Job, JobError, JobStatus, JobWithDistance, NewJob};
pub use response::{MatchCandidate, MatchScore};
