pub mod job_client;

pub use job_client::{HttpJobClient, RemoteJobClient};
