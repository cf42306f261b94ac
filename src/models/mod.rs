pub mod job;
pub mod loaders;
pub mod result;
pub mod upload_file;

pub use job::{
    DeleteResponse, Job, JobState, StatusResponse, Transition, UploadResponse, UNKNOWN_ERROR,
};
pub use loaders::{load_upload_file, load_upload_files};
pub use result::{CategoryAlternative, ClassificationResult, ResultOrder, SortDirection, SortField};
pub use upload_file::{FileValidator, UploadFile};
