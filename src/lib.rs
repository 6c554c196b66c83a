pub mod cli;
pub mod config;
pub mod document;
pub mod link;
pub mod source;
pub mod stream_params;
pub mod subscription;
pub mod util;
pub mod version;
