/// Server services
pub mod ytdlp;

pub use ytdlp::YtDlpResolver;
