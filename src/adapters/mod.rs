// Adapters - Production implementations of the ports

pub mod catalog_http;
pub mod cut_detect_ffmpeg;
pub mod debug_sink;
pub mod delivery_reqwest;
pub mod exec_ffmpeg;
pub mod probe_ffprobe;

pub use catalog_http::HttpCatalogAdapter;
pub use cut_detect_ffmpeg::FfmpegCutDetector;
pub use debug_sink::TracingDebugSink;
pub use delivery_reqwest::ReqwestDeliveryAdapter;
pub use exec_ffmpeg::FfmpegTranscoder;
pub use probe_ffprobe::FfprobeAdapter;
