pub mod ytdlp;

pub use ytdlp::YtDlpSearch;
