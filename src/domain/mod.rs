pub mod lyric;
pub mod request;

pub use lyric::LyricResult;
pub use request::LookupRequest;
