pub mod candidate;
pub mod formats;
pub mod media_stream;
pub mod preference;

pub use candidate::Candidate;
pub use formats::MediaKind;
pub use media_stream::{MediaStream, SubtitleTrack};
pub use preference::Preference;
