pub mod comment;
pub mod movie;
pub mod recommendation;

pub use comment::{Comment, NewComment, Sentiment, SCALE_MAX, SCALE_MIDPOINT, SCALE_MIN};
pub use movie::{Movie, RatedMovie};
pub use recommendation::{RecommendationDataset, RecommendationItem};
