pub mod crisis_keyword;

pub use crisis_keyword::CrisisKeyword;
