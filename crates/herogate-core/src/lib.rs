pub mod error;
pub mod hero;

pub use error::{Result, UpstreamError};
pub use hero::{AuthenticatedHero, Hero, HeroListing, HeroProfile, HeroView};
