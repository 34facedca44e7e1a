use serde::{Deserialize, Serialize};

/// A hero as served by the upstream API. Identity is the `id` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hero {
    pub id: String,
    pub name: String,
    pub image: String,
}

impl Hero {
    /// Attach a profile, producing the authenticated view of this hero.
    pub fn with_profile(self, profile: HeroProfile) -> AuthenticatedHero {
        AuthenticatedHero {
            hero: self,
            profile,
        }
    }
}

/// Per-hero ability scores, keyed upstream by hero id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroProfile {
    pub str: u32,
    pub int: u32,
    pub agi: u32,
    pub luk: u32,
}

/// A hero enriched with its profile. Only constructed for authenticated
/// callers; never sent back upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedHero {
    #[serde(flatten)]
    pub hero: Hero,
    pub profile: HeroProfile,
}

/// Response shape for a single hero. The public variant must serialize
/// without a `profile` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum HeroView {
    Public(Hero),
    Enriched(AuthenticatedHero),
}

impl HeroView {
    /// Hero id regardless of variant.
    pub fn id(&self) -> &str {
        match self {
            Self::Public(hero) => &hero.id,
            Self::Enriched(enriched) => &enriched.hero.id,
        }
    }
}

/// Response shape for the hero list. Lists are homogeneous: either every
/// entry carries a profile or none does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum HeroListing {
    Public(Vec<Hero>),
    Enriched(Vec<AuthenticatedHero>),
}

impl HeroListing {
    pub fn len(&self) -> usize {
        match self {
            Self::Public(heroes) => heroes.len(),
            Self::Enriched(heroes) => heroes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
