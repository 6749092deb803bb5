use rand::Rng;
use registration_sdk::Identifier;

/// Source of fresh registration identifiers.
pub trait IdentifierGenerator: Send + Sync {
    fn generate(&self) -> Identifier;
}

/// Draws uniformly from `Identifier::MIN..=Identifier::MAX`.
///
/// Makes no uniqueness check; see `ServiceConfig::collision_retries`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdentifierGenerator;

impl IdentifierGenerator for RandomIdentifierGenerator {
    fn generate(&self) -> Identifier {
        let n: u32 = rand::rng().random_range(Identifier::MIN..=Identifier::MAX);
        Identifier::new(n.to_string())
    }
}
