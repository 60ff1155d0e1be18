//! Strategies for choosing between mappings that share an alias.

use super::mapping::CommandMapping;
use super::principal::Principal;

/// Chooses one mapping when an alias resolves to several.
///
/// Implementations are pure: they only look at their arguments and never
/// touch the alias table. `candidates` is never empty and is in registration
/// order. Returning `None` means the strategy declines to choose.
pub trait Disambiguator: Send + Sync {
    fn disambiguate(
        &self,
        principal: Option<&dyn Principal>,
        alias_used: &str,
        candidates: &[CommandMapping],
    ) -> Option<CommandMapping>;
}

impl<F> Disambiguator for F
where
    F: Fn(Option<&dyn Principal>, &str, &[CommandMapping]) -> Option<CommandMapping>
        + Send
        + Sync,
{
    fn disambiguate(
        &self,
        principal: Option<&dyn Principal>,
        alias_used: &str,
        candidates: &[CommandMapping],
    ) -> Option<CommandMapping> {
        self(principal, alias_used, candidates)
    }
}

fn exact_primary<'a>(
    alias_used: &str,
    candidates: &'a [CommandMapping],
) -> Option<&'a CommandMapping> {
    let alias_used = alias_used.to_lowercase();
    candidates
        .iter()
        .find(|mapping| mapping.primary_alias().to_lowercase() == alias_used)
}

/// Prefers the candidate whose primary alias is the alias used, otherwise the
/// first one registered.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstMatchDisambiguator;

impl Disambiguator for FirstMatchDisambiguator {
    fn disambiguate(
        &self,
        _principal: Option<&dyn Principal>,
        alias_used: &str,
        candidates: &[CommandMapping],
    ) -> Option<CommandMapping> {
        exact_primary(alias_used, candidates)
            .or_else(|| candidates.first())
            .cloned()
    }
}

/// Only chooses a candidate whose primary alias is the alias used.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactPrimaryDisambiguator;

impl Disambiguator for ExactPrimaryDisambiguator {
    fn disambiguate(
        &self,
        _principal: Option<&dyn Principal>,
        alias_used: &str,
        candidates: &[CommandMapping],
    ) -> Option<CommandMapping> {
        exact_primary(alias_used, candidates).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::RecordingCommand;

    fn mapping(primary: &str, secondary: &[&str]) -> CommandMapping {
        CommandMapping::new(
            RecordingCommand::arc(),
            primary,
            secondary.iter().map(|s| s.to_string()),
        )
    }

    #[test]
    fn test_first_match_prefers_exact_primary() {
        let y = mapping("y", &["x"]);
        let x = mapping("x", &[]);
        let chosen = FirstMatchDisambiguator.disambiguate(None, "X", &[y, x.clone()]);
        assert_eq!(chosen, Some(x));
    }

    #[test]
    fn test_first_match_falls_back_to_first() {
        let y = mapping("y", &["x"]);
        let z = mapping("z", &["x"]);
        let chosen = FirstMatchDisambiguator.disambiguate(None, "x", &[y.clone(), z]);
        assert_eq!(chosen, Some(y));
    }

    #[test]
    fn test_exact_primary_declines_without_match() {
        let y = mapping("y", &["x"]);
        let z = mapping("z", &["x"]);
        assert_eq!(ExactPrimaryDisambiguator.disambiguate(None, "x", &[y, z]), None);
    }

    #[test]
    fn test_closure_disambiguator() {
        let last = |_: Option<&dyn Principal>, _: &str, candidates: &[CommandMapping]| {
            candidates.last().cloned()
        };
        let y = mapping("y", &["x"]);
        let z = mapping("z", &["x"]);
        assert_eq!(last.disambiguate(None, "x", &[y, z.clone()]), Some(z));
    }
}
