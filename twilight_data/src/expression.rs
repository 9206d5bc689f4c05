//! Whitelist check for condition expressions authored in content.
//!
//! Expressions are evaluated by the gameplay layer. Here they are only scanned so that a
//! misspelt variable or function name fails the pack at compile or load time instead of
//! quietly evaluating to a default during play.

use std::collections::HashSet;

use thiserror::Error;

/// Variables every validator knows about.
pub const KNOWN_VARIABLES: &[&str] = &[
    "WorldTension",
    "WorldBalance",
    "WorldResonance",
    "CurrentDay",
    "TurnNumber",
    "Pressure",
    "PlayerHealth",
    "PlayerMaxHealth",
    "PlayerFaith",
    "PlayerMaxFaith",
    "PlayerBalance",
    "PlayerSupplies",
    "PlayerGold",
    "PlayerStrength",
    "PlayerDexterity",
    "PlayerConstitution",
    "PlayerIntelligence",
    "PlayerWisdom",
    "PlayerCharisma",
    "PlayerDeckSize",
    "PlayerHandSize",
    "RegionId",
    "RegionState",
    "RegionType",
    "RegionDiscovered",
    "RegionCount",
    "BreachCount",
    "BorderlandCount",
    "AnchorIntegrity",
    "AnchorInfluence",
    "AnchorPower",
    "QuestStage",
    "QuestProgress",
    "ActiveQuestCount",
    "CompletedQuestCount",
    "EnemyHealth",
    "EnemyMaxHealth",
    "EnemyPower",
    "EnemyDefense",
    "EnemyCount",
    "CombatRound",
];

/// Functions every validator knows about.
pub const KNOWN_FUNCTIONS: &[&str] = &[
    "hasFlag",
    "hasQuest",
    "questActive",
    "questCompleted",
    "questFailed",
    "objectiveCompleted",
    "regionIs",
    "regionStateIs",
    "visitedRegion",
    "eventCompleted",
    "choiceMade",
    "hasCard",
    "hasItem",
    "hasHero",
    "heroClassIs",
    "anchorIntegrity",
    "enemyDefeated",
    "random",
    "min",
    "max",
    "abs",
];

const KEYWORDS: &[&str] = &["and", "or", "not", "true", "false"];

/// Why an expression was rejected. The first problem found wins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("expression is empty")]
    EmptyExpression,
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("unexpected character '{ch}' at offset {position}")]
    UnexpectedCharacter { ch: char, position: usize },
    #[error("string starting at offset {position} is not terminated")]
    UnterminatedString { position: usize },
    #[error("unbalanced parentheses at offset {position}")]
    UnbalancedParentheses { position: usize },
}

/// Scans expressions against a set of known variables and functions.
#[derive(Debug, Clone)]
pub struct ExpressionValidator {
    variables: HashSet<String>,
    functions: HashSet<String>,
}

impl Default for ExpressionValidator {
    fn default() -> Self {
        Self {
            variables: KNOWN_VARIABLES.iter().map(|name| (*name).to_string()).collect(),
            functions: KNOWN_FUNCTIONS.iter().map(|name| (*name).to_string()).collect(),
        }
    }
}

impl ExpressionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow an extra variable, e.g. for a host that exposes more state.
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>) -> Self {
        self.variables.insert(name.into());
        self
    }

    #[must_use]
    pub fn with_function(mut self, name: impl Into<String>) -> Self {
        self.functions.insert(name.into());
        self
    }

    pub fn is_known_variable(&self, name: &str) -> bool {
        self.variables.contains(name)
    }

    pub fn is_known_function(&self, name: &str) -> bool {
        self.functions.contains(name)
    }

    /// Check `expression` in one left-to-right pass.
    ///
    /// ```
    /// use twilight_data::expression::{ExpressionError, ExpressionValidator};
    ///
    /// let validator = ExpressionValidator::default();
    /// assert!(validator.validate("WorldTension > 50 && hasFlag(\"met_elder\")").is_ok());
    /// assert_eq!(
    ///     validator.validate("WorldResonanse > 3"),
    ///     Err(ExpressionError::UnknownVariable("WorldResonanse".into()))
    /// );
    /// ```
    ///
    /// # Errors
    /// The first [`ExpressionError`] encountered.
    pub fn validate(&self, expression: &str) -> Result<(), ExpressionError> {
        if expression.trim().is_empty() {
            return Err(ExpressionError::EmptyExpression);
        }

        let chars: Vec<(usize, char)> = expression.char_indices().collect();
        let mut depth = 0usize;
        let mut i = 0;

        while i < chars.len() {
            let (position, ch) = chars[i];
            match ch {
                c if c.is_whitespace() => i += 1,
                c if c.is_ascii_digit() || (c == '.' && is_digit_at(&chars, i + 1)) => {
                    i = skip_number(&chars, i);
                },
                '"' | '\'' => {
                    i = skip_string(&chars, i).ok_or(ExpressionError::UnterminatedString { position })?;
                },
                c if c.is_ascii_alphabetic() || c == '_' => {
                    let start = i;
                    while i < chars.len() && (chars[i].1.is_ascii_alphanumeric() || chars[i].1 == '_') {
                        i += 1;
                    }
                    let name: String = chars[start..i].iter().map(|(_, c)| c).collect();
                    let mut peek = i;
                    while peek < chars.len() && chars[peek].1.is_whitespace() {
                        peek += 1;
                    }
                    let is_call = chars.get(peek).is_some_and(|(_, c)| *c == '(');
                    self.check_identifier(&name, is_call)?;
                },
                '(' => {
                    depth += 1;
                    i += 1;
                },
                ')' => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or(ExpressionError::UnbalancedParentheses { position })?;
                    i += 1;
                },
                '=' | '&' | '|' => {
                    // Only the doubled forms are operators.
                    if chars.get(i + 1).map(|(_, c)| *c) != Some(ch) {
                        return Err(ExpressionError::UnexpectedCharacter { ch, position });
                    }
                    i += 2;
                },
                '!' | '<' | '>' => {
                    i += 1;
                    if chars.get(i).is_some_and(|(_, c)| *c == '=') {
                        i += 1;
                    }
                },
                '+' | '-' | '*' | '/' | '%' | ',' => i += 1,
                _ => return Err(ExpressionError::UnexpectedCharacter { ch, position }),
            }
        }

        if depth != 0 {
            return Err(ExpressionError::UnbalancedParentheses {
                position: expression.len(),
            });
        }
        Ok(())
    }

    fn check_identifier(&self, name: &str, is_call: bool) -> Result<(), ExpressionError> {
        if is_call {
            if self.functions.contains(name) {
                return Ok(());
            }
            return Err(ExpressionError::UnknownFunction(name.to_string()));
        }
        if KEYWORDS.contains(&name) || self.variables.contains(name) {
            return Ok(());
        }
        Err(ExpressionError::UnknownVariable(name.to_string()))
    }
}

fn is_digit_at(chars: &[(usize, char)], index: usize) -> bool {
    chars.get(index).is_some_and(|(_, c)| c.is_ascii_digit())
}

/// Index just past a numeric literal: `12`, `3.5`, `.5`, `1e3`, `2.5E-4`. An `e` that is not
/// followed by an exponent is left for the identifier scan.
fn skip_number(chars: &[(usize, char)], start: usize) -> usize {
    let mut i = start;
    while i < chars.len() && (chars[i].1.is_ascii_digit() || chars[i].1 == '.') {
        i += 1;
    }
    if matches!(chars.get(i), Some((_, 'e' | 'E'))) {
        let sign = usize::from(matches!(chars.get(i + 1), Some((_, '+' | '-'))));
        if is_digit_at(chars, i + 1 + sign) {
            i += 1 + sign;
            while is_digit_at(chars, i) {
                i += 1;
            }
        }
    }
    i
}

/// Index just past the closing quote of the string starting at `start`, honouring backslash
/// escapes. `None` if the input ends first.
fn skip_string(chars: &[(usize, char)], start: usize) -> Option<usize> {
    let quote = chars[start].1;
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i].1 {
            '\\' => i += 2,
            c if c == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_the_grammar() {
        let validator = ExpressionValidator::default();
        for expression in [
            "WorldTension >= 50",
            "PlayerFaith > 2 and not hasFlag('cursed')",
            "regionIs(\"village\") || (Pressure + 10) * 2 < 100",
            "questCompleted(\"prologue\") == true",
            "min(PlayerHealth, 5) != 0 && CurrentDay % 3 == 0",
            "!hasFlag(\"a \\\"quoted\\\" flag\")",
            "abs(-3.5) <= 4",
        ] {
            assert_eq!(validator.validate(expression), Ok(()), "{expression}");
        }
    }

    #[test]
    fn numeric_literal_forms() {
        let validator = ExpressionValidator::default();
        for expression in ["1e3 > Pressure", ".5 < PlayerFaith", "WorldBalance * 2.5E-4 >= 0", "CombatRound > 1e+2"] {
            assert_eq!(validator.validate(expression), Ok(()), "{expression}");
        }
        // a dangling exponent marker is an identifier, not part of the number
        assert_eq!(
            validator.validate("3e > 1"),
            Err(ExpressionError::UnknownVariable("e".into()))
        );
        assert_eq!(
            validator.validate("Pressure > ."),
            Err(ExpressionError::UnexpectedCharacter { ch: '.', position: 11 })
        );
    }

    #[test]
    fn misspelt_names_are_caught() {
        let validator = ExpressionValidator::default();
        assert_eq!(
            validator.validate("WorldResonanse > 3"),
            Err(ExpressionError::UnknownVariable("WorldResonanse".into()))
        );
        assert_eq!(
            validator.validate("hasFlagg(\"x\")"),
            Err(ExpressionError::UnknownFunction("hasFlagg".into()))
        );
        // A variable used as a call is still an unknown function.
        assert_eq!(
            validator.validate("Pressure (3)"),
            Err(ExpressionError::UnknownFunction("Pressure".into()))
        );
    }

    #[test]
    fn structural_errors() {
        let validator = ExpressionValidator::default();
        assert_eq!(validator.validate("   "), Err(ExpressionError::EmptyExpression));
        assert_eq!(
            validator.validate("hasFlag(\"open"),
            Err(ExpressionError::UnterminatedString { position: 8 })
        );
        assert!(matches!(
            validator.validate("(Pressure > 3"),
            Err(ExpressionError::UnbalancedParentheses { .. })
        ));
        assert!(matches!(
            validator.validate("Pressure > 3)"),
            Err(ExpressionError::UnbalancedParentheses { position: 12 })
        ));
        assert_eq!(
            validator.validate("Pressure = 3"),
            Err(ExpressionError::UnexpectedCharacter { ch: '=', position: 9 })
        );
        assert_eq!(
            validator.validate("Pressure > 3 ; drop"),
            Err(ExpressionError::UnexpectedCharacter { ch: ';', position: 13 })
        );
    }

    #[test]
    fn whitelist_is_extensible() {
        let validator = ExpressionValidator::default()
            .with_variable("MoonPhase")
            .with_function("isNight");
        assert_eq!(validator.validate("isNight() and MoonPhase > 2"), Ok(()));
        assert!(ExpressionValidator::default().validate("MoonPhase > 2").is_err());
    }
}
