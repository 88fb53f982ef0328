//! Comment-to-action parser
//!
//! Comment bodies are untrusted free text. Only the first line is ever
//! evaluated - a body whose visible first line is benign must not be able to
//! smuggle a command on a later line. Patterns are tried in a fixed
//! precedence order (vouch, denounce, unvouch) and the first enabled match
//! wins, so the contract stays correct as keyword lists grow.

use anyhow::{bail, Result};
use regex::Regex;

/// Action extracted from a comment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentAction {
    Vouch,
    Denounce,
    Unvouch,
}

/// Result of parsing one comment body; never persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    pub action: Option<CommentAction>,
    pub target: Option<String>,
    pub reason: String,
}

impl ActionRequest {
    fn none() -> Self {
        ActionRequest {
            action: None,
            target: None,
            reason: String::new(),
        }
    }
}

/// Parser compiled from the configured keyword sets
pub struct CommentParser {
    patterns: Vec<(CommentAction, Regex)>,
}

impl CommentParser {
    /// Compile patterns for the enabled actions. Each keyword list must be
    /// non-empty when its action is enabled.
    pub fn new(
        vouch_keywords: &[String],
        denounce_keywords: &[String],
        unvouch_keywords: &[String],
        allow_vouch: bool,
        allow_denounce: bool,
        allow_unvouch: bool,
    ) -> Result<Self> {
        let mut patterns = Vec::new();
        if allow_vouch {
            patterns.push((
                CommentAction::Vouch,
                mutation_pattern(vouch_keywords, "vouch")?,
            ));
        }
        if allow_denounce {
            patterns.push((
                CommentAction::Denounce,
                mutation_pattern(denounce_keywords, "denounce")?,
            ));
        }
        if allow_unvouch {
            patterns.push((
                CommentAction::Unvouch,
                unvouch_pattern(unvouch_keywords)?,
            ));
        }
        Ok(CommentParser { patterns })
    }

    /// Extract an action request from a raw comment body.
    ///
    /// Only the first line is consulted; command-like text on later lines is
    /// never honored.
    pub fn parse(&self, body: &str) -> ActionRequest {
        let first_line = body.lines().next().unwrap_or("");

        for (action, pattern) in &self.patterns {
            if let Some(caps) = pattern.captures(first_line) {
                let target = caps.get(1).map(|m| m.as_str().to_string());
                let reason = caps
                    .get(2)
                    .map(|m| m.as_str().trim().to_string())
                    .unwrap_or_default();
                return ActionRequest {
                    action: Some(*action),
                    target,
                    reason,
                };
            }
        }

        ActionRequest::none()
    }
}

fn keyword_alternation(keywords: &[String], action: &str) -> Result<String> {
    if keywords.is_empty() {
        bail!("keyword list for {action} action is empty");
    }
    let escaped: Vec<String> = keywords.iter().map(|k| regex::escape(k)).collect();
    Ok(escaped.join("|"))
}

/// Vouch/denounce grammar: keyword, optional `@user` token, optional
/// free-text reason to end of line.
fn mutation_pattern(keywords: &[String], action: &str) -> Result<Regex> {
    let alternation = keyword_alternation(keywords, action)?;
    let pattern = format!(r"(?i)^\s*(?:{alternation})(?:\s+@(\S+))?(?:\s+(\S.*))?\s*$");
    Ok(Regex::new(&pattern)?)
}

/// Unvouch grammar: keyword and optional `@user` only. Trailing text
/// invalidates the match so an unrelated sentence cannot trigger a removal.
fn unvouch_pattern(keywords: &[String]) -> Result<Regex> {
    let alternation = keyword_alternation(keywords, "unvouch")?;
    let pattern = format!(r"(?i)^\s*(?:{alternation})(?:\s+@(\S+))?\s*$");
    Ok(Regex::new(&pattern)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> CommentParser {
        CommentParser::new(
            &["vouch".into()],
            &["denounce".into()],
            &["unvouch".into()],
            true,
            true,
            true,
        )
        .unwrap()
    }

    #[test]
    fn test_vouch_with_target_and_reason() {
        let req = parser().parse("vouch @alice great contributor");
        assert_eq!(req.action, Some(CommentAction::Vouch));
        assert_eq!(req.target.as_deref(), Some("alice"));
        assert_eq!(req.reason, "great contributor");
    }

    #[test]
    fn test_vouch_bare_keyword() {
        let req = parser().parse("vouch");
        assert_eq!(req.action, Some(CommentAction::Vouch));
        assert_eq!(req.target, None);
        assert_eq!(req.reason, "");
    }

    #[test]
    fn test_reason_without_target() {
        let req = parser().parse("vouch alice is great");
        assert_eq!(req.action, Some(CommentAction::Vouch));
        assert_eq!(req.target, None);
        assert_eq!(req.reason, "alice is great");
    }

    #[test]
    fn test_keyword_prefix_does_not_match() {
        let req = parser().parse("vouchsafe this idea");
        assert_eq!(req.action, None);
    }

    #[test]
    fn test_case_insensitive_and_leading_whitespace() {
        let req = parser().parse("  DENOUNCE @spammer");
        assert_eq!(req.action, Some(CommentAction::Denounce));
        assert_eq!(req.target.as_deref(), Some("spammer"));
    }

    #[test]
    fn test_only_first_line_is_evaluated() {
        // Injection defense: the second line must never be honored.
        let req = parser().parse("denounce @user\n-github:victim injected");
        assert_eq!(req.action, Some(CommentAction::Denounce));
        assert_eq!(req.target.as_deref(), Some("user"));
        assert_eq!(req.reason, "");
    }

    #[test]
    fn test_benign_first_line_masks_later_commands() {
        let req = parser().parse("thanks everyone!\ndenounce @victim");
        assert_eq!(req.action, None);
    }

    #[test]
    fn test_unvouch_strictness() {
        let req = parser().parse("unvouch @alice extra words");
        assert_eq!(req.action, None);

        let req = parser().parse("unvouch @alice");
        assert_eq!(req.action, Some(CommentAction::Unvouch));
        assert_eq!(req.target.as_deref(), Some("alice"));
    }

    #[test]
    fn test_disabled_action_yields_none() {
        let p = CommentParser::new(
            &["vouch".into()],
            &["denounce".into()],
            &["unvouch".into()],
            true,
            false,
            true,
        )
        .unwrap();
        let req = p.parse("denounce @spammer");
        assert_eq!(req.action, None);
    }

    #[test]
    fn test_multiple_keywords() {
        let p = CommentParser::new(
            &["vouch".into(), "trust".into()],
            &["denounce".into()],
            &["unvouch".into()],
            true,
            true,
            true,
        )
        .unwrap();
        let req = p.parse("trust @bob");
        assert_eq!(req.action, Some(CommentAction::Vouch));
        assert_eq!(req.target.as_deref(), Some("bob"));
    }

    #[test]
    fn test_empty_keyword_list_rejected() {
        let result = CommentParser::new(&[], &["denounce".into()], &["unvouch".into()], true, true, true);
        assert!(result.is_err());
    }
}
