//! Membership rules: "is the requester a member of X".
//!
//! A rule is either `org` (any team within the organization) or `org/team`
//! (one specific team). A rule set allows a session if any rule matches;
//! an empty set allows every authenticated session.

use std::fmt;
use std::str::FromStr;
use teamgate_session::Memberships;

use crate::error::PolicyError;

/// A single membership requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipRule {
    /// Membership of any team within the organization.
    Organization(String),
    /// Membership of one team within an organization.
    Team { organization: String, team: String },
}

impl MembershipRule {
    /// Returns true if `memberships` satisfy this rule.
    #[must_use]
    pub fn matches(&self, memberships: &Memberships) -> bool {
        match self {
            Self::Organization(organization) => memberships.is_org_member(organization),
            Self::Team { organization, team } => memberships.is_member(organization, team),
        }
    }
}

impl FromStr for MembershipRule {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| PolicyError::InvalidRule {
            rule: s.to_string(),
            reason: reason.to_string(),
        };

        let rule = s.trim();
        match rule.split_once('/') {
            None if rule.is_empty() => Err(invalid("empty rule")),
            None => Ok(Self::Organization(rule.to_string())),
            Some((organization, team)) => {
                if organization.is_empty() || team.is_empty() {
                    return Err(invalid("expected 'org' or 'org/team'"));
                }
                if team.contains('/') {
                    return Err(invalid("too many segments"));
                }
                Ok(Self::Team {
                    organization: organization.to_string(),
                    team: team.to_string(),
                })
            }
        }
    }
}

impl fmt::Display for MembershipRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Organization(organization) => f.write_str(organization),
            Self::Team { organization, team } => write!(f, "{organization}/{team}"),
        }
    }
}

/// A set of membership rules; any match allows access.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipRules {
    rules: Vec<MembershipRule>,
}

impl MembershipRules {
    /// Creates a rule set that allows every authenticated session.
    #[must_use]
    pub fn any_authenticated() -> Self {
        Self::default()
    }

    /// Parses rules from their `org` / `org/team` text form.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidRule`] for the first malformed rule.
    pub fn parse<S: AsRef<str>>(rules: &[S]) -> Result<Self, PolicyError> {
        let rules = rules
            .iter()
            .map(|rule| rule.as_ref().parse())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Returns true if `memberships` satisfy at least one rule, or if there
    /// are no rules.
    #[must_use]
    pub fn allows(&self, memberships: &Memberships) -> bool {
        self.rules.is_empty() || self.rules.iter().any(|rule| rule.matches(memberships))
    }

    /// Returns the rules as a slice.
    #[must_use]
    pub fn rules(&self) -> &[MembershipRule] {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memberships() -> Memberships {
        [("orgA", "team1"), ("orgA", "team2"), ("orgB", "team3")]
            .into_iter()
            .collect()
    }

    #[test]
    fn parses_org_and_team_rules() {
        assert_eq!(
            "acme".parse::<MembershipRule>().expect("parse"),
            MembershipRule::Organization("acme".to_string())
        );
        assert_eq!(
            " acme/ops ".parse::<MembershipRule>().expect("parse"),
            MembershipRule::Team {
                organization: "acme".to_string(),
                team: "ops".to_string()
            }
        );
    }

    #[test]
    fn rejects_malformed_rules() {
        for rule in ["", "/ops", "acme/", "a/b/c"] {
            assert!(rule.parse::<MembershipRule>().is_err(), "{rule:?}");
        }
    }

    #[test]
    fn display_round_trips() {
        for rule in ["acme", "acme/ops"] {
            assert_eq!(rule.parse::<MembershipRule>().expect("parse").to_string(), rule);
        }
    }

    #[test]
    fn team_rule_requires_that_team() {
        let rules = MembershipRules::parse(&["orgA/team2"]).expect("parse");
        assert!(rules.allows(&memberships()));

        let rules = MembershipRules::parse(&["orgB/team1"]).expect("parse");
        assert!(!rules.allows(&memberships()));
    }

    #[test]
    fn org_rule_requires_any_team() {
        let rules = MembershipRules::parse(&["orgB"]).expect("parse");
        assert!(rules.allows(&memberships()));

        let rules = MembershipRules::parse(&["orgC"]).expect("parse");
        assert!(!rules.allows(&memberships()));
    }

    #[test]
    fn any_rule_may_match() {
        let rules = MembershipRules::parse(&["orgC", "orgB/team3"]).expect("parse");
        assert!(rules.allows(&memberships()));
    }

    #[test]
    fn empty_rule_set_allows_everyone() {
        assert!(MembershipRules::any_authenticated().allows(&Memberships::new()));
    }

    #[test]
    fn parse_reports_first_bad_rule() {
        let err = MembershipRules::parse(&["orgA", "x/y/z"]).expect_err("should fail");
        assert!(matches!(err, PolicyError::InvalidRule { rule, .. } if rule == "x/y/z"));
    }
}
