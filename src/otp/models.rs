use serde::{Deserialize, Serialize};

/// Self-service action a one-time code authorizes. Persisted as text in
/// `otp_codes.action_type`; codes are scoped to exactly one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    MembershipCheck,
    Correction,
    Deletion,
    Resignation,
}

impl ActionType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MembershipCheck => "membership_check",
            Self::Correction => "correction",
            Self::Deletion => "deletion",
            Self::Resignation => "resignation",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "membership_check" => Some(Self::MembershipCheck),
            "correction" => Some(Self::Correction),
            "deletion" => Some(Self::Deletion),
            "resignation" => Some(Self::Resignation),
            _ => None,
        }
    }

    /// Short human label used in the code email subject line.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::MembershipCheck => "membership status check",
            Self::Correction => "data correction request",
            Self::Deletion => "data deletion request",
            Self::Resignation => "resignation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ActionType;

    #[test]
    fn parse_round_trips_as_str() {
        for action in [
            ActionType::MembershipCheck,
            ActionType::Correction,
            ActionType::Deletion,
            ActionType::Resignation,
        ] {
            assert_eq!(ActionType::parse(action.as_str()), Some(action));
        }
        assert_eq!(ActionType::parse("login"), None);
        assert_eq!(ActionType::parse(""), None);
    }

    #[test]
    fn serde_uses_snake_case() {
        let value = serde_json::to_value(ActionType::MembershipCheck).unwrap();
        assert_eq!(value, serde_json::json!("membership_check"));
        let parsed: ActionType = serde_json::from_value(serde_json::json!("resignation")).unwrap();
        assert_eq!(parsed, ActionType::Resignation);
    }
}
