//! Care circle and membership models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use super::user::UserProfile;

/// Role within a circle. Every member holds exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CircleRole {
    Admin,
    Member,
}

impl CircleRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircleRole::Admin => "admin",
            CircleRole::Member => "member",
        }
    }
}

impl FromStr for CircleRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(CircleRole::Admin),
            "member" => Ok(CircleRole::Member),
            _ => Err(format!("Invalid circle role: {}", s)),
        }
    }
}

impl fmt::Display for CircleRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A care circle organised around one patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Circle {
    pub id: i64,
    pub name: String,
    pub patient_name: String,
    pub code: String,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user's membership in a circle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleMembership {
    pub id: i64,
    pub circle_id: i64,
    pub user_id: i64,
    pub role: CircleRole,
    pub display_name: String,
    pub joined_at: DateTime<Utc>,
}

/// Request payload for creating a circle.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCircleRequest {
    #[validate(custom(function = "shared::validation::validate_name"))]
    pub name: String,

    #[validate(custom(function = "shared::validation::validate_name"))]
    pub patient_name: String,

    /// How the creator appears to other members. Defaults to the account name.
    #[validate(custom(function = "shared::validation::validate_name"))]
    pub display_name: Option<String>,
}

/// Request payload for joining a circle by invite code.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JoinCircleRequest {
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub code: String,

    #[validate(custom(function = "shared::validation::validate_name"))]
    pub display_name: Option<String>,
}

/// Request payload for renaming a circle. Absent or blank fields are kept.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCircleRequest {
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 100, message = "Patient name must be at most 100 characters"))]
    pub patient_name: Option<String>,
}

/// A circle as seen by one of its members.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleSummary {
    #[serde(flatten)]
    pub circle: Circle,
    pub my_role: CircleRole,
    pub my_display_name: String,
    pub joined_at: DateTime<Utc>,
    pub creator: UserProfile,
}

/// A member entry in the circle detail view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInfo {
    pub id: i64,
    pub user_id: i64,
    pub role: CircleRole,
    pub display_name: String,
    pub joined_at: DateTime<Utc>,
    pub user: UserProfile,
}

/// Full circle detail with its members.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleDetail {
    #[serde(flatten)]
    pub circle: Circle,
    pub creator: UserProfile,
    pub members: Vec<MemberInfo>,
}

/// Response after rotating the invite code.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteCodeResponse {
    pub code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_role_roundtrip() {
        for role in [CircleRole::Admin, CircleRole::Member] {
            assert_eq!(role.as_str().parse::<CircleRole>().unwrap(), role);
        }
        assert_eq!("ADMIN".parse::<CircleRole>().unwrap(), CircleRole::Admin);
        assert!("owner".parse::<CircleRole>().is_err());
    }

    #[test]
    fn test_circle_role_serialization() {
        assert_eq!(
            serde_json::to_string(&CircleRole::Admin).unwrap(),
            "\"admin\""
        );
        assert_eq!(CircleRole::Member.to_string(), "member");
    }

    #[test]
    fn test_create_request_validation() {
        let valid: CreateCircleRequest =
            serde_json::from_str(r#"{"name":"Care for Mom","patientName":"Mom"}"#).unwrap();
        assert!(valid.validate().is_ok());
        assert!(valid.display_name.is_none());

        let blank: CreateCircleRequest =
            serde_json::from_str(r#"{"name":"  ","patientName":"Mom"}"#).unwrap();
        let errors = blank.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));

        let long = CreateCircleRequest {
            name: "Care".to_string(),
            patient_name: "x".repeat(101),
            display_name: None,
        };
        let errors = long.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("patient_name"));
    }

    #[test]
    fn test_create_request_blank_display_name_rejected() {
        let request = CreateCircleRequest {
            name: "Care".to_string(),
            patient_name: "Dad".to_string(),
            display_name: Some(" ".to_string()),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_join_request_validation() {
        let request = JoinCircleRequest {
            code: "".to_string(),
            display_name: None,
        };
        assert!(request.validate().is_err());

        let request = JoinCircleRequest {
            code: "abcd2345".to_string(),
            display_name: Some("Son".to_string()),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_summary_flattens_circle() {
        let now = Utc::now();
        let summary = CircleSummary {
            circle: Circle {
                id: 1,
                name: "Care for Mom".to_string(),
                patient_name: "Mom".to_string(),
                code: "ABCD2345".to_string(),
                created_by: 2,
                created_at: now,
                updated_at: now,
            },
            my_role: CircleRole::Admin,
            my_display_name: "Ann".to_string(),
            joined_at: now,
            creator: UserProfile {
                id: 2,
                name: "Ann".to_string(),
                email: "ann@example.com".to_string(),
            },
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["patientName"], "Mom");
        assert_eq!(json["code"], "ABCD2345");
        assert_eq!(json["myRole"], "admin");
        assert_eq!(json["creator"]["email"], "ann@example.com");
    }
}
