use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One side of a cricket match as reported by the odds provider.
///
/// Only `id` is typed. Score and odds fields (`name`, `runs`, `wickets`,
/// `winner`, `totalscore`, `odds`) are kept exactly as the provider sent
/// them, so a string `"1.85"` or an explicit `null` is served back and
/// compared verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    /// Opaque provider identifier
    pub id: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// A single cached match record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    #[serde(rename = "matchId")]
    pub match_id: String,
    /// "Live" | "Not Started" | any other provider-defined value
    pub status: String,
    pub home: Team,
    pub away: Team,
    /// Everything else, `winnerId` included
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Match {
    pub fn is_live(&self) -> bool {
        self.status.eq_ignore_ascii_case("live")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    #[test]
    fn test_deserialize_full_match() {
        let raw = json!({
            "matchId": "m-1",
            "status": "Live",
            "home": {
                "id": "ind", "name": "India", "runs": 187, "wickets": 4,
                "winner": false, "totalscore": "187/4 (20)", "odds": 1.85
            },
            "away": { "id": "aus", "name": "Australia", "runs": 120, "wickets": 6, "odds": 2.05 },
        });
        let m: Match = serde_json::from_value(raw).unwrap();
        assert_eq!(m.match_id, "m-1");
        assert!(m.is_live());
        assert_eq!(m.home.fields.get("runs"), Some(&json!(187)));
        assert_eq!(m.away.fields.get("winner"), None);
        assert_relative_eq!(m.home.fields.get("odds").and_then(Value::as_f64).unwrap(), 1.85);
        assert!(m.fields.get("winnerId").is_none());
    }

    #[test]
    fn test_loosely_typed_fields_survive_round_trip() {
        let raw = json!({
            "matchId": "m-2",
            "status": "Not Started",
            "venue": "Eden Gardens",
            "winnerId": null,
            "home": { "id": "a", "odds": "1.85", "runs": 10.0, "flag": "https://cdn/flag.png" },
            "away": { "id": "b", "winner": null },
        });
        let m: Match = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(m.fields.get("winnerId"), Some(&Value::Null));
        assert_eq!(m.home.fields.get("odds"), Some(&json!("1.85")));
        assert_eq!(serde_json::to_value(&m).unwrap(), raw);
    }

    #[test]
    fn test_key_fields_serialized_camel_case() {
        let m: Match = serde_json::from_value(json!({
            "matchId": "m-3",
            "status": "Finished",
            "home": { "id": "a", "winner": true },
            "away": { "id": "b", "winner": false },
            "winnerId": 7,
        }))
        .unwrap();
        let out = serde_json::to_value(&m).unwrap();
        assert_eq!(out["winnerId"], 7);
        assert_eq!(out["matchId"], "m-3");
        assert!(!m.is_live());
    }
}
