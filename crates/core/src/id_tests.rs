use super::*;

#[test]
fn code_id_displays_as_inner_string() {
    let id = CodeId::new("abc123");
    assert_eq!(id.as_str(), "abc123");
    assert_eq!(id.to_string(), "abc123");
}

#[test]
fn code_id_compares_against_str() {
    let id = CodeId::new("abc123");
    assert_eq!(id, *"abc123");
    assert_eq!(id, "abc123");
}

#[test]
fn match_id_round_trips_through_json() {
    let id = MatchId::new("m-1");
    let json = serde_json::to_string(&id).expect("serialize");
    let back: MatchId = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(id, back);
}

#[test]
fn ids_are_usable_as_map_keys_via_borrow() {
    use std::collections::HashMap;

    let mut map: HashMap<CodeId, u32> = HashMap::new();
    map.insert(CodeId::new("a"), 1);
    assert_eq!(map.get("a"), Some(&1));
}
