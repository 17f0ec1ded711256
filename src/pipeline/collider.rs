// Naming heuristic only. Any studio convention outside this list is a miss.
const COLLIDER_TOKENS: &[&str] = &[
    "_collider",
    "_collision",
    "_col",
    "collider",
    "collision",
    "mesh_collider",
    "box_collider",
    "sphere_collider",
];

/// Whether a node name marks a physics proxy rather than visible geometry.
pub fn is_collider(name: &str) -> bool {
    let name = name.to_lowercase();
    COLLIDER_TOKENS.iter().any(|token| name.contains(token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_case_insensitively() {
        assert!(is_collider("Box_Collider_01"));
        assert!(is_collider("WALL_COLLISION"));
        assert!(is_collider("Table_Leg_Collider"));
    }

    #[test]
    fn matches_short_suffix() {
        assert!(is_collider("Floor_col"));
        assert!(is_collider("floor_COL_2"));
    }

    #[test]
    fn plain_names_are_not_colliders() {
        assert!(!is_collider("Wall"));
        assert!(!is_collider("Table"));
        assert!(!is_collider(""));
    }

    #[test]
    fn substring_false_positive_is_accepted() {
        // "_col" inside an unrelated word still counts.
        assert!(is_collider("Wall_colour"));
    }
}
