use rowset::collection::Collection;
use rowset::row;

/// Staff roster shared by the integration tests.
///
/// Four rows with mixed column types: integer ids, string names and
/// departments, integer salaries.
pub fn staff() -> Collection {
    Collection::from_rows(vec![
        row! { id: 1, name: "amelia", dept: "ops", salary: 52_000i64 },
        row! { id: 2, name: "bruno", dept: "eng", salary: 61_000i64 },
        row! { id: 3, name: "carla", dept: "eng", salary: 58_000i64 },
        row! { id: 4, name: "dmitri", dept: "sales", salary: 47_000i64 },
    ])
}

/// A one-row patch for the roster, sharing an existing id.
pub fn promotion_for_bruno() -> Collection {
    Collection::from_rows(vec![
        row! { id: 2, name: "bruno", dept: "eng", salary: 67_000i64 },
    ])
}

/// New hires with ids absent from the roster.
pub fn new_hires() -> Collection {
    Collection::from_rows(vec![
        row! { id: 5, name: "edith", dept: "ops", salary: 50_000i64 },
        row! { id: 6, name: "farid", dept: "eng", salary: 63_000i64 },
    ])
}
